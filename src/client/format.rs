//! Output formatting for CLI commands.
//!
//! Clipboard values go to stdout untouched apart from the optional ANSI
//! and line-ending passes, so `cbhist get 0 | less` shows exactly what
//! was copied. Diagnostics never go to stdout.

use std::io::{self, Write};

use super::ansi::strip_ansi;
use crate::cli::LineEnding;
use crate::history::HistorySettings;

/// Value post-processing selected on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub strip_ansi: bool,
    pub line_ending: LineEnding,
}

impl OutputOptions {
    pub fn render(&self, value: &str) -> String {
        let value = if self.strip_ansi {
            strip_ansi(value)
        } else {
            value.to_string()
        };
        convert_line_endings(&value, self.line_ending)
    }
}

/// Rewrite every `\r\n`, lone `\r` and lone `\n` as the requested ending.
pub fn convert_line_endings(value: &str, ending: LineEnding) -> String {
    let eol = match ending {
        LineEnding::Keep => return value.to_string(),
        LineEnding::Lf => "\n",
        LineEnding::Crlf => "\r\n",
    };

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                chars.next_if_eq(&'\n');
                out.push_str(eol);
            }
            '\n' => out.push_str(eol),
            other => out.push(other),
        }
    }
    out
}

/// Write one listing entry as `label:value` followed by the separator.
pub fn write_entry<W: Write>(
    out: &mut W,
    label: &str,
    value: &str,
    separator: u8,
) -> io::Result<()> {
    write!(out, "{label}:{value}")?;
    out.write_all(&[separator])
}

/// Write a single value. No trailing newline is added.
pub fn write_value<W: Write>(out: &mut W, value: &str) -> io::Result<()> {
    out.write_all(value.as_bytes())?;
    out.flush()
}

pub fn write_settings<W: Write>(out: &mut W, settings: &HistorySettings) -> io::Result<()> {
    writeln!(out, "History: {}", enabled(settings.history_enabled))?;
    writeln!(out, "Roaming: {}", enabled(settings.roaming_enabled))
}

fn enabled(flag: bool) -> &'static str {
    if flag { "Enabled" } else { "Disabled" }
}
