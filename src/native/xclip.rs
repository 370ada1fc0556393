//! X11 adapters, using the `xclip` helper for the live clipboard.
//!
//! X11 has no clipboard history service, so [`NoHistory`] always reports
//! it disabled. Live clipboard reads shell out to
//! `xclip -selection clipboard` with an explicit target.

use std::process::{Command, Stdio};

use super::{
    ContentView, DataFormat, HistoryEntry, HistorySnapshot, HistoryStatus, LiveClipboard,
    NativeError, RoamingHistory, SetContentStatus, TextFormat,
};

const UNICODE_TARGETS: &[&str] = &["UTF8_STRING", "text/plain;charset=utf-8"];
const LEGACY_TARGETS: &[&str] = &["STRING", "TEXT", "text/plain"];

/// Item type of [`NoHistory`]. Never constructed.
#[derive(Debug)]
pub enum NoHistoryItem {}

impl ContentView for NoHistoryItem {
    fn contains(&self, _: DataFormat) -> bool {
        match *self {}
    }
}

impl HistoryEntry for NoHistoryItem {
    fn id(&self) -> &str {
        match *self {}
    }

    fn available_formats(&self) -> Result<Vec<String>, NativeError> {
        match *self {}
    }

    fn text(&self) -> Result<String, NativeError> {
        match *self {}
    }
}

/// History service stand-in for platforms without one.
#[derive(Debug, Default)]
pub struct NoHistory;

impl NoHistory {
    pub fn new() -> Self {
        Self
    }
}

impl RoamingHistory for NoHistory {
    type Item = NoHistoryItem;

    fn history_items(&self) -> Result<HistorySnapshot<NoHistoryItem>, NativeError> {
        Ok(HistorySnapshot {
            status: HistoryStatus::ClipboardHistoryDisabled,
            items: Vec::new(),
        })
    }

    fn set_history_item_as_content(
        &self,
        item: &NoHistoryItem,
    ) -> Result<SetContentStatus, NativeError> {
        match *item {}
    }

    fn is_history_enabled(&self) -> Result<bool, NativeError> {
        Ok(false)
    }

    fn is_roaming_enabled(&self) -> Result<bool, NativeError> {
        Ok(false)
    }
}

/// Live clipboard backed by `xclip`.
#[derive(Debug)]
pub struct X11Clipboard {
    program: String,
}

impl Default for X11Clipboard {
    fn default() -> Self {
        Self {
            program: "xclip".into(),
        }
    }
}

impl X11Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the helper for `target`.
    ///
    /// `Ok(None)` when it ran but exited non-zero: xclip does that when
    /// nothing owns the selection or the owner does not offer `target`.
    /// Failing to start or wait on the helper is an error.
    fn read_target(&self, target: &str) -> Result<Option<Vec<u8>>, NativeError> {
        let output = Command::new(&self.program)
            .args(["-selection", "clipboard", "-t", target, "-o"])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| {
                NativeError::Clipboard(format!("failed to spawn {} -o: {e}", self.program))
            })?;

        if output.status.success() {
            Ok(Some(output.stdout))
        } else {
            tracing::debug!(target, status = %output.status, "xclip returned no data");
            Ok(None)
        }
    }

    /// Targets the selection owner advertises; empty when there is no owner.
    fn targets(&self) -> Result<Vec<String>, NativeError> {
        Ok(self
            .read_target("TARGETS")?
            .map(|raw| parse_targets(&String::from_utf8_lossy(&raw)))
            .unwrap_or_default())
    }
}

fn parse_targets(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn text_targets(format: TextFormat) -> &'static [&'static str] {
    match format {
        TextFormat::Unicode => UNICODE_TARGETS,
        TextFormat::Legacy => LEGACY_TARGETS,
    }
}

/// Latin-1 bytes to `String`; every byte maps to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

impl LiveClipboard for X11Clipboard {
    fn contains_text(&self, format: TextFormat) -> Result<bool, NativeError> {
        let targets = self.targets()?;
        Ok(text_targets(format)
            .iter()
            .any(|wanted| targets.iter().any(|t| t == wanted)))
    }

    fn text(&self, format: TextFormat) -> Result<String, NativeError> {
        let targets = self.targets()?;
        let target = text_targets(format)
            .iter()
            .find(|wanted| targets.iter().any(|t| t == *wanted))
            .ok_or_else(|| NativeError::Clipboard("no text on the clipboard".into()))?;
        let raw = self.read_target(target)?.ok_or_else(|| {
            NativeError::Clipboard(format!("xclip -t {target} -o returned no data"))
        })?;
        Ok(match format {
            TextFormat::Unicode => String::from_utf8_lossy(&raw).into_owned(),
            TextFormat::Legacy => decode_latin1(&raw),
        })
    }

    fn contains_image(&self) -> Result<bool, NativeError> {
        Ok(self.targets()?.iter().any(|t| t.starts_with("image/")))
    }

    fn formats(&self) -> Result<Vec<String>, NativeError> {
        self.targets()
    }
}
