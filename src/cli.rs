use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::history::ContentType;

#[derive(Parser)]
#[command(name = "cbhist", version, about = "Query and manage the clipboard history")]
pub struct Cli {
    /// Log debug diagnostics to stderr (when RUST_LOG is unset)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Suppress diagnostics on stderr
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Remove ANSI escape sequences from printed values
    #[arg(long, global = true)]
    pub strip_ansi: bool,

    /// Line ending conversion for printed values
    #[arg(long, value_enum, default_value_t = LineEnding::Keep, global = true)]
    pub line_ending: LineEnding,

    /// Directory holding the pinned-item metadata profiles
    #[arg(long, env = "CBHIST_PINNED_DIR", global = true)]
    pub pinned_dir: Option<PathBuf>,

    /// Deadline for reading the live clipboard, in milliseconds
    #[arg(long, env = "CBHIST_TIMEOUT_MS", default_value_t = 500, global = true)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List clipboard history items; exits with the number listed
    List {
        /// Content types to include (comma separated)
        #[arg(long = "type", short = 't', value_enum, value_delimiter = ',', default_value = "all")]
        types: Vec<ContentTypeArg>,

        /// Only list pinned items
        #[arg(long)]
        pinned: bool,

        /// Label items by id instead of index
        #[arg(long)]
        id: bool,

        /// Separate entries with NUL instead of newline
        #[arg(long)]
        null: bool,
    },

    /// Print the live clipboard, or a history item by index or id
    Get {
        /// History index (0 is newest) or item GUID
        #[arg(allow_hyphen_values = true)]
        identifier: Option<String>,

        /// Content types to accept (comma separated)
        #[arg(long = "type", short = 't', value_enum, value_delimiter = ',', default_value = "all")]
        types: Vec<ContentTypeArg>,

        /// Also make the item the current clipboard content
        #[arg(long, requires = "identifier")]
        set_current: bool,
    },

    /// Pin a history item
    Pin {
        #[arg(allow_hyphen_values = true)]
        identifier: String,
    },

    /// Remove the pin from a history item
    Unpin {
        #[arg(allow_hyphen_values = true)]
        identifier: String,
    },

    /// Report whether history and roaming are enabled
    Status,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTypeArg {
    Text,
    Image,
    File,
    All,
}

impl ContentTypeArg {
    /// Union of the selected kinds.
    pub fn combine(args: &[Self]) -> ContentType {
        args.iter().fold(ContentType::empty(), |acc, arg| {
            acc | match arg {
                Self::Text => ContentType::TEXT,
                Self::Image => ContentType::IMAGE,
                Self::File => ContentType::FILE,
                Self::All => ContentType::ALL,
            }
        })
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Keep,
    Lf,
    Crlf,
}
