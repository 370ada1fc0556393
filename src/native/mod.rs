//! Native clipboard surfaces: pluggable platform adapters.
//!
//! The engine never touches OS APIs directly. It consumes two
//! collaborator traits: [`RoamingHistory`] (the clipboard history
//! service) and [`LiveClipboard`] (the legacy single-slot clipboard).
//! Platform adapters implement them; `main.rs` composes the pair for
//! the current target.

#[cfg(test)]
pub mod fake;
#[cfg(windows)]
mod winrt;
#[cfg(not(windows))]
mod xclip;

#[cfg(windows)]
pub use winrt::{Win32Clipboard as PlatformClipboard, WinRtHistory as PlatformHistory};
#[cfg(not(windows))]
pub use xclip::{NoHistory as PlatformHistory, X11Clipboard as PlatformClipboard};

use std::fmt;

/// Errors returned by native adapters.
///
/// The engine propagates these unchanged; they never become an
/// [`ErrorCode`](crate::history::ErrorCode).
#[derive(Debug, thiserror::Error)]
pub enum NativeError {
    /// Live clipboard access failed (clipboard busy, helper missing,
    /// conversion error).
    #[error("clipboard: {0}")]
    Clipboard(String),

    /// Clipboard history service call failed.
    #[error("history: {0}")]
    History(String),
}

/// Payload kinds a history item's content view can be probed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    Text,
    Bitmap,
    StorageItems,
}

impl DataFormat {
    /// Standard format name as reported by the clipboard service.
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Bitmap => "Bitmap",
            Self::StorageItems => "StorageItems",
        }
    }
}

/// Format predicate over a piece of clipboard content.
pub trait ContentView {
    fn contains(&self, format: DataFormat) -> bool;
}

/// Capability surface of one clipboard history entry.
pub trait HistoryEntry: ContentView {
    /// Id assigned by the clipboard service, in canonical GUID form.
    fn id(&self) -> &str;

    /// Every format name the entry declares, standard or not.
    fn available_formats(&self) -> Result<Vec<String>, NativeError>;

    /// Text payload. Only meaningful when `contains(DataFormat::Text)`.
    fn text(&self) -> Result<String, NativeError>;
}

/// Outcome of a history fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStatus {
    Success,
    AccessDenied,
    ClipboardHistoryDisabled,
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "Success",
            Self::AccessDenied => "AccessDenied",
            Self::ClipboardHistoryDisabled => "ClipboardHistoryDisabled",
        })
    }
}

/// Outcome of promoting a history item to the live clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetContentStatus {
    Success,
    AccessDenied,
    ItemDeleted,
}

impl fmt::Display for SetContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "Success",
            Self::AccessDenied => "AccessDenied",
            Self::ItemDeleted => "ItemDeleted",
        })
    }
}

/// One fetch of the clipboard history, newest entry first.
#[derive(Debug)]
pub struct HistorySnapshot<I> {
    pub status: HistoryStatus,
    pub items: Vec<I>,
}

/// The clipboard history service.
///
/// `Send + Sync` because the engine is shared with the signal-handling
/// task in `main.rs`.
pub trait RoamingHistory: Send + Sync {
    type Item: HistoryEntry;

    fn history_items(&self) -> Result<HistorySnapshot<Self::Item>, NativeError>;

    fn set_history_item_as_content(
        &self,
        item: &Self::Item,
    ) -> Result<SetContentStatus, NativeError>;

    fn is_history_enabled(&self) -> Result<bool, NativeError>;

    fn is_roaming_enabled(&self) -> Result<bool, NativeError>;
}

/// Text flavours on the legacy clipboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    /// UTF-16 (Windows) or UTF-8 (X11) text.
    Unicode,
    /// ANSI code page (Windows) or Latin-1 `STRING` (X11) text.
    Legacy,
}

/// The legacy single-slot clipboard.
///
/// Implementations may only be called from the affinity worker spawned
/// by [`crate::history::affinity`]; the engine guarantees this.
pub trait LiveClipboard: Send + Sync + 'static {
    fn contains_text(&self, format: TextFormat) -> Result<bool, NativeError>;

    fn text(&self, format: TextFormat) -> Result<String, NativeError>;

    fn contains_image(&self) -> Result<bool, NativeError>;

    /// Names of every format currently on the clipboard.
    fn formats(&self) -> Result<Vec<String>, NativeError>;
}
