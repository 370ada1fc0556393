//! History resolution engine.
//!
//! Turns an [`Identifier`] plus a [`ContentType`] into exactly one
//! clipboard history item or a typed failure, filters the history by
//! content type and pin state, and reads the live clipboard through the
//! affinity worker.
//!
//! The engine holds no state between calls. Every method fetches a fresh
//! history snapshot and treats it as immutable for the rest of the call.
//! Collaborators are injected at construction: a [`RoamingHistory`], a
//! [`LiveClipboard`] and a [`PinnedItemProvider`].

pub mod affinity;
pub mod content;
pub mod error;
pub mod identifier;
pub mod pinned;

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::native::{
    DataFormat, HistoryEntry, HistoryStatus, LiveClipboard, NativeError, RoamingHistory,
    SetContentStatus, TextFormat,
};

use affinity::AffinityError;
pub use content::ContentType;
pub use error::{ClipboardError, ErrorCode};
pub use identifier::Identifier;
use identifier::normalize_id;
pub use pinned::{JsonPinnedItems, PinnedItemProvider};

/// Deadline for a live clipboard read.
pub const DEFAULT_LIVE_TIMEOUT: Duration = Duration::from_millis(500);

pub const ITEM_NOT_FOUND: &str = "Failed to get specified clipboard history item";
pub const INCOMPATIBLE_CONTENT: &str = "Item does not support the specified content type";
pub const IMAGE_PLACEHOLDER: &str = "[Unsupported Format: Image]";
pub const FILE_PLACEHOLDER: &str = "[Unsupported Format: File]";

/// Engine failures.
///
/// Only `Domain` carries an [`ErrorCode`]. Native errors pass through
/// unchanged; timeout and cancellation are transport outcomes.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error(transparent)]
    Domain(#[from] ClipboardError),

    #[error(transparent)]
    Native(#[from] NativeError),

    #[error("live clipboard read timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("operation cancelled")]
    Cancelled,

    #[error("clipboard worker: {0}")]
    Worker(String),
}

impl HistoryError {
    fn domain(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Domain(ClipboardError::new(code, message))
    }

    /// The stable code for domain failures; `None` for everything else.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Domain(e) => Some(e.code()),
            _ => None,
        }
    }
}

impl From<AffinityError> for HistoryError {
    fn from(e: AffinityError) -> Self {
        match e {
            AffinityError::Timeout(deadline) => Self::Timeout(deadline),
            AffinityError::Cancelled => Self::Cancelled,
            AffinityError::Spawn(_) | AffinityError::WorkerLost => Self::Worker(e.to_string()),
        }
    }
}

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long `get_live_value` waits for the affinity worker.
    pub live_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            live_timeout: DEFAULT_LIVE_TIMEOUT,
        }
    }
}

/// A history item together with its position in the snapshot it came from.
///
/// `index` is what a later `ByIndex` lookup against an unchanged history
/// would resolve to.
#[derive(Debug)]
pub struct IndexedItem<I> {
    pub index: usize,
    pub item: I,
}

/// Clipboard history settings as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySettings {
    pub history_enabled: bool,
    pub roaming_enabled: bool,
}

/// Resolves identifiers and content types against the clipboard history,
/// the live clipboard and the pinned-item side-channel.
///
/// The live clipboard is shared with the affinity worker, so it sits
/// behind an `Arc`; the other collaborators are only used on the caller's
/// task.
pub struct HistoryEngine<R, L, P> {
    history: R,
    live: Arc<L>,
    pinned: P,
    config: EngineConfig,
}

impl<R, L, P> HistoryEngine<R, L, P>
where
    R: RoamingHistory,
    L: LiveClipboard,
    P: PinnedItemProvider,
{
    /// Build an engine over the given collaborators.
    pub fn new(history: R, live: L, pinned: P, config: EngineConfig) -> Self {
        Self {
            history,
            live: Arc::new(live),
            pinned,
            config,
        }
    }

    #[cfg(test)]
    pub(crate) fn history(&self) -> &R {
        &self.history
    }

    /// Resolve `identifier` to a single item compatible with `content_type`.
    pub async fn resolve_item(
        &self,
        identifier: Identifier,
        content_type: ContentType,
        cancel: &CancellationToken,
    ) -> Result<R::Item, HistoryError> {
        let item = self.locate(identifier, cancel)?;

        // A named item must match; unlike the live clipboard there is no
        // "nothing there" outcome.
        if !content_type.supports(&item) {
            let wanted: Vec<_> = content_type.formats().map(DataFormat::name).collect();
            tracing::debug!(
                %identifier,
                %content_type,
                ?wanted,
                "item rejected: incompatible content"
            );
            return Err(HistoryError::domain(
                ErrorCode::IncompatibleContentType,
                INCOMPATIBLE_CONTENT,
            ));
        }
        Ok(item)
    }

    /// Items compatible with `content_type`, optionally restricted to
    /// pinned ones, in snapshot order.
    ///
    /// An empty result is `Ok`; the caller decides how to report it.
    pub async fn list_history(
        &self,
        content_type: ContentType,
        pinned_only: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<IndexedItem<R::Item>>, HistoryError> {
        let items = self.snapshot(cancel)?;

        let pinned_ids = if pinned_only {
            ensure_not_cancelled(cancel)?;
            let ids = self
                .pinned
                .resolve_pinned_ids()
                .map_err(|e| ClipboardError::not_found(e.to_string()))?;
            Some(ids)
        } else {
            None
        };

        let listed: Vec<_> = items
            .into_iter()
            .enumerate()
            .filter(|(_, item)| match &pinned_ids {
                Some(ids) => ids.contains(&normalize_id(item.id())),
                None => true,
            })
            .filter(|(_, item)| content_type.supports(item))
            .map(|(index, item)| IndexedItem { index, item })
            .collect();

        tracing::debug!(
            %content_type,
            pinned_only,
            count = listed.len(),
            "listed clipboard history"
        );
        Ok(listed)
    }

    /// Read the live clipboard as `content_type` on the affinity worker.
    ///
    /// `Ok(None)` means nothing matching a specific type is present. With
    /// `ContentType::ALL` there is always a value while the clipboard
    /// holds anything at all.
    pub async fn get_live_value(
        &self,
        content_type: ContentType,
        cancel: &CancellationToken,
    ) -> Result<Option<String>, HistoryError> {
        let live = Arc::clone(&self.live);
        let value = affinity::run_with_deadline(self.config.live_timeout, cancel, move || {
            read_live_value(&*live, content_type)
        })
        .await??;
        Ok(value)
    }

    /// Promote `item` to the live clipboard. The status is returned as is.
    pub async fn set_as_current(
        &self,
        item: &R::Item,
        cancel: &CancellationToken,
    ) -> Result<SetContentStatus, HistoryError> {
        ensure_not_cancelled(cancel)?;
        let status = self.history.set_history_item_as_content(item)?;
        tracing::debug!(id = item.id(), %status, "set history item as content");
        Ok(status)
    }

    /// Record the item named by `identifier` in the pinned side-channel.
    ///
    /// Pinning an already pinned item succeeds without touching the
    /// document. Provider failures surface as `NotFound` carrying the
    /// provider's message.
    pub async fn pin(
        &self,
        identifier: Identifier,
        cancel: &CancellationToken,
    ) -> Result<(), HistoryError> {
        let item = self.locate(identifier, cancel)?;
        ensure_not_cancelled(cancel)?;
        self.pinned
            .add(item.id())
            .map_err(|e| ClipboardError::not_found(e.to_string()))?;
        tracing::info!(id = item.id(), "pinned clipboard history item");
        Ok(())
    }

    /// Drop the item named by `identifier` from the pinned side-channel.
    ///
    /// Unpinning an item that is not pinned succeeds. Errors follow
    /// [`HistoryEngine::pin`].
    pub async fn unpin(
        &self,
        identifier: Identifier,
        cancel: &CancellationToken,
    ) -> Result<(), HistoryError> {
        let item = self.locate(identifier, cancel)?;
        ensure_not_cancelled(cancel)?;
        self.pinned
            .remove(item.id())
            .map_err(|e| ClipboardError::not_found(e.to_string()))?;
        tracing::info!(id = item.id(), "unpinned clipboard history item");
        Ok(())
    }

    /// Whether clipboard history and its cross-device roaming are enabled.
    pub async fn settings(
        &self,
        cancel: &CancellationToken,
    ) -> Result<HistorySettings, HistoryError> {
        ensure_not_cancelled(cancel)?;
        Ok(HistorySettings {
            history_enabled: self.history.is_history_enabled()?,
            roaming_enabled: self.history.is_roaming_enabled()?,
        })
    }

    /// Fetch a snapshot, translating a non-success status into a domain error.
    fn snapshot(&self, cancel: &CancellationToken) -> Result<Vec<R::Item>, HistoryError> {
        ensure_not_cancelled(cancel)?;
        let snapshot = self.history.history_items()?;
        let code = match snapshot.status {
            HistoryStatus::Success => {
                tracing::debug!(count = snapshot.items.len(), "fetched clipboard history");
                return Ok(snapshot.items);
            }
            HistoryStatus::AccessDenied => ErrorCode::AccessDenied,
            HistoryStatus::ClipboardHistoryDisabled => ErrorCode::ClipboardHistoryDisabled,
        };
        Err(HistoryError::domain(
            code,
            format!("Failed to get clipboard history: {}", snapshot.status),
        ))
    }

    /// Resolve `identifier` against a fresh snapshot, ignoring content type.
    fn locate(
        &self,
        identifier: Identifier,
        cancel: &CancellationToken,
    ) -> Result<R::Item, HistoryError> {
        let items = self.snapshot(cancel)?;
        let found = match identifier {
            Identifier::ByIndex(index) => usize::try_from(index)
                .ok()
                .and_then(|index| items.into_iter().nth(index)),
            Identifier::ById(id) => {
                let wanted = id.to_string();
                items
                    .into_iter()
                    .find(|item| normalize_id(item.id()) == wanted)
            }
        };
        found.ok_or_else(|| ClipboardError::not_found(ITEM_NOT_FOUND).into())
    }
}

/// Render a resolved item as `content_type` would present it.
///
/// Mirrors the live clipboard order: text, then image and file
/// placeholders for the requested flags, then the declared formats.
pub fn describe_item<I: HistoryEntry>(
    item: &I,
    content_type: ContentType,
) -> Result<String, NativeError> {
    if content_type.contains(ContentType::TEXT) && item.contains(DataFormat::Text) {
        return item.text();
    }
    if content_type.contains(ContentType::IMAGE) && item.contains(DataFormat::Bitmap) {
        return Ok(IMAGE_PLACEHOLDER.to_string());
    }
    if content_type.contains(ContentType::FILE) && item.contains(DataFormat::StorageItems) {
        return Ok(FILE_PLACEHOLDER.to_string());
    }
    Ok(unsupported_placeholder(&item.available_formats()?))
}

fn unsupported_placeholder(formats: &[String]) -> String {
    format!("[Unsupported Format: {}]", formats.join(", "))
}

/// Live clipboard resolution. Runs on the affinity worker.
fn read_live_value<L: LiveClipboard + ?Sized>(
    live: &L,
    content_type: ContentType,
) -> Result<Option<String>, NativeError> {
    if content_type.contains(ContentType::TEXT) {
        if live.contains_text(TextFormat::Unicode)? {
            return live.text(TextFormat::Unicode).map(Some);
        }
        if live.contains_text(TextFormat::Legacy)? {
            return live.text(TextFormat::Legacy).map(Some);
        }
    }
    if content_type.contains(ContentType::IMAGE) && live.contains_image()? {
        return Ok(Some(IMAGE_PLACEHOLDER.to_string()));
    }
    // `ALL` describes whatever is there. A narrower type that matched
    // nothing yields no value rather than an error.
    if content_type.accepts_anything() {
        return Ok(Some(unsupported_placeholder(&live.formats()?)));
    }
    Ok(None)
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), HistoryError> {
    if cancel.is_cancelled() {
        Err(HistoryError::Cancelled)
    } else {
        Ok(())
    }
}
