//! Pinned-item index: out-of-band pin state from the clipboard side-channel.
//!
//! The clipboard history service does not expose pin state on its items.
//! The OS clipboard UI records pinned entries in a per-user JSON document:
//!
//! ```text
//! <root>/<profile>/metadata.json
//! { "items": { "{GUID}": { ... }, ... }, ... }
//! ```
//!
//! Member names of `items` are the pinned ids. The document is re-read on
//! every call; nothing is cached between resolutions. Edits rewrite the
//! whole document with its members in their original order.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::identifier::normalize_id;

const METADATA_FILE: &str = "metadata.json";
const ITEMS: &str = "items";

/// The side-channel document, kept as one ordered object so members other
/// than `items` survive edits in place.
#[derive(Debug, Serialize, Deserialize)]
#[serde(transparent)]
struct PinnedDocument(Map<String, Value>);

impl PinnedDocument {
    fn items(&self) -> Option<&Map<String, Value>> {
        self.0.get(ITEMS).and_then(Value::as_object)
    }

    fn items_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.0.get_mut(ITEMS).and_then(Value::as_object_mut)
    }
}

/// Pinned side-channel failures.
///
/// "Nothing is pinned" is not an error: it is an empty set.
#[derive(Debug, thiserror::Error)]
pub enum PinnedError {
    #[error("pinned item metadata not found under {}", .0.display())]
    NotLocated(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed pinned item metadata in {}: {reason}", .path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("failed to write {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Source of pinned history item ids.
pub trait PinnedItemProvider: Send + Sync {
    /// Ids of all pinned items, normalised with [`normalize_id`].
    fn resolve_pinned_ids(&self) -> Result<HashSet<String>, PinnedError>;

    /// Mark `id` pinned. Pinning an already pinned id is a no-op.
    fn add(&self, id: &str) -> Result<(), PinnedError>;

    /// Clear the pin on `id`. Unpinning an id that is not pinned is a no-op.
    fn remove(&self, id: &str) -> Result<(), PinnedError>;
}

/// Default side-channel root: `<local data dir>/Microsoft/Windows/Clipboard/Pinned`.
pub fn default_root() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| {
        dir.join("Microsoft")
            .join("Windows")
            .join("Clipboard")
            .join("Pinned")
    })
}

/// Reads and edits the JSON side-channel document.
#[derive(Debug, Clone)]
pub struct JsonPinnedItems {
    root: PathBuf,
}

impl JsonPinnedItems {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the metadata document: the first profile directory (by name)
    /// under the root that holds one.
    fn locate(&self) -> Result<PathBuf, PinnedError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PinnedError::NotLocated(self.root.clone()));
            }
            Err(e) => {
                return Err(PinnedError::Unreadable {
                    path: self.root.clone(),
                    source: e,
                });
            }
        };

        let mut candidates: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path().join(METADATA_FILE))
            .filter(|path| path.is_file())
            .collect();
        candidates.sort();

        let path = candidates
            .into_iter()
            .next()
            .ok_or_else(|| PinnedError::NotLocated(self.root.clone()))?;
        tracing::debug!(path = %path.display(), "located pinned item metadata");
        Ok(path)
    }

    fn load(&self) -> Result<(PathBuf, PinnedDocument), PinnedError> {
        let path = self.locate()?;
        let raw = fs::read(&path).map_err(|e| PinnedError::Unreadable {
            path: path.clone(),
            source: e,
        })?;
        let document: PinnedDocument = match serde_json::from_slice(&raw) {
            Ok(document) => document,
            Err(e) => {
                return Err(PinnedError::Malformed {
                    path,
                    reason: e.to_string(),
                });
            }
        };
        if document.items().is_none() {
            return Err(PinnedError::Malformed {
                path,
                reason: "missing `items` object".into(),
            });
        }
        Ok((path, document))
    }

    /// Replace the document via a sibling temp file and rename.
    ///
    /// The temp file never outlives a failed write.
    fn store(&self, path: &Path, document: &PinnedDocument) -> Result<(), PinnedError> {
        let bytes = serde_json::to_vec(document).map_err(|e| PinnedError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(PinnedError::WriteFailed {
                path: tmp,
                source: e,
            });
        }
        if let Err(e) = fs::rename(&tmp, path) {
            tracing::debug!(tmp = %tmp.display(), "rename failed, discarding temp file");
            let _ = fs::remove_file(&tmp);
            return Err(PinnedError::WriteFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
        Ok(())
    }

    /// Apply `edit` to the `items` object and persist when it reports a change.
    fn edit_items(
        &self,
        edit: impl FnOnce(&mut Map<String, Value>) -> bool,
    ) -> Result<(), PinnedError> {
        let (path, mut document) = self.load()?;
        let changed = document.items_mut().is_some_and(edit);
        if changed {
            self.store(&path, &document)?;
        }
        Ok(())
    }
}

/// Key spelling used by the clipboard UI: braced upper-case GUID.
fn side_channel_key(id: &str) -> String {
    match uuid::Uuid::parse_str(id) {
        Ok(guid) => format!("{{{}}}", guid.to_string().to_uppercase()),
        Err(_) => id.to_string(),
    }
}

impl PinnedItemProvider for JsonPinnedItems {
    fn resolve_pinned_ids(&self) -> Result<HashSet<String>, PinnedError> {
        let (_, document) = self.load()?;
        Ok(document
            .items()
            .into_iter()
            .flat_map(Map::keys)
            .map(|key| normalize_id(key))
            .collect())
    }

    fn add(&self, id: &str) -> Result<(), PinnedError> {
        let wanted = normalize_id(id);
        self.edit_items(|items| {
            if items.keys().any(|key| normalize_id(key) == wanted) {
                return false;
            }
            items.insert(side_channel_key(&wanted), Value::Object(Map::new()));
            true
        })
    }

    fn remove(&self, id: &str) -> Result<(), PinnedError> {
        let wanted = normalize_id(id);
        self.edit_items(|items| {
            let before = items.len();
            items.retain(|key, _| normalize_id(key) != wanted);
            items.len() != before
        })
    }
}
