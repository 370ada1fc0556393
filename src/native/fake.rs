//! In-memory native surfaces for engine and client tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use super::{
    ContentView, DataFormat, HistoryEntry, HistorySnapshot, HistoryStatus, LiveClipboard,
    NativeError, RoamingHistory, SetContentStatus, TextFormat,
};
use crate::history::identifier::normalize_id;
use crate::history::pinned::{PinnedError, PinnedItemProvider};

#[derive(Debug, Clone, PartialEq)]
pub struct FakeItem {
    pub id: String,
    pub formats: Vec<DataFormat>,
    pub text: Option<String>,
    /// Declared formats beyond the standard ones (e.g. "HTML Format").
    pub extra_formats: Vec<String>,
}

impl FakeItem {
    pub fn with_text(id: &str, text: &str) -> Self {
        Self {
            id: normalize_id(id),
            formats: vec![DataFormat::Text],
            text: Some(text.to_string()),
            extra_formats: Vec::new(),
        }
    }

    pub fn image(id: &str) -> Self {
        Self {
            id: normalize_id(id),
            formats: vec![DataFormat::Bitmap],
            text: None,
            extra_formats: Vec::new(),
        }
    }

    pub fn files(id: &str) -> Self {
        Self {
            id: normalize_id(id),
            formats: vec![DataFormat::StorageItems],
            text: None,
            extra_formats: Vec::new(),
        }
    }

    /// An item declaring only non-standard formats.
    pub fn opaque(id: &str, formats: &[&str]) -> Self {
        Self {
            id: normalize_id(id),
            formats: Vec::new(),
            text: None,
            extra_formats: formats.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl ContentView for FakeItem {
    fn contains(&self, format: DataFormat) -> bool {
        self.formats.contains(&format)
    }
}

impl HistoryEntry for FakeItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn available_formats(&self) -> Result<Vec<String>, NativeError> {
        Ok(self
            .formats
            .iter()
            .map(|f| f.name().to_string())
            .chain(self.extra_formats.iter().cloned())
            .collect())
    }

    fn text(&self) -> Result<String, NativeError> {
        self.text
            .clone()
            .ok_or_else(|| NativeError::History("item has no text".into()))
    }
}

#[derive(Debug)]
pub struct FakeHistory {
    pub status: HistoryStatus,
    pub items: Vec<FakeItem>,
    pub set_status: SetContentStatus,
    pub history_enabled: bool,
    pub roaming_enabled: bool,
    pub fail_fetch: bool,
    /// Ids passed to `set_history_item_as_content`, in call order.
    pub promoted: Mutex<Vec<String>>,
    pub fetches: Mutex<usize>,
}

impl FakeHistory {
    pub fn with_items(items: Vec<FakeItem>) -> Self {
        Self {
            status: HistoryStatus::Success,
            items,
            set_status: SetContentStatus::Success,
            history_enabled: true,
            roaming_enabled: false,
            fail_fetch: false,
            promoted: Mutex::new(Vec::new()),
            fetches: Mutex::new(0),
        }
    }

    pub fn with_status(status: HistoryStatus) -> Self {
        Self {
            status,
            ..Self::with_items(Vec::new())
        }
    }
}

impl RoamingHistory for FakeHistory {
    type Item = FakeItem;

    fn history_items(&self) -> Result<HistorySnapshot<FakeItem>, NativeError> {
        *self.fetches.lock().unwrap() += 1;
        if self.fail_fetch {
            return Err(NativeError::History("service unavailable".into()));
        }
        Ok(HistorySnapshot {
            status: self.status,
            items: self.items.clone(),
        })
    }

    fn set_history_item_as_content(
        &self,
        item: &FakeItem,
    ) -> Result<SetContentStatus, NativeError> {
        self.promoted.lock().unwrap().push(item.id.clone());
        Ok(self.set_status)
    }

    fn is_history_enabled(&self) -> Result<bool, NativeError> {
        Ok(self.history_enabled)
    }

    fn is_roaming_enabled(&self) -> Result<bool, NativeError> {
        Ok(self.roaming_enabled)
    }
}

#[derive(Debug, Default)]
pub struct FakeClipboard {
    pub unicode: Option<String>,
    pub legacy: Option<String>,
    pub image: bool,
    pub formats: Vec<String>,
    /// Sleep this long inside every probe (simulates a held clipboard).
    pub delay: Option<Duration>,
    pub fail: bool,
}

impl FakeClipboard {
    fn probe(&self) -> Result<(), NativeError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            return Err(NativeError::Clipboard("OpenClipboard failed".into()));
        }
        Ok(())
    }
}

impl LiveClipboard for FakeClipboard {
    fn contains_text(&self, format: TextFormat) -> Result<bool, NativeError> {
        self.probe()?;
        Ok(match format {
            TextFormat::Unicode => self.unicode.is_some(),
            TextFormat::Legacy => self.legacy.is_some(),
        })
    }

    fn text(&self, format: TextFormat) -> Result<String, NativeError> {
        self.probe()?;
        let value = match format {
            TextFormat::Unicode => &self.unicode,
            TextFormat::Legacy => &self.legacy,
        };
        value
            .clone()
            .ok_or_else(|| NativeError::Clipboard("format not available".into()))
    }

    fn contains_image(&self) -> Result<bool, NativeError> {
        self.probe()?;
        Ok(self.image)
    }

    fn formats(&self) -> Result<Vec<String>, NativeError> {
        self.probe()?;
        Ok(self.formats.clone())
    }
}

#[derive(Debug, Default)]
pub struct FakePinned {
    pub ids: Mutex<HashSet<String>>,
    /// When set, every call fails with `NotLocated` at this path.
    pub broken: Option<std::path::PathBuf>,
}

impl FakePinned {
    pub fn with_ids(ids: &[&str]) -> Self {
        Self {
            ids: Mutex::new(ids.iter().map(|id| normalize_id(id)).collect()),
            broken: None,
        }
    }

    pub fn broken() -> Self {
        Self {
            ids: Mutex::new(HashSet::new()),
            broken: Some("/missing/Pinned".into()),
        }
    }

    fn check(&self) -> Result<(), PinnedError> {
        match &self.broken {
            Some(path) => Err(PinnedError::NotLocated(path.clone())),
            None => Ok(()),
        }
    }
}

impl PinnedItemProvider for FakePinned {
    fn resolve_pinned_ids(&self) -> Result<HashSet<String>, PinnedError> {
        self.check()?;
        Ok(self.ids.lock().unwrap().clone())
    }

    fn add(&self, id: &str) -> Result<(), PinnedError> {
        self.check()?;
        self.ids.lock().unwrap().insert(normalize_id(id));
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<(), PinnedError> {
        self.check()?;
        self.ids.lock().unwrap().remove(&normalize_id(id));
        Ok(())
    }
}
