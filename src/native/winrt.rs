//! Windows adapters.
//!
//! [`WinRtHistory`] wraps the WinRT `Clipboard` history statics.
//! [`Win32Clipboard`] reads the legacy clipboard through `clipboard-win`,
//! which must happen on the affinity worker.

use ::windows::ApplicationModel::DataTransfer::{
    Clipboard, ClipboardHistoryItem, ClipboardHistoryItemsResultStatus, DataPackageView,
    SetHistoryItemAsContentStatus, StandardDataFormats,
};
use ::windows::core::HSTRING;
use clipboard_win::{formats, raw, Clipboard as OpenClipboard, EnumFormats, Getter};

use super::{
    ContentView, DataFormat, HistoryEntry, HistorySnapshot, HistoryStatus, LiveClipboard,
    NativeError, RoamingHistory, SetContentStatus, TextFormat,
};
use crate::history::identifier::normalize_id;

/// Attempts made to open the legacy clipboard before giving up.
const OPEN_ATTEMPTS: usize = 10;

fn history_err(e: ::windows::core::Error) -> NativeError {
    NativeError::History(e.message().to_string())
}

fn standard_format(format: DataFormat) -> ::windows::core::Result<HSTRING> {
    match format {
        DataFormat::Text => StandardDataFormats::Text(),
        DataFormat::Bitmap => StandardDataFormats::Bitmap(),
        DataFormat::StorageItems => StandardDataFormats::StorageItems(),
    }
}

/// One entry of the WinRT clipboard history.
pub struct WinRtItem {
    id: String,
    item: ClipboardHistoryItem,
    content: DataPackageView,
}

impl WinRtItem {
    fn wrap(item: ClipboardHistoryItem) -> Result<Self, NativeError> {
        let id = normalize_id(&item.Id().map_err(history_err)?.to_string());
        let content = item.Content().map_err(history_err)?;
        Ok(Self { id, item, content })
    }
}

impl ContentView for WinRtItem {
    fn contains(&self, format: DataFormat) -> bool {
        standard_format(format)
            .and_then(|name| self.content.Contains(&name))
            .unwrap_or(false)
    }
}

impl HistoryEntry for WinRtItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn available_formats(&self) -> Result<Vec<String>, NativeError> {
        let formats = self.content.AvailableFormats().map_err(history_err)?;
        let size = formats.Size().map_err(history_err)?;
        (0..size)
            .map(|i| formats.GetAt(i).map(|f| f.to_string()).map_err(history_err))
            .collect()
    }

    fn text(&self) -> Result<String, NativeError> {
        let text = self
            .content
            .GetTextAsync()
            .and_then(|op| op.get())
            .map_err(history_err)?;
        Ok(text.to_string())
    }
}

/// The WinRT clipboard history service.
#[derive(Debug, Default)]
pub struct WinRtHistory;

impl WinRtHistory {
    pub fn new() -> Self {
        Self
    }
}

impl RoamingHistory for WinRtHistory {
    type Item = WinRtItem;

    fn history_items(&self) -> Result<HistorySnapshot<WinRtItem>, NativeError> {
        let result = Clipboard::GetHistoryItemsAsync()
            .and_then(|op| op.get())
            .map_err(history_err)?;

        let status = match result.Status().map_err(history_err)? {
            ClipboardHistoryItemsResultStatus::Success => HistoryStatus::Success,
            ClipboardHistoryItemsResultStatus::AccessDenied => HistoryStatus::AccessDenied,
            ClipboardHistoryItemsResultStatus::ClipboardHistoryDisabled => {
                HistoryStatus::ClipboardHistoryDisabled
            }
            other => {
                return Err(NativeError::History(format!(
                    "unknown history status {}",
                    other.0
                )));
            }
        };
        if status != HistoryStatus::Success {
            return Ok(HistorySnapshot {
                status,
                items: Vec::new(),
            });
        }

        let view = result.Items().map_err(history_err)?;
        let size = view.Size().map_err(history_err)?;
        let items = (0..size)
            .map(|i| WinRtItem::wrap(view.GetAt(i).map_err(history_err)?))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(HistorySnapshot { status, items })
    }

    fn set_history_item_as_content(
        &self,
        item: &WinRtItem,
    ) -> Result<SetContentStatus, NativeError> {
        match Clipboard::SetHistoryItemAsContent(&item.item).map_err(history_err)? {
            SetHistoryItemAsContentStatus::Success => Ok(SetContentStatus::Success),
            SetHistoryItemAsContentStatus::AccessDenied => Ok(SetContentStatus::AccessDenied),
            SetHistoryItemAsContentStatus::ItemDeleted => Ok(SetContentStatus::ItemDeleted),
            other => Err(NativeError::History(format!(
                "unknown set-content status {}",
                other.0
            ))),
        }
    }

    fn is_history_enabled(&self) -> Result<bool, NativeError> {
        Clipboard::IsHistoryEnabled().map_err(history_err)
    }

    fn is_roaming_enabled(&self) -> Result<bool, NativeError> {
        Clipboard::IsRoamingEnabled().map_err(history_err)
    }
}

/// The legacy Win32 clipboard.
#[derive(Debug, Default)]
pub struct Win32Clipboard;

impl Win32Clipboard {
    pub fn new() -> Self {
        Self
    }

    fn open(&self) -> Result<OpenClipboard, NativeError> {
        OpenClipboard::new_attempts(OPEN_ATTEMPTS)
            .map_err(|e| NativeError::Clipboard(format!("OpenClipboard failed: {e}")))
    }
}

fn text_format_id(format: TextFormat) -> u32 {
    match format {
        TextFormat::Unicode => formats::CF_UNICODETEXT,
        TextFormat::Legacy => formats::CF_TEXT,
    }
}

/// ANSI bytes up to the terminating NUL, decoded byte-for-byte.
fn decode_ansi(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

/// Names for the predefined `CF_*` formats, which have no registered name.
fn standard_format_name(format: u32) -> Option<&'static str> {
    Some(match format {
        1 => "CF_TEXT",
        2 => "CF_BITMAP",
        3 => "CF_METAFILEPICT",
        4 => "CF_SYLK",
        5 => "CF_DIF",
        6 => "CF_TIFF",
        7 => "CF_OEMTEXT",
        8 => "CF_DIB",
        9 => "CF_PALETTE",
        10 => "CF_PENDATA",
        11 => "CF_RIFF",
        12 => "CF_WAVE",
        13 => "CF_UNICODETEXT",
        14 => "CF_ENHMETAFILE",
        15 => "CF_HDROP",
        16 => "CF_LOCALE",
        17 => "CF_DIBV5",
        _ => return None,
    })
}

impl LiveClipboard for Win32Clipboard {
    fn contains_text(&self, format: TextFormat) -> Result<bool, NativeError> {
        let _open = self.open()?;
        Ok(clipboard_win::is_format_avail(text_format_id(format)))
    }

    fn text(&self, format: TextFormat) -> Result<String, NativeError> {
        let _open = self.open()?;
        match format {
            TextFormat::Unicode => {
                let mut out = String::new();
                formats::Unicode
                    .read_clipboard(&mut out)
                    .map_err(|e| NativeError::Clipboard(format!("CF_UNICODETEXT: {e}")))?;
                Ok(out)
            }
            TextFormat::Legacy => {
                let mut out = Vec::new();
                formats::RawData(formats::CF_TEXT)
                    .read_clipboard(&mut out)
                    .map_err(|e| NativeError::Clipboard(format!("CF_TEXT: {e}")))?;
                Ok(decode_ansi(&out))
            }
        }
    }

    fn contains_image(&self) -> Result<bool, NativeError> {
        let _open = self.open()?;
        Ok([formats::CF_BITMAP, formats::CF_DIB, formats::CF_DIBV5]
            .into_iter()
            .any(clipboard_win::is_format_avail))
    }

    fn formats(&self) -> Result<Vec<String>, NativeError> {
        let _open = self.open()?;
        Ok(EnumFormats::new()
            .map(|format| match standard_format_name(format) {
                Some(name) => name.to_string(),
                None => raw::format_name_big(format).unwrap_or_else(|| format!("#{format}")),
            })
            .collect())
    }
}
