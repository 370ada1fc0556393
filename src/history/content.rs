//! Content type negotiation.

use std::fmt;

use crate::native::{ContentView, DataFormat};

bitflags::bitflags! {
    /// Payload kinds a caller is willing to accept.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContentType: u8 {
        const TEXT = 0b001;
        const IMAGE = 0b010;
        const FILE = 0b100;
        const ALL = Self::TEXT.bits() | Self::IMAGE.bits() | Self::FILE.bits();
    }
}

impl ContentType {
    /// Whether an item with `content` can be returned for this type.
    ///
    /// Two separate rules: any asserted flag whose format is present
    /// accepts the item; and `ALL` accepts everything, describing
    /// unrecognised payloads rather than rejecting them.
    pub fn supports<C: ContentView + ?Sized>(self, content: &C) -> bool {
        if self.matches_any_format(content) {
            return true;
        }
        self.accepts_anything()
    }

    /// True if at least one asserted flag's format is present.
    pub fn matches_any_format<C: ContentView + ?Sized>(self, content: &C) -> bool {
        self.formats().any(|format| content.contains(format))
    }

    /// Exactly `ALL`, not merely a superset of some flags.
    pub fn accepts_anything(self) -> bool {
        self == Self::ALL
    }

    /// Native formats corresponding to the asserted flags.
    pub fn formats(self) -> impl Iterator<Item = DataFormat> {
        [
            (Self::TEXT, DataFormat::Text),
            (Self::IMAGE, DataFormat::Bitmap),
            (Self::FILE, DataFormat::StorageItems),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, format)| format)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("All");
        }
        let mut names = Vec::new();
        if self.contains(Self::TEXT) {
            names.push("Text");
        }
        if self.contains(Self::IMAGE) {
            names.push("Image");
        }
        if self.contains(Self::FILE) {
            names.push("File");
        }
        if names.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}
