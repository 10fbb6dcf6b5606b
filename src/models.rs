// src/models.rs

use crate::constants::{DISPLAY_ERROR, DISPLAY_SEPARATOR};
use serde::{Deserialize, Serialize};

// --- COMPLETION CANDIDATES ---

/// A single completion candidate.
///
/// `value` is what the shell inserts, `display` is what the menu shows. The two
/// only differ for sentinel rows (see [`RawValue::is_diagnostic`]) or when a
/// caller deliberately shortens the menu entry.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "PascalCase")]
pub struct RawValue {
    /// Inserted into the command line.
    pub value: String,
    /// Shown in the completion menu.
    pub display: String,
    /// Help text, or the message of a diagnostic row.
    #[serde(default)]
    pub description: String,
    /// An abstract style tag (e.g. `"red bold"`), never a raw escape code.
    #[serde(default)]
    pub style: String,
}

/// Ordered candidates. Order is the display order.
pub type RawValues = Vec<RawValue>;

impl RawValue {
    /// A plain candidate whose display equals its value.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            display: value.clone(),
            value,
            ..Self::default()
        }
    }

    /// A candidate with a help text.
    pub fn described(value: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::new(value)
        }
    }

    /// A candidate with a help text and a style tag.
    pub fn styled(
        value: impl Into<String>,
        description: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        Self {
            style: style.into(),
            ..Self::described(value, description)
        }
    }

    /// Replaces the menu text, keeping the inserted value.
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }

    /// An error row. The message lives in `description`.
    pub fn diagnostic(message: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            value: DISPLAY_ERROR.to_string(),
            display: DISPLAY_ERROR.to_string(),
            description: message.into(),
            style: style.into(),
        }
    }

    /// A non-selectable separator row.
    pub fn separator(description: impl Into<String>) -> Self {
        Self {
            value: DISPLAY_SEPARATOR.to_string(),
            display: DISPLAY_SEPARATOR.to_string(),
            description: description.into(),
            style: String::new(),
        }
    }

    /// Whether this row carries a diagnostic message.
    pub fn is_diagnostic(&self) -> bool {
        self.display == DISPLAY_ERROR
    }

    /// Whether this row is a group separator.
    pub fn is_separator(&self) -> bool {
        self.display == DISPLAY_SEPARATOR
    }

    /// True for both `ERR` and `_` rows.
    pub fn is_sentinel(&self) -> bool {
        self.is_diagnostic() || self.is_separator()
    }
}

// --- PERSISTED / EXCHANGED FORMS ---

/// The versioned export format of a resolved completion set.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExportedAction {
    /// Version of the program that exported the values.
    #[serde(rename = "Version")]
    pub version: String,
    /// Whether the values disable the trailing space.
    #[serde(rename = "Nospace", default)]
    pub nospace: bool,
    /// The exported candidates.
    #[serde(rename = "RawValues", default)]
    pub raw_values: RawValues,
}

/// The payload written to a cache file (bincode, lz4 compressed).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// [`CACHE_FORMAT_VERSION`](crate::constants::CACHE_FORMAT_VERSION) at write time.
    pub format_version: u32,
    /// Whether the values disable the trailing space.
    pub nospace: bool,
    /// The cached candidates.
    pub values: RawValues,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_copies_value_into_display() {
        let value = RawValue::new("alpha");
        assert_eq!(value.value, "alpha");
        assert_eq!(value.display, "alpha");
        assert!(value.description.is_empty());
        assert!(!value.is_sentinel());
    }

    #[test]
    fn test_sentinel_rows() {
        let err = RawValue::diagnostic("file not found", "red");
        assert!(err.is_diagnostic());
        assert_eq!(err.description, "file not found");

        let sep = RawValue::separator("");
        assert!(sep.is_separator());
        assert!(sep.is_sentinel());
    }

    #[test]
    fn test_raw_value_uses_pascal_case_fields() {
        let json = serde_json::to_value(RawValue::described("a", "first")).unwrap();
        assert_eq!(json["Value"], "a");
        assert_eq!(json["Display"], "a");
        assert_eq!(json["Description"], "first");
        assert_eq!(json["Style"], "");
    }
}
