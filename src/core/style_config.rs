// src/core/style_config.rs

//! User style configuration (`~/.config/quiver/styles.toml`).
//!
//! The file holds one table per style set. Only the `[quiver]` set is owned by
//! this crate; its keys are the fields of [`StyleConfig`]:
//!
//! ```toml
//! [quiver]
//! error = "bright-red bold"
//! directory = "blue underline"
//! ```

use crate::core::{paths, style};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// The table name of the built-in style set.
pub const SECTION: &str = "quiver";

type StyleFile = BTreeMap<String, BTreeMap<String, String>>;

/// Errors loading or changing `styles.toml`.
#[derive(Error, Debug)]
pub enum StyleConfigError {
    /// The file could not be read or written.
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    /// The config directory could not be located.
    #[error("Path error: {0}")]
    Path(#[from] paths::PathError),
    /// The file is not valid TOML.
    #[error("Failed to parse styles file: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// The styles could not be written as TOML.
    #[error("Failed to serialize styles to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// A key lacks the `<set>.<field>` form.
    #[error("Invalid key '{0}': expected '<set>.<field>'")]
    InvalidKey(String),
    /// The field is not part of the schema.
    #[error("Unknown style field '{0}'")]
    UnknownField(String),
    /// The value is not a valid style tag.
    #[error("Invalid style for '{key}': {source}")]
    InvalidStyle {
        key: String,
        #[source]
        source: style::StyleError,
    },
}

/// Styles used by the engine itself. Every field holds a style tag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct StyleConfig {
    /// Plain candidates.
    pub value: String,
    /// Candidate descriptions.
    pub description: String,
    /// Diagnostic rows.
    pub error: String,
    /// Usage and help text.
    pub usage: String,
    /// Flags without a value.
    pub flag: String,
    /// Flags taking a value.
    pub flag_arg: String,
    /// Keywords such as `true` or `always`.
    pub keyword_positive: String,
    /// Keywords such as `false` or `never`.
    pub keyword_negative: String,
    /// Keywords such as `auto`.
    pub keyword_ambiguous: String,
    /// Any other keyword.
    pub keyword_unknown: String,
    /// Directories.
    pub directory: String,
    /// Executable files.
    pub executable: String,
    /// Symbolic links.
    pub symlink: String,
}

/// Field names with their descriptions, in display order.
pub const FIELDS: &[(&str, &str)] = &[
    ("value", "default style for values"),
    ("description", "default style for descriptions"),
    ("error", "style for error messages"),
    ("usage", "style for usage hints"),
    ("flag", "style for flags"),
    ("flag_arg", "style for flags taking an argument"),
    ("keyword_positive", "style for positive keywords (true, yes, on)"),
    ("keyword_negative", "style for negative keywords (false, no, off)"),
    ("keyword_ambiguous", "style for ambiguous keywords (auto, default)"),
    ("keyword_unknown", "style for unrecognized keywords"),
    ("directory", "style for directories"),
    ("executable", "style for executable files"),
    ("symlink", "style for symbolic links"),
];

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            value: style::DEFAULT.to_string(),
            description: style::DIM.to_string(),
            error: style::of(&[style::RED, style::BOLD]),
            usage: style::ITALIC.to_string(),
            flag: style::BLUE.to_string(),
            flag_arg: style::of(&[style::BLUE, style::ITALIC]),
            keyword_positive: style::GREEN.to_string(),
            keyword_negative: style::RED.to_string(),
            keyword_ambiguous: style::YELLOW.to_string(),
            keyword_unknown: style::DIM.to_string(),
            directory: style::of(&[style::BLUE, style::BOLD]),
            executable: style::of(&[style::GREEN, style::BOLD]),
            symlink: style::CYAN.to_string(),
        }
    }
}

impl StyleConfig {
    /// Reads a field by name.
    pub fn get(&self, field: &str) -> Option<&str> {
        let value = match field {
            "value" => &self.value,
            "description" => &self.description,
            "error" => &self.error,
            "usage" => &self.usage,
            "flag" => &self.flag,
            "flag_arg" => &self.flag_arg,
            "keyword_positive" => &self.keyword_positive,
            "keyword_negative" => &self.keyword_negative,
            "keyword_ambiguous" => &self.keyword_ambiguous,
            "keyword_unknown" => &self.keyword_unknown,
            "directory" => &self.directory,
            "executable" => &self.executable,
            "symlink" => &self.symlink,
            _ => return None,
        };
        Some(value)
    }

    fn field_mut(&mut self, field: &str) -> Option<&mut String> {
        let value = match field {
            "value" => &mut self.value,
            "description" => &mut self.description,
            "error" => &mut self.error,
            "usage" => &mut self.usage,
            "flag" => &mut self.flag,
            "flag_arg" => &mut self.flag_arg,
            "keyword_positive" => &mut self.keyword_positive,
            "keyword_negative" => &mut self.keyword_negative,
            "keyword_ambiguous" => &mut self.keyword_ambiguous,
            "keyword_unknown" => &mut self.keyword_unknown,
            "directory" => &mut self.directory,
            "executable" => &mut self.executable,
            "symlink" => &mut self.symlink,
            _ => return None,
        };
        Some(value)
    }

    /// Applies `field -> tag` overrides. Unknown fields are skipped and
    /// returned so the caller can report them.
    pub fn apply_overlay(&mut self, overlay: &BTreeMap<String, String>) -> Vec<String> {
        let mut unknown = Vec::new();
        for (field, value) in overlay {
            match self.field_mut(field) {
                Some(slot) => *slot = value.clone(),
                None => unknown.push(field.clone()),
            }
        }
        unknown
    }

    /// `(name, description, current value)` for every field.
    pub fn fields(&self) -> Vec<(&'static str, &'static str, String)> {
        FIELDS
            .iter()
            .map(|(name, desc)| (*name, *desc, self.get(name).unwrap_or_default().to_string()))
            .collect()
    }

    /// Loads the defaults overlaid with the `[quiver]` table of `path`.
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, StyleConfigError> {
        let mut config = Self::default();
        let file = match read_style_file(path)? {
            Some(file) => file,
            None => return Ok(config),
        };
        if let Some(overlay) = file.get(SECTION) {
            for field in config.apply_overlay(overlay) {
                log::warn!("Ignoring unknown style field '{}.{}'", SECTION, field);
            }
        }
        Ok(config)
    }

    /// Loads from the default location.
    pub fn load() -> Result<Self, StyleConfigError> {
        Self::load_from(&paths::get_styles_config_path()?)
    }
}

/// The configuration for this process, loaded once on first use.
///
/// A broken or unreadable file falls back to the defaults; completion output
/// must never fail because of a style problem.
pub fn current() -> &'static StyleConfig {
    static CURRENT: OnceLock<StyleConfig> = OnceLock::new();
    CURRENT.get_or_init(|| {
        StyleConfig::load().unwrap_or_else(|e| {
            log::debug!("Using default styles: {}", e);
            StyleConfig::default()
        })
    })
}

fn read_style_file(path: &Path) -> Result<Option<StyleFile>, StyleConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(toml::from_str(&content)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Sets (or, with a blank value, removes) `<set>.<field>` in the styles file.
///
/// Commas in `value` are accepted as token separators (`"red,bold"`).
pub fn set_style_in(path: &Path, key: &str, value: &str) -> Result<(), StyleConfigError> {
    let (set, field) = key
        .split_once('.')
        .filter(|(s, f)| !s.is_empty() && !f.is_empty() && !f.contains('.'))
        .ok_or_else(|| StyleConfigError::InvalidKey(key.to_string()))?;

    if set == SECTION && StyleConfig::default().get(field).is_none() {
        return Err(StyleConfigError::UnknownField(field.to_string()));
    }

    let value = value.replace(',', " ");
    let value = value.trim();
    style::sgr(value).map_err(|source| StyleConfigError::InvalidStyle {
        key: key.to_string(),
        source,
    })?;

    let mut file = read_style_file(path)?.unwrap_or_default();
    let table = file.entry(set.to_string()).or_default();
    if value.is_empty() {
        table.remove(field);
    } else {
        table.insert(field.to_string(), value.to_string());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml::to_string_pretty(&file)?)?;
    Ok(())
}

/// [`set_style_in`] at the default location.
pub fn set_style(key: &str, value: &str) -> Result<(), StyleConfigError> {
    let path = paths::get_config_dir()?.join(crate::constants::STYLES_CONFIG_FILENAME);
    set_style_in(&path, key, value)
}
