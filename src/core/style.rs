// src/core/style.rs

//! Style tags and their terminal rendering.
//!
//! A style tag is a space separated list of tokens such as `"red bold"` or
//! `"bg-blue white"`. Actions only ever store tags; shell encoders call
//! [`to_ansi`] or [`sgr`] when (and if) they emit color.

use crate::core::style_config::{self, StyleConfig};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// The terminal's default style.
pub const DEFAULT: &str = "";

/// Basic colors. Prefix with `bg-` for the background or `bright-` for the
/// bright variant.
pub const BLACK: &str = "black";
pub const RED: &str = "red";
pub const GREEN: &str = "green";
pub const YELLOW: &str = "yellow";
pub const BLUE: &str = "blue";
pub const MAGENTA: &str = "magenta";
pub const CYAN: &str = "cyan";
pub const WHITE: &str = "white";

/// Text attributes.
pub const BOLD: &str = "bold";
pub const DIM: &str = "dim";
pub const ITALIC: &str = "italic";
pub const UNDERLINE: &str = "underline";
pub const BLINK: &str = "blink";
pub const INVERSE: &str = "inverse";

/// Errors parsing a style tag.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StyleError {
    /// A token is neither a color nor an attribute.
    #[error("Unknown style token: '{0}'")]
    UnknownToken(String),
}

/// The eight basic ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl AnsiColor {
    /// Offset from 30 (foreground) or 40 (background).
    fn offset(self) -> u8 {
        match self {
            Self::Black => 0,
            Self::Red => 1,
            Self::Green => 2,
            Self::Yellow => 3,
            Self::Blue => 4,
            Self::Magenta => 5,
            Self::Cyan => 6,
            Self::White => 7,
        }
    }
}

/// Parses a color name (e.g. "red", "Green") into an [`AnsiColor`].
pub fn parse_color_name(name: &str) -> Option<AnsiColor> {
    match name.to_lowercase().as_str() {
        "black" => Some(AnsiColor::Black),
        "red" => Some(AnsiColor::Red),
        "green" => Some(AnsiColor::Green),
        "yellow" => Some(AnsiColor::Yellow),
        "blue" => Some(AnsiColor::Blue),
        "magenta" => Some(AnsiColor::Magenta),
        "cyan" => Some(AnsiColor::Cyan),
        "white" => Some(AnsiColor::White),
        _ => None,
    }
}

fn token_code(token: &str) -> Result<u8, StyleError> {
    let unknown = || StyleError::UnknownToken(token.to_string());
    match token.to_lowercase().as_str() {
        "bold" => Ok(1),
        "dim" => Ok(2),
        "italic" => Ok(3),
        "underline" => Ok(4),
        "blink" => Ok(5),
        "inverse" => Ok(7),
        other => {
            if let Some(name) = other.strip_prefix("bg-bright-") {
                parse_color_name(name).map(|c| 100 + c.offset()).ok_or_else(unknown)
            } else if let Some(name) = other.strip_prefix("bg-") {
                parse_color_name(name).map(|c| 40 + c.offset()).ok_or_else(unknown)
            } else if let Some(name) = other.strip_prefix("bright-") {
                parse_color_name(name).map(|c| 90 + c.offset()).ok_or_else(unknown)
            } else {
                parse_color_name(other).map(|c| 30 + c.offset()).ok_or_else(unknown)
            }
        }
    }
}

/// Joins several tags into one, skipping empty ones.
pub fn of(tags: &[&str]) -> String {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Converts a tag into SGR parameters (`"red bold"` -> `"31;1"`).
///
/// # Errors
/// Returns [`StyleError::UnknownToken`] for the first token that is neither a
/// modifier nor a (possibly `bg-`/`bright-` prefixed) color.
pub fn sgr(tag: &str) -> Result<String, StyleError> {
    let codes = tag
        .split_whitespace()
        .map(|token| token_code(token).map(|code| code.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(codes.join(";"))
}

/// Renders a tag into an escape sequence, or an empty string for the default
/// style and for tags that fail to parse.
pub fn to_ansi(tag: &str) -> String {
    match sgr(tag) {
        Ok(params) if !params.is_empty() => format!("\x1b[{}m", params),
        Ok(_) => String::new(),
        Err(e) => {
            log::debug!("Ignoring style '{}': {}", tag, e);
            String::new()
        }
    }
}

/// Style for a path based on what it points to and its extension.
pub fn for_path(path: &str) -> String {
    for_path_with(path, style_config::current())
}

/// Same as [`for_path`] with an explicit configuration.
pub fn for_path_with(path: &str, config: &StyleConfig) -> String {
    let p = Path::new(path);
    if let Ok(meta) = fs::symlink_metadata(p) {
        if meta.file_type().is_symlink() {
            return config.symlink.clone();
        }
        if meta.is_dir() {
            return config.directory.clone();
        }
        if is_executable(&meta) {
            return config.executable.clone();
        }
    } else if path.ends_with('/') {
        return config.directory.clone();
    }
    for_extension(p).to_string()
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.is_file() && meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}

fn for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "tar" | "gz" | "tgz" | "zip" | "xz" | "bz2" | "7z" | "rar" | "zst" | "lz4" => RED,
        "png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "bmp" | "ico" => MAGENTA,
        "mp3" | "wav" | "flac" | "ogg" | "mp4" | "mkv" | "avi" | "webm" => CYAN,
        "md" | "txt" | "rst" | "adoc" => WHITE,
        "toml" | "yaml" | "yml" | "json" | "ini" | "conf" => YELLOW,
        _ => DEFAULT,
    }
}

/// Style for keyword-like values (`true`/`false`, `on`/`off`, ...).
pub fn for_keyword(value: &str) -> String {
    for_keyword_with(value, style_config::current())
}

/// Same as [`for_keyword`] with an explicit configuration.
pub fn for_keyword_with(value: &str, config: &StyleConfig) -> String {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "enable" | "enabled" | "always" | "1" => {
            config.keyword_positive.clone()
        }
        "false" | "no" | "n" | "off" | "disable" | "disabled" | "never" | "0" => {
            config.keyword_negative.clone()
        }
        "auto" | "default" | "maybe" | "ask" => config.keyword_ambiguous.clone(),
        _ => config.keyword_unknown.clone(),
    }
}
