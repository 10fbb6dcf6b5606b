// src/constants.rs

/// How many nested callback expansions a single `invoke` may perform.
pub const MAX_RECURSION_DEPTH: usize = 10;

/// Message carried by the diagnostic row produced when the depth bound is hit.
pub const RECURSION_EXCEEDED_MESSAGE: &str = "maximum recursion depth exceeded";

/// `display` value marking a row as an error message instead of a candidate.
pub const DISPLAY_ERROR: &str = "ERR";

/// `display` value marking a row as a non-selectable separator.
pub const DISPLAY_SEPARATOR: &str = "_";

/// The hidden subcommand shells call to obtain completions.
pub const COMPLETION_COMMAND: &str = "_quiver";

/// Name of the directory used below the system config and cache directories.
pub const APP_DIR_NAME: &str = "quiver";

/// The name of the style configuration file (in ~/.config/quiver/).
pub const STYLES_CONFIG_FILENAME: &str = "styles.toml";

/// Bumped whenever the on-disk layout of a cache entry changes.
pub const CACHE_FORMAT_VERSION: u32 = 2;

/// Overrides the root directory of the completion cache.
pub const CACHE_DIR_ENV: &str = "QUIVER_CACHE_DIR";

/// Number of hash bytes kept for cache identities (16 bytes = 32 hex characters).
pub const HASH_TRUNCATE_LENGTH: usize = 16;
