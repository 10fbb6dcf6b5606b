// src/core/cache.rs

//! On-disk persistence of resolved completion values.
//!
//! Layout: `<root>/<site hash>/<keys hash>`, one file per identity. The site
//! hash separates registration sites, so identical keys used at two sites can
//! never share a file. Each file holds a [`CacheEntry`] encoded with bincode
//! and compressed with lz4; freshness is decided by the file's mtime.

use crate::constants::{CACHE_FORMAT_VERSION, HASH_TRUNCATE_LENGTH};
use crate::core::paths;
use crate::models::{CacheEntry, RawValues};
use log::debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::WalkDir;

/// Errors reading or writing cache entries. The engine treats all of them as
/// a cache miss.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading or writing the store failed.
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    /// No cache directory could be determined.
    #[error("Path error: {0}")]
    Path(#[from] paths::PathError),
    /// The entry's metadata is unavailable, usually because it does not exist.
    #[error("Could not read metadata of '{path}': {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The entry is older than the requested timeout.
    #[error("Cache entry '{0}' is older than its timeout")]
    Expired(PathBuf),
    /// The entry is not valid lz4.
    #[error("Failed to decompress cache entry: {0}")]
    Decompress(#[from] lz4_flex::block::DecompressError),
    /// The entry could not be decoded.
    #[error("Failed to decode from binary format: {0}")]
    BincodeDecode(#[from] bincode::error::DecodeError),
    /// Values could not be encoded.
    #[error("Failed to encode to binary format: {0}")]
    BincodeEncode(#[from] bincode::error::EncodeError),
    /// The entry was written by an incompatible version.
    #[error("Cache entry has format version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
    /// The temporary file could not be moved into place.
    #[error("Error with temporary file: {0}")]
    TempFile(#[from] tempfile::PersistError),
}

type CacheResult<T> = Result<T, CacheError>;

// --- KEYS ---

/// A value participating in a cache identity. Keys are evaluated each time the
/// cached Action is resolved, so file based keys follow the file's changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// A literal string.
    String(String),
    /// The content checksum of a file.
    FileChecksum(PathBuf),
    /// The size and modification time of a file (cheaper than a checksum).
    FileStats(PathBuf),
}

impl Key {
    /// Produces the string form hashed into the identity.
    pub fn resolve(&self) -> CacheResult<String> {
        match self {
            Self::String(s) => Ok(s.clone()),
            Self::FileChecksum(path) => checksum_file(path),
            Self::FileStats(path) => {
                let data = file_stats(path)?;
                Ok(format!("{}:{}", data.size, data.modified_nanos))
            }
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for Key {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

/// Metadata used by [`Key::FileStats`].
#[derive(Debug, PartialEq, Eq)]
pub struct FileStats {
    /// Length in bytes.
    pub size: u64,
    /// Modification time in nanoseconds since the Unix epoch.
    pub modified_nanos: u128,
}

/// Reads the size and mtime of a file.
pub fn file_stats(path: &Path) -> CacheResult<FileStats> {
    let metadata = fs::metadata(path).map_err(|source| CacheError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    let modified = metadata.modified()?;
    let modified_nanos = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    Ok(FileStats {
        size: metadata.len(),
        modified_nanos,
    })
}

/// blake3 of the file content, truncated and hex encoded.
pub fn checksum_file(path: &Path) -> CacheResult<String> {
    debug!("Calculating checksum for '{}'", path.display());
    let content = fs::read(path)?;
    Ok(truncated_hash(blake3::hash(&content)))
}

fn truncated_hash(hash: blake3::Hash) -> String {
    hex::encode(hash.as_bytes().get(..HASH_TRUNCATE_LENGTH).unwrap_or_default())
}

/// Hashes a registration site.
pub fn site_hash(site: &str) -> String {
    truncated_hash(blake3::hash(site.as_bytes()))
}

/// Hashes resolved key strings. Each key is length-prefixed so that
/// `["ab", "c"]` and `["a", "bc"]` give different hashes.
pub fn keys_hash<S: AsRef<str>>(keys: &[S]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(keys.len() as u64).to_le_bytes());
    for key in keys {
        let bytes = key.as_ref().as_bytes();
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }
    truncated_hash(hasher.finalize())
}

// --- STORE ---

/// A cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// A store rooted at `root`. Nothing is created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store at `QUIVER_CACHE_DIR` or the per-executable system location.
    pub fn default_location() -> CacheResult<Self> {
        Ok(Self::new(paths::get_cache_root()?))
    }

    /// The directory holding every entry of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Derives the file addressing `site` + `keys`. Fails when a key cannot be
    /// evaluated (e.g. a checksum of a missing file).
    pub fn file(&self, site: &str, keys: &[Key]) -> CacheResult<PathBuf> {
        let resolved = keys.iter().map(Key::resolve).collect::<CacheResult<Vec<_>>>()?;
        Ok(self.root.join(site_hash(site)).join(keys_hash(&resolved)))
    }

    /// Loads the values at `path` if the file is younger than `timeout`.
    pub fn load(&self, path: &Path, timeout: Duration) -> CacheResult<RawValues> {
        self.load_entry(path, timeout).map(|entry| entry.values)
    }

    /// Like [`load`](Self::load), keeping the flags stored with the values.
    pub fn load_entry(&self, path: &Path, timeout: Duration) -> CacheResult<CacheEntry> {
        let metadata = fs::metadata(path).map_err(|source| CacheError::Metadata {
            path: path.to_path_buf(),
            source,
        })?;
        // An mtime in the future (clock skew) counts as brand new.
        let age = SystemTime::now()
            .duration_since(metadata.modified()?)
            .unwrap_or(Duration::ZERO);
        if age >= timeout {
            return Err(CacheError::Expired(path.to_path_buf()));
        }

        let compressed = fs::read(path)?;
        let bytes = lz4_flex::decompress_size_prepended(&compressed)?;
        log::trace!(
            "Decompressed cache entry from {} to {} bytes.",
            compressed.len(),
            bytes.len()
        );
        let (entry, _): (CacheEntry, usize) =
            bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;
        if entry.format_version != CACHE_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                found: entry.format_version,
                expected: CACHE_FORMAT_VERSION,
            });
        }
        Ok(entry)
    }

    /// Persists `values` at `path`.
    ///
    /// The bytes go to a temporary file in the same directory which is then
    /// renamed over the target, so concurrent readers see either the old or
    /// the new entry, never a partial one.
    pub fn write(&self, path: &Path, values: &RawValues) -> CacheResult<()> {
        self.write_entry(path, values, false)
    }

    /// Like [`write`](Self::write), also storing whether the values disable
    /// the trailing space.
    pub fn write_entry(&self, path: &Path, values: &RawValues, nospace: bool) -> CacheResult<()> {
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;

        let entry = CacheEntry {
            format_version: CACHE_FORMAT_VERSION,
            nospace,
            values: values.clone(),
        };
        let bytes = bincode::serde::encode_to_vec(&entry, bincode::config::standard())?;
        let compressed = lz4_flex::compress_prepend_size(&bytes);

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(&compressed)?;
        temp.flush()?;
        temp.persist(path)?;
        debug!("Wrote {} values to cache '{}'", values.len(), path.display());
        Ok(())
    }

    /// All entry files currently in the store, sorted by path.
    pub fn entries(&self) -> CacheResult<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| {
                CacheError::Io(e.into_io_error().unwrap_or_else(|| {
                    std::io::Error::other("filesystem loop while listing cache")
                }))
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Removes the whole store. Returns whether anything was deleted.
    pub fn clear(&self) -> CacheResult<bool> {
        if !self.root.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.root)?;
        Ok(true)
    }
}
