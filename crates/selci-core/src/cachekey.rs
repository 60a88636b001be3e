//! Cache keys for dependency-install memoization.
//!
//! A key is derived from the content of the dependency-declaration files
//! that define an install (the shared lockfile plus the component's own
//! manifest). A hit means a previous run already installed this exact set;
//! a miss triggers a full reinstall. The store is a pure memoization layer:
//! last-writer-wins between concurrent jobs is benign.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::error::{Result, SelciError};

/// Content-derived cache key (SHA-256 hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Compute a key over the given dependency files, resolved against
    /// `root`. Each file contributes its relative path and content, so both
    /// renaming and editing a manifest changes the key. A missing file is
    /// an error, not an empty contribution.
    pub fn compute(root: &Path, files: &[PathBuf]) -> Result<Self> {
        let mut hasher = Sha256::new();
        for file in files {
            let abs = root.join(file);
            if !abs.is_file() {
                return Err(SelciError::CacheInputMissing(abs));
            }
            hasher.update(file.to_string_lossy().as_bytes());
            hasher.update(b"\0");
            hasher.update(fs::read(&abs)?);
            hasher.update(b"\0");
        }
        Ok(Self(hex::encode(hasher.finalize())))
    }

    /// Full hex key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Filesystem marker store recording which cache keys have a completed
/// install behind them.
///
/// Layout: `<root>/installs/<key>` — the marker content is the save
/// timestamp, useful when inspecting the cache by hand.
pub struct CacheStore {
    installs_dir: PathBuf,
}

impl CacheStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let installs_dir = root.as_ref().join("installs");
        fs::create_dir_all(&installs_dir)?;
        Ok(Self { installs_dir })
    }

    fn marker_path(&self, key: &CacheKey) -> PathBuf {
        self.installs_dir.join(key.as_str())
    }

    /// Whether a completed install exists for this key (read-only).
    pub fn restore(&self, key: &CacheKey) -> bool {
        self.marker_path(key).exists()
    }

    /// Record a completed install for this key.
    ///
    /// Atomic write: temp file in the same directory, then rename. Two jobs
    /// saving the same key race harmlessly.
    pub fn save(&self, key: &CacheKey) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.installs_dir)?;
        writeln!(tmp, "{}", chrono::Utc::now().to_rfc3339())?;
        tmp.persist(self.marker_path(key)).map_err(|e| e.error)?;
        Ok(())
    }
}
