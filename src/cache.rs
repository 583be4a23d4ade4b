//! On-disk response cache
//!
//! Server responses are cached in the system's standard cache directory so
//! repeated requests for the same document do not hit the service again.
//! Entries are stored as JSON files, one per cache key. Cache failures are
//! never fatal; the caller falls back to the network.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// A cached server response.
#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    url: String,
    body: String,
}

/// Persistent storage for raw server responses.
///
/// Keys are derived by the caller (a hash of the request URL); the original
/// URL is stored alongside the body for inspectability of the cache
/// directory.
pub struct ResponseCache {
    /// The directory where cached responses are stored
    cache_dir: PathBuf,
}

impl ResponseCache {
    /// Opens or creates a response cache with the given name under the
    /// system's standard cache directory.
    pub fn open(name: &str) -> io::Result<Self> {
        let proj_dirs = directories::ProjectDirs::from("com", "tvdb-api", "tvdb-api")
            .ok_or_else(|| io::Error::other("no cache directory available"))?;

        let cache_dir = proj_dirs.cache_dir().join(sanitize_name(name));
        Self::open_at(&cache_dir)
    }

    /// Opens or creates a response cache rooted at an explicit directory.
    pub fn open_at(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            cache_dir: dir.to_path_buf(),
        })
    }

    /// Loads the cached body for the given key, or `None` on a miss.
    pub fn load(&self, key: &str) -> io::Result<Option<String>> {
        let file_path = self.entry_path(key);
        if !file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&file_path)?;
        let entry: Entry = serde_json::from_str(&content).map_err(io::Error::other)?;
        Ok(Some(entry.body))
    }

    /// Stores a response body under the given key.
    pub fn store(&self, key: &str, url: &str, body: &str) -> io::Result<()> {
        let entry = Entry {
            url: url.to_string(),
            body: body.to_string(),
        };
        let content = serde_json::to_string(&entry).map_err(io::Error::other)?;
        fs::write(self.entry_path(key), content)
    }

    /// Returns the path to the cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", sanitize_name(key)))
    }
}

/// Sanitizes a name for use in file paths
///
/// Converts to lowercase and replaces all characters that are not
/// a-z, 0-9, or hyphen with underscores.
fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
