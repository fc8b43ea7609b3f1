use crate::sdk::carpark::Carpark;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Result as IoResult,
    path::{Path, PathBuf},
    time::Duration,
};

/// Maximum age of a reusable search result.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub results: Vec<Carpark>,
    /// Capture time, Unix epoch milliseconds.
    pub timestamp: i64,
}

/// Holds the results of the most recent search only.
///
/// Any insert replaces the previous entry whatever its key. When backed by a
/// file, every insert is written through; I/O problems are logged and the
/// cache keeps working from memory.
#[derive(Debug)]
pub struct SearchCache {
    entry: Option<CacheEntry>,
    path: Option<PathBuf>,
    ttl: Duration,
}

impl SearchCache {
    pub fn in_memory() -> Self {
        Self {
            entry: None,
            path: None,
            ttl: CACHE_TTL,
        }
    }

    /// Loads the persisted entry. A missing or corrupt file is an empty cache.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entry = match read_entry(&path) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Ignoring unreadable search cache {}: {}", path.display(), e);
                None
            }
        };
        Self {
            entry,
            path: Some(path),
            ttl: CACHE_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn entry(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    pub fn get(&self, key: &str) -> Option<Vec<Carpark>> {
        self.get_at(key, Utc::now().timestamp_millis())
    }

    /// Results for `key` if it is the stored key and younger than the TTL at `now_ms`.
    pub fn get_at(&self, key: &str, now_ms: i64) -> Option<Vec<Carpark>> {
        let entry = self.entry.as_ref()?;
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        if entry.key == key && now_ms.saturating_sub(entry.timestamp) < ttl_ms {
            Some(entry.results.clone())
        } else {
            None
        }
    }

    pub fn insert(&mut self, key: String, results: Vec<Carpark>) {
        self.insert_at(key, results, Utc::now().timestamp_millis());
    }

    pub fn insert_at(&mut self, key: String, results: Vec<Carpark>, timestamp: i64) {
        self.entry = Some(CacheEntry {
            key,
            results,
            timestamp,
        });
        if let Err(e) = self.save() {
            log::warn!("Failed to persist search cache: {}", e);
        }
    }

    fn save(&self) -> IoResult<()> {
        let (Some(path), Some(entry)) = (&self.path, &self.entry) else {
            return Ok(());
        };
        let data = serde_json::to_string_pretty(entry)?;
        fs::write(path, data)
    }
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn read_entry(path: &Path) -> IoResult<Option<CacheEntry>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::search::provider::mock::mock_carparks;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn hit_requires_exact_key_and_fresh_entry() {
        let mut cache = SearchCache::in_memory();
        cache.insert_at("1.3,103.8,3,1000".to_string(), mock_carparks(), NOW);

        assert!(cache.get_at("1.3,103.8,3,1000", NOW + 1_000).is_some());
        assert!(cache.get_at("1.3,103.8,2,1000", NOW + 1_000).is_none());
        assert!(cache.get_at("1.3,103.8,3,1000", NOW + 299_999).is_some());
        assert!(cache.get_at("1.3,103.8,3,1000", NOW + 300_000).is_none());
    }

    #[test]
    fn holds_a_single_entry() {
        let mut cache = SearchCache::in_memory();
        cache.insert_at("a".to_string(), mock_carparks(), NOW);
        cache.insert_at("b".to_string(), Vec::new(), NOW);

        assert!(cache.get_at("a", NOW).is_none());
        assert_eq!(cache.get_at("b", NOW), Some(Vec::new()));
    }

    #[test]
    fn persists_and_reloads_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search_cache.json");

        let mut cache = SearchCache::load_from_file(&path);
        assert!(cache.entry().is_none());
        let now = Utc::now().timestamp_millis();
        cache.insert_at("k".to_string(), mock_carparks(), now);

        let reloaded = SearchCache::load_from_file(&path);
        assert_eq!(reloaded.entry(), cache.entry());
        assert_eq!(reloaded.get("k").map(|r| r.len()), Some(5));
    }

    #[test]
    fn corrupt_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("search_cache.json");
        fs::write(&path, "{not json").unwrap();

        let cache = SearchCache::load_from_file(&path);
        assert!(cache.entry().is_none());
        assert!(cache.get("anything").is_none());
    }

    #[test]
    fn unwritable_path_still_caches_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("search_cache.json");

        let mut cache = SearchCache::load_from_file(&path);
        cache.insert("k".to_string(), Vec::new());
        assert_eq!(cache.get("k"), Some(Vec::new()));
    }
}
