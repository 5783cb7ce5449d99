//! Persistence layer for the spec cache.
//!
//! The cache maps an OpenAPI spec URL to the downloaded spec, the endpoint
//! documents extracted from it and their embedding vectors, so repeated
//! translations against the same API skip the download and the document
//! embedding call. It is stored as one pretty-printed JSON file.

use crate::error::{AppError, Result};
use crate::ingestion::EndpointDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

/// Everything cached for a single spec URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Raw parsed spec document
    pub api_spec: Value,
    /// Endpoint documents in extraction order; parallel to `embeddings`
    pub endpoint_documents: Vec<EndpointDocument>,
    /// One vector per endpoint document
    pub embeddings: Vec<Vec<f32>>,
    /// Embedding model that produced `embeddings`
    pub model: String,
    /// SHA256 over the document texts, to detect hand-edited or truncated entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents_digest: Option<String>,
}

impl CacheEntry {
    /// Build an entry, rejecting mismatched document and embedding counts.
    pub fn new(
        api_spec: Value,
        endpoint_documents: Vec<EndpointDocument>,
        embeddings: Vec<Vec<f32>>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let entry = Self {
            documents_digest: Some(Self::compute_documents_digest(&endpoint_documents)),
            api_spec,
            endpoint_documents,
            embeddings,
            model: model.into(),
        };
        entry.validate().map_err(AppError::ModelError)?;
        Ok(entry)
    }

    pub fn compute_documents_digest(documents: &[EndpointDocument]) -> String {
        let mut hasher = Sha256::new();

        for doc in documents {
            hasher.update(doc.text.as_bytes());
            hasher.update(b"\n");
        }

        format!("{:x}", hasher.finalize())
    }

    /// Check the structural invariants of an entry.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.embeddings.len() != self.endpoint_documents.len() {
            return Err(format!(
                "{} embeddings for {} endpoint documents",
                self.embeddings.len(),
                self.endpoint_documents.len()
            ));
        }

        if let Some(first) = self.embeddings.first() {
            if self.embeddings.iter().any(|v| v.len() != first.len()) {
                return Err("embedding vectors differ in length".to_string());
            }
        }

        if let Some(digest) = &self.documents_digest {
            if *digest != Self::compute_documents_digest(&self.endpoint_documents) {
                return Err("documents digest mismatch".to_string());
            }
        }

        Ok(())
    }
}

/// Full cache contents keyed by spec URL. Ordered so the file is stable.
pub type CacheMap = BTreeMap<String, Arc<CacheEntry>>;

/// Short description of one cached spec.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    pub url: String,
    pub model: String,
    pub endpoints: usize,
    pub embedding_dim: usize,
}

/// Read the cache file.
///
/// Never fails: a missing file yields an empty map, an unreadable or
/// unparseable one is logged and also yields an empty map. Entries that break
/// their invariants are dropped individually.
pub fn load_cache_file(path: &Path) -> CacheMap {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Cache file does not exist");
        return CacheMap::new();
    }

    let mut map = match read_cache_file(path) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Error loading cache, starting empty");
            return CacheMap::new();
        }
    };

    map.retain(|url, entry| match entry.validate() {
        Ok(()) => true,
        Err(reason) => {
            tracing::warn!(url = %url, reason = %reason, "Dropping invalid cache entry");
            false
        }
    });

    tracing::info!(path = %path.display(), urls = map.len(), "Spec cache loaded");
    map
}

fn read_cache_file(path: &Path) -> Result<CacheMap> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::CacheCorrupt(format!("Failed to read cache file: {}", e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::CacheCorrupt(format!("Failed to parse cache file: {}", e)))
}

/// Write the full cache map.
///
/// Data goes to a temporary file in the target directory which is then
/// renamed over the old file, so a crash mid-write leaves the previous
/// contents intact. Missing parent directories are created.
pub fn save_cache_file(path: &Path, map: &CacheMap) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(dir).map_err(|e| {
        AppError::PersistenceError(format!("Failed to create cache directory: {}", e))
    })?;

    let data = serde_json::to_vec_pretty(map)
        .map_err(|e| AppError::PersistenceError(format!("Failed to encode cache: {}", e)))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| {
        AppError::PersistenceError(format!("Failed to create temporary cache file: {}", e))
    })?;

    tmp.write_all(&data)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| AppError::PersistenceError(format!("Failed to write cache file: {}", e)))?;

    tmp.persist(path)
        .map_err(|e| AppError::PersistenceError(format!("Failed to replace cache file: {}", e)))?;

    tracing::info!(
        path = %path.display(),
        urls = map.len(),
        size_bytes = data.len(),
        "Spec cache saved"
    );

    Ok(())
}

/// Handle to the on-disk spec cache.
///
/// The file is loaded on first access and written back after every insert.
/// All access goes through one async mutex, so a single `CacheStore` is the
/// only writer within a process. Each insert re-reads the file and merges
/// before writing, so entries added through another handle survive; two
/// inserts racing between that read and the rename can still lose one.
pub struct CacheStore {
    path: PathBuf,
    entries: Mutex<Option<CacheMap>>,
}

impl CacheStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, url: &str) -> Result<Option<Arc<CacheEntry>>> {
        let mut guard = self.entries.lock().await;
        let map = self.ensure_loaded(&mut guard).await?;
        Ok(map.get(url).cloned())
    }

    pub async fn contains(&self, url: &str) -> Result<bool> {
        Ok(self.get(url).await?.is_some())
    }

    /// Insert `entry` unless `url` is already cached, then persist.
    ///
    /// Returns `false` without touching the file when the URL is present.
    pub async fn put_if_absent(
        &self,
        url: &str,
        entry: impl Into<Arc<CacheEntry>>,
    ) -> Result<bool> {
        let entry = entry.into();
        entry.validate().map_err(AppError::ModelError)?;

        let mut guard = self.entries.lock().await;
        self.refresh(&mut guard).await?;
        let map = self.ensure_loaded(&mut guard).await?;

        if map.contains_key(url) {
            tracing::debug!(url, "URL already cached, skipping insert");
            return Ok(false);
        }

        map.insert(url.to_string(), entry);

        let snapshot = map.clone();
        if let Err(e) = self.save(snapshot).await {
            // keep memory in line with what is on disk
            map.remove(url);
            return Err(e);
        }

        Ok(true)
    }

    pub async fn summaries(&self) -> Result<Vec<CacheSummary>> {
        let mut guard = self.entries.lock().await;
        let map = self.ensure_loaded(&mut guard).await?;

        Ok(map
            .iter()
            .map(|(url, entry)| CacheSummary {
                url: url.clone(),
                model: entry.model.clone(),
                endpoints: entry.endpoint_documents.len(),
                embedding_dim: entry.embeddings.first().map_or(0, Vec::len),
            })
            .collect())
    }

    pub async fn len(&self) -> Result<usize> {
        let mut guard = self.entries.lock().await;
        Ok(self.ensure_loaded(&mut guard).await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    async fn ensure_loaded<'a>(&self, slot: &'a mut Option<CacheMap>) -> Result<&'a mut CacheMap> {
        if slot.is_none() {
            *slot = Some(self.load().await?);
        }

        Ok(slot.get_or_insert_with(CacheMap::new))
    }

    /// Merge the file's current entries into memory. On-disk entries win,
    /// entries only held in memory are kept.
    async fn refresh(&self, slot: &mut Option<CacheMap>) -> Result<()> {
        let mut merged = self.load().await?;
        if let Some(current) = slot.take() {
            for (url, entry) in current {
                merged.entry(url).or_insert(entry);
            }
        }
        *slot = Some(merged);
        Ok(())
    }

    async fn load(&self) -> Result<CacheMap> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || load_cache_file(&path))
            .await
            .map_err(|e| AppError::PersistenceError(format!("Cache load task failed: {}", e)))
    }

    async fn save(&self, map: CacheMap) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save_cache_file(&path, &map))
            .await
            .map_err(|e| AppError::PersistenceError(format!("Cache save task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::HttpMethod;
    use serde_json::json;
    use tempfile::tempdir;

    fn make_entry(model: &str) -> CacheEntry {
        let docs = vec![
            EndpointDocument::new("/pets", HttpMethod::Get, "List pets", ""),
            EndpointDocument::new("/pets", HttpMethod::Post, "Create pet", "Adds a pet"),
        ];
        let embeddings = vec![vec![0.123_456_79, -0.5, 1e-7], vec![0.333_333_34, 0.25, 0.0]];
        CacheEntry::new(json!({ "paths": {} }), docs, embeddings, model).unwrap()
    }

    #[test]
    fn test_entry_rejects_length_mismatch() {
        let docs = vec![EndpointDocument::new("/a", HttpMethod::Get, "", "")];
        let result = CacheEntry::new(json!({}), docs, vec![], "m");
        assert!(matches!(result, Err(AppError::ModelError(_))));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let mut map = CacheMap::new();
        map.insert("https://a.example/openapi.json".into(), Arc::new(make_entry("voyage-3.5")));

        save_cache_file(&path, &map).unwrap();
        let loaded = load_cache_file(&path);

        assert_eq!(loaded, map);
        assert_eq!(
            loaded["https://a.example/openapi.json"].embeddings[0],
            vec![0.123_456_79_f32, -0.5, 1e-7]
        );
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        assert!(load_cache_file(&dir.path().join("absent.json")).is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(load_cache_file(&path).is_empty());
    }

    #[test]
    fn test_invalid_entries_are_dropped_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let good = make_entry("m");
        let mut bad = make_entry("m");
        bad.embeddings.pop();

        let raw = json!({
            "https://good.example": good,
            "https://bad.example": bad,
        });
        fs::write(&path, raw.to_string()).unwrap();

        let loaded = load_cache_file(&path);
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("https://good.example"));
    }

    #[tokio::test]
    async fn test_put_if_absent_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let store = CacheStore::open(&path);
        let url = "https://a.example/openapi.json";

        assert!(store.put_if_absent(url, make_entry("first")).await.unwrap());
        let before = fs::read(&path).unwrap();

        assert!(!store.put_if_absent(url, make_entry("second")).await.unwrap());
        let after = fs::read(&path).unwrap();

        assert_eq!(before, after);
        assert_eq!(store.get(url).await.unwrap().unwrap().model, "first");
    }

    #[tokio::test]
    async fn test_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let url = "https://a.example/openapi.json";

        {
            let store = CacheStore::open(&path);
            store.put_if_absent(url, make_entry("m")).await.unwrap();
        }

        let reopened = CacheStore::open(&path);
        assert!(reopened.contains(url).await.unwrap());
        assert!(reopened.get("https://other.example").await.unwrap().is_none());

        let summaries = reopened.summaries().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].endpoints, 2);
        assert_eq!(summaries[0].embedding_dim, 3);
    }

    #[tokio::test]
    async fn test_second_handle_entries_survive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let server = CacheStore::open(&path);
        let cli = CacheStore::open(&path);

        assert_eq!(server.len().await.unwrap(), 0);
        assert!(cli.put_if_absent("https://cli.example", make_entry("m")).await.unwrap());

        // the server's snapshot predates the other handle's insert
        assert!(!server
            .put_if_absent("https://cli.example", make_entry("other"))
            .await
            .unwrap());
        assert!(server
            .put_if_absent("https://server.example", make_entry("m"))
            .await
            .unwrap());

        let reopened = load_cache_file(&path);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened["https://cli.example"].model, "m");
        assert!(reopened.contains_key("https://server.example"));
        assert_eq!(server.len().await.unwrap(), 2);
    }
}
