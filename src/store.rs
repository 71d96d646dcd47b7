//! LayoutStore - device-local layout persistence with a bundled fallback
//!
//! ```text
//! load(kind):  storage[key] ──decode──► Saved
//!                   │ missing / malformed (logged) / unreadable (returned)
//!                   ▼
//!              bundled asset ──────────► Attached
//!                   │ none for this diagram
//!                   ▼
//!                 Absent
//! ```
//!
//! The store knows nothing about nodes. It moves whole blobs under a fixed
//! key per diagram and applies the lenient shape check from
//! `atlas_graph::decode_layout`.

use crate::error::StoreError;
use atlas_graph::{decode_layout, encode_layout, PersistedLayout};
use atlas_types::{DiagramKind, LayoutBlob};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Bundled default layout for the unified chart, read once per store
const BUNDLED_UNIFIED_CHART: &str = include_str!("../assets/unified-chart-layout.json");

// =============================================================================
// STORAGE BACKENDS
// =============================================================================

/// Key/value storage for serialized layout blobs
pub trait LayoutStorage {
    /// Contents under `key`, or None if nothing was ever written
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the contents under `key` in one step
    fn write(&self, key: &str, contents: &str) -> Result<(), StoreError>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl LayoutStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;

        // Write beside the target, then rename over it, so a crash never
        // leaves a half-written blob behind
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(contents.as_bytes()).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(self.path_for(key))
            .map_err(|e| io_err(e.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// In-process storage with an optional byte quota
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    /// Total bytes across all keys
    quota: Option<usize>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            quota: Some(quota),
            ..Self::default()
        }
    }

    /// Storage that fails every operation
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Seed raw contents (e.g. a corrupted blob) without quota checks
    pub fn insert_raw(&self, key: &str, contents: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), contents.to_string());
        }
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("storage disabled".into()));
        }
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("storage lock poisoned".into()))
    }
}

impl LayoutStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), StoreError> {
        let mut entries = self.entries()?;
        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let needed = others + contents.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        entries.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

// =============================================================================
// LAYOUT STORE
// =============================================================================

/// Result of [`LayoutStore::load`]: the best available layout, plus the
/// storage error if the device-local read itself failed
#[derive(Debug)]
pub struct LoadOutcome {
    pub layout: PersistedLayout,
    pub read_error: Option<StoreError>,
}

/// Persisted layouts for both diagrams
pub struct LayoutStore {
    storage: Box<dyn LayoutStorage>,
    bundled: HashMap<DiagramKind, LayoutBlob>,
}

impl std::fmt::Debug for LayoutStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutStore")
            .field("bundled", &self.bundled.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl LayoutStore {
    /// Store over `storage` with the bundled default assets
    pub fn new(storage: impl LayoutStorage + 'static) -> Self {
        let mut store = Self::without_bundled(storage);
        match decode_layout(BUNDLED_UNIFIED_CHART) {
            Ok(decoded) => {
                store.bundled.insert(DiagramKind::UnifiedChart, decoded.blob);
            }
            Err(e) => tracing::warn!("Bundled unified chart layout is unusable: {}", e),
        }
        store
    }

    /// Store with no bundled defaults
    pub fn without_bundled(storage: impl LayoutStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            bundled: HashMap::new(),
        }
    }

    /// Builder: replace the bundled default for one diagram
    pub fn with_bundled(mut self, kind: DiagramKind, blob: LayoutBlob) -> Self {
        self.bundled.insert(kind, blob);
        self
    }

    pub fn bundled(&self, kind: DiagramKind) -> Option<&LayoutBlob> {
        self.bundled.get(&kind)
    }

    /// Device-local blob if usable, else the bundled default, else Absent
    ///
    /// Always yields a layout. Malformed data is logged and skipped; a failed
    /// read is handed back in `read_error` alongside the fallback.
    pub fn load(&self, kind: DiagramKind) -> LoadOutcome {
        let key = kind.storage_key();
        let mut read_error = None;
        match self.storage.read(key) {
            Ok(Some(text)) => match decode_layout(&text) {
                Ok(decoded) => {
                    if decoded.dropped > 0 {
                        tracing::warn!(
                            "Dropped {} malformed entries from saved layout {}",
                            decoded.dropped,
                            key
                        );
                    }
                    if decoded.legacy {
                        tracing::debug!("Saved layout {} uses the legacy flat shape", key);
                    }
                    tracing::info!("Loaded saved layout {} ({} entries)", key, decoded.blob.len());
                    return LoadOutcome {
                        layout: PersistedLayout::Saved(decoded.blob),
                        read_error: None,
                    };
                }
                Err(e) => {
                    tracing::warn!("Ignoring malformed saved layout {}: {}", key, e);
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Could not read saved layout {}: {}", key, e);
                read_error = Some(e);
            }
        }

        let layout = match self.bundled.get(&kind) {
            Some(blob) => {
                tracing::info!("Using bundled default layout for {}", key);
                PersistedLayout::Attached(blob.clone())
            }
            None => PersistedLayout::Absent,
        };
        LoadOutcome { layout, read_error }
    }

    /// Persist a blob under the diagram's key
    pub fn save(&self, kind: DiagramKind, blob: &LayoutBlob) -> Result<(), StoreError> {
        let key = kind.storage_key();
        let text = encode_layout(blob)?;
        self.storage.write(key, &text)?;
        tracing::info!("Saved layout {} ({} positions)", key, blob.len());
        Ok(())
    }

    /// Forget the device-local blob (the bundled default applies again)
    pub fn clear(&self, kind: DiagramKind) -> Result<(), StoreError> {
        self.storage.remove(kind.storage_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_types::{LabelAnchor, Position};

    fn blob() -> LayoutBlob {
        let mut blob = LayoutBlob::default();
        blob.positions.insert("provider-a".into(), Position::new(-12.5, 300.25));
        blob.positions.insert("category-x".into(), Position::new(264.0, 0.0));
        blob.label_anchors.insert("category-x".into(), LabelAnchor::End);
        blob.layout_name = Some("balanced".into());
        blob
    }

    #[test]
    fn test_memory_round_trip() {
        let store = LayoutStore::without_bundled(MemoryStorage::new());
        assert_eq!(store.load(DiagramKind::UnifiedChart).layout, PersistedLayout::Absent);
        store.save(DiagramKind::UnifiedChart, &blob()).unwrap();
        assert_eq!(
            store.load(DiagramKind::UnifiedChart).layout,
            PersistedLayout::Saved(blob())
        );
        // Keys are per diagram
        assert_eq!(
            store.load(DiagramKind::DocumentationMap).layout,
            PersistedLayout::Absent
        );
    }

    #[test]
    fn test_file_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("layouts"));
        let path = storage.path_for("unified-chart-layout");
        let store = LayoutStore::without_bundled(storage);

        store.save(DiagramKind::UnifiedChart, &blob()).unwrap();
        assert!(path.exists());
        assert_eq!(
            store.load(DiagramKind::UnifiedChart).layout,
            PersistedLayout::Saved(blob())
        );

        store.clear(DiagramKind::UnifiedChart).unwrap();
        store.clear(DiagramKind::UnifiedChart).unwrap();
        assert_eq!(store.load(DiagramKind::UnifiedChart).layout, PersistedLayout::Absent);
    }

    #[test]
    fn test_malformed_saved_blob_falls_back_to_bundled() {
        let storage = MemoryStorage::new();
        storage.insert_raw("unified-chart-layout", "{not json");
        let store = LayoutStore::without_bundled(storage)
            .with_bundled(DiagramKind::UnifiedChart, blob());
        assert_eq!(
            store.load(DiagramKind::UnifiedChart).layout,
            PersistedLayout::Attached(blob())
        );
    }

    #[test]
    fn test_legacy_flat_blob_loads() {
        let storage = MemoryStorage::new();
        storage.insert_raw(
            "documentation-map-layout",
            r#"{"provider:a": {"x": 1, "y": 2}}"#,
        );
        let store = LayoutStore::without_bundled(storage);
        let PersistedLayout::Saved(loaded) = store.load(DiagramKind::DocumentationMap).layout else {
            panic!("expected saved layout");
        };
        assert_eq!(loaded.positions["provider:a"], Position::new(1.0, 2.0));
    }

    #[test]
    fn test_quota_exceeded_is_reported() {
        let store = LayoutStore::without_bundled(MemoryStorage::with_quota(16));
        let err = store.save(DiagramKind::UnifiedChart, &blob()).unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { quota: 16, .. }));
        assert_eq!(store.load(DiagramKind::UnifiedChart).layout, PersistedLayout::Absent);
    }

    #[test]
    fn test_unavailable_storage_degrades_to_bundled() {
        let store =
            LayoutStore::without_bundled(MemoryStorage::unavailable()).with_bundled(DiagramKind::UnifiedChart, blob());
        assert!(matches!(
            store.save(DiagramKind::UnifiedChart, &blob()),
            Err(StoreError::Unavailable(_))
        ));
        let outcome = store.load(DiagramKind::UnifiedChart);
        assert_eq!(outcome.layout, PersistedLayout::Attached(blob()));
        assert!(matches!(outcome.read_error, Some(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_missing_or_malformed_blob_is_not_a_read_error() {
        let storage = MemoryStorage::new();
        storage.insert_raw("documentation-map-layout", "[1, 2]");
        let store = LayoutStore::without_bundled(storage);
        assert!(store.load(DiagramKind::DocumentationMap).read_error.is_none());
        assert!(store.load(DiagramKind::UnifiedChart).read_error.is_none());
    }

    #[test]
    fn test_bundled_asset_decodes() {
        let store = LayoutStore::new(MemoryStorage::new());
        let bundled = store.bundled(DiagramKind::UnifiedChart).unwrap();
        assert!(!bundled.is_empty());
        assert!(bundled.positions.values().all(|p| p.is_finite()));
        assert!(store.bundled(DiagramKind::DocumentationMap).is_none());
    }
}
