//! Durable listing-date map
//!
//! A listing date costs one candle request per symbol and never changes, so
//! the map is kept on disk as pretty-printed JSON
//! (`{"BTCUSDT": 1568102400000, ...}`) and reloaded at startup. Neither load
//! nor save failures stop the process; they come back as explicit outcomes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::ListingMap;

/// Errors reading or writing the listing file
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed listing cache {path:?}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize listing cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// What [`ListingStore::load`] found
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(ListingMap),
    /// First run: no file yet
    Missing,
    /// File present but unreadable or unparsable; start empty
    Unreadable(PersistError),
}

impl LoadOutcome {
    /// The loaded map, or an empty one for every other outcome
    pub fn into_map(self) -> ListingMap {
        match self {
            LoadOutcome::Loaded(map) => map,
            LoadOutcome::Missing | LoadOutcome::Unreadable(_) => ListingMap::new(),
        }
    }
}

/// What [`ListingStore::save`] did
#[derive(Debug)]
pub enum SaveOutcome {
    Saved { entries: usize },
    /// Nothing on disk changed; the in-memory map is still authoritative
    Failed(PersistError),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// JSON file holding the listing map
#[derive(Debug, Clone)]
pub struct ListingStore {
    path: PathBuf,
}

impl ListingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> LoadOutcome {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No listing cache on disk");
                return LoadOutcome::Missing;
            }
            Err(source) => {
                return LoadOutcome::Unreadable(PersistError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_slice::<ListingMap>(&data) {
            Ok(map) => {
                info!(path = ?self.path, entries = map.len(), "Loaded listing dates from disk");
                LoadOutcome::Loaded(map)
            }
            Err(source) => LoadOutcome::Unreadable(PersistError::Malformed {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Overwrite the file with `listings`, creating its directory if needed.
    ///
    /// The new content is written to a sibling temp file and renamed over the
    /// old one, so a crash mid-write leaves the previous file intact.
    pub fn save(&self, listings: &ListingMap) -> SaveOutcome {
        match self.write(listings) {
            Ok(()) => {
                info!(path = ?self.path, entries = listings.len(), "Synced listing dates to disk");
                SaveOutcome::Saved {
                    entries: listings.len(),
                }
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Failed to persist listing dates");
                SaveOutcome::Failed(e)
            }
        }
    }

    fn write(&self, listings: &ListingMap) -> Result<(), PersistError> {
        let io_err = |source| PersistError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let data = serde_json::to_vec_pretty(listings)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn sample() -> ListingMap {
        ListingMap::from([
            ("ETHUSDT".to_string(), 1_574_726_400_000),
            ("BTCUSDT".to_string(), 1_568_102_400_000),
        ])
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ListingStore::new(dir.path().join("listing_cache.json"));

        let outcome = store.load();
        assert_matches!(outcome, LoadOutcome::Missing);
        assert!(outcome.into_map().is_empty());
    }

    #[test]
    fn test_malformed_file_is_recoverable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing_cache.json");
        fs::write(&path, "{not json").unwrap();

        let outcome = ListingStore::new(&path).load();
        assert_matches!(outcome, LoadOutcome::Unreadable(PersistError::Malformed { .. }));
        assert!(outcome.into_map().is_empty());
    }

    #[test]
    fn test_wrong_value_type_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing_cache.json");
        fs::write(&path, r#"{"BTCUSDT": "yesterday"}"#).unwrap();

        assert_matches!(
            ListingStore::new(&path).load(),
            LoadOutcome::Unreadable(PersistError::Malformed { .. })
        );
    }

    #[test]
    fn test_directory_in_place_of_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = ListingStore::new(dir.path()).load();
        assert_matches!(outcome, LoadOutcome::Unreadable(PersistError::Io { .. }));
    }

    #[test]
    fn test_save_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("listing_cache.json");
        let store = ListingStore::new(&path);

        assert_matches!(store.save(&sample()), SaveOutcome::Saved { entries: 2 });
        let first_bytes = fs::read(&path).unwrap();

        // A second store stands in for a fresh process
        let reloaded = ListingStore::new(&path).load().into_map();
        assert_eq!(reloaded, sample());

        let copy = ListingStore::new(dir.path().join("copy.json"));
        assert!(copy.save(&reloaded).is_saved());
        assert_eq!(fs::read(copy.path()).unwrap(), first_bytes);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_saved_format_is_pretty_sorted_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = ListingStore::new(dir.path().join("listing_cache.json"));
        store.save(&sample());

        let text = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            text,
            "{\n  \"BTCUSDT\": 1568102400000,\n  \"ETHUSDT\": 1574726400000\n}"
        );
    }

    #[test]
    fn test_save_overwrites_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = ListingStore::new(dir.path().join("listing_cache.json"));
        store.save(&sample());

        let smaller = ListingMap::from([("SOLUSDT".to_string(), 1)]);
        store.save(&smaller);
        assert_eq!(store.load().into_map(), smaller);
    }

    #[test]
    fn test_save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let store = ListingStore::new(blocker.join("listing_cache.json"));
        assert_matches!(store.save(&sample()), SaveOutcome::Failed(PersistError::Io { .. }));
    }
}
