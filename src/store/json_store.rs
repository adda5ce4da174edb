use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::store::schema::StoreData;
use crate::store::{KeyValueStore, StoreError};

const STORE_FILE: &str = "store.json";

/// Key-value entries kept in a single JSON file, rewritten atomically on each set.
pub struct JsonStore {
    base_dir: PathBuf,
    data: StoreData,
}

impl JsonStore {
    pub fn new() -> Result<Self, StoreError> {
        Self::with_base_dir(default_data_dir())
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&base_dir)?;
        let data = load_data(&base_dir.join(STORE_FILE))?;
        Ok(Self { base_dir, data })
    }

    fn file_path(&self) -> PathBuf {
        self.base_dir.join(STORE_FILE)
    }

    fn save(&self, data: &StoreData) -> Result<(), StoreError> {
        let path = self.file_path();
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

/// `<data_dir>/dailyword`, falling back to the working directory.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dailyword")
}

/// A missing file is a fresh store. A file that exists but can't be parsed, or
/// carries an old schema, is discarded (and overwritten on the next write).
fn load_data(path: &Path) -> Result<StoreData, StoreError> {
    if !path.exists() {
        return Ok(StoreData::default());
    }
    let bytes = fs::read(path)?;
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(err) => {
            log::warn!("ignoring unreadable {}: {err}", path.display());
            return Ok(StoreData::default());
        }
    };
    match serde_json::from_str::<StoreData>(&content) {
        Ok(data) if !data.needs_reset() => Ok(data),
        Ok(data) => {
            log::warn!(
                "resetting {} (schema version {})",
                path.display(),
                data.schema_version
            );
            Ok(StoreData::default())
        }
        Err(err) => {
            log::warn!("ignoring unreadable {}: {err}", path.display());
            Ok(StoreData::default())
        }
    }
}

impl KeyValueStore for JsonStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.data.entries.get(key).cloned())
    }

    /// One file write for the whole batch. The in-memory entries are only
    /// updated once it succeeded.
    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        let unchanged = entries
            .iter()
            .all(|&(key, value)| self.data.entries.get(key).map(String::as_str) == Some(value));
        if unchanged {
            return Ok(());
        }
        let mut next = self.data.clone();
        for &(key, value) in entries {
            next.entries.insert(key.to_string(), value.to_string());
        }
        self.save(&next)?;
        self.data = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_set_persists_across_reopen() {
        let (dir, mut store) = make_test_store();
        store.set("dailyword:streak", "3").unwrap();

        let reopened = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            reopened.get("dailyword:streak").unwrap().as_deref(),
            Some("3")
        );
    }

    #[test]
    fn test_no_residual_tmp_file() {
        let (dir, mut store) = make_test_store();
        store.set("a", "1").unwrap();
        let tmp_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(tmp_files.is_empty(), "no residual .tmp files");
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STORE_FILE), "not json {").unwrap();
        let mut store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert!(store.get("anything").unwrap().is_none());

        // And the next write replaces it with a valid file.
        store.set("k", "v").unwrap();
        let content = fs::read_to_string(dir.path().join(STORE_FILE)).unwrap();
        let data: StoreData = serde_json::from_str(&content).unwrap();
        assert_eq!(data.entries.get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_non_utf8_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STORE_FILE), [0xff, 0xfe, 0x7b]).unwrap();
        let mut store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert!(store.get("dailyword:streak").unwrap().is_none());

        store.set("dailyword:streak", "1").unwrap();
        let reopened = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            reopened.get("dailyword:streak").unwrap().as_deref(),
            Some("1")
        );
    }

    #[test]
    fn test_stale_schema_resets() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(STORE_FILE),
            r#"{"schema_version": 99, "entries": {"k": "v"}}"#,
        )
        .unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert!(store.get("k").unwrap().is_none());
    }

    #[test]
    fn test_failed_write_keeps_previous_value() {
        let (dir, mut store) = make_test_store();
        store.set("k", "old").unwrap();

        // Point the store at a directory that no longer exists so the write fails.
        let gone = dir.path().join("gone");
        store.base_dir = gone;
        assert!(store.set("k", "new").is_err());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn test_failed_batch_writes_nothing() {
        let (dir, mut store) = make_test_store();
        store.set_all(&[("a", "1"), ("b", "1")]).unwrap();

        store.base_dir = dir.path().join("gone");
        assert!(store.set_all(&[("a", "2"), ("b", "2")]).is_err());
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("1"));

        let reopened = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("1"));
    }
}
