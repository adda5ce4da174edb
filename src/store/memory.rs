use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::store::{KeyValueStore, StoreError};

/// In-memory store. Clones share the same entries, so a test can keep a
/// handle and inspect what a tracker wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<(), StoreError> {
        let mut map = self.entries.borrow_mut();
        for &(key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_entries() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_key_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("absent").unwrap().is_none());
        assert!(store.is_empty());
    }
}
