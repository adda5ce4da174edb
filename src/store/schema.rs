use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const SCHEMA_VERSION: u32 = 1;

/// On-disk layout of `store.json`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreData {
    pub schema_version: u32,
    #[serde(default)]
    pub entries: BTreeMap<String, String>,
}

impl Default for StoreData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl StoreData {
    /// Check if loaded data has a stale schema version and needs reset.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
