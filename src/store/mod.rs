pub mod json_store;
pub mod memory;
pub mod schema;

use thiserror::Error;

pub use json_store::JsonStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode stored data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String-valued persistent entries. Callers namespace their own keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes every entry or none of them.
    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<(), StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.set_all(&[(key, value)])
    }
}
