use std::collections::BTreeMap;

use tracing::debug;

use super::StorageBackend;
use crate::SdrResult;

/// In-process backend that keeps ciphertext records in a map and ignores the
/// location. Paired with a secure store it acts as an encrypted in-memory
/// cache; nothing survives a restart.
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    records: BTreeMap<String, Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove a record and hand back its bytes in one step.
    pub fn take(&mut self, key: &str) -> Option<Vec<u8>> {
        self.records.remove(key)
    }
}

impl StorageBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    // An empty map has nothing to set up or tear down.
    fn location_exists(&self, _location: &str) -> bool {
        !self.records.is_empty()
    }

    fn record_exists(&self, _location: &str, key: &str) -> bool {
        self.records.contains_key(key)
    }

    fn list_records(&self, _location: &str) -> SdrResult<Vec<String>> {
        Ok(self.records.keys().cloned().collect())
    }

    fn setup_location(&mut self, _location: &str) -> SdrResult<()> {
        debug!(dropped = self.records.len(), "resetting memory backend");
        self.records.clear();
        Ok(())
    }

    fn read_record(&self, _location: &str, key: &str) -> SdrResult<Option<Vec<u8>>> {
        Ok(self.records.get(key).cloned())
    }

    fn write_record(&mut self, _location: &str, key: &str, value: &[u8]) -> SdrResult<()> {
        self.records.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove_record(&mut self, _location: &str, key: &str) -> SdrResult<()> {
        self.records.remove(key);
        Ok(())
    }

    fn remove_location(&mut self, _location: &str) -> SdrResult<()> {
        self.records.clear();
        Ok(())
    }
}
