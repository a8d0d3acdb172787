//! Storage tiers and the backend contract used by secure stores.

mod memory;

pub use memory::MemoryBackend;

use crate::SdrResult;

/// Where a write lands.
///
/// `Transient` records live in the store's in-process overlay and shadow any
/// persisted record with the same key. `Persistent` records go to the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tier {
    Transient,
    #[default]
    Persistent,
}

/// Persistence capability behind a secure store.
///
/// Backends only ever see ciphertext. Every operation takes the store's
/// location; backends that have no notion of one ignore it.
///
/// # Implementors
///
/// - [`MemoryBackend`]: process-local map, nothing survives a restart.
/// - `sdr_storage::FileBackend`: one directory, one file per record.
pub trait StorageBackend: Send {
    /// Short name used for logging.
    fn name(&self) -> &'static str;

    /// Whether the location exists and can hold records.
    fn location_exists(&self, location: &str) -> bool;

    /// Whether a record exists under `key` at the location.
    fn record_exists(&self, location: &str, key: &str) -> bool;

    /// Names of the records directly under the location, in name order.
    fn list_records(&self, location: &str) -> SdrResult<Vec<String>>;

    /// Create the location, including missing ancestors. Idempotent.
    fn setup_location(&mut self, location: &str) -> SdrResult<()>;

    /// Full contents of a record, or `None` if it does not exist.
    ///
    /// A record that exists but cannot be read completely comes back as
    /// `Some` with no bytes, so the following decode fails loudly.
    fn read_record(&self, location: &str, key: &str) -> SdrResult<Option<Vec<u8>>>;

    /// Create or replace a record with exactly `value`.
    fn write_record(&mut self, location: &str, key: &str, value: &[u8]) -> SdrResult<()>;

    /// Remove a record. Removing an absent record is a no-op.
    fn remove_record(&mut self, location: &str, key: &str) -> SdrResult<()>;

    /// Remove the (expected empty) location. Removing an absent location is a no-op.
    fn remove_location(&mut self, location: &str) -> SdrResult<()>;
}
