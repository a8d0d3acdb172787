use sdr_core::{
    storage::{MemoryBackend, StorageBackend, Tier},
    transform::{Password, RandomSource, Transform},
    SdrError, SdrResult,
};
use tracing::instrument;

use crate::{aes_transform::AesGcmTransform, secure_store::SecureStore};

// The slot is emptied before every conceal/reveal returns.
const SLOT: &str = "conceal-slot";
const NO_LOCATION: &str = "";

/// Stateless conceal/reveal over a memory-only secure store.
///
/// Concealing the same data twice yields different bytes; any revealer
/// initialized with the same security string recovers the original.
pub struct DisconnectedStore<T: Transform = AesGcmTransform> {
    store: SecureStore<MemoryBackend, T>,
}

impl DisconnectedStore<AesGcmTransform> {
    pub fn new(random: impl RandomSource + 'static) -> Self {
        Self::with_transform(AesGcmTransform::new(), random)
    }
}

impl<T: Transform> DisconnectedStore<T> {
    pub fn with_transform(transform: T, random: impl RandomSource + 'static) -> Self {
        Self {
            store: SecureStore::with_parts(MemoryBackend::new(), transform, random),
        }
    }

    /// Set the security string shared by concealer and revealer.
    pub fn initialize(&mut self, security: impl Into<Password>) -> SdrResult<()> {
        self.store.initialize(NO_LOCATION, security)
    }

    #[instrument(level = "debug", skip_all, fields(bytes = plaintext.len()))]
    pub fn conceal(&mut self, plaintext: &[u8]) -> SdrResult<Vec<u8>> {
        self.store.write(SLOT, plaintext, Tier::Persistent)?;
        self.store
            .backend_mut()
            .take(SLOT)
            .ok_or_else(|| SdrError::configuration(NO_LOCATION, "concealed record went missing"))
    }

    #[instrument(level = "debug", skip_all, fields(bytes = ciphertext.len()))]
    pub fn reveal(&mut self, ciphertext: &[u8]) -> SdrResult<Vec<u8>> {
        self.store
            .backend_mut()
            .write_record(NO_LOCATION, SLOT, ciphertext)?;
        let revealed = self.store.read(SLOT);
        self.store.backend_mut().remove_record(NO_LOCATION, SLOT)?;

        revealed?.ok_or_else(|| SdrError::configuration(NO_LOCATION, "revealed record went missing"))
    }
}

#[cfg(test)]
mod tests {
    use sdr_core::{license, transform::TransformStatus};

    use super::*;
    use crate::random::OsRandom;

    const SECURITY: &str = "SecurityString";

    fn disconnected() -> DisconnectedStore {
        license::init_license("SDR Test Co", "TEST-LICENSE").expect("license");
        let mut store = DisconnectedStore::new(OsRandom);
        store.initialize(SECURITY).expect("initialize");
        store
    }

    #[test]
    fn conceal_twice_differs_and_both_reveal() {
        let mut concealer = disconnected();
        let first = concealer.conceal(b"top-secret-payload").expect("conceal");
        let second = concealer.conceal(b"top-secret-payload").expect("conceal");
        assert_ne!(first, second);

        let mut revealer = disconnected();
        assert_eq!(revealer.reveal(&first).expect("reveal"), b"top-secret-payload");
        assert_eq!(revealer.reveal(&second).expect("reveal"), b"top-secret-payload");
    }

    #[test]
    fn nothing_lingers_after_calls() {
        let mut store = disconnected();
        let concealed = store.conceal(b"data").expect("conceal");
        assert!(store.store.backend().is_empty());

        store.reveal(&concealed).expect("reveal");
        assert!(store.store.backend().is_empty());

        store.reveal(b"garbage").expect_err("not a ciphertext");
        assert!(store.store.backend().is_empty());
    }

    #[test]
    fn mismatched_security_fails() {
        let mut concealer = disconnected();
        let concealed = concealer.conceal(b"data").expect("conceal");

        let mut revealer = DisconnectedStore::new(OsRandom);
        revealer.initialize("Zx9!kQ2#vLm4").expect("initialize");
        let err = revealer.reveal(&concealed).expect_err("wrong security");
        assert!(matches!(
            err,
            SdrError::Transform {
                status: TransformStatus::AuthenticationFailed
            }
        ));
    }

    #[test]
    fn empty_payload_round_trips() {
        let mut store = disconnected();
        let concealed = store.conceal(b"").expect("conceal");
        assert!(!concealed.is_empty());
        assert_eq!(store.reveal(&concealed).expect("reveal"), Vec::<u8>::new());
    }
}
