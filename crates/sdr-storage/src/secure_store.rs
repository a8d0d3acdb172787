use std::collections::{BTreeSet, HashMap};

use sdr_core::{
    license,
    storage::{MemoryBackend, StorageBackend, Tier},
    transform::{Password, RandomSource, Transform, TransformState, TransformStatus},
    SdrError, SdrResult,
};
use tracing::{debug, instrument};
use zeroize::Zeroizing;

use crate::{aes_transform::AesGcmTransform, file_backend::FileBackend};

/// Secure data replacement store.
///
/// Values are only ever kept in transformed form: `write` encodes before
/// handing bytes to the overlay or the backend, `read` decodes on the way out.
/// Transient writes land in an in-process overlay that shadows persisted
/// records with the same key for `read` and `remove`.
///
/// One instance owns one encoder/decoder state pair and one buffer of each
/// kind, mutated in place on every call. Confine an instance to one thread or
/// guard it with a mutex for the full duration of each call.
pub struct SecureStore<B: StorageBackend = FileBackend, T: Transform = AesGcmTransform> {
    backend: B,
    transform: T,
    random: Box<dyn RandomSource>,
    location: String,
    overlay: HashMap<String, Vec<u8>>,
    session: Option<Session>,
    encode_buffer: Vec<u8>,
    decode_buffer: Zeroizing<Vec<u8>>,
}

/// Everything `initialize` sets up and `remove_all` tears down.
struct Session {
    password: Password,
    encoder: TransformState,
    decoder: TransformState,
}

impl SecureStore<FileBackend, AesGcmTransform> {
    /// File-backed store using the bundled AES-GCM engine.
    pub fn new(random: impl RandomSource + 'static) -> Self {
        Self::with_parts(FileBackend::new(), AesGcmTransform::new(), random)
    }
}

impl SecureStore<MemoryBackend, AesGcmTransform> {
    /// Purely in-memory secure cache using the bundled AES-GCM engine.
    pub fn in_memory(random: impl RandomSource + 'static) -> Self {
        Self::with_parts(MemoryBackend::new(), AesGcmTransform::new(), random)
    }
}

impl<B: StorageBackend, T: Transform> SecureStore<B, T> {
    pub fn with_parts(backend: B, transform: T, random: impl RandomSource + 'static) -> Self {
        Self {
            backend,
            transform,
            random: Box::new(random),
            location: String::new(),
            overlay: HashMap::new(),
            session: None,
            encode_buffer: Vec::new(),
            decode_buffer: Zeroizing::new(Vec::new()),
        }
    }

    /// Bind the store to `location` and `password` and allocate transform state.
    ///
    /// An empty location means no persistent tier; an empty password means no
    /// password. The password is fixed until `remove_all`. A missing location is
    /// created with all its ancestors.
    #[instrument(level = "debug", skip(self, password), fields(backend = self.backend.name()))]
    pub fn initialize(&mut self, location: &str, password: impl Into<Password>) -> SdrResult<()> {
        if self.session.is_some() {
            return Err(SdrError::AlreadyInitialized);
        }
        if !license::is_initialized() {
            return Err(TransformStatus::LicenseError.into());
        }

        if !self.backend.location_exists(location) {
            self.backend.setup_location(location)?;
        }

        self.location = location.to_string();
        self.session = Some(Session {
            password: password.into(),
            encoder: TransformState::with_size(self.transform.encoder_state_bytes()),
            decoder: TransformState::with_size(self.transform.decoder_state_bytes()),
        });
        debug!(engine = self.transform.name(), "secure store initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Encode `value` and store it under `key` in the given tier, replacing any
    /// previous record in that tier. A transient write leaves the persistent
    /// tier untouched; a persistent write leaves any shadowing overlay entry in
    /// place.
    #[instrument(level = "debug", skip(self, value))]
    pub fn write(&mut self, key: &str, value: impl AsRef<[u8]>, tier: Tier) -> SdrResult<()> {
        let session = self.session.as_mut().ok_or(SdrError::NotInitialized)?;
        let len = encode_with(
            &self.transform,
            session,
            &mut self.encode_buffer,
            &mut *self.random,
            value.as_ref(),
        )?;
        let ciphertext = &self.encode_buffer[..len];

        match tier {
            Tier::Transient => {
                self.overlay.insert(key.to_string(), ciphertext.to_vec());
                Ok(())
            }
            Tier::Persistent => self
                .backend
                .write_record(&self.location, key, ciphertext),
        }
    }

    /// Decode the record under `key`, overlay first. `Ok(None)` if neither tier
    /// has it.
    #[instrument(level = "debug", skip(self))]
    pub fn read(&mut self, key: &str) -> SdrResult<Option<Vec<u8>>> {
        let persisted;
        let ciphertext: &[u8] = match self.overlay.get(key) {
            Some(ciphertext) => ciphertext,
            None => match self.backend.read_record(&self.location, key)? {
                Some(bytes) => {
                    persisted = bytes;
                    &persisted
                }
                None => return Ok(None),
            },
        };

        let session = self.session.as_mut().ok_or(SdrError::NotInitialized)?;
        let plaintext = decode_with(&self.transform, session, &mut self.decode_buffer, ciphertext)?;
        Ok(Some(plaintext))
    }

    /// Like [`read`](Self::read) for records holding UTF-8 text.
    pub fn read_string(&mut self, key: &str) -> SdrResult<Option<String>> {
        match self.read(key)? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| SdrError::NotUtf8 {
                    key: key.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Remove `key` from the overlay if it is there, otherwise from the backend.
    /// Removing an absent key is a no-op.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, key: &str) -> SdrResult<()> {
        if self.overlay.remove(key).is_some() {
            return Ok(());
        }
        self.backend.remove_record(&self.location, key)
    }

    /// Clear the overlay, delete every persisted record and the location itself,
    /// and drop the transform state. The store must be initialized again before
    /// the next write.
    #[instrument(level = "debug", skip(self), fields(location = %self.location))]
    pub fn remove_all(&mut self) -> SdrResult<()> {
        self.overlay.clear();

        if self.backend.location_exists(&self.location) {
            for record in self.backend.list_records(&self.location)? {
                self.backend.remove_record(&self.location, &record)?;
            }
            self.backend.remove_location(&self.location)?;
        }

        self.session = None;
        Ok(())
    }

    /// Keys visible to `read`: overlay keys plus persisted records, sorted.
    pub fn records(&self) -> SdrResult<Vec<String>> {
        let mut keys: BTreeSet<String> = self.overlay.keys().cloned().collect();
        if self.backend.location_exists(&self.location) {
            keys.extend(self.backend.list_records(&self.location)?);
        }
        Ok(keys.into_iter().collect())
    }

    #[cfg(test)]
    pub(crate) fn buffer_capacities(&self) -> (usize, usize) {
        (self.encode_buffer.len(), self.decode_buffer.len())
    }
}

fn encode_with<T: Transform>(
    transform: &T,
    session: &mut Session,
    buffer: &mut Vec<u8>,
    random: &mut dyn RandomSource,
    plaintext: &[u8],
) -> SdrResult<usize> {
    let required = transform.encode_buffer_bytes(&session.encoder, plaintext.len());
    if buffer.len() < required {
        debug!(from = buffer.len(), to = required, "growing encode buffer");
        *buffer = vec![0u8; required];
    }

    let len = transform.encode(
        &mut session.encoder,
        plaintext,
        &session.password,
        buffer,
        random,
    )?;
    Ok(len)
}

fn decode_with<T: Transform>(
    transform: &T,
    session: &mut Session,
    buffer: &mut Zeroizing<Vec<u8>>,
    ciphertext: &[u8],
) -> SdrResult<Vec<u8>> {
    let required = transform.decode_buffer_bytes(&session.decoder, ciphertext.len());
    if buffer.len() < required {
        debug!(from = buffer.len(), to = required, "growing decode buffer");
        *buffer = Zeroizing::new(vec![0u8; required]);
    }

    let decoded = transform.decode(
        &mut session.decoder,
        ciphertext,
        &session.password,
        buffer.as_mut_slice(),
    )?;
    let window = decoded
        .range()
        .and_then(|range| buffer.get(range))
        .ok_or(TransformStatus::StateError)?;
    Ok(window.to_vec())
}
