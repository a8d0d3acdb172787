use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use hkdf::Hkdf;
use sdr_core::transform::{
    Decoded, Password, RandomSource, Transform, TransformState, TransformStatus,
};
use sha2::Sha256;
use zeroize::Zeroizing;

pub const SALT_SIZE: usize = 16;
pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;
pub const KEY_SIZE: usize = 32;
/// Bytes in front of the ciphertext body: `salt || nonce`.
pub const HEADER_SIZE: usize = SALT_SIZE + NONCE_SIZE;

// State block: `[has_key][salt][key]`.
const STATE_SIZE: usize = 1 + SALT_SIZE + KEY_SIZE;
const SALT_RANGE: std::ops::Range<usize> = 1..1 + SALT_SIZE;
const KEY_RANGE: std::ops::Range<usize> = 1 + SALT_SIZE..STATE_SIZE;

const KEY_INFO: &[u8] = b"sdr-aes-256-gcm-v1";
const MIN_PASSWORD_BYTES: usize = 8;
const MAX_BYTE_REPEATS: u8 = 2;

/// AES-256-GCM engine with HKDF-SHA256 key derivation.
///
/// Ciphertext layout is `salt(16) || nonce(12) || body || tag(16)`. The
/// encoder draws one salt per state block and a fresh nonce per call, so
/// encoding the same plaintext twice never yields the same bytes. Decoding
/// happens in place inside the output buffer, leaving the plaintext at
/// offset [`HEADER_SIZE`].
#[derive(Debug, Default, Clone, Copy)]
pub struct AesGcmTransform;

impl AesGcmTransform {
    pub fn new() -> Self {
        Self
    }
}

impl Transform for AesGcmTransform {
    fn name(&self) -> &'static str {
        "aes-256-gcm"
    }

    fn encoder_state_bytes(&self) -> usize {
        STATE_SIZE
    }

    fn decoder_state_bytes(&self) -> usize {
        STATE_SIZE
    }

    fn encode_buffer_bytes(&self, _state: &TransformState, plaintext_len: usize) -> usize {
        HEADER_SIZE + plaintext_len + TAG_SIZE
    }

    fn encode(
        &self,
        state: &mut TransformState,
        plaintext: &[u8],
        password: &Password,
        out: &mut [u8],
        random: &mut dyn RandomSource,
    ) -> Result<usize, TransformStatus> {
        validate_password(password)?;
        let block = state_block(state)?;
        let total = HEADER_SIZE + plaintext.len() + TAG_SIZE;
        if out.len() < total {
            return Err(TransformStatus::BufferTooSmall);
        }

        if block[0] == 0 {
            let mut salt = [0u8; SALT_SIZE];
            random.fill(&mut salt);
            let key = derive_key(password, &salt)?;
            cache_key(block, &salt, &key);
        }

        let cipher = Aes256Gcm::new_from_slice(&block[KEY_RANGE])
            .map_err(|_| TransformStatus::StateError)?;
        let mut nonce = [0u8; NONCE_SIZE];
        random.fill(&mut nonce);

        let out = &mut out[..total];
        let (header, rest) = out.split_at_mut(HEADER_SIZE);
        header[..SALT_SIZE].copy_from_slice(&block[SALT_RANGE]);
        header[SALT_SIZE..].copy_from_slice(&nonce);

        let (body, tag_out) = rest.split_at_mut(plaintext.len());
        body.copy_from_slice(plaintext);
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", body)
            .map_err(|_| TransformStatus::InvalidInput)?;
        tag_out.copy_from_slice(tag.as_slice());

        Ok(total)
    }

    fn decode_buffer_bytes(&self, _state: &TransformState, ciphertext_len: usize) -> usize {
        ciphertext_len
    }

    fn decode(
        &self,
        state: &mut TransformState,
        ciphertext: &[u8],
        password: &Password,
        out: &mut [u8],
    ) -> Result<Decoded, TransformStatus> {
        validate_password(password)?;
        let block = state_block(state)?;
        if ciphertext.len() < HEADER_SIZE + TAG_SIZE {
            return Err(TransformStatus::InvalidInput);
        }
        if out.len() < ciphertext.len() {
            return Err(TransformStatus::BufferTooSmall);
        }

        let salt = &ciphertext[..SALT_SIZE];
        if block[0] == 0 || &block[SALT_RANGE] != salt {
            let key = derive_key(password, salt)?;
            cache_key(block, salt, &key);
        }
        let cipher = Aes256Gcm::new_from_slice(&block[KEY_RANGE])
            .map_err(|_| TransformStatus::StateError)?;

        let body_len = ciphertext.len() - HEADER_SIZE - TAG_SIZE;
        let out = &mut out[..ciphertext.len()];
        out.copy_from_slice(ciphertext);
        let (header, rest) = out.split_at_mut(HEADER_SIZE);
        let (body, tag) = rest.split_at_mut(body_len);
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&header[SALT_SIZE..]),
                b"",
                body,
                Tag::from_slice(tag),
            )
            .map_err(|_| TransformStatus::AuthenticationFailed)?;

        Ok(Decoded {
            offset: HEADER_SIZE,
            len: body_len,
        })
    }
}

/// Empty passwords are accepted. Otherwise at least 8 bytes with no byte value
/// more than twice, unless the password is a GUID string.
pub fn validate_password(password: &Password) -> Result<(), TransformStatus> {
    let bytes = password.as_bytes();
    if bytes.is_empty() || is_guid(bytes) {
        return Ok(());
    }
    if bytes.len() < MIN_PASSWORD_BYTES {
        return Err(TransformStatus::InvalidPassword);
    }

    let mut seen = [0u8; 256];
    for &byte in bytes {
        let count = &mut seen[usize::from(byte)];
        *count += 1;
        if *count > MAX_BYTE_REPEATS {
            return Err(TransformStatus::InvalidPassword);
        }
    }
    Ok(())
}

/// `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`, optionally wrapped in braces.
fn is_guid(bytes: &[u8]) -> bool {
    let inner = match bytes {
        [b'{', inner @ .., b'}'] => inner,
        other => other,
    };
    inner.len() == 36
        && inner.iter().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => *b == b'-',
            _ => b.is_ascii_hexdigit(),
        })
}

fn state_block(state: &mut TransformState) -> Result<&mut [u8], TransformStatus> {
    if state.len() != STATE_SIZE {
        return Err(TransformStatus::StateError);
    }
    Ok(state.as_bytes_mut())
}

fn derive_key(
    password: &Password,
    salt: &[u8],
) -> Result<Zeroizing<[u8; KEY_SIZE]>, TransformStatus> {
    let hk = Hkdf::<Sha256>::new(Some(salt), password.as_bytes());
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    hk.expand(KEY_INFO, key.as_mut_slice())
        .map_err(|_| TransformStatus::StateError)?;
    Ok(key)
}

fn cache_key(block: &mut [u8], salt: &[u8], key: &[u8; KEY_SIZE]) {
    block[0] = 1;
    block[SALT_RANGE].copy_from_slice(salt);
    block[KEY_RANGE].copy_from_slice(key);
}
