//! Contract for the randomized, reversible transform that stands between
//! plaintext and anything a backend stores.
//!
//! Engines own the algorithm; the store owns the state blocks, the output
//! buffers and the random source, and hands them to the engine on every call.
//! Buffer sizes are always asked of the engine first: callers size the output
//! buffer to at least the reported capacity before encoding or decoding.

mod password;
mod status;

pub use password::Password;
pub use status::TransformStatus;

use std::fmt;

use zeroize::Zeroizing;

/// Source of cryptographically strong bytes, invoked synchronously by engines.
/// Assumed infallible.
pub trait RandomSource: Send {
    fn fill(&mut self, buffer: &mut [u8]);
}

impl<F> RandomSource for F
where
    F: FnMut(&mut [u8]) + Send,
{
    fn fill(&mut self, buffer: &mut [u8]) {
        self(buffer)
    }
}

/// Opaque engine state, sized by what the engine reports it needs.
/// Wiped when dropped.
pub struct TransformState {
    block: Zeroizing<Vec<u8>>,
}

impl TransformState {
    pub fn with_size(bytes: usize) -> Self {
        Self {
            block: Zeroizing::new(vec![0u8; bytes]),
        }
    }

    pub fn len(&self) -> usize {
        self.block.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.block
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.block
    }
}

impl fmt::Debug for TransformState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformState")
            .field("len", &self.block.len())
            .finish_non_exhaustive()
    }
}

/// Window of a decode output buffer holding the plaintext. Engines may place
/// the plaintext anywhere in the buffer; `offset` is not necessarily zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub offset: usize,
    pub len: usize,
}

impl Decoded {
    /// `None` when `offset + len` overflows.
    pub fn range(&self) -> Option<std::ops::Range<usize>> {
        let end = self.offset.checked_add(self.len)?;
        Some(self.offset..end)
    }
}

/// A randomized, reversible transform engine.
///
/// Any `Err` is fatal for that call. Engines enforce their own password rules.
pub trait Transform: Send {
    /// Short name used for logging.
    fn name(&self) -> &'static str;

    /// Size of the state block an encoder needs.
    fn encoder_state_bytes(&self) -> usize;

    /// Size of the state block a decoder needs.
    fn decoder_state_bytes(&self) -> usize;

    /// Output capacity required to encode `plaintext_len` bytes.
    fn encode_buffer_bytes(&self, state: &TransformState, plaintext_len: usize) -> usize;

    /// Encode `plaintext` into `out`, returning the ciphertext length.
    fn encode(
        &self,
        state: &mut TransformState,
        plaintext: &[u8],
        password: &Password,
        out: &mut [u8],
        random: &mut dyn RandomSource,
    ) -> Result<usize, TransformStatus>;

    /// Output capacity required to decode `ciphertext_len` bytes.
    fn decode_buffer_bytes(&self, state: &TransformState, ciphertext_len: usize) -> usize;

    /// Decode `ciphertext` into `out`, returning where the plaintext landed.
    fn decode(
        &self,
        state: &mut TransformState,
        ciphertext: &[u8],
        password: &Password,
        out: &mut [u8],
    ) -> Result<Decoded, TransformStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_random_sources() {
        let mut counter = 0u8;
        let mut source = move |buffer: &mut [u8]| {
            for byte in buffer.iter_mut() {
                counter = counter.wrapping_add(1);
                *byte = counter;
            }
        };
        let mut out = [0u8; 4];
        RandomSource::fill(&mut source, &mut out);
        assert_eq!(out, [1, 2, 3, 4]);
    }

    #[test]
    fn state_is_zero_filled_and_redacted() {
        let state = TransformState::with_size(49);
        assert_eq!(state.len(), 49);
        assert!(state.as_bytes().iter().all(|b| *b == 0));
        assert_eq!(format!("{state:?}"), "TransformState { len: 49, .. }");
    }

    #[test]
    fn decoded_range_respects_offset() {
        let decoded = Decoded { offset: 28, len: 5 };
        assert_eq!(decoded.range(), Some(28..33));
    }

    #[test]
    fn decoded_range_rejects_overflow() {
        let decoded = Decoded {
            offset: usize::MAX,
            len: 1,
        };
        assert_eq!(decoded.range(), None);
    }
}
