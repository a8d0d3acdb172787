use rand::{rngs::OsRng, RngCore};
use sdr_core::transform::RandomSource;

/// Random source backed by the operating system's CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&mut self, buffer: &mut [u8]) {
        OsRng.fill_bytes(buffer);
    }
}
