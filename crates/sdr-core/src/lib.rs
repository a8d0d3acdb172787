//! Core contracts for secure data replacement: storage backends, the transform
//! engine seam, and the shared error taxonomy.
//! This crate is intentionally small to keep dependency surface minimal.

pub mod error;
pub mod license;
pub mod storage;
pub mod transform;

pub use error::{SdrError, SdrResult};
