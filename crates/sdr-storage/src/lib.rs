//! Concrete secure data replacement stores.
//! Records are transformed with AES-GCM before they reach memory or disk.

pub mod aes_transform;
pub mod disconnected;
pub mod file_backend;
pub mod password_provider;
pub mod random;
pub mod secure_store;

pub use aes_transform::AesGcmTransform;
pub use disconnected::DisconnectedStore;
pub use file_backend::FileBackend;
pub use random::OsRandom;
pub use secure_store::SecureStore;
