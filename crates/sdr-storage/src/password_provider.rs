use std::sync::{Arc, Mutex};

use sdr_core::transform::Password;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("keyring error: {0}")]
    Keyring(String),
    #[error("generation error: {0}")]
    Generation(String),
}

/// Supplies the store password (OS keychain in production; memory in tests).
pub trait PasswordProvider: Send + Sync {
    fn get_or_create(&self) -> Result<Password, PasswordError>;
}

/// OS keyring-backed provider. On first use it generates a random GUID-shaped
/// password, which the engine accepts regardless of repeated characters.
pub struct KeyringPasswordProvider {
    service: String,
    account: String,
}

impl KeyringPasswordProvider {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }
}

impl PasswordProvider for KeyringPasswordProvider {
    fn get_or_create(&self) -> Result<Password, PasswordError> {
        let entry = keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| PasswordError::Keyring(e.to_string()))?;

        if let Ok(secret) = entry.get_password() {
            return Ok(Password::from(secret));
        }

        let secret = generate_password();
        entry
            .set_password(&secret)
            .map_err(|e| PasswordError::Keyring(e.to_string()))?;
        Ok(Password::from(secret))
    }
}

/// In-memory provider for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPasswordProvider {
    inner: Arc<Mutex<Option<Password>>>,
}

impl InMemoryPasswordProvider {
    pub fn with_password(password: impl Into<Password>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(password.into()))),
        }
    }
}

impl PasswordProvider for InMemoryPasswordProvider {
    fn get_or_create(&self) -> Result<Password, PasswordError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| PasswordError::Generation(format!("lock poisoned: {err}")))?;

        if let Some(existing) = guard.clone() {
            return Ok(existing);
        }

        let password = Password::from(generate_password());
        *guard = Some(password.clone());
        Ok(password)
    }
}

fn generate_password() -> String {
    Uuid::new_v4().hyphenated().to_string()
}
