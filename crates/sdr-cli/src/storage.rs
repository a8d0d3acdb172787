use std::path::{Path, PathBuf};

use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use dirs::data_dir;
use sdr_core::transform::Password;
use sdr_storage::{
    password_provider::{KeyringPasswordProvider, PasswordProvider},
    OsRandom, SecureStore,
};
use tracing::debug;

const KEYRING_SERVICE: &str = "sdr-cli";
const KEYRING_ACCOUNT: &str = "store-password";

/// Resolve the default SDR location.
pub fn default_location() -> Result<PathBuf> {
    let base = data_dir().ok_or_else(|| eyre!("no data dir available"))?;
    Ok(base.join("sdr"))
}

/// Pick the location: command-line flag, then config, then the platform default.
pub fn resolve_location(flag: Option<&Path>, config: &Config) -> Result<PathBuf> {
    if let Some(location) = flag.or(config.location.as_deref()) {
        return Ok(location.to_path_buf());
    }
    default_location()
}

/// `SDR_PASSWORD` if set, otherwise the keychain-held password.
pub fn resolve_password(provider: &dyn PasswordProvider) -> Result<Password> {
    if let Ok(secret) = std::env::var("SDR_PASSWORD") {
        return Ok(Password::from(secret));
    }
    provider.get_or_create().map_err(|e| eyre!(e.to_string()))
}

/// Open an initialized file-backed store.
pub fn open_store(location: &Path, password: Password) -> Result<SecureStore> {
    let location = location
        .to_str()
        .ok_or_else(|| eyre!("location {} is not valid UTF-8", location.display()))?;
    debug!(location, "initializing secure store");
    let mut store = SecureStore::new(OsRandom);
    store.initialize(location, password)?;
    Ok(store)
}

/// Build a store using config overrides and the OS keychain.
pub fn store_from_config(flag: Option<&Path>, config: &Config) -> Result<SecureStore> {
    let location = resolve_location(flag, config)?;
    let provider = KeyringPasswordProvider::new(KEYRING_SERVICE, KEYRING_ACCOUNT);
    let password = resolve_password(&provider)?;
    open_store(&location, password)
}

/// Helper for tests: a licensed store rooted at a temp dir with an in-memory password.
#[cfg(test)]
pub fn test_store(root: impl AsRef<Path>) -> SecureStore {
    use sdr_storage::password_provider::InMemoryPasswordProvider;

    sdr_core::license::init_license("SDR Test Co", "TEST-LICENSE").expect("license");
    let password = InMemoryPasswordProvider::default()
        .get_or_create()
        .expect("password");
    open_store(&root.as_ref().join("sdr"), password).expect("open store")
}
