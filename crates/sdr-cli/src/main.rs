mod cli;
mod conceal;
mod config;
mod records;
mod storage;

use std::path::Path;

use crate::cli::{Command, ConfigCommand};
use crate::conceal::Direction;
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use sdr_core::{
    license,
    storage::{StorageBackend, Tier},
};
use sdr_storage::SecureStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI to the secure stores.
fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli::Cli { location, command } = cli::Cli::parse();
    let config = config::load()?;
    let location = location.as_deref();
    match command {
        Command::Version => print_version(),
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
        Command::Health => {
            init_license(&config)?;
            run_health_check(location, &config)?
        }
        Command::Record(cmd) => {
            init_license(&config)?;
            records::handle(cmd, location, &config)?
        }
        Command::Conceal(args) => {
            init_license(&config)?;
            conceal::handle(Direction::Conceal, args)?
        }
        Command::Reveal(args) => {
            init_license(&config)?;
            conceal::handle(Direction::Reveal, args)?
        }
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("sdr {}", env!("CARGO_PKG_VERSION"));
}

fn init_license(config: &config::Config) -> Result<()> {
    let license = config::resolve_license(config).ok_or_else(|| {
        eyre!("no license configured: set [license] in the config file or SDR_LICENSE_COMPANY and SDR_LICENSE_KEY")
    })?;
    license::init_license(&license.company, &license.key)?;
    Ok(())
}

/// Runs a quick health check of the persistent tier.
fn run_health_check(flag: Option<&Path>, config: &config::Config) -> Result<()> {
    let mut store = storage::store_from_config(flag, config)?;
    run_store_health(&mut store)?;
    println!("Storage: ok ({})", store.location());
    Ok(())
}

fn run_store_health<B: StorageBackend>(store: &mut SecureStore<B>) -> Result<()> {
    let probe_key = "health-probe";
    let payload = b"ok";
    store.write(probe_key, payload, Tier::Persistent)?;
    let round_trip = store.read(probe_key)?;
    store.remove(probe_key)?;

    if round_trip.as_deref() != Some(payload.as_slice()) {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage;

    #[test]
    fn health_check_with_test_store_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = storage::test_store(dir.path());
        run_store_health(&mut store).expect("health check should succeed");
        assert!(store.records().expect("records").is_empty());
    }
}
