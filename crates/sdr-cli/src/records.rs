use std::path::Path;

use crate::{cli::RecordCommand, config::Config, storage};
use color_eyre::{eyre::eyre, Result};
use sdr_core::storage::{StorageBackend, Tier};
use sdr_storage::SecureStore;

pub fn handle(cmd: RecordCommand, flag: Option<&Path>, config: &Config) -> Result<()> {
    let mut store = storage::store_from_config(flag, config)?;
    for line in run(cmd, &mut store)? {
        println!("{line}");
    }
    Ok(())
}

/// Executes one record command and returns the lines to print.
pub fn run<B: StorageBackend>(cmd: RecordCommand, store: &mut SecureStore<B>) -> Result<Vec<String>> {
    let lines = match cmd {
        RecordCommand::Put { key, value } => {
            store.write(&key, value, Tier::Persistent)?;
            vec![format!("Stored {key}")]
        }
        RecordCommand::Get { key } => {
            let value = store
                .read(&key)?
                .ok_or_else(|| eyre!("no record named {key}"))?;
            vec![String::from_utf8_lossy(&value).into_owned()]
        }
        RecordCommand::Rm { key } => {
            store.remove(&key)?;
            vec![format!("Removed {key}")]
        }
        RecordCommand::Ls => {
            let keys = store.records()?;
            if keys.is_empty() {
                vec!["No records.".to_string()]
            } else {
                keys
            }
        }
        RecordCommand::Wipe => {
            let location = store.location().to_string();
            store.remove_all()?;
            vec![format!("Wiped {location}")]
        }
    };
    Ok(lines)
}
