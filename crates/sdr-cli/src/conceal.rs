use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use color_eyre::{
    eyre::{bail, eyre, WrapErr},
    Result,
};
use sdr_storage::{DisconnectedStore, OsRandom};
use tracing::info;

use crate::cli::TransformArgs;

const CONCEALED_SUFFIX: &str = ".sdr";
const REVEALED_SUFFIX: &str = ".clear";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Conceal,
    Reveal,
}

pub fn handle(direction: Direction, args: TransformArgs) -> Result<()> {
    let security = resolve_security(args.security)?;
    let mut store = DisconnectedStore::new(OsRandom);
    store.initialize(security)?;

    match (args.file, args.text) {
        (Some(file), _) => {
            let written = process_file(&mut store, direction, &file)?;
            println!("Wrote {}", written.display());
        }
        (None, Some(text)) => println!("{}", process_text(&mut store, direction, &text)?),
        (None, None) => bail!("pass a file or --text"),
    }
    Ok(())
}

fn resolve_security(flag: Option<String>) -> Result<String> {
    flag.or_else(|| std::env::var("SDR_SECURITY").ok())
        .ok_or_else(|| eyre!("no security string: pass --security or set SDR_SECURITY"))
}

/// Transform `path` into a sibling file and return the sibling's path.
pub fn process_file(
    store: &mut DisconnectedStore,
    direction: Direction,
    path: &Path,
) -> Result<PathBuf> {
    let input = fs::read(path).wrap_err_with(|| format!("reading {}", path.display()))?;
    let (output, suffix) = match direction {
        Direction::Conceal => (store.conceal(&input)?, CONCEALED_SUFFIX),
        Direction::Reveal => (store.reveal(&input)?, REVEALED_SUFFIX),
    };
    let target = with_suffix(path, suffix);
    fs::write(&target, output).wrap_err_with(|| format!("writing {}", target.display()))?;
    info!(source = %path.display(), target = %target.display(), ?direction, "file processed");
    Ok(target)
}

/// Conceal text to base64, or reveal base64 back to text.
pub fn process_text(store: &mut DisconnectedStore, direction: Direction, text: &str) -> Result<String> {
    match direction {
        Direction::Conceal => Ok(STANDARD.encode(store.conceal(text.as_bytes())?)),
        Direction::Reveal => {
            let concealed = STANDARD
                .decode(text.trim())
                .wrap_err("concealed text is not valid base64")?;
            let revealed = store.reveal(&concealed)?;
            Ok(String::from_utf8_lossy(&revealed).into_owned())
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECURITY: &str = "SecurityString";

    fn store() -> DisconnectedStore {
        sdr_core::license::init_license("SDR Test Co", "TEST-LICENSE").expect("license");
        let mut store = DisconnectedStore::new(OsRandom);
        store.initialize(SECURITY).expect("initialize");
        store
    }

    #[test]
    fn suffix_is_appended_to_full_name() {
        assert_eq!(
            with_suffix(Path::new("/tmp/report.pdf"), CONCEALED_SUFFIX),
            PathBuf::from("/tmp/report.pdf.sdr")
        );
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("notes.txt");
        fs::write(&source, b"meet at noon").expect("write");

        let mut concealer = store();
        let concealed = process_file(&mut concealer, Direction::Conceal, &source).expect("conceal");
        assert_eq!(concealed, dir.path().join("notes.txt.sdr"));
        assert_ne!(fs::read(&concealed).expect("read"), b"meet at noon");

        let mut revealer = store();
        let revealed = process_file(&mut revealer, Direction::Reveal, &concealed).expect("reveal");
        assert_eq!(revealed, dir.path().join("notes.txt.sdr.clear"));
        assert_eq!(fs::read(&revealed).expect("read"), b"meet at noon");
    }

    #[test]
    fn text_round_trip() {
        let mut store = store();
        let concealed = process_text(&mut store, Direction::Conceal, "hello").expect("conceal");
        assert_ne!(concealed, "hello");
        let revealed = process_text(&mut store, Direction::Reveal, &concealed).expect("reveal");
        assert_eq!(revealed, "hello");
    }

    #[test]
    fn reveal_rejects_bad_base64() {
        let mut store = store();
        assert!(process_text(&mut store, Direction::Reveal, "not base64!").is_err());
    }

    #[test]
    fn security_flag_wins() {
        assert_eq!(
            resolve_security(Some("FlagSecret1".into())).expect("resolve"),
            "FlagSecret1"
        );
    }
}
