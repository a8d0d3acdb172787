use std::{
    ffi::OsStr,
    fs::{self, File},
    io::{ErrorKind, Read, Write},
    path::{Component, Path, PathBuf, MAIN_SEPARATOR},
};

use sdr_core::{storage::StorageBackend, SdrError, SdrResult};
use tracing::{instrument, warn};

/// Directory-backed store: the location is a directory and every record is a
/// regular file named after its key holding raw ciphertext, with no header.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileBackend;

impl FileBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Path of the record `key` under `location`, without doubling a trailing
/// separator.
pub fn record_path(location: &str, key: &str) -> PathBuf {
    Path::new(location).join(key)
}

fn is_blank(location: &str) -> bool {
    location.trim().is_empty()
}

/// True when `key` is exactly one plain file name, so its record stays
/// directly inside the location.
pub fn is_record_name(key: &str) -> bool {
    let mut components = Path::new(key).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name == OsStr::new(key)
    )
}

/// Reads a whole record. A failed or short read yields empty bytes.
fn read_fully(mut reader: impl Read, expected: u64, path: &Path) -> Vec<u8> {
    let mut buf = Vec::new();
    match reader.read_to_end(&mut buf) {
        Ok(read) if read as u64 >= expected => buf,
        Ok(read) => {
            warn!(path = %path.display(), read, expected, "short read on record");
            Vec::new()
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "record could not be read");
            Vec::new()
        }
    }
}

impl StorageBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn location_exists(&self, location: &str) -> bool {
        !is_blank(location) && Path::new(location).is_dir()
    }

    fn record_exists(&self, location: &str, key: &str) -> bool {
        !is_blank(location) && is_record_name(key) && record_path(location, key).is_file()
    }

    #[instrument(level = "debug", skip(self))]
    fn list_records(&self, location: &str) -> SdrResult<Vec<String>> {
        let entries = fs::read_dir(location).map_err(|err| SdrError::io(location, err))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| SdrError::io(location, err))?;
            let file_type = entry
                .file_type()
                .map_err(|err| SdrError::io(entry.path(), err))?;
            if !file_type.is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => warn!(?raw, "skipping record with a non UTF-8 name"),
            }
        }
        names.sort();
        Ok(names)
    }

    #[instrument(level = "debug", skip(self))]
    fn setup_location(&mut self, location: &str) -> SdrResult<()> {
        if is_blank(location) {
            return Ok(());
        }

        let trimmed = location.trim_end_matches(MAIN_SEPARATOR);
        let path = Path::new(if trimmed.is_empty() { location } else { trimmed });
        if path.exists() && !path.is_dir() {
            return Err(SdrError::configuration(location, "exists and is not a directory"));
        }
        fs::create_dir_all(path).map_err(|err| SdrError::configuration(location, err))
    }

    #[instrument(level = "debug", skip(self))]
    fn read_record(&self, location: &str, key: &str) -> SdrResult<Option<Vec<u8>>> {
        if !self.record_exists(location, key) {
            return Ok(None);
        }

        let path = record_path(location, key);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                warn!(path = %path.display(), %err, "record could not be opened");
                return Ok(Some(Vec::new()));
            }
        };

        let expected = file.metadata().map(|meta| meta.len()).unwrap_or(0);
        Ok(Some(read_fully(file, expected, &path)))
    }

    #[instrument(level = "debug", skip(self, value), fields(bytes = value.len()))]
    fn write_record(&mut self, location: &str, key: &str, value: &[u8]) -> SdrResult<()> {
        if is_blank(location) {
            return Err(SdrError::configuration(
                location,
                "no persistent location configured",
            ));
        }
        if !is_record_name(key) {
            return Err(SdrError::configuration(
                location,
                format!("{key:?} is not a plain record name"),
            ));
        }

        let path = record_path(location, key);
        let mut file = File::create(&path).map_err(|err| SdrError::io(&path, err))?;
        file.write_all(value).map_err(|err| SdrError::io(&path, err))?;
        file.flush().map_err(|err| SdrError::io(&path, err))
    }

    #[instrument(level = "debug", skip(self))]
    fn remove_record(&mut self, location: &str, key: &str) -> SdrResult<()> {
        if !self.record_exists(location, key) {
            return Ok(());
        }

        let path = record_path(location, key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SdrError::io(path, err)),
        }
    }

    #[instrument(level = "debug", skip(self))]
    fn remove_location(&mut self, location: &str) -> SdrResult<()> {
        if is_blank(location) {
            return Ok(());
        }

        match fs::remove_dir(location) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SdrError::io(location, err)),
        }
    }
}
