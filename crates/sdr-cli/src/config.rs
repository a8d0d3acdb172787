use std::{
    env, fs,
    path::{Path, PathBuf},
};

use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `~/.config/sdr/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Override for the SDR location.
    pub location: Option<PathBuf>,
    /// License for the transform engine.
    pub license: Option<LicenseConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct LicenseConfig {
    pub company: String,
    pub key: String,
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("sdr").join("config.toml"))
}

/// Write the given config to the default path unless a file is already there.
pub fn write_default_if_missing(config: &Config) -> Result<PathBuf> {
    write_if_missing(config, &default_path()?)
}

/// Write the config to `path`, creating parent directories as needed.
/// Leaves an existing file untouched to avoid clobbering user edits.
pub fn write_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}

/// License from `SDR_LICENSE_COMPANY`/`SDR_LICENSE_KEY`, falling back to the
/// config file per field.
pub fn resolve_license(config: &Config) -> Option<LicenseConfig> {
    merge_license(
        config.license.as_ref(),
        env::var("SDR_LICENSE_COMPANY").ok(),
        env::var("SDR_LICENSE_KEY").ok(),
    )
}

fn merge_license(
    file: Option<&LicenseConfig>,
    company: Option<String>,
    key: Option<String>,
) -> Option<LicenseConfig> {
    let company = company.or_else(|| file.map(|l| l.company.clone()))?;
    let key = key.or_else(|| file.map(|l| l.key.clone()))?;
    Some(LicenseConfig { company, key })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_default_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = load_from_path(dir.path().join("config.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn returns_default_when_blank() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "  \n").expect("write");
        assert_eq!(load_from_path(&path).expect("load"), Config::default());
    }

    #[test]
    fn parses_custom_config() {
        let contents = r#"
            location = "/tmp/sdr-data"
            [license]
            company = "Acme"
            key = "LICENSE-KEY"
        "#;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).expect("write temp config");

        let cfg = load_from_path(&path).expect("load");
        assert_eq!(
            cfg,
            Config {
                location: Some(PathBuf::from("/tmp/sdr-data")),
                license: Some(LicenseConfig {
                    company: "Acme".into(),
                    key: "LICENSE-KEY".into(),
                }),
            }
        );
    }

    #[test]
    fn write_creates_file_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            location: Some(PathBuf::from("/tmp/sdr-data")),
            license: None,
        };

        write_if_missing(&cfg, &path).expect("write should succeed");
        let other = Config::default();
        let second = write_if_missing(&other, &path).expect("second write ok");
        assert_eq!(second, path);
        let loaded: Config =
            toml::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn env_values_override_file_per_field() {
        let file = LicenseConfig {
            company: "File Co".into(),
            key: "FILE-KEY".into(),
        };
        assert_eq!(
            merge_license(Some(&file), Some("Env Co".into()), None),
            Some(LicenseConfig {
                company: "Env Co".into(),
                key: "FILE-KEY".into(),
            })
        );
        assert_eq!(merge_license(None, Some("Env Co".into()), None), None);
        assert_eq!(merge_license(Some(&file), None, None), Some(file.clone()));
    }
}
