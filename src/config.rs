//! Runtime configuration.
//!
//! Read from the TOML file named by `GARDENER_CONFIG`; every field has a
//! default so the peripheral runs without any file at all.

use crate::{gardener, Error, ErrorType};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "GARDENER_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Adapter name such as `hci0`; the default adapter when unset.
    pub adapter: Option<String>,
    pub local_name: String,
    /// Reject WaterPlants writes that are not ON, OFF or UNKNOWN.
    pub strict_commands: bool,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            adapter: None,
            local_name: gardener::LOCAL_NAME.to_string(),
            strict_commands: false,
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub directory: PathBuf,
    pub file_name: String,
    pub console: bool,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "debug".to_string(),
            directory: PathBuf::from("."),
            file_name: "gardener.log".to_string(),
            console: true,
            ansi: true,
        }
    }
}

impl Config {
    pub fn from_toml(contents: &str) -> Result<Self, Error> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            Error::new(
                format!("Cannot read config {}", path.display()),
                err.to_string(),
                ErrorType::Config,
            )
        })?;
        Config::from_toml(&contents)
    }

    /// Loads the file named by `GARDENER_CONFIG`, or the defaults when the
    /// variable is not set.
    pub fn from_env() -> Result<Self, Error> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Config::load(Path::new(&path)),
            None => Ok(Config::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.local_name, "Gardener");
        assert!(!config.strict_commands);
        assert_eq!(config.log.file_name, "gardener.log");
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = Config::from_toml(
            r#"
            adapter = "hci1"
            strict_commands = true

            [log]
            level = "info"
            console = false
            "#,
        )
        .unwrap();
        assert_eq!(config.adapter.as_deref(), Some("hci1"));
        assert!(config.strict_commands);
        assert_eq!(config.log.level, "info");
        assert!(!config.log.console);
        assert_eq!(config.log.directory, PathBuf::from("."));
    }

    #[test]
    fn malformed_file_is_config_error() {
        let err = Config::from_toml("strict_commands = \"yes\"").unwrap_err();
        assert_eq!(err.kind, ErrorType::Config);
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "local_name = \"Greenhouse\"").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.local_name, "Greenhouse");

        let missing = file.path().with_extension("missing");
        assert_eq!(Config::load(&missing).unwrap_err().kind, ErrorType::Config);
    }
}
