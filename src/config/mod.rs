//! Persistent user preferences for the shell and the store wiring.

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{core::ClearScope, storage::json_backend::DEFAULT_RETENTION, utils::paths};

const TMP_SUFFIX: &str = "tmp";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("unknown configuration key `{0}`")]
    UnknownKey(String),
    #[error("invalid value for `{key}`: {message}")]
    InvalidValue { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default)]
    pub clear_scope: ClearScope,
    #[serde(default = "Config::default_backup_retention")]
    pub backup_retention: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Overrides the store location. Defaults to `<home>/data/store.json`.
    pub store_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency_symbol: Self::default_currency_symbol(),
            clear_scope: ClearScope::default(),
            backup_retention: Self::default_backup_retention(),
            store_file: None,
        }
    }
}

impl Config {
    pub const KEYS: [&'static str; 4] = [
        "currency_symbol",
        "clear_scope",
        "backup_retention",
        "store_file",
    ];

    pub fn default_currency_symbol() -> String {
        "R$".into()
    }

    pub fn default_backup_retention() -> usize {
        DEFAULT_RETENTION
    }

    /// Applies a `config set <key> <value>` style update.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        match key {
            "currency_symbol" => {
                let symbol = value.trim();
                if symbol.is_empty() {
                    return Err(invalid("symbol cannot be empty".into()));
                }
                self.currency_symbol = symbol.to_string();
            }
            "clear_scope" => {
                self.clear_scope = value.parse().map_err(invalid)?;
            }
            "backup_retention" => {
                let retention: usize = value
                    .trim()
                    .parse()
                    .map_err(|err| invalid(format!("{err}")))?;
                if retention == 0 {
                    return Err(invalid("retention must be at least 1".into()));
                }
                self.backup_retention = retention;
            }
            "store_file" => {
                let trimmed = value.trim();
                self.store_file = match trimmed {
                    "" | "default" | "none" => None,
                    path => Some(PathBuf::from(path)),
                };
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Current value of `key` as shown by the shell.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "currency_symbol" => Some(self.currency_symbol.clone()),
            "clear_scope" => Some(self.clear_scope.to_string()),
            "backup_retention" => Some(self.backup_retention.to_string()),
            "store_file" => Some(
                self.store_file
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "default".into()),
            ),
            _ => None,
        }
    }

    pub fn resolve_store_file(&self, base: &Path) -> PathBuf {
        self.store_file
            .clone()
            .unwrap_or_else(|| paths::data_dir_in(base).join("store.json"))
    }
}

/// Loads and saves [`Config`] as pretty JSON.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    base: PathBuf,
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        fs::create_dir_all(paths::config_dir_in(&base))?;
        let config_path = paths::config_file_in(&base);
        Ok(Self { base, config_path })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.config_path.exists() {
            let data = fs::read_to_string(&self.config_path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.config_path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.config_path)?;
        debug!(path = %self.config_path.display(), "configuration saved");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), ConfigError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
        let config = manager.load().expect("load");
        assert_eq!(config, Config::default());
        assert_eq!(config.currency_symbol, "R$");
        assert_eq!(config.clear_scope, ClearScope::Store);
    }

    #[test]
    fn save_then_load_keeps_changes() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
        let mut config = Config::default();
        config.set("clear_scope", "ledger_keys").expect("set scope");
        config.set("backup_retention", "2").expect("set retention");

        manager.save(&config).expect("save");
        let loaded = manager.load().expect("load");
        assert_eq!(loaded.clear_scope, ClearScope::LedgerKeys);
        assert_eq!(loaded.backup_retention, 2);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("tempdir");
        let manager = ConfigManager::with_base_dir(dir.path().to_path_buf()).expect("manager");
        fs::write(manager.config_path(), r#"{"currency_symbol":"$"}"#).expect("write");
        let loaded = manager.load().expect("load");
        assert_eq!(loaded.currency_symbol, "$");
        assert_eq!(loaded.backup_retention, DEFAULT_RETENTION);
    }

    #[test]
    fn set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(matches!(
            config.set("backup_retention", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config.set("theme", "dark"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn store_file_defaults_under_data_dir() {
        let config = Config::default();
        let base = Path::new("/tmp/ledger");
        assert_eq!(
            config.resolve_store_file(base),
            PathBuf::from("/tmp/ledger/data/store.json")
        );
    }
}
