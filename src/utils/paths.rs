use dirs::home_dir;
use std::{
    env,
    path::{Path, PathBuf},
};

pub const HOME_ENV: &str = "LEDGER_TRACKER_HOME";

const DEFAULT_DIR_NAME: &str = ".ledger_tracker";
const CONFIG_DIR: &str = "config";
const CONFIG_FILE: &str = "config.json";
const DATA_DIR: &str = "data";

/// Returns the application data directory: `$LEDGER_TRACKER_HOME`, else
/// `~/.ledger_tracker`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn config_dir_in(base: &Path) -> PathBuf {
    base.join(CONFIG_DIR)
}

pub fn config_file_in(base: &Path) -> PathBuf {
    config_dir_in(base).join(CONFIG_FILE)
}

/// Directory holding the store file and its backups.
pub fn data_dir_in(base: &Path) -> PathBuf {
    base.join(DATA_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_rooted_at_base() {
        let base = Path::new("/tmp/ledger-home");
        assert_eq!(
            config_file_in(base),
            PathBuf::from("/tmp/ledger-home/config/config.json")
        );
        assert_eq!(data_dir_in(base), PathBuf::from("/tmp/ledger-home/data"));
    }
}
