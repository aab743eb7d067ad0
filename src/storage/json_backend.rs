use std::{
    cmp::Reverse,
    collections::BTreeMap,
    fs::{self, File},
    io::Write,
    path::{Component, Path, PathBuf},
    sync::Mutex,
};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use tracing::{debug, warn};

use super::{KeyValueStore, Result, StorageError};

const STORE_FILE: &str = "store.json";
const BACKUP_DIR: &str = "backups";
const BACKUP_PREFIX: &str = "store_";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// A timestamped copy of the store file taken before an overwrite.
#[derive(Debug, Clone)]
pub struct BackupInfo {
    pub name: String,
    pub path: PathBuf,
    pub created_at: Option<DateTime<Utc>>,
    pub size_bytes: u64,
}

/// Key-value store kept as one JSON object on disk (`{"key": "value", ...}`).
///
/// Every write rewrites the whole file through a temp file and rename, after
/// copying the previous version into the backups directory.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: PathBuf, backups_dir: PathBuf, retention: usize) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            path,
            backups_dir,
            retention: retention.max(1),
            guard: Mutex::new(()),
        })
    }

    /// Lays the store out as `<base>/store.json` with backups in `<base>/backups`.
    pub fn in_dir(base: &Path, retention: usize) -> Result<Self> {
        Self::new(base.join(STORE_FILE), base.join(BACKUP_DIR), retention)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Lists backups, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let size_bytes = entry.metadata().map(|meta| meta.len()).unwrap_or(0);
            entries.push(BackupInfo {
                name: name.to_string(),
                created_at: parse_backup_timestamp(name),
                path: path.clone(),
                size_bytes,
            });
        }
        entries.sort_by_key(|info| Reverse((info.created_at, info.name.clone())));
        Ok(entries)
    }

    /// Replaces the live store file with the named backup. The current file is
    /// itself backed up first.
    pub fn restore_backup(&self, backup_name: &str) -> Result<()> {
        let _lock = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        if !is_backup_name(backup_name) {
            return Err(StorageError::InvalidName(backup_name.to_string()));
        }
        let source = self.backups_dir.join(backup_name);
        if !source.is_file() {
            return Err(StorageError::NotFound(format!(
                "backup `{backup_name}` not found"
            )));
        }
        let contents = fs::read_to_string(&source)?;
        self.backup_existing_file()?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &contents)?;
        fs::rename(&tmp, &self.path)?;
        debug!(backup = backup_name, "restored store from backup");
        Ok(())
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&data) {
            Ok(map) => Ok(map),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "store file is corrupt; treating it as empty"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        self.backup_existing_file()?;
        let json = serde_json::to_string_pretty(map)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), keys = map.len(), "store written");
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _lock = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        let mut map = self.read_map()?;
        apply(&mut map);
        self.write_map(&map)
    }

    fn backup_existing_file(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.backups_dir)?;
        fs::copy(&self.path, self.next_backup_path())?;
        self.prune_backups()
    }

    /// `store_<date>_<time>_<micros>.json`, with a counter appended if that
    /// name is already taken.
    fn next_backup_path(&self) -> PathBuf {
        let now = Utc::now();
        let stem = format!(
            "{BACKUP_PREFIX}{}_{:06}",
            now.format(BACKUP_TIMESTAMP_FORMAT),
            now.timestamp_subsec_micros()
        );
        let mut candidate = self.backups_dir.join(format!("{stem}.{BACKUP_EXTENSION}"));
        let mut counter = 1u32;
        while candidate.exists() {
            candidate = self
                .backups_dir
                .join(format!("{stem}_{counter:03}.{BACKUP_EXTENSION}"));
            counter += 1;
        }
        candidate
    }

    fn prune_backups(&self) -> Result<()> {
        for entry in self.list_backups()?.into_iter().skip(self.retention) {
            let _ = fs::remove_file(entry.path);
        }
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _lock = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|map| {
            map.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        self.update(BTreeMap::clear)
    }

    fn keys(&self) -> Result<Vec<String>> {
        let _lock = self.guard.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.read_map()?.into_keys().collect())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<()> {
        self.update(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), value.clone());
            }
        })
    }
}

/// Length of a `%Y%m%d_%H%M%S` rendering.
const SECONDS_STAMP_LEN: usize = 15;

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let raw = name
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(&format!(".{BACKUP_EXTENSION}"))?;
    let seconds = raw.get(..SECONDS_STAMP_LEN)?;
    let naive = NaiveDateTime::parse_from_str(seconds, BACKUP_TIMESTAMP_FORMAT).ok()?;
    let micros = raw
        .get(SECONDS_STAMP_LEN..)
        .and_then(|rest| rest.strip_prefix('_'))
        .and_then(|rest| rest.split('_').next())
        .and_then(|digits| digits.parse::<i64>().ok())
        .unwrap_or(0);
    Some(DateTime::from_naive_utc_and_offset(naive, Utc) + Duration::microseconds(micros))
}

/// A bare file name produced by this store, never a path.
fn is_backup_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    ) && name.starts_with(BACKUP_PREFIX)
        && name.ends_with(&format!(".{BACKUP_EXTENSION}"))
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

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
