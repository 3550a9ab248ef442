use core::time::Duration;
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{CoordinationStore, StoreError};

const EXTENSION: &str = "lease";

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct Record {
    key: String,
    value: String,
    expires_at_ms: u64,
}

impl Record {
    fn is_live(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at_ms
    }
}

/// A [`CoordinationStore`] backed by one JSON file per key in a shared
/// directory.
///
/// Every process pointing at the same directory (local disk or a network
/// mount) coordinates through it. Writes go to a temporary file that is then
/// renamed over the target, so readers never see a torn record. Expiry uses
/// the wall clock of whichever process reads the record; expired files are
/// treated as absent and removed lazily.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    tmp_counter: AtomicU64,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            tmp_counter: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Hex keeps arbitrary keys (`:` included) filesystem-safe.
        let mut name = String::with_capacity(key.len() * 2 + EXTENSION.len() + 1);
        for byte in key.bytes() {
            name.push_str(&format!("{byte:02x}"));
        }
        name.push('.');
        name.push_str(EXTENSION);
        self.dir.join(name)
    }

    fn read(&self, path: &Path) -> Result<Option<Record>, StoreError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: path.display().to_string(),
                reason: e.to_string(),
            })
    }

    fn read_live(&self, key: &str) -> Result<Option<Record>, StoreError> {
        let path = self.path_for(key);
        match self.read(&path)? {
            Some(record) if record.is_live(now_ms()) => Ok(Some(record)),
            Some(_) => {
                self.evict(&path)?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        self.dir.join(format!(
            ".{}.{}.tmp",
            std::process::id(),
            self.tmp_counter.fetch_add(1, Ordering::Relaxed)
        ))
    }

    /// Removes a record that was read as expired.
    ///
    /// Another process may have renamed a fresh record over it since, so the
    /// file is first moved aside and only dropped if it is still expired.
    /// A live record is linked back unless yet another one took its place.
    fn evict(&self, path: &Path) -> Result<(), StoreError> {
        let aside = self.tmp_path();
        match fs::rename(path, &aside) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        let replaced = matches!(
            self.read(&aside),
            Ok(Some(record)) if record.is_live(now_ms())
        );
        if replaced {
            match fs::hard_link(&aside, path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
                // No hard links on this filesystem.
                Err(_) => return Ok(fs::rename(&aside, path)?),
            }
            tracing::debug!(file = %path.display(), "kept a lease renewed during eviction");
        }
        remove_if_present(&aside)
    }

    fn write(&self, record: &Record) -> Result<(), StoreError> {
        let target = self.path_for(&record.key);
        let tmp = self.tmp_path();
        let bytes = serde_json::to_vec(record).map_err(|e| StoreError::Corrupt {
            key: record.key.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&tmp, bytes)?;
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl CoordinationStore for FileStore {
    fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let now = now_ms();
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            match self.read(&path) {
                Ok(Some(record)) if record.is_live(now) => {
                    if record.key.starts_with(prefix) {
                        keys.push(record.key);
                    }
                }
                Ok(Some(_)) => self.evict(&path)?,
                Ok(None) => {}
                Err(StoreError::Corrupt { key, reason }) => {
                    tracing::warn!(file = %key, %reason, "skipping unreadable lease file");
                }
                Err(e) => return Err(e),
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.read_live(key)?.is_some())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_live(key)?.map(|record| record.value))
    }

    fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.write(&Record {
            key: key.to_owned(),
            value: value.to_owned(),
            expires_at_ms: deadline_ms(ttl)?,
        })
    }

    fn refresh_expiry(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        let expires_at_ms = deadline_ms(ttl)?;
        let Some(mut record) = self.read_live(key)? else {
            return Ok(false);
        };
        record.expires_at_ms = expires_at_ms;
        self.write(&record)?;
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let live = self.read_live(key)?.is_some();
        if live {
            remove_if_present(&self.path_for(key))?;
        }
        Ok(live)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as u64)
}

fn deadline_ms(ttl: Duration) -> Result<u64, StoreError> {
    u64::try_from(ttl.as_millis())
        .ok()
        .and_then(|ttl_ms| now_ms().checked_add(ttl_ms))
        .ok_or(StoreError::TtlOutOfRange { ttl })
}

fn remove_if_present(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}
