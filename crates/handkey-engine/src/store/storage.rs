//! Durable storage backends for profile records

use crate::traits::ProfileStorage;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// One file per profile in a directory, written temp-then-rename.
#[derive(Debug, Clone)]
pub struct JsonDirStorage {
    dir: PathBuf,
    extension: String,
}

impl JsonDirStorage {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            extension: "json".to_string(),
        }
    }

    pub fn with_extension(mut self, ext: &str) -> Self {
        self.extension = ext.trim_start_matches('.').to_string();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, self.extension))
    }

    fn temp_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!(".{}.{}.tmp", key, self.extension))
    }
}

impl ProfileStorage for JsonDirStorage {
    fn keys(&self) -> io::Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let matches_ext = path
                .extension()
                .map(|e| e.to_string_lossy().eq_ignore_ascii_case(&self.extension))
                .unwrap_or(false);
            if !matches_ext {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                keys.push(stem.to_string_lossy().to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn read(&self, key: &str) -> io::Result<String> {
        fs::read_to_string(self.path_for(key))
    }

    fn write(&self, key: &str, contents: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let tmp = self.temp_path_for(key);
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }
        let target = self.path_for(key);
        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        debug!("Wrote {:?}", target);
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

/// In-memory storage for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record without any validation.
    pub fn insert_raw(&self, key: &str, contents: &str) {
        self.lock().insert(key.to_string(), contents.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Make every following write and remove fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(&self) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::other("storage is read-only"));
        }
        Ok(())
    }
}

impl ProfileStorage for MemoryStorage {
    fn keys(&self) -> io::Result<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }

    fn read(&self, key: &str) -> io::Result<String> {
        self.lock()
            .get(key)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no record '{}'", key)))
    }

    fn write(&self, key: &str, contents: &str) -> io::Result<()> {
        self.check_writable()?;
        self.insert_raw(key, contents);
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.check_writable()?;
        self.lock().remove(key);
        Ok(())
    }
}
