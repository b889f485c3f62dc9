use derive_more::{AsRef, Deref, Display, From, Into};
use directories::ProjectDirs;
use fs_err as fs;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Deref, From, Into, AsRef)]
pub struct StorageKey(String);

crate::impl_string_newtype!(StorageKey);

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to determine data directory")]
    DataDirNotFound,
    #[error("Storage is disabled")]
    Disabled,
    #[error("Invalid storage key '{0}'")]
    InvalidKey(StorageKey),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A tiny string key/value store for flags that should outlive the process.
pub trait FlagStore {
    fn read(&self, key: &StorageKey) -> Result<Option<String>, StoreError>;
    fn write(&mut self, key: &StorageKey, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &StorageKey) -> Result<(), StoreError>;
}

impl<S: FlagStore + ?Sized> FlagStore for Box<S> {
    fn read(&self, key: &StorageKey) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&mut self, key: &StorageKey, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }

    fn remove(&mut self, key: &StorageKey) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

pub fn get_data_dir() -> Result<PathBuf, StoreError> {
    let proj_dirs = ProjectDirs::from("org", "aura", "aura").ok_or(StoreError::DataDirNotFound)?;
    Ok(proj_dirs.data_dir().to_path_buf())
}

/// Stores each key as a file holding its value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn open_default() -> Result<Self, StoreError> {
        get_data_dir().map(|d| Self::new(d.join("flags")))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &StorageKey) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && key.as_str() != "."
            && key.as_str() != "..";
        if !valid {
            return Err(StoreError::InvalidKey(key.clone()));
        }
        Ok(self.dir.join(key.as_str()))
    }
}

impl FlagStore for FileStore {
    fn read(&self, key: &StorageKey) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s.trim_end().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &StorageKey, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &StorageKey) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<StorageKey, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FlagStore for MemoryStore {
    fn read(&self, key: &StorageKey) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &StorageKey, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.clone(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &StorageKey) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Refuses every operation. Stands in for storage that is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStore;

impl FlagStore for DisabledStore {
    fn read(&self, _key: &StorageKey) -> Result<Option<String>, StoreError> {
        Err(StoreError::Disabled)
    }

    fn write(&mut self, _key: &StorageKey, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Disabled)
    }

    fn remove(&mut self, _key: &StorageKey) -> Result<(), StoreError> {
        Err(StoreError::Disabled)
    }
}

#[cfg(test)]
pub(crate) fn scratch_dir(tag: &str) -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("aurakit-{}-{}-{}", tag, std::process::id(), n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_lifecycle() {
        let dir = scratch_dir("store");
        let key = StorageKey::new("usersAccessGranted");
        let mut store = FileStore::new(&dir);

        assert_eq!(store.read(&key).unwrap(), None);
        store.write(&key, "true").unwrap();
        assert_eq!(store.read(&key).unwrap().as_deref(), Some("true"));

        // a second handle on the same directory sees the value
        let other = FileStore::new(&dir);
        assert_eq!(other.read(&key).unwrap().as_deref(), Some("true"));

        store.remove(&key).unwrap();
        assert_eq!(store.read(&key).unwrap(), None);
        store.remove(&key).unwrap();

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let store = FileStore::new(scratch_dir("keys"));
        for bad in ["", "..", "a/b", "../x"] {
            assert!(matches!(
                store.read(&StorageKey::new(bad)),
                Err(StoreError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn test_disabled_store_fails() {
        let mut store = DisabledStore;
        let key = StorageKey::new("k");
        assert!(store.read(&key).is_err());
        assert!(store.write(&key, "v").is_err());
        assert!(store.remove(&key).is_err());
    }
}
