use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::Persister;
use crate::iter::lock;
use crate::{Error, Result};

/// On-disk layout:
///
/// ```toml
/// [pointers]
/// numbers = 42
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointFile {
    #[serde(default)]
    pointers: BTreeMap<String, u64>,
}

/// Durable store keeping every cursor in one TOML file.
///
/// The whole file is rewritten on each [`Persister::set`], under a mutex. A
/// save goes to a sibling `.tmp` file that is then renamed over the old one,
/// so a crash mid-save leaves the previous checkpoints intact.
#[derive(Debug)]
pub struct FilePersister {
    path: PathBuf,
    state: Mutex<CheckpointFile>,
}

impl FilePersister {
    /// Open `path`, creating an empty checkpoint file if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state: CheckpointFile = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| Error::io(format!("read {}", path.display()), e))?;
            toml::from_str(&raw).map_err(|e| Error::Store {
                path: path.clone(),
                message: e.to_string(),
            })?
        } else {
            let empty = CheckpointFile::default();
            save(&path, &empty)?;
            empty
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Location of the checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persister for FilePersister {
    fn get(&self, key: &str) -> Result<u64> {
        lock(&self.state)
            .pointers
            .get(key)
            .copied()
            .ok_or_else(|| Error::NotFound {
                key: key.to_string(),
            })
    }

    fn set(&self, key: &str, value: u64) -> Result<()> {
        let mut state = lock(&self.state);
        let previous = state.pointers.insert(key.to_string(), value);
        if let Err(e) = save(&self.path, &state) {
            // keep memory in line with what is on disk
            match previous {
                Some(old) => state.pointers.insert(key.to_string(), old),
                None => state.pointers.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

fn save(path: &Path, state: &CheckpointFile) -> Result<()> {
    let encoded = toml::to_string(state).map_err(|e| Error::Store {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let temp = temp_path(path);
    fs::write(&temp, encoded).map_err(|e| Error::io(format!("save {}", temp.display()), e))?;
    fs::rename(&temp, path).map_err(|e| Error::io(format!("replace {}", path.display()), e))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pointers.toml");
        let store = FilePersister::open(&path).unwrap();
        assert!(path.exists());
        assert!(store.get("numbers").unwrap_err().is_not_found());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pointers.toml");
        {
            let store = FilePersister::open(&path).unwrap();
            store.set("numbers", 7).unwrap();
            store.set("letters", 3).unwrap();
            store.set("numbers", 9).unwrap();
        }

        let reopened = FilePersister::open(&path).unwrap();
        assert_eq!(reopened.get("numbers").unwrap(), 9);
        assert_eq!(reopened.get("letters").unwrap(), 3);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("[pointers]"));
    }

    #[test]
    fn test_garbage_file_is_store_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pointers.toml");
        fs::write(&path, "[pointers\nnumbers = ").unwrap();
        let err = FilePersister::open(&path).unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
    }

    #[test]
    fn test_save_replaces_file_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pointers.toml");
        let store = FilePersister::open(&path).unwrap();
        store.set("numbers", 4).unwrap();

        assert!(!temp_path(&path).exists());
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(FilePersister::open(&path).unwrap().get("numbers").unwrap(), 4);
    }

    #[test]
    fn test_interrupted_save_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pointers.toml");
        let store = FilePersister::open(&path).unwrap();
        store.set("numbers", 1).unwrap();

        // a directory where the temp file goes makes the save fail before the rename
        fs::create_dir(temp_path(&path)).unwrap();
        assert!(store.set("numbers", 5).is_err());

        assert_eq!(store.get("numbers").unwrap(), 1);
        assert_eq!(FilePersister::open(&path).unwrap().get("numbers").unwrap(), 1);
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pointers.toml");
        let store = FilePersister::open(&path).unwrap();
        store.set("numbers", 1).unwrap();

        // a directory in place of the file makes the write fail
        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();

        assert!(store.set("numbers", 5).is_err());
        assert_eq!(store.get("numbers").unwrap(), 1);
    }
}
