use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use habit_domain::{KeyValueStore, StoreError};
use tracing::{debug, instrument};

/// Keeps each key in `<dir>/<key>.json`. Writes go to a temporary file that
/// is renamed over the old one.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("unable to create data directory `{}`", dir.display()))?;
        debug!(path = %dir.display(), "opened habit data directory");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Backend(format!("invalid store key `{key}`")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    #[instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_reads_as_none() {
        let temp = tempdir().expect("tempdir");
        let store = FileStore::open(temp.path()).expect("open store");
        assert_eq!(store.get("habits").unwrap(), None);
    }

    #[test]
    fn values_land_in_json_files() {
        let temp = tempdir().expect("tempdir");
        let store = FileStore::open(temp.path().join("nested")).expect("open store");
        store.set("categories", "[]").unwrap();
        let on_disk = fs::read_to_string(store.dir().join("categories.json")).unwrap();
        assert_eq!(on_disk, "[]");
        assert_eq!(store.get("categories").unwrap().as_deref(), Some("[]"));
        assert!(!store.dir().join("categories.json.tmp").exists());
    }

    #[test]
    fn path_like_keys_are_rejected() {
        let temp = tempdir().expect("tempdir");
        let store = FileStore::open(temp.path()).expect("open store");
        assert!(matches!(
            store.set("../escape", "x"),
            Err(StoreError::Backend(_))
        ));
    }
}
