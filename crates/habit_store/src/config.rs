use std::path::PathBuf;

use anyhow::Result;
use habit_domain::KeyValueStore;
use tracing::{info, warn};

use crate::{FileStore, MemoryStore};

pub const DATA_DIR_ENV: &str = "HABITS_DATA_DIR";
pub const STORE_KIND_ENV: &str = "HABITS_STORE";
pub const DEFAULT_DATA_DIR: &str = "habit-data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    File,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub kind: StoreKind,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            kind: StoreKind::File,
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source. Unknown values keep
    /// the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            let dir = dir.trim();
            if !dir.is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Some(kind) = lookup(STORE_KIND_ENV) {
            match kind.trim().to_ascii_lowercase().as_str() {
                "file" => config.kind = StoreKind::File,
                "memory" => config.kind = StoreKind::Memory,
                other => warn!(value = other, "unknown store kind; using file store"),
            }
        }
        config
    }

    pub fn open_store(&self) -> Result<Box<dyn KeyValueStore>> {
        match self.kind {
            StoreKind::File => {
                info!(path = %self.data_dir.display(), "using file store");
                Ok(Box::new(FileStore::open(&self.data_dir)?))
            }
            StoreKind::Memory => {
                info!("using in-memory store");
                Ok(Box::new(MemoryStore::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        assert_eq!(StoreConfig::from_lookup(lookup(&[])), StoreConfig::default());
    }

    #[test]
    fn reads_directory_and_kind() {
        let config = StoreConfig::from_lookup(lookup(&[
            (DATA_DIR_ENV, "/tmp/habits"),
            (STORE_KIND_ENV, "Memory"),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/habits"));
        assert_eq!(config.kind, StoreKind::Memory);
    }

    #[test]
    fn bad_kind_and_blank_dir_keep_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[
            (DATA_DIR_ENV, "  "),
            (STORE_KIND_ENV, "sqlite"),
        ]));
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn env_config_falls_back_to_defaults() {
        let config = StoreConfig::from_env();
        if std::env::var(DATA_DIR_ENV).is_err() {
            assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
        }
    }

    #[test]
    fn memory_store_opens_without_touching_disk() {
        let config = StoreConfig {
            data_dir: PathBuf::from("/definitely/not/created"),
            kind: StoreKind::Memory,
        };
        let store = config.open_store().unwrap();
        assert_eq!(store.get("habits").unwrap(), None);
    }
}
