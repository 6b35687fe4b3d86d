//! Storage adapters for the habit tracker's key-value persistence.

pub mod config;
pub mod file;
pub mod memory;

pub use crate::config::{StoreConfig, StoreKind};
pub use crate::file::FileStore;
pub use crate::memory::MemoryStore;
