//! # Turnlog Sync
//!
//! Persistence and synchronization layer for the Turnlog record-keeping
//! core: a key-value-backed Local Store holding one serialized document, a
//! remote mirror client with optimistic-concurrency writes, a coalescing
//! auto-sync scheduler, and a first-run bootstrap loader.
//!
//! Mutations flow through [`LocalStore`]; every write emits a
//! document-changed event that [`AutoSync`] turns into at most one
//! in-flight mirror pass plus one queued follow-up. Remote failures are
//! reported through the store's status channel and never interrupt local
//! work.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod export;
pub mod mirror;
pub mod scheduler;
pub mod storage;
pub mod store;

pub use bootstrap::initialize_data;
pub use config::{SyncConfig, DEFAULT_BRANCH};
pub use error::{Result, SyncError};
pub use export::export_to_dir;
pub use mirror::{MirrorClient, DEFAULT_API_BASE};
pub use scheduler::{AutoSync, MirrorPass, SyncPass};
pub use storage::{DirBackend, MemoryBackend, StorageBackend};
pub use store::{LocalStore, SyncStatus};
