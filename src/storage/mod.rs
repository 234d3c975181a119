//! Key-value persistence for client state that must survive restarts.
//!
//! This module provides the storage port used by the session and theme stores:
//! - `get`/`set`/`remove` of string values under namespaced keys
//! - a SQLite backend for real runs and an in-memory backend for tests
//!
//! Readers treat a failing or corrupt value as "not set".

mod memory;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{storage_key, KeyValueStore, NAMESPACE};
