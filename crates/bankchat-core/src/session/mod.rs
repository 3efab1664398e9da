//! Session persistence for the authenticated user.
//!
//! This module provides:
//! - `SessionStore`: the lenient three-key session API (token, user id, account id)
//! - `KeyValueStore`: the storage seam, with `FileStore` and `MemoryStore` backends
//!
//! Storage failures are logged and downgraded to empty values; they never
//! propagate to callers.

pub mod kv;
pub mod store;

pub use kv::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{Session, SessionKey, SessionStore};
