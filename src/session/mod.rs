//! Persisted session: token slots, user, role, and the storage they live in.

pub mod storage;
pub mod store;

pub use storage::{FileStorage, MemoryStorage, StorageBackend};
pub use store::{SessionStore, StorageMode};
