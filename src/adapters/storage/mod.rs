//! Storage Adapters
//!
//! Implementations of the SessionStorage port, one per persistence tier.
//!
//! ## Available Adapters
//!
//! - **FileSessionStorage** - Durable tier; a flat YAML map on disk
//! - **InMemorySessionStorage** - Ephemeral tier; lost when the process exits
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileSessionStorage, InMemorySessionStorage};
//!
//! let durable = FileSessionStorage::new("./data/session.yaml");
//! let ephemeral = InMemorySessionStorage::new();
//! ```

mod file_session_storage;
mod in_memory_session_storage;

pub use file_session_storage::FileSessionStorage;
pub use in_memory_session_storage::InMemorySessionStorage;
