// src/store/mod.rs

//! Persistent task store abstraction.
//!
//! The scheduler re-reads the store every tick and never caches across
//! ticks, so external edits take effect within one check interval. The
//! contract only needs eventually-consistent reads between ticks and
//! per-task write atomicity; there are no cross-task transactions.
//!
//! - [`file`] is the production store: one TOML file per task.
//! - [`memory`] is an in-memory store used by tests.

pub mod file;
pub mod memory;

use crate::errors::Result;
use crate::task::Task;

pub trait TaskStore: Send + Sync {
    /// All valid enabled tasks, ordered by creation time.
    fn list_enabled(&self) -> Result<Vec<Task>>;

    /// All valid tasks, ordered by creation time.
    fn list_all(&self) -> Result<Vec<Task>>;

    /// Load a task by exact name.
    fn load(&self, name: &str) -> Result<Option<Task>>;

    /// Persist a task (validating it first).
    fn save(&self, task: &Task) -> Result<()>;
}

pub use file::FileStore;
pub use memory::MemoryStore;
