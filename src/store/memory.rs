// src/store/memory.rs

//! In-memory task store.
//!
//! Backs tests that drive the scheduler without touching the filesystem;
//! applies the same validation as the file store so both impls agree on
//! what the scheduler may ever see.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::errors::Result;
use crate::store::TaskStore;
use crate::task::{validate_task, Task};

#[derive(Default)]
pub struct MemoryStore {
    tasks: Mutex<BTreeMap<String, Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryStore {
    fn list_enabled(&self) -> Result<Vec<Task>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|t| t.enabled)
            .collect())
    }

    fn list_all(&self) -> Result<Vec<Task>> {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<Task> = tasks.values().cloned().collect();
        all.sort_by_key(|t| t.created_at);
        Ok(all)
    }

    fn load(&self, name: &str) -> Result<Option<Task>> {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        Ok(tasks.get(name).cloned())
    }

    fn save(&self, task: &Task) -> Result<()> {
        validate_task(task)?;
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.insert(task.name.clone(), task.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_load_and_filtering() {
        let store = MemoryStore::new();
        let mut a = Task::new("a", "* * * * *", "true");
        let mut b = Task::new("b", "@daily", "true");
        b.enabled = false;
        a.created_at = a.created_at - chrono::Duration::seconds(1);

        store.save(&a).unwrap();
        store.save(&b).unwrap();

        assert_eq!(store.list_all().unwrap().len(), 2);
        let enabled = store.list_enabled().unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "a");
        assert!(store.load("b").unwrap().is_some());
        assert!(store.load("missing").unwrap().is_none());
    }

    #[test]
    fn save_rejects_invalid_tasks() {
        let store = MemoryStore::new();
        let task = Task::new("bad", "nope", "true");
        assert!(store.save(&task).is_err());
    }
}
