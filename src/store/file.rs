// src/store/file.rs

//! File-backed task store: one TOML document per task under
//! `<data_dir>/tasks/`.
//!
//! Listing is tolerant: files that fail to parse or validate are skipped
//! with a warning so one bad edit never takes the whole scheduler down.
//! `load` of a specific name reports the real error instead.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::{CronrunError, Result};
use crate::store::TaskStore;
use crate::task::{validate_task, Task};

pub struct FileStore {
    tasks_dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let tasks_dir = data_dir.as_ref().join("tasks");
        fs::create_dir_all(&tasks_dir)?;
        Ok(Self { tasks_dir })
    }

    /// Default data directory: `~/.cronrun` (falling back to `./.cronrun`
    /// when no home directory is available).
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(".cronrun"))
            .unwrap_or_else(|| PathBuf::from(".cronrun"))
    }

    pub fn tasks_dir(&self) -> &Path {
        &self.tasks_dir
    }

    fn task_path(&self, name: &str) -> PathBuf {
        self.tasks_dir.join(format!("{}.toml", sanitize_name(name)))
    }

    fn read_task(&self, path: &Path) -> Result<Task> {
        let contents = fs::read_to_string(path)?;
        let task: Task = toml::from_str(&contents)?;
        validate_task(&task)?;
        Ok(task)
    }
}

/// Reduce a task name to a safe file stem: alphanumerics, `-` and `_`
/// are kept, spaces become `_`, everything else is dropped.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

impl TaskStore for FileStore {
    fn list_enabled(&self) -> Result<Vec<Task>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|t| t.enabled)
            .collect())
    }

    fn list_all(&self) -> Result<Vec<Task>> {
        let mut tasks = Vec::new();
        for entry in fs::read_dir(&self.tasks_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }
            match self.read_task(&path) {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable task file");
                }
            }
        }
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }

    fn load(&self, name: &str) -> Result<Option<Task>> {
        let path = self.task_path(name);
        if !path.exists() {
            return Ok(None);
        }
        self.read_task(&path).map(Some)
    }

    fn save(&self, task: &Task) -> Result<()> {
        validate_task(task)?;
        if sanitize_name(&task.name).is_empty() {
            return Err(CronrunError::Validation(format!(
                "task name '{}' has no filesystem-safe characters",
                task.name
            )));
        }
        let contents = toml::to_string_pretty(task)?;
        fs::write(self.task_path(&task.name), contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_characters_only() {
        assert_eq!(sanitize_name("my task"), "my_task");
        assert_eq!(sanitize_name("a-b_c1"), "a-b_c1");
        assert_eq!(sanitize_name("weird!@#name"), "weirdname");
    }
}
