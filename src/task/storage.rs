#![forbid(unsafe_code)]

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::Serialize as _;

use crate::error::{Result, TodoError};
use crate::task::model::Task;

/// Durable home of the task collection. The whole sequence is read and
/// written at once.
pub trait Backend {
    fn load(&self) -> Result<Vec<Task>>;
    fn save(&mut self, tasks: &[Task]) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("tasks.json"), OsStr::to_os_string);
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Backend for JsonFileBackend {
    fn load(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "task file missing, starting empty");
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| io_err(&self.path, e))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let tasks: Vec<Task> = serde_json::from_str(&raw).map_err(|source| TodoError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let mut data = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut data, fmt);
        tasks
            .serialize(&mut ser)
            .map_err(|source| TodoError::Malformed {
                path: self.path.clone(),
                source,
            })?;
        data.push(b'\n');

        let tmp = self.tmp_path();
        std::fs::write(&tmp, &data).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| io_err(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), count = tasks.len(), "saved tasks");
        Ok(())
    }
}

fn io_err(path: &Path, source: std::io::Error) -> TodoError {
    TodoError::Persistence {
        path: path.to_path_buf(),
        source,
    }
}

/// In-memory backend, used by tests and anywhere persistence is unwanted.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    tasks: Vec<Task>,
    fail_saves: bool,
    saves: usize,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            ..Self::default()
        }
    }

    /// Make every subsequent save fail with a persistence error.
    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    #[must_use]
    pub fn stored(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl Backend for MemoryBackend {
    fn load(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.clone())
    }

    fn save(&mut self, tasks: &[Task]) -> Result<()> {
        if self.fail_saves {
            return Err(TodoError::Persistence {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::other("save disabled"),
            });
        }
        self.tasks = tasks.to_vec();
        self.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::model::{Priority, Status};

    fn sample() -> Vec<Task> {
        let mut done = Task::new(
            2,
            "File taxes".to_owned(),
            Priority::High,
            "Admin".to_owned(),
            Some("2025-04-15".to_owned()),
            "2025-01-02 08:30:00".to_owned(),
        );
        done.set_status(Status::Completed, "2025-01-03 12:00:00".to_owned());
        vec![
            Task::new(
                1,
                "Buy milk".to_owned(),
                Priority::Medium,
                "Errands".to_owned(),
                None,
                "2025-01-01 09:00:00".to_owned(),
            ),
            done,
        ]
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut backend = JsonFileBackend::new(dir.path().join("nested").join("tasks.json"));
        let tasks = sample();
        backend.save(&tasks).unwrap();
        assert_eq!(backend.load().unwrap(), tasks);
        assert!(!dir.path().join("nested").join("tasks.json.tmp").exists());
    }

    #[test]
    fn missing_and_blank_files_load_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.json");
        let backend = JsonFileBackend::new(path.clone());
        assert!(backend.load().unwrap().is_empty());

        std::fs::write(&path, "  \n").unwrap();
        assert!(backend.load().unwrap().is_empty());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JsonFileBackend::new(path).load().unwrap_err();
        assert!(matches!(err, TodoError::Malformed { .. }));
    }

    #[test]
    fn writes_four_space_indentation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tasks.json");
        JsonFileBackend::new(path.clone()).save(&sample()).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("[\n    {\n        \"id\": 1,"));
    }

    #[test]
    fn memory_backend_can_fail_saves() {
        let mut backend = MemoryBackend::with_tasks(sample());
        backend.fail_saves(true);
        assert!(backend.save(&[]).is_err());
        assert_eq!(backend.stored().len(), 2);
        assert_eq!(backend.save_count(), 0);
    }
}
