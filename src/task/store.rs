#![forbid(unsafe_code)]

use crate::error::{Result, TodoError};
use crate::task::model::{self, Priority, Status, Task};
use crate::task::stats::Statistics;
use crate::task::storage::Backend;

/// Fields to replace on an existing task; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
}

impl TaskEdit {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.priority.is_none() && self.category.is_none()
    }
}

/// Open handle over the task collection. Every mutation rewrites the whole
/// collection through the backend.
#[derive(Debug)]
pub struct TaskStore<B: Backend> {
    backend: B,
    tasks: Vec<Task>,
    load_warning: Option<TodoError>,
    clock: fn() -> String,
}

impl<B: Backend> TaskStore<B> {
    /// Opens the store and loads the collection. A failed load leaves the
    /// store empty and is kept as [`TaskStore::load_warning`].
    pub fn open(backend: B) -> Self {
        let mut store = Self {
            backend,
            tasks: Vec::new(),
            load_warning: None,
            clock: model::now_timestamp,
        };
        store.load();
        store
    }

    /// Replaces the timestamp source.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> String) -> Self {
        self.clock = clock;
        self
    }

    /// Re-reads the backend, discarding in-memory state.
    pub fn load(&mut self) -> &[Task] {
        match self.backend.load() {
            Ok(tasks) => {
                self.tasks = tasks;
                self.load_warning = None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to load tasks, starting with an empty list");
                self.tasks = Vec::new();
                self.load_warning = Some(err);
            }
        }
        &self.tasks
    }

    #[must_use]
    pub fn load_warning(&self) -> Option<&TodoError> {
        self.load_warning.as_ref()
    }

    /// Writes the full collection. Memory is not rolled back on failure.
    pub fn save(&mut self) -> Result<()> {
        self.backend.save(&self.tasks).inspect_err(|err| {
            tracing::warn!(error = %err, "failed to save tasks; memory and disk now differ");
        })
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn get(&self, id: u32) -> Result<&Task> {
        self.tasks
            .iter()
            .find(|t| t.id == id)
            .ok_or(TodoError::NotFound(id))
    }

    /// Ids are `count + 1`, so they can repeat after a removal.
    pub fn add(
        &mut self,
        description: &str,
        priority: Priority,
        category: &str,
        due_date: Option<&str>,
    ) -> Result<Task> {
        let description = description.trim();
        if description.is_empty() {
            return Err(TodoError::validation("task description cannot be empty"));
        }

        let due_date = due_date
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .and_then(|d| {
                if model::is_valid_due_date(d) {
                    Some(d.to_owned())
                } else {
                    tracing::debug!(due_date = d, "dropping due date with invalid format");
                    None
                }
            });

        let id = u32::try_from(self.tasks.len())
            .map_err(|_| TodoError::validation("too many tasks"))?
            + 1;
        let task = Task::new(
            id,
            description.to_owned(),
            priority,
            model::normalize_category(category),
            due_date,
            (self.clock)(),
        );
        self.tasks.push(task.clone());
        self.save()?;
        tracing::debug!(id, "added task");
        Ok(task)
    }

    pub fn remove(&mut self, id: u32) -> Result<Task> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(TodoError::NotFound(id))?;
        let removed = self.tasks.remove(idx);
        self.save()?;
        tracing::debug!(id, "removed task");
        Ok(removed)
    }

    pub fn update_status(&mut self, id: u32, status: Status) -> Result<Task> {
        let now = (self.clock)();
        let task = self.find_mut(id)?;
        task.set_status(status, now);
        let updated = task.clone();
        self.save()?;
        tracing::debug!(id, status = %status, "updated task status");
        Ok(updated)
    }

    pub fn edit(&mut self, id: u32, edit: TaskEdit) -> Result<Task> {
        let description = match edit.description.as_deref().map(str::trim) {
            Some("") => return Err(TodoError::validation("task description cannot be empty")),
            Some(d) => Some(d.to_owned()),
            None => None,
        };

        let task = self.find_mut(id)?;
        if let Some(description) = description {
            task.description = description;
        }
        if let Some(priority) = edit.priority {
            task.priority = priority;
        }
        if let Some(category) = edit.category.as_deref() {
            task.category = model::normalize_category(category);
        }
        let updated = task.clone();
        self.save()?;
        tracing::debug!(id, "edited task");
        Ok(updated)
    }

    /// Filtered view ordered by priority rank, then creation time.
    #[must_use]
    pub fn list(&self, status: Option<Status>, category: Option<&str>) -> Vec<&Task> {
        let category = category.map(str::to_lowercase);
        let mut out: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| status.is_none_or(|s| t.status == s))
            .filter(|t| {
                category
                    .as_deref()
                    .is_none_or(|c| t.category.to_lowercase() == c)
            })
            .collect();
        out.sort_by(|a, b| {
            a.priority
                .rank()
                .cmp(&b.priority.rank())
                .then_with(|| a.created.cmp(&b.created))
        });
        out
    }

    /// Case-insensitive substring match on description or category, in storage order.
    pub fn search(&self, keyword: &str) -> Result<Vec<&Task>> {
        if keyword.trim().is_empty() {
            return Err(TodoError::validation("search keyword cannot be empty"));
        }
        let needle = keyword.to_lowercase();
        Ok(self
            .tasks
            .iter()
            .filter(|t| {
                t.description.to_lowercase().contains(&needle)
                    || t.category.to_lowercase().contains(&needle)
            })
            .collect())
    }

    #[must_use]
    pub fn statistics(&self) -> Statistics {
        Statistics::collect(&self.tasks)
    }

    fn find_mut(&mut self, id: u32) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TodoError::NotFound(id))
    }
}
