#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use serde::Serialize;

use crate::task::model::{Priority, Status, Task};

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Statistics {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    /// Ordered by category name.
    pub categories: BTreeMap<String, usize>,
}

impl Statistics {
    #[must_use]
    pub fn collect(tasks: &[Task]) -> Self {
        let mut stats = Self {
            total: tasks.len(),
            ..Self::default()
        };
        for task in tasks {
            match task.status {
                Status::Pending => stats.pending += 1,
                Status::InProgress => stats.in_progress += 1,
                Status::Completed => stats.completed += 1,
            }
            match task.priority {
                Priority::High => stats.high += 1,
                Priority::Medium => stats.medium += 1,
                Priority::Low => stats.low += 1,
            }
            *stats.categories.entry(task.category.clone()).or_insert(0) += 1;
        }
        stats
    }

    #[must_use]
    pub fn status_count(&self, status: Status) -> usize {
        match status {
            Status::Pending => self.pending,
            Status::InProgress => self.in_progress,
            Status::Completed => self.completed,
        }
    }

    #[must_use]
    pub fn priority_count(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }

    /// Share of all tasks in `status`, rounded to one decimal. `None` when empty.
    #[must_use]
    pub fn status_percentage(&self, status: Status) -> Option<f64> {
        percentage(self.status_count(status), self.total)
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(count: usize, total: usize) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some((count as f64 * 1000.0 / total as f64).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u32, status: Status, priority: Priority, category: &str) -> Task {
        let mut t = Task::new(
            id,
            format!("task {id}"),
            priority,
            category.to_owned(),
            None,
            "2025-01-01 00:00:00".to_owned(),
        );
        t.set_status(status, "2025-01-02 00:00:00".to_owned());
        t
    }

    #[test]
    fn empty_collection_has_no_percentages() {
        let stats = Statistics::collect(&[]);
        assert_eq!(stats.total, 0);
        for status in Status::ALL {
            assert_eq!(stats.status_percentage(status), None);
        }
        assert!(stats.categories.is_empty());
    }

    #[test]
    fn counts_and_rounds_to_one_decimal() {
        let tasks = [
            task(1, Status::Pending, Priority::High, "Work"),
            task(2, Status::Pending, Priority::Low, "Home"),
            task(3, Status::Completed, Priority::High, "Work"),
        ];
        let stats = Statistics::collect(&tasks);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.in_progress, 0);
        assert_eq!(stats.status_percentage(Status::Pending), Some(66.7));
        assert_eq!(stats.status_percentage(Status::Completed), Some(33.3));
        assert_eq!(stats.status_percentage(Status::InProgress), Some(0.0));
        assert_eq!(stats.priority_count(Priority::High), 2);
        assert_eq!(stats.priority_count(Priority::Medium), 0);

        let cats: Vec<(&str, usize)> = stats
            .categories
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        assert_eq!(cats, [("Home", 1), ("Work", 2)]);
    }
}
