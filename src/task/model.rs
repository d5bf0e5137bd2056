#![forbid(unsafe_code)]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::error::TodoError;

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Priority {
    #[serde(alias = "low")]
    Low,
    #[default]
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// Sort ordinal; lower sorts first.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Low => "🟢",
            Self::Medium => "🟡",
            Self::High => "🔴",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "l" => Ok(Self::Low),
            "medium" | "med" | "m" => Ok(Self::Medium),
            "high" | "h" => Ok(Self::High),
            other => Err(TodoError::validation(format!(
                "invalid priority '{other}': expected low|medium|high"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    #[default]
    #[serde(alias = "pending")]
    Pending,
    #[serde(rename = "In Progress", alias = "in_progress", alias = "InProgress")]
    InProgress,
    #[serde(alias = "completed")]
    Completed,
}

impl Status {
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Pending => "⏳",
            Self::InProgress => "🔄",
            Self::Completed => "✅",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "todo" => Ok(Self::Pending),
            "in-progress" | "in_progress" | "inprogress" | "in progress" | "progress" => {
                Ok(Self::InProgress)
            }
            "completed" | "complete" | "done" => Ok(Self::Completed),
            other => Err(TodoError::validation(format!(
                "invalid status '{other}': expected pending|in-progress|completed"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u32,
    #[serde(rename = "task")]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed_date: Option<String>,
}

impl Task {
    #[must_use]
    pub fn new(
        id: u32,
        description: String,
        priority: Priority,
        category: String,
        due_date: Option<String>,
        created: String,
    ) -> Self {
        Self {
            id,
            description,
            priority,
            status: Status::Pending,
            category,
            created,
            due_date,
            completed_date: None,
        }
    }

    /// Completion timestamp is kept iff the status is `Completed`.
    pub fn set_status(&mut self, status: Status, now: String) {
        self.status = status;
        self.completed_date = if status == Status::Completed {
            Some(now)
        } else {
            None
        };
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_owned()
}

/// Blank categories fall back to the default one.
#[must_use]
pub fn normalize_category(category: &str) -> String {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        DEFAULT_CATEGORY.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Current local time as `YYYY-MM-DD HH:MM:SS`; UTC if the local offset is unknown.
#[must_use]
pub fn now_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_timestamp(now)
}

/// Infallible, so `created` values always sort chronologically.
fn format_timestamp(at: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second()
    )
}

#[must_use]
pub fn is_valid_due_date(s: &str) -> bool {
    time::Date::parse(s.trim(), format_description!("[year]-[month]-[day]")).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_fixed_field_names() {
        let task = Task::new(
            1,
            "Buy milk".to_owned(),
            Priority::High,
            "Errands".to_owned(),
            Some("2025-01-31".to_owned()),
            "2025-01-01 09:00:00".to_owned(),
        );
        let v = serde_json::to_value(&task).unwrap();
        let obj = v.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            [
                "category",
                "completed_date",
                "created",
                "due_date",
                "id",
                "priority",
                "status",
                "task"
            ]
        );
        assert_eq!(obj["task"], "Buy milk");
        assert_eq!(obj["priority"], "High");
        assert_eq!(obj["status"], "Pending");
        assert!(obj["completed_date"].is_null());
    }

    #[test]
    fn status_spelling_and_aliases() {
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            "\"In Progress\""
        );
        let s: Status = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(s, Status::InProgress);
        let p: Priority = serde_json::from_str("\"low\"").unwrap();
        assert_eq!(p, Priority::Low);
    }

    #[test]
    fn parses_cli_spellings() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("done".parse::<Status>().unwrap(), Status::Completed);
        assert_eq!("in-progress".parse::<Status>().unwrap(), Status::InProgress);
        assert!("urgent".parse::<Priority>().is_err());
        assert!("later".parse::<Status>().is_err());
    }

    #[test]
    fn ranks_order_high_first() {
        assert!(Priority::High.rank() < Priority::Medium.rank());
        assert!(Priority::Medium.rank() < Priority::Low.rank());
    }

    #[test]
    fn set_status_maintains_completion_timestamp() {
        let mut task = Task::new(
            1,
            "x".to_owned(),
            Priority::Medium,
            DEFAULT_CATEGORY.to_owned(),
            None,
            "2025-01-01 09:00:00".to_owned(),
        );
        task.set_status(Status::Completed, "2025-01-02 10:00:00".to_owned());
        assert_eq!(task.completed_date.as_deref(), Some("2025-01-02 10:00:00"));
        task.set_status(Status::InProgress, "2025-01-03 10:00:00".to_owned());
        assert!(task.completed_date.is_none());
    }

    #[test]
    fn due_date_validation_is_calendar_aware() {
        assert!(is_valid_due_date("2024-02-29"));
        assert!(!is_valid_due_date("2023-02-29"));
        assert!(!is_valid_due_date("31/01/2025"));
        assert!(!is_valid_due_date("tomorrow"));
    }

    #[test]
    fn timestamp_has_fixed_shape() {
        let ts = now_timestamp();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
    }

    #[test]
    fn timestamps_are_zero_padded() {
        let at = time::macros::datetime!(2025-03-07 04:05:06 UTC);
        assert_eq!(format_timestamp(at), "2025-03-07 04:05:06");
        let later = time::macros::datetime!(2025-11-20 14:00:00 UTC);
        assert!(format_timestamp(at) < format_timestamp(later));
    }

    #[test]
    fn missing_optional_fields_get_defaults() {
        let task: Task = serde_json::from_str(r#"{"id": 3, "task": "legacy"}"#).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, Status::Pending);
        assert_eq!(task.category, DEFAULT_CATEGORY);
        assert!(task.due_date.is_none());
    }
}
