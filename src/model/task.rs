use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::reference::Ref;

/// Task workflow status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
    Blocked,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
        TaskStatus::Blocked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
            TaskStatus::Blocked => "blocked",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To do",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Review => "Review",
            TaskStatus::Done => "Done",
            TaskStatus::Blocked => "Blocked",
        }
    }

    /// The single character shown in list views
    pub fn marker(self) -> char {
        match self {
            TaskStatus::Todo => ' ',
            TaskStatus::InProgress => '>',
            TaskStatus::Review => '?',
            TaskStatus::Done => 'x',
            TaskStatus::Blocked => '-',
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "invalid task status '{}' (expected: todo, in_progress, review, done, blocked)",
                    s
                )
            })
    }
}

/// A task as returned by `/tasks/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// Percent complete, 0–100
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub project: Ref,
    /// Grouping parent; only root tasks are offered as parents
    #[serde(default)]
    pub parent: Option<Ref>,
    #[serde(default)]
    pub assignee: Option<Ref>,
    #[serde(default)]
    pub sort_index: u32,
    /// Decimal hours, kept as the server's string form
    #[serde(default)]
    pub estimated_hours: Option<String>,
    #[serde(default)]
    pub actual_hours: Option<String>,
    #[serde(default)]
    pub duration_days: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Body of `POST /tasks/` and `PATCH /tasks/{id}/`.
///
/// `status` and `progress` are left out when unset so the server default
/// (`todo`, 0) applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPayload {
    pub project: u64,
    pub parent: Option<u64>,
    pub title: String,
    pub description: String,
    pub assignee: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Body of `POST /tasks/{id}/copy/`.
///
/// Unset overrides are left out: the copy stays in the source's project,
/// has no parent, and the server titles it `Kopia: <title>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskCopy {
    /// Also clone the whole subtask tree under the copy
    pub include_children: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}
