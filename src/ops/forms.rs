//! Form input → request payload.
//!
//! Forms hold raw text exactly as entered. `validate` normalizes it:
//! blank optional fields become `None` (sent as `null`, never `""`),
//! numeric fields are parsed to integers, and missing required fields are
//! reported per field before anything touches the network.

use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::model::{Priority, Project, ProjectPayload, ProjectStatus, Task, TaskPayload, TaskStatus};

/// Per-field validation messages, in form order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: IndexMap<&'static str, String>,
}

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, msg)| format!("{}: {}", field, msg))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for FieldErrors {}

/// Raw project form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectForm {
    pub name: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub owner: String,
    pub start_date: String,
    pub end_date: String,
}

impl ProjectForm {
    /// Prefill from an existing project for editing
    pub fn from_project(project: &Project) -> Self {
        ProjectForm {
            name: project.name.clone(),
            description: project.description.clone(),
            status: project.status.as_str().to_string(),
            priority: u8::from(project.priority).to_string(),
            owner: project.owner.as_ref().map(|o| o.id.to_string()).unwrap_or_default(),
            start_date: date_text(project.start_date),
            end_date: date_text(project.end_date),
        }
    }

    pub fn validate(&self) -> Result<ProjectPayload, FieldErrors> {
        let mut errors = FieldErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "name is required");
        }
        let start_date = required_date(&mut errors, "start_date", "start date", &self.start_date);
        let end_date = required_date(&mut errors, "end_date", "end date", &self.end_date);

        let status = match blank_to_none(&self.status) {
            None => ProjectStatus::default(),
            Some(s) => s.parse().unwrap_or_else(|e: String| {
                errors.add("status", e);
                ProjectStatus::default()
            }),
        };

        let priority = match parse_int::<u8>(&mut errors, "priority", &self.priority) {
            None => Priority::default(),
            Some(n) => Priority::try_from(n).unwrap_or_else(|e| {
                errors.add("priority", e);
                Priority::default()
            }),
        };

        let owner = parse_int::<u64>(&mut errors, "owner", &self.owner);

        errors.into_result(|| ProjectPayload {
            name: name.to_string(),
            description: self.description.trim().to_string(),
            status,
            priority,
            owner,
            start_date,
            end_date,
        })
    }
}

/// Raw task form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub project: String,
    pub parent: String,
    pub assignee: String,
    pub status: String,
    pub progress: String,
    pub start_date: String,
    pub end_date: String,
}

impl TaskForm {
    /// Prefill from an existing task for editing
    pub fn from_task(task: &Task) -> Self {
        TaskForm {
            title: task.title.clone(),
            description: task.description.clone(),
            project: task.project.id.to_string(),
            parent: task.parent.as_ref().map(|p| p.id.to_string()).unwrap_or_default(),
            assignee: task.assignee.as_ref().map(|a| a.id.to_string()).unwrap_or_default(),
            status: task.status.as_str().to_string(),
            progress: task.progress.to_string(),
            start_date: date_text(task.start_date),
            end_date: date_text(task.end_date),
        }
    }

    pub fn validate(&self) -> Result<TaskPayload, FieldErrors> {
        let mut errors = FieldErrors::default();

        let project = parse_int::<u64>(&mut errors, "project", &self.project);
        if project.is_none() && errors.get("project").is_none() {
            errors.add("project", "project is required");
        }
        let title = self.title.trim();
        if title.is_empty() {
            errors.add("title", "title is required");
        }

        let parent = parse_int::<u64>(&mut errors, "parent", &self.parent);
        let assignee = parse_int::<u64>(&mut errors, "assignee", &self.assignee);

        let status = blank_to_none(&self.status).and_then(|s| match s.parse::<TaskStatus>() {
            Ok(st) => Some(st),
            Err(e) => {
                errors.add("status", e);
                None
            }
        });

        let progress = parse_int::<u32>(&mut errors, "progress", &self.progress).and_then(|p| {
            if p > 100 {
                errors.add("progress", "progress must be between 0 and 100");
                None
            } else {
                Some(p as u8)
            }
        });

        let start_date = optional_date(&mut errors, "start_date", &self.start_date);
        let end_date = optional_date(&mut errors, "end_date", &self.end_date);

        errors.into_result(|| TaskPayload {
            project: project.unwrap_or_default(),
            parent,
            title: title.to_string(),
            description: self.description.trim().to_string(),
            assignee,
            status,
            progress,
            start_date,
            end_date,
        })
    }
}

fn blank_to_none(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

fn parse_int<N: std::str::FromStr>(errors: &mut FieldErrors, field: &'static str, raw: &str) -> Option<N> {
    let text = blank_to_none(raw)?;
    match text.parse::<N>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.add(field, format!("'{}' is not a valid number", text));
            None
        }
    }
}

fn optional_date(errors: &mut FieldErrors, field: &'static str, raw: &str) -> Option<NaiveDate> {
    let text = blank_to_none(raw)?;
    match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(_) => {
            errors.add(field, format!("'{}' is not a date (expected YYYY-MM-DD)", text));
            None
        }
    }
}

fn required_date(
    errors: &mut FieldErrors,
    field: &'static str,
    label: &str,
    raw: &str,
) -> Option<NaiveDate> {
    if blank_to_none(raw).is_none() {
        errors.add(field, format!("{} is required", label));
        return None;
    }
    optional_date(errors, field, raw)
}

fn date_text(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}
