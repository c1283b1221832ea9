use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dependency::DependencyKind;
use super::task::TaskStatus;

/// Payload of `GET /projects/{id}/gantt/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttChart {
    #[serde(default)]
    pub data: Vec<GanttTask>,
    #[serde(default)]
    pub links: Vec<GanttLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttTask {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Fraction complete, 0.0–1.0
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub parent: Option<u64>,
    #[serde(default)]
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GanttLink {
    pub id: u64,
    pub source: u64,
    pub target: u64,
    #[serde(rename = "type", default)]
    pub kind: DependencyKind,
    #[serde(default)]
    pub lag: i32,
}

/// Payload of `GET /my/summary/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub my_projects_count: u64,
    pub my_tasks_count: u64,
    #[serde(default)]
    pub my_tasks_by_status: Vec<StatusCount>,
    #[serde(default)]
    pub next_task: Option<NextTask>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: TaskStatus,
    pub count: u64,
}

/// The signed-in user's earliest-starting task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextTask {
    pub id: u64,
    pub title: String,
    pub project_id: u64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}
