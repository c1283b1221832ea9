use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{
    DashboardSummary, DependencyKind, GanttChart, LabelCache, Project, Task, User,
};
use crate::ops::dep_editor::{DependencyEditor, EdgeRow};
use crate::ops::list_view::ListView;
use crate::util::unicode::{display_width, pad_to_width, single_line};

const TITLE_COLUMN: usize = 32;
const NAME_COLUMN: usize = 20;
const GANTT_WIDTH: usize = 40;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct PageJson<T: Serialize> {
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    pub has_next: bool,
    pub has_previous: bool,
    pub items: Vec<T>,
}

#[derive(Serialize)]
pub struct TaskJson<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

#[derive(Serialize)]
pub struct EdgeJson {
    pub id: u64,
    pub predecessor: u64,
    pub predecessor_title: String,
    /// True when the predecessor is no longer among the project's tasks
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub missing: bool,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
    pub lag_days: i32,
}

#[derive(Serialize)]
pub struct CandidateJson {
    pub id: u64,
    pub title: String,
}

#[derive(Serialize)]
pub struct DependencyViewJson {
    pub task: u64,
    pub title: String,
    pub dependencies: Vec<EdgeJson>,
    pub candidates: Vec<CandidateJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn page_to_json<T: Clone + Serialize>(view: &ListView<T>) -> PageJson<T> {
    PageJson {
        page: view.page(),
        count: view.count(),
        has_next: view.has_next(),
        has_previous: view.has_previous(),
        items: view.items().to_vec(),
    }
}

pub fn edge_to_json(row: &EdgeRow) -> EdgeJson {
    EdgeJson {
        id: row.dependency.id,
        predecessor: row.dependency.predecessor.id,
        predecessor_title: row.predecessor_label.clone(),
        missing: row.placeholder,
        kind: row.dependency.kind,
        lag_days: row.dependency.lag_days,
    }
}

pub fn dependency_view_to_json(editor: &DependencyEditor) -> DependencyViewJson {
    let (task, title) = editor
        .task()
        .map(|t| (t.id, t.title.clone()))
        .unwrap_or_default();
    DependencyViewJson {
        task,
        title,
        dependencies: editor.rows().iter().map(edge_to_json).collect(),
        candidates: editor
            .candidates()
            .iter()
            .map(|(id, title)| CandidateJson {
                id: *id,
                title: title.clone(),
            })
            .collect(),
        notice: editor.notice().map(str::to_string),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    let fmt = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "—".to_string());
    if start.is_none() && end.is_none() {
        return String::new();
    }
    format!("{} → {}", fmt(start), fmt(end))
}

/// Ten-cell bar for a 0–100 progress value
pub fn format_progress(progress: u8) -> String {
    let filled = (usize::from(progress.min(100)) + 5) / 10;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(10 - filled),
        progress
    )
}

pub fn format_project_line(project: &Project, owners: &LabelCache) -> String {
    let owner = project
        .owner
        .as_ref()
        .map(|o| format!(" @{}", owners.display(o)))
        .unwrap_or_default();
    format!(
        "#{:<4} {} {} {} {:>3} tasks  {}{}",
        project.id,
        pad_to_width(&single_line(&project.name), TITLE_COLUMN),
        pad_to_width(project.status.label(), 9),
        pad_to_width(project.priority.label(), 8),
        project.tasks_count,
        date_range(project.start_date, project.end_date),
        owner
    )
    .trim_end()
    .to_string()
}

pub fn format_project_detail(project: &Project, owners: &LabelCache) -> Vec<String> {
    let mut lines = vec![format!("#{} {}", project.id, project.name)];
    lines.push(format!("status: {}", project.status.label()));
    lines.push(format!(
        "priority: {} ({})",
        project.priority.label(),
        u8::from(project.priority)
    ));
    if let Some(owner) = &project.owner {
        lines.push(format!("owner: {}", owners.display(owner)));
    }
    let dates = date_range(project.start_date, project.end_date);
    if !dates.is_empty() {
        lines.push(format!("dates: {}", dates));
    }
    lines.push(format!("tasks: {}", project.tasks_count));
    if !project.description.trim().is_empty() {
        lines.push("description:".to_string());
        for line in project.description.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

pub fn format_task_line(task: &Task, project_name: &str) -> String {
    let indent = if task.is_root() { "" } else { "  " };
    format!(
        "[{}] #{:<4} {}{} {} {}  {}",
        task.status.marker(),
        task.id,
        indent,
        pad_to_width(&single_line(&task.title), TITLE_COLUMN - indent.len()),
        pad_to_width(project_name, NAME_COLUMN),
        format_progress(task.progress),
        date_range(task.start_date, task.end_date)
    )
    .trim_end()
    .to_string()
}

/// Label lookups used by the task detail view, one cache per entity kind
#[derive(Debug, Default)]
pub struct TaskLabels {
    pub projects: LabelCache,
    pub tasks: LabelCache,
    pub users: LabelCache,
}

pub fn format_task_detail(task: &Task, labels: &TaskLabels) -> Vec<String> {
    let mut lines = vec![format!("[{}] #{} {}", task.status.marker(), task.id, task.title)];
    lines.push(format!("status: {}", task.status.label()));
    lines.push(format!("progress: {}", format_progress(task.progress)));
    lines.push(format!("project: {}", labels.projects.display(&task.project)));
    if let Some(parent) = &task.parent {
        lines.push(format!("parent: #{} {}", parent.id, labels.tasks.display(parent)));
    }
    if let Some(assignee) = &task.assignee {
        lines.push(format!("assignee: {}", labels.users.display(assignee)));
    }
    let dates = date_range(task.start_date, task.end_date);
    if !dates.is_empty() {
        lines.push(format!("dates: {}", dates));
    }
    if let Some(days) = task.duration_days {
        lines.push(format!("duration: {} days", days));
    }
    match (&task.estimated_hours, &task.actual_hours) {
        (None, None) => {}
        (est, act) => lines.push(format!(
            "hours: {} estimated, {} actual",
            est.as_deref().unwrap_or("-"),
            act.as_deref().unwrap_or("-")
        )),
    }
    if !task.description.trim().is_empty() {
        lines.push("description:".to_string());
        for line in task.description.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

pub fn format_edge_line(row: &EdgeRow) -> String {
    let dep = &row.dependency;
    let lag = match dep.lag_days {
        0 => String::new(),
        n => format!(" {:+}d", n),
    };
    let missing = if row.placeholder { " (missing)" } else { "" };
    format!(
        "#{:<4} {}{}  after #{} {}{}",
        dep.id,
        dep.kind.code(),
        lag,
        dep.predecessor.id,
        row.predecessor_label,
        missing
    )
}

pub fn format_dependency_view(editor: &DependencyEditor) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(task) = editor.task() {
        lines.push(format!("#{} {}", task.id, task.title));
    }
    if let Some(notice) = editor.notice() {
        lines.push(format!("! {}", notice));
    }
    if editor.rows().is_empty() {
        lines.push("no dependencies".to_string());
    } else {
        lines.push("depends on:".to_string());
        for row in editor.rows() {
            lines.push(format!("  {}", format_edge_line(row)));
        }
    }
    if !editor.candidates().is_empty() {
        lines.push("can also depend on:".to_string());
        for (id, title) in editor.candidates() {
            lines.push(format!("  #{:<4} {}", id, single_line(title)));
        }
    }
    lines
}

/// One-line page indicator, or None for an unpaginated list
pub fn format_page_footer<T>(view: &ListView<T>) -> Option<String> {
    if !view.has_next() && !view.has_previous() && view.page() == 1 {
        return None;
    }
    let total = view
        .count()
        .map(|c| format!(" of {} items", c))
        .unwrap_or_default();
    let more = if view.has_next() { " (more: --page N)" } else { "" };
    Some(format!("page {}{}{}", view.page(), total, more))
}

pub fn format_user_line(user: &User) -> String {
    format!("#{:<4} {}", user.id, user.username)
}

pub fn format_summary(summary: &DashboardSummary) -> Vec<String> {
    let mut lines = vec![
        format!("projects: {}", summary.my_projects_count),
        format!("tasks: {}", summary.my_tasks_count),
    ];
    for entry in &summary.my_tasks_by_status {
        lines.push(format!(
            "  [{}] {}: {}",
            entry.status.marker(),
            entry.status.label(),
            entry.count
        ));
    }
    if let Some(next) = &summary.next_task {
        lines.push(format!(
            "next: #{} {} (project #{}) {}",
            next.id,
            next.title,
            next.project_id,
            date_range(next.start_date, next.end_date)
        ));
    }
    lines.iter_mut().for_each(|l| *l = l.trim_end().to_string());
    lines
}

/// Text timeline: one bar per task scaled to the project's date span,
/// followed by the dependency links.
pub fn format_gantt(chart: &GanttChart) -> Vec<String> {
    let mut lines = Vec::new();
    let start = chart.data.iter().filter_map(|t| t.start_date).min();
    let end = chart
        .data
        .iter()
        .filter_map(|t| t.end_date.or(t.start_date))
        .max();

    let label_width = chart
        .data
        .iter()
        .map(|t| display_width(&t.text) + 6 + if t.parent.is_some() { 2 } else { 0 })
        .max()
        .unwrap_or(0)
        .min(TITLE_COLUMN + 6);

    if let (Some(start), Some(end)) = (start, end) {
        lines.push(format!("{} → {}", start, end));
        let span = (end - start).num_days().max(1) as f64;
        let cell = |d: NaiveDate| (((d - start).num_days() as f64 / span) * (GANTT_WIDTH - 1) as f64).round() as usize;
        for task in &chart.data {
            let indent = if task.parent.is_some() { "  " } else { "" };
            let label = format!("{}#{:<4} {}", indent, task.id, single_line(&task.text));
            let bar = match (task.start_date, task.end_date.or(task.start_date)) {
                (Some(s), Some(e)) => {
                    let from = cell(s);
                    let to = cell(e).max(from);
                    let len = to - from + 1;
                    let done = ((task.progress.clamp(0.0, 1.0)) * len as f64).round() as usize;
                    format!("{}{}{}", " ".repeat(from), "█".repeat(done), "░".repeat(len - done))
                }
                _ => String::new(),
            };
            lines.push(format!("{} |{}", pad_to_width(&label, label_width), bar).trim_end().to_string());
        }
    } else {
        for task in &chart.data {
            lines.push(format!("#{:<4} {}", task.id, single_line(&task.text)));
        }
    }

    if !chart.links.is_empty() {
        lines.push("links:".to_string());
        for link in &chart.links {
            let lag = match link.lag {
                0 => String::new(),
                n => format!(" {:+}d", n),
            };
            lines.push(format!("  #{} → #{} {}{}", link.source, link.target, link.kind.code(), lag));
        }
    }
    lines
}
