//! Per-task editor for incoming dependency edges.
//!
//! The editor never patches its edge list locally. Every add, update or
//! remove attempt, whether it succeeds or not, is followed by a fresh fetch,
//! because only the server knows whether the graph is still acyclic.

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::model::{
    Dependency, DependencyKind, DependencyPatch, LabelCache, NewDependency, Task, coerce_lag_days,
};

use super::classify::DependencyRejection;
use super::surface::Surface;

/// Error type for dependency editing
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("no task is open")]
    NoTask,
    /// The server refused the edge
    #[error("{0}")]
    Rejected(DependencyRejection),
    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    /// No task open
    Idle,
    /// Rows are a fresh server snapshot
    Loaded,
    /// A mutation is in flight
    Mutating,
    /// The edge list could not be fetched; no rows are shown
    Error(String),
}

/// One incoming edge, with its predecessor resolved for display
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRow {
    pub dependency: Dependency,
    pub predecessor_label: String,
    /// The predecessor was not found among the project's tasks
    pub placeholder: bool,
}

/// Raw input of the "add dependency" form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeInput {
    pub predecessor: u64,
    pub kind: DependencyKind,
    /// Lag as typed; blank or invalid text means 0
    pub lag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    Cancelled,
    /// The delete failed; the message was shown through the surface
    Rejected(String),
}

#[derive(Debug)]
pub struct DependencyEditor {
    task: Option<Task>,
    state: EditorState,
    rows: Vec<EdgeRow>,
    candidates: IndexMap<u64, String>,
    titles: LabelCache,
    notice: Option<String>,
}

impl Default for DependencyEditor {
    fn default() -> Self {
        DependencyEditor {
            task: None,
            state: EditorState::Idle,
            rows: Vec::new(),
            candidates: IndexMap::new(),
            titles: LabelCache::new(),
            notice: None,
        }
    }
}

impl DependencyEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn rows(&self) -> &[EdgeRow] {
        &self.rows
    }

    /// Tasks that may still be picked as a predecessor, id → title
    pub fn candidates(&self) -> &IndexMap<u64, String> {
        &self.candidates
    }

    /// Message of the last rejected mutation, kept until the next attempt
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Title of any task in the open task's project
    pub fn task_title(&self, id: u64) -> Option<&str> {
        self.titles.get(id)
    }

    pub fn open(&mut self, client: &ApiClient, task_id: u64) -> Result<(), EditorError> {
        self.close();
        let task = client.get_task(task_id)?;
        self.task = Some(task);
        self.reload(client)
    }

    /// Open an already-fetched task without fetching it again
    pub fn open_task(&mut self, client: &ApiClient, task: Task) -> Result<(), EditorError> {
        self.close();
        self.task = Some(task);
        self.reload(client)
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }

    /// Re-fetch the edges and the project's tasks. On failure the rows are
    /// cleared rather than left stale.
    pub fn reload(&mut self, client: &ApiClient) -> Result<(), EditorError> {
        let (task_id, project_id) = match &self.task {
            Some(t) => (t.id, t.project.id),
            None => return Err(EditorError::NoTask),
        };

        let fetched = client
            .dependencies_of(task_id)
            .and_then(|deps| client.project_tasks(project_id).map(|tasks| (deps, tasks)));

        match fetched {
            Ok((deps, tasks)) => {
                self.titles
                    .replace(tasks.iter().map(|t| (t.id, t.title.clone())));
                self.rows = build_rows(deps, task_id, &self.titles);
                self.candidates = predecessor_candidates(&tasks, task_id, &self.rows);
                self.state = EditorState::Loaded;
                debug!(task = task_id, edges = self.rows.len(), "dependencies loaded");
                Ok(())
            }
            Err(err) => {
                self.rows.clear();
                self.candidates.clear();
                self.state = EditorState::Error(err.to_string());
                Err(err.into())
            }
        }
    }

    pub fn add(&mut self, client: &ApiClient, input: &EdgeInput) -> Result<Dependency, EditorError> {
        let successor = self.open_task_id()?;
        let body = NewDependency {
            predecessor: input.predecessor,
            successor,
            kind: input.kind,
            lag_days: coerce_lag_days(&input.lag),
        };

        self.begin_mutation();
        let result = client.create_dependency(&body);
        if let Ok(dep) = &result {
            info!(id = dep.id, predecessor = body.predecessor, successor, "added dependency");
        }
        self.settle(client, result)
    }

    /// Change type and/or lag of an existing edge
    pub fn update(
        &mut self,
        client: &ApiClient,
        dependency_id: u64,
        patch: &DependencyPatch,
    ) -> Result<Dependency, EditorError> {
        self.open_task_id()?;

        self.begin_mutation();
        let result = client.update_dependency(dependency_id, patch);
        if result.is_ok() {
            info!(id = dependency_id, "updated dependency");
        }
        self.settle(client, result)
    }

    /// Remove after confirmation. A failed delete is reported through
    /// `surface.alert` and the edge stays listed.
    pub fn remove(
        &mut self,
        client: &ApiClient,
        dependency_id: u64,
        surface: &mut dyn Surface,
    ) -> Result<RemoveOutcome, EditorError> {
        self.open_task_id()?;
        let label = self
            .rows
            .iter()
            .find(|r| r.dependency.id == dependency_id)
            .map(|r| r.predecessor_label.clone())
            .unwrap_or_else(|| format!("#{}", dependency_id));
        if !surface.confirm(&format!("Remove dependency on {}?", label)) {
            return Ok(RemoveOutcome::Cancelled);
        }

        self.begin_mutation();
        let outcome = match client.delete_dependency(dependency_id) {
            Ok(()) => {
                info!(id = dependency_id, "removed dependency");
                RemoveOutcome::Removed
            }
            Err(err) => {
                let message = err.to_string();
                warn!(id = dependency_id, error = %message, "dependency delete failed");
                surface.alert(&message);
                RemoveOutcome::Rejected(message)
            }
        };

        self.reload(client)?;
        if let RemoveOutcome::Rejected(message) = &outcome {
            self.notice = Some(message.clone());
        }
        Ok(outcome)
    }

    fn open_task_id(&self) -> Result<u64, EditorError> {
        self.task.as_ref().map(|t| t.id).ok_or(EditorError::NoTask)
    }

    fn begin_mutation(&mut self) {
        self.notice = None;
        self.state = EditorState::Mutating;
    }

    /// Reload after a mutation attempt and fold both results together.
    /// A rejection takes precedence over a failed reload.
    fn settle(
        &mut self,
        client: &ApiClient,
        result: Result<Dependency, ApiError>,
    ) -> Result<Dependency, EditorError> {
        let reloaded = self.reload(client);
        match result {
            Err(err @ ApiError::Http { .. }) => {
                let rejection = DependencyRejection::classify(&err);
                warn!(error = %err, ?rejection, "dependency rejected");
                if reloaded.is_ok() {
                    self.notice = Some(rejection.user_message());
                }
                Err(EditorError::Rejected(rejection))
            }
            Err(err) => Err(err.into()),
            Ok(dep) => reloaded.map(|()| dep),
        }
    }
}

/// Rows for the edges whose successor is `task_id`.
///
/// The list endpoint's `successor` filter is not relied on, so edges are
/// filtered here as well.
fn build_rows(deps: Vec<Dependency>, task_id: u64, titles: &LabelCache) -> Vec<EdgeRow> {
    deps.into_iter()
        .filter(|d| d.successor.id == task_id)
        .map(|dependency| {
            let id = dependency.predecessor.id;
            let (predecessor_label, placeholder) = match titles.get(id) {
                Some(title) => (title.to_string(), false),
                None => (format!("Task #{}", id), true),
            };
            EdgeRow {
                dependency,
                predecessor_label,
                placeholder,
            }
        })
        .collect()
}

/// The project's tasks minus the task itself and its current predecessors
fn predecessor_candidates(tasks: &[Task], task_id: u64, rows: &[EdgeRow]) -> IndexMap<u64, String> {
    tasks
        .iter()
        .filter(|t| t.id != task_id)
        .filter(|t| !rows.iter().any(|r| r.dependency.predecessor.id == t.id))
        .map(|t| (t.id, t.title.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Ref;
    use pretty_assertions::assert_eq;

    fn dep(id: u64, predecessor: u64, successor: u64) -> Dependency {
        Dependency {
            id,
            predecessor: Ref::new(predecessor),
            successor: Ref::new(successor),
            kind: DependencyKind::FinishToStart,
            lag_days: 0,
            created_at: None,
            updated_at: None,
        }
    }

    fn task(id: u64, title: &str) -> Task {
        serde_json::from_value(serde_json::json!({
            "id": id, "title": title, "project": 1
        }))
        .unwrap()
    }

    #[test]
    fn test_missing_predecessor_gets_placeholder() {
        let mut titles = LabelCache::new();
        titles.insert(1, "Design");
        let rows = build_rows(vec![dep(10, 1, 3), dep(11, 2, 3)], 3, &titles);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].predecessor_label, "Design");
        assert!(!rows[0].placeholder);
        assert_eq!(rows[1].predecessor_label, "Task #2");
        assert!(rows[1].placeholder);
    }

    #[test]
    fn test_rows_filtered_by_successor() {
        let rows = build_rows(vec![dep(10, 1, 3), dep(11, 3, 4)], 3, &LabelCache::new());
        let ids: Vec<u64> = rows.iter().map(|r| r.dependency.id).collect();
        assert_eq!(ids, vec![10]);
    }

    #[test]
    fn test_candidates_exclude_self_and_linked() {
        let tasks = vec![task(1, "A"), task(2, "B"), task(3, "C"), task(4, "D")];
        let rows = build_rows(vec![dep(10, 1, 3)], 3, &LabelCache::new());
        let candidates = predecessor_candidates(&tasks, 3, &rows);
        assert_eq!(
            candidates.into_iter().collect::<Vec<_>>(),
            vec![(2, "B".to_string()), (4, "D".to_string())]
        );
    }

    #[test]
    fn test_closed_editor_refuses_mutations() {
        let editor = DependencyEditor::new();
        assert_eq!(editor.state(), &EditorState::Idle);
        assert!(matches!(editor.open_task_id(), Err(EditorError::NoTask)));
    }
}
