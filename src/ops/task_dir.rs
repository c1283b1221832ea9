use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, Page, TaskQuery};
use crate::model::{LabelCache, Project, Ref, Task, TaskCopy, TaskStatus, User};

use super::directory::{DeleteOutcome, DirectoryError, SEARCH_DEBOUNCE, SearchInput};
use super::forms::TaskForm;
use super::list_view::{FetchTicket, ListView};
use super::surface::Surface;

/// Filters of the task list. All of them AND together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub project: Option<u64>,
    /// Only tasks assigned to the current user
    pub mine: bool,
}

/// Everything the task edit form needs, fetched up front
#[derive(Debug, Clone)]
pub struct TaskEditSession {
    pub task: Task,
    pub form: TaskForm,
    pub projects: Vec<Project>,
    pub users: Vec<User>,
    pub parent_candidates: Vec<Task>,
}

/// Paginated, filterable list of tasks plus its mutations.
///
/// Project names for display are cached per directory, so two directories
/// never see each other's labels.
#[derive(Debug)]
pub struct TaskDirectory {
    filter: TaskFilter,
    search: SearchInput,
    current_user: Option<u64>,
    view: ListView<Task>,
    project_labels: LabelCache,
}

impl TaskDirectory {
    pub fn new(current_user: Option<u64>) -> Self {
        Self::with_debounce(current_user, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(current_user: Option<u64>, delay: Duration) -> Self {
        TaskDirectory {
            filter: TaskFilter::default(),
            search: SearchInput::new(delay),
            current_user,
            view: ListView::new(),
            project_labels: LabelCache::new(),
        }
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn view(&self) -> &ListView<Task> {
        &self.view
    }

    pub fn search(&self) -> &SearchInput {
        &self.search
    }

    pub fn set_status(&mut self, status: Option<TaskStatus>) {
        self.filter.status = status;
        self.view.reset_page();
    }

    pub fn set_project(&mut self, project: Option<u64>) {
        self.filter.project = project;
        self.view.reset_page();
    }

    pub fn set_mine(&mut self, mine: bool) {
        self.filter.mine = mine;
        self.view.reset_page();
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
        self.view.reset_page();
    }

    pub fn type_search(&mut self, text: &str, now: Instant) {
        self.search.type_text(text, now);
    }

    pub fn poll_search(&mut self, now: Instant) -> bool {
        let changed = self.search.poll(now);
        if changed {
            self.view.reset_page();
        }
        changed
    }

    pub fn set_search(&mut self, text: &str) {
        if self.search.commit(text) {
            self.view.reset_page();
        }
    }

    pub fn set_page(&mut self, page: u32) {
        self.view.set_page(page);
    }

    pub fn next_page(&mut self) -> bool {
        self.view.next_page()
    }

    pub fn previous_page(&mut self) -> bool {
        self.view.previous_page()
    }

    pub fn query(&self) -> TaskQuery {
        let assignee = if self.filter.mine { self.current_user } else { None };
        TaskQuery {
            status: self.filter.status,
            search: Some(self.search.committed().to_string()).filter(|s| !s.is_empty()),
            assignee,
            project: self.filter.project,
            page: Some(self.view.page()),
        }
    }

    /// Display name of a task's project
    pub fn project_label(&self, project: &Ref) -> String {
        self.project_labels.display(project)
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    /// Fill the project name cache. A failure only costs labels, so it is
    /// logged and otherwise ignored.
    pub fn load_project_labels(&mut self, client: &ApiClient) {
        match client.all_projects() {
            Ok(projects) => self
                .project_labels
                .replace(projects.into_iter().map(|p| (p.id, p.name))),
            Err(err) => warn!(error = %err, "could not load project names"),
        }
    }

    pub fn begin_refresh(&mut self) -> FetchTicket<TaskQuery> {
        let query = self.query();
        self.view.begin(query)
    }

    pub fn finish_refresh(
        &mut self,
        ticket: &FetchTicket<TaskQuery>,
        result: Result<Page<Task>, ApiError>,
    ) -> Result<bool, ApiError> {
        if !self.view.is_current(ticket) {
            debug!(ticket = ticket.generation(), "dropping stale task response");
            return Ok(false);
        }
        let page = result?;
        for task in &page.items {
            self.project_labels.absorb(&task.project);
        }
        Ok(self.view.complete(ticket, page))
    }

    pub fn refresh(&mut self, client: &ApiClient) -> Result<&[Task], DirectoryError> {
        let ticket = self.begin_refresh();
        let result = client.list_tasks(&ticket.query);
        self.finish_refresh(&ticket, result)?;
        Ok(self.view.items())
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn create(&mut self, client: &ApiClient, form: &TaskForm) -> Result<Task, DirectoryError> {
        let payload = form.validate()?;
        let task = client.create_task(&payload)?;
        info!(id = task.id, project = task.project.id, "created task");
        Ok(task)
    }

    pub fn update(&mut self, client: &ApiClient, id: u64, form: &TaskForm) -> Result<Task, DirectoryError> {
        let payload = form.validate()?;
        let task = client.update_task(id, &payload)?;
        info!(id, "updated task");
        Ok(task)
    }

    /// Delete after confirmation; failures carry the server's message as-is
    pub fn delete(
        &mut self,
        client: &ApiClient,
        id: u64,
        surface: &mut dyn Surface,
    ) -> Result<DeleteOutcome, DirectoryError> {
        if !surface.confirm(&format!("Delete task #{}?", id)) {
            return Ok(DeleteOutcome::Cancelled);
        }
        client.delete_task(id)?;
        info!(id, "deleted task");
        Ok(DeleteOutcome::Deleted)
    }

    /// Duplicate task `id`. A blank title override counts as unset.
    pub fn copy(&mut self, client: &ApiClient, id: u64, copy: &TaskCopy) -> Result<Task, DirectoryError> {
        let copy = TaskCopy {
            title: copy
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            ..copy.clone()
        };
        let task = client.copy_task(id, &copy)?;
        info!(
            source = id,
            id = task.id,
            project = task.project.id,
            children = copy.include_children,
            "copied task"
        );
        Ok(task)
    }

    /// Fetch the task, the project and user lists, and the parent choices
    /// for its project.
    pub fn load_for_edit(&mut self, client: &ApiClient, id: u64) -> Result<TaskEditSession, DirectoryError> {
        let task = client.get_task(id)?;
        let projects = client.all_projects()?;
        let users = client.list_users()?;
        let parent_candidates = parent_candidates(client, task.project.id, Some(task.id))?;

        self.project_labels
            .replace(projects.iter().map(|p| (p.id, p.name.clone())));

        Ok(TaskEditSession {
            form: TaskForm::from_task(&task),
            task,
            projects,
            users,
            parent_candidates,
        })
    }
}

/// Tasks that may be chosen as a parent within `project`: root tasks only,
/// never the task being edited.
pub fn parent_candidates(
    client: &ApiClient,
    project: u64,
    exclude: Option<u64>,
) -> Result<Vec<Task>, ApiError> {
    let tasks = client.project_tasks(project)?;
    Ok(tasks
        .into_iter()
        .filter(|t| t.is_root() && Some(t.id) != exclude)
        .collect())
}
