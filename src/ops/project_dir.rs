use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, Page, ProjectQuery};
use crate::model::{Priority, Project, ProjectStatus};

use super::classify::is_protected_delete;
use super::directory::{DeleteOutcome, DirectoryError, SEARCH_DEBOUNCE, SearchInput};
use super::forms::ProjectForm;
use super::list_view::{FetchTicket, ListView};
use super::surface::Surface;

/// Filters of the project list. All of them AND together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    /// Only projects owned by the current user
    pub mine: bool,
}

/// Paginated, filterable list of projects plus its mutations.
#[derive(Debug)]
pub struct ProjectDirectory {
    filter: ProjectFilter,
    search: SearchInput,
    current_user: Option<u64>,
    view: ListView<Project>,
}

impl ProjectDirectory {
    pub fn new(current_user: Option<u64>) -> Self {
        Self::with_debounce(current_user, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(current_user: Option<u64>, delay: Duration) -> Self {
        ProjectDirectory {
            filter: ProjectFilter::default(),
            search: SearchInput::new(delay),
            current_user,
            view: ListView::new(),
        }
    }

    pub fn filter(&self) -> &ProjectFilter {
        &self.filter
    }

    pub fn view(&self) -> &ListView<Project> {
        &self.view
    }

    pub fn search(&self) -> &SearchInput {
        &self.search
    }

    // -----------------------------------------------------------------------
    // Filters: every change starts again from page 1
    // -----------------------------------------------------------------------

    pub fn set_status(&mut self, status: Option<ProjectStatus>) {
        self.filter.status = status;
        self.view.reset_page();
    }

    pub fn set_priority(&mut self, priority: Option<Priority>) {
        self.filter.priority = priority;
        self.view.reset_page();
    }

    pub fn set_mine(&mut self, mine: bool) {
        self.filter.mine = mine;
        self.view.reset_page();
    }

    /// Replace all filters at once
    pub fn set_filter(&mut self, filter: ProjectFilter) {
        self.filter = filter;
        self.view.reset_page();
    }

    pub fn type_search(&mut self, text: &str, now: Instant) {
        self.search.type_text(text, now);
    }

    /// True when debounced search text was committed and a refresh is due
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

    /// The query the current filter state maps to
    pub fn query(&self) -> ProjectQuery {
        // "mine" without a known user id has nothing to compare against
        let owner = if self.filter.mine { self.current_user } else { None };
        ProjectQuery {
            status: self.filter.status,
            priority: self.filter.priority,
            search: Some(self.search.committed().to_string()).filter(|s| !s.is_empty()),
            owner,
            page: Some(self.view.page()),
        }
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    pub fn begin_refresh(&mut self) -> FetchTicket<ProjectQuery> {
        let query = self.query();
        self.view.begin(query)
    }

    /// Install a response. A response to a superseded ticket, page or
    /// error alike, is dropped and `Ok(false)` returned.
    pub fn finish_refresh(
        &mut self,
        ticket: &FetchTicket<ProjectQuery>,
        result: Result<Page<Project>, ApiError>,
    ) -> Result<bool, ApiError> {
        if !self.view.is_current(ticket) {
            debug!(ticket = ticket.generation(), "dropping stale project response");
            return Ok(false);
        }
        Ok(self.view.complete(ticket, result?))
    }

    pub fn refresh(&mut self, client: &ApiClient) -> Result<&[Project], DirectoryError> {
        let ticket = self.begin_refresh();
        let result = client.list_projects(&ticket.query);
        self.finish_refresh(&ticket, result)?;
        Ok(self.view.items())
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub fn create(&mut self, client: &ApiClient, form: &ProjectForm) -> Result<Project, DirectoryError> {
        let payload = form.validate()?;
        let project = client.create_project(&payload)?;
        info!(id = project.id, name = %project.name, "created project");
        Ok(project)
    }

    pub fn update(
        &mut self,
        client: &ApiClient,
        id: u64,
        form: &ProjectForm,
    ) -> Result<Project, DirectoryError> {
        let payload = form.validate()?;
        let project = client.update_project(id, &payload)?;
        info!(id, "updated project");
        Ok(project)
    }

    /// Delete after confirmation. A refusal because the project still owns
    /// tasks becomes [`DirectoryError::HasTasks`].
    pub fn delete(
        &mut self,
        client: &ApiClient,
        id: u64,
        surface: &mut dyn Surface,
    ) -> Result<DeleteOutcome, DirectoryError> {
        if !surface.confirm(&format!("Delete project #{}?", id)) {
            return Ok(DeleteOutcome::Cancelled);
        }
        match client.delete_project(id) {
            Ok(()) => {
                info!(id, "deleted project");
                Ok(DeleteOutcome::Deleted)
            }
            Err(err @ ApiError::Http { .. }) if is_protected_delete(&err) => {
                warn!(id, error = %err, "project still has tasks");
                Err(DirectoryError::HasTasks)
            }
            Err(err) => Err(err.into()),
        }
    }
}
