//! Typed wrappers over the backend's resource endpoints.

use crate::model::{
    DashboardSummary, Dependency, DependencyPatch, GanttChart, NewDependency, Priority, Project,
    ProjectPayload, ProjectStatus, Task, TaskCopy, TaskPayload, TaskStatus, User,
};

use super::client::{ApiClient, Page};
use super::error::ApiError;

/// Query parameters of `GET /projects/`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectQuery {
    pub status: Option<ProjectStatus>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
    pub owner: Option<u64>,
    pub page: Option<u32>,
}

impl ProjectQuery {
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority".to_string(), u8::from(priority).to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search".to_string(), search.to_string()));
        }
        if let Some(owner) = self.owner {
            pairs.push(("owner".to_string(), owner.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        pairs
    }
}

/// Query parameters of `GET /tasks/`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub search: Option<String>,
    pub assignee: Option<u64>,
    pub project: Option<u64>,
    pub page: Option<u32>,
}

impl TaskQuery {
    pub fn for_project(project: u64) -> Self {
        TaskQuery {
            project: Some(project),
            ..Self::default()
        }
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(assignee) = self.assignee {
            pairs.push(("assignee".to_string(), assignee.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status".to_string(), status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search".to_string(), search.to_string()));
        }
        if let Some(project) = self.project {
            pairs.push(("project".to_string(), project.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        pairs
    }
}

impl ApiClient {
    // --- projects ---

    pub fn list_projects(&self, query: &ProjectQuery) -> Result<Page<Project>, ApiError> {
        self.list("/projects/", query.to_pairs())
    }

    pub fn all_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.list_all("/projects/", Vec::new())
    }

    pub fn get_project(&self, id: u64) -> Result<Project, ApiError> {
        self.get(&format!("/projects/{}/", id), Vec::new())
    }

    pub fn create_project(&self, payload: &ProjectPayload) -> Result<Project, ApiError> {
        self.post("/projects/", payload)
    }

    pub fn update_project(&self, id: u64, payload: &ProjectPayload) -> Result<Project, ApiError> {
        self.patch(&format!("/projects/{}/", id), payload)
    }

    pub fn delete_project(&self, id: u64) -> Result<(), ApiError> {
        self.delete(&format!("/projects/{}/", id))
    }

    pub fn project_gantt(&self, id: u64) -> Result<GanttChart, ApiError> {
        self.get(&format!("/projects/{}/gantt/", id), Vec::new())
    }

    // --- tasks ---

    pub fn list_tasks(&self, query: &TaskQuery) -> Result<Page<Task>, ApiError> {
        self.list("/tasks/", query.to_pairs())
    }

    /// Every task of one project, across pages
    pub fn project_tasks(&self, project: u64) -> Result<Vec<Task>, ApiError> {
        self.list_all("/tasks/", TaskQuery::for_project(project).to_pairs())
    }

    pub fn get_task(&self, id: u64) -> Result<Task, ApiError> {
        self.get(&format!("/tasks/{}/", id), Vec::new())
    }

    pub fn create_task(&self, payload: &TaskPayload) -> Result<Task, ApiError> {
        self.post("/tasks/", payload)
    }

    pub fn update_task(&self, id: u64, payload: &TaskPayload) -> Result<Task, ApiError> {
        self.patch(&format!("/tasks/{}/", id), payload)
    }

    pub fn delete_task(&self, id: u64) -> Result<(), ApiError> {
        self.delete(&format!("/tasks/{}/", id))
    }

    /// Duplicate a task, optionally with its subtasks. Returns the new root.
    pub fn copy_task(&self, id: u64, copy: &TaskCopy) -> Result<Task, ApiError> {
        self.post(&format!("/tasks/{}/copy/", id), copy)
    }

    // --- dependencies ---

    /// Dependencies whose successor is `task`
    pub fn dependencies_of(&self, task: u64) -> Result<Vec<Dependency>, ApiError> {
        self.list_all("/dependencies/", vec![("successor".to_string(), task.to_string())])
    }

    pub fn create_dependency(&self, body: &NewDependency) -> Result<Dependency, ApiError> {
        self.post("/dependencies/", body)
    }

    pub fn update_dependency(&self, id: u64, patch: &DependencyPatch) -> Result<Dependency, ApiError> {
        self.patch(&format!("/dependencies/{}/", id), patch)
    }

    pub fn delete_dependency(&self, id: u64) -> Result<(), ApiError> {
        self.delete(&format!("/dependencies/{}/", id))
    }

    // --- users and dashboard ---

    pub fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.list_all("/users/", Vec::new())
    }

    pub fn summary(&self) -> Result<DashboardSummary, ApiError> {
        self.get("/my/summary/", Vec::new())
    }

    pub fn my_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.list_all("/my/projects/", Vec::new())
    }

    pub fn my_tasks(&self, query: &TaskQuery) -> Result<Page<Task>, ApiError> {
        self.list("/my/tasks/", query.to_pairs())
    }
}
