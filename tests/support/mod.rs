//! In-memory stand-in for the backend REST API.
//!
//! Behaves like the real server where the client depends on it: it refuses
//! self, cross-project and cycle-closing dependencies with localized
//! messages, refuses to delete a project that still has tasks, and ignores
//! the `successor` filter on the dependency list.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde_json::{Value, json};
use workly::api::{ApiClient, HttpRequest, HttpResponse, Method, Transport, TransportError};
use workly::ops::surface::Surface;

pub const BASE_URL: &str = "http://test/api";

pub struct MemoryBackend {
    state: RefCell<State>,
}

struct State {
    projects: Vec<Value>,
    tasks: Vec<Value>,
    dependencies: Vec<Value>,
    users: Vec<Value>,
    next_id: u64,
    /// Paginate list responses instead of returning bare arrays
    envelope: bool,
    page_size: usize,
    not_modified: u32,
    failures: Vec<(Method, String, HttpResponse)>,
    requests: Vec<HttpRequest>,
}

impl MemoryBackend {
    /// Lists come back as bare arrays
    pub fn new() -> Rc<Self> {
        Self::build(false, 50)
    }

    /// Lists come back as `{count, next, previous, results}` pages
    pub fn paginated(page_size: usize) -> Rc<Self> {
        Self::build(true, page_size)
    }

    fn build(envelope: bool, page_size: usize) -> Rc<Self> {
        Rc::new(MemoryBackend {
            state: RefCell::new(State {
                projects: Vec::new(),
                tasks: Vec::new(),
                dependencies: Vec::new(),
                users: Vec::new(),
                next_id: 1,
                envelope,
                page_size,
                not_modified: 0,
                failures: Vec::new(),
                requests: Vec::new(),
            }),
        })
    }

    pub fn client(self: &Rc<Self>) -> ApiClient {
        ApiClient::new(
            BASE_URL,
            Some("sessionid=s3ss; csrftoken=tok".to_string()),
            Box::new(Rc::clone(self)),
        )
    }

    // --- seeding ---

    pub fn add_user(&self, username: &str) -> u64 {
        let mut s = self.state.borrow_mut();
        let id = s.take_id();
        s.users.push(json!({"id": id, "username": username}));
        id
    }

    pub fn add_project(&self, name: &str) -> u64 {
        self.add_project_with(json!({"name": name}))
    }

    pub fn add_project_with(&self, fields: Value) -> u64 {
        let mut s = self.state.borrow_mut();
        let id = s.take_id();
        let mut project = json!({
            "id": id,
            "name": "",
            "description": "",
            "status": "planned",
            "priority": 2,
            "owner": null,
            "start_date": "2025-01-01",
            "end_date": "2025-12-31",
        });
        merge(&mut project, &fields);
        s.projects.push(project);
        id
    }

    pub fn add_task(&self, project: u64, title: &str) -> u64 {
        self.add_task_with(json!({"project": project, "title": title}))
    }

    pub fn add_task_with(&self, fields: Value) -> u64 {
        let mut s = self.state.borrow_mut();
        let id = s.take_id();
        let mut task = new_task(id);
        merge(&mut task, &fields);
        s.tasks.push(task);
        id
    }

    pub fn add_dependency(&self, predecessor: u64, successor: u64) -> u64 {
        let mut s = self.state.borrow_mut();
        let id = s.take_id();
        s.dependencies.push(json!({
            "id": id,
            "predecessor": predecessor,
            "successor": successor,
            "type": "FS",
            "lag_days": 0,
        }));
        id
    }

    /// Drop a task without touching the edges that point at it
    pub fn forget_task(&self, id: u64) {
        self.state.borrow_mut().tasks.retain(|t| id_of(t) != id);
    }

    // --- failure injection ---

    /// Answer the next `n` GET requests with `304 Not Modified`
    pub fn answer_not_modified(&self, n: u32) {
        self.state.borrow_mut().not_modified = n;
    }

    /// Answer the next request matching `method` and path prefix with an error
    pub fn fail_once(&self, method: Method, path_prefix: &str, status: u16, body: Value) {
        self.state.borrow_mut().failures.push((
            method,
            path_prefix.to_string(),
            HttpResponse::new(status, body.to_string()),
        ));
    }

    // --- inspection ---

    pub fn dependency_count(&self) -> usize {
        self.state.borrow().dependencies.len()
    }

    pub fn dependency(&self, id: u64) -> Option<Value> {
        find(&self.state.borrow().dependencies, id).cloned()
    }

    /// Titles of the direct children of `parent`, in creation order
    pub fn child_titles(&self, parent: u64) -> Vec<String> {
        self.state
            .borrow()
            .tasks
            .iter()
            .filter(|t| field_id(t, "parent") == Some(parent))
            .map(|t| text_field(t, "title"))
            .collect()
    }

    pub fn task_count(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    pub fn project_exists(&self, id: u64) -> bool {
        find(&self.state.borrow().projects, id).is_some()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.borrow().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.borrow().requests.len()
    }

    /// Requests other than GET
    pub fn mutations(&self) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != Method::Get)
            .collect()
    }

    pub fn clear_requests(&self) {
        self.state.borrow_mut().requests.clear();
    }
}

impl Transport for MemoryBackend {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut s = self.state.borrow_mut();
        s.requests.push(request.clone());

        let path = request
            .url
            .strip_prefix(BASE_URL)
            .ok_or_else(|| TransportError(format!("unknown host in {}", request.url)))?
            .to_string();

        if request.method == Method::Get && s.not_modified > 0 {
            s.not_modified -= 1;
            return Ok(HttpResponse::new(304, ""));
        }
        if let Some(pos) = s
            .failures
            .iter()
            .position(|(m, prefix, _)| *m == request.method && path.starts_with(prefix.as_str()))
        {
            let (_, _, response) = s.failures.remove(pos);
            return Ok(response);
        }

        let body: Value = match &request.body {
            Some(text) => serde_json::from_str(text).map_err(|e| TransportError(e.to_string()))?,
            None => Value::Null,
        };
        Ok(s.route(request, &path, body))
    }
}

impl State {
    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn route(&mut self, request: &HttpRequest, path: &str, body: Value) -> HttpResponse {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let id = segments.get(1).and_then(|s| s.parse::<u64>().ok());

        match (request.method, segments.as_slice(), id) {
            (Method::Get, ["projects"], _) => {
                let items = self.filtered_projects(request);
                self.page(path, items, request)
            }
            (Method::Post, ["projects"], _) => self.create_project(body),
            (Method::Get, ["projects", _], Some(id)) => match find(&self.projects, id) {
                Some(p) => ok(self.render_project(p)),
                None => not_found(),
            },
            (Method::Patch, ["projects", _], Some(id)) => {
                match self.projects.iter_mut().find(|p| id_of(p) == id) {
                    Some(p) => {
                        merge(p, &body);
                        let p = p.clone();
                        ok(self.render_project(&p))
                    }
                    None => not_found(),
                }
            }
            (Method::Delete, ["projects", _], Some(id)) => self.delete_project(id),

            (Method::Get, ["tasks"], _) => {
                let items = self.filtered_tasks(request);
                self.page(path, items, request)
            }
            (Method::Post, ["tasks"], _) => self.create_task(body),
            (Method::Get, ["tasks", _], Some(id)) => match find(&self.tasks, id) {
                Some(t) => ok(t.clone()),
                None => not_found(),
            },
            (Method::Patch, ["tasks", _], Some(id)) => {
                match self.tasks.iter_mut().find(|t| id_of(t) == id) {
                    Some(t) => {
                        merge(t, &body);
                        ok(t.clone())
                    }
                    None => not_found(),
                }
            }
            (Method::Delete, ["tasks", _], Some(id)) => {
                if find(&self.tasks, id).is_none() {
                    return not_found();
                }
                self.tasks.retain(|t| id_of(t) != id);
                self.dependencies.retain(|d| {
                    field_id(d, "predecessor") != Some(id) && field_id(d, "successor") != Some(id)
                });
                no_content()
            }

            (Method::Post, ["tasks", _, "copy"], Some(id)) => self.copy_task(id, body),

            // The real server ignores `successor` here as well
            (Method::Get, ["dependencies"], _) => {
                let items = self.dependencies.clone();
                self.page(path, items, request)
            }
            (Method::Post, ["dependencies"], _) => self.create_dependency(body),
            (Method::Patch, ["dependencies", _], Some(id)) => self.update_dependency(id, body),
            (Method::Delete, ["dependencies", _], Some(id)) => {
                if find(&self.dependencies, id).is_none() {
                    return not_found();
                }
                self.dependencies.retain(|d| id_of(d) != id);
                no_content()
            }

            (Method::Get, ["users"], _) => {
                let items = self.users.clone();
                self.page(path, items, request)
            }
            _ => not_found(),
        }
    }

    // --- projects ---

    fn render_project(&self, project: &Value) -> Value {
        let id = id_of(project);
        let mut out = project.clone();
        let count = self
            .tasks
            .iter()
            .filter(|t| field_id(t, "project") == Some(id))
            .count();
        out["tasks_count"] = json!(count);
        out
    }

    fn filtered_projects(&self, request: &HttpRequest) -> Vec<Value> {
        let search = request.query_value("search").map(str::to_lowercase);
        self.projects
            .iter()
            .filter(|p| matches_text(p, "status", request.query_value("status")))
            .filter(|p| matches_number(p, "priority", request.query_value("priority")))
            .filter(|p| matches_number(p, "owner", request.query_value("owner")))
            .filter(|p| match &search {
                Some(q) => text_of(p, "name").contains(q) || text_of(p, "description").contains(q),
                None => true,
            })
            .map(|p| self.render_project(p))
            .collect()
    }

    fn create_project(&mut self, body: Value) -> HttpResponse {
        if body["name"].as_str().is_none_or(|n| n.trim().is_empty()) {
            return error(400, json!({"name": ["This field may not be blank."]}));
        }
        let id = self.take_id();
        let mut project = json!({"id": id, "description": "", "status": "planned", "priority": 2});
        merge(&mut project, &body);
        self.projects.push(project.clone());
        created(self.render_project(&project))
    }

    fn delete_project(&mut self, id: u64) -> HttpResponse {
        if find(&self.projects, id).is_none() {
            return not_found();
        }
        if self.tasks.iter().any(|t| field_id(t, "project") == Some(id)) {
            return error(
                409,
                json!({"detail": "Nie można usunąć projektu, który ma przypisane zadania."}),
            );
        }
        self.projects.retain(|p| id_of(p) != id);
        no_content()
    }

    // --- tasks ---

    fn filtered_tasks(&self, request: &HttpRequest) -> Vec<Value> {
        let search = request.query_value("search").map(str::to_lowercase);
        self.tasks
            .iter()
            .filter(|t| matches_text(t, "status", request.query_value("status")))
            .filter(|t| matches_number(t, "project", request.query_value("project")))
            .filter(|t| matches_number(t, "assignee", request.query_value("assignee")))
            .filter(|t| match &search {
                Some(q) => text_of(t, "title").contains(q) || text_of(t, "description").contains(q),
                None => true,
            })
            .cloned()
            .collect()
    }

    fn create_task(&mut self, body: Value) -> HttpResponse {
        let project = body["project"].as_u64();
        if project.is_none_or(|p| find(&self.projects, p).is_none()) {
            return error(
                400,
                json!({"project": [format!("Invalid pk \"{}\" - object does not exist.", body["project"])]}),
            );
        }
        if body["title"].as_str().is_none_or(|t| t.trim().is_empty()) {
            return error(400, json!({"title": ["This field may not be blank."]}));
        }
        let id = self.take_id();
        let mut task = new_task(id);
        merge(&mut task, &body);
        self.tasks.push(task.clone());
        created(task)
    }

    fn copy_task(&mut self, id: u64, body: Value) -> HttpResponse {
        let Some(source) = find(&self.tasks, id).cloned() else {
            return not_found();
        };
        let project = body["project"].as_u64().or_else(|| field_id(&source, "project"));
        let parent = body["parent"].as_u64();
        let title = match body["title"].as_str().filter(|t| !t.is_empty()) {
            Some(title) => title.to_string(),
            None => format!("Kopia: {}", text_field(&source, "title")),
        };

        let root = self.clone_task(&source, project, parent, title);
        if body["include_children"].as_bool().unwrap_or(false) {
            self.clone_children(id, id_of(&root), project);
        }
        created(root)
    }

    fn clone_children(&mut self, source: u64, target: u64, project: Option<u64>) {
        let mut children: Vec<Value> = self
            .tasks
            .iter()
            .filter(|t| field_id(t, "parent") == Some(source))
            .cloned()
            .collect();
        children.sort_by_key(|t| (t["sort_index"].as_u64().unwrap_or(0), id_of(t)));
        for child in children {
            let title = text_field(&child, "title");
            let clone = self.clone_task(&child, project, Some(target), title);
            self.clone_children(id_of(&child), id_of(&clone), project);
        }
    }

    fn clone_task(&mut self, source: &Value, project: Option<u64>, parent: Option<u64>, title: String) -> Value {
        let sort_index = self
            .tasks
            .iter()
            .filter(|t| field_id(t, "project") == project)
            .filter_map(|t| t["sort_index"].as_u64())
            .max()
            .unwrap_or(0)
            + 10;
        let id = self.take_id();
        let mut clone = source.clone();
        clone["id"] = json!(id);
        clone["project"] = json!(project);
        clone["parent"] = json!(parent);
        clone["title"] = json!(title);
        clone["sort_index"] = json!(sort_index);
        clone["actual_hours"] = Value::Null;
        self.tasks.push(clone.clone());
        clone
    }

    // --- dependencies ---

    fn create_dependency(&mut self, body: Value) -> HttpResponse {
        let (Some(predecessor), Some(successor)) =
            (body["predecessor"].as_u64(), body["successor"].as_u64())
        else {
            return error(400, json!({"predecessor": ["This field is required."]}));
        };
        if predecessor == successor {
            return error(
                400,
                json!({"non_field_errors": ["Zadanie nie może zależeć od samego siebie."]}),
            );
        }
        let project_of = |id: u64| find(&self.tasks, id).and_then(|t| field_id(t, "project"));
        let (Some(pred_project), Some(succ_project)) = (project_of(predecessor), project_of(successor))
        else {
            return error(400, json!({"predecessor": ["Invalid pk - object does not exist."]}));
        };
        if pred_project != succ_project {
            return error(
                400,
                json!({"non_field_errors": ["Zadania muszą należeć do tego samego projektu."]}),
            );
        }
        if self.dependencies.iter().any(|d| {
            field_id(d, "predecessor") == Some(predecessor) && field_id(d, "successor") == Some(successor)
        }) {
            return error(
                400,
                json!({"non_field_errors": ["The fields predecessor, successor must make a unique set."]}),
            );
        }
        if self.reaches(successor, predecessor) {
            return error(400, json!({"detail": "This dependency would create a cycle."}));
        }

        let id = self.take_id();
        let dependency = json!({
            "id": id,
            "predecessor": predecessor,
            "successor": successor,
            "type": body.get("type").cloned().unwrap_or(json!("FS")),
            "lag_days": body.get("lag_days").cloned().unwrap_or(json!(0)),
        });
        self.dependencies.push(dependency.clone());
        created(dependency)
    }

    fn update_dependency(&mut self, id: u64, body: Value) -> HttpResponse {
        if let Some(kind) = body.get("type").and_then(Value::as_str) {
            if !["FS", "SS", "FF", "SF"].contains(&kind) {
                return error(400, json!({"type": [format!("\"{}\" is not a valid choice.", kind)]}));
            }
        }
        match self.dependencies.iter_mut().find(|d| id_of(d) == id) {
            Some(d) => {
                merge(d, &body);
                ok(d.clone())
            }
            None => not_found(),
        }
    }

    /// Whether `to` can be reached from `from` along predecessor → successor edges
    fn reaches(&self, from: u64, to: u64) -> bool {
        let mut stack = vec![from];
        let mut seen = Vec::new();
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if seen.contains(&node) {
                continue;
            }
            seen.push(node);
            stack.extend(
                self.dependencies
                    .iter()
                    .filter(|d| field_id(d, "predecessor") == Some(node))
                    .filter_map(|d| field_id(d, "successor")),
            );
        }
        false
    }

    // --- lists ---

    fn page(&self, path: &str, items: Vec<Value>, request: &HttpRequest) -> HttpResponse {
        if !self.envelope {
            return ok(Value::Array(items));
        }
        let page = request
            .query_value("page")
            .and_then(|p| p.parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let count = items.len();
        let start = (page - 1) * self.page_size;
        if page > 1 && start >= count {
            return error(404, json!({"detail": "Invalid page."}));
        }
        let link = |n: usize| json!(format!("{}{}?page={}", BASE_URL, path, n));
        ok(json!({
            "count": count,
            "next": if start + self.page_size < count { link(page + 1) } else { Value::Null },
            "previous": if page > 1 { link(page - 1) } else { Value::Null },
            "results": items.into_iter().skip(start).take(self.page_size).collect::<Vec<_>>(),
        }))
    }
}

fn new_task(id: u64) -> Value {
    json!({
        "id": id,
        "project": null,
        "parent": null,
        "title": "",
        "description": "",
        "assignee": null,
        "status": "todo",
        "progress": 0,
        "start_date": null,
        "end_date": null,
        "sort_index": 0,
    })
}

fn merge(target: &mut Value, fields: &Value) {
    if let (Some(target), Some(fields)) = (target.as_object_mut(), fields.as_object()) {
        for (k, v) in fields {
            if k != "id" {
                target.insert(k.clone(), v.clone());
            }
        }
    }
}

fn id_of(v: &Value) -> u64 {
    v["id"].as_u64().unwrap_or_default()
}

fn field_id(v: &Value, field: &str) -> Option<u64> {
    v[field].as_u64()
}

fn find(items: &[Value], id: u64) -> Option<&Value> {
    items.iter().find(|v| id_of(v) == id)
}

fn text_field(v: &Value, field: &str) -> String {
    v[field].as_str().unwrap_or_default().to_string()
}

fn text_of(v: &Value, field: &str) -> String {
    v[field].as_str().unwrap_or_default().to_lowercase()
}

fn matches_text(v: &Value, field: &str, wanted: Option<&str>) -> bool {
    wanted.is_none_or(|w| v[field].as_str() == Some(w))
}

fn matches_number(v: &Value, field: &str, wanted: Option<&str>) -> bool {
    wanted.is_none_or(|w| v[field].as_u64().map(|n| n.to_string()).as_deref() == Some(w))
}

fn ok(body: Value) -> HttpResponse {
    HttpResponse::new(200, body.to_string())
}

fn created(body: Value) -> HttpResponse {
    HttpResponse::new(201, body.to_string())
}

fn no_content() -> HttpResponse {
    HttpResponse::new(204, "")
}

fn not_found() -> HttpResponse {
    error(404, json!({"detail": "Nie znaleziono."}))
}

fn error(status: u16, body: Value) -> HttpResponse {
    HttpResponse::new(status, body.to_string())
}

// ---------------------------------------------------------------------------
// Surface
// ---------------------------------------------------------------------------

/// Answers confirmations from a script and records everything shown.
/// An exhausted script answers no.
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    answers: VecDeque<bool>,
    pub prompts: Vec<String>,
    pub alerts: Vec<String>,
}

impl ScriptedSurface {
    pub fn answering(answers: &[bool]) -> Self {
        ScriptedSurface {
            answers: answers.iter().copied().collect(),
            ..Self::default()
        }
    }
}

impl Surface for ScriptedSurface {
    fn confirm(&mut self, message: &str) -> bool {
        self.prompts.push(message.to_string());
        self.answers.pop_front().unwrap_or(false)
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
}
