mod config;
pub use config::cmd_config;

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tracing::warn;

use crate::api::{ApiClient, TaskQuery};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::model::{
    ClientConfig, DependencyKind, DependencyPatch, LabelCache, Priority, ProjectStatus, Task,
    TaskCopy, TaskStatus, coerce_lag_days,
};
use crate::ops::dep_editor::{DependencyEditor, EdgeInput, EditorError, RemoveOutcome};
use crate::ops::directory::DeleteOutcome;
use crate::ops::forms::{ProjectForm, TaskForm};
use crate::ops::project_dir::{ProjectDirectory, ProjectFilter};
use crate::ops::surface::Surface;
use crate::ops::task_dir::{TaskDirectory, TaskFilter, parent_candidates};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs once config has been resolved
struct Context {
    config: ClientConfig,
    client: ApiClient,
    json: bool,
    yes: bool,
}

impl Context {
    fn debounce(&self) -> Duration {
        Duration::from_millis(self.config.ui.search_debounce_ms)
    }

    fn current_user(&self) -> Option<u64> {
        self.config.user.id
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let config_path = match &cli.config {
        Some(path) => PathBuf::from(path),
        None => config_io::config_path()?,
    };

    // Config commands work without a reachable backend
    let command = match cli.command {
        Commands::Config(cmd) => return cmd_config(cmd, &config_path, cli.json),
        other => other,
    };

    let mut config = config_io::load_config(&config_path)?;
    config_io::apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    let client = ApiClient::from_config(&config)?;
    let ctx = Context {
        json: cli.json || config.ui.json,
        yes: cli.yes,
        config,
        client,
    };

    match command {
        Commands::Projects(cmd) => match cmd.action.unwrap_or(ProjectsAction::List(ProjectListArgs::default())) {
            ProjectsAction::List(args) => cmd_projects_list(&ctx, args),
            ProjectsAction::Show(args) => cmd_projects_show(&ctx, args.id),
            ProjectsAction::Create(args) => cmd_projects_create(&ctx, args),
            ProjectsAction::Edit(args) => cmd_projects_edit(&ctx, args),
            ProjectsAction::Delete(args) => cmd_projects_delete(&ctx, args.id),
            ProjectsAction::Gantt(args) => cmd_projects_gantt(&ctx, args.id),
        },
        Commands::Tasks(cmd) => match cmd.action.unwrap_or(TasksAction::List(TaskListArgs::default())) {
            TasksAction::List(args) => cmd_tasks_list(&ctx, args),
            TasksAction::Show(args) => cmd_tasks_show(&ctx, args.id),
            TasksAction::Create(args) => cmd_tasks_create(&ctx, args),
            TasksAction::Edit(args) => cmd_tasks_edit(&ctx, args),
            TasksAction::Delete(args) => cmd_tasks_delete(&ctx, args.id),
            TasksAction::Copy(args) => cmd_tasks_copy(&ctx, args),
            TasksAction::Parents(args) => cmd_tasks_parents(&ctx, args),
        },
        Commands::Deps(cmd) => match cmd.action {
            DepsAction::List(args) => cmd_deps_list(&ctx, args.task),
            DepsAction::Add(args) => cmd_deps_add(&ctx, args),
            DepsAction::Edit(args) => cmd_deps_edit(&ctx, args),
            DepsAction::Rm(args) => cmd_deps_rm(&ctx, args),
        },
        Commands::Users => cmd_users(&ctx),
        Commands::Summary(args) => cmd_summary(&ctx, args),
        Commands::Config(_) => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `[y/n]` prompt on stderr; `--yes` skips it
struct TerminalSurface {
    yes: bool,
}

impl Surface for TerminalSurface {
    fn confirm(&mut self, message: &str) -> bool {
        if self.yes {
            return true;
        }
        eprint!("{} [y/n] ", message);
        let mut input = String::new();
        match std::io::stdin().lock().read_line(&mut input) {
            Ok(_) => input.trim().eq_ignore_ascii_case("y"),
            Err(_) => false,
        }
    }

    fn alert(&mut self, message: &str) {
        eprintln!("! {}", message);
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn parse_project_status(s: &str) -> Result<ProjectStatus, String> {
    s.parse()
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    let n: u8 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid priority '{}' (expected 1-4)", s))?;
    Priority::try_from(n)
}

/// Usernames for owner/assignee display. Missing names only cost labels.
fn user_labels(client: &ApiClient) -> LabelCache {
    let mut labels = LabelCache::new();
    match client.list_users() {
        Ok(users) => labels.replace(users.into_iter().map(|u| (u.id, u.username))),
        Err(e) => warn!(error = %e, "could not load users"),
    }
    labels
}

/// Refuse a parent that the edit form would not have offered
fn check_parent(candidates: &[Task], parent: Option<u64>) -> Result<(), String> {
    match parent {
        Some(id) if !candidates.iter().any(|t| t.id == id) => Err(format!(
            "task #{} cannot be a parent here (choose a task without a parent in the same project; see `wk tasks parents`)",
            id
        )),
        _ => Ok(()),
    }
}

fn apply<T: Clone>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

fn cmd_projects_list(ctx: &Context, args: ProjectListArgs) -> CmdResult {
    let mut dir = ProjectDirectory::with_debounce(ctx.current_user(), ctx.debounce());
    dir.set_filter(ProjectFilter {
        status: args.status.as_deref().map(parse_project_status).transpose()?,
        priority: args.priority.as_deref().map(parse_priority).transpose()?,
        mine: args.mine,
    });
    if args.mine && ctx.current_user().is_none() {
        warn!("--mine needs user.id in the config; showing all projects");
    }
    dir.set_search(args.search.as_deref().unwrap_or(""));
    dir.set_page(args.page);
    dir.refresh(&ctx.client)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&page_to_json(dir.view()))?);
        return Ok(());
    }
    if dir.view().items().is_empty() {
        println!("no projects");
        return Ok(());
    }
    let owners = user_labels(&ctx.client);
    for project in dir.view().items() {
        println!("{}", format_project_line(project, &owners));
    }
    if let Some(footer) = format_page_footer(dir.view()) {
        println!("{}", footer);
    }
    Ok(())
}

fn cmd_projects_show(ctx: &Context, id: u64) -> CmdResult {
    let project = ctx.client.get_project(id)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&project)?);
    } else {
        print_lines(&format_project_detail(&project, &user_labels(&ctx.client)));
    }
    Ok(())
}

fn cmd_projects_create(ctx: &Context, args: ProjectFormArgs) -> CmdResult {
    let form = ProjectForm {
        name: args.name,
        description: args.description.unwrap_or_default(),
        status: args.status.unwrap_or_default(),
        priority: args.priority.unwrap_or_default(),
        owner: args.owner.unwrap_or_default(),
        start_date: args
            .start
            .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string()),
        end_date: args.end.unwrap_or_default(),
    };
    let mut dir = ProjectDirectory::new(ctx.current_user());
    let project = dir.create(&ctx.client, &form)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&project)?);
    } else {
        println!("created project #{} {}", project.id, project.name);
    }
    Ok(())
}

fn cmd_projects_edit(ctx: &Context, args: ProjectEditArgs) -> CmdResult {
    let project = ctx.client.get_project(args.id)?;
    let mut form = ProjectForm::from_project(&project);
    apply(&mut form.name, args.name);
    apply(&mut form.description, args.description);
    apply(&mut form.status, args.status);
    apply(&mut form.priority, args.priority);
    apply(&mut form.owner, args.owner);
    apply(&mut form.start_date, args.start);
    apply(&mut form.end_date, args.end);

    let mut dir = ProjectDirectory::new(ctx.current_user());
    let project = dir.update(&ctx.client, args.id, &form)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&project)?);
    } else {
        println!("updated project #{} {}", project.id, project.name);
    }
    Ok(())
}

fn cmd_projects_delete(ctx: &Context, id: u64) -> CmdResult {
    let mut dir = ProjectDirectory::new(ctx.current_user());
    let mut surface = TerminalSurface { yes: ctx.yes };
    match dir.delete(&ctx.client, id, &mut surface)? {
        DeleteOutcome::Deleted => println!("deleted project #{}", id),
        DeleteOutcome::Cancelled => println!("cancelled"),
    }
    Ok(())
}

fn cmd_projects_gantt(ctx: &Context, id: u64) -> CmdResult {
    let chart = ctx.client.project_gantt(id)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    } else if chart.data.is_empty() {
        println!("no tasks");
    } else {
        print_lines(&format_gantt(&chart));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

fn cmd_tasks_list(ctx: &Context, args: TaskListArgs) -> CmdResult {
    let mut dir = TaskDirectory::with_debounce(ctx.current_user(), ctx.debounce());
    dir.set_filter(TaskFilter {
        status: args
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?,
        project: args.project,
        mine: args.mine,
    });
    if args.mine && ctx.current_user().is_none() {
        warn!("--mine needs user.id in the config; showing all tasks");
    }
    dir.set_search(args.search.as_deref().unwrap_or(""));
    dir.set_page(args.page);
    if !ctx.json {
        dir.load_project_labels(&ctx.client);
    }
    dir.refresh(&ctx.client)?;

    if ctx.json {
        let page = page_to_json(dir.view());
        let items: Vec<TaskJson> = page
            .items
            .iter()
            .map(|task| TaskJson {
                task,
                project_name: task.project.label.clone(),
            })
            .collect();
        let out = PageJson {
            page: page.page,
            count: page.count,
            has_next: page.has_next,
            has_previous: page.has_previous,
            items,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if dir.view().items().is_empty() {
        println!("no tasks");
        return Ok(());
    }
    for task in dir.view().items() {
        println!("{}", format_task_line(task, &dir.project_label(&task.project)));
    }
    if let Some(footer) = format_page_footer(dir.view()) {
        println!("{}", footer);
    }
    Ok(())
}

fn cmd_tasks_show(ctx: &Context, id: u64) -> CmdResult {
    let task = ctx.client.get_task(id)?;
    if ctx.json {
        let out = TaskJson {
            task: &task,
            project_name: task.project.label.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut labels = TaskLabels {
        users: user_labels(&ctx.client),
        ..TaskLabels::default()
    };
    labels.projects.absorb(&task.project);
    match ctx.client.get_project(task.project.id) {
        Ok(project) => labels.projects.insert(project.id, project.name),
        Err(e) => warn!(error = %e, "could not load project"),
    }
    if let Some(parent) = &task.parent {
        match ctx.client.get_task(parent.id) {
            Ok(p) => labels.tasks.insert(p.id, p.title),
            Err(e) => warn!(error = %e, "could not load parent task"),
        }
    }
    print_lines(&format_task_detail(&task, &labels));
    Ok(())
}

fn cmd_tasks_create(ctx: &Context, args: TaskFormArgs) -> CmdResult {
    let form = TaskForm {
        title: args.title,
        description: args.description.unwrap_or_default(),
        project: args.project.unwrap_or_default(),
        parent: args.parent.unwrap_or_default(),
        assignee: args.assignee.unwrap_or_default(),
        status: args.status.unwrap_or_default(),
        progress: args.progress.unwrap_or_default(),
        start_date: args.start.unwrap_or_default(),
        end_date: args.end.unwrap_or_default(),
    };
    // Field errors are reported before anything is fetched
    let payload = form.validate()?;
    if payload.parent.is_some() {
        let candidates = parent_candidates(&ctx.client, payload.project, None)?;
        check_parent(&candidates, payload.parent)?;
    }

    let mut dir = TaskDirectory::new(ctx.current_user());
    let task = dir.create(&ctx.client, &form)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!("created task #{} {}", task.id, task.title);
    }
    Ok(())
}

fn cmd_tasks_edit(ctx: &Context, args: TaskEditArgs) -> CmdResult {
    let mut dir = TaskDirectory::new(ctx.current_user());
    let session = dir.load_for_edit(&ctx.client, args.id)?;
    let mut form = session.form;
    let parent_changed = args.parent.is_some();
    apply(&mut form.title, args.title);
    apply(&mut form.description, args.description);
    apply(&mut form.parent, args.parent);
    apply(&mut form.assignee, args.assignee);
    apply(&mut form.status, args.status);
    apply(&mut form.progress, args.progress);
    apply(&mut form.start_date, args.start);
    apply(&mut form.end_date, args.end);

    let payload = form.validate()?;
    if parent_changed {
        check_parent(&session.parent_candidates, payload.parent)?;
    }
    if let Some(assignee) = payload.assignee {
        if !session.users.iter().any(|u| u.id == assignee) {
            return Err(format!("no user with id {} (see `wk users`)", assignee).into());
        }
    }

    let task = dir.update(&ctx.client, args.id, &form)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!("updated task #{} {}", task.id, task.title);
    }
    Ok(())
}

fn cmd_tasks_delete(ctx: &Context, id: u64) -> CmdResult {
    let mut dir = TaskDirectory::new(ctx.current_user());
    let mut surface = TerminalSurface { yes: ctx.yes };
    match dir.delete(&ctx.client, id, &mut surface)? {
        DeleteOutcome::Deleted => println!("deleted task #{}", id),
        DeleteOutcome::Cancelled => println!("cancelled"),
    }
    Ok(())
}

fn cmd_tasks_copy(ctx: &Context, args: TaskCopyArgs) -> CmdResult {
    if args.parent.is_some() {
        let project = match args.project {
            Some(project) => project,
            None => ctx.client.get_task(args.id)?.project.id,
        };
        let candidates = parent_candidates(&ctx.client, project, None)?;
        check_parent(&candidates, args.parent)?;
    }

    let copy = TaskCopy {
        include_children: args.children,
        project: args.project,
        parent: args.parent,
        title: args.title,
    };
    let mut dir = TaskDirectory::new(ctx.current_user());
    let task = dir.copy(&ctx.client, args.id, &copy)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!("copied task #{} to #{} {}", args.id, task.id, task.title);
    }
    Ok(())
}

fn cmd_tasks_parents(ctx: &Context, args: ParentsArgs) -> CmdResult {
    let candidates = parent_candidates(&ctx.client, args.project, args.exclude)?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&candidates)?);
    } else if candidates.is_empty() {
        println!("no parent candidates");
    } else {
        for task in &candidates {
            println!("#{:<4} {}", task.id, task.title);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

fn print_dependency_view(ctx: &Context, editor: &DependencyEditor) -> CmdResult {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&dependency_view_to_json(editor))?);
    } else {
        print_lines(&format_dependency_view(editor));
    }
    Ok(())
}

fn cmd_deps_list(ctx: &Context, task: u64) -> CmdResult {
    let mut editor = DependencyEditor::new();
    editor.open(&ctx.client, task)?;
    print_dependency_view(ctx, &editor)
}

fn cmd_deps_add(ctx: &Context, args: DepAddArgs) -> CmdResult {
    let kind: DependencyKind = args.kind.parse()?;
    let mut editor = DependencyEditor::new();
    editor.open(&ctx.client, args.task)?;

    let result = editor.add(
        &ctx.client,
        &EdgeInput {
            predecessor: args.predecessor,
            kind,
            lag: args.lag,
        },
    );
    // The list is re-fetched either way; show what the server now holds
    if !matches!(result, Err(EditorError::Api(_))) {
        print_dependency_view(ctx, &editor)?;
    }
    result?;
    Ok(())
}

fn cmd_deps_edit(ctx: &Context, args: DepEditArgs) -> CmdResult {
    let patch = DependencyPatch {
        kind: args.kind.as_deref().map(str::parse::<DependencyKind>).transpose()?,
        lag_days: args.lag.as_deref().map(coerce_lag_days),
    };
    if patch.is_empty() {
        return Err("nothing to change (use --type and/or --lag)".into());
    }

    let mut editor = DependencyEditor::new();
    editor.open(&ctx.client, args.task)?;
    if !editor.rows().iter().any(|r| r.dependency.id == args.dependency) {
        return Err(format!(
            "dependency #{} does not belong to task #{} (see `wk deps list {}`)",
            args.dependency, args.task, args.task
        )
        .into());
    }

    let result = editor.update(&ctx.client, args.dependency, &patch);
    if !matches!(result, Err(EditorError::Api(_))) {
        print_dependency_view(ctx, &editor)?;
    }
    result?;
    Ok(())
}

fn cmd_deps_rm(ctx: &Context, args: DepRmArgs) -> CmdResult {
    let mut editor = DependencyEditor::new();
    editor.open(&ctx.client, args.task)?;
    if !editor.rows().iter().any(|r| r.dependency.id == args.dependency) {
        return Err(format!(
            "dependency #{} does not belong to task #{} (see `wk deps list {}`)",
            args.dependency, args.task, args.task
        )
        .into());
    }

    let mut surface = TerminalSurface { yes: ctx.yes };
    match editor.remove(&ctx.client, args.dependency, &mut surface)? {
        RemoveOutcome::Removed => {
            print_dependency_view(ctx, &editor)?;
            Ok(())
        }
        RemoveOutcome::Cancelled => {
            println!("cancelled");
            Ok(())
        }
        RemoveOutcome::Rejected(_) => {
            print_dependency_view(ctx, &editor)?;
            Err(format!("dependency #{} was not removed", args.dependency).into())
        }
    }
}

// ---------------------------------------------------------------------------
// Users and dashboard
// ---------------------------------------------------------------------------

fn cmd_users(ctx: &Context) -> CmdResult {
    let users = ctx.client.list_users()?;
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&users)?);
    } else {
        for user in &users {
            println!("{}", format_user_line(user));
        }
    }
    Ok(())
}

fn cmd_summary(ctx: &Context, args: SummaryArgs) -> CmdResult {
    let summary = ctx.client.summary()?;
    let projects = if args.projects {
        Some(ctx.client.my_projects()?)
    } else {
        None
    };
    let tasks = if args.tasks {
        Some(ctx.client.my_tasks(&TaskQuery::default())?)
    } else {
        None
    };

    if ctx.json {
        let out = serde_json::json!({
            "summary": summary,
            "projects": projects,
            "tasks": tasks.as_ref().map(|p| &p.items),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_lines(&format_summary(&summary));
    if let Some(projects) = projects {
        println!();
        println!("my projects:");
        let owners = LabelCache::new();
        for project in &projects {
            println!("  {}", format_project_line(project, &owners));
        }
    }
    if let Some(tasks) = tasks {
        println!();
        println!("my tasks:");
        let mut names = LabelCache::new();
        for task in &tasks.items {
            names.absorb(&task.project);
            println!("  {}", format_task_line(task, &names.display(&task.project)));
        }
    }
    Ok(())
}
