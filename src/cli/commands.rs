use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wk", about = concat!("workly v", env!("CARGO_PKG_VERSION"), " - projects, tasks and their dependencies from the terminal"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Log API traffic to stderr
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List, show and manage projects
    Projects(ProjectsCmd),
    /// List, show and manage tasks
    Tasks(TasksCmd),
    /// Show and edit the dependencies of a task
    Deps(DepsCmd),
    /// List users (for owner and assignee ids)
    Users,
    /// Show your dashboard summary
    Summary(SummaryArgs),
    /// Show or change client configuration
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ProjectsCmd {
    #[command(subcommand)]
    pub action: Option<ProjectsAction>,
}

#[derive(Subcommand)]
pub enum ProjectsAction {
    /// List projects (default)
    List(ProjectListArgs),
    /// Show project details
    Show(IdArg),
    /// Create a project
    Create(ProjectFormArgs),
    /// Edit a project (only the given fields change)
    Edit(ProjectEditArgs),
    /// Delete a project that has no tasks
    Delete(IdArg),
    /// Show a project's tasks and dependency links as a timeline
    Gantt(IdArg),
}

#[derive(Args, Default)]
pub struct ProjectListArgs {
    /// Filter by status (planned, active, on_hold, done, archived)
    #[arg(long)]
    pub status: Option<String>,
    /// Filter by priority (1-4)
    #[arg(long)]
    pub priority: Option<String>,
    /// Search name and description
    #[arg(long, short = 's')]
    pub search: Option<String>,
    /// Only projects you own
    #[arg(long)]
    pub mine: bool,
    /// Page number
    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Args)]
pub struct IdArg {
    pub id: u64,
}

#[derive(Args)]
pub struct ProjectFormArgs {
    /// Project name
    pub name: String,
    #[arg(long, short = 'd')]
    pub description: Option<String>,
    /// planned, active, on_hold, done, archived
    #[arg(long)]
    pub status: Option<String>,
    /// 1 (low) to 4 (critical)
    #[arg(long)]
    pub priority: Option<String>,
    /// Owner user id
    #[arg(long)]
    pub owner: Option<String>,
    /// Start date YYYY-MM-DD (default: today)
    #[arg(long)]
    pub start: Option<String>,
    /// End date YYYY-MM-DD
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Args)]
pub struct ProjectEditArgs {
    pub id: u64,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, short = 'd')]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
    /// Owner user id (empty to clear)
    #[arg(long)]
    pub owner: Option<String>,
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TasksCmd {
    #[command(subcommand)]
    pub action: Option<TasksAction>,
}

#[derive(Subcommand)]
pub enum TasksAction {
    /// List tasks (default)
    List(TaskListArgs),
    /// Show task details
    Show(IdArg),
    /// Create a task
    Create(TaskFormArgs),
    /// Edit a task (only the given fields change)
    Edit(TaskEditArgs),
    /// Delete a task
    Delete(IdArg),
    /// Copy a task, titled "Kopia: <title>" unless --title is given
    Copy(TaskCopyArgs),
    /// List the tasks that can be chosen as a parent in a project
    Parents(ParentsArgs),
}

#[derive(Args, Default)]
pub struct TaskListArgs {
    /// Filter by status (todo, in_progress, review, done, blocked)
    #[arg(long)]
    pub status: Option<String>,
    /// Search title and description
    #[arg(long, short = 's')]
    pub search: Option<String>,
    /// Only tasks assigned to you
    #[arg(long)]
    pub mine: bool,
    /// Only tasks of this project
    #[arg(long, short = 'p')]
    pub project: Option<u64>,
    /// Page number
    #[arg(long, default_value_t = 1)]
    pub page: u32,
}

#[derive(Args)]
pub struct TaskFormArgs {
    /// Task title
    pub title: String,
    /// Project id
    #[arg(long, short = 'p')]
    pub project: Option<String>,
    #[arg(long, short = 'd')]
    pub description: Option<String>,
    /// Parent task id (must be a root task of the same project)
    #[arg(long)]
    pub parent: Option<String>,
    /// Assignee user id
    #[arg(long)]
    pub assignee: Option<String>,
    /// todo, in_progress, review, done, blocked
    #[arg(long)]
    pub status: Option<String>,
    /// Percent complete, 0-100
    #[arg(long)]
    pub progress: Option<String>,
    /// Start date YYYY-MM-DD
    #[arg(long)]
    pub start: Option<String>,
    /// End date YYYY-MM-DD
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Args)]
pub struct TaskEditArgs {
    pub id: u64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, short = 'd')]
    pub description: Option<String>,
    /// Parent task id (empty to clear)
    #[arg(long)]
    pub parent: Option<String>,
    /// Assignee user id (empty to clear)
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub progress: Option<String>,
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Args)]
pub struct TaskCopyArgs {
    pub id: u64,
    /// Copy the subtasks too
    #[arg(long)]
    pub children: bool,
    /// Put the copy in this project instead
    #[arg(long, short = 'p')]
    pub project: Option<u64>,
    /// Parent task id for the copy (a root task of the target project)
    #[arg(long)]
    pub parent: Option<u64>,
    /// Title of the copy
    #[arg(long)]
    pub title: Option<String>,
}

#[derive(Args)]
pub struct ParentsArgs {
    /// Project id
    pub project: u64,
    /// Leave out this task (the one being edited)
    #[arg(long)]
    pub exclude: Option<u64>,
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct DepsCmd {
    #[command(subcommand)]
    pub action: DepsAction,
}

#[derive(Subcommand)]
pub enum DepsAction {
    /// List the predecessors of a task, and the tasks that could be added
    List(DepsTaskArg),
    /// Make a task depend on another: add <TASK> <PREDECESSOR>
    Add(DepAddArgs),
    /// Change the type or lag of a dependency
    Edit(DepEditArgs),
    /// Remove a dependency by its id
    Rm(DepRmArgs),
}

#[derive(Args)]
pub struct DepsTaskArg {
    /// Successor task id
    pub task: u64,
}

#[derive(Args)]
pub struct DepAddArgs {
    /// Successor task id
    pub task: u64,
    /// Predecessor task id
    pub predecessor: u64,
    /// FS, SS, FF or SF
    #[arg(long = "type", short = 't', default_value = "FS")]
    pub kind: String,
    /// Lag in days (may be negative; blank means 0)
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub lag: String,
}

#[derive(Args)]
pub struct DepEditArgs {
    /// Successor task id
    pub task: u64,
    /// Dependency id
    pub dependency: u64,
    #[arg(long = "type", short = 't')]
    pub kind: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub lag: Option<String>,
}

#[derive(Args)]
pub struct DepRmArgs {
    /// Successor task id
    pub task: u64,
    /// Dependency id
    pub dependency: u64,
}

// ---------------------------------------------------------------------------
// Dashboard and config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SummaryArgs {
    /// Also list the projects you own
    #[arg(long)]
    pub projects: bool,
    /// Also list your assigned tasks
    #[arg(long)]
    pub tasks: bool,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Set a key, e.g. `wk config set user.id 7`
    Set(ConfigSetArgs),
    /// Print the path of the config file
    Path,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// api.base_url, api.cookie, api.timeout_secs, user.id, ui.search_debounce_ms, ui.json
    pub key: String,
    pub value: String,
}
