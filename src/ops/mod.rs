pub mod classify;
pub mod debounce;
pub mod dep_editor;
pub mod directory;
pub mod forms;
pub mod list_view;
pub mod project_dir;
pub mod surface;
pub mod task_dir;
