pub mod config;
pub mod dashboard;
pub mod dependency;
pub mod project;
pub mod reference;
pub mod task;
pub mod user;

pub use config::*;
pub use dashboard::*;
pub use dependency::*;
pub use project::*;
pub use reference::*;
pub use task::*;
pub use user::*;
