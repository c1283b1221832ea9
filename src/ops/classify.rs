//! Mapping backend rejections onto the domain rules they violate.
//!
//! A structured `code` in the error body wins when present. Otherwise the
//! message text is matched against known phrases (English and Polish, the
//! two locales the backend ships); anything unrecognized is passed through.

use crate::api::ApiError;

/// Message shown when a project delete is refused because tasks remain
pub const PROTECTED_DELETE_MESSAGE: &str = "cannot delete: has attached tasks";

/// Why the server refused a dependency insert or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyRejection {
    /// The edge would close a cycle in the project's task graph
    Cycle,
    /// Predecessor and successor belong to different projects
    CrossProject,
    /// Predecessor and successor are the same task
    SelfReference,
    /// Anything else, with the server's raw message
    Other(String),
}

const CYCLE_CODES: &[&str] = &["dependency_cycle", "cycle"];
const CROSS_PROJECT_CODES: &[&str] = &["cross_project", "different_projects"];
const SELF_REFERENCE_CODES: &[&str] = &["self_dependency", "self_reference"];

const CYCLE_PHRASES: &[&str] = &["cycle", "circular", "cykl"];
const SELF_REFERENCE_PHRASES: &[&str] = &["itself", "self-reference", "self reference", "samego siebie"];
const CROSS_PROJECT_PHRASES: &[&str] = &["project", "projekt"];

impl DependencyRejection {
    pub fn classify(err: &ApiError) -> Self {
        Self::from_parts(err.code(), &err.to_string())
    }

    pub fn from_parts(code: Option<&str>, message: &str) -> Self {
        if let Some(code) = code {
            let code = code.to_ascii_lowercase();
            if CYCLE_CODES.contains(&code.as_str()) {
                return DependencyRejection::Cycle;
            }
            if CROSS_PROJECT_CODES.contains(&code.as_str()) {
                return DependencyRejection::CrossProject;
            }
            if SELF_REFERENCE_CODES.contains(&code.as_str()) {
                return DependencyRejection::SelfReference;
            }
        }

        // Cross-project phrases are the most generic, so they go last
        let lower = message.to_lowercase();
        if contains_any(&lower, CYCLE_PHRASES) {
            DependencyRejection::Cycle
        } else if contains_any(&lower, SELF_REFERENCE_PHRASES) {
            DependencyRejection::SelfReference
        } else if contains_any(&lower, CROSS_PROJECT_PHRASES) {
            DependencyRejection::CrossProject
        } else {
            DependencyRejection::Other(message.to_string())
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            DependencyRejection::Cycle => {
                "cannot add dependency: it would create a cycle between tasks".to_string()
            }
            DependencyRejection::CrossProject => {
                "cannot add dependency: both tasks must belong to the same project".to_string()
            }
            DependencyRejection::SelfReference => {
                "cannot add dependency: a task cannot depend on itself".to_string()
            }
            DependencyRejection::Other(raw) => raw.clone(),
        }
    }
}

impl std::fmt::Display for DependencyRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user_message())
    }
}

/// True when a failed project delete means "the project still owns tasks"
pub fn is_protected_delete(err: &ApiError) -> bool {
    if err.code() == Some("protected") || err.status() == Some(409) {
        return true;
    }
    // Auth and not-found messages keep their own meaning
    match err.status() {
        Some(status) if (400..500).contains(&status) && ![401, 403, 404].contains(&status) => {
            let lower = err.to_string().to_lowercase();
            lower.contains("task") || lower.contains("zadani")
        }
        _ => false,
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
