use serde::{Deserialize, Serialize};

/// An entry of `/users/`, used for owner and assignee selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
}
