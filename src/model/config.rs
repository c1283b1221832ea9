use serde::{Deserialize, Serialize};

/// Configuration from `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root; request paths are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Raw `Cookie` header of an authenticated session
    /// (e.g. `sessionid=...; csrftoken=...`). The CSRF token is read from it.
    #[serde(default)]
    pub cookie: Option<String>,
    /// Request timeout in seconds. Absent = wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            cookie: None,
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

/// The signed-in user, used by the "mine" filters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Quiet period before a typed search is committed
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    /// Emit JSON instead of text by default
    #[serde(default)]
    pub json: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            search_debounce_ms: default_search_debounce_ms(),
            json: false,
        }
    }
}

fn default_search_debounce_ms() -> u64 {
    500
}
