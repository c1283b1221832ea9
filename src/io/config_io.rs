use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::ClientConfig;

/// Name of the directory under the user's config dir
const APP_DIR: &str = "workly";
const CONFIG_FILE: &str = "config.toml";

/// Keys accepted by `wk config set`, with the kind of value each takes
const KNOWN_KEYS: &[(&str, ValueKind)] = &[
    ("api.base_url", ValueKind::Text),
    ("api.cookie", ValueKind::Text),
    ("api.timeout_secs", ValueKind::Integer),
    ("user.id", ValueKind::Integer),
    ("ui.search_debounce_ms", ValueKind::Integer),
    ("ui.json", ValueKind::Bool),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Text,
    Integer,
    Bool,
}

/// Error type for config file operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config in {path}: {source}")]
    DocumentError {
        path: PathBuf,
        source: toml_edit::TomlError,
    },
    #[error("unknown config key '{0}' (known: api.base_url, api.cookie, api.timeout_secs, user.id, ui.search_debounce_ms, ui.json)")]
    UnknownKey(String),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("cannot locate a config directory (set XDG_CONFIG_HOME or HOME)")]
    NoConfigDir,
}

/// Default config file location: `$XDG_CONFIG_HOME/workly/config.toml`,
/// falling back to `~/.config/workly/config.toml`.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    config_path_with(|name| std::env::var(name).ok())
}

pub fn config_path_with(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf, ConfigError> {
    let base = match lookup("XDG_CONFIG_HOME").filter(|s| !s.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => {
            let home = lookup("HOME")
                .filter(|s| !s.is_empty())
                .ok_or(ConfigError::NoConfigDir)?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(base.join(APP_DIR).join(CONFIG_FILE))
}

/// Read the config file. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ClientConfig::default()),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    toml::from_str(&text).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `WORKLY_API_URL`, `WORKLY_COOKIE` and `WORKLY_USER_ID` on top of
/// the file config.
pub fn apply_env_overrides(
    config: &mut ClientConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(url) = lookup("WORKLY_API_URL").filter(|s| !s.is_empty()) {
        config.api.base_url = url;
    }
    if let Some(cookie) = lookup("WORKLY_COOKIE").filter(|s| !s.is_empty()) {
        config.api.cookie = Some(cookie);
    }
    if let Some(id) = lookup("WORKLY_USER_ID").filter(|s| !s.is_empty()) {
        let id = id.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: "WORKLY_USER_ID".to_string(),
            message: format!("'{}' is not a user id", id),
        })?;
        config.user.id = Some(id);
    }
    Ok(())
}

/// Set one `section.key` in the config file, preserving the rest of the
/// file's formatting. The file and its directory are created if needed.
pub fn set_config_value(path: &Path, key: &str, value: &str) -> Result<(), ConfigError> {
    let kind = KNOWN_KEYS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
    let (section, field) = key.split_once('.').ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    let mut doc: toml_edit::DocumentMut = text.parse().map_err(|source| ConfigError::DocumentError {
        path: path.to_path_buf(),
        source,
    })?;

    if !doc.contains_key(section) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc[section][field] = parse_value(key, kind, value)?;

    // Refuse to write something the loader would then reject
    let rendered = doc.to_string();
    toml::from_str::<ClientConfig>(&rendered).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::WriteError {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, rendered).map_err(|source| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_value(key: &str, kind: ValueKind, raw: &str) -> Result<toml_edit::Item, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };
    let raw = raw.trim();
    match kind {
        ValueKind::Text => Ok(toml_edit::value(raw)),
        ValueKind::Integer => raw
            .parse::<u64>()
            .ok()
            .and_then(|n| i64::try_from(n).ok())
            .map(toml_edit::value)
            .ok_or_else(|| invalid(format!("'{}' is not a non-negative integer", raw))),
        ValueKind::Bool => match raw {
            "true" | "yes" | "on" => Ok(toml_edit::value(true)),
            "false" | "no" | "off" => Ok(toml_edit::value(false)),
            _ => Err(invalid(format!("'{}' is not true or false", raw))),
        },
    }
}
