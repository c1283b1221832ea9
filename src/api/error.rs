use serde_json::Value;

use super::transport::{HttpResponse, TransportError};

/// Message used when an error response has no readable body
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Error type for API requests
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] TransportError),
    /// Non-2xx response. `message` is exactly the text the server supplied
    /// (or the fallback), so it can be shown as-is.
    #[error("{message}")]
    Http {
        status: u16,
        message: String,
        code: Option<String>,
    },
    #[error("could not encode request body for {path}: {source}")]
    Encode {
        path: String,
        source: serde_json::Error,
    },
    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Machine-readable error code, when the backend sent one
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Http { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn from_response(response: &HttpResponse) -> ApiError {
        let (message, code) = match serde_json::from_str::<Value>(&response.body) {
            Ok(body) => (
                extract_message(&body).unwrap_or_else(|| format!("HTTP {}", response.status)),
                extract_code(&body),
            ),
            Err(_) => (GENERIC_ERROR_MESSAGE.to_string(), None),
        };
        ApiError::Http {
            status: response.status,
            message,
            code,
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `detail` first, then the validation-error shapes the backend
/// produces: `non_field_errors`, `__all__`, and finally the first field's
/// first message. Bare string and list bodies are accepted too.
pub fn extract_message(body: &Value) -> Option<String> {
    match body {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        Value::Object(map) => {
            if let Some(detail) = map.get("detail").and_then(first_text) {
                return Some(detail);
            }
            for key in ["non_field_errors", "__all__"] {
                if let Some(msg) = map.get(key).and_then(first_text) {
                    return Some(msg);
                }
            }
            map.iter()
                .filter(|(k, _)| k.as_str() != "code")
                .find_map(|(_, v)| first_text(v))
        }
        _ => None,
    }
}

fn extract_code(body: &Value) -> Option<String> {
    body.get("code").and_then(Value::as_str).map(str::to_string)
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}
