use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::cookie::{CSRF_COOKIE, cookie_value};
use super::error::ApiError;
use super::transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
use crate::model::config::ClientConfig;

/// Upper bound on pages followed by [`ApiClient::list_all`]
const MAX_PAGES: u32 = 100;

/// Per-request settings layered over the client defaults
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Extra headers; these override the defaults by name
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        RequestOptions {
            method: Method::Post,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn patch(body: Value) -> Self {
        RequestOptions {
            method: Method::Patch,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn delete() -> Self {
        RequestOptions {
            method: Method::Delete,
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// One page of a list endpoint.
///
/// List endpoints answer either with a bare array or with a paginated
/// `{count, next, previous, results}` envelope; both decode to this.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total number of matching items, when the server paginates
    pub count: Option<u64>,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn single(items: Vec<T>) -> Self {
        Page {
            items,
            count: None,
            has_next: false,
            has_previous: false,
        }
    }
}

impl<T: DeserializeOwned> Page<T> {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(_) => Ok(Page::single(serde_json::from_value(value)?)),
            Value::Object(mut map) => {
                let results = map.remove("results").ok_or_else(|| {
                    <serde_json::Error as serde::de::Error>::custom(
                        "expected a list or an object with `results`",
                    )
                })?;
                Ok(Page {
                    items: serde_json::from_value(results)?,
                    count: map.get("count").and_then(Value::as_u64),
                    has_next: map.get("next").is_some_and(|v| !v.is_null()),
                    has_previous: map.get("previous").is_some_and(|v| !v.is_null()),
                })
            }
            _ => Err(<serde_json::Error as serde::de::Error>::custom(
                "expected a list or an object with `results`",
            )),
        }
    }
}

/// Client for the backend REST API.
///
/// Every request carries the session cookie, the CSRF token taken from it
/// and cache-defeating headers. A `304 Not Modified` is retried once with
/// stronger directives; no other retry is attempted.
pub struct ApiClient {
    base_url: String,
    cookie: Option<String>,
    csrf_token: Option<String>,
    transport: Box<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_cookie", &self.cookie.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, cookie: Option<String>, transport: Box<dyn Transport>) -> Self {
        let csrf_token = cookie
            .as_deref()
            .and_then(|c| cookie_value(c, CSRF_COOKIE));
        ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie,
            csrf_token,
            transport,
        }
    }

    /// Build a client talking HTTP to the configured backend
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.api.timeout_secs.map(Duration::from_secs))?;
        Ok(ApiClient::new(
            &config.api.base_url,
            config.api.cookie.clone(),
            Box::new(transport),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and return the parsed JSON body (`{}` when empty).
    pub fn request(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let body = options.body.as_ref().map(Value::to_string);
        let mut request = HttpRequest {
            method: options.method,
            url: format!("{}{}", self.base_url, path),
            query: options.query.clone(),
            headers: merge_headers(self.default_headers(), &options.headers),
            body,
        };

        debug!(method = request.method.as_str(), path, "api request");
        let mut response = self.transport.send(&request)?;

        if response.status == 304 {
            warn!(path, "304 Not Modified, retrying with no-store");
            request.headers = merge_headers(
                request.headers,
                &[
                    header("Cache-Control", "no-cache, no-store, must-revalidate"),
                    header("Pragma", "no-cache"),
                    header("Expires", "0"),
                ],
            );
            response = self.transport.send(&request)?;
        }

        debug!(path, status = response.status, "api response");
        parse_response(path, &response)
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        let value = self.request(path, RequestOptions::get().with_query(query))?;
        decode(path, value)
    }

    pub fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let value = self.request(path, RequestOptions::post(encode(path, body)?))?;
        decode(path, value)
    }

    pub fn patch<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let value = self.request(path, RequestOptions::patch(encode(path, body)?))?;
        decode(path, value)
    }

    pub fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.request(path, RequestOptions::delete()).map(|_| ())
    }

    /// Fetch one page of a list endpoint
    pub fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Page<T>, ApiError> {
        let value = self.request(path, RequestOptions::get().with_query(query))?;
        Page::from_value(value).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }

    /// Fetch every page of a list endpoint, following `next`
    pub fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut page_no = 1;
        loop {
            let mut q = query.clone();
            if page_no > 1 {
                q.push(("page".to_string(), page_no.to_string()));
            }
            let page: Page<T> = self.list(path, q)?;
            items.extend(page.items);
            if !page.has_next {
                return Ok(items);
            }
            if page_no >= MAX_PAGES {
                warn!(path, pages = MAX_PAGES, fetched = items.len(), "page limit reached, list is truncated");
                return Ok(items);
            }
            page_no += 1;
        }
    }

    fn default_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![
            header("Content-Type", "application/json"),
            header("Cache-Control", "no-cache"),
            header("Pragma", "no-cache"),
        ];
        if let Some(token) = &self.csrf_token {
            headers.push(header("X-CSRFToken", token));
        }
        if let Some(cookie) = &self.cookie {
            headers.push(header("Cookie", cookie));
        }
        headers
    }
}

fn header(name: &str, value: &str) -> (String, String) {
    (name.to_string(), value.to_string())
}

/// Apply `overrides` on top of `base`, replacing same-named headers.
fn merge_headers(mut base: Vec<(String, String)>, overrides: &[(String, String)]) -> Vec<(String, String)> {
    for (name, value) in overrides {
        match base.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.1 = value.clone(),
            None => base.push((name.clone(), value.clone())),
        }
    }
    base
}

fn parse_response(path: &str, response: &HttpResponse) -> Result<Value, ApiError> {
    if !response.is_success() {
        return Err(ApiError::from_response(response));
    }
    if response.body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(&response.body).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}

fn encode<B: Serialize>(path: &str, body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|source| ApiError::Encode {
        path: path.to_string(),
        source,
    })
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}
