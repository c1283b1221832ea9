pub mod client;
pub mod cookie;
pub mod error;
pub mod resources;
pub mod transport;

pub use client::{ApiClient, Page, RequestOptions};
pub use error::ApiError;
pub use resources::{ProjectQuery, TaskQuery};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};
