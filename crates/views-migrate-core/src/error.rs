//! Error taxonomy for a migration run.
//!
//! Nothing is recovered locally: every variant aborts the pipeline and is
//! reported by the binary.

use serde_json::Value;

use crate::http::TransportError;
use crate::resource::ResourceKind;

/// Status reported when no HTTP response was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Known(u16),
    Unknown,
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusCode::Known(code) => write!(f, "{code}"),
            StatusCode::Unknown => f.write_str("unknown"),
        }
    }
}

/// Token exchange against a UAA endpoint failed.
#[derive(Debug, thiserror::Error)]
#[error("authentication against {url} failed with status {status}: {reason}")]
pub struct AuthenticationError {
    pub url: String,
    pub status: StatusCode,
    pub reason: String,
}

/// A views-API call returned non-2xx or never got a response.
///
/// Every field is kept so a failed run can be diagnosed from the log alone.
#[derive(Debug, thiserror::Error)]
#[error(
    "{method} {url} (zone {zone_id}) failed with status {status}; request body: {request_body}; response body: {response_body}"
)]
pub struct RequestError {
    pub url: String,
    pub method: String,
    pub zone_id: String,
    pub request_body: String,
    pub status: StatusCode,
    pub response_body: String,
    #[source]
    pub transport: Option<TransportError>,
}

/// One or more fanned-out item actions failed.
#[derive(Debug, thiserror::Error)]
#[error("{operation}: {failed} of {total} item(s) failed; first failure: {first}")]
pub struct BulkError {
    pub operation: String,
    pub failed: usize,
    pub total: usize,
    #[source]
    pub first: Box<MigrateError>,
}

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Bulk(#[from] BulkError),

    #[error("unexpected response body from {url}: expected {expected}, got {body}")]
    UnexpectedBody {
        url: String,
        expected: &'static str,
        body: Value,
    },

    #[error("no destination counterpart among {kind} for origin id '{id}'")]
    MissingCounterpart { kind: ResourceKind, id: String },

    #[error("zone '{zone}' has no token; authenticate before calling the views API")]
    NotAuthenticated { zone: String },
}

pub type Result<T> = std::result::Result<T, MigrateError>;
