//! Zone-scoped, bearer-authenticated calls to the views API.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{RequestError, StatusCode};
use crate::http::{HttpRequest, Method, RequestBody, Transport};

pub const ZONE_HEADER: &str = "Predix-Zone-Id";

/// Zone id, base url and the token issued for that zone.
///
/// Built after authentication and never mutated, so concurrent calls within
/// a stage share it by reference.
#[derive(Clone, PartialEq, Eq)]
pub struct ZoneContext {
    zone_id: String,
    base_url: String,
    token: String,
}

impl ZoneContext {
    pub fn new(
        zone_id: impl Into<String>,
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for ZoneContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneContext")
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: Value,
    pub headers: Vec<(String, String)>,
}

#[derive(Clone)]
pub struct AuthenticatedClient {
    transport: Arc<dyn Transport>,
}

impl AuthenticatedClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Issue one zone-scoped request. Any non-2xx status is an error.
    pub async fn call(
        &self,
        url: &str,
        zone: &ZoneContext,
        method: Method,
        body: Option<&Value>,
    ) -> Result<ApiResponse, RequestError> {
        let mut request = HttpRequest::new(method, url)
            .with_header(ZONE_HEADER, zone.zone_id())
            .with_header("Authorization", format!("Bearer {}", zone.token()));
        if let Some(body) = body {
            request = request.with_body(RequestBody::Json(body.clone()));
        }

        let request_body = body.map(Value::to_string).unwrap_or_default();

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(%method, url, zone = zone.zone_id(), error = %e, "views request failed");
                return Err(RequestError {
                    url: url.to_string(),
                    method: method.to_string(),
                    zone_id: zone.zone_id().to_string(),
                    request_body,
                    status: StatusCode::Unknown,
                    response_body: String::new(),
                    transport: Some(e),
                });
            }
        };

        tracing::debug!(%method, url, zone = zone.zone_id(), status = response.status, "views request");

        if !response.is_success() {
            return Err(RequestError {
                url: url.to_string(),
                method: method.to_string(),
                zone_id: zone.zone_id().to_string(),
                request_body,
                status: StatusCode::Known(response.status),
                response_body: response.body,
                transport: None,
            });
        }

        Ok(ApiResponse {
            body: decode_body(&response.body),
            headers: response.headers,
        })
    }

    pub async fn get(&self, url: &str, zone: &ZoneContext) -> Result<ApiResponse, RequestError> {
        self.call(url, zone, Method::Get, None).await
    }

    pub async fn post(
        &self,
        url: &str,
        zone: &ZoneContext,
        body: &Value,
    ) -> Result<ApiResponse, RequestError> {
        self.call(url, zone, Method::Post, Some(body)).await
    }

    pub async fn delete(&self, url: &str, zone: &ZoneContext) -> Result<ApiResponse, RequestError> {
        self.call(url, zone, Method::Delete, None).await
    }
}

/// Decode a response body: empty becomes `Null`, JSON is parsed, anything
/// else is kept verbatim as a JSON string.
fn decode_body(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
