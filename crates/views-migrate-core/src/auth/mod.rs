//! Client-credentials token exchange against a UAA endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AuthenticationError, StatusCode};
use crate::http::{HttpRequest, Method, RequestBody, Transport};

const TOKEN_PATH: &str = "/oauth/token";
const GRANT_BODY: &str = "grant_type=client_credentials&response_type=token";

/// Credentials for one zone's UAA.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Pre-encoded `base64(client_id:client_secret)`.
    Encoded(String),
    Client { id: String, secret: String },
}

impl Credentials {
    /// Value placed after `Basic ` in the Authorization header.
    pub fn basic_value(&self) -> String {
        match self {
            Credentials::Encoded(encoded) => encoded.clone(),
            Credentials::Client { id, secret } => STANDARD.encode(format!("{id}:{secret}")),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Credentials::Encoded(encoded) => encoded.trim().is_empty(),
            Credentials::Client { id, secret } => id.is_empty() || secret.is_empty(),
        }
    }
}

// Secrets never reach the logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Encoded(_) => f.write_str("Credentials::Encoded(***)"),
            Credentials::Client { id, .. } => write!(f, "Credentials::Client {{ id: {id}, secret: *** }}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default)]
    pub token_type: Option<String>,

    #[serde(default)]
    pub expires_in: Option<u64>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Exchanges zone credentials for a bearer token. No retry.
#[derive(Clone)]
pub struct TokenProvider {
    transport: Arc<dyn Transport>,
}

impl TokenProvider {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn request_token(
        &self,
        uaa_url: &str,
        credentials: &Credentials,
    ) -> Result<TokenResponse, AuthenticationError> {
        let url = token_url(uaa_url);
        let request = HttpRequest::new(Method::Post, url.clone())
            .with_header("Authorization", format!("Basic {}", credentials.basic_value()))
            .with_body(RequestBody::Form(GRANT_BODY.to_string()));

        tracing::debug!(url = %url, "requesting client-credentials token");

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| AuthenticationError {
                url: url.clone(),
                status: StatusCode::Unknown,
                reason: e.message,
            })?;

        if response.status != 200 {
            return Err(AuthenticationError {
                url,
                status: StatusCode::Known(response.status),
                reason: response.body,
            });
        }

        serde_json::from_str::<TokenResponse>(&response.body).map_err(|e| AuthenticationError {
            url,
            status: StatusCode::Known(response.status),
            reason: format!("token response did not carry an access_token: {e}"),
        })
    }
}

fn token_url(uaa_url: &str) -> String {
    format!("{}{}", uaa_url.trim_end_matches('/'), TOKEN_PATH)
}
