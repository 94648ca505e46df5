//! On-disk configuration schema for views-migrate.toml
//!
//! ```toml
//! clear_destination = false
//! associate_origin = true
//! max_concurrency = 0
//!
//! [origin]
//! views_url = "https://views-a.example.com"
//! zone_id = "zone-a"
//! uaa_url = "https://uaa-a.example.com"
//! uaa_credentials = "Y2xpZW50OnNlY3JldA=="
//!
//! [destination]
//! views_url = "https://views-b.example.com"
//! zone_id = "zone-b"
//! uaa_url = "https://uaa-b.example.com"
//! client_id = "client"
//! client_secret = "secret"
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::auth::Credentials;

/// Root of views-migrate.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationFile {
    /// Delete every destination card and deck before copying
    #[serde(default)]
    pub clear_destination: bool,

    /// Also post deck membership back to the origin zone
    #[serde(default = "default_associate_origin")]
    pub associate_origin: bool,

    /// Cap on simultaneous per-item requests (0 = unbounded)
    #[serde(default)]
    pub max_concurrency: usize,

    pub origin: ZoneFile,

    pub destination: ZoneFile,
}

fn default_associate_origin() -> bool {
    true
}

/// One side of the migration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneFile {
    /// Base url of the views service; `/api/cards` and `/api/decks` are appended
    pub views_url: String,

    /// Value sent as `Predix-Zone-Id`
    pub zone_id: String,

    /// Base url of the UAA issuing tokens for this zone
    pub uaa_url: String,

    /// Pre-encoded `base64(client_id:client_secret)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uaa_credentials: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl ZoneFile {
    /// Pre-encoded credentials win over a client id/secret pair.
    pub fn credentials(&self) -> Option<Credentials> {
        if let Some(encoded) = &self.uaa_credentials {
            return Some(Credentials::Encoded(encoded.clone()));
        }
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some(Credentials::Client {
                id: id.clone(),
                secret: secret.clone(),
            }),
            _ => None,
        }
    }

    fn validate(&self, side: &str) -> anyhow::Result<()> {
        validate_url(&self.views_url).with_context(|| format!("[{side}] views_url"))?;
        validate_url(&self.uaa_url).with_context(|| format!("[{side}] uaa_url"))?;

        if self.zone_id.trim().is_empty() {
            anyhow::bail!("[{}] zone_id must not be empty", side);
        }

        match self.credentials() {
            None => anyhow::bail!(
                "[{}] needs either uaa_credentials or both client_id and client_secret",
                side
            ),
            Some(credentials) if credentials.is_empty() => {
                anyhow::bail!("[{}] credentials must not be empty", side)
            }
            Some(_) => Ok(()),
        }
    }
}

fn validate_url(raw: &str) -> anyhow::Result<()> {
    let parsed = url::Url::parse(raw).with_context(|| format!("Invalid URL: '{}'", raw))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => anyhow::bail!("Unsupported URL scheme '{}' in '{}'", other, raw),
    }
}

impl MigrationFile {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.origin.validate("origin")?;
        self.destination.validate("destination")?;

        if self.origin.views_url.trim_end_matches('/')
            == self.destination.views_url.trim_end_matches('/')
            && self.origin.zone_id == self.destination.zone_id
        {
            anyhow::bail!("origin and destination point at the same views zone");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> ZoneFile {
        ZoneFile {
            views_url: "https://views.example.com".to_string(),
            zone_id: "zone-a".to_string(),
            uaa_url: "https://uaa.example.com".to_string(),
            uaa_credentials: Some("abc==".to_string()),
            client_id: None,
            client_secret: None,
        }
    }

    #[test]
    fn test_encoded_credentials_win() {
        let mut z = zone();
        z.client_id = Some("id".to_string());
        z.client_secret = Some("secret".to_string());
        assert_eq!(z.credentials(), Some(Credentials::Encoded("abc==".to_string())));
    }

    #[test]
    fn test_client_pair_credentials() {
        let mut z = zone();
        z.uaa_credentials = None;
        z.client_id = Some("id".to_string());
        z.client_secret = Some("secret".to_string());
        assert!(matches!(z.credentials(), Some(Credentials::Client { .. })));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut z = zone();
        z.uaa_credentials = None;
        z.client_id = Some("id".to_string());
        let err = z.validate("origin").unwrap_err().to_string();
        assert!(err.contains("client_secret"));
    }

    #[test]
    fn test_non_http_url_rejected() {
        let mut z = zone();
        z.views_url = "ftp://views.example.com".to_string();
        let err = format!("{:#}", z.validate("origin").unwrap_err());
        assert!(err.contains("ftp"));
    }

    #[test]
    fn test_same_zone_on_both_sides_rejected() {
        let file = MigrationFile {
            clear_destination: true,
            associate_origin: true,
            max_concurrency: 0,
            origin: zone(),
            destination: zone(),
        };
        assert!(file.validate().is_err());
    }
}
