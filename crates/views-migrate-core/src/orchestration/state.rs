//! Pipeline stages and the mutable part of a run.

use crate::client::ZoneContext;
use crate::config::{Side, ZoneConfig};
use crate::error::{MigrateError, Result};

/// Ordered stages of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    AuthOrigin,
    AuthDestination,
    ClearDestination,
    MigrateCards,
    MigrateDecks,
    AssociateCards,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::AuthOrigin,
        Stage::AuthDestination,
        Stage::ClearDestination,
        Stage::MigrateCards,
        Stage::MigrateDecks,
        Stage::AssociateCards,
        Stage::Done,
    ];
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::AuthOrigin => "auth-origin",
            Stage::AuthDestination => "auth-destination",
            Stage::ClearDestination => "clear-destination",
            Stage::MigrateCards => "migrate-cards",
            Stage::MigrateDecks => "migrate-decks",
            Stage::AssociateCards => "associate-cards",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Tokens obtained during the run plus the stage reached so far.
///
/// Configuration stays immutable; only this value changes while the
/// pipeline advances.
#[derive(Debug, Default)]
pub struct RunState {
    origin_token: Option<String>,
    destination_token: Option<String>,
    stage: Option<Stage>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, stage: Stage) {
        tracing::info!(%stage, "entering stage");
        self.stage = Some(stage);
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    pub fn set_token(&mut self, side: Side, token: String) {
        match side {
            Side::Origin => self.origin_token = Some(token),
            Side::Destination => self.destination_token = Some(token),
        }
    }

    pub fn token(&self, side: Side) -> Option<&str> {
        match side {
            Side::Origin => self.origin_token.as_deref(),
            Side::Destination => self.destination_token.as_deref(),
        }
    }

    /// Zone context for `side`; fails if that zone was not authenticated.
    pub fn zone(&self, side: Side, config: &ZoneConfig) -> Result<ZoneContext> {
        let token = self.token(side).ok_or_else(|| MigrateError::NotAuthenticated {
            zone: config.zone_id.clone(),
        })?;
        Ok(ZoneContext::new(
            config.zone_id.clone(),
            config.views_url.clone(),
            token,
        ))
    }
}
