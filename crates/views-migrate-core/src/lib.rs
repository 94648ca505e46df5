//! Views Migrate Core Library
//!
//! Copies the cards and decks of one views zone into another: token
//! exchange against both UAAs, zone-scoped API calls, per-item fan-out and
//! the ordered pipeline tying them together.

pub mod auth;
pub mod bulk;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestration;
pub mod resource;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{
        ConfigOverrides, MigrationConfig, MigrationFile, Side, ZoneConfig, load_config,
    };

    // Transport and authenticated calls
    pub use crate::auth::{Credentials, TokenProvider, TokenResponse};
    pub use crate::client::{AuthenticatedClient, ZoneContext};
    pub use crate::http::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};

    // Bulk execution
    pub use crate::bulk::{BulkRunner, ConcurrencyPolicy};

    // Resources
    pub use crate::resource::{Card, Deck, IdMap, Resource, ResourceKind, ResourceMigrator, Tag};

    // Pipeline
    pub use crate::orchestration::{
        InventoryReport, MigrationOrchestrator, MigrationReport, OriginAssociation, Stage,
    };

    // Errors
    pub use crate::error::{AuthenticationError, BulkError, MigrateError, RequestError};
}
