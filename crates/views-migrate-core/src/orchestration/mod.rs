//! Top-level migration pipeline: authenticate, clear, copy, associate.

pub mod pipeline;
pub mod report;
pub mod state;

pub use pipeline::MigrationOrchestrator;
pub use report::{
    ClearReport, InventoryReport, MigrationReport, OriginAssociation, ResourceReport,
    ZoneInventory,
};
pub use state::{RunState, Stage};
