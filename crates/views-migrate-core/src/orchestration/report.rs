//! Summaries returned by a run.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearReport {
    pub cards_deleted: usize,
    pub decks_deleted: usize,
}

/// Counts for one resource type moved from origin to destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourceReport {
    pub fetched: usize,
    /// Items the bulk create added at the destination
    pub created: usize,
    /// Destination ids that differ from the origin id they came from
    pub reassigned_ids: usize,
    pub tag_posts: usize,
}

/// What happened to the association posted back to the origin zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum OriginAssociation {
    #[default]
    Skipped,
    Completed(usize),
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub cleared: Option<ClearReport>,
    pub cards: ResourceReport,
    pub decks: ResourceReport,
    pub destination_associations: usize,
    pub origin_association: OriginAssociation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ZoneInventory {
    pub cards: usize,
    pub tagged_cards: usize,
    pub decks: usize,
    pub decks_with_cards: usize,
}

/// Read-only view of both zones, produced without writing anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryReport {
    pub origin: ZoneInventory,
    pub destination: ZoneInventory,
}
