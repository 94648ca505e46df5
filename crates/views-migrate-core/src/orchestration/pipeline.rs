//! The ordered migration pipeline.
//!
//! Stages run strictly one after another; fan-out only happens inside a
//! stage. Any failure aborts the run with no rollback, so the destination
//! may be left partially migrated.

use std::sync::Arc;

use crate::auth::TokenProvider;
use crate::bulk::BulkRunner;
use crate::client::{AuthenticatedClient, ZoneContext};
use crate::config::{MigrationConfig, Side};
use crate::error::Result;
use crate::http::Transport;
use crate::resource::{Card, Deck, IdMap, Resource, ResourceKind, ResourceMigrator};

use super::report::{
    ClearReport, InventoryReport, MigrationReport, OriginAssociation, ResourceReport,
    ZoneInventory,
};
use super::state::{RunState, Stage};

pub struct MigrationOrchestrator {
    config: MigrationConfig,
    tokens: TokenProvider,
    migrator: ResourceMigrator,
}

/// Output of the card stage consumed by the association stage.
struct MigratedCards {
    ids: IdMap,
    report: ResourceReport,
}

struct MigratedDecks {
    origin: Vec<Deck>,
    ids: IdMap,
    report: ResourceReport,
}

impl MigrationOrchestrator {
    pub fn new(config: MigrationConfig, transport: Arc<dyn Transport>) -> Self {
        let runner = BulkRunner::new(config.concurrency);
        let migrator = ResourceMigrator::new(AuthenticatedClient::new(transport.clone()), runner);
        Self {
            config,
            tokens: TokenProvider::new(transport),
            migrator,
        }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Run every stage in order.
    pub async fn run(&self) -> Result<MigrationReport> {
        let mut state = RunState::new();
        let mut report = MigrationReport::default();

        state.enter(Stage::AuthOrigin);
        self.authenticate(Side::Origin, &mut state).await?;

        state.enter(Stage::AuthDestination);
        self.authenticate(Side::Destination, &mut state).await?;

        let origin = state.zone(Side::Origin, &self.config.origin)?;
        let destination = state.zone(Side::Destination, &self.config.destination)?;

        if self.config.clear_destination {
            state.enter(Stage::ClearDestination);
            report.cleared = Some(self.clear_destination(&destination).await?);
        } else {
            tracing::info!(stage = %Stage::ClearDestination, "skipped");
        }

        state.enter(Stage::MigrateCards);
        let cards = self.migrate_cards(&origin, &destination).await?;
        report.cards = cards.report;

        state.enter(Stage::MigrateDecks);
        let decks = self.migrate_decks(&origin, &destination).await?;
        report.decks = decks.report;

        state.enter(Stage::AssociateCards);
        let (destination_associations, origin_association) = self
            .associate_cards(&origin, &destination, &cards, &decks)
            .await?;
        report.destination_associations = destination_associations;
        report.origin_association = origin_association;

        state.enter(Stage::Done);
        Ok(report)
    }

    /// Authenticate both zones and count what each side holds. Writes nothing.
    pub async fn inventory(&self) -> Result<InventoryReport> {
        let mut state = RunState::new();
        self.authenticate(Side::Origin, &mut state).await?;
        self.authenticate(Side::Destination, &mut state).await?;

        let origin = state.zone(Side::Origin, &self.config.origin)?;
        let destination = state.zone(Side::Destination, &self.config.destination)?;

        Ok(InventoryReport {
            origin: self.zone_inventory(Side::Origin, &origin).await?,
            destination: self.zone_inventory(Side::Destination, &destination).await?,
        })
    }

    async fn authenticate(&self, side: Side, state: &mut RunState) -> Result<()> {
        let zone = self.config.zone(side);
        let token = self
            .tokens
            .request_token(&zone.uaa_url, &zone.credentials)
            .await?;
        tracing::info!(%side, zone = %zone.zone_id, "authenticated");
        state.set_token(side, token.access_token);
        Ok(())
    }

    /// Delete every destination card, then every destination deck.
    async fn clear_destination(&self, destination: &ZoneContext) -> Result<ClearReport> {
        Ok(ClearReport {
            cards_deleted: self.delete_everything::<Card>(destination).await?,
            decks_deleted: self.delete_everything::<Deck>(destination).await?,
        })
    }

    async fn delete_everything<R: Resource>(&self, destination: &ZoneContext) -> Result<usize> {
        let url = self.config.destination.resource_url(R::KIND);
        let existing: Vec<R> = self.migrator.fetch_all(url, destination).await?;
        self.migrator.delete_all(&existing, url, destination).await
    }

    /// Copy cards, then tag the destination copies with the origin tags.
    async fn migrate_cards(
        &self,
        origin: &ZoneContext,
        destination: &ZoneContext,
    ) -> Result<MigratedCards> {
        let from = &self.config.origin;
        let to = &self.config.destination;

        let origin_cards: Vec<Card> = self.migrator.fetch_all(&from.cards_url, origin).await?;
        tracing::info!(count = origin_cards.len(), "fetched origin cards");

        let created = self
            .migrator
            .create_all(&origin_cards, &to.cards_url, destination)
            .await?;
        let ids = IdMap::pair(&origin_cards, &created);

        let retargeted = ids.retarget(&origin_cards)?;
        let tag_posts = self
            .migrator
            .tag_all(&retargeted, &to.cards_url, destination)
            .await?;

        Ok(MigratedCards {
            report: ResourceReport {
                fetched: origin_cards.len(),
                created: created.len(),
                reassigned_ids: ids.reassigned(),
                tag_posts,
            },
            ids,
        })
    }

    /// Copy decks (fetched with card membership), then tag the copies.
    async fn migrate_decks(
        &self,
        origin: &ZoneContext,
        destination: &ZoneContext,
    ) -> Result<MigratedDecks> {
        let from = &self.config.origin;
        let to = &self.config.destination;

        let origin_decks = self
            .migrator
            .fetch_decks_with_cards(&from.decks_url, origin)
            .await?;
        tracing::info!(count = origin_decks.len(), "fetched origin decks");

        let created = self
            .migrator
            .create_all(&origin_decks, &to.decks_url, destination)
            .await?;
        let ids = IdMap::pair(&origin_decks, &created);

        let retargeted = ids.retarget(&origin_decks)?;
        let tag_posts = self
            .migrator
            .tag_all(&retargeted, &to.decks_url, destination)
            .await?;

        Ok(MigratedDecks {
            report: ResourceReport {
                fetched: origin_decks.len(),
                created: created.len(),
                reassigned_ids: ids.reassigned(),
                tag_posts,
            },
            origin: origin_decks,
            ids,
        })
    }

    /// Link cards into decks at the destination and, when enabled, at the
    /// origin. Both sides run concurrently; only the destination side can
    /// fail the run.
    async fn associate_cards(
        &self,
        origin: &ZoneContext,
        destination: &ZoneContext,
        cards: &MigratedCards,
        decks: &MigratedDecks,
    ) -> Result<(usize, OriginAssociation)> {
        let destination_decks = cards
            .ids
            .translate_card_refs(&decks.ids.retarget(&decks.origin)?);

        let destination_side =
            self.migrator
                .associate_cards(&destination_decks, &self.config.destination.decks_url, destination);

        if !self.config.associate_origin {
            return Ok((destination_side.await?, OriginAssociation::Skipped));
        }

        let origin_side =
            self.migrator
                .associate_cards(&decks.origin, &self.config.origin.decks_url, origin);

        let (destination_result, origin_result) = futures::join!(destination_side, origin_side);

        let origin_association = match origin_result {
            Ok(count) => OriginAssociation::Completed(count),
            Err(e) => {
                tracing::warn!(error = %e, "associating cards at the origin failed; continuing");
                OriginAssociation::Failed(e.to_string())
            }
        };

        Ok((destination_result?, origin_association))
    }

    async fn zone_inventory(&self, side: Side, zone: &ZoneContext) -> Result<ZoneInventory> {
        let config = self.config.zone(side);
        let cards: Vec<Card> = self
            .migrator
            .fetch_all(config.resource_url(ResourceKind::Cards), zone)
            .await?;
        let decks = self
            .migrator
            .fetch_decks_with_cards(config.resource_url(ResourceKind::Decks), zone)
            .await?;

        Ok(ZoneInventory {
            cards: cards.len(),
            tagged_cards: cards.iter().filter(|card| !card.tags().is_empty()).count(),
            decks: decks.len(),
            decks_with_cards: decks.iter().filter(|deck| !deck.card_ids().is_empty()).count(),
        })
    }
}
