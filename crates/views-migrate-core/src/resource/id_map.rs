//! Origin to destination identity mapping.
//!
//! The destination assigns ids on creation. Items whose id survived the bulk
//! POST map to themselves; the remaining origin items are paired with the
//! remaining created items in listing order. Only items created by the run
//! may be passed as the destination side.

use std::collections::{HashMap, HashSet};

use crate::error::MigrateError;

use super::types::{Deck, Resource};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap {
    ids: HashMap<String, String>,
}

impl IdMap {
    /// Build the mapping from the origin listing and the items the bulk create
    /// added at the destination.
    pub fn pair<R: Resource>(origin: &[R], destination: &[R]) -> Self {
        let destination_ids: HashSet<&str> = destination.iter().map(Resource::id).collect();

        let mut ids = HashMap::new();
        let mut claimed = HashSet::new();
        let mut unmatched_origin = Vec::new();
        for item in origin {
            if destination_ids.contains(item.id()) {
                ids.insert(item.id().to_string(), item.id().to_string());
                claimed.insert(item.id());
            } else {
                unmatched_origin.push(item.id());
            }
        }

        let unmatched_destination = destination
            .iter()
            .map(Resource::id)
            .filter(|id| !claimed.contains(id));

        for (origin_id, destination_id) in unmatched_origin.into_iter().zip(unmatched_destination) {
            ids.insert(origin_id.to_string(), destination_id.to_string());
        }

        Self { ids }
    }

    pub fn get(&self, origin_id: &str) -> Option<&str> {
        self.ids.get(origin_id).map(String::as_str)
    }

    /// Number of origin ids that were not preserved by the destination.
    pub fn reassigned(&self) -> usize {
        self.ids.iter().filter(|(from, to)| from != to).count()
    }

    /// Clone `items` with their ids replaced by the destination counterparts.
    pub fn retarget<R: Resource>(&self, items: &[R]) -> Result<Vec<R>, MigrateError> {
        items
            .iter()
            .map(|item| {
                let id = self
                    .get(item.id())
                    .ok_or_else(|| MigrateError::MissingCounterpart {
                        kind: R::KIND,
                        id: item.id().to_string(),
                    })?;
                let mut retargeted = item.clone();
                retargeted.set_id(id.to_string());
                Ok(retargeted)
            })
            .collect()
    }

    /// Rewrite the card references of `decks` through this card mapping.
    ///
    /// References to cards that were never migrated keep their origin id.
    pub fn translate_card_refs(&self, decks: &[Deck]) -> Vec<Deck> {
        decks
            .iter()
            .map(|deck| {
                let mut deck = deck.clone();
                if let Some(cards) = deck.attributes.cards.as_mut() {
                    for card in cards.iter_mut() {
                        match self.get(&card.id) {
                            Some(id) => card.id = id.to_string(),
                            None => tracing::warn!(
                                deck = %deck.id,
                                card = %card.id,
                                "deck references a card with no destination counterpart; keeping origin id"
                            ),
                        }
                    }
                }
                deck
            })
            .collect()
    }
}
