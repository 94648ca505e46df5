//! Per-resource bulk procedures: fetch, delete, create, tag, associate.

use std::collections::HashSet;

use serde_json::Value;

use crate::bulk::BulkRunner;
use crate::client::{AuthenticatedClient, ZoneContext};
use crate::error::{MigrateError, Result};

use super::types::{Deck, Resource};

/// Query flag asking the decks collection to embed card membership.
pub const INCLUDE_CARDS_QUERY: &str = "filter[include][cards]";

#[derive(Clone)]
pub struct ResourceMigrator {
    client: AuthenticatedClient,
    runner: BulkRunner,
}

impl ResourceMigrator {
    pub fn new(client: AuthenticatedClient, runner: BulkRunner) -> Self {
        Self { client, runner }
    }

    /// GET the whole collection. The body must be a JSON array.
    pub async fn fetch_all<R: Resource>(&self, url: &str, zone: &ZoneContext) -> Result<Vec<R>> {
        let response = self.client.get(url, zone).await?;
        if !response.body.is_array() {
            return Err(MigrateError::UnexpectedBody {
                url: url.to_string(),
                expected: "a JSON array",
                body: response.body,
            });
        }
        serde_json::from_value(response.body).map_err(|e| MigrateError::UnexpectedBody {
            url: url.to_string(),
            expected: "an array of items with string ids",
            body: Value::String(e.to_string()),
        })
    }

    /// Fetch decks with their card membership embedded in the same call.
    pub async fn fetch_decks_with_cards(
        &self,
        decks_url: &str,
        zone: &ZoneContext,
    ) -> Result<Vec<Deck>> {
        self.fetch_all(&with_include_cards(decks_url), zone).await
    }

    /// One DELETE per item, fanned out. Returns the number of deletes issued.
    pub async fn delete_all<R: Resource>(
        &self,
        items: &[R],
        url: &str,
        zone: &ZoneContext,
    ) -> Result<usize> {
        let operation = format!("delete {}", R::KIND);
        self.runner
            .run_all(&operation, items, |item| async move {
                self.client
                    .delete(&item_url(url, item.id()), zone)
                    .await
                    .map(|_| ())
            })
            .await?;
        tracing::info!(count = items.len(), kind = %R::KIND, zone = zone.zone_id(), "deleted");
        Ok(items.len())
    }

    /// Single bulk POST of the whole array. Returns the items that appeared
    /// in the collection because of it, in listing order.
    ///
    /// The collection is listed before and after the POST so items already
    /// at the destination are never mistaken for copies.
    pub async fn create_all<R: Resource>(
        &self,
        items: &[R],
        url: &str,
        zone: &ZoneContext,
    ) -> Result<Vec<R>> {
        if items.is_empty() {
            tracing::debug!(kind = %R::KIND, "nothing to create");
            return Ok(Vec::new());
        }

        let existing: HashSet<String> = self
            .fetch_all::<R>(url, zone)
            .await?
            .into_iter()
            .map(|item| item.id().to_string())
            .collect();

        let body = serde_json::to_value(items).map_err(|e| MigrateError::UnexpectedBody {
            url: url.to_string(),
            expected: "serializable items",
            body: Value::String(e.to_string()),
        })?;
        self.client.post(url, zone, &body).await?;

        let created: Vec<R> = self
            .fetch_all::<R>(url, zone)
            .await?
            .into_iter()
            .filter(|item| !existing.contains(item.id()))
            .collect();
        tracing::info!(
            count = created.len(),
            kept = existing.len(),
            kind = %R::KIND,
            zone = zone.zone_id(),
            "created"
        );
        Ok(created)
    }

    /// POST each item's tags to `{url}/{id}/tags`. Untagged items are skipped.
    ///
    /// Returns the number of tag posts issued.
    pub async fn tag_all<R: Resource>(
        &self,
        items: &[R],
        url: &str,
        zone: &ZoneContext,
    ) -> Result<usize> {
        let posts = items
            .iter()
            .filter(|item| !item.tags().is_empty())
            .map(|item| {
                let tags_url = format!("{}/tags", item_url(url, item.id()));
                let body = serde_json::to_value(item.tags()).map_err(|e| {
                    MigrateError::UnexpectedBody {
                        url: tags_url.clone(),
                        expected: "serializable tags",
                        body: Value::String(e.to_string()),
                    }
                })?;
                Ok((tags_url, body))
            })
            .collect::<Result<Vec<(String, Value)>>>()?;

        let operation = format!("tag {}", R::KIND);
        self.runner
            .run_all(&operation, &posts, |(tags_url, body)| async move {
                self.client.post(tags_url, zone, body).await.map(|_| ())
            })
            .await?;
        tracing::info!(count = posts.len(), kind = %R::KIND, zone = zone.zone_id(), "tagged");
        Ok(posts.len())
    }

    /// POST each deck's card ids to `{decks_url}/{id}/cards/add`. Decks with
    /// no membership are skipped.
    pub async fn associate_cards(
        &self,
        decks: &[Deck],
        decks_url: &str,
        zone: &ZoneContext,
    ) -> Result<usize> {
        let populated: Vec<&Deck> = decks.iter().filter(|deck| !deck.card_ids().is_empty()).collect();
        self.runner
            .run_all("associate cards", populated.iter().copied(), |deck| async move {
                let body = Value::from(deck.card_ids());
                self.client
                    .post(&format!("{}/cards/add", item_url(decks_url, &deck.id)), zone, &body)
                    .await
                    .map(|_| ())
            })
            .await?;
        tracing::info!(count = populated.len(), zone = zone.zone_id(), "associated cards into decks");
        Ok(populated.len())
    }
}

fn item_url(collection_url: &str, id: &str) -> String {
    format!("{}/{}", collection_url.trim_end_matches('/'), id)
}

fn with_include_cards(decks_url: &str) -> String {
    let separator = if decks_url.contains('?') { '&' } else { '?' };
    format!("{decks_url}{separator}{INCLUDE_CARDS_QUERY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_url() {
        assert_eq!(item_url("https://v/api/cards", "7"), "https://v/api/cards/7");
        assert_eq!(item_url("https://v/api/cards/", "7"), "https://v/api/cards/7");
    }

    #[test]
    fn test_with_include_cards() {
        assert_eq!(
            with_include_cards("https://v/api/decks"),
            "https://v/api/decks?filter[include][cards]"
        );
        assert_eq!(
            with_include_cards("https://v/api/decks?limit=5"),
            "https://v/api/decks?limit=5&filter[include][cards]"
        );
    }
}
