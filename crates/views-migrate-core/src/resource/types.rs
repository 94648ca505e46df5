//! Card, deck and tag payloads.
//!
//! Only the fields the migrator reads are typed; everything else is kept in
//! a flattened map and written back untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Cards,
    Decks,
}

impl ResourceKind {
    /// Path appended to a views base url.
    pub fn api_path(&self) -> &'static str {
        match self {
            ResourceKind::Cards => "/api/cards",
            ResourceKind::Decks => "/api/decks",
        }
    }

    pub fn singular(&self) -> &'static str {
        match self {
            ResourceKind::Cards => "card",
            ResourceKind::Decks => "deck",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Cards => f.write_str("cards"),
            ResourceKind::Decks => f.write_str("decks"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub value: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tag {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A deck's reference to one of its cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRef {
    pub id: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CardRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<CardRef>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,

    #[serde(default)]
    pub attributes: DeckAttributes,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Deck {
    /// Member card ids; empty when the deck carries no membership.
    pub fn card_ids(&self) -> Vec<&str> {
        self.attributes
            .cards
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|card| card.id.as_str())
            .collect()
    }
}

/// Common view over cards and decks used by the bulk procedures.
pub trait Resource: Clone + Serialize + serde::de::DeserializeOwned + Send + Sync {
    const KIND: ResourceKind;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn tags(&self) -> &[Tag];
}

impl Resource for Card {
    const KIND: ResourceKind = ResourceKind::Cards;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn tags(&self) -> &[Tag] {
        self.tags.as_deref().unwrap_or_default()
    }
}

impl Resource for Deck {
    const KIND: ResourceKind = ResourceKind::Decks;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn tags(&self) -> &[Tag] {
        self.tags.as_deref().unwrap_or_default()
    }
}
