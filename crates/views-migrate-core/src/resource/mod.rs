//! Cards and decks: payload types, id mapping and the bulk procedures that
//! move them between zones.

pub mod id_map;
pub mod migrator;
pub mod types;

pub use id_map::IdMap;
pub use migrator::{INCLUDE_CARDS_QUERY, ResourceMigrator};
pub use types::{Card, CardRef, Deck, DeckAttributes, Resource, ResourceKind, Tag};
