//! Core game components: identities, cards, locations, resources

pub mod card;
pub mod entity;
pub mod location;
pub mod types;

pub use card::{Card, CardData, CardName};
pub use entity::{CardId, ComponentId, EntityStore, GameEntity, LocationId};
pub use location::{BasicLocation, ForestLocation, Location, LocationEffect, LocationKind};
pub use types::{CardColor, CardKind, PlayerId, Resource, ResourceMap, Season};
