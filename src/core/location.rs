//! Board locations and their effect descriptors
//!
//! A location stores an effect *descriptor* (data), interpreted by one
//! central routine in the forward model. No closures live inside state,
//! so the state stays cheaply and exactly clonable.

use crate::core::{CardColor, CardName, GameEntity, LocationId, PlayerId, Resource, ResourceMap};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Basic (always present) board locations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum BasicLocation {
    ThreeTwig,
    TwoTwigOneCard,
    TwoResin,
    OneResinOneCard,
    OnePebble,
    OneBerryOneCard,
    OneBerry,
}

impl BasicLocation {
    pub const ALL: [BasicLocation; 7] = [
        BasicLocation::ThreeTwig,
        BasicLocation::TwoTwigOneCard,
        BasicLocation::TwoResin,
        BasicLocation::OneResinOneCard,
        BasicLocation::OnePebble,
        BasicLocation::OneBerryOneCard,
        BasicLocation::OneBerry,
    ];

    /// Exclusive spots admit one worker total; shared spots admit one per player
    pub fn is_exclusive(&self) -> bool {
        matches!(
            self,
            BasicLocation::ThreeTwig | BasicLocation::TwoResin | BasicLocation::OneBerryOneCard
        )
    }

    pub fn effect(&self) -> LocationEffect {
        match self {
            BasicLocation::ThreeTwig => LocationEffect::Gain {
                resources: ResourceMap::single(Resource::Twig, 3),
                cards: 0,
            },
            BasicLocation::TwoTwigOneCard => LocationEffect::Gain {
                resources: ResourceMap::single(Resource::Twig, 2),
                cards: 1,
            },
            BasicLocation::TwoResin => LocationEffect::Gain {
                resources: ResourceMap::single(Resource::Resin, 2),
                cards: 0,
            },
            BasicLocation::OneResinOneCard => LocationEffect::Gain {
                resources: ResourceMap::single(Resource::Resin, 1),
                cards: 1,
            },
            BasicLocation::OnePebble => LocationEffect::Gain {
                resources: ResourceMap::single(Resource::Pebble, 1),
                cards: 0,
            },
            BasicLocation::OneBerryOneCard => LocationEffect::Gain {
                resources: ResourceMap::single(Resource::Berry, 1),
                cards: 1,
            },
            BasicLocation::OneBerry => LocationEffect::Gain {
                resources: ResourceMap::single(Resource::Berry, 1),
                cards: 0,
            },
        }
    }
}

/// Forest locations; three are drawn at setup
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum ForestLocation {
    ThreeBerry,
    TwoBerryOneCard,
    TwoAnyResources,
    TwigResinPebble,
    TwoCardsOneAny,
    DiscardUpToThreeGainAny,
    CopyBasicPlusCard,
    ThreeTwigOneCard,
}

impl ForestLocation {
    pub const ALL: [ForestLocation; 8] = [
        ForestLocation::ThreeBerry,
        ForestLocation::TwoBerryOneCard,
        ForestLocation::TwoAnyResources,
        ForestLocation::TwigResinPebble,
        ForestLocation::TwoCardsOneAny,
        ForestLocation::DiscardUpToThreeGainAny,
        ForestLocation::CopyBasicPlusCard,
        ForestLocation::ThreeTwigOneCard,
    ];

    pub fn effect(&self) -> LocationEffect {
        match self {
            ForestLocation::ThreeBerry => LocationEffect::Gain {
                resources: ResourceMap::single(Resource::Berry, 3),
                cards: 0,
            },
            ForestLocation::TwoBerryOneCard => LocationEffect::Gain {
                resources: ResourceMap::single(Resource::Berry, 2),
                cards: 1,
            },
            ForestLocation::TwoAnyResources => LocationEffect::GainAnyResources { count: 2, cards: 0 },
            ForestLocation::TwigResinPebble => LocationEffect::Gain {
                resources: ResourceMap::new()
                    .with(Resource::Twig, 1)
                    .with(Resource::Resin, 1)
                    .with(Resource::Pebble, 1),
                cards: 0,
            },
            ForestLocation::TwoCardsOneAny => LocationEffect::GainAnyResources { count: 1, cards: 2 },
            ForestLocation::DiscardUpToThreeGainAny => LocationEffect::DiscardForResources {
                max_cards: 3,
                resources_per_card: 1,
                cards_per_resource: 1,
            },
            ForestLocation::CopyBasicPlusCard => LocationEffect::CopyBasicLocation { cards: 1 },
            ForestLocation::ThreeTwigOneCard => LocationEffect::Gain {
                resources: ResourceMap::single(Resource::Twig, 3),
                cards: 1,
            },
        }
    }
}

/// Closed set of location identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationKind {
    Basic(BasicLocation),
    Forest(ForestLocation),
    /// Discard any number of hand cards, gain one resource per two
    Haven,
    /// Autumn-only; discard `points` cards, gain `points` points
    Journey { points: u8 },
    /// Claim-once event requiring three village cards of the color
    BasicEvent(CardColor),
    /// Companion location owned by a played destination card
    CardDestination(CardName),
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationKind::Basic(b) => write!(f, "basic:{b:?}"),
            LocationKind::Forest(fl) => write!(f, "forest:{fl:?}"),
            LocationKind::Haven => write!(f, "haven"),
            LocationKind::Journey { points } => write!(f, "journey:{points}"),
            LocationKind::BasicEvent(c) => write!(f, "event:{c}"),
            LocationKind::CardDestination(name) => write!(f, "card:{name}"),
        }
    }
}

/// Effect descriptor bound to a location at activation time
///
/// Interpreted by `GameState::run_location_effect`; variants that need
/// player input push decision steps instead of mutating directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationEffect {
    /// Fixed resources and/or card draws
    Gain { resources: ResourceMap, cards: u8 },
    /// Draw `cards`, then choose `count` resources of any kinds
    GainAnyResources { count: u8, cards: u8 },
    /// Discard up to `max_cards`, gain resources at the stated exchange rate
    DiscardForResources {
        max_cards: u8,
        resources_per_card: u8,
        cards_per_resource: u8,
    },
    /// Choose any basic location and resolve its effect, plus card draws
    CopyBasicLocation { cards: u8 },
    /// Discard exactly `points` cards for that many point tokens
    Journey { points: u8 },
    /// Claim the event: three village cards of `color` gate it
    ClaimEvent { color: CardColor, points: u8 },
    /// Defer to the owning card's effect chain
    CardEffect(CardName),
}

/// A worker spot on the board or on a played destination card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique component id
    pub id: LocationId,

    pub kind: LocationKind,

    /// Total simultaneous workers (exclusive spots); ignored when `shared`
    pub capacity: u8,

    /// Shared spots admit any number of workers, still one per player
    pub shared: bool,

    /// Player indices currently occupying this location
    pub workers: SmallVec<[PlayerId; 2]>,

    /// Effect procedure, bound when the location is registered
    pub effect: LocationEffect,

    /// Owning player for card-companion locations
    pub owner: Option<PlayerId>,

    /// Claiming player for events
    pub claimed_by: Option<PlayerId>,
}

impl Location {
    pub fn new(id: LocationId, kind: LocationKind, capacity: u8, shared: bool, effect: LocationEffect) -> Self {
        Location {
            id,
            kind,
            capacity,
            shared,
            workers: SmallVec::new(),
            effect,
            owner: None,
            claimed_by: None,
        }
    }

    pub fn basic(id: LocationId, which: BasicLocation) -> Self {
        Location::new(
            id,
            LocationKind::Basic(which),
            1,
            !which.is_exclusive(),
            which.effect(),
        )
    }

    pub fn forest(id: LocationId, which: ForestLocation) -> Self {
        // Forest spots on the board are exclusive
        Location::new(id, LocationKind::Forest(which), 1, false, which.effect())
    }

    pub fn haven(id: LocationId) -> Self {
        Location::new(
            id,
            LocationKind::Haven,
            1,
            true,
            LocationEffect::DiscardForResources {
                max_cards: 8,
                resources_per_card: 1,
                cards_per_resource: 2,
            },
        )
    }

    pub fn journey(id: LocationId, points: u8) -> Self {
        // The two-point spot is shared; the rest are exclusive
        Location::new(
            id,
            LocationKind::Journey { points },
            1,
            points == 2,
            LocationEffect::Journey { points },
        )
    }

    pub fn basic_event(id: LocationId, color: CardColor) -> Self {
        Location::new(
            id,
            LocationKind::BasicEvent(color),
            1,
            false,
            LocationEffect::ClaimEvent { color, points: 3 },
        )
    }

    pub fn card_destination(id: LocationId, name: CardName, owner: PlayerId) -> Self {
        let mut loc = Location::new(
            id,
            LocationKind::CardDestination(name),
            1,
            false,
            LocationEffect::CardEffect(name),
        );
        loc.owner = Some(owner);
        loc
    }

    /// Whether `player` may put a worker here right now (occupancy rules
    /// only; effect prerequisites are checked separately)
    pub fn is_free_for(&self, player: PlayerId) -> bool {
        if self.workers.contains(&player) {
            return false;
        }
        if self.claimed_by.is_some() {
            return false;
        }
        if self.shared {
            return true;
        }
        (self.workers.len() as u8) < self.capacity
    }

    /// Closed (owner-only) card destinations reject visitors
    pub fn admits_visitor(&self, player: PlayerId) -> bool {
        match (self.kind, self.owner) {
            (LocationKind::CardDestination(name), Some(owner)) => {
                owner == player || name.data().open_destination
            }
            _ => true,
        }
    }

    pub fn place_worker(&mut self, player: PlayerId) {
        self.workers.push(player);
    }

    /// Remove one of `player`'s workers; true if one was present
    pub fn remove_worker(&mut self, player: PlayerId) -> bool {
        if let Some(pos) = self.workers.iter().position(|&p| p == player) {
            // Ordered removal keeps iteration deterministic
            self.workers.remove(pos);
            true
        } else {
            false
        }
    }

    /// Workers here never return at season advance
    pub fn retains_workers(&self) -> bool {
        matches!(
            self.kind,
            LocationKind::CardDestination(CardName::Cemetery)
                | LocationKind::CardDestination(CardName::Monastery)
        )
    }
}

impl GameEntity for Location {
    type Id = LocationId;

    fn id(&self) -> LocationId {
        self.id
    }

    fn display_name(&self) -> &str {
        match self.kind {
            LocationKind::Basic(_) => "basic location",
            LocationKind::Forest(_) => "forest location",
            LocationKind::Haven => "haven",
            LocationKind::Journey { .. } => "journey",
            LocationKind::BasicEvent(_) => "basic event",
            LocationKind::CardDestination(name) => name.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_capacity() {
        let mut loc = Location::basic(LocationId::new(1), BasicLocation::ThreeTwig);
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);

        assert!(loc.is_free_for(p0));
        loc.place_worker(p0);
        assert!(!loc.is_free_for(p0), "same player may not double up");
        assert!(!loc.is_free_for(p1), "exclusive spot is full");
    }

    #[test]
    fn test_shared_admits_one_per_player() {
        let mut loc = Location::basic(LocationId::new(2), BasicLocation::OneBerry);
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);

        loc.place_worker(p0);
        assert!(!loc.is_free_for(p0));
        assert!(loc.is_free_for(p1));
    }

    #[test]
    fn test_retaining_locations() {
        let cemetery = Location::card_destination(
            LocationId::new(3),
            CardName::Cemetery,
            PlayerId::new(0),
        );
        assert!(cemetery.retains_workers());

        let inn = Location::card_destination(LocationId::new(4), CardName::Inn, PlayerId::new(0));
        assert!(!inn.retains_workers());
        // Inn is open to visitors, Monastery is not
        assert!(inn.admits_visitor(PlayerId::new(1)));
        let monastery = Location::card_destination(
            LocationId::new(5),
            CardName::Monastery,
            PlayerId::new(0),
        );
        assert!(monastery.admits_visitor(PlayerId::new(0)));
        assert!(!monastery.admits_visitor(PlayerId::new(1)));
    }

    #[test]
    fn test_worker_removal_is_single() {
        let mut loc = Location::haven(LocationId::new(6));
        let p0 = PlayerId::new(0);
        loc.place_worker(p0);
        assert!(loc.remove_worker(p0));
        assert!(!loc.remove_worker(p0), "workers return exactly once");
    }
}
