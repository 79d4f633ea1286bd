//! Card identities, static card data, and per-instance card state
//!
//! Many card instances share an identity (`CardName`); the identity drives
//! the static data table (cost, color, points, uniqueness, occupancy) and
//! the effect dispatch in the forward model. The `Card` struct holds only
//! the mutable per-instance state.

use crate::core::{CardColor, CardId, CardKind, GameEntity, LocationId, Resource, ResourceMap};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// The closed set of card identities (base set, 48 distinct cards)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CardName {
    // Constructions
    Castle,
    Cemetery,
    Chapel,
    ClockTower,
    Courthouse,
    Crane,
    Dungeon,
    Evertree,
    Fairgrounds,
    Farm,
    GeneralStore,
    Inn,
    Lookout,
    Mine,
    Monastery,
    Palace,
    PostOffice,
    ResinRefinery,
    Ruins,
    School,
    Storehouse,
    Theatre,
    TwigBarge,
    University,
    // Critters
    Architect,
    Bard,
    BargeToad,
    ChipSweep,
    Doctor,
    Fool,
    Historian,
    Husband,
    Innkeeper,
    Judge,
    King,
    MinerMole,
    Monk,
    Peddler,
    PostalPigeon,
    Queen,
    Ranger,
    Shepherd,
    Shopkeeper,
    Teacher,
    Undertaker,
    Wanderer,
    Wife,
    Woodcarver,
}

/// Static per-identity data
#[derive(Debug, Clone, Copy)]
pub struct CardData {
    pub kind: CardKind,
    pub color: CardColor,
    pub cost: ResourceMap,
    pub base_points: i8,
    pub unique: bool,
    pub deck_count: u8,
    /// Critters this construction houses for free (constructions only)
    pub occupants: &'static [CardName],
    /// Evertree houses any critter
    pub houses_any: bool,
    /// Creates a companion location when played
    pub creates_destination: bool,
    /// Companion location may be visited by other players
    pub open_destination: bool,
}

const NO_OCCUPANTS: &[CardName] = &[];

fn construction(
    color: CardColor,
    cost: ResourceMap,
    base_points: i8,
    unique: bool,
    deck_count: u8,
    occupants: &'static [CardName],
) -> CardData {
    CardData {
        kind: CardKind::Construction,
        color,
        cost,
        base_points,
        unique,
        deck_count,
        occupants,
        houses_any: false,
        creates_destination: false,
        open_destination: false,
    }
}

fn critter(
    color: CardColor,
    berries: u8,
    base_points: i8,
    unique: bool,
    deck_count: u8,
) -> CardData {
    CardData {
        kind: CardKind::Critter,
        color,
        cost: ResourceMap::single(Resource::Berry, berries),
        base_points,
        unique,
        deck_count,
        occupants: NO_OCCUPANTS,
        houses_any: false,
        creates_destination: false,
        open_destination: false,
    }
}

fn cost_trp(twig: u8, resin: u8, pebble: u8) -> ResourceMap {
    ResourceMap::new()
        .with(Resource::Twig, twig)
        .with(Resource::Resin, resin)
        .with(Resource::Pebble, pebble)
}

impl CardName {
    pub const ALL: [CardName; 48] = [
        CardName::Castle,
        CardName::Cemetery,
        CardName::Chapel,
        CardName::ClockTower,
        CardName::Courthouse,
        CardName::Crane,
        CardName::Dungeon,
        CardName::Evertree,
        CardName::Fairgrounds,
        CardName::Farm,
        CardName::GeneralStore,
        CardName::Inn,
        CardName::Lookout,
        CardName::Mine,
        CardName::Monastery,
        CardName::Palace,
        CardName::PostOffice,
        CardName::ResinRefinery,
        CardName::Ruins,
        CardName::School,
        CardName::Storehouse,
        CardName::Theatre,
        CardName::TwigBarge,
        CardName::University,
        CardName::Architect,
        CardName::Bard,
        CardName::BargeToad,
        CardName::ChipSweep,
        CardName::Doctor,
        CardName::Fool,
        CardName::Historian,
        CardName::Husband,
        CardName::Innkeeper,
        CardName::Judge,
        CardName::King,
        CardName::MinerMole,
        CardName::Monk,
        CardName::Peddler,
        CardName::PostalPigeon,
        CardName::Queen,
        CardName::Ranger,
        CardName::Shepherd,
        CardName::Shopkeeper,
        CardName::Teacher,
        CardName::Undertaker,
        CardName::Wanderer,
        CardName::Wife,
        CardName::Woodcarver,
    ];

    /// Static data for this identity
    pub fn data(&self) -> CardData {
        use CardColor::*;
        use CardName::*;
        match self {
            // Prosperity constructions
            Castle => construction(Prosperity, cost_trp(2, 3, 3), 4, true, 2, &[King]),
            Palace => construction(Prosperity, cost_trp(2, 3, 3), 4, true, 2, &[Queen]),
            School => construction(Prosperity, cost_trp(2, 2, 0), 2, true, 2, &[Teacher]),
            Theatre => construction(Prosperity, cost_trp(3, 1, 1), 3, true, 2, &[Bard]),
            Evertree => CardData {
                houses_any: true,
                ..construction(Prosperity, cost_trp(3, 3, 3), 5, true, 2, NO_OCCUPANTS)
            },
            // Governance constructions
            Courthouse => {
                construction(Governance, cost_trp(1, 1, 2), 2, true, 2, &[Judge])
            }
            ClockTower => {
                construction(Governance, cost_trp(3, 0, 1), 0, true, 3, &[Historian])
            }
            Crane => construction(Governance, cost_trp(0, 0, 1), 1, true, 3, &[Architect]),
            Dungeon => construction(Governance, cost_trp(1, 0, 2), 0, true, 2, &[Ranger]),
            // Production constructions
            Farm => construction(Production, cost_trp(2, 1, 0), 1, false, 8, &[Husband, Wife]),
            ResinRefinery => {
                construction(Production, cost_trp(0, 1, 1), 1, false, 3, &[ChipSweep])
            }
            Mine => construction(Production, cost_trp(1, 1, 1), 2, false, 3, &[MinerMole]),
            TwigBarge => {
                construction(Production, cost_trp(1, 0, 1), 1, false, 3, &[BargeToad])
            }
            GeneralStore => {
                construction(Production, cost_trp(0, 1, 1), 1, false, 3, &[Shopkeeper])
            }
            Fairgrounds => {
                construction(Production, cost_trp(1, 2, 1), 3, true, 3, &[Fool])
            }
            Storehouse => CardData {
                creates_destination: true,
                ..construction(Production, cost_trp(1, 1, 1), 2, false, 3, &[Woodcarver])
            },
            // Traveler construction
            Ruins => construction(Traveler, ResourceMap::new(), 0, false, 3, &[Peddler]),
            // Destination constructions
            Inn => CardData {
                creates_destination: true,
                open_destination: true,
                ..construction(Destination, cost_trp(2, 1, 0), 2, false, 3, &[Innkeeper])
            },
            PostOffice => CardData {
                creates_destination: true,
                open_destination: true,
                ..construction(Destination, cost_trp(1, 2, 0), 2, false, 3, &[PostalPigeon])
            },
            Lookout => CardData {
                creates_destination: true,
                ..construction(Destination, cost_trp(1, 1, 1), 2, true, 2, &[Wanderer])
            },
            Monastery => CardData {
                creates_destination: true,
                ..construction(Destination, cost_trp(1, 1, 1), 1, true, 2, &[Monk])
            },
            Cemetery => CardData {
                creates_destination: true,
                ..construction(Destination, cost_trp(0, 0, 2), 0, true, 2, &[Undertaker])
            },
            University => CardData {
                creates_destination: true,
                ..construction(Destination, cost_trp(0, 1, 2), 3, true, 2, &[Doctor])
            },
            Chapel => CardData {
                creates_destination: true,
                ..construction(Destination, cost_trp(2, 1, 1), 2, true, 2, &[Shepherd])
            },
            // Production critters
            Husband => critter(Production, 3, 2, false, 4),
            BargeToad => critter(Production, 2, 1, false, 3),
            ChipSweep => critter(Production, 2, 1, false, 3),
            MinerMole => critter(Production, 3, 1, false, 3),
            Peddler => critter(Production, 2, 0, false, 3),
            Teacher => critter(Production, 2, 2, false, 3),
            Woodcarver => critter(Production, 2, 2, false, 3),
            Doctor => critter(Production, 4, 4, true, 2),
            Monk => critter(Production, 1, 0, true, 2),
            // Governance critters
            Historian => critter(Governance, 2, 1, true, 3),
            Shopkeeper => critter(Governance, 2, 1, true, 3),
            Judge => critter(Governance, 3, 2, true, 2),
            Innkeeper => critter(Governance, 1, 1, true, 3),
            // Traveler critters
            Wanderer => critter(Traveler, 2, 1, false, 3),
            Fool => critter(Traveler, 3, -2, true, 2),
            PostalPigeon => critter(Traveler, 2, 0, false, 3),
            Ranger => critter(Traveler, 2, 1, true, 2),
            Shepherd => critter(Traveler, 3, 1, true, 2),
            Undertaker => critter(Traveler, 2, 1, true, 2),
            Bard => critter(Traveler, 3, 0, true, 2),
            // Prosperity critters
            King => critter(Prosperity, 6, 4, true, 2),
            Queen => CardData {
                creates_destination: true,
                ..critter(Destination, 5, 4, true, 2)
            },
            Architect => critter(Prosperity, 4, 2, true, 2),
            Wife => critter(Prosperity, 2, 2, false, 4),
        }
    }

    pub fn kind(&self) -> CardKind {
        self.data().kind
    }

    pub fn color(&self) -> CardColor {
        self.data().color
    }

    pub fn is_unique(&self) -> bool {
        self.data().unique
    }

    pub fn cost(&self) -> ResourceMap {
        self.data().cost
    }

    pub fn base_points(&self) -> i8 {
        self.data().base_points
    }

    pub fn is_production(&self) -> bool {
        self.color() == CardColor::Production
    }

    /// Display name as printed on the card
    pub fn as_str(&self) -> &'static str {
        match self {
            CardName::Castle => "Castle",
            CardName::Cemetery => "Cemetery",
            CardName::Chapel => "Chapel",
            CardName::ClockTower => "Clock Tower",
            CardName::Courthouse => "Courthouse",
            CardName::Crane => "Crane",
            CardName::Dungeon => "Dungeon",
            CardName::Evertree => "Evertree",
            CardName::Fairgrounds => "Fairgrounds",
            CardName::Farm => "Farm",
            CardName::GeneralStore => "General Store",
            CardName::Inn => "Inn",
            CardName::Lookout => "Lookout",
            CardName::Mine => "Mine",
            CardName::Monastery => "Monastery",
            CardName::Palace => "Palace",
            CardName::PostOffice => "Post Office",
            CardName::ResinRefinery => "Resin Refinery",
            CardName::Ruins => "Ruins",
            CardName::School => "School",
            CardName::Storehouse => "Storehouse",
            CardName::Theatre => "Theatre",
            CardName::TwigBarge => "Twig Barge",
            CardName::University => "University",
            CardName::Architect => "Architect",
            CardName::Bard => "Bard",
            CardName::BargeToad => "Barge Toad",
            CardName::ChipSweep => "Chip Sweep",
            CardName::Doctor => "Doctor",
            CardName::Fool => "Fool",
            CardName::Historian => "Historian",
            CardName::Husband => "Husband",
            CardName::Innkeeper => "Innkeeper",
            CardName::Judge => "Judge",
            CardName::King => "King",
            CardName::MinerMole => "Miner Mole",
            CardName::Monk => "Monk",
            CardName::Peddler => "Peddler",
            CardName::PostalPigeon => "Postal Pigeon",
            CardName::Queen => "Queen",
            CardName::Ranger => "Ranger",
            CardName::Shepherd => "Shepherd",
            CardName::Shopkeeper => "Shopkeeper",
            CardName::Teacher => "Teacher",
            CardName::Undertaker => "Undertaker",
            CardName::Wanderer => "Wanderer",
            CardName::Wife => "Wife",
            CardName::Woodcarver => "Woodcarver",
        }
    }
}

impl fmt::Display for CardName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A card instance during gameplay
///
/// Identity-driven data lives in the `CardName::data()` table; this struct
/// carries only the state that mutates during a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Unique component id for this instance
    pub id: CardId,

    /// Card identity (drives effect dispatch)
    pub name: CardName,

    /// Current point value (mutable for a few effect types)
    pub points: i8,

    /// True once the cost has been deducted or waived (occupancy)
    pub paid: bool,

    /// Critter housed by this construction, if any
    pub occupant: Option<CardId>,

    /// Paired partner (husband/wife relationship), by id
    pub partner: Option<CardId>,

    /// Resources stashed on the card (storehouse-style)
    pub stored: ResourceMap,

    /// Point tokens sitting on the card (chapel, clock tower)
    pub tokens: u8,

    /// Companion location created when a destination card is played
    pub destination: Option<LocationId>,

    /// Critters locked in this card's cells (dungeon)
    pub imprisoned: SmallVec<[CardId; 2]>,
}

impl Card {
    pub fn new(id: CardId, name: CardName) -> Self {
        Card {
            id,
            name,
            points: name.base_points(),
            paid: false,
            occupant: None,
            partner: None,
            stored: ResourceMap::new(),
            // Clock Tower starts loaded with 3 point tokens
            tokens: if name == CardName::ClockTower { 3 } else { 0 },
            destination: None,
            imprisoned: SmallVec::new(),
        }
    }

    pub fn kind(&self) -> CardKind {
        self.name.kind()
    }

    pub fn color(&self) -> CardColor {
        self.name.color()
    }

    pub fn is_unique(&self) -> bool {
        self.name.is_unique()
    }

    pub fn is_construction(&self) -> bool {
        self.kind() == CardKind::Construction
    }

    pub fn is_production(&self) -> bool {
        self.name.is_production()
    }

    pub fn is_critter(&self) -> bool {
        self.kind() == CardKind::Critter
    }

    /// Whether this construction can house `critter` right now
    pub fn can_house(&self, critter: CardName) -> bool {
        if !self.is_construction() || self.occupant.is_some() {
            return false;
        }
        let data = self.name.data();
        if critter.kind() != CardKind::Critter {
            return false;
        }
        data.houses_any || data.occupants.contains(&critter)
    }

    /// Dungeon cell capacity: 1, or 2 once a Ranger shares the village
    pub fn cell_capacity(&self, ranger_in_village: bool) -> usize {
        if ranger_in_village {
            2
        } else {
            1
        }
    }
}

impl GameEntity for Card {
    type Id = CardId;

    fn id(&self) -> CardId {
        self.id
    }

    fn display_name(&self) -> &str {
        self.name.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_table_total() {
        // Every identity must resolve to data; deck counts are all nonzero
        for name in CardName::ALL {
            let data = name.data();
            assert!(data.deck_count > 0, "{name} has no deck count");
            match data.kind {
                CardKind::Critter => {
                    assert!(data.occupants.is_empty(), "{name}: critters house nothing")
                }
                CardKind::Construction => {
                    assert_eq!(data.cost.get(Resource::Berry), 0, "{name}: berry-costed construction")
                }
            }
        }
    }

    #[test]
    fn test_every_critter_has_a_home() {
        for name in CardName::ALL {
            if name.kind() != CardKind::Critter {
                continue;
            }
            let housed = CardName::ALL.iter().any(|c| {
                let d = c.data();
                d.kind == CardKind::Construction && (d.houses_any || d.occupants.contains(&name))
            });
            assert!(housed, "{name} has no construction that houses it");
        }
    }

    #[test]
    fn test_occupancy() {
        let farm = Card::new(CardId::new(1), CardName::Farm);
        assert!(farm.can_house(CardName::Husband));
        assert!(farm.can_house(CardName::Wife));
        assert!(!farm.can_house(CardName::King));

        let evertree = Card::new(CardId::new(2), CardName::Evertree);
        assert!(evertree.can_house(CardName::King));

        let mut occupied = farm.clone();
        occupied.occupant = Some(CardId::new(9));
        assert!(!occupied.can_house(CardName::Husband));
    }

    #[test]
    fn test_clock_tower_starts_loaded() {
        let tower = Card::new(CardId::new(3), CardName::ClockTower);
        assert_eq!(tower.tokens, 3);
        let farm = Card::new(CardId::new(4), CardName::Farm);
        assert_eq!(farm.tokens, 0);
    }
}
