//! Strongly-typed wrappers for game concepts
//!
//! Newtypes and small closed enums used throughout the engine. Keeping
//! these distinct prevents mixing up player indices, resource kinds, and
//! seasons in the forward model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Player index (0-based seat order)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PlayerId(u8);

impl PlayerId {
    pub const fn new(index: u8) -> Self {
        PlayerId(index)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Next seat in turn order
    pub fn next(&self, player_count: usize) -> PlayerId {
        PlayerId(((self.0 as usize + 1) % player_count) as u8)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// The four seasons, cyclic for a player from Winter to Autumn (no wrap)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn next(&self) -> Option<Season> {
        match self {
            Season::Winter => Some(Season::Spring),
            Season::Spring => Some(Season::Summer),
            Season::Summer => Some(Season::Autumn),
            Season::Autumn => None,
        }
    }

    /// Workers gained when advancing INTO this season
    pub fn worker_gain(&self) -> u8 {
        match self {
            Season::Winter => 0,
            Season::Spring => 1,
            Season::Summer => 1,
            Season::Autumn => 2,
        }
    }

    /// Spring and Autumn advances broadcast a production event
    pub fn triggers_production(&self) -> bool {
        matches!(self, Season::Spring | Season::Autumn)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
        };
        write!(f, "{s}")
    }
}

/// The four resource kinds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Resource {
    Twig,
    Resin,
    Pebble,
    Berry,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Twig,
        Resource::Resin,
        Resource::Pebble,
        Resource::Berry,
    ];

    fn slot(&self) -> usize {
        match self {
            Resource::Twig => 0,
            Resource::Resin => 1,
            Resource::Pebble => 2,
            Resource::Berry => 3,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resource::Twig => "twig",
            Resource::Resin => "resin",
            Resource::Pebble => "pebble",
            Resource::Berry => "berry",
        };
        write!(f, "{s}")
    }
}

/// A multiset of resources (costs, pools, gains)
///
/// Counters are non-negative by construction; `sub` refuses to underflow
/// rather than saturating silently.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct ResourceMap([u8; 4]);

impl ResourceMap {
    pub fn new() -> Self {
        ResourceMap([0; 4])
    }

    pub fn with(mut self, kind: Resource, amount: u8) -> Self {
        self.0[kind.slot()] = amount;
        self
    }

    pub fn single(kind: Resource, amount: u8) -> Self {
        ResourceMap::new().with(kind, amount)
    }

    pub fn get(&self, kind: Resource) -> u8 {
        self.0[kind.slot()]
    }

    pub fn set(&mut self, kind: Resource, amount: u8) {
        self.0[kind.slot()] = amount;
    }

    pub fn add(&mut self, kind: Resource, amount: u8) {
        self.0[kind.slot()] = self.0[kind.slot()].saturating_add(amount);
    }

    /// Remove `amount` of `kind`; false (and no change) if not enough held
    pub fn sub(&mut self, kind: Resource, amount: u8) -> bool {
        if self.0[kind.slot()] < amount {
            return false;
        }
        self.0[kind.slot()] -= amount;
        true
    }

    /// True if every kind in `cost` is covered by this map
    pub fn covers(&self, cost: &ResourceMap) -> bool {
        Resource::ALL.iter().all(|&r| self.get(r) >= cost.get(r))
    }

    /// Deduct an entire map at once; false (and no change) if not covered
    pub fn pay(&mut self, cost: &ResourceMap) -> bool {
        if !self.covers(cost) {
            return false;
        }
        for r in Resource::ALL {
            self.0[r.slot()] -= cost.get(r);
        }
        true
    }

    pub fn total(&self) -> u32 {
        self.0.iter().map(|&v| v as u32).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, u8)> + '_ {
        Resource::ALL
            .iter()
            .map(move |&r| (r, self.get(r)))
            .filter(|&(_, v)| v > 0)
    }

    /// Reduce this cost by up to `discount` units, cutting shortfalls
    /// against `pool` first and the remainder in declared resource
    /// order. Used for flat play discounts; the result is payable from
    /// `pool` whenever any assignment of the discount would be.
    pub fn discounted_toward(&self, pool: &ResourceMap, discount: u8) -> ResourceMap {
        let mut out = *self;
        let mut remaining = discount;
        for r in Resource::ALL {
            if remaining == 0 {
                break;
            }
            let shortfall = out.get(r).saturating_sub(pool.get(r));
            let cut = shortfall.min(remaining);
            out.0[r.slot()] -= cut;
            remaining -= cut;
        }
        for r in Resource::ALL {
            if remaining == 0 {
                break;
            }
            let cut = out.get(r).min(remaining);
            out.0[r.slot()] -= cut;
            remaining -= cut;
        }
        out
    }
}

impl Add for ResourceMap {
    type Output = ResourceMap;

    fn add(mut self, rhs: ResourceMap) -> ResourceMap {
        self += rhs;
        self
    }
}

impl AddAssign for ResourceMap {
    fn add_assign(&mut self, rhs: ResourceMap) {
        for r in Resource::ALL {
            self.add(r, rhs.get(r));
        }
    }
}

impl fmt::Display for ResourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "nothing");
        }
        let mut first = true;
        for (r, v) in self.iter() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{v}{r}")?;
            first = false;
        }
        Ok(())
    }
}

/// Card color category, each with its own scoring/trigger semantics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CardColor {
    /// Green: fires on play and on every production event
    Production,
    /// Blue: passive triggered effects
    Governance,
    /// Purple: end-of-game bonus scoring
    Prosperity,
    /// Red: owns a companion location workers can visit
    Destination,
    /// Tan: one-shot effect on play
    Traveler,
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CardColor::Production => "production",
            CardColor::Governance => "governance",
            CardColor::Prosperity => "prosperity",
            CardColor::Destination => "destination",
            CardColor::Traveler => "traveler",
        };
        write!(f, "{s}")
    }
}

/// Primary card split
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum CardKind {
    /// Built from twig/resin/pebble; may house a critter
    Construction,
    /// Paid in berries; may occupy a matching construction for free
    Critter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_map_pay() {
        let mut pool = ResourceMap::new().with(Resource::Twig, 3).with(Resource::Berry, 1);
        let cost = ResourceMap::new().with(Resource::Twig, 2);

        assert!(pool.covers(&cost));
        assert!(pool.pay(&cost));
        assert_eq!(pool.get(Resource::Twig), 1);

        // Underpaying leaves the pool untouched
        let big = ResourceMap::single(Resource::Pebble, 1);
        assert!(!pool.pay(&big));
        assert_eq!(pool.total(), 2);
    }

    #[test]
    fn test_discount_cuts_shortfalls_first() {
        // Castle cost against a pool that only works if the discount
        // lands on the resin and pebble shortfalls
        let cost = ResourceMap::new()
            .with(Resource::Twig, 2)
            .with(Resource::Resin, 3)
            .with(Resource::Pebble, 3);
        let pool = ResourceMap::new()
            .with(Resource::Twig, 3)
            .with(Resource::Resin, 3)
            .with(Resource::Pebble, 1);
        let cut = cost.discounted_toward(&pool, 3);
        assert!(pool.covers(&cut));
        assert_eq!(cut.total(), 5);

        // With no shortfall the cut falls in declared kind order
        let rich = ResourceMap::new()
            .with(Resource::Twig, 5)
            .with(Resource::Resin, 5)
            .with(Resource::Pebble, 5);
        let cheap = cost.discounted_toward(&rich, 3);
        assert_eq!(cheap.get(Resource::Twig), 0);
        assert_eq!(cheap.get(Resource::Resin), 2);
        assert_eq!(cheap.get(Resource::Pebble), 3);

        // Discount larger than the cost never refunds
        assert!(cost.discounted_toward(&pool, 10).is_empty());
    }

    #[test]
    fn test_season_progression() {
        assert_eq!(Season::Winter.next(), Some(Season::Spring));
        assert_eq!(Season::Autumn.next(), None);
        assert_eq!(Season::Autumn.worker_gain(), 2);
        assert!(Season::Spring.triggers_production());
        assert!(!Season::Summer.triggers_production());
    }
}
