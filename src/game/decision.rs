//! Decision steps: the suspendable, enumerable, resumable units of the
//! action-resolution chain
//!
//! Any card or location effect that needs externally supplied information
//! (which resources, which cards, which player, which location) pushes a
//! `PendingDecision` onto the state's decision stack and suspends. While a
//! decision is pending, the forward model enumerates its finite choice set
//! (purely and deterministically); applying a choice runs the decision's
//! continuation, which either finalizes the owning effect or pushes the
//! next step of the chain.
//!
//! Continuations are plain data carried in the state (no closures, no
//! global queues), so the whole in-flight chain clones with the state.

use crate::core::{CardId, CardKind, LocationId, PlayerId, Resource, ResourceMap};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// What triggered the pending decision, by id (never a live reference)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectSource {
    Card(CardId),
    Location(LocationId),
    /// Season-advance bookkeeping (summer draw, clock tower window)
    Season,
}

/// Which resource kinds a selection may draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceFilter {
    Any,
    Only(Resource),
    NonBerry,
}

impl ResourceFilter {
    pub fn allows(&self, kind: Resource) -> bool {
        match self {
            ResourceFilter::Any => true,
            ResourceFilter::Only(r) => *r == kind,
            ResourceFilter::NonBerry => kind != Resource::Berry,
        }
    }
}

/// Where a card selection draws its candidates from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardPool {
    /// The deciding player's hand
    Hand,
    /// The shared face-up meadow
    Meadow,
    /// Cards revealed mid-chain; ids frozen into the continuation
    Revealed(SmallVec<[CardId; 4]>),
    /// The deciding player's village
    OwnVillage,
    /// Every other player's village
    OtherVillages,
    /// Hand plus meadow (free-play pickers)
    HandAndMeadow,
    /// Meadow cards playable by the deciding player at a flat discount
    MeadowPlayable { discount: u8 },
}

/// Candidate filter applied after pool resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardFilter {
    Any,
    Kind(CardKind),
    /// Production cards whose effect can be re-activated
    ActivatableProduction,
    /// Critters not locked in a dungeon cell
    UnimprisonedCritters,
    /// Base point value at most this
    MaxPoints(i8),
    /// Playable for free by the deciding player (space + uniqueness)
    PlayableFree,
    /// PlayableFree with a point-value ceiling
    PlayableFreeMaxPoints(i8),
}

/// The externally supplied input a pending decision needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DecisionKind {
    /// Select a resource multiset up to `max`
    ///
    /// `strict` demands exactly `max` (or as many as scarcity allows);
    /// non-strict admits any size up to `max`. `from_owned` caps each kind
    /// by the deciding player's pool (spending); gains are uncapped.
    ChooseResources {
        max: u8,
        strict: bool,
        from_owned: bool,
        allowed: ResourceFilter,
    },
    /// Pick one of a few fixed resource bundles
    ChooseBundle { options: SmallVec<[ResourceMap; 4]> },
    /// Select a card subset from a pool
    ChooseCards {
        pool: CardPool,
        filter: CardFilter,
        count: u8,
        strict: bool,
    },
    ChoosePlayer { eligible: SmallVec<[PlayerId; 3]> },
    ChooseLocation {
        eligible: SmallVec<[LocationId; 8]>,
        optional: bool,
    },
}

impl DecisionKind {
    /// Input category, for the presentation layer's prompt
    pub fn input(&self) -> DecisionInput {
        match self {
            DecisionKind::ChooseResources { .. } | DecisionKind::ChooseBundle { .. } => {
                DecisionInput::Resources
            }
            DecisionKind::ChooseCards { .. } => DecisionInput::Cards,
            DecisionKind::ChoosePlayer { .. } => DecisionInput::Player,
            DecisionKind::ChooseLocation { .. } => DecisionInput::Location,
        }
    }
}

/// Coarse input category exposed to rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionInput {
    Resources,
    Cards,
    Player,
    Location,
}

/// Completion logic for a decision, as data
///
/// This is the per-identity dispatch table of the chain shapes: each
/// variant names the effect segment that consumes the choice, carrying any
/// context accumulated by earlier steps of the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Continuation {
    // Shared finalizers
    /// Add the chosen resources to the deciding player's pool
    GainChosen,
    /// Move the chosen meadow cards into the deciding player's hand
    DrawChosenToHand,
    /// Discard chosen hand cards, then choose gained resources at a rate
    DiscardForResources {
        resources_per_card: u8,
        cards_per_resource: u8,
    },
    /// Resolve the chosen location's effect in place (lookout, forest copy)
    CopyLocation,

    // Card chains
    /// Bard: one point per discarded card
    BardDiscard,
    /// Doctor / Woodcarver: pay resources for a point each
    PayForPoints,
    /// Monk step 1: berries chosen, pick the receiving player next
    MonkGive,
    /// Monk step 2: hand over the berries, two points each
    MonkDeliver { berries: u8 },
    /// Peddler step 1: remember the lose-set, pick the gain-set next
    PeddlerPay,
    /// Peddler step 2: deduct and add together, atomically
    PeddlerGain { paid: ResourceMap },
    /// Teacher step 1: keep one of the two drawn cards
    TeacherKeep { drawn: SmallVec<[CardId; 4]> },
    /// Teacher step 2: give the other drawn card away
    TeacherGive { card: CardId },
    /// Fool lands in the chosen player's village
    FoolPlace { card: CardId },
    /// Postal Pigeon: play at most one revealed card, discard the rest
    PostalPigeonPlay { revealed: SmallVec<[CardId; 4]> },
    /// Chip Sweep / Miner Mole: re-fire the chosen production card
    ActivateProduction,
    /// Ranger step 1: which placed worker to move
    RangerFrom,
    /// Ranger step 2: where it goes
    RangerTo { from: LocationId },
    /// Undertaker step 1: three meadow cards out
    UndertakerDiscard,
    /// Undertaker step 2: one refreshed meadow card to hand
    UndertakerTake,
    /// Ruins / University: discard a village card and salvage its cost
    Salvage { refund_bonus_points: u8, draw: u8 },
    /// University step 2: the extra any-resource after the refund
    SalvageBonus,
    /// Storehouse: stash the chosen bundle on the card
    StorehouseStash,
    /// Dungeon payment: imprison the chosen critter, then finish the play
    DungeonImprison { card: CardId, from_meadow: bool },

    // Destination chains
    /// Inn: play the chosen meadow card at a discount
    InnPlay { discount: u8 },
    /// Post Office step 1: who receives the two cards
    PostOfficeTarget,
    /// Post Office step 2: hand the two cards over
    PostOfficeGive { target: PlayerId },
    /// Post Office step 3: discard any number, then refill to hand limit
    PostOfficeDiscard,
    /// Monastery step 1: which two resources to give
    MonasteryGive,
    /// Monastery step 2: the recipient; four points follow
    MonasteryDeliver { given: ResourceMap },
    /// Cemetery: play one of the revealed cards for free
    CemeteryPlay { revealed: SmallVec<[CardId; 4]> },
    /// Queen: play the chosen card (hand or meadow, low value) for free
    QueenPlay,
    /// Journey: discard the cards, bank the points
    JourneyDiscard { points: u8 },

    // Season bookkeeping
    /// Clock Tower window at season advance; recall + production follow
    /// whether or not a location was activated
    ClockTowerThenFinish,
}

/// A suspended decision step, stored on the game state's decision stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDecision {
    /// Who supplies the choice
    pub player: PlayerId,
    /// What triggered the decision, by stored id
    pub source: EffectSource,
    /// The input being requested and its enumeration parameters
    pub kind: DecisionKind,
    /// What happens with the answer
    pub continuation: Continuation,
}

/// Enumerate resource multisets of bounded size
///
/// `caps` holds the per-kind ceiling (ownership for spends, `max` for
/// gains; zero for disallowed kinds). Strict mode yields only multisets of
/// size `min(max, sum(caps))` - the scarcity rule; non-strict yields every
/// size from zero up to `max`. Order is lexicographic in declared resource
/// order, so enumeration is deterministic.
pub fn resource_selections(max: u8, strict: bool, caps: ResourceMap) -> Vec<ResourceMap> {
    let target = if strict {
        Some((max as u32).min(caps.total()) as u8)
    } else {
        None
    };
    let mut out = Vec::new();
    let mut current = ResourceMap::new();
    enumerate_kinds(0, max, target, &caps, &mut current, &mut out);
    out
}

fn enumerate_kinds(
    slot: usize,
    budget: u8,
    target: Option<u8>,
    caps: &ResourceMap,
    current: &mut ResourceMap,
    out: &mut Vec<ResourceMap>,
) {
    if slot == Resource::ALL.len() {
        if let Some(t) = target {
            if current.total() != t as u32 {
                return;
            }
        }
        out.push(*current);
        return;
    }
    let kind = Resource::ALL[slot];
    let cap = caps.get(kind).min(budget);
    for take in 0..=cap {
        current.set(kind, take);
        enumerate_kinds(slot + 1, budget - take, target, caps, current, out);
    }
    current.set(kind, 0);
}

/// Enumerate card subsets of a candidate list
///
/// Strict mode yields subsets of size `min(count, candidates.len())`;
/// non-strict yields every size from zero through `count`. Candidates are
/// combined in list order, so enumeration is deterministic.
pub fn card_subsets(
    candidates: &[CardId],
    count: u8,
    strict: bool,
) -> Vec<SmallVec<[CardId; 4]>> {
    let max = (count as usize).min(candidates.len());
    let sizes: Vec<usize> = if strict {
        vec![max]
    } else {
        (0..=max).collect()
    };
    let mut out = Vec::new();
    for size in sizes {
        let mut picked: SmallVec<[CardId; 4]> = SmallVec::new();
        combine(candidates, 0, size, &mut picked, &mut out);
    }
    out
}

fn combine(
    candidates: &[CardId],
    start: usize,
    remaining: usize,
    picked: &mut SmallVec<[CardId; 4]>,
    out: &mut Vec<SmallVec<[CardId; 4]>>,
) {
    if remaining == 0 {
        out.push(picked.clone());
        return;
    }
    // Not enough candidates left to fill the subset
    for i in start..=candidates.len().saturating_sub(remaining) {
        picked.push(candidates[i]);
        combine(candidates, i + 1, remaining - 1, picked, out);
        picked.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(twig: u8, resin: u8, pebble: u8, berry: u8) -> ResourceMap {
        ResourceMap::new()
            .with(Resource::Twig, twig)
            .with(Resource::Resin, resin)
            .with(Resource::Pebble, pebble)
            .with(Resource::Berry, berry)
    }

    #[test]
    fn test_strict_selection_exact_size() {
        let opts = resource_selections(2, true, caps(3, 3, 0, 0));
        assert!(!opts.is_empty());
        assert!(opts.iter().all(|m| m.total() == 2));
        // 2 twig, 1+1, 2 resin
        assert_eq!(opts.len(), 3);
    }

    #[test]
    fn test_strict_selection_scarcity() {
        // Only one twig owned: strict "take 3" degrades to "take 1"
        let opts = resource_selections(3, true, caps(1, 0, 0, 0));
        assert_eq!(opts.len(), 1);
        assert_eq!(opts[0].total(), 1);
    }

    #[test]
    fn test_non_strict_includes_empty() {
        let opts = resource_selections(2, false, caps(1, 1, 0, 0));
        assert!(opts.contains(&ResourceMap::new()));
        assert!(opts.iter().all(|m| m.total() <= 2));
        // {}, 1t, 1r, 1t1r
        assert_eq!(opts.len(), 4);
    }

    #[test]
    fn test_gain_selection_not_capped_by_ownership() {
        // Gains pass max as the per-kind cap
        let opts = resource_selections(2, true, caps(2, 2, 2, 2));
        assert!(opts.iter().all(|m| m.total() == 2));
        // Multisets of size 2 over 4 kinds: C(5,3) = 10
        assert_eq!(opts.len(), 10);
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        let a = resource_selections(3, false, caps(2, 1, 1, 2));
        let b = resource_selections(3, false, caps(2, 1, 1, 2));
        assert_eq!(a, b);
    }

    #[test]
    fn test_card_subsets_strict() {
        let cards: Vec<CardId> = (0..4).map(CardId::new).collect();
        let subsets = card_subsets(&cards, 2, true);
        assert_eq!(subsets.len(), 6);
        assert!(subsets.iter().all(|s| s.len() == 2));
    }

    #[test]
    fn test_card_subsets_non_strict() {
        let cards: Vec<CardId> = (0..3).map(CardId::new).collect();
        let subsets = card_subsets(&cards, 2, false);
        // C(3,0) + C(3,1) + C(3,2) = 1 + 3 + 3
        assert_eq!(subsets.len(), 7);
    }

    #[test]
    fn test_card_subsets_scarcity() {
        let cards: Vec<CardId> = (0..2).map(CardId::new).collect();
        let subsets = card_subsets(&cards, 5, true);
        assert_eq!(subsets.len(), 1);
        assert_eq!(subsets[0].len(), 2);
    }
}
