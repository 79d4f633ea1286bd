//! Main game state structure
//!
//! The central structure holding all game information, designed to be
//! efficiently and exactly clonable for tree search. Entities live in
//! id-keyed arenas; every container (deck, hand, meadow, village, discard)
//! holds ids, so `Clone` copies the whole graph with no aliasing.

use crate::core::{
    Card, CardId, CardKind, CardName, EntityStore, Location, LocationId, PlayerId, ResourceMap,
    Season,
};
use crate::game::decision::PendingDecision;
use crate::game::logger::GameLogger;
use crate::game::setup::GameParameters;
use crate::{EverdellError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};

/// Per-player mutable state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,

    /// Current season (advances independently per player)
    pub season: Season,

    /// Workers available to place
    pub workers: u8,

    /// Total workers owned (grows at season advance)
    pub workers_total: u8,

    pub resources: ResourceMap,

    /// Point tokens gathered during play (journeys, effects)
    pub point_tokens: i32,

    /// Cards in hand (hidden from other players)
    pub hand: Vec<CardId>,

    /// Played cards, in play order
    pub village: Vec<CardId>,

    /// Basic events claimed by this player
    pub events_achieved: u8,

    /// Player has taken the end-of-game marker
    pub finished: bool,
}

impl PlayerState {
    pub fn new(id: PlayerId, name: String, starting_workers: u8) -> Self {
        PlayerState {
            id,
            name,
            season: Season::Winter,
            workers: starting_workers,
            workers_total: starting_workers,
            resources: ResourceMap::new(),
            point_tokens: 0,
            hand: Vec::new(),
            village: Vec::new(),
            events_achieved: 0,
            finished: false,
        }
    }
}

/// Observer perspective for state copies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observer {
    /// Full-information copy
    All,
    /// Information-hiding copy for one player's view
    Player(PlayerId),
}

/// Complete game state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// All card instances in the game
    pub cards: EntityStore<CardId, Card>,

    /// All registered worker locations (board + card companions)
    pub locations: EntityStore<LocationId, Location>,

    /// Ordered location registry, for deterministic iteration
    pub board: Vec<LocationId>,

    /// Face-down draw deck, top at the end
    pub deck: Vec<CardId>,

    /// Shared face-up meadow
    pub meadow: Vec<CardId>,

    /// Discard pile
    pub discard: Vec<CardId>,

    /// Transient working buffer for cards mid-chain (reveals, transfers).
    /// Empty whenever no decision is pending.
    pub revealed: Vec<CardId>,

    pub players: Vec<PlayerState>,

    /// Whose turn it is (decision steps may hand the move to others)
    pub current_player: PlayerId,

    /// In-flight decision steps; the last entry is active
    pub decisions: Vec<PendingDecision>,

    pub game_over: bool,

    /// Final scores, computed once at the end-of-game marker
    pub final_scores: Option<Vec<crate::game::scoring::PlayerScore>>,

    pub params: GameParameters,

    /// Main random stream, seeded at game start. Redeterminization uses a
    /// separate ChaCha12 and never touches this one.
    pub rng: ChaCha12Rng,

    /// Unified component id counter (cards and locations)
    next_component_id: u32,

    /// Centralized logger for game events
    pub logger: GameLogger,
}

impl GameState {
    /// Create an empty state shell; `setup::new_game` populates it
    pub(crate) fn empty(params: GameParameters, seed: u64) -> Self {
        let players = (0..params.player_count)
            .map(|i| {
                PlayerState::new(
                    PlayerId::new(i as u8),
                    format!("Player {}", i + 1),
                    params.starting_workers,
                )
            })
            .collect();
        GameState {
            cards: EntityStore::new(),
            locations: EntityStore::new(),
            board: Vec::new(),
            deck: Vec::new(),
            meadow: Vec::new(),
            discard: Vec::new(),
            revealed: Vec::new(),
            players,
            current_player: PlayerId::new(0),
            decisions: Vec::new(),
            game_over: false,
            final_scores: None,
            params,
            rng: ChaCha12Rng::seed_from_u64(seed),
            next_component_id: 0,
            logger: GameLogger::new(),
        }
    }

    // ---- identity layer ----

    pub fn next_card_id(&mut self) -> CardId {
        let id = CardId::new(self.next_component_id);
        self.next_component_id += 1;
        id
    }

    pub fn next_location_id(&mut self) -> LocationId {
        let id = LocationId::new(self.next_component_id);
        self.next_component_id += 1;
        id
    }

    pub fn card(&self, id: CardId) -> Result<&Card> {
        self.cards.get(id)
    }

    pub fn card_mut(&mut self, id: CardId) -> Result<&mut Card> {
        self.cards.get_mut(id)
    }

    pub fn location(&self, id: LocationId) -> Result<&Location> {
        self.locations.get(id)
    }

    pub fn location_mut(&mut self, id: LocationId) -> Result<&mut Location> {
        self.locations.get_mut(id)
    }

    /// Register a location at the end of the ordered board registry
    pub fn register_location(&mut self, location: Location) -> LocationId {
        let id = location.id;
        self.locations.insert(id, location);
        self.board.push(id);
        id
    }

    /// Unregister a destination location (its card left play). Any workers
    /// still on it go home first.
    pub fn unregister_location(&mut self, id: LocationId) -> Result<()> {
        let workers: Vec<PlayerId> = self.location(id)?.workers.to_vec();
        for player in workers {
            self.player_mut(player).workers += 1;
        }
        self.board.retain(|&l| l != id);
        self.locations
            .remove(id)
            .ok_or(EverdellError::ComponentNotFound(id.as_u32()))?;
        Ok(())
    }

    // ---- players ----

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> &PlayerState {
        &self.players[id.index()]
    }

    pub fn player_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.players[id.index()]
    }

    /// Player indices other than `player`, in seat order from them
    pub fn other_players(&self, player: PlayerId) -> Vec<PlayerId> {
        let n = self.player_count();
        let mut out = Vec::with_capacity(n - 1);
        let mut cur = player.next(n);
        while cur != player {
            out.push(cur);
            cur = cur.next(n);
        }
        out
    }

    /// Whose choice the forward model is waiting for
    pub fn player_to_move(&self) -> PlayerId {
        match self.decisions.last() {
            Some(d) => d.player,
            None => self.current_player,
        }
    }

    pub fn is_decision_pending(&self) -> bool {
        !self.decisions.is_empty()
    }

    /// Push a decision step unless it is vacuous (nothing to choose from).
    /// Skipping a vacuous step is the empty-enumeration rule: the branch
    /// simply does not exist, and the chain moves on without it.
    pub(crate) fn push_decision(&mut self, decision: PendingDecision) {
        use crate::game::decision::DecisionKind;
        let vacuous = match &decision.kind {
            DecisionKind::ChoosePlayer { eligible } => eligible.is_empty(),
            DecisionKind::ChooseLocation { eligible, .. } => eligible.is_empty(),
            _ => false,
        };
        if !vacuous {
            self.decisions.push(decision);
        }
    }

    // ---- deck / meadow / discard ----

    pub fn shuffle_deck(&mut self) {
        let mut deck = std::mem::take(&mut self.deck);
        deck.shuffle(&mut self.rng);
        self.deck = deck;
    }

    /// Pop the top of the deck, reshuffling the discard pile in when the
    /// deck runs dry
    pub fn draw_from_deck(&mut self) -> Option<CardId> {
        if self.deck.is_empty() && !self.discard.is_empty() {
            self.deck = std::mem::take(&mut self.discard);
            self.shuffle_deck();
        }
        self.deck.pop()
    }

    /// Draw up to `n` cards to a player's hand, stopping at the hand limit.
    /// Returns how many were actually drawn.
    pub fn draw_to_hand(&mut self, player: PlayerId, n: u8) -> u8 {
        let mut drawn = 0;
        for _ in 0..n {
            if self.player(player).hand.len() >= self.params.hand_limit as usize {
                break;
            }
            match self.draw_from_deck() {
                Some(card) => {
                    self.player_mut(player).hand.push(card);
                    drawn += 1;
                }
                None => break,
            }
        }
        drawn
    }

    /// Top the meadow back up to its configured size
    pub fn refill_meadow(&mut self) {
        while self.meadow.len() < self.params.meadow_size as usize {
            match self.draw_from_deck() {
                Some(card) => self.meadow.push(card),
                None => break,
            }
        }
    }

    /// Move a card to the discard pile, resetting its per-play state.
    /// The caller is responsible for removing it from its old container.
    pub fn discard_card(&mut self, card_id: CardId) -> Result<()> {
        // Break a pairing from the other side before resetting this card
        let partner = self.card(card_id)?.partner;
        if let Some(partner_id) = partner {
            if let Ok(partner) = self.card_mut(partner_id) {
                partner.partner = None;
            }
        }
        let prisoners: Vec<CardId> = {
            let card = self.card_mut(card_id)?;
            let prisoners = card.imprisoned.to_vec();
            let name = card.name;
            *card = Card::new(card.id, name);
            prisoners
        };
        // A discarded dungeon releases its prisoners to the discard pile
        for prisoner in prisoners {
            self.discard_card(prisoner)?;
        }
        self.discard.push(card_id);
        Ok(())
    }

    // ---- village queries ----

    /// Number of village slots in use: wanderers are free, and a paired
    /// husband/wife couple shares one slot
    pub fn village_size(&self, player: PlayerId) -> usize {
        let mut size = 0usize;
        let mut pairs = 0usize;
        for &card_id in &self.player(player).village {
            if let Ok(card) = self.card(card_id) {
                if card.name == CardName::Wanderer {
                    continue;
                }
                if card.name == CardName::Wife && card.partner.is_some() {
                    pairs += 1;
                }
                size += 1;
            }
        }
        size - pairs
    }

    /// Whether a card of `name` would fit in the player's village
    pub fn fits_in_village(&self, player: PlayerId, name: CardName) -> bool {
        if name == CardName::Wanderer {
            return true;
        }
        if name == CardName::Husband && self.find_unpaired(player, CardName::Wife).is_some() {
            return true;
        }
        if name == CardName::Wife && self.find_unpaired(player, CardName::Husband).is_some() {
            return true;
        }
        self.village_size(player) < self.params.village_limit as usize
    }

    /// First village card of `name`, if any
    pub fn find_in_village(&self, player: PlayerId, name: CardName) -> Option<CardId> {
        self.player(player)
            .village
            .iter()
            .copied()
            .find(|&id| self.card(id).map(|c| c.name == name).unwrap_or(false))
    }

    pub fn village_has(&self, player: PlayerId, name: CardName) -> bool {
        self.find_in_village(player, name).is_some()
    }

    /// First unpaired card of `name` in the village (pairing search)
    pub fn find_unpaired(&self, player: PlayerId, name: CardName) -> Option<CardId> {
        self.player(player).village.iter().copied().find(|&id| {
            self.card(id)
                .map(|c| c.name == name && c.partner.is_none())
                .unwrap_or(false)
        })
    }

    /// Count village cards of a color (governance gates, basic events)
    pub fn count_color(&self, player: PlayerId, color: crate::core::CardColor) -> usize {
        self.player(player)
            .village
            .iter()
            .filter(|&&id| self.card(id).map(|c| c.color() == color).unwrap_or(false))
            .count()
    }

    /// Whether playing `name` would violate the uniqueness rule
    pub fn unique_blocked(&self, player: PlayerId, name: CardName) -> bool {
        name.is_unique() && self.village_has(player, name)
    }

    /// Remove a card from a player's village, unhooking occupancy links,
    /// pairings, and any companion destination location
    pub fn remove_from_village(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        let pos = self
            .player(player)
            .village
            .iter()
            .position(|&id| id == card_id)
            .ok_or_else(|| {
                EverdellError::InvalidAction(format!("card {card_id} is not in {player}'s village"))
            })?;
        self.player_mut(player).village.remove(pos);

        // Pairing is a village relationship; leaving the village breaks it
        let partner = self.card(card_id)?.partner;
        if let Some(partner_id) = partner {
            self.card_mut(card_id)?.partner = None;
            if let Ok(partner) = self.card_mut(partner_id) {
                partner.partner = None;
            }
        }

        let destination = self.card(card_id)?.destination;
        if let Some(loc) = destination {
            self.unregister_location(loc)?;
            self.card_mut(card_id)?.destination = None;
        }

        // If a construction leaves, its lodger stays in the village but the
        // occupancy link dissolves; if a critter leaves, free its home.
        let occupant = self.card(card_id)?.occupant;
        if occupant.is_some() {
            self.card_mut(card_id)?.occupant = None;
        }
        if self.card(card_id)?.kind() == CardKind::Critter {
            let village: Vec<CardId> = self.player(player).village.clone();
            for home_id in village {
                let home = self.card_mut(home_id)?;
                if home.occupant == Some(card_id) {
                    home.occupant = None;
                }
            }
        }
        Ok(())
    }

    // ---- copies ----

    /// Copy the state from an observer's perspective.
    ///
    /// `Observer::All` is an exact copy. `Observer::Player(p)` hides what
    /// `p` cannot see: all other hands and the face-down deck are pooled,
    /// reshuffled with an independent random source seeded by
    /// `redeterminize_seed`, and redealt with the original hand sizes.
    /// The main random stream is never consumed.
    pub fn observer_copy(&self, observer: Observer, redeterminize_seed: u64) -> GameState {
        let mut copy = self.clone();
        let hidden_from = match observer {
            Observer::All => return copy,
            Observer::Player(p) => p,
        };

        let mut pool: Vec<CardId> = Vec::new();
        let mut hand_sizes: Vec<(PlayerId, usize)> = Vec::new();
        for player in &mut copy.players {
            if player.id == hidden_from {
                continue;
            }
            hand_sizes.push((player.id, player.hand.len()));
            pool.append(&mut player.hand);
        }
        pool.append(&mut copy.deck);

        let mut redet_rng = ChaCha12Rng::seed_from_u64(redeterminize_seed);
        pool.shuffle(&mut redet_rng);

        for (player_id, size) in hand_sizes {
            let hand: Vec<CardId> = pool.split_off(pool.len() - size);
            copy.players[player_id.index()].hand = hand;
        }
        copy.deck = pool;
        copy
    }
}
