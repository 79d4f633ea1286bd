//! The forward model's action surface: enumeration and application
//!
//! `legal_actions` is pure and deterministic; `apply` validates by
//! membership in the enumeration before mutating anything, so an illegal
//! action is rejected with no partial state change. While a decision step
//! is pending, the action set comes from the step's own enumeration;
//! otherwise it is the current player's top-level menu.

use crate::core::{
    CardId, CardKind, CardName, LocationId, LocationKind, PlayerId, Resource, ResourceMap, Season,
};
use crate::game::decision::{
    card_subsets, resource_selections, CardFilter, CardPool, Continuation, DecisionKind,
    EffectSource, PendingDecision,
};
use crate::game::state::GameState;
use crate::log_if_verbose;
use crate::{EverdellError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Which zone a card is played from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardZone {
    Hand,
    Meadow,
}

/// How a card play is paid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payment {
    /// Printed cost from the player's pool (one-resource substitution
    /// allowed with a Judge in the village)
    Resources,
    /// Critter moves into a matching unoccupied construction for free
    Occupancy,
    /// Construction at a discount of 3; the Crane is then discarded
    Crane,
    /// Critter at a discount of 3; the Innkeeper is then discarded
    Innkeeper,
    /// Any card at a discount of 3 after imprisoning a village critter
    Dungeon,
}

/// One externally chosen step of the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    PlayCard {
        card: CardId,
        source: CardZone,
        payment: Payment,
    },
    PlaceWorker {
        location: LocationId,
    },
    /// Advance the current player to their next season
    AdvanceSeason,
    /// Take the end-of-game marker (Autumn only)
    EndGame,
    // Answers to pending decision steps
    ChooseResources(ResourceMap),
    ChooseCards(SmallVec<[CardId; 4]>),
    ChoosePlayer(PlayerId),
    ChooseLocation(LocationId),
    /// Pass on an optional decision
    Decline,
}

impl GameState {
    /// Every action legal right now, in deterministic order
    pub fn legal_actions(&self) -> Vec<Action> {
        if self.game_over {
            return Vec::new();
        }
        if let Some(decision) = self.decisions.last() {
            return self.decision_actions(decision);
        }
        let player = self.current_player;
        let mut actions = Vec::new();
        self.play_card_actions(player, &mut actions);
        if self.player(player).workers > 0 {
            for &loc_id in &self.board {
                if let Ok(loc) = self.location(loc_id) {
                    if self.worker_placement_legal(player, loc_id) && loc.is_free_for(player) {
                        actions.push(Action::PlaceWorker { location: loc_id });
                    }
                }
            }
        }
        // Resting is open at zero workers; a player with no other move at
        // all may also rest early so the game cannot deadlock
        if self.player(player).workers == 0 || actions.is_empty() {
            match self.player(player).season {
                Season::Autumn => actions.push(Action::EndGame),
                _ => actions.push(Action::AdvanceSeason),
            }
        }
        actions
    }

    /// Apply one action, possibly pushing further decision steps.
    ///
    /// Illegal actions yield `Err(InvalidAction)` with no state change.
    /// When the decision stack empties, the turn passes to the next
    /// unfinished player.
    pub fn apply(&mut self, action: &Action) -> Result<()> {
        if self.game_over {
            return Err(EverdellError::InvalidAction(
                "the game is over".to_string(),
            ));
        }
        if !self.legal_actions().contains(action) {
            return Err(EverdellError::InvalidAction(format!(
                "{action:?} is not legal for {}",
                self.player_to_move()
            )));
        }

        if let Some(decision) = self.decisions.pop() {
            self.resolve_decision(decision, action)?;
        } else {
            let player = self.current_player;
            match action {
                Action::PlayCard {
                    card,
                    source,
                    payment,
                } => self.execute_play_card(player, *card, *source, *payment)?,
                Action::PlaceWorker { location } => self.execute_place_worker(player, *location)?,
                Action::AdvanceSeason => self.execute_advance_season(player)?,
                Action::EndGame => self.execute_end_game(player)?,
                _ => {
                    return Err(EverdellError::InvalidAction(format!(
                        "{action:?} answers no pending decision"
                    )))
                }
            }
        }

        if !self.game_over && self.decisions.is_empty() {
            self.advance_turn();
        }
        Ok(())
    }

    // ---- enumeration ----

    fn decision_actions(&self, decision: &PendingDecision) -> Vec<Action> {
        match &decision.kind {
            DecisionKind::ChooseResources {
                max,
                strict,
                from_owned,
                allowed,
            } => {
                let mut caps = ResourceMap::new();
                for kind in Resource::ALL {
                    if allowed.allows(kind) {
                        let cap = if *from_owned {
                            self.player(decision.player).resources.get(kind)
                        } else {
                            *max
                        };
                        caps.set(kind, cap);
                    }
                }
                resource_selections(*max, *strict, caps)
                    .into_iter()
                    .map(Action::ChooseResources)
                    .collect()
            }
            DecisionKind::ChooseBundle { options } => options
                .iter()
                .map(|bundle| Action::ChooseResources(*bundle))
                .collect(),
            DecisionKind::ChooseCards {
                pool,
                filter,
                count,
                strict,
            } => {
                let candidates = self.resolve_card_pool(decision.player, decision.source, pool, *filter);
                card_subsets(&candidates, *count, *strict)
                    .into_iter()
                    .map(Action::ChooseCards)
                    .collect()
            }
            DecisionKind::ChoosePlayer { eligible } => {
                eligible.iter().map(|&p| Action::ChoosePlayer(p)).collect()
            }
            DecisionKind::ChooseLocation { eligible, optional } => {
                let mut out: Vec<Action> = eligible
                    .iter()
                    .filter(|&&id| self.locations.contains(id))
                    .map(|&id| Action::ChooseLocation(id))
                    .collect();
                // Declining is always possible on optional steps, and on a
                // step whose frozen candidates have all disappeared
                if *optional || out.is_empty() {
                    out.push(Action::Decline);
                }
                out
            }
        }
    }

    fn play_card_actions(&self, player: PlayerId, out: &mut Vec<Action>) {
        let zones: [(CardZone, &[CardId]); 2] = [
            (CardZone::Hand, &self.player(player).hand),
            (CardZone::Meadow, &self.meadow),
        ];
        for (zone, cards) in zones {
            for &card_id in cards {
                let name = match self.card(card_id) {
                    Ok(card) => card.name,
                    Err(_) => continue,
                };
                if !self.play_target_legal(player, name) {
                    continue;
                }
                for payment in self.payment_options(player, name) {
                    out.push(Action::PlayCard {
                        card: card_id,
                        source: zone,
                        payment,
                    });
                }
            }
        }
    }

    /// Space, uniqueness, and identity prerequisites for playing `name`,
    /// independent of payment
    pub(crate) fn play_target_legal(&self, player: PlayerId, name: CardName) -> bool {
        match name {
            // The Fool lands in another player's village; legality is
            // about the target villages, not the player's own
            CardName::Fool => self.fool_target_exists(player),
            // Ruins needs a construction to demolish
            CardName::Ruins => {
                !self.unique_blocked(player, name)
                    && self.fits_in_village(player, name)
                    && self
                        .player(player)
                        .village
                        .iter()
                        .any(|&id| self.card(id).map(|c| c.is_construction()).unwrap_or(false))
            }
            _ => !self.unique_blocked(player, name) && self.fits_in_village(player, name),
        }
    }

    pub(crate) fn fool_target_exists(&self, player: PlayerId) -> bool {
        self.other_players(player).iter().any(|&target| {
            !self.village_has(target, CardName::Fool)
                && self.village_size(target) < self.params.village_limit as usize
        })
    }

    /// Every payment path open to `player` for a card of identity `name`
    pub(crate) fn payment_options(&self, player: PlayerId, name: CardName) -> SmallVec<[Payment; 4]> {
        let mut out: SmallVec<[Payment; 4]> = SmallVec::new();
        let cost = name.cost();
        let pool = self.player(player).resources;

        if pool.covers(&cost) || self.judge_swap(player, &cost).is_some() {
            out.push(Payment::Resources);
        }
        if name.kind() == CardKind::Critter {
            let housed = self.player(player).village.iter().any(|&id| {
                self.card(id).map(|c| c.can_house(name)).unwrap_or(false)
            });
            if housed {
                out.push(Payment::Occupancy);
            }
        }
        // Discount payments are only offered where there is a cost to cut
        if cost.total() > 0 {
            let cut = cost.discounted_toward(&pool, 3);
            if name.kind() == CardKind::Construction
                && self.village_has(player, CardName::Crane)
                && pool.covers(&cut)
            {
                out.push(Payment::Crane);
            }
            if name.kind() == CardKind::Critter
                && self.village_has(player, CardName::Innkeeper)
                && pool.covers(&cut)
            {
                out.push(Payment::Innkeeper);
            }
            if self.dungeon_cell_free(player) && pool.covers(&cut) {
                out.push(Payment::Dungeon);
            }
        }
        out
    }

    /// With a Judge in the village, a cost short by exactly one unit of one
    /// kind may be paid by substituting a unit of a kind the player holds
    /// in surplus. The first workable swap in declared resource order is
    /// used, so payment stays deterministic.
    pub(crate) fn judge_swap(&self, player: PlayerId, cost: &ResourceMap) -> Option<ResourceMap> {
        if !self.village_has(player, CardName::Judge) {
            return None;
        }
        let pool = self.player(player).resources;
        let mut short: Option<Resource> = None;
        for kind in Resource::ALL {
            let deficit = cost.get(kind).saturating_sub(pool.get(kind));
            match deficit {
                0 => {}
                1 if short.is_none() => short = Some(kind),
                _ => return None,
            }
        }
        let short = short?;
        for sub in Resource::ALL {
            if sub == short {
                continue;
            }
            if pool.get(sub) > cost.get(sub) {
                let mut swapped = *cost;
                swapped.sub(short, 1);
                swapped.add(sub, 1);
                return Some(swapped);
            }
        }
        None
    }

    /// A dungeon with a free cell and a critter to lock up
    fn dungeon_cell_free(&self, player: PlayerId) -> bool {
        let Some(dungeon_id) = self.find_in_village(player, CardName::Dungeon) else {
            return false;
        };
        let Ok(dungeon) = self.card(dungeon_id) else {
            return false;
        };
        let ranger = self.village_has(player, CardName::Ranger);
        if dungeon.imprisoned.len() >= dungeon.cell_capacity(ranger) {
            return false;
        }
        self.player(player)
            .village
            .iter()
            .any(|&id| self.card(id).map(|c| c.is_critter()).unwrap_or(false))
    }

    /// Occupancy aside, whether the location's own gate admits the player
    pub(crate) fn worker_placement_legal(&self, player: PlayerId, loc_id: LocationId) -> bool {
        let Ok(loc) = self.location(loc_id) else {
            return false;
        };
        if !loc.admits_visitor(player) {
            return false;
        }
        match loc.kind {
            LocationKind::Journey { points } => {
                self.player(player).season == Season::Autumn
                    && self.player(player).hand.len() >= points as usize
            }
            LocationKind::BasicEvent(color) => self.count_color(player, color) >= 3,
            _ => true,
        }
    }

    // ---- top-level execution ----

    fn execute_place_worker(&mut self, player: PlayerId, loc_id: LocationId) -> Result<()> {
        self.player_mut(player).workers -= 1;
        self.location_mut(loc_id)?.place_worker(player);
        log_if_verbose!(
            self,
            "{player} places a worker on {}",
            self.locations.get(loc_id).map(|l| l.kind.to_string()).unwrap_or_default()
        );
        self.run_location_effect(player, loc_id)
    }

    fn execute_advance_season(&mut self, player: PlayerId) -> Result<()> {
        // Clock Tower window: the advancing player may spend a token from
        // the tower to fire a basic/forest location they occupy, before
        // workers come home
        if let Some(tower_id) = self.find_in_village(player, CardName::ClockTower) {
            if self.card(tower_id)?.tokens > 0 {
                let eligible: SmallVec<[LocationId; 8]> = self
                    .board
                    .iter()
                    .copied()
                    .filter(|&id| {
                        self.location(id)
                            .map(|l| {
                                matches!(
                                    l.kind,
                                    LocationKind::Basic(_) | LocationKind::Forest(_)
                                ) && l.workers.contains(&player)
                            })
                            .unwrap_or(false)
                    })
                    .collect();
                if !eligible.is_empty() {
                    self.push_decision(PendingDecision {
                        player,
                        source: EffectSource::Card(tower_id),
                        kind: DecisionKind::ChooseLocation {
                            eligible,
                            optional: true,
                        },
                        continuation: Continuation::ClockTowerThenFinish,
                    });
                    return Ok(());
                }
            }
        }
        self.finish_season(player)
    }

    /// The season rollover itself: worker growth, the production or meadow
    /// event of the new season, and the mass worker return
    pub(crate) fn finish_season(&mut self, player: PlayerId) -> Result<()> {
        let next = self.player(player).season.next().ok_or_else(|| {
            EverdellError::InvalidAction(format!("{player} has no season after Autumn"))
        })?;
        self.player_mut(player).season = next;
        self.player_mut(player).workers_total += next.worker_gain();
        self.logger.log_normal(&format!(
            "{player} prepares for {next} ({} workers)",
            self.player(player).workers_total
        ));

        if next.triggers_production() {
            // The production event reaches every player's green cards,
            // advancing player first, each village in play order. Cards
            // that need choices push decision steps, resolved most
            // recent first.
            let mut order = vec![player];
            order.extend(self.other_players(player));
            for p in order {
                let village = self.player(p).village.clone();
                for card_id in village {
                    if self.card(card_id)?.is_production() {
                        self.run_card_production(p, card_id)?;
                    }
                }
            }
        } else if next == Season::Summer {
            let limit = self.params.hand_limit as usize;
            let space = limit.saturating_sub(self.player(player).hand.len());
            let count = space.min(2) as u8;
            if count > 0 && !self.meadow.is_empty() {
                self.push_decision(PendingDecision {
                    player,
                    source: EffectSource::Season,
                    kind: DecisionKind::ChooseCards {
                        pool: CardPool::Meadow,
                        filter: CardFilter::Any,
                        count,
                        strict: false,
                    },
                    continuation: Continuation::DrawChosenToHand,
                });
            }
        }

        // Mass worker return; the retaining destinations keep theirs
        let board = self.board.clone();
        let mut stuck = 0u8;
        for loc_id in board {
            let loc = self.location_mut(loc_id)?;
            if loc.retains_workers() {
                stuck += loc.workers.iter().filter(|&&p| p == player).count() as u8;
            } else {
                loc.remove_worker(player);
            }
        }
        self.player_mut(player).workers = self.player(player).workers_total - stuck;
        Ok(())
    }

    fn execute_end_game(&mut self, player: PlayerId) -> Result<()> {
        self.player_mut(player).finished = true;
        self.logger
            .log_normal(&format!("{player} takes the end-of-game marker"));
        if self.players.iter().all(|p| p.finished) {
            let scores = self.compute_final_scores()?;
            for score in &scores {
                self.logger.log_minimal(&format!(
                    "{}: {} points",
                    score.player,
                    score.total
                ));
            }
            self.final_scores = Some(scores);
            self.game_over = true;
        }
        Ok(())
    }

    /// Hand the turn to the next unfinished player
    fn advance_turn(&mut self) {
        let n = self.player_count();
        let mut next = self.current_player.next(n);
        for _ in 0..n {
            if !self.player(next).finished {
                break;
            }
            next = next.next(n);
        }
        self.current_player = next;
    }
}
