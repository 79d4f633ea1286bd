//! Controller interface: how a driver (human, scripted, or AI search)
//! supplies choices to the forward model
//!
//! Controllers see the game only through `GameStateView`, a read-only
//! window, and answer by index into the legal action list. The forward
//! model itself never calls out; the game loop mediates.

use crate::core::{Card, CardId, PlayerId, ResourceMap, Season};
use crate::game::actions::Action;
use crate::game::decision::DecisionInput;
use crate::game::state::GameState;
use crate::Result;

/// Read-only window over the game state for presentation and drivers
pub struct GameStateView<'a> {
    state: &'a GameState,
}

impl<'a> GameStateView<'a> {
    pub fn new(state: &'a GameState) -> Self {
        GameStateView { state }
    }

    pub fn player_to_move(&self) -> PlayerId {
        self.state.player_to_move()
    }

    pub fn current_player(&self) -> PlayerId {
        self.state.current_player
    }

    pub fn season(&self, player: PlayerId) -> Season {
        self.state.player(player).season
    }

    pub fn workers(&self, player: PlayerId) -> u8 {
        self.state.player(player).workers
    }

    pub fn resources(&self, player: PlayerId) -> ResourceMap {
        self.state.player(player).resources
    }

    pub fn point_tokens(&self, player: PlayerId) -> i32 {
        self.state.player(player).point_tokens
    }

    pub fn hand(&self, player: PlayerId) -> &[CardId] {
        &self.state.player(player).hand
    }

    pub fn village(&self, player: PlayerId) -> &[CardId] {
        &self.state.player(player).village
    }

    pub fn meadow(&self) -> &[CardId] {
        &self.state.meadow
    }

    pub fn card(&self, id: CardId) -> Result<&Card> {
        self.state.card(id)
    }

    pub fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    /// The input category of the pending decision, if one is suspended
    pub fn pending_input(&self) -> Option<DecisionInput> {
        self.state.decisions.last().map(|d| d.kind.input())
    }
}

/// A source of choices for one player
pub trait PlayerController {
    fn player_id(&self) -> PlayerId;

    /// Pick one of the legal actions by index. `legal` is never empty.
    fn choose_action(&mut self, view: &GameStateView<'_>, legal: &[Action]) -> usize;

    /// Called once when the game ends
    fn on_game_end(&mut self, _view: &GameStateView<'_>) {}
}
