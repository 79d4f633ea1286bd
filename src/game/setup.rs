//! Game setup: parameters, board layout, deck construction, opening deal

use crate::core::{
    BasicLocation, Card, CardColor, CardName, ForestLocation, Location,
};
use crate::game::state::GameState;
use crate::{EverdellError, Result};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Tunable rule constants; `Default` is the standard game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameParameters {
    pub player_count: usize,
    pub starting_workers: u8,
    pub hand_limit: u8,
    pub village_limit: u8,
    pub meadow_size: u8,
    /// Forest locations drawn from the pool at setup
    pub forest_count: usize,
}

impl Default for GameParameters {
    fn default() -> Self {
        GameParameters {
            player_count: 2,
            starting_workers: 2,
            hand_limit: 8,
            village_limit: 15,
            meadow_size: 8,
            forest_count: 3,
        }
    }
}

/// Journey point spots, highest first
const JOURNEY_SPOTS: [u8; 4] = [5, 4, 3, 2];

/// One basic event per color that has enough cards to gate on
const EVENT_COLORS: [CardColor; 4] = [
    CardColor::Production,
    CardColor::Governance,
    CardColor::Destination,
    CardColor::Traveler,
];

/// Build a ready-to-play game for `player_count` players from `seed`.
///
/// Everything random (deck order, forest draw, opening hands) comes from
/// the state's main RNG, so the same seed always yields the same game.
pub fn new_game(player_count: usize, seed: u64) -> Result<GameState> {
    new_game_with(
        GameParameters {
            player_count,
            ..GameParameters::default()
        },
        seed,
    )
}

pub fn new_game_with(params: GameParameters, seed: u64) -> Result<GameState> {
    if !(2..=4).contains(&params.player_count) {
        return Err(EverdellError::InvalidSetup(format!(
            "{} players (2-4 supported)",
            params.player_count
        )));
    }
    let forest_count = params.forest_count;
    let mut state = GameState::empty(params, seed);

    // Fixed board
    for basic in BasicLocation::ALL {
        let id = state.next_location_id();
        state.register_location(Location::basic(id, basic));
    }
    let haven_id = state.next_location_id();
    state.register_location(Location::haven(haven_id));
    for points in JOURNEY_SPOTS {
        let id = state.next_location_id();
        state.register_location(Location::journey(id, points));
    }
    for color in EVENT_COLORS {
        let id = state.next_location_id();
        state.register_location(Location::basic_event(id, color));
    }

    // Variable board: a few forest locations drawn from the pool
    let mut forests = ForestLocation::ALL.to_vec();
    forests.shuffle(&mut state.rng);
    forests.truncate(forest_count);
    for forest in forests {
        let id = state.next_location_id();
        state.register_location(Location::forest(id, forest));
    }

    // Deck
    for name in CardName::ALL {
        for _ in 0..name.data().deck_count {
            let id = state.next_card_id();
            state.cards.insert(id, Card::new(id, name));
            state.deck.push(id);
        }
    }
    state.shuffle_deck();
    state.refill_meadow();

    // Opening hands: 5 cards plus one per seat after the first
    let player_ids: Vec<_> = state.players.iter().map(|p| p.id).collect();
    for (seat, player) in player_ids.into_iter().enumerate() {
        state.draw_to_hand(player, 5 + seat as u8);
    }

    state.logger.log_normal(&format!(
        "New {}-player game, seed {seed}",
        state.player_count()
    ));
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LocationKind;

    #[test]
    fn test_setup_is_deterministic() {
        let a = new_game(3, 99).unwrap();
        let b = new_game(3, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_board_layout() {
        let state = new_game(2, 7).unwrap();
        let count = |pred: fn(&LocationKind) -> bool| {
            state
                .board
                .iter()
                .filter(|&&id| state.location(id).map(|l| pred(&l.kind)).unwrap_or(false))
                .count()
        };
        assert_eq!(count(|k| matches!(k, LocationKind::Basic(_))), 7);
        assert_eq!(count(|k| matches!(k, LocationKind::Forest(_))), 3);
        assert_eq!(count(|k| matches!(k, LocationKind::Journey { .. })), 4);
        assert_eq!(count(|k| matches!(k, LocationKind::BasicEvent(_))), 4);
        assert_eq!(count(|k| matches!(k, LocationKind::Haven)), 1);
        assert_eq!(state.meadow.len(), 8);
    }

    #[test]
    fn test_opening_deal_scales_by_seat() {
        let state = new_game(4, 1).unwrap();
        for (seat, player) in state.players.iter().enumerate() {
            assert_eq!(player.hand.len(), 5 + seat);
            assert_eq!(player.workers, 2);
        }
    }

    #[test]
    fn test_player_count_bounds() {
        assert!(new_game(1, 0).is_err());
        assert!(new_game(5, 0).is_err());
    }
}
