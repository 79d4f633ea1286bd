//! Uniform-random controller, the baseline driver for tests and benches

use crate::core::PlayerId;
use crate::game::actions::Action;
use crate::game::controller::{GameStateView, PlayerController};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks uniformly among legal actions from its own seeded stream, so a
/// given (game seed, controller seed) pair replays identically
pub struct RandomController {
    player: PlayerId,
    rng: StdRng,
}

impl RandomController {
    pub fn new(player: PlayerId, seed: u64) -> Self {
        RandomController {
            player,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl PlayerController for RandomController {
    fn player_id(&self) -> PlayerId {
        self.player
    }

    fn choose_action(&mut self, _view: &GameStateView<'_>, legal: &[Action]) -> usize {
        self.rng.gen_range(0..legal.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::setup::new_game;

    #[test]
    fn test_same_seed_same_choices() {
        let game = new_game(2, 5).unwrap();
        let legal = game.legal_actions();
        assert!(!legal.is_empty());

        let mut a = RandomController::new(PlayerId::new(0), 42);
        let mut b = RandomController::new(PlayerId::new(0), 42);
        let view = GameStateView::new(&game);
        for _ in 0..10 {
            assert_eq!(
                a.choose_action(&view, &legal),
                b.choose_action(&view, &legal)
            );
        }
    }
}
