//! The game loop: feeds controller choices into the forward model until
//! the game ends or an action budget runs out

use crate::core::PlayerId;
use crate::game::controller::{GameStateView, PlayerController};
use crate::game::scoring::PlayerScore;
use crate::game::state::GameState;
use crate::{EverdellError, Result};

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEndReason {
    /// Every player took the end-of-game marker
    Finished,
    /// The action budget ran out first
    ActionLimit,
}

#[derive(Debug, Clone)]
pub struct GameResult {
    /// Highest total; ties go to the earliest seat
    pub winner: PlayerId,
    pub scores: Vec<PlayerScore>,
    pub actions_taken: u32,
    pub end_reason: GameEndReason,
}

pub struct GameLoop {
    game: GameState,
    controllers: Vec<Box<dyn PlayerController>>,
    max_actions: u32,
}

impl GameLoop {
    pub fn new(game: GameState, controllers: Vec<Box<dyn PlayerController>>) -> Result<Self> {
        if controllers.len() != game.player_count() {
            return Err(EverdellError::InvalidSetup(format!(
                "{} controllers for {} players",
                controllers.len(),
                game.player_count()
            )));
        }
        Ok(GameLoop {
            game,
            controllers,
            max_actions: 5_000,
        })
    }

    pub fn with_max_actions(mut self, max_actions: u32) -> Self {
        self.max_actions = max_actions;
        self
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    /// Play until the game ends or the action budget is exhausted
    pub fn run(&mut self) -> Result<GameResult> {
        let mut actions_taken = 0u32;
        while !self.game.game_over && actions_taken < self.max_actions {
            let legal = self.game.legal_actions();
            if legal.is_empty() {
                break;
            }
            let mover = self.game.player_to_move();
            let choice = {
                let view = GameStateView::new(&self.game);
                self.controllers[mover.index()].choose_action(&view, &legal)
            };
            let action = legal
                .get(choice)
                .ok_or_else(|| {
                    EverdellError::InvalidAction(format!(
                        "controller for {mover} chose index {choice} of {}",
                        legal.len()
                    ))
                })?
                .clone();
            self.game.apply(&action)?;
            actions_taken += 1;
        }

        let end_reason = if self.game.game_over {
            GameEndReason::Finished
        } else {
            GameEndReason::ActionLimit
        };
        let scores = match &self.game.final_scores {
            Some(scores) => scores.clone(),
            None => self.game.compute_final_scores()?,
        };
        // max_by_key keeps the last maximum; reversing makes ties resolve
        // to the earliest seat
        let winner = scores
            .iter()
            .rev()
            .max_by_key(|s| s.total)
            .map(|s| s.player)
            .unwrap_or(PlayerId::new(0));

        {
            let view = GameStateView::new(&self.game);
            for controller in &mut self.controllers {
                controller.on_game_end(&view);
            }
        }

        Ok(GameResult {
            winner,
            scores,
            actions_taken,
            end_reason,
        })
    }
}
