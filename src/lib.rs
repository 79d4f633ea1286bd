//! Rules engine for a worker-placement, engine-building card game.
//!
//! The crate is built around a forward model for AI search: states are
//! cheap to clone exactly, every choice point is an enumerable decision
//! step, and all randomness flows from a seeded RNG inside the state.
//!
//! # Quick start
//!
//! ```
//! use everdell_engine::game::{new_game, GameLoop, RandomController};
//! use everdell_engine::core::PlayerId;
//!
//! let game = new_game(2, 42).unwrap();
//! let controllers: Vec<Box<dyn everdell_engine::game::PlayerController>> = vec![
//!     Box::new(RandomController::new(PlayerId::new(0), 1)),
//!     Box::new(RandomController::new(PlayerId::new(1), 2)),
//! ];
//! let mut game_loop = GameLoop::new(game, controllers).unwrap();
//! let result = game_loop.run().unwrap();
//! assert_eq!(result.scores.len(), 2);
//! ```

pub mod core;
pub mod game;

mod error;

pub use error::{EverdellError, Result};
