//! Game rules layer: state, forward model, effects, and drivers

pub mod actions;
pub mod controller;
pub mod decision;
pub mod effects;
pub mod game_loop;
pub mod logger;
pub mod random_controller;
pub mod scoring;
pub mod setup;
pub mod state;

pub use actions::{Action, CardZone, Payment};
pub use controller::{GameStateView, PlayerController};
pub use decision::{
    CardFilter, CardPool, Continuation, DecisionInput, DecisionKind, EffectSource,
    PendingDecision, ResourceFilter,
};
pub use game_loop::{GameEndReason, GameLoop, GameResult};
pub use logger::{GameLogger, LogEntry, OutputMode, VerbosityLevel};
pub use random_controller::RandomController;
pub use scoring::PlayerScore;
pub use setup::{new_game, new_game_with, GameParameters};
pub use state::{GameState, Observer, PlayerState};
