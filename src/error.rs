//! Error types for the Everdell engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EverdellError {
    /// A component id was dereferenced but no live entity carries it.
    /// This is a contract failure in state management, not a game-rule
    /// outcome, so callers should treat it as fatal.
    #[error("Component not found: {0}")]
    ComponentNotFound(u32),

    #[error("Invalid game action: {0}")]
    InvalidAction(String),

    #[error("Invalid game setup: {0}")]
    InvalidSetup(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, EverdellError>;
