use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("invalid board dimensions or mine count")]
    InvalidConfig,
    #[error("coordinates outside the board")]
    InvalidCoords,
    #[error("mines have already been placed")]
    AlreadyPlaced,
    #[error("game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("no charges left for this power-up")]
    NoCharge,
    #[error("a power-up of this kind is already active")]
    AlreadyActive,
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Failure at the persistence boundary. Never fatal to gameplay: callers
/// keep the dirty snapshot and retry on the next save trigger.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("progress store rejected the snapshot: {0}")]
pub struct StoreError(pub String);
