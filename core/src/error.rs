use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Structural reasons a level cannot be played.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("Source tile is missing")]
    MissingSource,
    #[error("Sink tile is missing")]
    MissingSink,
    #[error("More than one source tile")]
    DuplicateSource,
    #[error("More than one sink tile")]
    DuplicateSink,
    #[error("Map size must be at least 2x2")]
    DimensionsTooSmall,
    #[error("Map size must be at most 255x255")]
    DimensionsTooLarge,
    #[error("Cell layout does not match declared size")]
    ShapeMismatch,
    #[error("Delay must be a positive value")]
    NonPositiveDelay,
    #[error("Source tile is blocked by a wall")]
    SourceBlocked,
    #[error("Sink tile is blocked by a wall")]
    SinkBlocked,
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Default rows must be at least 2")]
    Rows,
    #[error("Default columns must be at least 2")]
    Cols,
    #[error("Delay must be a positive integer")]
    Delay,
    #[error("Flow rate must be a positive integer")]
    FlowInterval,
    #[error("Queue length must be a positive integer")]
    QueueLength,
    #[error("Tick period must be a positive integer")]
    TickPeriod,
}
