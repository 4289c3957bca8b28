//! Error taxonomy: bad run input (validation) versus driver misuse (illegal state).

/// Bad input cardinality or stage configuration. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("a run needs at least one item")]
    NoItems,

    #[error("too many items: {count} requested, at most {max} allowed")]
    TooManyItems { count: usize, max: usize },

    #[error("stage count must be at least 1, got {0}")]
    InvalidStageCount(usize),

    #[error("insufficient identifiers: {needed} required, {supplied} supplied")]
    InsufficientIdentifiers { needed: usize, supplied: usize },

    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("identifier at position {position} is blank")]
    EmptyIdentifier { position: usize },

    #[error("{labels} stage labels given for {stages} stages")]
    StageLabelMismatch { stages: usize, labels: usize },

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// API misuse by the driver. Fatal to the call, not to the process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IllegalStateError {
    #[error("run already complete at cycle {cycle}")]
    RunComplete { cycle: u64 },

    #[error("run not complete")]
    RunNotComplete,

    #[error("item {0} is missing timing data")]
    MissingTiming(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    IllegalState,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    IllegalState(#[from] IllegalStateError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::IllegalState(_) => ErrorKind::IllegalState,
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
