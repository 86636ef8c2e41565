use thiserror::Error;

/// Caller contract violations detected while building an engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid configuration: roster is empty")]
    EmptyRoster,
    #[error("invalid configuration: roster has {count} entries, at most {max} are supported")]
    RosterTooLarge { count: usize, max: usize },
    #[error("invalid configuration: grid size {size} is outside {min}..={max}")]
    InvalidGridSize { size: i32, min: i32, max: i32 },
    #[error("invalid configuration: duplicate entity id {0}")]
    DuplicateId(String),
}
