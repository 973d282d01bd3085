use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("event `{label}` scheduled after unregistered event `{after}`")]
    UnknownPredecessor { label: String, after: String },

    #[error("unknown timeline event `{0}`")]
    UnknownEvent(String),

    #[error("timeline event `{0}` registered twice")]
    DuplicateEvent(String),
}

pub type TimelineResult<T> = Result<T, TimelineError>;
