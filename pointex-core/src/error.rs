use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BoundaryError {
    #[error("circle radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    #[error("no boundary labelled `{0}`")]
    UnknownBoundary(String),
}

pub type BoundaryResult<T> = Result<T, BoundaryError>;
