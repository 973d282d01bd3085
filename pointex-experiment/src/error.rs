use pointex_core::BoundaryError;
use pointex_timing::TimelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("invalid scale: ppi {ppi}, unit {unit_mm} mm")]
    InvalidScale { ppi: f64, unit_mm: f64 },

    #[error("targets of radius {radius_px:.1}px do not fit a {width_px:.1}x{height_px:.1}px frame")]
    TargetsDoNotFit {
        radius_px: f64,
        width_px: f64,
        height_px: f64,
    },

    #[error(transparent)]
    Boundary(#[from] BoundaryError),
}

pub type LayoutResult<T> = Result<T, LayoutError>;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("occlusion link I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("occlusion link unavailable")]
    Unavailable,
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Conditions that end a trial without an outcome. A premature release is
/// not among them: it yields an aborted `TrialOutcome`.
#[derive(Debug, Error)]
pub enum TrialError {
    #[error("quit requested")]
    QuitRequested,

    #[error("cannot draw `{0}`: no boundary with that label")]
    UnknownStimulus(String),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

pub type TrialResult<T> = Result<T, TrialError>;
