use crate::geometry::Point;

/// Declarative handle for something the presentation layer draws. Styling
/// belongs to the presenter; the trial only says what goes where.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StimulusId {
    Fixation,
    /// The stimulus associated with a labelled boundary.
    Boundary(String),
    LandingMarker,
}

impl StimulusId {
    pub fn boundary(label: &str) -> Self {
        Self::Boundary(label.to_string())
    }
}

/// One item of the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub stimulus: StimulusId,
    pub at: Point,
}
