use serde::{Deserialize, Serialize};

use crate::geometry::{labels, BoundarySet, Point};

/// Where a click landed relative to the trial's boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickClassification {
    Reward,
    Penalty,
    Overlap,
    RectOnly,
    Outside,
    Start,
    NoClick,
}

impl ClickClassification {
    /// Label written to result rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reward => "reward",
            Self::Penalty => "penalty",
            Self::Overlap => "overlap",
            Self::RectOnly => "rect",
            Self::Outside => "outside",
            Self::Start => "start",
            Self::NoClick => "NA",
        }
    }

    /// True when the click touched at least one target circle.
    pub fn hit_target(&self) -> bool {
        matches!(self, Self::Reward | Self::Penalty | Self::Overlap)
    }
}

impl std::fmt::Display for ClickClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full decision tree, start region included. Used while waiting for the
/// participant to settle on the start position.
pub fn classify(point: Point, boundaries: &BoundarySet) -> ClickClassification {
    if boundaries.within(labels::START, point) == Some(true) {
        return ClickClassification::Start;
    }
    classify_response(point, boundaries)
}

/// Decision tree for a response click: the start region is not consulted.
///
/// The enclosing rect dominates the targets, and a point inside both
/// circles is `Overlap` no matter how the circles were added.
pub fn classify_response(point: Point, boundaries: &BoundarySet) -> ClickClassification {
    if boundaries.within(labels::RECT, point) == Some(false) {
        return ClickClassification::Outside;
    }

    let reward = boundaries.within(labels::REWARD, point).unwrap_or(false);
    let penalty = boundaries.within(labels::PENALTY, point).unwrap_or(false);

    match (reward, penalty) {
        (true, true) => ClickClassification::Overlap,
        (true, false) => ClickClassification::Reward,
        (false, true) => ClickClassification::Penalty,
        (false, false) => ClickClassification::RectOnly,
    }
}
