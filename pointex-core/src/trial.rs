use serde::{Deserialize, Serialize, Serializer};

use crate::classify::ClickClassification;
use crate::condition::Condition;
use crate::geometry::Point;

/// Which side of the pair the penalty circle sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PenaltySide {
    Left,
    Right,
}

impl PenaltySide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Result of one trial, produced once by the trial state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    pub reaction_time_ms: Option<u32>,
    pub movement_time_ms: Option<u32>,
    pub classification: ClickClassification,
    pub clicked_at: Option<Point>,
    pub payout: i32,
    pub block_total: i32,
    pub aborted: bool,
    /// Trial clock reading frozen at the moment of a premature release.
    pub abort_elapsed_ms: Option<u32>,
}

impl TrialOutcome {
    /// Voided trial: nothing scored, bank unchanged.
    pub fn aborted(block_total: i32, elapsed_ms: u32) -> Self {
        Self {
            reaction_time_ms: None,
            movement_time_ms: None,
            classification: ClickClassification::NoClick,
            clicked_at: None,
            payout: 0,
            block_total,
            aborted: true,
            abort_elapsed_ms: Some(elapsed_ms),
        }
    }

    pub fn timed_out(&self) -> bool {
        !self.aborted && self.classification == ClickClassification::NoClick
    }
}

/// Flat record persisted per trial. Absent values serialise as `"NA"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub practicing: bool,
    pub block_num: usize,
    pub trial_num: usize,
    #[serde(serialize_with = "label")]
    pub condition: Condition,
    pub penalty_side: PenaltySide,
    pub target_x: f64,
    pub target_y: f64,
    #[serde(serialize_with = "label")]
    pub classification: ClickClassification,
    #[serde(serialize_with = "na_or")]
    pub click_x: Option<f64>,
    #[serde(serialize_with = "na_or")]
    pub click_y: Option<f64>,
    #[serde(serialize_with = "na_or")]
    pub reaction_time: Option<u32>,
    #[serde(serialize_with = "na_or")]
    pub movement_time: Option<u32>,
    pub trial_payout: i32,
    pub block_total: i32,
    pub aborted: bool,
    /// Trial clock when a premature release voided the trial.
    #[serde(serialize_with = "na_or")]
    pub abort_elapsed: Option<u32>,
}

fn na_or<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str("NA"),
    }
}

fn label<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: std::fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}
