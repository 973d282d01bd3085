use std::path::Path;

use pointex_core::{Condition, PayoutTable};
use serde::Deserialize;

use crate::error::ConfigResult;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub starting_condition: Condition,
    pub run_practice_blocks: bool,
    pub trials_per_block: usize,
    pub trials_per_practice_block: usize,
    pub timing: TrialTiming,
    pub layout: LayoutConfig,
    pub payouts: PayoutTable,
    pub response: ResponseConfig,
    pub feedback: FeedbackConfig,
    pub abort_policy: AbortPolicy,
    pub occlusion: OcclusionCodes,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            starting_condition: Condition::Vision,
            run_practice_blocks: true,
            trials_per_block: 40,
            trials_per_practice_block: 10,
            timing: TrialTiming::default(),
            layout: LayoutConfig::default(),
            payouts: PayoutTable::default(),
            response: ResponseConfig::default(),
            feedback: FeedbackConfig::default(),
            abort_policy: AbortPolicy::Requeue,
            occlusion: OcclusionCodes::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(s: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_path(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Event offsets and fixed delays, all in milliseconds. Onsets chain:
/// `rect_onset` from trial start, `circle_onset` after the rect,
/// `go_signal` after the circles, `response_timeout` after the go cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrialTiming {
    pub rect_onset_ms: u64,
    pub circle_onset_ms: u64,
    pub go_signal_ms: u64,
    pub response_timeout_ms: u64,
    /// Pause between landing and lifting occlusion.
    pub reveal_delay_ms: u64,
    /// Duration of each feedback screen.
    pub feedback_ms: u64,
    /// Duration of the premature-release warning.
    pub abort_feedback_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for TrialTiming {
    fn default() -> Self {
        Self {
            rect_onset_ms: 300,
            circle_onset_ms: 700,
            go_signal_ms: 500,
            response_timeout_ms: 650,
            reveal_delay_ms: 300,
            feedback_ms: 1000,
            abort_feedback_ms: 1000,
            poll_interval_ms: 1,
        }
    }
}

/// Physical layout. Sizes are in multiples of `unit_mm`; offsets are in mm
/// above the bottom edge of the screen.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub screen_width_px: f64,
    pub screen_height_px: f64,
    pub ppi: f64,
    pub unit_mm: f64,
    pub rect_width_units: f64,
    pub rect_height_units: f64,
    pub circle_diameter_units: f64,
    pub fixation_width_units: f64,
    /// Circle centre distance from the pair's origin, in radii.
    pub target_offset_radii: f64,
    pub offset_mm: f64,
    pub target_padding_px: f64,
    /// Require a click inside a start region before the trial is revealed.
    pub start_hold: bool,
    pub start_radius_units: f64,
    pub start_offset_mm: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            screen_width_px: 1920.0,
            screen_height_px: 1080.0,
            ppi: 96.0,
            unit_mm: 9.0,
            rect_width_units: 13.0,
            rect_height_units: 9.0,
            circle_diameter_units: 2.0,
            fixation_width_units: 2.0,
            target_offset_radii: 1.0,
            offset_mm: 210.0,
            target_padding_px: 2.0,
            start_hold: false,
            start_radius_units: 1.0,
            start_offset_mm: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Name of the control held down until movement onset.
    pub hold_control: String,
    /// When false, clicks outside the frame are ignored and the window keeps
    /// waiting for a click inside it.
    pub accept_outside_clicks: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            hold_control: "space".to_string(),
            accept_outside_clicks: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub show_targets_in_practice: bool,
    pub show_landing_marker: bool,
    /// Boundary labels drawn alongside the frame, e.g. `"start"`.
    pub also_draw: Vec<String>,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            show_targets_in_practice: true,
            show_landing_marker: false,
            also_draw: Vec::new(),
        }
    }
}

/// What the block does with a trial voided by a premature release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortPolicy {
    /// Re-offer the trial at the end of the block.
    Requeue,
    /// Record a void row and move on.
    RecordVoid,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OcclusionCodes {
    pub open: String,
    pub close: String,
}

impl Default for OcclusionCodes {
    fn default() -> Self {
        Self {
            open: "55".to_string(),
            close: "56".to_string(),
        }
    }
}
