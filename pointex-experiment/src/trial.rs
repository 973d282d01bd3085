use pointex_core::{labels, BoundarySet, Condition, Point, Region, ResultRow, TrialOutcome};
use pointex_timing::{LoopStats, Timeline, TimelineResult, Timer};

use crate::config::TrialTiming;
use crate::input::{InputMonitor, InputSource};
use crate::layout::{Layout, TargetPair};
use crate::occlusion::{OcclusionController, OcclusionDevice};
use crate::present::Presenter;

/// Timeline labels for the reveal sequence.
pub mod events {
    pub const RECT_ONSET: &str = "rect_onset";
    pub const CIRCLE_ONSET: &str = "circle_onset";
    pub const GO_SIGNAL: &str = "go_signal";
    pub const TRIAL_TIMEOUT: &str = "trial_timeout";
}

/// Builds the per-trial chain rect → circles → go → timeout.
pub fn trial_timeline<T: Timer>(timer: T, timing: &TrialTiming) -> TimelineResult<Timeline<T>> {
    let mut timeline = Timeline::new(timer);
    timeline.add_event(events::RECT_ONSET, timing.rect_onset_ms, None)?;
    timeline.add_event(
        events::CIRCLE_ONSET,
        timing.circle_onset_ms,
        Some(events::RECT_ONSET),
    )?;
    timeline.add_event(
        events::GO_SIGNAL,
        timing.go_signal_ms,
        Some(events::CIRCLE_ONSET),
    )?;
    timeline.add_event(
        events::TRIAL_TIMEOUT,
        timing.response_timeout_ms,
        Some(events::GO_SIGNAL),
    )?;
    Ok(timeline)
}

/// Everything one trial needs to know, fixed when the trial starts.
#[derive(Debug, Clone)]
pub struct TrialContext {
    pub block_num: usize,
    pub trial_num: usize,
    pub condition: Condition,
    pub boundaries: BoundarySet,
    pub targets: TargetPair,
    pub fixation: Point,
    /// Block total before this trial.
    pub bank: i32,
}

impl TrialContext {
    pub fn new(
        block_num: usize,
        trial_num: usize,
        condition: Condition,
        layout: &Layout,
        targets: TargetPair,
        bank: i32,
    ) -> Self {
        let mut boundaries = layout.base_boundaries();
        targets.install(&mut boundaries);
        Self {
            block_num,
            trial_num,
            condition,
            boundaries,
            targets,
            fixation: layout.fixation,
            bank,
        }
    }

    pub fn practicing(&self) -> bool {
        self.condition == Condition::Practice
    }

    pub fn has_start_hold(&self) -> bool {
        self.boundaries.has(labels::START)
    }

    pub fn result_row(&self, outcome: &TrialOutcome) -> ResultRow {
        let target = self.targets.reward.center();
        ResultRow {
            practicing: self.practicing(),
            block_num: self.block_num,
            trial_num: self.trial_num,
            condition: self.condition,
            penalty_side: self.targets.side,
            target_x: target.x,
            target_y: target.y,
            classification: outcome.classification,
            click_x: outcome.clicked_at.map(|p| p.x),
            click_y: outcome.clicked_at.map(|p| p.y),
            reaction_time: outcome.reaction_time_ms,
            movement_time: outcome.movement_time_ms,
            trial_payout: outcome.payout,
            block_total: outcome.block_total,
            aborted: outcome.aborted,
            abort_elapsed: outcome.abort_elapsed_ms,
        }
    }
}

/// Session-lifetime collaborators, handed to one trial at a time.
pub struct Apparatus<S: InputSource, P: Presenter, D: OcclusionDevice> {
    pub input: InputMonitor<S>,
    pub presenter: P,
    pub occlusion: OcclusionController<D>,
    pub loop_stats: LoopStats,
}

impl<S: InputSource, P: Presenter, D: OcclusionDevice> Apparatus<S, P, D> {
    pub fn new(source: S, presenter: P, device: D) -> Self {
        Self {
            input: InputMonitor::new(source),
            presenter,
            occlusion: OcclusionController::new(device),
            loop_stats: LoopStats::default(),
        }
    }
}
