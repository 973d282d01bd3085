//! Per-block bookkeeping: trial order, bank, abort policy.

use std::collections::VecDeque;
use std::time::Duration;

use pointex_core::{Bank, BlockSpec, Point, ResultRow, TrialOutcome};
use pointex_timing::Timer;
use rand::Rng;
use tracing::{debug, info};

use crate::config::AbortPolicy;
use crate::error::{LayoutResult, TrialError, TrialResult};
use crate::input::InputSource;
use crate::layout::Layout;
use crate::occlusion::{OcclusionController, OcclusionDevice};
use crate::present::Presenter;
use crate::trial::{Apparatus, TrialContext};

pub struct BlockRunner {
    spec: BlockSpec,
    layout: Layout,
    policy: AbortPolicy,
    pending: VecDeque<usize>,
    bank: Bank,
    requeued: usize,
}

impl BlockRunner {
    pub fn new(spec: BlockSpec, layout: Layout, policy: AbortPolicy) -> Self {
        Self {
            spec,
            layout,
            policy,
            pending: (1..=spec.trials).collect(),
            bank: Bank::new(),
            requeued: 0,
        }
    }

    pub fn bank(&self) -> i32 {
        self.bank.total()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn requeued(&self) -> usize {
        self.requeued
    }

    /// Resets the bank and opens the goggles.
    pub fn begin<D: OcclusionDevice>(&mut self, occlusion: &mut OcclusionController<D>) {
        self.bank.reset();
        occlusion.open();
        info!(
            block = self.spec.number,
            condition = %self.spec.condition,
            trials = self.spec.trials,
            "block started"
        );
    }

    pub fn instructions(&self) -> String {
        let mut text = format!(
            "Block {} ({})\n\nPress the spacebar to begin the block.",
            self.spec.number, self.spec.condition
        );
        if self.spec.practicing() {
            text.push_str("\n(this is a practice block)");
        }
        text
    }

    /// Next trial with freshly placed targets, or `None` when the block is done.
    pub fn next_trial<R: Rng>(&mut self, rng: &mut R) -> LayoutResult<Option<TrialContext>> {
        let Some(trial_num) = self.pending.pop_front() else {
            return Ok(None);
        };
        let targets = self.layout.random_targets(rng)?;
        Ok(Some(TrialContext::new(
            self.spec.number,
            trial_num,
            self.spec.condition,
            &self.layout,
            targets,
            self.bank.total(),
        )))
    }

    /// Books an outcome. Returns the row to persist, or `None` when an
    /// aborted trial was put back in the queue.
    pub fn record(&mut self, ctx: &TrialContext, outcome: &TrialOutcome) -> Option<ResultRow> {
        if outcome.aborted {
            return match self.policy {
                AbortPolicy::Requeue => {
                    self.pending.push_back(ctx.trial_num);
                    self.requeued += 1;
                    debug!(trial = ctx.trial_num, "aborted trial requeued");
                    None
                }
                AbortPolicy::RecordVoid => Some(ctx.result_row(outcome)),
            };
        }
        self.bank.deposit(outcome.payout);
        Some(ctx.result_row(outcome))
    }

    pub fn finish<S: InputSource, P: Presenter, D: OcclusionDevice>(
        &self,
        rig: &mut Apparatus<S, P, D>,
    ) {
        rig.occlusion.ensure_open();
        if let Some(stats) = rig.loop_stats.summary() {
            debug!(
                avg_ms = stats.average_tick_ns / 1e6,
                jitter_ms = stats.jitter_ns / 1e6,
                max_ms = stats.max_tick_ns / 1e6,
                hz = stats.effective_hz,
                "polling loop timing"
            );
        }
        rig.loop_stats.clear();
        info!(
            block = self.spec.number,
            total = self.bank.total(),
            requeued = self.requeued,
            "block finished"
        );
    }
}

/// Shows `text` and polls until `control` is pressed. Quit is honoured.
pub fn await_go_ahead<T, S, P, D>(
    rig: &mut Apparatus<S, P, D>,
    timer: &T,
    text: &str,
    control: &str,
    poll_interval: Duration,
    at: Point,
) -> TrialResult<()>
where
    T: Timer,
    S: InputSource,
    P: Presenter,
    D: OcclusionDevice,
{
    rig.presenter.clear();
    rig.presenter.message(text, at);
    rig.presenter.flip();
    loop {
        rig.input.pump();
        if rig.input.quit_requested() {
            rig.occlusion.ensure_open();
            return Err(TrialError::QuitRequested);
        }
        if rig.input.is_held(control) {
            rig.input.discard_pending();
            return Ok(());
        }
        timer.sleep(poll_interval);
    }
}
