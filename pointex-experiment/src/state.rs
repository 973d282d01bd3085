use std::collections::VecDeque;
use std::time::Duration;

use pointex_core::{
    accumulate, classify, classify_response, labels, ClickClassification, Condition, Point,
    Region, StimulusId, TrialOutcome, TrialPhase,
};
use pointex_timing::{Timeline, Timer};
use tracing::{debug, info, warn};

use crate::config::ExperimentConfig;
use crate::error::{TrialError, TrialResult};
use crate::input::{Click, InputSource};
use crate::occlusion::OcclusionDevice;
use crate::present::{Presenter, Scene};
use crate::trial::{events, trial_timeline, Apparatus, TrialContext};

/// What a single `tick` decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Still waiting in the current phase.
    Stay,
    /// Moved to a new phase; tick again without waiting.
    Enter(TrialPhase),
    Finished(TrialOutcome),
}

#[derive(Debug, Clone, PartialEq)]
enum FeedbackScreen {
    Text(String),
    Landing(Point),
}

/// Drives one trial from start (or start hold) to its outcome.
///
/// Every wait is expressed as a phase polled by `tick`, so input draining and
/// quit handling happen in one place. Any error leaving `tick` first makes
/// sure the goggles are open.
pub struct TrialStateMachine<'a, T, S, P, D>
where
    T: Timer,
    S: InputSource,
    P: Presenter,
    D: OcclusionDevice,
{
    config: &'a ExperimentConfig,
    ctx: &'a TrialContext,
    rig: &'a mut Apparatus<S, P, D>,
    timeline: Timeline<T>,
    phase: TrialPhase,
    scene: Scene,
    rect_shown: bool,
    targets_shown: bool,
    /// Trial-clock reading at which the current timed phase ends.
    phase_until: u64,
    tone_ms: Option<u64>,
    release_ms: Option<u64>,
    reaction_time_ms: Option<u32>,
    movement_time_ms: Option<u32>,
    classification: Option<ClickClassification>,
    clicked_at: Option<Point>,
    payout: i32,
    block_total: i32,
    abort_elapsed_ms: Option<u64>,
    feedback: VecDeque<FeedbackScreen>,
}

impl<'a, T, S, P, D> TrialStateMachine<'a, T, S, P, D>
where
    T: Timer,
    S: InputSource,
    P: Presenter,
    D: OcclusionDevice,
{
    pub fn new(
        config: &'a ExperimentConfig,
        ctx: &'a TrialContext,
        rig: &'a mut Apparatus<S, P, D>,
        timer: T,
    ) -> TrialResult<Self> {
        let timeline = trial_timeline(timer, &config.timing)?;
        let mut machine = Self {
            config,
            ctx,
            rig,
            timeline,
            phase: TrialPhase::AwaitStart,
            scene: Scene::default(),
            rect_shown: false,
            targets_shown: false,
            phase_until: 0,
            tone_ms: None,
            release_ms: None,
            reaction_time_ms: None,
            movement_time_ms: None,
            classification: None,
            clicked_at: None,
            payout: 0,
            block_total: ctx.bank,
            abort_elapsed_ms: None,
            feedback: VecDeque::new(),
        };

        info!(
            block = ctx.block_num,
            trial = ctx.trial_num,
            condition = %ctx.condition,
            penalty_side = ctx.targets.side.as_str(),
            "trial started"
        );

        machine.rig.input.discard_pending();
        let first = if ctx.has_start_hold() {
            TrialPhase::AwaitStart
        } else {
            TrialPhase::Reveal
        };
        if let Err(e) = machine.enter(first) {
            machine.teardown();
            return Err(e);
        }
        Ok(machine)
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn timeline(&self) -> &Timeline<T> {
        &self.timeline
    }

    /// Runs the polling loop to completion.
    pub fn run(mut self) -> TrialResult<TrialOutcome> {
        let timer = self.timeline.timer().clone();
        let poll = Duration::from_millis(self.config.timing.poll_interval_ms);
        loop {
            let started = timer.now();
            match self.tick()? {
                Step::Finished(outcome) => return Ok(outcome),
                Step::Enter(_) => continue,
                Step::Stay => {}
            }
            self.rig.loop_stats.record(timer.elapsed(started));
            timer.sleep(poll);
        }
    }

    /// One polling tick: drain input, honour quit, evaluate the phase.
    pub fn tick(&mut self) -> TrialResult<Step> {
        let result = self.step();
        if result.is_err() {
            self.teardown();
        }
        result
    }

    fn step(&mut self) -> TrialResult<Step> {
        if self.phase.is_terminal() {
            return Ok(Step::Finished(self.outcome()));
        }

        self.rig.input.pump();
        if self.rig.input.quit_requested() {
            info!(phase = ?self.phase, "quit requested mid-trial");
            return Err(TrialError::QuitRequested);
        }

        let next = match self.phase {
            TrialPhase::AwaitStart => self.await_start(),
            TrialPhase::Reveal => self.reveal()?,
            TrialPhase::GoSignal => Some(TrialPhase::AwaitRelease),
            TrialPhase::AwaitRelease => self.await_release()?,
            TrialPhase::AwaitClick => self.await_click()?,
            TrialPhase::Resolve => self.resolve(),
            TrialPhase::Feedback => self.show_feedback(),
            TrialPhase::Aborted => self.elapsed_phase().then_some(TrialPhase::End),
            TrialPhase::End => None,
        };

        match next {
            Some(phase) => {
                self.enter(phase)?;
                Ok(Step::Enter(phase))
            }
            None => Ok(Step::Stay),
        }
    }

    fn enter(&mut self, phase: TrialPhase) -> TrialResult<()> {
        debug!(from = ?self.phase, to = ?phase, clock_ms = self.timeline.clock_ms(), "phase transition");
        self.phase = phase;
        match phase {
            TrialPhase::AwaitStart => {
                let start = self.ctx.boundaries.require(labels::START)?;
                self.scene.add(StimulusId::boundary(labels::START), start.center());
                self.scene.draw(&mut self.rig.presenter);
            }
            TrialPhase::Reveal => {
                self.timeline.restart();
                self.rig.input.discard_pending();
                self.scene.add(StimulusId::Fixation, self.ctx.fixation);
                for label in &self.config.feedback.also_draw {
                    let boundary = self
                        .ctx
                        .boundaries
                        .get(label)
                        .ok_or_else(|| TrialError::UnknownStimulus(label.clone()))?;
                    self.scene.add(StimulusId::boundary(label), boundary.center());
                }
                self.scene.draw(&mut self.rig.presenter);
            }
            TrialPhase::GoSignal => {
                self.rig.presenter.tone();
                self.tone_ms = Some(self.timeline.clock_ms());
            }
            TrialPhase::AwaitRelease | TrialPhase::AwaitClick => {}
            TrialPhase::Resolve => {
                let classification = *self
                    .classification
                    .get_or_insert(ClickClassification::NoClick);
                self.payout = self.config.payouts.payout(classification);
                self.block_total = accumulate(self.ctx.bank, self.payout);
                self.scene.clear();
                self.scene.draw(&mut self.rig.presenter);
                let delay = if self.ctx.condition.occludes() {
                    self.config.timing.reveal_delay_ms
                } else {
                    0
                };
                self.phase_until = self.timeline.clock_ms() + delay;
            }
            TrialPhase::Feedback => {
                self.feedback = self.feedback_screens();
                self.phase_until = self.timeline.clock_ms();
            }
            TrialPhase::Aborted => {
                let elapsed = self.timeline.stop_clock();
                self.abort_elapsed_ms = Some(elapsed);
                warn!(
                    block = self.ctx.block_num,
                    trial = self.ctx.trial_num,
                    elapsed_ms = elapsed,
                    "premature release, trial voided"
                );
                self.scene.clear();
                let presenter = &mut self.rig.presenter;
                presenter.clear();
                presenter.message(
                    "Too early! Keep holding until you hear the tone.",
                    self.ctx.fixation,
                );
                presenter.flip();
                self.phase_until = self.timeline.clock_ms() + self.config.timing.abort_feedback_ms;
            }
            TrialPhase::End => {
                self.rig.occlusion.ensure_open();
                let outcome = self.outcome();
                info!(
                    block = self.ctx.block_num,
                    trial = self.ctx.trial_num,
                    classification = %outcome.classification,
                    hit = outcome.classification.hit_target(),
                    timed_out = outcome.timed_out(),
                    rt = ?outcome.reaction_time_ms,
                    mt = ?outcome.movement_time_ms,
                    payout = outcome.payout,
                    block_total = outcome.block_total,
                    aborted = outcome.aborted,
                    "trial finished"
                );
            }
        }
        Ok(())
    }

    fn await_start(&mut self) -> Option<TrialPhase> {
        let click = self.first_press()?;
        (classify(click.at, &self.ctx.boundaries) == ClickClassification::Start)
            .then_some(TrialPhase::Reveal)
    }

    fn reveal(&mut self) -> TrialResult<Option<TrialPhase>> {
        // A release on the go deadline itself is left for `await_release`.
        if self.timeline.before(events::GO_SIGNAL)?
            && self.rig.input.control_released(&self.config.response.hold_control)
        {
            return Ok(Some(TrialPhase::Aborted));
        }

        let mut changed = false;
        if !self.rect_shown && self.timeline.after(events::RECT_ONSET)? {
            if let Some(rect) = self.ctx.boundaries.get(labels::RECT) {
                self.scene.add(StimulusId::boundary(labels::RECT), rect.center());
                changed = true;
            }
            self.rect_shown = true;
        }
        if !self.targets_shown && self.timeline.after(events::CIRCLE_ONSET)? {
            if self.targets_visible() {
                for label in [labels::REWARD, labels::PENALTY] {
                    let target = self.ctx.boundaries.require(label)?;
                    self.scene.add(StimulusId::boundary(label), target.center());
                }
                changed = true;
            }
            self.targets_shown = true;
        }
        if changed {
            self.scene.draw(&mut self.rig.presenter);
        }

        // Clicks before the go cue carry no meaning.
        self.rig.input.poll_clicks();

        Ok(self
            .timeline
            .after(events::GO_SIGNAL)?
            .then_some(TrialPhase::GoSignal))
    }

    fn await_release(&mut self) -> TrialResult<Option<TrialPhase>> {
        if self.timeline.after(events::TRIAL_TIMEOUT)? {
            debug!("response window closed before movement onset");
            return Ok(Some(TrialPhase::Resolve));
        }
        if !self.rig.input.control_released(&self.config.response.hold_control) {
            self.rig.input.poll_clicks();
            return Ok(None);
        }

        let now = self.timeline.clock_ms();
        let tone = self.tone_ms.unwrap_or(now);
        self.release_ms = Some(now);
        self.reaction_time_ms = Some(to_ms(now.saturating_sub(tone)));
        if self.ctx.condition.occludes() {
            self.rig.occlusion.close();
        }
        Ok(Some(TrialPhase::AwaitClick))
    }

    fn await_click(&mut self) -> TrialResult<Option<TrialPhase>> {
        if self.timeline.after(events::TRIAL_TIMEOUT)? {
            debug!("response window closed before a landing click");
            return Ok(Some(TrialPhase::Resolve));
        }
        let Some(click) = self.first_press() else {
            return Ok(None);
        };

        let classification = classify_response(click.at, &self.ctx.boundaries);
        if classification == ClickClassification::Outside
            && !self.config.response.accept_outside_clicks
        {
            debug!(x = click.at.x, y = click.at.y, "ignoring click outside the frame");
            return Ok(None);
        }

        let now = self.timeline.clock_ms();
        let release = self.release_ms.unwrap_or(now);
        self.movement_time_ms = Some(to_ms(now.saturating_sub(release)));
        self.classification = Some(classification);
        self.clicked_at = Some(click.at);
        Ok(Some(TrialPhase::Resolve))
    }

    fn resolve(&mut self) -> Option<TrialPhase> {
        if !self.elapsed_phase() {
            return None;
        }
        if self.ctx.condition.occludes() {
            self.rig.occlusion.ensure_open();
        }
        Some(TrialPhase::Feedback)
    }

    fn show_feedback(&mut self) -> Option<TrialPhase> {
        if !self.elapsed_phase() {
            return None;
        }
        let Some(screen) = self.feedback.pop_front() else {
            return Some(TrialPhase::End);
        };

        let presenter = &mut self.rig.presenter;
        presenter.clear();
        match screen {
            FeedbackScreen::Text(text) => presenter.message(&text, self.ctx.fixation),
            FeedbackScreen::Landing(at) => presenter.show(&StimulusId::LandingMarker, at),
        }
        presenter.flip();
        self.phase_until = self.timeline.clock_ms() + self.config.timing.feedback_ms;
        None
    }

    fn feedback_screens(&self) -> VecDeque<FeedbackScreen> {
        let mut screens = VecDeque::new();
        if self.classification == Some(ClickClassification::NoClick) {
            screens.push_back(FeedbackScreen::Text("Too slow!".to_string()));
        }
        match self.ctx.condition {
            Condition::Practice => {
                if let Some(mt) = self.movement_time_ms {
                    screens.push_back(FeedbackScreen::Text(format!("Movement time: {mt} ms")));
                }
            }
            Condition::RewardOcclusion => {
                screens.push_back(FeedbackScreen::Text(format!("{:+} points", self.payout)));
                screens.push_back(FeedbackScreen::Text(format!(
                    "Block total: {} points",
                    self.block_total
                )));
            }
            Condition::Vision => {
                if let (true, Some(at)) =
                    (self.config.feedback.show_landing_marker, self.clicked_at)
                {
                    screens.push_back(FeedbackScreen::Landing(at));
                }
            }
        }
        screens
    }

    fn targets_visible(&self) -> bool {
        !self.ctx.practicing() || self.config.feedback.show_targets_in_practice
    }

    fn elapsed_phase(&self) -> bool {
        self.timeline.clock_ms() >= self.phase_until
    }

    /// First press of this tick. Extra presses are an input anomaly, logged
    /// and dropped.
    fn first_press(&mut self) -> Option<Click> {
        let mut presses = self
            .rig
            .input
            .poll_clicks()
            .into_iter()
            .filter(|c| !c.released);
        let first = presses.next()?;
        let extra = presses.count();
        if extra > 0 {
            warn!(
                extra,
                x = first.at.x,
                y = first.at.y,
                "multiple clicks in one poll, using the first"
            );
        }
        Some(first)
    }

    fn outcome(&self) -> TrialOutcome {
        if let Some(elapsed) = self.abort_elapsed_ms {
            return TrialOutcome::aborted(self.ctx.bank, to_ms(elapsed));
        }
        TrialOutcome {
            reaction_time_ms: self.reaction_time_ms,
            movement_time_ms: self.movement_time_ms,
            classification: self.classification.unwrap_or(ClickClassification::NoClick),
            clicked_at: self.clicked_at,
            payout: self.payout,
            block_total: self.block_total,
            aborted: false,
            abort_elapsed_ms: None,
        }
    }

    fn teardown(&mut self) {
        self.rig.occlusion.ensure_open();
    }
}

fn to_ms(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}
