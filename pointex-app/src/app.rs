use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use pointex_core::{block_sequence, Point, ResultRow, StimulusId};
use pointex_experiment::{
    await_go_ahead, Apparatus, BlockRunner, ExperimentConfig, Layout, OcclusionDevice, Presenter,
    ScriptedInput, TrialError, TrialStateMachine,
};
use pointex_timing::Timer;
use rand::rngs::StdRng;
use tracing::{debug, info, trace};

use crate::participant::SimulatedParticipant;

/// Presenter for headless runs: every frame is reported through tracing.
#[derive(Debug, Default)]
pub struct LogPresenter {
    frames: u64,
}

impl LogPresenter {
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Presenter for LogPresenter {
    fn clear(&mut self) {}

    fn show(&mut self, stimulus: &StimulusId, at: Point) {
        trace!(?stimulus, x = at.x, y = at.y, "show");
    }

    fn message(&mut self, text: &str, _at: Point) {
        info!(text, "screen message");
    }

    fn flip(&mut self) {
        self.frames += 1;
    }

    fn tone(&mut self) {
        debug!("go tone");
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub blocks: usize,
    pub rows: usize,
    /// Aborted trials put back into their block.
    pub requeued: usize,
    pub quit: bool,
}

/// One participant session: every block in order, rows streamed to `sink`.
pub struct App<T: Timer, D: OcclusionDevice, W: Write> {
    config: ExperimentConfig,
    layout: Layout,
    timer: T,
    rig: Apparatus<ScriptedInput<T>, LogPresenter, D>,
    participant: SimulatedParticipant<StdRng>,
    rng: StdRng,
    sink: W,
}

impl<T: Timer, D: OcclusionDevice, W: Write> App<T, D, W> {
    pub fn new(
        config: ExperimentConfig,
        timer: T,
        device: D,
        participant: SimulatedParticipant<StdRng>,
        rng: StdRng,
        sink: W,
    ) -> Result<Self> {
        let layout = Layout::from_config(&config.layout).context("invalid display layout")?;
        info!(
            unit_px = layout.unit_px,
            target_radius_px = layout.target_radius_px,
            fixation_x = layout.fixation.x,
            fixation_y = layout.fixation.y,
            "layout ready"
        );
        let rig = Apparatus::new(ScriptedInput::new(timer.clone()), LogPresenter::default(), device);
        Ok(Self {
            config,
            layout,
            timer,
            rig,
            participant,
            rng,
            sink,
        })
    }

    #[cfg(test)]
    pub fn sink(&self) -> &W {
        &self.sink
    }

    #[cfg(test)]
    pub fn occlusion(&self) -> &pointex_experiment::OcclusionController<D> {
        &self.rig.occlusion
    }

    /// Runs all blocks. A quit request ends the session early but still
    /// counts as a clean exit.
    pub fn run(&mut self) -> Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        match self.run_blocks(&mut summary) {
            Ok(()) => {}
            Err(e) if matches!(e.downcast_ref::<TrialError>(), Some(TrialError::QuitRequested)) => {
                info!("session ended by quit request");
                summary.quit = true;
            }
            Err(e) => return Err(e),
        }
        self.rig.occlusion.ensure_open();
        self.sink.flush().context("flushing results")?;
        info!(
            blocks = summary.blocks,
            rows = summary.rows,
            requeued = summary.requeued,
            frames = self.rig.presenter.frames(),
            "session finished"
        );
        Ok(summary)
    }

    fn run_blocks(&mut self, summary: &mut SessionSummary) -> Result<()> {
        let blocks = block_sequence(
            self.config.starting_condition,
            self.config.run_practice_blocks,
            self.config.trials_per_block,
            self.config.trials_per_practice_block,
        );
        info!(
            blocks = blocks.len(),
            starting = %self.config.starting_condition,
            "session starting"
        );

        let poll = Duration::from_millis(self.config.timing.poll_interval_ms);
        let hold = self.config.response.hold_control.clone();

        for spec in blocks {
            let mut runner = BlockRunner::new(spec, self.layout.clone(), self.config.abort_policy);
            runner.begin(&mut self.rig.occlusion);

            self.participant
                .get_ready(self.rig.input.source_mut(), &self.timer, &hold);
            await_go_ahead(
                &mut self.rig,
                &self.timer,
                &runner.instructions(),
                &hold,
                poll,
                self.layout.fixation,
            )?;

            while let Some(ctx) = runner.next_trial(&mut self.rng)? {
                self.participant.prepare(
                    self.rig.input.source_mut(),
                    &self.timer,
                    &ctx,
                    &self.config,
                );
                let outcome =
                    TrialStateMachine::new(&self.config, &ctx, &mut self.rig, self.timer.clone())?
                        .run()?;
                if let Some(row) = runner.record(&ctx, &outcome) {
                    self.write_row(&row)?;
                    summary.rows += 1;
                }
                debug!(remaining = runner.remaining(), "trial booked");
            }

            runner.finish(&mut self.rig);
            summary.requeued += runner.requeued();
            summary.blocks += 1;
        }
        Ok(())
    }

    fn write_row(&mut self, row: &ResultRow) -> Result<()> {
        serde_json::to_writer(&mut self.sink, row).context("serialising result row")?;
        self.sink.write_all(b"\n").context("writing result row")?;
        Ok(())
    }
}
