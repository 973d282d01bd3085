use pointex_core::{labels, Point, Region};
use pointex_experiment::{ExperimentConfig, InputEvent, ScriptedInput, TrialContext};
use pointex_timing::Timer;
use rand::Rng;
use tracing::debug;

/// Response distribution of the simulated participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Behaviour {
    /// Chance of letting go before the go cue.
    pub premature_rate: f64,
    pub reaction_ms: (u64, u64),
    pub movement_ms: (u64, u64),
    /// Aim point scatter around the reward centre, in target radii.
    pub scatter_radii: f64,
    /// Delay before touching the start region, when one is configured.
    pub start_delay_ms: u64,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            premature_rate: 0.05,
            reaction_ms: (180, 420),
            movement_ms: (250, 700),
            scatter_radii: 1.2,
            start_delay_ms: 250,
        }
    }
}

/// Scripts a plausible reach for each trial into a `ScriptedInput`.
#[derive(Debug)]
pub struct SimulatedParticipant<R: Rng> {
    behaviour: Behaviour,
    rng: R,
}

impl<R: Rng> SimulatedParticipant<R> {
    pub fn new(behaviour: Behaviour, rng: R) -> Self {
        Self { behaviour, rng }
    }

    /// Presses the hold control right away.
    pub fn get_ready<T: Timer>(&mut self, script: &mut ScriptedInput<T>, timer: &T, control: &str) {
        script.clear();
        script.schedule(timer.now_ms(), InputEvent::press(control));
    }

    /// Schedules press, release and landing click for a trial that is about
    /// to start.
    pub fn prepare<T: Timer>(
        &mut self,
        script: &mut ScriptedInput<T>,
        timer: &T,
        ctx: &TrialContext,
        config: &ExperimentConfig,
    ) {
        let b = &self.behaviour;
        let control = config.response.hold_control.as_str();
        let now = timer.now_ms();
        script.clear();
        script.schedule(now, InputEvent::press(control));

        let mut reveal_at = now;
        if let Some(start) = ctx.boundaries.get(labels::START) {
            reveal_at += b.start_delay_ms;
            let at = start.center();
            script.schedule(reveal_at, InputEvent::click(at.x, at.y));
        }

        let timing = &config.timing;
        let go_at = reveal_at + timing.rect_onset_ms + timing.circle_onset_ms + timing.go_signal_ms;
        let release_at = if self.rng.random_bool(b.premature_rate.clamp(0.0, 1.0)) {
            let early = self.rng.random_range(1..=timing.go_signal_ms.max(1));
            go_at.saturating_sub(early).max(reveal_at)
        } else {
            go_at + sample(&mut self.rng, b.reaction_ms)
        };
        let click_at = release_at + sample(&mut self.rng, b.movement_ms);

        let aim = ctx.targets.reward.center();
        let spread = ctx.targets.reward.radius() * b.scatter_radii;
        let landing = if spread > 0.0 {
            Point::new(
                aim.x + self.rng.random_range(-spread..spread),
                aim.y + self.rng.random_range(-spread..spread),
            )
        } else {
            aim
        };

        debug!(
            release_in_ms = release_at - now,
            click_in_ms = click_at - now,
            x = landing.x,
            y = landing.y,
            "participant scripted"
        );
        script.schedule(release_at, InputEvent::release(control));
        script.schedule(click_at, InputEvent::click(landing.x, landing.y));
    }
}

fn sample<R: Rng>(rng: &mut R, (lo, hi): (u64, u64)) -> u64 {
    if hi > lo { rng.random_range(lo..=hi) } else { lo }
}
