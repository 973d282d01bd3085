//! Unit tests for pointex-experiment.

use pointex_core::{
    BlockSpec, CircleBoundary, ClickClassification, Condition, PenaltySide, Point, StimulusId,
    TrialOutcome, TrialPhase,
};
use pointex_timing::{ManualTimer, Timer};

use crate::{
    Apparatus, DeviceError, DeviceResult, ExperimentConfig, InputEvent, Layout, LayoutConfig,
    OcclusionCommand, OcclusionDevice, Presenter, ScriptedInput, TargetPair, TrialContext,
    TrialStateMachine, TrialTiming,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

const HOLD: &str = "space";
const TARGET_R: f64 = 34.0;

#[derive(Debug, Clone, PartialEq)]
enum Draw {
    Clear,
    Show(StimulusId, Point),
    Message(String),
    Flip,
    Tone,
}

#[derive(Debug, Default)]
struct RecordingPresenter {
    log: Vec<Draw>,
}

impl RecordingPresenter {
    fn messages(&self) -> Vec<&str> {
        self.log
            .iter()
            .filter_map(|d| match d {
                Draw::Message(m) => Some(m.as_str()),
                _ => None,
            })
            .collect()
    }

    fn shown(&self, stimulus: &StimulusId) -> bool {
        self.log
            .iter()
            .any(|d| matches!(d, Draw::Show(s, _) if s == stimulus))
    }
}

impl Presenter for RecordingPresenter {
    fn clear(&mut self) {
        self.log.push(Draw::Clear);
    }
    fn show(&mut self, stimulus: &StimulusId, at: Point) {
        self.log.push(Draw::Show(stimulus.clone(), at));
    }
    fn message(&mut self, text: &str, _at: Point) {
        self.log.push(Draw::Message(text.to_string()));
    }
    fn flip(&mut self) {
        self.log.push(Draw::Flip);
    }
    fn tone(&mut self) {
        self.log.push(Draw::Tone);
    }
}

/// Records every command attempt; fails the first `fail_opens` opens.
#[derive(Debug, Default)]
struct RecordingDevice {
    attempts: Vec<OcclusionCommand>,
    fail_opens: usize,
}

impl OcclusionDevice for RecordingDevice {
    fn send(&mut self, command: OcclusionCommand) -> DeviceResult<()> {
        self.attempts.push(command);
        if command == OcclusionCommand::Open && self.fail_opens > 0 {
            self.fail_opens -= 1;
            return Err(DeviceError::Unavailable);
        }
        Ok(())
    }
}

type Rig = Apparatus<ScriptedInput<ManualTimer>, RecordingPresenter, RecordingDevice>;

fn rig(script: ScriptedInput<ManualTimer>) -> Rig {
    Apparatus::new(script, RecordingPresenter::default(), RecordingDevice::default())
}

/// Everything revealed at t=0, go cue at t=0, 650 ms response window.
fn fast_config() -> ExperimentConfig {
    let mut cfg = ExperimentConfig::default();
    cfg.timing = TrialTiming {
        rect_onset_ms: 0,
        circle_onset_ms: 0,
        go_signal_ms: 0,
        response_timeout_ms: 650,
        reveal_delay_ms: 300,
        feedback_ms: 1000,
        abort_feedback_ms: 1000,
        poll_interval_ms: 1,
    };
    cfg.payouts.timeout = -50;
    cfg
}

/// Overlapping targets either side of the fixation point: reward left,
/// penalty right, centres 40 px apart.
fn context(cfg: &ExperimentConfig, condition: Condition) -> TrialContext {
    let layout = Layout::from_config(&cfg.layout).unwrap();
    let fix = layout.fixation;
    let targets = TargetPair {
        side: PenaltySide::Right,
        reward: CircleBoundary::new(fix.offset(-20.0, 0.0), TARGET_R).unwrap(),
        penalty: CircleBoundary::new(fix.offset(20.0, 0.0), TARGET_R).unwrap(),
    };
    TrialContext::new(1, 1, condition, &layout, targets, 200)
}

fn reward_point(ctx: &TrialContext) -> Point {
    ctx.fixation.offset(-50.0, 0.0)
}

fn penalty_point(ctx: &TrialContext) -> Point {
    ctx.fixation.offset(50.0, 0.0)
}

fn run(
    cfg: &ExperimentConfig,
    ctx: &TrialContext,
    rig: &mut Rig,
    timer: &ManualTimer,
) -> TrialOutcome {
    TrialStateMachine::new(cfg, ctx, rig, timer.clone())
        .unwrap()
        .run()
        .unwrap()
}

// ── Trial scenarios ───────────────────────────────────────────────────────────

#[cfg(test)]
mod scenarios {
    use super::*;

    #[test]
    fn successful_reach_into_reward() {
        let timer = ManualTimer::new();
        let cfg = fast_config();
        let ctx = context(&cfg, Condition::RewardOcclusion);
        let target = reward_point(&ctx);
        let script = ScriptedInput::new(timer.clone())
            .with(120, InputEvent::release(HOLD))
            .with(350, InputEvent::click(target.x, target.y));
        let mut rig = rig(script);

        let outcome = run(&cfg, &ctx, &mut rig, &timer);

        assert_eq!(outcome.reaction_time_ms, Some(120));
        assert_eq!(outcome.movement_time_ms, Some(230));
        assert_eq!(outcome.classification, ClickClassification::Reward);
        assert_eq!(outcome.clicked_at, Some(target));
        assert_eq!(outcome.payout, cfg.payouts.reward);
        assert_eq!(outcome.block_total, 200 + cfg.payouts.reward);
        assert!(!outcome.aborted);
        assert!(rig.occlusion.is_open());
        assert_eq!(
            rig.occlusion.device().attempts,
            vec![OcclusionCommand::Close, OcclusionCommand::Open]
        );
        assert_eq!(
            rig.presenter.messages(),
            vec!["+100 points", "Block total: 300 points"]
        );
        assert!(rig.presenter.log.contains(&Draw::Tone));
    }

    #[test]
    fn occlusion_lifts_after_reveal_delay() {
        let timer = ManualTimer::new();
        let cfg = fast_config();
        let ctx = context(&cfg, Condition::RewardOcclusion);
        let target = penalty_point(&ctx);
        let script = ScriptedInput::new(timer.clone())
            .with(100, InputEvent::release(HOLD))
            .with(300, InputEvent::click(target.x, target.y));
        let mut rig = rig(script);
        let mut machine = TrialStateMachine::new(&cfg, &ctx, &mut rig, timer.clone()).unwrap();

        while machine.phase() != TrialPhase::Resolve {
            if machine.tick().unwrap() == crate::Step::Stay {
                timer.advance_ms(1);
            }
        }
        assert_eq!(timer.now_ms(), 300);
        timer.set_ms(599);
        machine.tick().unwrap();
        assert_eq!(machine.phase(), TrialPhase::Resolve);
        timer.set_ms(600);
        assert_eq!(machine.tick().unwrap(), crate::Step::Enter(TrialPhase::Feedback));
        drop(machine);
        assert!(rig.occlusion.is_open());
    }

    #[test]
    fn timeout_without_any_input() {
        let timer = ManualTimer::new();
        let cfg = fast_config();
        let ctx = context(&cfg, Condition::RewardOcclusion);
        let mut rig = rig(ScriptedInput::new(timer.clone()));

        let outcome = run(&cfg, &ctx, &mut rig, &timer);

        assert_eq!(outcome.classification, ClickClassification::NoClick);
        assert_eq!(outcome.reaction_time_ms, None);
        assert_eq!(outcome.movement_time_ms, None);
        assert_eq!(outcome.payout, -50);
        assert_eq!(outcome.block_total, 150);
        assert!(outcome.timed_out());
        assert!(rig.occlusion.is_open());
        assert!(rig.occlusion.device().attempts.is_empty());
        assert_eq!(rig.presenter.messages()[0], "Too slow!");
    }

    #[test]
    fn release_without_click_times_out_with_reaction_time() {
        let timer = ManualTimer::new();
        let cfg = fast_config();
        let ctx = context(&cfg, Condition::RewardOcclusion);
        let script = ScriptedInput::new(timer.clone()).with(200, InputEvent::release(HOLD));
        let mut rig = rig(script);

        let outcome = run(&cfg, &ctx, &mut rig, &timer);

        assert_eq!(outcome.classification, ClickClassification::NoClick);
        assert_eq!(outcome.reaction_time_ms, Some(200));
        assert_eq!(outcome.movement_time_ms, None);
        assert!(rig.occlusion.is_open());
    }

    #[test]
    fn premature_release_aborts() {
        let timer = ManualTimer::new();
        let mut cfg = fast_config();
        cfg.timing.rect_onset_ms = 100;
        cfg.timing.circle_onset_ms = 200;
        cfg.timing.go_signal_ms = 200;
        let ctx = context(&cfg, Condition::RewardOcclusion);
        let target = reward_point(&ctx);
        let script = ScriptedInput::new(timer.clone())
            .with(200, InputEvent::release(HOLD))
            .with(400, InputEvent::click(target.x, target.y));
        let mut rig = rig(script);

        let outcome = run(&cfg, &ctx, &mut rig, &timer);

        assert!(outcome.aborted);
        assert_eq!(outcome.payout, 0);
        assert_eq!(outcome.block_total, 200);
        assert_eq!(outcome.abort_elapsed_ms, Some(200));
        assert_eq!(outcome.reaction_time_ms, None);
        assert!(rig.occlusion.is_open());
        assert!(!rig.presenter.log.contains(&Draw::Tone));
        assert!(rig.presenter.messages()[0].starts_with("Too early"));
        // Warning stays up for the abort delay.
        assert_eq!(timer.now_ms(), 1200);
    }

    #[test]
    fn lift_and_re_press_before_go_aborts() {
        let timer = ManualTimer::new();
        let mut cfg = fast_config();
        cfg.timing.rect_onset_ms = 100;
        cfg.timing.circle_onset_ms = 200;
        cfg.timing.go_signal_ms = 200;
        let ctx = context(&cfg, Condition::RewardOcclusion);
        let script = ScriptedInput::new(timer.clone())
            .with(200, InputEvent::release(HOLD))
            .with(200, InputEvent::press(HOLD));
        let mut rig = rig(script);

        let outcome = run(&cfg, &ctx, &mut rig, &timer);

        assert!(outcome.aborted);
        assert_eq!(outcome.abort_elapsed_ms, Some(200));
        assert_eq!(outcome.payout, 0);
        assert!(rig.occlusion.device().attempts.is_empty());
    }

    #[test]
    fn release_on_the_go_deadline_is_not_premature() {
        let timer = ManualTimer::new();
        let mut cfg = fast_config();
        cfg.timing.rect_onset_ms = 100;
        cfg.timing.circle_onset_ms = 200;
        cfg.timing.go_signal_ms = 200;
        let ctx = context(&cfg, Condition::RewardOcclusion);
        let target = reward_point(&ctx);
        let script = ScriptedInput::new(timer.clone())
            .with(500, InputEvent::release(HOLD))
            .with(800, InputEvent::click(target.x, target.y));
        let mut rig = rig(script);

        let outcome = run(&cfg, &ctx, &mut rig, &timer);

        assert!(!outcome.aborted);
        assert_eq!(outcome.reaction_time_ms, Some(0));
        assert_eq!(outcome.movement_time_ms, Some(300));
        assert_eq!(outcome.classification, ClickClassification::Reward);
        assert!(rig.presenter.log.contains(&Draw::Tone));
        assert!(rig.occlusion.is_open());
    }

    #[test]
    fn release_one_tick_before_go_is_premature() {
        let timer = ManualTimer::new();
        let mut cfg = fast_config();
        cfg.timing.go_signal_ms = 500;
        let ctx = context(&cfg, Condition::Vision);
        let script = ScriptedInput::new(timer.clone()).with(499, InputEvent::release(HOLD));
        let mut rig = rig(script);

        let outcome = run(&cfg, &ctx, &mut rig, &timer);

        assert!(outcome.aborted);
        assert_eq!(outcome.abort_elapsed_ms, Some(499));
    }

    #[test]
    fn quit_mid_window_reopens_goggles() {
        let timer = ManualTimer::new();
        let cfg = fast_config();
        let ctx = context(&cfg, Condition::RewardOcclusion);
        let script = ScriptedInput::new(timer.clone())
            .with(100, InputEvent::release(HOLD))
            .with(150, InputEvent::Quit);
        let mut rig = rig(script);

        let result = TrialStateMachine::new(&cfg, &ctx, &mut rig, timer.clone())
            .unwrap()
            .run();

        assert!(matches!(result, Err(crate::TrialError::QuitRequested)));
        assert!(rig.occlusion.is_open());
        assert_eq!(
            rig.occlusion.device().attempts,
            vec![OcclusionCommand::Close, OcclusionCommand::Open]
        );
    }

    #[test]
    fn extra_clicks_in_one_poll_use_the_first() {
        let timer = ManualTimer::new();
        let cfg = fast_config();
        let ctx = context(&cfg, Condition::Vision);
        let (first, second) = (penalty_point(&ctx), reward_point(&ctx));
        let script = ScriptedInput::new(timer.clone())
            .with(150, InputEvent::release(HOLD))
            .with(300, InputEvent::click(first.x, first.y))
            .with(300, InputEvent::click(second.x, second.y));
        let mut rig = rig(script);

        let outcome = run(&cfg, &ctx, &mut rig, &timer);

        assert_eq!(outcome.classification, ClickClassification::Penalty);
        assert_eq!(outcome.clicked_at, Some(first));
    }

    #[test]
    fn overlap_and_miss_classifications() {
        for (dy, expected) in [
            (0.0, ClickClassification::Overlap),
            (100.0, ClickClassification::RectOnly),
            (-1000.0, ClickClassification::Outside),
        ] {
            let timer = ManualTimer::new();
            let cfg = fast_config();
            let ctx = context(&cfg, Condition::Vision);
            let p = ctx.fixation.offset(0.0, dy);
            let script = ScriptedInput::new(timer.clone())
                .with(100, InputEvent::release(HOLD))
                .with(200, InputEvent::click(p.x, p.y));
            let mut rig = rig(script);
            let outcome = run(&cfg, &ctx, &mut rig, &timer);
            assert_eq!(outcome.classification, expected);
            assert_eq!(outcome.payout, cfg.payouts.payout(expected));
        }
    }

    #[test]
    fn outside_clicks_can_be_ignored() {
        let timer = ManualTimer::new();
        let mut cfg = fast_config();
        cfg.response.accept_outside_clicks = false;
        let ctx = context(&cfg, Condition::Vision);
        let target = reward_point(&ctx);
        let script = ScriptedInput::new(timer.clone())
            .with(100, InputEvent::release(HOLD))
            .with(200, InputEvent::click(5.0, 5.0))
            .with(260, InputEvent::click(target.x, target.y));
        let mut rig = rig(script);

        let outcome = run(&cfg, &ctx, &mut rig, &timer);

        assert_eq!(outcome.classification, ClickClassification::Reward);
        assert_eq!(outcome.movement_time_ms, Some(160));
    }

    #[test]
    fn start_hold_anchors_the_timeline() {
        let timer = ManualTimer::new();
        let mut cfg = fast_config();
        cfg.layout.start_hold = true;
        cfg.timing.rect_onset_ms = 100;
        cfg.timing.circle_onset_ms = 100;
        cfg.timing.go_signal_ms = 100;
        let ctx = context(&cfg, Condition::Vision);
        let start = ctx.boundaries.get(pointex_core::labels::START).unwrap();
        let start_at = pointex_core::Region::center(start);
        let target = reward_point(&ctx);
        let script = ScriptedInput::new(timer.clone())
            // Miss the start region first; nothing should happen.
            .with(40, InputEvent::click(5.0, 5.0))
            .with(100, InputEvent::click(start_at.x, start_at.y))
            .with(520, InputEvent::release(HOLD))
            .with(750, InputEvent::click(target.x, target.y));
        let mut rig = rig(script);

        let outcome = run(&cfg, &ctx, &mut rig, &timer);

        assert_eq!(outcome.reaction_time_ms, Some(120));
        assert_eq!(outcome.movement_time_ms, Some(230));
        assert_eq!(outcome.classification, ClickClassification::Reward);
        let first_show = rig.presenter.log.iter().find_map(|d| match d {
            Draw::Show(s, _) => Some(s.clone()),
            _ => None,
        });
        assert_eq!(first_show, Some(StimulusId::boundary("start")));
    }

    #[test]
    fn failed_open_is_retried_at_trial_end() {
        let timer = ManualTimer::new();
        let cfg = fast_config();
        let ctx = context(&cfg, Condition::RewardOcclusion);
        let target = reward_point(&ctx);
        let script = ScriptedInput::new(timer.clone())
            .with(120, InputEvent::release(HOLD))
            .with(350, InputEvent::click(target.x, target.y));
        let mut rig = rig(script);
        rig.occlusion.device_mut().fail_opens = 1;

        let outcome = run(&cfg, &ctx, &mut rig, &timer);

        assert_eq!(outcome.classification, ClickClassification::Reward);
        assert!(rig.occlusion.is_open());
        assert_eq!(
            rig.occlusion.device().attempts,
            vec![
                OcclusionCommand::Close,
                OcclusionCommand::Open,
                OcclusionCommand::Open
            ]
        );
    }

    #[test]
    fn first_ticks_report_transitions() {
        let timer = ManualTimer::new();
        let cfg = fast_config();
        let ctx = context(&cfg, Condition::Vision);
        let mut rig = rig(ScriptedInput::new(timer.clone()));
        let mut machine = TrialStateMachine::new(&cfg, &ctx, &mut rig, timer.clone()).unwrap();

        assert_eq!(machine.phase(), TrialPhase::Reveal);
        assert_eq!(machine.tick().unwrap(), crate::Step::Enter(TrialPhase::GoSignal));
        assert_eq!(machine.tick().unwrap(), crate::Step::Enter(TrialPhase::AwaitRelease));
        assert_eq!(machine.tick().unwrap(), crate::Step::Stay);
    }

    #[test]
    fn unknown_extra_stimulus_fails_fast() {
        let timer = ManualTimer::new();
        let mut cfg = fast_config();
        cfg.feedback.also_draw = vec!["nope".to_string()];
        let ctx = context(&cfg, Condition::Vision);
        let mut rig = rig(ScriptedInput::new(timer.clone()));

        let err = TrialStateMachine::new(&cfg, &ctx, &mut rig, timer.clone())
            .err()
            .unwrap();
        assert!(matches!(err, crate::TrialError::UnknownStimulus(ref l) if l == "nope"));
    }
}

// ── Feedback by condition ─────────────────────────────────────────────────────

#[cfg(test)]
mod feedback {
    use super::*;

    fn reach(cfg: &ExperimentConfig, condition: Condition) -> (TrialOutcome, Rig) {
        let timer = ManualTimer::new();
        let ctx = context(cfg, condition);
        let target = reward_point(&ctx);
        let script = ScriptedInput::new(timer.clone())
            .with(100, InputEvent::release(HOLD))
            .with(300, InputEvent::click(target.x, target.y));
        let mut rig = rig(script);
        let outcome = run(cfg, &ctx, &mut rig, &timer);
        (outcome, rig)
    }

    #[test]
    fn practice_shows_movement_time_only() {
        let (outcome, rig) = reach(&fast_config(), Condition::Practice);
        assert_eq!(outcome.movement_time_ms, Some(200));
        assert_eq!(rig.presenter.messages(), vec!["Movement time: 200 ms"]);
        assert!(rig.occlusion.device().attempts.is_empty());
    }

    #[test]
    fn practice_can_hide_targets() {
        let mut cfg = fast_config();
        cfg.feedback.show_targets_in_practice = false;
        let (_, rig) = reach(&cfg, Condition::Practice);
        assert!(rig.presenter.shown(&StimulusId::boundary("rect")));
        assert!(!rig.presenter.shown(&StimulusId::boundary("reward")));
    }

    #[test]
    fn vision_never_shows_points() {
        let mut cfg = fast_config();
        cfg.feedback.show_landing_marker = true;
        let (outcome, rig) = reach(&cfg, Condition::Vision);
        assert_eq!(outcome.payout, cfg.payouts.reward);
        assert!(rig.presenter.messages().is_empty());
        assert!(rig.presenter.shown(&StimulusId::LandingMarker));
        assert!(rig.presenter.shown(&StimulusId::boundary("penalty")));
    }
}

// ── Block runner ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod block {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::{AbortPolicy, BlockRunner};

    fn runner(policy: AbortPolicy) -> BlockRunner {
        let layout = Layout::from_config(&LayoutConfig::default()).unwrap();
        let spec = BlockSpec {
            number: 2,
            condition: Condition::RewardOcclusion,
            trials: 3,
        };
        BlockRunner::new(spec, layout, policy)
    }

    fn scored(payout: i32) -> TrialOutcome {
        TrialOutcome {
            reaction_time_ms: Some(150),
            movement_time_ms: Some(300),
            classification: ClickClassification::Reward,
            clicked_at: Some(Point::new(1.0, 2.0)),
            payout,
            block_total: 0,
            aborted: false,
            abort_elapsed_ms: None,
        }
    }

    #[test]
    fn bank_follows_scored_trials() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut runner = runner(AbortPolicy::Requeue);
        let ctx = runner.next_trial(&mut rng).unwrap().unwrap();
        assert_eq!(ctx.bank, 0);
        runner.record(&ctx, &scored(100));
        let ctx = runner.next_trial(&mut rng).unwrap().unwrap();
        assert_eq!(ctx.bank, 100);
        assert_eq!(ctx.trial_num, 2);
        let row = runner.record(&ctx, &scored(-600)).unwrap();
        assert_eq!(row.block_num, 2);
        assert_eq!(runner.bank(), -500);
    }

    #[test]
    fn aborted_trial_is_requeued() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut runner = runner(AbortPolicy::Requeue);
        let ctx = runner.next_trial(&mut rng).unwrap().unwrap();
        assert!(runner.record(&ctx, &TrialOutcome::aborted(0, 80)).is_none());
        assert_eq!(runner.remaining(), 3);
        assert_eq!(runner.requeued(), 1);
        let order: Vec<usize> = std::iter::from_fn(|| runner.next_trial(&mut rng).unwrap())
            .map(|c| c.trial_num)
            .collect();
        assert_eq!(order, vec![2, 3, 1]);
        assert_eq!(runner.bank(), 0);
    }

    #[test]
    fn aborted_trial_recorded_as_void() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut runner = runner(AbortPolicy::RecordVoid);
        let ctx = runner.next_trial(&mut rng).unwrap().unwrap();
        let row = runner.record(&ctx, &TrialOutcome::aborted(0, 80)).unwrap();
        assert!(row.aborted);
        assert_eq!(row.trial_payout, 0);
        assert_eq!(row.abort_elapsed, Some(80));
        assert_eq!(runner.remaining(), 2);
    }

    #[test]
    fn begin_resets_and_opens() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut runner = runner(AbortPolicy::Requeue);
        let ctx = runner.next_trial(&mut rng).unwrap().unwrap();
        runner.record(&ctx, &scored(100));
        let mut rig = rig(ScriptedInput::new(ManualTimer::new()));
        runner.begin(&mut rig.occlusion);
        assert_eq!(runner.bank(), 0);
        assert_eq!(rig.occlusion.device().attempts, vec![OcclusionCommand::Open]);
        assert!(runner.instructions().contains("Block 2"));
    }

    #[test]
    fn go_ahead_waits_for_the_hold_control() {
        let timer = ManualTimer::new();
        let script = ScriptedInput::new(timer.clone()).with(40, InputEvent::press(HOLD));
        let mut rig = rig(script);
        crate::await_go_ahead(
            &mut rig,
            &timer,
            "Press space",
            HOLD,
            std::time::Duration::from_millis(1),
            Point::default(),
        )
        .unwrap();
        assert_eq!(timer.now_ms(), 40);
        assert!(rig.input.is_held(HOLD));
    }
}

// ── Layout ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod layout {
    use pointex_core::Region;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::LayoutError;

    #[test]
    fn unit_conversion() {
        let cfg = LayoutConfig {
            ppi: 25.4,
            unit_mm: 10.0,
            ..LayoutConfig::default()
        };
        let layout = Layout::from_config(&cfg).unwrap();
        assert_eq!(layout.unit_px, 10.0);
        assert_eq!(layout.rect.width(), 130.0);
        assert_eq!(layout.rect.height(), 90.0);
        assert_eq!(layout.target_radius_px, 10.0);
        assert_eq!(layout.fixation, Point::new(960.0, 1080.0 - 210.0));
    }

    #[test]
    fn placed_targets_stay_inside_the_frame() {
        let layout = Layout::from_config(&LayoutConfig::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for side in [PenaltySide::Left, PenaltySide::Right] {
            for _ in 0..200 {
                let pair = layout.place_targets(side, &mut rng).unwrap();
                for c in [pair.reward, pair.penalty] {
                    assert!(layout.rect.contains(c.center()));
                }
                let (p, r) = (pair.penalty.center(), pair.reward.center());
                assert_eq!(p.y, r.y);
                match side {
                    PenaltySide::Left => assert!(p.x < r.x),
                    PenaltySide::Right => assert!(p.x > r.x),
                }
                let gap = (p.x - r.x).abs();
                assert!((gap - 2.0 * layout.target_radius_px).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn oversized_targets_are_rejected() {
        let cfg = LayoutConfig {
            circle_diameter_units: 12.0,
            ..LayoutConfig::default()
        };
        let layout = Layout::from_config(&cfg).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            layout.random_targets(&mut rng),
            Err(LayoutError::TargetsDoNotFit { .. })
        ));
    }

    #[test]
    fn start_region_is_optional() {
        let layout = Layout::from_config(&LayoutConfig::default()).unwrap();
        assert!(!layout.base_boundaries().has("start"));
        let cfg = LayoutConfig {
            start_hold: true,
            ..LayoutConfig::default()
        };
        let layout = Layout::from_config(&cfg).unwrap();
        assert!(layout.base_boundaries().has("start"));
    }
}

// ── Input, occlusion, config ──────────────────────────────────────────────────

#[cfg(test)]
mod plumbing {
    use super::*;
    use crate::{InputMonitor, InputSource, OcclusionCodes, OcclusionController, SerialTrigger};

    #[test]
    fn release_reported_once_per_transition() {
        let timer = ManualTimer::new();
        let script = ScriptedInput::new(timer.clone())
            .with(0, InputEvent::press(HOLD))
            .with(5, InputEvent::release(HOLD))
            .with(5, InputEvent::click(1.0, 2.0));
        let mut monitor = InputMonitor::new(script);

        monitor.pump();
        assert!(monitor.is_held(HOLD));
        assert!(!monitor.control_released(HOLD));

        timer.set_ms(5);
        monitor.pump();
        assert!(monitor.control_released(HOLD));
        assert!(!monitor.control_released(HOLD));
        assert_eq!(monitor.poll_clicks().len(), 1);
        assert!(monitor.poll_clicks().is_empty());
    }

    #[test]
    fn re_press_keeps_the_pending_release() {
        let timer = ManualTimer::new();
        let script = ScriptedInput::new(timer.clone())
            .with(0, InputEvent::press(HOLD))
            .with(5, InputEvent::release(HOLD))
            .with(5, InputEvent::press(HOLD));
        let mut monitor = InputMonitor::new(script);

        timer.set_ms(5);
        monitor.pump();
        assert!(monitor.is_held(HOLD));
        assert!(monitor.control_released(HOLD));
        assert!(!monitor.control_released(HOLD));
    }

    #[test]
    fn releases_in_one_poll_are_counted() {
        let timer = ManualTimer::new();
        let script = ScriptedInput::new(timer.clone())
            .with(0, InputEvent::release(HOLD))
            .with(0, InputEvent::press(HOLD))
            .with(0, InputEvent::release(HOLD))
            .with(0, InputEvent::release("other"));
        let mut monitor = InputMonitor::new(script);

        monitor.pump();
        assert!(!monitor.is_held(HOLD));
        assert!(monitor.control_released(HOLD));
        assert!(monitor.control_released(HOLD));
        assert!(!monitor.control_released(HOLD));
        assert!(monitor.control_released("other"));

        monitor.discard_pending();
        assert!(!monitor.control_released("other"));
    }

    #[test]
    fn scripted_input_delivers_in_time_order() {
        let timer = ManualTimer::new();
        let mut script = ScriptedInput::new(timer.clone());
        script.schedule(30, InputEvent::Quit);
        script.schedule(10, InputEvent::press("a"));
        script.schedule(10, InputEvent::press("b"));
        timer.set_ms(10);
        assert_eq!(
            script.poll(),
            vec![InputEvent::press("a"), InputEvent::press("b")]
        );
        assert_eq!(script.pending(), 1);
    }

    #[test]
    fn serial_trigger_writes_codes() {
        let mut link = Vec::new();
        {
            let mut controller =
                OcclusionController::new(SerialTrigger::new(&mut link, OcclusionCodes::default()));
            assert!(controller.close());
            assert!(!controller.is_open());
            assert!(controller.ensure_open());
            assert!(controller.ensure_open());
        }
        assert_eq!(link, b"5655");
    }

    #[test]
    fn dropping_a_closed_controller_opens() {
        let mut link = Vec::new();
        {
            let mut controller =
                OcclusionController::new(SerialTrigger::new(&mut link, OcclusionCodes::default()));
            controller.close();
        }
        assert_eq!(link, b"5655");
    }

    #[test]
    fn failed_open_leaves_state_closed() {
        let mut controller = OcclusionController::new(RecordingDevice {
            fail_opens: 1,
            ..RecordingDevice::default()
        });
        controller.close();
        assert!(!controller.open());
        assert!(!controller.is_open());
        assert!(controller.ensure_open());
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let cfg = ExperimentConfig::from_json_str(
            r#"{
                "starting_condition": "reward",
                "timing": { "go_signal_ms": 800 },
                "payouts": { "timeout": -100 },
                "abort_policy": "record_void"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.starting_condition, Condition::RewardOcclusion);
        assert_eq!(cfg.timing.go_signal_ms, 800);
        assert_eq!(cfg.timing.rect_onset_ms, 300);
        assert_eq!(cfg.payouts.timeout, -100);
        assert_eq!(cfg.payouts.reward, 100);
        assert_eq!(cfg.abort_policy, crate::AbortPolicy::RecordVoid);
        assert_eq!(cfg.occlusion.open, "55");
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(matches!(
            ExperimentConfig::from_json_str("{ \"timing\": 3 }"),
            Err(crate::ConfigError::Json(_))
        ));
    }
}
