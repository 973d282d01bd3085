//! Discrete input: held controls, point clicks and quit requests.

use std::collections::{HashMap, HashSet, VecDeque};

use pointex_core::Point;
use pointex_timing::Timer;

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    ControlPressed(String),
    ControlReleased(String),
    Click { at: Point, released: bool },
    Quit,
}

impl InputEvent {
    pub fn press(name: &str) -> Self {
        Self::ControlPressed(name.to_string())
    }

    pub fn release(name: &str) -> Self {
        Self::ControlReleased(name.to_string())
    }

    pub fn click(x: f64, y: f64) -> Self {
        Self::Click {
            at: Point::new(x, y),
            released: false,
        }
    }
}

/// A point event as reported by `InputMonitor::poll_clicks`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Click {
    pub at: Point,
    pub released: bool,
}

/// Where input comes from. Queried, never pushed to.
pub trait InputSource {
    /// Everything that happened since the previous call, oldest first.
    fn poll(&mut self) -> Vec<InputEvent>;
}

/// Buffers one tick's worth of input and answers the trial's questions.
#[derive(Debug)]
pub struct InputMonitor<S: InputSource> {
    source: S,
    held: HashSet<String>,
    /// Release transitions not yet reported, per control.
    releases: HashMap<String, usize>,
    clicks: Vec<Click>,
    quit: bool,
}

impl<S: InputSource> InputMonitor<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            held: HashSet::new(),
            releases: HashMap::new(),
            clicks: Vec::new(),
            quit: false,
        }
    }

    /// Drains the source. Called once at the top of every tick.
    pub fn pump(&mut self) {
        for event in self.source.poll() {
            match event {
                InputEvent::ControlPressed(name) => {
                    self.held.insert(name);
                }
                InputEvent::ControlReleased(name) => {
                    self.held.remove(&name);
                    *self.releases.entry(name).or_default() += 1;
                }
                InputEvent::Click { at, released } => self.clicks.push(Click { at, released }),
                InputEvent::Quit => self.quit = true,
            }
        }
    }

    /// True exactly once per release of `name`, even when the control was
    /// pressed again within the same poll.
    pub fn control_released(&mut self, name: &str) -> bool {
        match self.releases.get_mut(name) {
            Some(n) if *n > 1 => {
                *n -= 1;
                true
            }
            Some(_) => self.releases.remove(name).is_some(),
            None => false,
        }
    }

    pub fn is_held(&self, name: &str) -> bool {
        self.held.contains(name)
    }

    /// Clicks buffered since the previous call.
    pub fn poll_clicks(&mut self) -> Vec<Click> {
        std::mem::take(&mut self.clicks)
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Forgets buffered releases and clicks, keeping held state and any quit
    /// request. Used at trial start so nothing leaks between trials.
    pub fn discard_pending(&mut self) {
        self.releases.clear();
        self.clicks.clear();
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

/// Replays events at fixed timer readings (milliseconds).
#[derive(Debug, Clone)]
pub struct ScriptedInput<T: Timer> {
    timer: T,
    script: VecDeque<(u64, InputEvent)>,
}

impl<T: Timer> ScriptedInput<T> {
    pub fn new(timer: T) -> Self {
        Self {
            timer,
            script: VecDeque::new(),
        }
    }

    /// Queues `event` for delivery once the timer reads `at_ms`.
    pub fn schedule(&mut self, at_ms: u64, event: InputEvent) {
        let idx = self.script.partition_point(|(t, _)| *t <= at_ms);
        self.script.insert(idx, (at_ms, event));
    }

    pub fn with(mut self, at_ms: u64, event: InputEvent) -> Self {
        self.schedule(at_ms, event);
        self
    }

    pub fn pending(&self) -> usize {
        self.script.len()
    }

    pub fn clear(&mut self) {
        self.script.clear();
    }
}

impl<T: Timer> InputSource for ScriptedInput<T> {
    fn poll(&mut self) -> Vec<InputEvent> {
        let now = self.timer.now_ms();
        let mut out = Vec::new();
        while self.script.front().is_some_and(|(t, _)| *t <= now) {
            if let Some((_, event)) = self.script.pop_front() {
                out.push(event);
            }
        }
        out
    }
}
