use std::collections::HashMap;

use crate::error::{TimelineError, TimelineResult};
use crate::timer::Timer;

/// A named deadline. `offset_ms` counts from the predecessor's deadline, or
/// from trial start when there is no predecessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEvent {
    pub label: String,
    pub offset_ms: u64,
    pub after: Option<String>,
    /// Resolved deadline in ms since trial start.
    pub deadline_ms: u64,
}

/// Forward-chained schedule of trial deadlines.
///
/// Deadlines are resolved once, when an event is registered. The predecessor
/// must already exist, so the chain cannot contain cycles.
#[derive(Debug, Clone)]
pub struct Timeline<T: Timer> {
    timer: T,
    origin_ns: u64,
    frozen_ms: Option<u64>,
    events: HashMap<String, TimedEvent>,
}

impl<T: Timer> Timeline<T> {
    /// New, empty timeline whose trial clock starts now.
    pub fn new(timer: T) -> Self {
        let origin_ns = timer.now();
        Self {
            timer,
            origin_ns,
            frozen_ms: None,
            events: HashMap::new(),
        }
    }

    pub fn add_event(
        &mut self,
        label: &str,
        offset_ms: u64,
        after: Option<&str>,
    ) -> TimelineResult<u64> {
        if self.events.contains_key(label) {
            return Err(TimelineError::DuplicateEvent(label.to_string()));
        }
        let base = match after {
            Some(pred) => self.deadline(pred).map_err(|_| TimelineError::UnknownPredecessor {
                label: label.to_string(),
                after: pred.to_string(),
            })?,
            None => 0,
        };
        let deadline_ms = base + offset_ms;
        self.events.insert(
            label.to_string(),
            TimedEvent {
                label: label.to_string(),
                offset_ms,
                after: after.map(str::to_string),
                deadline_ms,
            },
        );
        Ok(deadline_ms)
    }

    /// Resolved deadline in ms since trial start.
    pub fn deadline(&self, label: &str) -> TimelineResult<u64> {
        self.events
            .get(label)
            .map(|e| e.deadline_ms)
            .ok_or_else(|| TimelineError::UnknownEvent(label.to_string()))
    }

    /// Live trial clock, unaffected by `stop_clock`.
    pub fn clock_ms(&self) -> u64 {
        self.timer.now().saturating_sub(self.origin_ns) / 1_000_000
    }

    pub fn before(&self, label: &str) -> TimelineResult<bool> {
        Ok(self.clock_ms() < self.deadline(label)?)
    }

    pub fn after(&self, label: &str) -> TimelineResult<bool> {
        Ok(self.clock_ms() >= self.deadline(label)?)
    }

    /// Milliseconds since trial start, or the reading captured by
    /// `stop_clock` if the clock has been stopped.
    pub fn elapsed(&self) -> u64 {
        self.frozen_ms.unwrap_or_else(|| self.clock_ms())
    }

    pub fn stop_clock(&mut self) -> u64 {
        let now_ms = self.clock_ms();
        *self.frozen_ms.get_or_insert(now_ms)
    }

    pub fn resume_clock(&mut self) {
        self.frozen_ms = None;
    }

    /// Re-anchors trial start to now. Registered offsets are kept.
    pub fn restart(&mut self) {
        self.origin_ns = self.timer.now();
        self.frozen_ms = None;
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}
