//! `pointex-timing`: clocks and per-trial deadline schedules.

pub mod error;
pub mod timeline;
pub mod timer;


pub use error::{TimelineError, TimelineResult};
pub use timeline::{TimedEvent, Timeline};
pub use timer::{HighPrecisionTimer, LoopStats, LoopStatsSummary, ManualTimer, Timer};
