//! `pointex-experiment`: the reaching trial engine.
//!
//! A trial reveals a fixation point, a frame and two overlapping target
//! circles on fixed deadlines, waits for the participant to release a held
//! control after the go cue, classifies the landing click and pays out. In
//! the reward-occlusion condition the goggles close at movement onset and
//! open again before any points are shown.

pub mod block;
pub mod config;
pub mod error;
pub mod input;
pub mod layout;
pub mod occlusion;
pub mod present;
pub mod state;
pub mod trial;

#[cfg(test)]
mod tests;

pub use block::{await_go_ahead, BlockRunner};
pub use config::{
    AbortPolicy, ExperimentConfig, FeedbackConfig, LayoutConfig, OcclusionCodes, ResponseConfig,
    TrialTiming,
};
pub use error::{
    ConfigError, ConfigResult, DeviceError, DeviceResult, LayoutError, LayoutResult, TrialError,
    TrialResult,
};
pub use input::{Click, InputEvent, InputMonitor, InputSource, ScriptedInput};
pub use layout::{Layout, TargetPair};
pub use occlusion::{
    NoDevice, OcclusionCommand, OcclusionController, OcclusionDevice, OcclusionState,
    SerialTrigger,
};
pub use present::{NullPresenter, Presenter};
pub use state::{Step, TrialStateMachine};
pub use trial::{events, trial_timeline, Apparatus, TrialContext};
