/// Phases of a single reaching trial, in the order they are normally visited.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TrialPhase {
    /// Waiting for a click inside the start region.
    #[default]
    AwaitStart,
    /// Fixation, frame and targets appear on their deadlines.
    Reveal,
    /// Go cue is emitted.
    GoSignal,
    /// Response window, waiting for the held control to be released.
    AwaitRelease,
    /// Response window, waiting for the landing click.
    AwaitClick,
    /// Visuals cleared, payout computed, occlusion lifted.
    Resolve,
    Feedback,
    /// Premature release: warning shown, nothing scored.
    Aborted,
    End,
}

impl TrialPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End)
    }
}
