//! `pointex-core`: geometry and scoring for the reaching task.
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`geometry`]  | `Point`, rectangle/circle boundaries, `BoundarySet`        |
//! | [`classify`]  | `ClickClassification`, the nested-region decision tree     |
//! | [`payout`]    | `PayoutTable`, `Bank`                                      |
//! | [`condition`] | `Condition`, block order                                   |
//! | [`phase`]     | `TrialPhase`                                               |
//! | [`trial`]     | `TrialOutcome`, `ResultRow`, `PenaltySide`                 |
//! | [`stimulus`]  | `StimulusId`, `Placement`                                  |

pub mod classify;
pub mod condition;
pub mod error;
pub mod geometry;
pub mod payout;
pub mod phase;
pub mod stimulus;
pub mod trial;


pub use classify::{classify, classify_response, ClickClassification};
pub use condition::{block_sequence, BlockSpec, Condition};
pub use error::{BoundaryError, BoundaryResult};
pub use geometry::{labels, Boundary, BoundarySet, CircleBoundary, Point, RectangleBoundary, Region, Shape};
pub use payout::{accumulate, Bank, PayoutTable};
pub use phase::TrialPhase;
pub use stimulus::{Placement, StimulusId};
pub use trial::{PenaltySide, ResultRow, TrialOutcome};
