//! Physical layout of the reaching display and per-trial target placement.

use pointex_core::{
    labels, Boundary, BoundarySet, CircleBoundary, PenaltySide, Point, RectangleBoundary,
};
use rand::Rng;

use crate::config::LayoutConfig;
use crate::error::{LayoutError, LayoutResult};

const MM_PER_INCH: f64 = 25.4;

/// Placed target pair for one trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPair {
    pub side: PenaltySide,
    pub reward: CircleBoundary,
    pub penalty: CircleBoundary,
}

/// Session-stable geometry derived from the layout configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub unit_px: f64,
    pub fixation: Point,
    pub fixation_size_px: f64,
    pub rect: RectangleBoundary,
    pub start: Option<CircleBoundary>,
    pub target_radius_px: f64,
    /// Distance of each circle centre from the placement origin.
    pub target_offset_px: f64,
    pub padding_px: f64,
}

impl Layout {
    pub fn from_config(cfg: &LayoutConfig) -> LayoutResult<Self> {
        if !(cfg.ppi > 0.0) || !(cfg.unit_mm > 0.0) {
            return Err(LayoutError::InvalidScale {
                ppi: cfg.ppi,
                unit_mm: cfg.unit_mm,
            });
        }
        let px_per_mm = cfg.ppi / MM_PER_INCH;
        let unit_px = px_per_mm * cfg.unit_mm;

        let fixation = Point::new(
            cfg.screen_width_px / 2.0,
            cfg.screen_height_px - cfg.offset_mm * px_per_mm,
        );
        let rect = RectangleBoundary::centered(
            fixation,
            cfg.rect_width_units * unit_px,
            cfg.rect_height_units * unit_px,
        );

        let start = if cfg.start_hold {
            let center = Point::new(
                cfg.screen_width_px / 2.0,
                cfg.screen_height_px - cfg.start_offset_mm * px_per_mm,
            );
            Some(CircleBoundary::new(center, cfg.start_radius_units * unit_px)?)
        } else {
            None
        };

        Ok(Self {
            unit_px,
            fixation,
            fixation_size_px: cfg.fixation_width_units * unit_px,
            rect,
            start,
            target_radius_px: cfg.circle_diameter_units / 2.0 * unit_px,
            target_offset_px: cfg.target_offset_radii * cfg.circle_diameter_units / 2.0 * unit_px,
            padding_px: cfg.target_padding_px,
        })
    }

    /// Frame and, if configured, start region. Targets are added per trial.
    pub fn base_boundaries(&self) -> BoundarySet {
        let mut set = BoundarySet::new().with(Boundary::new(labels::RECT, self.rect));
        if let Some(start) = self.start {
            set.add_boundary(Boundary::new(labels::START, start));
        }
        set
    }

    /// Draws an origin inside the frame and puts the two circles either side
    /// of it. They overlap when the offset is below one radius.
    pub fn place_targets<R: Rng>(
        &self,
        side: PenaltySide,
        rng: &mut R,
    ) -> LayoutResult<TargetPair> {
        let r = self.target_radius_px;
        let d = self.target_offset_px;
        let (min, max) = (self.rect.min(), self.rect.max());

        let x_range = (min.x + 1.5 * r + self.padding_px, max.x - 1.5 * r - self.padding_px);
        let y_range = (min.y + r + self.padding_px, max.y - r - self.padding_px);
        if x_range.0 >= x_range.1 || y_range.0 >= y_range.1 {
            return Err(LayoutError::TargetsDoNotFit {
                radius_px: r,
                width_px: self.rect.width(),
                height_px: self.rect.height(),
            });
        }

        let origin = Point::new(
            rng.random_range(x_range.0..x_range.1),
            rng.random_range(y_range.0..y_range.1),
        );
        let (penalty_dx, reward_dx) = match side {
            PenaltySide::Left => (-d, d),
            PenaltySide::Right => (d, -d),
        };

        Ok(TargetPair {
            side,
            reward: CircleBoundary::new(origin.offset(reward_dx, 0.0), r)?,
            penalty: CircleBoundary::new(origin.offset(penalty_dx, 0.0), r)?,
        })
    }

    /// Random side, then placement.
    pub fn random_targets<R: Rng>(&self, rng: &mut R) -> LayoutResult<TargetPair> {
        let side = if rng.random_bool(0.5) {
            PenaltySide::Left
        } else {
            PenaltySide::Right
        };
        self.place_targets(side, rng)
    }
}

impl TargetPair {
    pub fn install(&self, set: &mut BoundarySet) {
        set.add_boundary(Boundary::new(labels::REWARD, self.reward));
        set.add_boundary(Boundary::new(labels::PENALTY, self.penalty));
    }
}
