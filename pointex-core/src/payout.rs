use serde::{Deserialize, Serialize};

use crate::classify::ClickClassification;

/// Point values per click classification. The table is an experiment
/// parameter; revisions of the task disagree on the miss and timeout cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutTable {
    pub reward: i32,
    pub penalty: i32,
    pub overlap: i32,
    pub rect_only: i32,
    pub outside: i32,
    pub timeout: i32,
}

impl Default for PayoutTable {
    fn default() -> Self {
        Self {
            reward: 100,
            penalty: -600,
            overlap: -500,
            rect_only: -700,
            outside: -700,
            timeout: 0,
        }
    }
}

impl PayoutTable {
    pub fn payout(&self, classification: ClickClassification) -> i32 {
        match classification {
            ClickClassification::Reward => self.reward,
            ClickClassification::Penalty => self.penalty,
            ClickClassification::Overlap => self.overlap,
            ClickClassification::RectOnly => self.rect_only,
            ClickClassification::Outside => self.outside,
            ClickClassification::NoClick => self.timeout,
            ClickClassification::Start => 0,
        }
    }
}

pub fn accumulate(total: i32, payout: i32) -> i32 {
    total + payout
}

/// Running point total for one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bank {
    total: i32,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total(&self) -> i32 {
        self.total
    }

    pub fn deposit(&mut self, payout: i32) -> i32 {
        self.total = accumulate(self.total, payout);
        self.total
    }

    pub fn reset(&mut self) {
        self.total = 0;
    }
}
