use serde::{Deserialize, Serialize};

/// Feedback condition applied to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Full vision, movement-time feedback only.
    Practice,
    /// Full vision throughout, no points shown.
    Vision,
    /// Vision occluded from movement onset; points shown after landing.
    #[serde(alias = "reward")]
    RewardOcclusion,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Vision => "vision",
            Self::RewardOcclusion => "reward",
        }
    }

    pub fn occludes(&self) -> bool {
        matches!(self, Self::RewardOcclusion)
    }

    /// The other scored condition. Practice has no counterpart.
    pub fn counterpart(&self) -> Option<Self> {
        match self {
            Self::Vision => Some(Self::RewardOcclusion),
            Self::RewardOcclusion => Some(Self::Vision),
            Self::Practice => None,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "practice" => Ok(Self::Practice),
            "vision" => Ok(Self::Vision),
            "reward" | "reward_occlusion" => Ok(Self::RewardOcclusion),
            other => Err(format!("unknown condition `{other}`")),
        }
    }
}

/// One block of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpec {
    /// 1-based block number.
    pub number: usize,
    pub condition: Condition,
    pub trials: usize,
}

impl BlockSpec {
    pub fn practicing(&self) -> bool {
        self.condition == Condition::Practice
    }
}

/// Block order derived from the starting condition. With practice enabled
/// every scored block is preceded by a practice block.
pub fn block_sequence(
    starting: Condition,
    run_practice: bool,
    trials_per_block: usize,
    trials_per_practice_block: usize,
) -> Vec<BlockSpec> {
    let first = match starting {
        Condition::Practice => Condition::Vision,
        c => c,
    };
    let order = [first, first.counterpart().unwrap_or(Condition::RewardOcclusion)];

    let mut blocks = Vec::with_capacity(order.len() * 2);
    for condition in order {
        if run_practice {
            blocks.push(BlockSpec {
                number: blocks.len() + 1,
                condition: Condition::Practice,
                trials: trials_per_practice_block,
            });
        }
        blocks.push(BlockSpec {
            number: blocks.len() + 1,
            condition,
            trials: trials_per_block,
        });
    }
    blocks
}
