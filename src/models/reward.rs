use serde::{Deserialize, Serialize};

/// One era of rewards for a validator, or for a delegator under a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardHistory {
    pub era_number: String,
    pub total_reward: String,
    pub unwithdrawn_reward: String,
    #[serde(default)]
    pub expired: bool,
}

impl RewardHistory {
    pub fn era(&self) -> Option<u64> {
        self.era_number.parse().ok()
    }
}
