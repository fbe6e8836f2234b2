use crate::contract_calls::OCT_TOKEN_DECIMALS;
use crate::error::DashboardError;
use crate::services::near_rpc::AnchorViews;
use crate::utils::TokenAmount;
use log::info;
use num_bigint::BigInt;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeDirection {
    Increase,
    Decrease,
}

/// Range an amount picker may offer for changing a stake or delegation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StakeBounds {
    pub step: TokenAmount,
    pub max: TokenAmount,
}

impl StakeBounds {
    /// False means the account cannot move even one step in this direction.
    pub fn can_adjust(&self) -> bool {
        self.max >= self.step
    }

    /// Snaps a requested amount into `[step, max]`.
    pub fn clamp(&self, amount: TokenAmount) -> TokenAmount {
        if amount < self.step {
            self.step.clone()
        } else if amount > self.max {
            self.max.clone()
        } else {
            amount
        }
    }
}

/// Bounds for changing a stake of `deposited` held with `validator_id`.
///
/// Increasing is capped both by the balance and by the room left under the
/// anchor's maximum share of total stake per validator; decreasing must leave
/// at least one minimum deposit behind.
pub async fn stake_bounds(
    anchor: &dyn AnchorViews,
    validator_id: &str,
    direction: StakeDirection,
    deposited: &TokenAmount,
    balance: &TokenAmount,
) -> Result<StakeBounds, DashboardError> {
    let settings = anchor.get_protocol_settings().await?;
    let step = TokenAmount::from_raw_str(&settings.minimum_delegator_deposit, OCT_TOKEN_DECIMALS)?;

    let max = match direction {
        StakeDirection::Increase => {
            let validator_deposit = TokenAmount::from_raw_str(
                &anchor.get_validator_deposit_of(validator_id).await?,
                OCT_TOKEN_DECIMALS,
            )?;
            let status = anchor.get_anchor_status().await?;
            let set_info = anchor
                .get_validator_set_info_of(&status.index_range_of_validator_set_history.end_index)
                .await?;
            let total_stake = TokenAmount::from_raw_str(&set_info.total_stake, OCT_TOKEN_DECIMALS)?;
            let allowed = TokenAmount::from_raw(
                total_stake.raw() * BigInt::from(settings.maximum_validator_stake_percent)
                    / BigInt::from(100u32),
                OCT_TOKEN_DECIMALS,
            );
            let room = allowed - validator_deposit - deposited.clone();
            info!(
                "Validator {} has room for {} more OCT, balance is {}",
                validator_id, room, balance
            );
            room.min(balance.clone())
        }
        StakeDirection::Decrease => deposited.clone() - step.clone(),
    };

    Ok(StakeBounds { step, max })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnchorStatus, IndexRange, ProtocolSettings, ValidatorSetInfo, WrappedAppchainToken};
    use async_trait::async_trait;

    const OCT: &str = "000000000000000000";

    fn oct(amount: &str) -> TokenAmount {
        TokenAmount::from_human(amount, OCT_TOKEN_DECIMALS).unwrap()
    }

    struct FakeAnchor {
        validator_deposit: String,
        total_stake: String,
    }

    #[async_trait]
    impl AnchorViews for FakeAnchor {
        async fn get_anchor_status(&self) -> Result<AnchorStatus, DashboardError> {
            Ok(AnchorStatus {
                index_range_of_validator_set_history: IndexRange {
                    start_index: "0".into(),
                    end_index: "12".into(),
                },
                ..Default::default()
            })
        }

        async fn get_protocol_settings(&self) -> Result<ProtocolSettings, DashboardError> {
            Ok(serde_json::from_value(serde_json::json!({
                "minimum_validator_deposit": format!("5000{}", OCT),
                "minimum_delegator_deposit": format!("100{}", OCT),
                "maximum_validator_stake_percent": 10
            }))
            .unwrap())
        }

        async fn get_validator_deposit_of(&self, _validator_id: &str) -> Result<String, DashboardError> {
            Ok(self.validator_deposit.clone())
        }

        async fn get_validator_set_info_of(
            &self,
            era_number: &str,
        ) -> Result<ValidatorSetInfo, DashboardError> {
            assert_eq!(era_number, "12");
            Ok(serde_json::from_value(serde_json::json!({
                "era_number": era_number,
                "total_stake": self.total_stake
            }))
            .unwrap())
        }

        async fn get_wrapped_appchain_token(&self) -> Result<WrappedAppchainToken, DashboardError> {
            Err(DashboardError::Rpc("not deployed".into()))
        }
    }

    fn anchor() -> FakeAnchor {
        FakeAnchor {
            validator_deposit: format!("3000{}", OCT),
            total_stake: format!("100000{}", OCT),
        }
    }

    #[tokio::test]
    async fn test_increase_limited_by_validator_share() {
        // 10% of 100k is 10k; 3k deposited by the validator, 2k delegated already.
        let bounds = stake_bounds(
            &anchor(),
            "alice.testnet",
            StakeDirection::Increase,
            &oct("2000"),
            &oct("1000000"),
        )
        .await
        .unwrap();
        assert_eq!(bounds.step, oct("100"));
        assert_eq!(bounds.max, oct("5000"));
        assert!(bounds.can_adjust());
        assert_eq!(bounds.clamp(oct("1")), oct("100"));
        assert_eq!(bounds.clamp(oct("9000")), oct("5000"));
        assert_eq!(bounds.clamp(oct("250.5")), oct("250.5"));
    }

    #[tokio::test]
    async fn test_increase_limited_by_balance() {
        let bounds = stake_bounds(
            &anchor(),
            "alice.testnet",
            StakeDirection::Increase,
            &oct("0"),
            &oct("50"),
        )
        .await
        .unwrap();
        assert_eq!(bounds.max, oct("50"));
        assert!(!bounds.can_adjust());
    }

    #[tokio::test]
    async fn test_decrease_keeps_minimum_deposit() {
        let bounds = stake_bounds(
            &anchor(),
            "alice.testnet",
            StakeDirection::Decrease,
            &oct("350"),
            &oct("0"),
        )
        .await
        .unwrap();
        assert_eq!(bounds.max, oct("250"));
        assert!(bounds.can_adjust());
    }
}
