use crate::utils::MAX_DECIMALS;
use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppchainState {
    Registered,
    Auditing,
    Dead,
    InQueue,
    Staging,
    Booting,
    Active,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleTokenMetadata {
    #[serde(default)]
    pub spec: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub reference_hash: Option<String>,
    pub decimals: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppchainMetadata {
    pub contact_email: String,
    pub custom_metadata: HashMap<String, Value>,
    pub function_spec_url: String,
    pub fungible_token_metadata: Option<FungibleTokenMetadata>,
    pub github_address: String,
    pub github_release: String,
    pub ido_amount_of_wrapped_appchain_token: String,
    pub initial_era_reward: String,
    pub premined_wrapped_appchain_token: String,
    pub premined_wrapped_appchain_token_beneficiary: String,
    pub website_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppchainInfo {
    pub appchain_anchor: String,
    pub appchain_id: String,
    #[serde(default)]
    pub appchain_metadata: AppchainMetadata,
    #[serde(default)]
    pub appchain_owner: String,
    pub appchain_state: AppchainState,
    #[serde(default)]
    pub downvote_deposit: String,
    #[serde(default)]
    pub go_live_time: String,
    #[serde(default)]
    pub register_deposit: String,
    #[serde(default)]
    pub registered_time: String,
    #[serde(default)]
    pub total_stake: String,
    #[serde(default)]
    pub upvote_deposit: String,
    #[serde(default)]
    pub validator_count: u32,
    #[serde(default)]
    pub voting_score: String,
}

impl AppchainInfo {
    /// Decimals of the wrapped appchain token, if the metadata carries a usable value.
    pub fn token_decimals(&self) -> Option<u32> {
        let decimals = self.appchain_metadata.fungible_token_metadata.as_ref()?.decimals;
        if decimals > MAX_DECIMALS {
            warn!(
                "Ignoring decimals {} of {}: above {}",
                decimals, self.appchain_id, MAX_DECIMALS
            );
            return None;
        }
        Some(decimals)
    }

    pub fn go_live_at(&self) -> Option<DateTime<Utc>> {
        nanos_to_datetime(&self.go_live_time)
    }

    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        nanos_to_datetime(&self.registered_time)
    }
}

fn nanos_to_datetime(nanos: &str) -> Option<DateTime<Utc>> {
    let nanos: i64 = nanos.trim().parse().ok()?;
    if nanos == 0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(nanos / 1_000_000_000, (nanos % 1_000_000_000) as u32)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub start_index: String,
    pub end_index: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionlessActionsStatus {
    #[serde(default)]
    pub switching_era_number: Option<String>,
    #[serde(default)]
    pub distributing_reward_era_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorStatus {
    pub total_stake_in_next_era: String,
    pub validator_count_in_next_era: String,
    pub delegator_count_in_next_era: String,
    pub index_range_of_appchain_notification_history: IndexRange,
    pub index_range_of_validator_set_history: IndexRange,
    pub index_range_of_anchor_event_history: IndexRange,
    pub index_range_of_staking_history: IndexRange,
    pub index_range_of_appchain_message_processing_results: IndexRange,
    pub permissionless_actions_status: PermissionlessActionsStatus,
    pub asset_transfer_is_paused: bool,
    pub rewards_withdrawal_is_paused: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppchainInfoWithAnchorStatus {
    #[serde(flatten)]
    pub info: AppchainInfo,
    #[serde(default)]
    pub anchor_status: Option<AnchorStatus>,
}

impl AppchainInfoWithAnchorStatus {
    /// Era index used to key reward queries: the end of the validator set history.
    pub fn validator_set_end_index(&self) -> Option<&str> {
        self.anchor_status
            .as_ref()
            .map(|s| s.index_range_of_validator_set_history.end_index.as_str())
            .filter(|index| !index.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppchainSettings {
    pub rpc_endpoint: String,
    #[serde(default)]
    pub subql_endpoint: String,
    #[serde(default)]
    pub era_reward: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolSettings {
    pub minimum_validator_deposit: String,
    #[serde(default)]
    pub minimum_validator_deposit_changing_amount: String,
    #[serde(default)]
    pub maximum_validator_stake_percent: u32,
    pub minimum_delegator_deposit: String,
    #[serde(default)]
    pub minimum_delegator_deposit_changing_amount: String,
    #[serde(default)]
    pub minimum_total_stake_price_for_booting: String,
    #[serde(default)]
    pub maximum_market_value_percent_of_near_fungible_tokens: u32,
    #[serde(default)]
    pub maximum_market_value_percent_of_wrapped_appchain_token: u32,
    #[serde(default)]
    pub minimum_validator_count: String,
    #[serde(default)]
    pub maximum_validator_count: String,
    #[serde(default)]
    pub maximum_validators_per_delegator: String,
    #[serde(default)]
    pub unlock_period_of_validator_deposit: String,
    #[serde(default)]
    pub unlock_period_of_delegator_deposit: String,
    #[serde(default)]
    pub maximum_era_count_of_unwithdrawn_reward: String,
    #[serde(default)]
    pub maximum_era_count_of_valid_appchain_message: String,
    #[serde(default)]
    pub validator_commission_percent: u32,
    #[serde(default)]
    pub maximum_allowed_unprofitable_era_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorSetInfo {
    pub era_number: String,
    pub total_stake: String,
    #[serde(default)]
    pub start_block_height: String,
    #[serde(default)]
    pub start_timestamp: String,
    #[serde(default)]
    pub staking_history_index: String,
    #[serde(default)]
    pub unprofitable_validator_ids: Vec<String>,
    #[serde(default)]
    pub valid_total_stake: String,
    #[serde(default)]
    pub validator_count: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrappedAppchainToken {
    pub contract_account: String,
    pub metadata: FungibleTokenMetadata,
    #[serde(default)]
    pub premined_balance: String,
    #[serde(default)]
    pub premined_beneficiary: String,
    #[serde(default)]
    pub changed_balance: String,
    #[serde(default)]
    pub price_of_wrapped_appchain_token: String,
    #[serde(default)]
    pub total_supply: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserVotes {
    #[serde(default)]
    pub upvotes: String,
    #[serde(default)]
    pub downvotes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const APPCHAIN_JSON: &str = r#"{
        "appchain_anchor": "barnacle.octopus-registry.near",
        "appchain_id": "barnacle",
        "appchain_metadata": {
            "website_url": "https://example.org",
            "fungible_token_metadata": {
                "spec": "ft-1.0.0", "name": "Barnacle", "symbol": "BAR", "decimals": 18
            }
        },
        "appchain_owner": "owner.near",
        "appchain_state": "Active",
        "go_live_time": "1650000000123000000",
        "validator_count": 7,
        "anchor_status": {
            "index_range_of_validator_set_history": { "start_index": "0", "end_index": "42" },
            "rewards_withdrawal_is_paused": true
        }
    }"#;

    #[test]
    fn test_appchain_with_anchor_status_deserializes() {
        let appchain: AppchainInfoWithAnchorStatus = serde_json::from_str(APPCHAIN_JSON).unwrap();
        assert_eq!(appchain.info.appchain_state, AppchainState::Active);
        assert_eq!(appchain.info.token_decimals(), Some(18));
        assert_eq!(appchain.validator_set_end_index(), Some("42"));
        assert!(appchain.anchor_status.as_ref().unwrap().rewards_withdrawal_is_paused);
        let go_live = appchain.info.go_live_at().unwrap();
        assert_eq!(go_live.timestamp(), 1_650_000_000);
        assert_eq!(go_live.timestamp_subsec_millis(), 123);
        assert!(appchain.info.registered_at().is_none());
    }

    #[test]
    fn test_missing_anchor_status_has_no_era_index() {
        let mut appchain: AppchainInfoWithAnchorStatus =
            serde_json::from_str(APPCHAIN_JSON).unwrap();
        appchain.anchor_status = None;
        assert_eq!(appchain.validator_set_end_index(), None);
    }

    #[test]
    fn test_oversized_decimals_are_ignored() {
        let json = APPCHAIN_JSON.replace(r#""decimals": 18"#, r#""decimals": 4000000000"#);
        let appchain: AppchainInfoWithAnchorStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(appchain.info.token_decimals(), None);

        let json = APPCHAIN_JSON.replace(r#""decimals": 18"#, r#""decimals": 77"#);
        let appchain: AppchainInfoWithAnchorStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(appchain.info.token_decimals(), Some(77));
    }
}
