//! Summaries for the validator table and the appchain page.

use crate::contract_calls::OCT_TOKEN_DECIMALS;
use crate::error::{DashboardError, FetchFailure};
use crate::models::{
    is_delegated_by, AppchainInfoWithAnchorStatus, AppchainSettings, Delegator, RewardHistory,
    Validator, ValidatorDisplayState, WrappedAppchainToken,
};
use crate::services::api::DashboardApi;
use crate::services::near_rpc::AnchorViews;
use crate::services::rewards::calc_total_reward;
use crate::utils::TokenAmount;
use futures::stream::{self, StreamExt};
use log::{info, warn};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ValidatorRow {
    pub validator_id: String,
    pub state: ValidatorDisplayState,
    pub total_stake: String,
    pub deposit_amount: String,
    pub delegators_count: String,
    /// `None` until the validator's reward history is loaded.
    pub total_rewards: Option<String>,
    pub is_myself: bool,
    pub is_delegated: bool,
}

fn beautify_oct(raw: &str) -> String {
    TokenAmount::from_raw_str(raw, OCT_TOKEN_DECIMALS)
        .map(|amount| amount.beautify())
        .unwrap_or_else(|_| "0".to_string())
}

impl ValidatorRow {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        validator: &Validator,
        account_id: Option<&str>,
        rewards: Option<&[RewardHistory]>,
        delegators: &[Delegator],
        reward_decimals: Option<u32>,
        in_appchain: bool,
        has_session_key: bool,
    ) -> Self {
        let is_myself = account_id == Some(validator.validator_id.as_str());
        ValidatorRow {
            validator_id: validator.validator_id.clone(),
            state: ValidatorDisplayState::derive(validator, in_appchain, has_session_key),
            total_stake: beautify_oct(&validator.total_stake),
            deposit_amount: beautify_oct(&validator.deposit_amount),
            delegators_count: validator.delegators_count.clone(),
            total_rewards: rewards.map(|r| calc_total_reward(r, reward_decimals).beautify()),
            is_myself: is_myself && !validator.is_unbonding,
            is_delegated: account_id
                .map(|id| is_delegated_by(delegators, id))
                .unwrap_or(false),
        }
    }

    /// Trailing hint of the row.
    pub fn hint(&self) -> Option<&'static str> {
        if self.is_myself {
            Some("Manage")
        } else if self.is_delegated {
            Some("Delegated")
        } else {
            None
        }
    }
}

/// Who the appchain session lists, and which of them set their next keys.
/// Entries match either the NEAR account or the appchain-side id.
#[derive(Debug, Clone, Default)]
pub struct SessionMembership {
    pub in_session: Vec<String>,
    pub with_keys: Vec<String>,
}

impl SessionMembership {
    fn lists(ids: &[String], validator: &Validator) -> bool {
        ids.iter()
            .any(|id| *id == validator.validator_id || *id == validator.validator_id_in_appchain)
    }
}

/// One row per validator of the appchain, with delegators and reward history
/// fetched per validator at the current era. A failed per-row fetch shows as empty.
pub async fn validator_rows(
    api: &dyn DashboardApi,
    appchain: &AppchainInfoWithAnchorStatus,
    account_id: Option<&str>,
    membership: &SessionMembership,
    parallel_limit: usize,
) -> Result<Vec<ValidatorRow>, DashboardError> {
    let chain_id = appchain.info.appchain_id.as_str();
    let era = appchain.validator_set_end_index().unwrap_or("0");
    let decimals = appchain.info.token_decimals();
    let validators = api.get_validators(chain_id).await?;
    info!("Building {} validator rows for {} at era {}", validators.len(), chain_id, era);

    let rows = stream::iter(validators.iter())
        .map(|validator| async move {
            let validator_id = validator.validator_id.as_str();
            let delegators = api
                .get_delegators(validator_id, chain_id, era)
                .await
                .unwrap_or_else(|e| {
                    warn!("Delegators of {} unavailable: {}", validator_id, e);
                    Vec::new()
                });
            let rewards = api
                .get_validator_rewards(validator_id, chain_id, era)
                .await
                .unwrap_or_else(|e| {
                    warn!("Rewards of {} unavailable: {}", validator_id, e);
                    Vec::new()
                });
            ValidatorRow::build(
                validator,
                account_id,
                Some(rewards.as_slice()),
                &delegators,
                decimals,
                SessionMembership::lists(&membership.in_session, validator),
                SessionMembership::lists(&membership.with_keys, validator),
            )
        })
        .buffered(parallel_limit.max(1))
        .collect::<Vec<_>>()
        .await;
    Ok(rows)
}

/// Appchain page data: the registry entry plus settings from the API and the
/// wrapped token from the anchor, each of which may be missing.
#[derive(Debug, Clone, Serialize)]
pub struct AppchainOverview {
    pub appchain: AppchainInfoWithAnchorStatus,
    pub settings: Result<AppchainSettings, FetchFailure>,
    pub wrapped_token: Result<WrappedAppchainToken, FetchFailure>,
}

impl AppchainOverview {
    /// Reward paid per era, in the appchain token.
    pub fn era_reward(&self) -> Option<TokenAmount> {
        let settings = self.settings.as_ref().ok()?;
        let decimals = self.appchain.info.token_decimals()?;
        match TokenAmount::from_raw_str(&settings.era_reward, decimals) {
            Ok(amount) => Some(amount),
            Err(e) => {
                warn!("Bad era reward {:?}: {}", settings.era_reward, e);
                None
            }
        }
    }
}

pub async fn appchain_overview(
    api: &dyn DashboardApi,
    anchor: &dyn AnchorViews,
    appchain: AppchainInfoWithAnchorStatus,
) -> AppchainOverview {
    let (settings, wrapped_token) = futures::join!(
        api.get_appchain_settings(&appchain.info.appchain_id),
        anchor.get_wrapped_appchain_token(),
    );
    AppchainOverview {
        settings: settings.map_err(|e| {
            warn!("Settings of {} unavailable: {}", appchain.info.appchain_id, e);
            FetchFailure::from(e)
        }),
        wrapped_token: wrapped_token.map_err(|e| {
            warn!("Wrapped token of {} unavailable: {}", appchain.info.appchain_id, e);
            FetchFailure::from(e)
        }),
        appchain,
    }
}
