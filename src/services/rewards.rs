//! Reward totals and the per-account reward overview of an appchain.

use crate::error::{DashboardError, FetchFailure};
use crate::models::{AppchainInfoWithAnchorStatus, RewardHistory, Session};
use crate::services::api::DashboardApi;
use crate::services::delegation::{get_delegated_validators, DelegatedValidators};
use crate::services::explorer::EventIndex;
use crate::utils::TokenAmount;
use futures::stream::{self, StreamExt};
use log::{info, warn};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

fn sum_field<'a, I>(amounts: I, decimals: Option<u32>) -> TokenAmount
where
    I: Iterator<Item = &'a str>,
{
    let Some(decimals) = decimals else {
        return TokenAmount::zero(0);
    };
    amounts.fold(TokenAmount::zero(decimals), |total, amount| {
        match TokenAmount::from_raw_str(amount, decimals) {
            Ok(value) => total + value,
            Err(e) => {
                warn!("Skipping unparseable reward amount: {}", e);
                total
            }
        }
    })
}

/// Unclaimed rewards still withdrawable: expired eras do not count.
///
/// Unknown decimals yield zero rather than an error.
pub fn calc_unwithdrawn_reward(rewards: &[RewardHistory], decimals: Option<u32>) -> TokenAmount {
    sum_field(
        rewards
            .iter()
            .filter(|r| !r.expired)
            .map(|r| r.unwithdrawn_reward.as_str()),
        decimals,
    )
}

pub fn calc_total_reward(rewards: &[RewardHistory], decimals: Option<u32>) -> TokenAmount {
    sum_field(rewards.iter().map(|r| r.total_reward.as_str()), decimals)
}

pub fn can_claim(
    rewards: &[RewardHistory],
    decimals: Option<u32>,
    rewards_withdrawal_is_paused: bool,
) -> bool {
    !rewards_withdrawal_is_paused && calc_unwithdrawn_reward(rewards, decimals).is_positive()
}

/// Rewards of one account on one appchain, as validator and as delegator.
#[derive(Debug, Clone)]
pub struct AppchainRewards {
    pub appchain: AppchainInfoWithAnchorStatus,
    pub era_index: String,
    pub validator_rewards: Result<Vec<RewardHistory>, FetchFailure>,
    pub delegated_validators: DelegatedValidators,
    pub delegator_rewards: BTreeMap<String, Result<Vec<RewardHistory>, FetchFailure>>,
}

impl AppchainRewards {
    pub fn validator_rewards_or_empty(&self) -> &[RewardHistory] {
        self.validator_rewards.as_deref().unwrap_or(&[])
    }

    pub fn delegator_rewards_or_empty(&self, validator_id: &str) -> &[RewardHistory] {
        self.delegator_rewards
            .get(validator_id)
            .and_then(|r| r.as_deref().ok())
            .unwrap_or(&[])
    }

    /// Every sub-fetch that failed, labelled by what it was fetching.
    pub fn failures(&self) -> Vec<(String, &FetchFailure)> {
        let mut failures = Vec::new();
        if let Err(e) = &self.validator_rewards {
            failures.push(("validator rewards".to_string(), e));
        }
        if let Some(e) = &self.delegated_validators.registration_error {
            failures.push(("delegator registrations".to_string(), e));
        }
        if let Some(e) = &self.delegated_validators.redelegation_error {
            failures.push(("redelegations".to_string(), e));
        }
        for (validator_id, rewards) in &self.delegator_rewards {
            if let Err(e) = rewards {
                failures.push((format!("delegator rewards under {}", validator_id), e));
            }
        }
        failures
    }

    pub fn unwithdrawn_total(&self) -> TokenAmount {
        let decimals = self.appchain.info.token_decimals();
        let mut total = calc_unwithdrawn_reward(self.validator_rewards_or_empty(), decimals);
        for validator_id in self.delegator_rewards.keys() {
            total += calc_unwithdrawn_reward(self.delegator_rewards_or_empty(validator_id), decimals);
        }
        total
    }
}

/// Collects the session account's rewards on an appchain.
///
/// Only the appchain lookup is fatal; every other sub-fetch records its
/// failure in the result. At most `parallel_limit` delegator reward requests
/// run at once, and all of them are dropped when `cancel` fires.
pub async fn get_appchain_rewards(
    api: &dyn DashboardApi,
    index: &dyn EventIndex,
    session: &Session,
    appchain_id: &str,
    parallel_limit: usize,
    cancel: &CancellationToken,
) -> Result<AppchainRewards, DashboardError> {
    tokio::select! {
        _ = cancel.cancelled() => {
            info!("Reward aggregation for {} cancelled", appchain_id);
            Err(DashboardError::Cancelled)
        }
        result = collect_appchain_rewards(api, index, session, appchain_id, parallel_limit) => result,
    }
}

async fn collect_appchain_rewards(
    api: &dyn DashboardApi,
    index: &dyn EventIndex,
    session: &Session,
    appchain_id: &str,
    parallel_limit: usize,
) -> Result<AppchainRewards, DashboardError> {
    let account_id = session.account_id.as_str();
    let appchain = api.get_appchain(appchain_id).await?;
    let era_index = appchain
        .validator_set_end_index()
        .ok_or_else(|| DashboardError::MissingAnchorStatus(appchain_id.to_string()))?
        .to_string();
    let chain_id = appchain.info.appchain_id.clone();

    info!(
        "Fetching rewards of {} on {} at era {}",
        account_id, chain_id, era_index
    );
    let validator_rewards = api
        .get_validator_rewards(account_id, &chain_id, &era_index)
        .await
        .map_err(|e| {
            warn!("Validator rewards of {} unavailable: {}", account_id, e);
            FetchFailure::from(e)
        });

    let delegated_validators = get_delegated_validators(
        index,
        &session.network,
        &appchain.info.appchain_anchor,
        account_id,
    )
    .await;

    let chain_id = chain_id.as_str();
    let era = era_index.as_str();
    let delegator_rewards = stream::iter(delegated_validators.validator_ids.iter().cloned())
        .map(|validator_id| async move {
            let rewards = api
                .get_delegator_rewards(&validator_id, chain_id, account_id, era)
                .await
                .map_err(|e| {
                    warn!(
                        "Delegator rewards of {} under {} unavailable: {}",
                        account_id, validator_id, e
                    );
                    FetchFailure::from(e)
                });
            (validator_id, rewards)
        })
        .buffer_unordered(parallel_limit.max(1))
        .collect::<BTreeMap<_, _>>()
        .await;

    Ok(AppchainRewards {
        appchain,
        era_index,
        validator_rewards,
        delegated_validators,
        delegator_rewards,
    })
}
