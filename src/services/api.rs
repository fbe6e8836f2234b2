use crate::contract_calls::{self, recorded_vote_deposit, Transaction, VoteType};
use crate::error::DashboardError;
use crate::models::{
    AppchainInfoWithAnchorStatus, AppchainSettings, Delegator, RewardHistory, UserVotes, Validator,
};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;

/// Read side of the dashboard REST API.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn get_appchain(
        &self,
        appchain_id: &str,
    ) -> Result<AppchainInfoWithAnchorStatus, DashboardError>;

    async fn get_validator_rewards(
        &self,
        validator_id: &str,
        appchain_id: &str,
        era_index: &str,
    ) -> Result<Vec<RewardHistory>, DashboardError>;

    async fn get_delegator_rewards(
        &self,
        validator_id: &str,
        appchain_id: &str,
        delegator_id: &str,
        era_index: &str,
    ) -> Result<Vec<RewardHistory>, DashboardError>;

    async fn get_validators(&self, appchain_id: &str) -> Result<Vec<Validator>, DashboardError>;

    async fn get_delegators(
        &self,
        validator_id: &str,
        appchain_id: &str,
        era_index: &str,
    ) -> Result<Vec<Delegator>, DashboardError>;

    async fn get_appchain_settings(
        &self,
        appchain_id: &str,
    ) -> Result<AppchainSettings, DashboardError>;

    async fn get_user_votes(
        &self,
        account_id: &str,
        appchain_id: &str,
    ) -> Result<UserVotes, DashboardError>;

    /// Asks the API to re-read appchain state from the chain.
    async fn update_appchains(&self) -> Result<(), DashboardError>;
}

/// Withdrawal of everything the account deposited for `vote_type` on an appchain.
pub async fn withdraw_recorded_vote_deposit(
    api: &dyn DashboardApi,
    registry: &str,
    account_id: &str,
    appchain_id: &str,
    vote_type: VoteType,
) -> Result<Transaction, DashboardError> {
    let votes = api.get_user_votes(account_id, appchain_id).await?;
    let amount = recorded_vote_deposit(&votes, vote_type);
    debug!(
        "{} has {:?} deposit {:?} on {}",
        account_id, vote_type, amount, appchain_id
    );
    Ok(contract_calls::withdraw_vote_deposit(
        registry,
        appchain_id,
        vote_type,
        amount,
    ))
}

pub struct HttpDashboardApi {
    client: reqwest::Client,
    api_host: String,
}

impl HttpDashboardApi {
    pub fn new(client: reqwest::Client, api_host: &str) -> Self {
        Self {
            client,
            api_host: api_host.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_host, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DashboardError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            warn!("GET {} failed with status {}", url, response.status());
            return Err(DashboardError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DashboardApi for HttpDashboardApi {
    async fn get_appchain(
        &self,
        appchain_id: &str,
    ) -> Result<AppchainInfoWithAnchorStatus, DashboardError> {
        self.get_json(&format!("appchain/{}", appchain_id)).await
    }

    async fn get_validator_rewards(
        &self,
        validator_id: &str,
        appchain_id: &str,
        era_index: &str,
    ) -> Result<Vec<RewardHistory>, DashboardError> {
        self.get_json(&format!(
            "rewards/{}/{}/{}",
            validator_id, appchain_id, era_index
        ))
        .await
    }

    async fn get_delegator_rewards(
        &self,
        validator_id: &str,
        appchain_id: &str,
        delegator_id: &str,
        era_index: &str,
    ) -> Result<Vec<RewardHistory>, DashboardError> {
        self.get_json(&format!(
            "rewards/{}/{}/{}/{}",
            validator_id, appchain_id, delegator_id, era_index
        ))
        .await
    }

    async fn get_validators(&self, appchain_id: &str) -> Result<Vec<Validator>, DashboardError> {
        self.get_json(&format!("validators/{}", appchain_id)).await
    }

    async fn get_delegators(
        &self,
        validator_id: &str,
        appchain_id: &str,
        era_index: &str,
    ) -> Result<Vec<Delegator>, DashboardError> {
        self.get_json(&format!(
            "{}/{}/delegators/{}",
            validator_id, appchain_id, era_index
        ))
        .await
    }

    async fn get_appchain_settings(
        &self,
        appchain_id: &str,
    ) -> Result<AppchainSettings, DashboardError> {
        self.get_json(&format!("appchain-settings/{}", appchain_id))
            .await
    }

    async fn get_user_votes(
        &self,
        account_id: &str,
        appchain_id: &str,
    ) -> Result<UserVotes, DashboardError> {
        self.get_json(&format!("votes/{}/{}", account_id, appchain_id))
            .await
    }

    async fn update_appchains(&self) -> Result<(), DashboardError> {
        let url = self.url("update-appchains");
        info!("POST {}", url);
        let response = self.client.post(&url).send().await?;
        if !response.status().is_success() {
            return Err(DashboardError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
