use serde::{Deserialize, Serialize};

/// Read-only credentials of the public explorer database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerCredentials {
    pub user: String,
    pub password: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub network_id: String,
    pub api_host: String,
    pub rest_api_url: String,
    pub oct_token_contract_id: String,
    pub registry_contract_id: String,
    pub convertor_contract_id: String,
    pub explorer: ExplorerCredentials,
}

impl NetworkConfig {
    pub fn explorer_host(&self) -> String {
        format!("{}.db.explorer.indexer.near.dev", self.network_id)
    }

    pub fn explorer_database(&self) -> String {
        format!("{}_explorer", self.network_id)
    }
}

/// The signed-in account together with the network it is signed in on.
///
/// Passed explicitly to every fetch and aggregation that depends on who is
/// looking.
#[derive(Debug, Clone)]
pub struct Session {
    pub account_id: String,
    pub network: NetworkConfig,
}

impl Session {
    pub fn new(account_id: impl Into<String>, network: NetworkConfig) -> Self {
        Self {
            account_id: account_id.into(),
            network,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_network() -> NetworkConfig {
    NetworkConfig {
        network_id: "testnet".to_string(),
        api_host: "https://api.test".to_string(),
        rest_api_url: "https://rest.test".to_string(),
        oct_token_contract_id: "oct.beta_oct_relay.testnet".to_string(),
        registry_contract_id: "registry.test_oct.testnet".to_string(),
        convertor_contract_id: "contract.convertor.testnet".to_string(),
        explorer: ExplorerCredentials {
            user: "public_readonly".to_string(),
            password: "nearprotocol".to_string(),
            port: 5432,
        },
    }
}
