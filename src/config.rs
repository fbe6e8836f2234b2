use crate::error::ConfigError;
use crate::models::{ExplorerCredentials, NetworkConfig};
use std::env;
use std::str::FromStr;

pub struct Config {
    pub network: NetworkConfig,
    pub primary_rpc: String,
    pub secondary_rpc: String,
    pub parallel_limit: usize,
    pub deploy_api_host: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let network_id = env::var("NETWORK_ID").unwrap_or_else(|_| "testnet".to_string());
        let (default_oct, default_registry) = match network_id.as_str() {
            "mainnet" => (
                "f5cfbc74057c610c8ef151a439252680ac68c6dc.factory.bridge.near",
                "octopus-registry.near",
            ),
            "testnet" => ("oct.beta_oct_relay.testnet", "registry.test_oct.testnet"),
            _ => {
                return Err(ConfigError::Invalid {
                    name: "NETWORK_ID",
                    value: network_id,
                })
            }
        };

        let explorer = ExplorerCredentials {
            user: env::var("EXPLORER_USER").unwrap_or_else(|_| "public_readonly".to_string()),
            password: env::var("EXPLORER_PASSWORD").unwrap_or_else(|_| "nearprotocol".to_string()),
            port: parse_var("EXPLORER_PORT", 5432)?,
        };

        let network = NetworkConfig {
            api_host: required("API_HOST")?,
            rest_api_url: required("NEAR_REST_API_URL")?,
            oct_token_contract_id: env::var("OCT_TOKEN_CONTRACT_ID")
                .unwrap_or_else(|_| default_oct.to_string()),
            registry_contract_id: env::var("REGISTRY_CONTRACT_ID")
                .unwrap_or_else(|_| default_registry.to_string()),
            convertor_contract_id: env::var("CONVERTOR_CONTRACT_ID")
                .unwrap_or_else(|_| "contract.convertor.testnet".to_string()),
            explorer,
            network_id,
        };

        let parallel_limit: usize = parse_var("PARALLEL_LIMIT", 8)?;
        if parallel_limit == 0 {
            return Err(ConfigError::Invalid {
                name: "PARALLEL_LIMIT",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            primary_rpc: env::var("PRIMARY_RPC")
                .unwrap_or_else(|_| format!("https://rpc.{}.near.org", network.network_id)),
            secondary_rpc: env::var("SECONDARY_RPC").unwrap_or_else(|_| {
                format!("https://archival-rpc.{}.near.org", network.network_id)
            }),
            parallel_limit,
            deploy_api_host: env::var("DEPLOY_API_HOST").ok(),
            network,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_falls_back_to_default() {
        let limit: usize = parse_var("OCTOPUS_DASHBOARD_TEST_UNSET_VAR", 8).unwrap();
        assert_eq!(limit, 8);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        env::set_var("OCTOPUS_DASHBOARD_TEST_BAD_PORT", "not-a-port");
        let err = parse_var::<u16>("OCTOPUS_DASHBOARD_TEST_BAD_PORT", 5432).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name, .. } if name == "OCTOPUS_DASHBOARD_TEST_BAD_PORT"));
    }
}
