use crate::error::DashboardError;
use crate::models::{AnchorStatus, ProtocolSettings, ValidatorSetInfo, WrappedAppchainToken};
use async_trait::async_trait;
use log::{error, info, warn};
use near_jsonrpc_client::{methods, JsonRpcClient};
use near_jsonrpc_primitives::types::query::QueryResponseKind;
use near_primitives::types::{AccountId, BlockReference, Finality, FunctionArgs};
use near_primitives::views::QueryRequest;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

/// A primary RPC endpoint and the one to fall back to.
pub struct RpcClients {
    pub primary: JsonRpcClient,
    pub secondary: JsonRpcClient,
}

pub fn create_near_connections(primary_rpc: &str, secondary_rpc: &str) -> RpcClients {
    info!("Connecting to NEAR...");
    let primary = JsonRpcClient::connect(primary_rpc);
    let secondary = JsonRpcClient::connect(secondary_rpc);
    info!("NEAR connections established");
    RpcClients { primary, secondary }
}

pub async fn query_rpc<M, F>(clients: &RpcClients, build: F) -> Result<M::Response, DashboardError>
where
    M: methods::RpcMethod,
    F: Fn() -> M,
    M::Error: std::fmt::Debug,
{
    info!("Querying RPC: {}", std::any::type_name::<M>());
    match clients.primary.call(build()).await {
        Ok(response) => Ok(response),
        Err(e) => {
            warn!("Primary RPC failed, trying secondary: {:?}", e);
            match clients.secondary.call(build()).await {
                Ok(response) => {
                    info!(
                        "RPC query successful on secondary: {}",
                        std::any::type_name::<M>()
                    );
                    Ok(response)
                }
                Err(e) => {
                    error!("Both RPCs failed: {:?}", e);
                    Err(DashboardError::Rpc(format!("{:?}", e)))
                }
            }
        }
    }
}

pub fn parse_account_id(account_id: &str) -> Result<AccountId, DashboardError> {
    account_id
        .parse::<AccountId>()
        .map_err(|e| DashboardError::InvalidAccountId {
            account_id: account_id.to_string(),
            reason: e.to_string(),
        })
}

/// Calls a view method at final finality and decodes its JSON result.
pub async fn view_function<T: DeserializeOwned>(
    clients: &RpcClients,
    contract_id: &str,
    method_name: &str,
    args: Value,
) -> Result<T, DashboardError> {
    let account_id = parse_account_id(contract_id)?;
    let args = args.to_string().into_bytes();

    let response = query_rpc(clients, || methods::query::RpcQueryRequest {
        block_reference: BlockReference::Finality(Finality::Final),
        request: QueryRequest::CallFunction {
            account_id: account_id.clone(),
            method_name: method_name.to_string(),
            args: FunctionArgs::from(args.clone()),
        },
    })
    .await?;

    match response.kind {
        QueryResponseKind::CallResult(call_result) => Ok(serde_json::from_slice(&call_result.result)?),
        _ => Err(DashboardError::UnexpectedResponse(format!(
            "{}.{}",
            contract_id, method_name
        ))),
    }
}

/// View methods of an appchain anchor contract.
#[async_trait]
pub trait AnchorViews: Send + Sync {
    async fn get_anchor_status(&self) -> Result<AnchorStatus, DashboardError>;

    async fn get_protocol_settings(&self) -> Result<ProtocolSettings, DashboardError>;

    /// Raw deposit of a validator, in OCT smallest units.
    async fn get_validator_deposit_of(&self, validator_id: &str) -> Result<String, DashboardError>;

    async fn get_validator_set_info_of(
        &self,
        era_number: &str,
    ) -> Result<ValidatorSetInfo, DashboardError>;

    async fn get_wrapped_appchain_token(&self) -> Result<WrappedAppchainToken, DashboardError>;
}

pub struct AnchorContract {
    clients: Arc<RpcClients>,
    contract_id: String,
}

impl AnchorContract {
    pub fn new(clients: Arc<RpcClients>, contract_id: impl Into<String>) -> Self {
        Self {
            clients,
            contract_id: contract_id.into(),
        }
    }

    pub fn contract_id(&self) -> &str {
        &self.contract_id
    }

    async fn view<T: DeserializeOwned>(&self, method: &str, args: Value) -> Result<T, DashboardError> {
        view_function(&self.clients, &self.contract_id, method, args).await
    }
}

#[async_trait]
impl AnchorViews for AnchorContract {
    async fn get_anchor_status(&self) -> Result<AnchorStatus, DashboardError> {
        self.view("get_anchor_status", json!({})).await
    }

    async fn get_protocol_settings(&self) -> Result<ProtocolSettings, DashboardError> {
        self.view("get_protocol_settings", json!({})).await
    }

    async fn get_validator_deposit_of(&self, validator_id: &str) -> Result<String, DashboardError> {
        self.view(
            "get_validator_deposit_of",
            json!({ "validator_id": validator_id }),
        )
        .await
    }

    async fn get_validator_set_info_of(
        &self,
        era_number: &str,
    ) -> Result<ValidatorSetInfo, DashboardError> {
        self.view(
            "get_validator_set_info_of",
            json!({ "era_number": era_number }),
        )
        .await
    }

    async fn get_wrapped_appchain_token(&self) -> Result<WrappedAppchainToken, DashboardError> {
        self.view("get_wrapped_appchain_token", json!({})).await
    }
}
