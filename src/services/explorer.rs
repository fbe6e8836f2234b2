use crate::error::DashboardError;
use crate::models::{ActionReceiptAction, ExplorerQuery, NetworkConfig};
use async_trait::async_trait;
use log::{debug, warn};

/// A parameterized SQL interface over indexed NEAR receipts.
#[async_trait]
pub trait EventIndex: Send + Sync {
    async fn query(
        &self,
        parameters: Vec<String>,
        query: &str,
    ) -> Result<Vec<ActionReceiptAction>, DashboardError>;
}

/// Client of the `/explorer` pass-through endpoint of the NEAR REST API.
pub struct ExplorerClient {
    client: reqwest::Client,
    network: NetworkConfig,
}

impl ExplorerClient {
    pub fn new(client: reqwest::Client, network: NetworkConfig) -> Self {
        Self { client, network }
    }

    fn endpoint(&self) -> String {
        format!("{}/explorer", self.network.rest_api_url.trim_end_matches('/'))
    }

    fn body<'a>(&'a self, parameters: Vec<String>, query: &'a str) -> ExplorerQuery<'a> {
        ExplorerQuery {
            user: &self.network.explorer.user,
            host: self.network.explorer_host(),
            database: self.network.explorer_database(),
            password: &self.network.explorer.password,
            port: self.network.explorer.port,
            parameters,
            query,
        }
    }
}

#[async_trait]
impl EventIndex for ExplorerClient {
    async fn query(
        &self,
        parameters: Vec<String>,
        query: &str,
    ) -> Result<Vec<ActionReceiptAction>, DashboardError> {
        let url = self.endpoint();
        debug!("POST {} with parameters {:?}", url, parameters);
        let response = self
            .client
            .post(&url)
            .json(&self.body(parameters, query))
            .send()
            .await?;
        if !response.status().is_success() {
            warn!("Explorer query failed with status {}", response.status());
            return Err(DashboardError::Status {
                url,
                status: response.status().as_u16(),
            });
        }
        Ok(response.json().await?)
    }
}
