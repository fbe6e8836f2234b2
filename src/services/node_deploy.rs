use crate::error::DashboardError;
use crate::models::Node;
use log::{info, warn};
use serde_json::json;

/// Tears down a deployed node's cloud resources through the deploy API.
///
/// AWS and DigitalOcean nodes need the server credential; without one
/// nothing is sent.
pub async fn destroy_node(
    client: &reqwest::Client,
    deploy_api_host: &str,
    node: &Node,
    secret_key: Option<&str>,
) -> Result<(), DashboardError> {
    let secret_key = secret_key.filter(|key| !key.is_empty());
    if let Some(prompt) = node.cloud_vendor().and_then(|vendor| vendor.secret_prompt()) {
        if secret_key.is_none() {
            warn!("Not destroying node {} without a secret key", node.uuid);
            return Err(DashboardError::SecretKeyRequired(prompt));
        }
    }

    let url = task_url(deploy_api_host, &node.uuid);
    info!("Destroying node {}", node.uuid);
    let response = client
        .delete(&url)
        .header(reqwest::header::AUTHORIZATION, &node.user)
        .json(&json!({ "secret_key": secret_key }))
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(DashboardError::Status {
            url,
            status: response.status().as_u16(),
        });
    }
    Ok(())
}

fn task_url(deploy_api_host: &str, uuid: &str) -> String {
    format!("{}/tasks/{}", deploy_api_host.trim_end_matches('/'), uuid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn aws_node() -> Node {
        serde_json::from_str(
            r#"{"uuid":"8d4f","state":"12","user":"t","task":{"cloud_vendor":"AWS"}}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_task_url() {
        assert_eq!(
            task_url("https://deploy.test/api/", "8d4f"),
            "https://deploy.test/api/tasks/8d4f"
        );
    }

    #[tokio::test]
    async fn test_aws_node_needs_secret_key() {
        let client = reqwest::Client::new();
        for secret_key in [None, Some("")] {
            let err = destroy_node(&client, "http://127.0.0.1:9", &aws_node(), secret_key)
                .await
                .unwrap_err();
            assert!(matches!(err, DashboardError::SecretKeyRequired(_)));
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }
}
