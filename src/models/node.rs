use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeState {
    #[serde(rename = "0")]
    Init,
    #[serde(rename = "10")]
    Applying,
    #[serde(rename = "11")]
    ApplyFailed,
    #[serde(rename = "12")]
    Running,
    #[serde(rename = "20")]
    Destroying,
    #[serde(rename = "21")]
    DestroyFailed,
    #[serde(rename = "22")]
    Destroyed,
    #[serde(rename = "30")]
    Upgrading,
}

impl NodeState {
    pub fn label(&self) -> &'static str {
        match self {
            NodeState::Init => "Init",
            NodeState::Applying => "Applying",
            NodeState::ApplyFailed => "Apply Failed",
            NodeState::Running => "Running",
            NodeState::Destroying => "Destroying",
            NodeState::DestroyFailed => "Destroy Failed",
            NodeState::Destroyed => "Destroyed",
            NodeState::Upgrading => "Upgrading",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloudVendor {
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "GCP")]
    Gcp,
    #[serde(rename = "DO")]
    DigitalOcean,
}

impl CloudVendor {
    /// Prompt for the credential the deploy API needs to touch the server, if any.
    pub fn secret_prompt(&self) -> Option<&'static str> {
        match self {
            CloudVendor::Aws => Some("Please enter the secret key of your server"),
            CloudVendor::DigitalOcean => {
                Some("Please enter the personal access token of your server")
            }
            CloudVendor::Gcp => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInstance {
    pub id: String,
    pub region: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub ssh_key: Option<String>,
}

/// Deployment task a node was created from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTask {
    pub cloud_vendor: CloudVendor,
    #[serde(default)]
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub uuid: String,
    pub state: NodeState,
    /// Deploy API user token, sent back as the authorization header.
    pub user: String,
    #[serde(default)]
    pub sync: bool,
    #[serde(default)]
    pub task: Option<NodeTask>,
    #[serde(default)]
    pub instance: Option<NodeInstance>,
}

impl Node {
    pub fn cloud_vendor(&self) -> Option<CloudVendor> {
        self.task.as_ref().map(|task| task.cloud_vendor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeAction {
    Apply,
    Delete,
    Destroy,
    RegisterValidator,
    DownloadSshKey,
}

/// What the node panel offers for a node in its current state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeBoard {
    pub label: String,
    pub in_progress: bool,
    pub actions: Vec<NodeAction>,
}

impl NodeBoard {
    pub fn for_node(node: &Node) -> Self {
        let has_ssh_key = node
            .instance
            .as_ref()
            .and_then(|i| i.ssh_key.as_ref())
            .is_some();
        let mut actions = Vec::new();
        let mut in_progress = false;
        match node.state {
            NodeState::Init => actions.extend([NodeAction::Apply, NodeAction::Delete]),
            NodeState::Applying | NodeState::Destroying => in_progress = true,
            NodeState::ApplyFailed | NodeState::DestroyFailed => actions.push(NodeAction::Destroy),
            NodeState::Running => {
                if has_ssh_key {
                    actions.push(NodeAction::DownloadSshKey);
                }
                if node.sync {
                    actions.push(NodeAction::RegisterValidator);
                }
                actions.push(NodeAction::Destroy);
            }
            NodeState::Destroyed => actions.push(NodeAction::Delete),
            NodeState::Upgrading => {
                if has_ssh_key {
                    actions.push(NodeAction::DownloadSshKey);
                }
            }
        }
        let label = if node.state == NodeState::Running && !node.sync {
            "Syncing".to_string()
        } else {
            node.state.label().to_string()
        };
        NodeBoard {
            label,
            in_progress,
            actions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(state: NodeState, sync: bool) -> Node {
        Node {
            uuid: "8d4f".to_string(),
            state,
            user: "token".to_string(),
            sync,
            task: Some(NodeTask {
                cloud_vendor: CloudVendor::Aws,
                region: "us-west-2".to_string(),
            }),
            instance: Some(NodeInstance {
                id: "i-1".to_string(),
                region: "us-west-2".to_string(),
                url: "https://console.aws".to_string(),
                ssh_key: Some("https://keys/ssh".to_string()),
            }),
        }
    }

    #[test]
    fn test_running_node_registers_only_when_synced() {
        let syncing = NodeBoard::for_node(&node(NodeState::Running, false));
        assert_eq!(syncing.label, "Syncing");
        assert!(!syncing.actions.contains(&NodeAction::RegisterValidator));

        let synced = NodeBoard::for_node(&node(NodeState::Running, true));
        assert_eq!(synced.label, "Running");
        assert_eq!(
            synced.actions,
            vec![
                NodeAction::DownloadSshKey,
                NodeAction::RegisterValidator,
                NodeAction::Destroy
            ]
        );
    }

    #[test]
    fn test_transitional_states_offer_nothing() {
        for state in [NodeState::Applying, NodeState::Destroying] {
            let board = NodeBoard::for_node(&node(state, false));
            assert!(board.in_progress);
            assert!(board.actions.is_empty());
        }
    }

    #[test]
    fn test_node_state_wire_values() {
        let node: Node =
            serde_json::from_str(r#"{"uuid":"u","state":"11","user":"t"}"#).unwrap();
        assert_eq!(node.state, NodeState::ApplyFailed);
        assert!(node.cloud_vendor().is_none());
        assert_eq!(NodeBoard::for_node(&node).actions, vec![NodeAction::Destroy]);
    }

    #[test]
    fn test_failed_nodes_can_only_be_destroyed() {
        for state in [NodeState::ApplyFailed, NodeState::DestroyFailed] {
            let board = NodeBoard::for_node(&node(state, false));
            assert!(!board.in_progress);
            assert_eq!(board.actions, vec![NodeAction::Destroy]);
        }
    }

    #[test]
    fn test_cloud_vendor_from_task() {
        let node: Node = serde_json::from_str(
            r#"{"uuid":"u","state":"12","user":"t","task":{"cloud_vendor":"DO","region":"nyc1"}}"#,
        )
        .unwrap();
        assert_eq!(node.cloud_vendor(), Some(CloudVendor::DigitalOcean));
        assert!(CloudVendor::Gcp.secret_prompt().is_none());
    }
}
