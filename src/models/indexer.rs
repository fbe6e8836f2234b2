use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a parameterized query against the explorer database.
#[derive(Debug, Clone, Serialize)]
pub struct ExplorerQuery<'a> {
    pub user: &'a str,
    pub host: String,
    pub database: String,
    pub password: &'a str,
    pub port: u16,
    pub parameters: Vec<String>,
    pub query: &'a str,
}

/// A row of `public.action_receipt_actions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionReceiptAction {
    #[serde(default)]
    pub receipt_id: Option<String>,
    #[serde(default)]
    pub receipt_predecessor_account_id: String,
    #[serde(default)]
    pub receipt_receiver_account_id: String,
    #[serde(default)]
    pub receipt_included_in_block_timestamp: Option<Value>,
    #[serde(default)]
    pub args: Value,
}

impl ActionReceiptAction {
    pub fn args_json(&self) -> Option<&Value> {
        self.args.get("args_json").filter(|v| !v.is_null())
    }

    /// String field of `args_json`, empty when absent.
    pub fn arg_str(&self, name: &str) -> &str {
        self.args_json()
            .and_then(|a| a.get(name))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Block timestamp in nanoseconds; the explorer serves it either as a
    /// JSON number or as a numeric string.
    pub fn block_timestamp(&self) -> Option<u128> {
        match self.receipt_included_in_block_timestamp.as_ref()? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n
                .as_u64()
                .map(u128::from)
                .or_else(|| n.to_string().parse().ok()),
            _ => None,
        }
    }
}
