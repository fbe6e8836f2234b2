//! Reconstruction of which validators an account delegates to, from indexed
//! anchor calls.

use crate::error::{DashboardError, FetchFailure};
use crate::models::{ActionReceiptAction, NetworkConfig};
use crate::services::explorer::EventIndex;
use crate::utils::helpers::parse_register_delegator_msg;
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeSet;

const REGISTER_DELEGATOR_QUERY: &str = "
          SELECT * FROM public.action_receipt_actions
          WHERE receipt_receiver_account_id = $1
          AND receipt_predecessor_account_id = $2
          AND args->>'method_name' = 'ft_transfer_call'
          AND args->'args_json'->>'receiver_id' = $3
          LIMIT 100;
        ";

const REDELEGATE_QUERY: &str = "
          SELECT * FROM public.action_receipt_actions
          WHERE receipt_receiver_account_id = $1
          AND args->>'method_name' = 'change_delegated_validator'
          AND receipt_predecessor_account_id = $2
          LIMIT 100;
        ";

const UNBOND_DELEGATION_QUERY: &str = "
          SELECT * FROM public.action_receipt_actions
          WHERE receipt_receiver_account_id = $1
          AND args->>'method_name' = 'unbond_delegation'
          AND receipt_predecessor_account_id = $2
          LIMIT 100;
        ";

const UNBOND_STAKE_QUERY: &str = "
          SELECT * FROM public.action_receipt_actions
          WHERE receipt_receiver_account_id = $1
          AND args->>'method_name' = 'unbond_stake'
          LIMIT 100;
        ";

/// Result of delegated-validator discovery.
///
/// `validator_ids` holds whatever could be reconstructed; the error fields say
/// which of the two event queries did not contribute.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DelegatedValidators {
    pub validator_ids: BTreeSet<String>,
    pub registration_error: Option<FetchFailure>,
    pub redelegation_error: Option<FetchFailure>,
}

impl DelegatedValidators {
    pub fn is_complete(&self) -> bool {
        self.registration_error.is_none() && self.redelegation_error.is_none()
    }
}

async fn registered_validators(
    index: &dyn EventIndex,
    network: &NetworkConfig,
    anchor: &str,
    delegator_id: &str,
) -> Result<Vec<String>, DashboardError> {
    let rows = index
        .query(
            vec![
                network.oct_token_contract_id.clone(),
                delegator_id.to_string(),
                anchor.to_string(),
            ],
            REGISTER_DELEGATOR_QUERY,
        )
        .await?;
    Ok(rows
        .iter()
        .filter_map(|row| parse_register_delegator_msg(row.arg_str("msg")))
        .collect())
}

/// Validator ids touched by `change_delegated_validator` calls of the delegator,
/// both the one left and the one joined.
pub async fn get_redelegate_history(
    index: &dyn EventIndex,
    anchor: &str,
    delegator_id: &str,
) -> Result<BTreeSet<String>, DashboardError> {
    let rows = index
        .query(
            vec![anchor.to_string(), delegator_id.to_string()],
            REDELEGATE_QUERY,
        )
        .await?;
    let mut ids = BTreeSet::new();
    for row in rows.iter().filter(|row| row.args_json().is_some()) {
        ids.insert(row.arg_str("new_validator_id").to_string());
        ids.insert(row.arg_str("old_validator_id").to_string());
    }
    Ok(ids)
}

/// Every validator the delegator registered with or redelegated from/to.
///
/// This over-approximates the current delegations on purpose: a former
/// validator can still hold unclaimed rewards for the delegator.
pub async fn get_delegated_validators(
    index: &dyn EventIndex,
    network: &NetworkConfig,
    anchor: &str,
    delegator_id: &str,
) -> DelegatedValidators {
    let mut result = DelegatedValidators::default();

    match registered_validators(index, network, anchor, delegator_id).await {
        Ok(ids) => result.validator_ids.extend(ids),
        Err(e) => {
            warn!(
                "Failed to fetch registrations of {} on {}: {}",
                delegator_id, anchor, e
            );
            result.registration_error = Some(FetchFailure::from(e));
        }
    }

    let redelegations = match get_redelegate_history(index, anchor, delegator_id).await {
        Ok(ids) => Ok(ids),
        Err(e) => {
            warn!("Redelegate history query failed, retrying once: {}", e);
            get_redelegate_history(index, anchor, delegator_id).await
        }
    };
    match redelegations {
        Ok(ids) => result.validator_ids.extend(ids),
        Err(e) => {
            warn!(
                "Failed to fetch redelegations of {} on {}: {}",
                delegator_id, anchor, e
            );
            result.redelegation_error = Some(FetchFailure::from(e));
        }
    }

    result.validator_ids.retain(|id| !id.is_empty());
    info!(
        "{} delegates to {} validator(s) on {}",
        delegator_id,
        result.validator_ids.len(),
        anchor
    );
    result
}

/// Accounts that called `unbond_stake` on the anchor.
pub async fn get_unbonded_validators(
    index: &dyn EventIndex,
    anchor: &str,
) -> Result<BTreeSet<String>, DashboardError> {
    let rows = index
        .query(vec![anchor.to_string()], UNBOND_STAKE_QUERY)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| row.receipt_predecessor_account_id)
        .filter(|id| !id.is_empty())
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DelegationChange {
    Registered { validator_id: String },
    Redelegated { old_validator_id: String, new_validator_id: String },
    Unbonded { validator_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegationEvent {
    /// Block timestamp in nanoseconds, when the index provides one.
    pub timestamp: Option<u128>,
    pub change: DelegationChange,
}

impl DelegationEvent {
    fn new(row: &ActionReceiptAction, change: DelegationChange) -> Self {
        Self {
            timestamp: row.block_timestamp(),
            change,
        }
    }
}

/// Current delegations, folded from the delegator's event history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DelegationLedger {
    pub validator_ids: BTreeSet<String>,
}

impl DelegationLedger {
    /// Applies events in timestamp order; events without a timestamp keep
    /// their relative position after the timestamped ones.
    pub fn fold(mut events: Vec<DelegationEvent>) -> Self {
        events.sort_by_key(|e| (e.timestamp.is_none(), e.timestamp));
        let mut ledger = DelegationLedger::default();
        for event in events {
            ledger.apply(&event.change);
        }
        ledger
    }

    pub fn apply(&mut self, change: &DelegationChange) {
        match change {
            DelegationChange::Registered { validator_id } => {
                if !validator_id.is_empty() {
                    self.validator_ids.insert(validator_id.clone());
                }
            }
            DelegationChange::Redelegated {
                old_validator_id,
                new_validator_id,
            } => {
                // Moving stake out of a validator never delegated to is ignored.
                if self.validator_ids.remove(old_validator_id) && !new_validator_id.is_empty() {
                    self.validator_ids.insert(new_validator_id.clone());
                }
            }
            DelegationChange::Unbonded { validator_id } => {
                self.validator_ids.remove(validator_id);
            }
        }
    }
}

/// Register, redelegate and unbond events of a delegator on an anchor.
pub async fn collect_delegation_events(
    index: &dyn EventIndex,
    network: &NetworkConfig,
    anchor: &str,
    delegator_id: &str,
) -> Result<Vec<DelegationEvent>, DashboardError> {
    let (registrations, redelegations, unbonds) = futures::try_join!(
        index.query(
            vec![
                network.oct_token_contract_id.clone(),
                delegator_id.to_string(),
                anchor.to_string(),
            ],
            REGISTER_DELEGATOR_QUERY,
        ),
        index.query(
            vec![anchor.to_string(), delegator_id.to_string()],
            REDELEGATE_QUERY,
        ),
        index.query(
            vec![anchor.to_string(), delegator_id.to_string()],
            UNBOND_DELEGATION_QUERY,
        ),
    )?;

    let mut events = Vec::new();
    for row in &registrations {
        if let Some(validator_id) = parse_register_delegator_msg(row.arg_str("msg")) {
            events.push(DelegationEvent::new(
                row,
                DelegationChange::Registered { validator_id },
            ));
        }
    }
    for row in redelegations.iter().filter(|row| row.args_json().is_some()) {
        events.push(DelegationEvent::new(
            row,
            DelegationChange::Redelegated {
                old_validator_id: row.arg_str("old_validator_id").to_string(),
                new_validator_id: row.arg_str("new_validator_id").to_string(),
            },
        ));
    }
    for row in unbonds.iter().filter(|row| row.args_json().is_some()) {
        events.push(DelegationEvent::new(
            row,
            DelegationChange::Unbonded {
                validator_id: row.arg_str("validator_id").to_string(),
            },
        ));
    }
    Ok(events)
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted index: rows per method name, plus a number of failures to
    /// serve before answering each method.
    #[derive(Default)]
    pub struct FakeIndex {
        pub register_rows: Vec<ActionReceiptAction>,
        pub redelegate_rows: Vec<ActionReceiptAction>,
        pub unbond_rows: Vec<ActionReceiptAction>,
        pub register_failures: AtomicUsize,
        pub redelegate_failures: AtomicUsize,
        pub calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl FakeIndex {
        pub fn redelegate_calls(&self) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(method, _)| method == "change_delegated_validator")
                .count()
        }
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    #[async_trait]
    impl EventIndex for FakeIndex {
        async fn query(
            &self,
            parameters: Vec<String>,
            query: &str,
        ) -> Result<Vec<ActionReceiptAction>, DashboardError> {
            let method = ["ft_transfer_call", "change_delegated_validator", "unbond_delegation", "unbond_stake"]
                .into_iter()
                .find(|m| query.contains(&format!("'{}'", m)))
                .unwrap_or("unknown");
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), parameters));
            let failing = match method {
                "ft_transfer_call" => take_failure(&self.register_failures),
                "change_delegated_validator" => take_failure(&self.redelegate_failures),
                _ => false,
            };
            if failing {
                return Err(DashboardError::Status {
                    url: "https://rest.test/explorer".to_string(),
                    status: 500,
                });
            }
            Ok(match method {
                "ft_transfer_call" => self.register_rows.clone(),
                "change_delegated_validator" => self.redelegate_rows.clone(),
                "unbond_delegation" | "unbond_stake" => self.unbond_rows.clone(),
                _ => Vec::new(),
            })
        }
    }

    pub fn register_row(msg: &str, timestamp: u64) -> ActionReceiptAction {
        serde_json::from_value(serde_json::json!({
            "receipt_predecessor_account_id": "dave.testnet",
            "receipt_receiver_account_id": "oct.beta_oct_relay.testnet",
            "receipt_included_in_block_timestamp": timestamp,
            "args": {
                "method_name": "ft_transfer_call",
                "args_json": { "receiver_id": "anchor.testnet", "amount": "1", "msg": msg }
            }
        }))
        .unwrap()
    }

    pub fn redelegate_row(old: &str, new: &str, timestamp: u64) -> ActionReceiptAction {
        serde_json::from_value(serde_json::json!({
            "receipt_predecessor_account_id": "dave.testnet",
            "receipt_receiver_account_id": "anchor.testnet",
            "receipt_included_in_block_timestamp": timestamp,
            "args": {
                "method_name": "change_delegated_validator",
                "args_json": { "old_validator_id": old, "new_validator_id": new }
            }
        }))
        .unwrap()
    }

    pub fn unbond_row(predecessor: &str, validator_id: &str, timestamp: u64) -> ActionReceiptAction {
        serde_json::from_value(serde_json::json!({
            "receipt_predecessor_account_id": predecessor,
            "receipt_receiver_account_id": "anchor.testnet",
            "receipt_included_in_block_timestamp": timestamp,
            "args": {
                "method_name": "unbond_delegation",
                "args_json": { "validator_id": validator_id }
            }
        }))
        .unwrap()
    }
}
