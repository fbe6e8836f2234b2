//! Transaction payloads for wallet-signed calls to the anchor, the OCT token,
//! the registry and the convertor.
//!
//! Payloads serialize to the shape wallet-selector's `signAndSendTransaction`
//! takes. Method names, argument keys and the decimal-string encoding of
//! amounts are what the contracts expect and must not change.

use crate::models::UserVotes;
use crate::utils::TokenAmount;
use serde::Serialize;
use serde_json::{json, Number, Value};

pub const OCT_TOKEN_DECIMALS: u32 = 18;

pub const SIMPLE_CALL_GAS: u64 = 50_000_000_000_000;
pub const COMPLEX_CALL_GAS: u64 = 200_000_000_000_000;

/// Attached to `ft_transfer_call`, which requires exactly one yoctoNEAR.
pub const ONE_YOCTO: &str = "1";
/// Storage deposit attached to `create_pool`: 1 NEAR.
pub const CREATE_POOL_DEPOSIT: &str = "1000000000000000000000000";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    #[serde(rename = "methodName")]
    pub method_name: String,
    pub args: Value,
    #[serde(serialize_with = "gas_as_string")]
    pub gas: u64,
    pub deposit: String,
}

fn gas_as_string<S: serde::Serializer>(gas: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(gas)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "params")]
pub enum Action {
    FunctionCall(FunctionCall),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    #[serde(rename = "receiverId")]
    pub receiver_id: String,
    pub actions: Vec<Action>,
}

impl Transaction {
    fn call(receiver_id: &str, method_name: &str, args: Value, gas: u64, deposit: &str) -> Self {
        Self {
            receiver_id: receiver_id.to_string(),
            actions: vec![Action::FunctionCall(FunctionCall {
                method_name: method_name.to_string(),
                args,
                gas,
                deposit: deposit.to_string(),
            })],
        }
    }

    /// The single function call of a payload built by this module.
    pub fn function_call(&self) -> Option<&FunctionCall> {
        self.actions.first().map(|Action::FunctionCall(call)| call)
    }
}

fn ft_transfer_call(oct_token: &str, anchor: &str, amount: &TokenAmount, msg: String) -> Transaction {
    Transaction::call(
        oct_token,
        "ft_transfer_call",
        json!({
            "receiver_id": anchor,
            "amount": amount.to_raw_string(),
            "msg": msg,
        }),
        COMPLEX_CALL_GAS,
        ONE_YOCTO,
    )
}

pub fn increase_stake(oct_token: &str, anchor: &str, amount: &TokenAmount) -> Transaction {
    ft_transfer_call(oct_token, anchor, amount, "\"IncreaseStake\"".to_string())
}

pub fn decrease_stake(anchor: &str, amount: &TokenAmount) -> Transaction {
    Transaction::call(
        anchor,
        "decrease_stake",
        json!({ "amount": amount.to_raw_string() }),
        COMPLEX_CALL_GAS,
        "0",
    )
}

/// Optional profile attached to a validator registration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidatorProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "socialMediaHandle", skip_serializing_if = "Option::is_none")]
    pub social_media_handle: Option<String>,
}

pub fn register_validator(
    oct_token: &str,
    anchor: &str,
    amount: &TokenAmount,
    validator_id_in_appchain: &str,
    can_be_delegated_to: bool,
    profile: &ValidatorProfile,
) -> Transaction {
    let msg = json!({
        "RegisterValidator": {
            "validator_id_in_appchain": validator_id_in_appchain,
            "can_be_delegated_to": can_be_delegated_to,
            "profile": profile,
        }
    });
    ft_transfer_call(oct_token, anchor, amount, msg.to_string())
}

pub fn register_delegator(
    oct_token: &str,
    anchor: &str,
    validator_id: &str,
    amount: &TokenAmount,
) -> Transaction {
    let msg = json!({ "RegisterDelegator": { "validator_id": validator_id } });
    ft_transfer_call(oct_token, anchor, amount, msg.to_string())
}

pub fn increase_delegation(
    oct_token: &str,
    anchor: &str,
    validator_id: &str,
    amount: &TokenAmount,
) -> Transaction {
    let msg = json!({ "IncreaseDelegation": { "validator_id": validator_id } });
    ft_transfer_call(oct_token, anchor, amount, msg.to_string())
}

pub fn decrease_delegation(anchor: &str, validator_id: &str, amount: &TokenAmount) -> Transaction {
    Transaction::call(
        anchor,
        "decrease_delegation",
        json!({ "validator_id": validator_id, "amount": amount.to_raw_string() }),
        COMPLEX_CALL_GAS,
        "0",
    )
}

pub fn change_delegated_validator(
    anchor: &str,
    old_validator_id: &str,
    new_validator_id: &str,
) -> Transaction {
    Transaction::call(
        anchor,
        "change_delegated_validator",
        json!({
            "old_validator_id": old_validator_id,
            "new_validator_id": new_validator_id,
        }),
        COMPLEX_CALL_GAS,
        "0",
    )
}

pub fn unbond_stake(anchor: &str) -> Transaction {
    Transaction::call(anchor, "unbond_stake", json!({}), COMPLEX_CALL_GAS, "0")
}

pub fn unbond_delegation(anchor: &str, validator_id: &str) -> Transaction {
    Transaction::call(
        anchor,
        "unbond_delegation",
        json!({ "validator_id": validator_id }),
        COMPLEX_CALL_GAS,
        "0",
    )
}

pub fn withdraw_validator_rewards(anchor: &str, validator_id: &str) -> Transaction {
    Transaction::call(
        anchor,
        "withdraw_validator_rewards",
        json!({ "validator_id": validator_id }),
        COMPLEX_CALL_GAS,
        "0",
    )
}

pub fn withdraw_delegator_rewards(anchor: &str, validator_id: &str, delegator_id: &str) -> Transaction {
    Transaction::call(
        anchor,
        "withdraw_delegator_rewards",
        json!({ "validator_id": validator_id, "delegator_id": delegator_id }),
        COMPLEX_CALL_GAS,
        "0",
    )
}

/// Claims the account's rewards: as delegator when a validator is given,
/// otherwise as validator.
pub fn claim_rewards(anchor: &str, account_id: &str, validator_id: Option<&str>) -> Transaction {
    match validator_id {
        Some(validator_id) => withdraw_delegator_rewards(anchor, validator_id, account_id),
        None => withdraw_validator_rewards(anchor, account_id),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteType {
    Upvote,
    Downvote,
}

pub fn withdraw_vote_deposit(
    registry: &str,
    appchain_id: &str,
    vote_type: VoteType,
    amount: &str,
) -> Transaction {
    let method_name = match vote_type {
        VoteType::Upvote => "withdraw_upvote_deposit_of",
        VoteType::Downvote => "withdraw_downvote_deposit_of",
    };
    let amount = if amount.is_empty() { "0" } else { amount };
    Transaction::call(
        registry,
        method_name,
        json!({ "appchain_id": appchain_id, "amount": amount }),
        COMPLEX_CALL_GAS,
        "0",
    )
}

/// Deposit the account has recorded for `vote_type`, the amount the
/// registry releases on withdrawal.
pub fn recorded_vote_deposit(votes: &UserVotes, vote_type: VoteType) -> &str {
    match vote_type {
        VoteType::Upvote => &votes.upvotes,
        VoteType::Downvote => &votes.downvotes,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    pub in_token: String,
    pub out_token: String,
    /// Rates go out as JSON numbers and may be fractional.
    pub in_token_rate: Number,
    pub out_token_rate: Number,
    pub is_reversible: bool,
}

pub fn create_pool(convertor: &str, pool: &Pool) -> Transaction {
    Transaction::call(
        convertor,
        "create_pool",
        json!({
            "in_token": pool.in_token,
            "out_token": pool.out_token,
            "in_token_rate": pool.in_token_rate,
            "out_token_rate": pool.out_token_rate,
            "is_reversible": pool.is_reversible,
        }),
        SIMPLE_CALL_GAS,
        CREATE_POOL_DEPOSIT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::helpers::parse_register_delegator_msg;

    fn oct(amount: &str) -> TokenAmount {
        TokenAmount::from_human(amount, OCT_TOKEN_DECIMALS).unwrap()
    }

    #[test]
    fn test_increase_stake_payload() {
        let tx = increase_stake("oct.testnet", "anchor.testnet", &oct("12.5"));
        assert_eq!(
            serde_json::to_value(&tx).unwrap(),
            json!({
                "receiverId": "oct.testnet",
                "actions": [{
                    "type": "FunctionCall",
                    "params": {
                        "methodName": "ft_transfer_call",
                        "args": {
                            "receiver_id": "anchor.testnet",
                            "amount": "12500000000000000000",
                            "msg": "\"IncreaseStake\""
                        },
                        "gas": "200000000000000",
                        "deposit": "1"
                    }
                }]
            })
        );
    }

    #[test]
    fn test_register_delegator_msg_is_discoverable() {
        let tx = register_delegator("oct.testnet", "anchor.testnet", "v1.testnet", &oct("100"));
        let call = tx.function_call().unwrap();
        let msg = call.args["msg"].as_str().unwrap();
        assert_eq!(parse_register_delegator_msg(msg), Some("v1.testnet".to_string()));
    }

    #[test]
    fn test_claim_rewards_picks_method() {
        let as_validator = claim_rewards("anchor.testnet", "alice.testnet", None);
        let call = as_validator.function_call().unwrap();
        assert_eq!(call.method_name, "withdraw_validator_rewards");
        assert_eq!(call.args, json!({ "validator_id": "alice.testnet" }));
        assert_eq!(call.deposit, "0");

        let as_delegator = claim_rewards("anchor.testnet", "dave.testnet", Some("alice.testnet"));
        let call = as_delegator.function_call().unwrap();
        assert_eq!(call.method_name, "withdraw_delegator_rewards");
        assert_eq!(
            call.args,
            json!({ "validator_id": "alice.testnet", "delegator_id": "dave.testnet" })
        );
    }

    #[test]
    fn test_withdraw_votes() {
        let tx = withdraw_vote_deposit("registry.testnet", "barnacle", VoteType::Downvote, "");
        let call = tx.function_call().unwrap();
        assert_eq!(tx.receiver_id, "registry.testnet");
        assert_eq!(call.method_name, "withdraw_downvote_deposit_of");
        assert_eq!(call.args, json!({ "appchain_id": "barnacle", "amount": "0" }));
    }

    #[test]
    fn test_recorded_vote_deposit_picks_side() {
        let votes = UserVotes {
            upvotes: "7".into(),
            downvotes: "3".into(),
        };
        assert_eq!(recorded_vote_deposit(&votes, VoteType::Upvote), "7");
        assert_eq!(recorded_vote_deposit(&votes, VoteType::Downvote), "3");
    }

    #[test]
    fn test_create_pool_uses_numeric_rates() {
        let pool = Pool {
            in_token: "usdc.testnet".into(),
            out_token: "usdt.testnet".into(),
            in_token_rate: Number::from(1),
            out_token_rate: "0.25".parse().unwrap(),
            is_reversible: true,
        };
        let tx = create_pool("contract.convertor.testnet", &pool);
        let call = tx.function_call().unwrap();
        assert_eq!(call.args["in_token_rate"], json!(1));
        assert_eq!(call.args["out_token_rate"], json!(0.25));
        assert_eq!(call.gas, SIMPLE_CALL_GAS);
        assert_eq!(call.deposit, CREATE_POOL_DEPOSIT);
    }

    #[test]
    fn test_redelegate_and_unbond() {
        let call = change_delegated_validator("anchor.testnet", "v1", "v2");
        assert_eq!(
            call.function_call().unwrap().args,
            json!({ "old_validator_id": "v1", "new_validator_id": "v2" })
        );
        let call = decrease_delegation("anchor.testnet", "v1", &oct("1"));
        assert_eq!(
            call.function_call().unwrap().args["amount"],
            json!("1000000000000000000")
        );
        assert_eq!(
            unbond_stake("anchor.testnet").function_call().unwrap().method_name,
            "unbond_stake"
        );
    }
}
