use serde::{Deserialize, Serialize};

use super::RewardHistory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    pub validator_id: String,
    pub validator_id_in_appchain: String,
    pub deposit_amount: String,
    pub total_stake: String,
    pub delegators_count: String,
    pub can_be_delegated_to: bool,
    #[serde(default)]
    pub is_unbonding: bool,
    #[serde(default)]
    pub rewards: Vec<RewardHistory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegator {
    pub delegator_id: String,
    #[serde(default)]
    pub deposit_amount: String,
}

/// Badge shown for a validator in the validator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidatorDisplayState {
    Unbonding,
    Validating,
    #[serde(rename = "Need Keys")]
    NeedKeys,
    Registered,
}

impl ValidatorDisplayState {
    /// `in_appchain` is whether the appchain's session currently lists the
    /// validator; `has_session_key` whether its next session keys are set.
    pub fn derive(validator: &Validator, in_appchain: bool, has_session_key: bool) -> Self {
        if validator.is_unbonding {
            ValidatorDisplayState::Unbonding
        } else if in_appchain && has_session_key {
            ValidatorDisplayState::Validating
        } else if in_appchain {
            ValidatorDisplayState::NeedKeys
        } else {
            ValidatorDisplayState::Registered
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ValidatorDisplayState::Unbonding => "Unbonding",
            ValidatorDisplayState::Validating => "Validating",
            ValidatorDisplayState::NeedKeys => "Need Keys",
            ValidatorDisplayState::Registered => "Registered",
        }
    }
}

/// The account is a validator of the appchain and is not unbonding.
pub fn is_active_validator(validators: &[Validator], account_id: &str) -> bool {
    validators
        .iter()
        .find(|v| v.validator_id == account_id)
        .map(|v| !v.is_unbonding)
        .unwrap_or(false)
}

/// An active validator that has not yet published session keys on the appchain.
pub fn needs_session_keys(
    validators: &[Validator],
    account_id: &str,
    has_session_key: impl Fn(&str) -> bool,
) -> bool {
    !account_id.is_empty()
        && is_active_validator(validators, account_id)
        && !has_session_key(account_id)
}

pub fn is_delegated_by(delegators: &[Delegator], account_id: &str) -> bool {
    delegators.iter().any(|d| d.delegator_id == account_id)
}

#[cfg(test)]
pub(crate) fn test_validator(id: &str) -> Validator {
    Validator {
        validator_id: id.to_string(),
        validator_id_in_appchain: format!("0x{}", id),
        deposit_amount: "5000000000000000000000".to_string(),
        total_stake: "12000000000000000000000".to_string(),
        delegators_count: "3".to_string(),
        can_be_delegated_to: true,
        is_unbonding: false,
        rewards: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_state_precedence() {
        let mut validator = test_validator("alice.near");
        assert_eq!(
            ValidatorDisplayState::derive(&validator, false, false),
            ValidatorDisplayState::Registered
        );
        assert_eq!(
            ValidatorDisplayState::derive(&validator, true, false),
            ValidatorDisplayState::NeedKeys
        );
        assert_eq!(
            ValidatorDisplayState::derive(&validator, true, true),
            ValidatorDisplayState::Validating
        );
        validator.is_unbonding = true;
        assert_eq!(
            ValidatorDisplayState::derive(&validator, true, true),
            ValidatorDisplayState::Unbonding
        );
    }

    #[test]
    fn test_unbonding_validator_is_not_active() {
        let mut bob = test_validator("bob.near");
        bob.is_unbonding = true;
        let validators = vec![test_validator("alice.near"), bob];
        assert!(is_active_validator(&validators, "alice.near"));
        assert!(!is_active_validator(&validators, "bob.near"));
        assert!(!is_active_validator(&validators, "carol.near"));
    }

    #[test]
    fn test_needs_session_keys() {
        let validators = vec![test_validator("alice.near")];
        assert!(needs_session_keys(&validators, "alice.near", |_| false));
        assert!(!needs_session_keys(&validators, "alice.near", |_| true));
        assert!(!needs_session_keys(&validators, "", |_| false));
    }

    #[test]
    fn test_validator_without_optional_fields() {
        let json = r#"{
            "validator_id": "alice.near",
            "validator_id_in_appchain": "0xabc",
            "deposit_amount": "1",
            "total_stake": "2",
            "delegators_count": "0",
            "can_be_delegated_to": false
        }"#;
        let validator: Validator = serde_json::from_str(json).unwrap();
        assert!(!validator.is_unbonding);
        assert!(validator.rewards.is_empty());
    }
}
