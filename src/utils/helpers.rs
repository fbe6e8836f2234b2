use serde_json::Value;

/// Extracts `RegisterDelegator.validator_id` from the `msg` of an
/// `ft_transfer_call`.
///
/// Explorer rows carry the message JSON-escaped and sometimes percent-encoded,
/// so backslashes are stripped and the rest percent-decoded before parsing.
/// Returns `None` for anything that is not a delegator registration.
pub fn parse_register_delegator_msg(msg: &str) -> Option<String> {
    let unescaped = msg.replace('\\', "");
    let decoded = urlencoding::decode(&unescaped).ok()?;
    let value: Value = serde_json::from_str(&decoded).ok()?;
    value
        .get("RegisterDelegator")?
        .get("validator_id")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_register_delegator_msg() {
        assert_eq!(
            parse_register_delegator_msg(r#"{"RegisterDelegator":{"validator_id":"v1"}}"#),
            Some("v1".to_string())
        );
    }

    #[test]
    fn test_escaped_and_encoded_msg() {
        let escaped = r#"{\"RegisterDelegator\":{\"validator_id\":\"v1.near\"}}"#;
        assert_eq!(
            parse_register_delegator_msg(escaped),
            Some("v1.near".to_string())
        );
        let encoded = "%7B%22RegisterDelegator%22%3A%7B%22validator_id%22%3A%22v2%22%7D%7D";
        assert_eq!(parse_register_delegator_msg(encoded), Some("v2".to_string()));
    }

    #[test]
    fn test_other_messages_are_rejected() {
        assert_eq!(parse_register_delegator_msg("\"IncreaseStake\""), None);
        assert_eq!(
            parse_register_delegator_msg(r#"{"RegisterValidator":{"validator_id_in_appchain":"0x1"}}"#),
            None
        );
        assert_eq!(parse_register_delegator_msg("%E0%A4%A"), None);
        assert_eq!(parse_register_delegator_msg("not json"), None);
    }
}
