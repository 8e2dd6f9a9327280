#![cfg(feature = "serde")]

use riskrule::{Action, FeatureRecord, RuleDraft, RuleSet, RuleStatus, Value, Verdict};

#[test]
fn draft_from_request_body_uses_defaults() {
    let body = r#"{
        "name": "large_withdrawal",
        "logic_expression": "withdrawal_amount > 5000",
        "action": "HOLD"
    }"#;
    let draft: RuleDraft = serde_json::from_str(body).unwrap();
    assert_eq!(draft.action, Action::Hold);
    assert_eq!(draft.priority, riskrule::DEFAULT_PRIORITY);
    assert_eq!(draft.status, RuleStatus::Active);
    assert!(draft.narrative.is_empty());
}

#[test]
fn unknown_action_is_rejected() {
    let body = r#"{"name": "x", "logic_expression": "a", "action": "BLOCK"}"#;
    assert!(serde_json::from_str::<RuleDraft>(body).is_err());
}

#[test]
fn draft_serializes_upper_case_enums() {
    let draft = RuleDraft::new("r", "a", Action::Reject).status(RuleStatus::Inactive);
    let json = serde_json::to_value(&draft).unwrap();
    assert_eq!(json["action"], "REJECT");
    assert_eq!(json["status"], "INACTIVE");
    assert_eq!(json["priority"], 10);
}

#[test]
fn feature_record_from_json() {
    let record: FeatureRecord = serde_json::from_str(
        r#"{"withdrawal_amount": 6000, "risk_score": 0.75, "is_new_device": true, "chain": "TRON"}"#,
    )
    .unwrap();
    assert_eq!(record.get("withdrawal_amount"), Some(&Value::Int(6000)));
    assert_eq!(record.get("risk_score"), Some(&Value::Float(0.75)));
    assert_eq!(record.get("is_new_device"), Some(&Value::Bool(true)));
    assert_eq!(record.get("chain"), Some(&Value::String("TRON".into())));

    let drafts: Vec<RuleDraft> = serde_json::from_str(
        r#"[{"name": "tron", "logic_expression": "chain == 'TRON' and risk_score > 0.5", "action": "HOLD"}]"#,
    )
    .unwrap();
    let ruleset = RuleSet::from_drafts(drafts).unwrap();
    assert_eq!(
        ruleset.evaluate(&record).unwrap(),
        Some(Verdict::new("tron", Action::Hold))
    );
}
