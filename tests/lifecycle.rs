use riskrule::store::{MemoryRuleStore, RuleStore, StoreError};
use riskrule::{
    Action, FeatureRecord, NodeKind, RuleDraft, RuleSetError, RuleStatus, ValidationError, Verdict,
};

fn console() -> MemoryRuleStore {
    let mut store = MemoryRuleStore::new();
    store
        .create(
            RuleDraft::new(
                "large_withdrawal_new_device",
                "withdrawal_amount > 5000 and is_new_device",
                Action::Hold,
            )
            .narrative("Large withdrawal from an unrecognised device"),
        )
        .unwrap();
    store
        .create(RuleDraft::new("sanctioned", "is_sanctioned", Action::Reject).priority(100))
        .unwrap();
    store
}

#[test]
fn store_never_holds_an_invalid_rule() {
    let mut store = console();
    let attempts = [
        "__import__('os').system('rm -rf /')",
        "open('/etc/passwd').read()",
        "amount >",
        "   ",
        "[x for x in range(10)]",
    ];
    for text in attempts {
        let result = store.create(RuleDraft::new("attempt", text, Action::Pass));
        assert!(
            matches!(result, Err(StoreError::Rejected(RuleSetError::InvalidRule { .. }))),
            "{text}"
        );
    }
    assert_eq!(store.len(), 2);
    for (_, rule) in store.list() {
        assert!(riskrule::validate(rule.logic_expression()).is_ok());
    }
}

#[test]
fn rejection_reason_reaches_the_operator() {
    let mut store = console();
    let err = store
        .create(RuleDraft::new("evil", "os.system('x')", Action::Pass))
        .unwrap_err();
    assert_eq!(
        err,
        StoreError::Rejected(RuleSetError::InvalidRule {
            rule: "evil".into(),
            source: ValidationError::DisallowedElement {
                kind: NodeKind::Call
            },
        })
    );
    assert_eq!(
        err.to_string(),
        "rule 'evil' has an invalid expression: disallowed element: function call"
    );
}

#[test]
fn edit_cycle_revalidates() {
    let mut store = console();
    let (id, rule) = store
        .list()
        .into_iter()
        .find(|(_, r)| r.name() == "sanctioned")
        .map(|(id, r)| (id, r.clone()))
        .unwrap();

    let mut draft = rule.into_draft();
    draft.logic_expression = "is_sanctioned and eval('1')".into();
    assert!(store.update(id, draft.clone()).is_err());
    assert_eq!(store.get(id).unwrap().logic_expression(), "is_sanctioned");

    draft.logic_expression = "is_sanctioned or watchlist_hits > 0".into();
    store.update(id, draft).unwrap();
    assert_eq!(
        store.get(id).unwrap().logic_expression(),
        "is_sanctioned or watchlist_hits > 0"
    );
}

#[test]
fn stored_rules_decide_transactions() {
    let mut store = console();
    let ruleset = store.ruleset().unwrap();
    assert_eq!(
        ruleset.evaluation_order(),
        vec!["sanctioned", "large_withdrawal_new_device"]
    );

    let features = FeatureRecord::new()
        .set("is_sanctioned", false)
        .set("withdrawal_amount", 7500_i64)
        .set("is_new_device", true);
    assert_eq!(
        ruleset.evaluate(&features).unwrap(),
        Some(Verdict::new("large_withdrawal_new_device", Action::Hold))
    );

    // Deactivating a rule removes it from evaluation without touching validity.
    let (id, rule) = store
        .list()
        .into_iter()
        .find(|(_, r)| r.name() == "large_withdrawal_new_device")
        .map(|(id, r)| (id, r.clone()))
        .unwrap();
    store
        .update(id, rule.into_draft().status(RuleStatus::Inactive))
        .unwrap();
    let ruleset = store.ruleset().unwrap();
    assert_eq!(ruleset.evaluate(&features).unwrap(), None);
}
