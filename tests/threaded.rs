use std::sync::Arc;
use std::thread;

use riskrule::{Action, FeatureRecord, RuleSetBuilder, Verdict};

#[test]
fn evaluate_across_threads() {
    let ruleset = Arc::new(
        RuleSetBuilder::new()
            .rule("sanctioned", |r| {
                r.when("is_sanctioned").action(Action::Reject).priority(100)
            })
            .rule("big_withdrawal", |r| {
                r.when("withdrawal_amount > 5000 and is_new_device")
                    .action(Action::Hold)
                    .priority(50)
            })
            .rule("trusted", |r| {
                r.when("account_age_days >= 365").action(Action::Pass)
            })
            .compile()
            .unwrap(),
    );

    let record = |sanctioned: bool, amount: i64, new_device: bool, age: i64| {
        FeatureRecord::new()
            .set("is_sanctioned", sanctioned)
            .set("withdrawal_amount", amount)
            .set("is_new_device", new_device)
            .set("account_age_days", age)
    };

    let inputs = vec![
        record(true, 10, false, 900),
        record(false, 6000, true, 900),
        record(false, 6000, false, 900),
        record(false, 100, false, 30),
    ];

    let handles: Vec<_> = inputs
        .into_iter()
        .map(|features| {
            let rs = Arc::clone(&ruleset);
            thread::spawn(move || rs.evaluate(&features).unwrap())
        })
        .collect();

    let results: Vec<Option<Verdict>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results[0], Some(Verdict::new("sanctioned", Action::Reject)));
    assert_eq!(results[1], Some(Verdict::new("big_withdrawal", Action::Hold)));
    assert_eq!(results[2], Some(Verdict::new("trusted", Action::Pass)));
    assert_eq!(results[3], None);
}

#[test]
fn validated_expressions_are_shareable() {
    let expr = Arc::new(riskrule::validate("risk_score * 2 > 1.5").unwrap());
    let handles: Vec<_> = (0..4_i64)
        .map(|i| {
            let expr = Arc::clone(&expr);
            thread::spawn(move || {
                let features = FeatureRecord::new().set("risk_score", i);
                riskrule::evaluate(&expr, &features).unwrap()
            })
        })
        .collect();
    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![false, true, true, true]);
}
