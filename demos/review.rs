//! Walks one operator session: submit rules, see rejections, review a
//! withdrawal. Run with `RUST_LOG=riskrule=trace` to see the library's logs.

use riskrule::store::{MemoryRuleStore, RuleStore};
use riskrule::{Action, FeatureRecord, RiskRuleError, RuleDraft};

fn main() -> Result<(), RiskRuleError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("riskrule=debug")),
        )
        .init();

    let mut store = MemoryRuleStore::new();

    let submissions = [
        RuleDraft::new("sanctioned", "is_sanctioned", Action::Reject)
            .priority(100)
            .narrative("Counterparty on a sanctions list"),
        RuleDraft::new(
            "large_withdrawal_new_device",
            "withdrawal_amount > 5000 and is_new_device",
            Action::Hold,
        )
        .narrative("Large withdrawal from an unrecognised device"),
        RuleDraft::new(
            "high_session_risk",
            "session_risk_score >= 80 or (is_sanctioned and not user_whitelisted)",
            Action::Hold,
        ),
        RuleDraft::new("shell", "__import__('os').system('rm -rf /')", Action::Pass),
        RuleDraft::new("half_written", "withdrawal_amount >", Action::Hold),
    ];

    for draft in submissions {
        let name = draft.name.clone();
        match store.create(draft) {
            Ok(id) => println!("stored {name} as {id}"),
            Err(err) => println!("rejected {name}: {err}"),
        }
    }
    println!();

    let ruleset = store.ruleset()?;
    println!("{ruleset}");
    println!("Evaluation order: {:?}", ruleset.evaluation_order());
    println!();

    let withdrawal = FeatureRecord::new()
        .set("is_sanctioned", false)
        .set("user_whitelisted", false)
        .set("withdrawal_amount", 7200_i64)
        .set("is_new_device", true)
        .set("session_risk_score", 35_i64);

    match ruleset.evaluate(&withdrawal)? {
        Some(verdict) => println!("Verdict: {verdict}"),
        None => println!("Verdict: no rule matched"),
    }

    let report = ruleset.evaluate_detailed(&withdrawal);
    println!("{report}");
    println!("Matched: {:?}", report.matched());
    println!("Duration: {:?}", report.duration());

    // A record missing a feature fails closed instead of passing.
    let incomplete = FeatureRecord::new().set("withdrawal_amount", 7200_i64);
    if let Err(err) = ruleset.evaluate(&incomplete) {
        println!("Incomplete record: {err}");
    }

    Ok(())
}
