use criterion::{Criterion, black_box, criterion_group, criterion_main};
use riskrule::{Action, FeatureRecord, RuleSet, RuleSetBuilder, Validator, evaluate, validate};

const RULE_TEXT: &str =
    "session_risk_score >= 80 or (is_sanctioned and not user_whitelisted) or withdrawal_amount * 2 > 10000";

fn features() -> FeatureRecord {
    FeatureRecord::new()
        .set("session_risk_score", 40_i64)
        .set("is_sanctioned", true)
        .set("user_whitelisted", true)
        .set("withdrawal_amount", 4000_i64)
}

/// Build a rule set with `n` threshold rules over distinct features. Only the
/// lowest-priority rule matches, so evaluation walks every rule.
fn build_ruleset(n: usize) -> (RuleSet, FeatureRecord) {
    let mut builder = RuleSetBuilder::new();
    let mut record = FeatureRecord::new();

    for i in 0..n {
        let text = format!("f{i} > 100 and f{i} < 1000");
        let priority = i32::try_from(n - i).unwrap();
        builder = builder.rule(&format!("r{i}"), move |r| {
            r.when(&text).action(Action::Hold).priority(priority)
        });
        record.insert(&format!("f{i}"), 10_i64);
    }
    record.insert(&format!("f{}", n - 1), 500_i64);

    (builder.compile().unwrap(), record)
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");

    group.bench_function("typical_rule", |b| {
        b.iter(|| validate(black_box(RULE_TEXT)));
    });

    group.bench_function("rejected_call", |b| {
        b.iter(|| validate(black_box("__import__('os').system('rm -rf /')")));
    });

    let long = vec!["withdrawal_amount > 5000"; 100].join(" and ");
    let validator = Validator::new();
    group.bench_function("100_clauses", |b| {
        b.iter(|| validator.validate(black_box(&long)));
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_eval");

    let expr = validate(RULE_TEXT).unwrap();
    let record = features();
    group.bench_function("validated_tree", |b| {
        b.iter(|| evaluate(black_box(&expr), black_box(&record)));
    });
    group.bench_function("revalidate_each_time", |b| {
        b.iter(|| riskrule::check(black_box(RULE_TEXT), black_box(&record)));
    });

    for &n in &[5, 20, 50] {
        let (ruleset, record) = build_ruleset(n);
        group.bench_function(format!("{n}_rules"), |b| {
            b.iter(|| ruleset.evaluate(black_box(&record)));
        });
        group.bench_function(format!("{n}_rules_detailed"), |b| {
            b.iter(|| ruleset.evaluate_detailed(black_box(&record)));
        });
    }

    group.finish();
}

fn bench_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("compilation");

    for &n in &[5, 20, 50] {
        group.bench_function(format!("{n}_rules"), |b| {
            b.iter(|| black_box(build_ruleset(n)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validate, bench_evaluate, bench_compilation);
criterion_main!(benches);
