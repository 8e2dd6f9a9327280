use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use criterion::{Criterion, criterion_group, criterion_main};
use riskrule::{Action, FeatureRecord, RuleSet, RuleSetBuilder};

fn build_shared_ruleset() -> (Arc<RuleSet>, FeatureRecord) {
    let mut builder = RuleSetBuilder::new();
    let n = 20;

    let mut features = FeatureRecord::new();
    for i in 0..n {
        let text = format!("f{i} * 2 >= 100");
        builder = builder.rule(&format!("r{i}"), move |r| {
            r.when(&text).action(Action::Hold).priority(n - i)
        });
        features.insert(&format!("f{i}"), 10_i64);
    }
    builder = builder.rule("fallback", |r| {
        r.when("account_age_days > 30").action(Action::Pass).priority(0)
    });
    features.insert("account_age_days", 400_i64);

    (Arc::new(builder.compile().unwrap()), features)
}

fn bench_throughput(c: &mut Criterion) {
    let thread_counts = [1, 2, 4, 8];

    let mut group = c.benchmark_group("throughput");
    group.measurement_time(Duration::from_secs(5));

    for &threads in &thread_counts {
        let (ruleset, features) = build_shared_ruleset();

        group.bench_function(format!("{threads}_threads"), |b| {
            b.iter_custom(|iters| {
                let per_thread = iters / threads as u64;
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let rs = Arc::clone(&ruleset);
                        let f = features.clone();
                        thread::spawn(move || {
                            let start = Instant::now();
                            for _ in 0..per_thread {
                                let _ = rs.evaluate(&f);
                            }
                            start.elapsed()
                        })
                    })
                    .collect();

                let mut max_elapsed = Duration::ZERO;
                for h in handles {
                    let elapsed = h.join().unwrap();
                    if elapsed > max_elapsed {
                        max_elapsed = elapsed;
                    }
                }
                max_elapsed
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_throughput);
criterion_main!(benches);
