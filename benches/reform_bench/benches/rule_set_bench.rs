//! Rule set evaluation benchmarks
//!
//! Measures the cost of evaluating rule sets of growing size, with sync and
//! async validation functions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use reform_validate::{Rule, RuleSet};
use tokio::runtime::Runtime;

fn length_rules(count: usize) -> RuleSet<String> {
    (0..count)
        .map(|i| {
            Rule::new(move |s: &String| s.len() < i)
                .with_formatter(move |_| format!("At least {i} characters"))
        })
        .collect()
}

fn async_rules(count: usize) -> RuleSet<String> {
    (0..count)
        .map(|i| {
            Rule::from_async(move |s: &String| {
                let short = s.len() < i;
                async move { short }
            })
        })
        .collect()
}

/// Benchmark sync rules, all passing and all failing
fn bench_sync_rules(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("rule_set_sync");

    for count in [1usize, 8, 32] {
        let rules = length_rules(count);
        let long = "x".repeat(64);
        let empty = String::new();

        group.bench_with_input(BenchmarkId::new("passing", count), &rules, |b, rules| {
            b.iter(|| rt.block_on(rules.validate(black_box(&long))))
        });
        group.bench_with_input(BenchmarkId::new("failing", count), &rules, |b, rules| {
            b.iter(|| rt.block_on(rules.validate(black_box(&empty))))
        });
    }

    group.finish();
}

/// Benchmark async rules resolved immediately
fn bench_async_rules(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("rule_set_async");

    for count in [1usize, 8, 32] {
        let rules = async_rules(count);
        let input = "abcd".to_string();
        group.bench_with_input(BenchmarkId::from_parameter(count), &rules, |b, rules| {
            b.iter(|| rt.block_on(rules.validate(black_box(&input))))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sync_rules, bench_async_rules);
criterion_main!(benches);
