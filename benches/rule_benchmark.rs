//! Benchmark for rule compilation and evaluation
//!
//! Parsing happens once per rule; evaluation runs once per record, so the
//! evaluation path is the one to keep fast.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::Rng;
use rule_engine_core::condition::{combine, evaluate, evaluate_with, parse, EvalStrategy};
use rule_engine_core::{Record, RuleEngine};

const RULE: &str = "((age > 30 AND department = 'Sales') OR (age < 25 AND department = 'Marketing')) AND (salary > 50000 OR experience > 5)";

const DEPARTMENTS: [&str; 4] = ["Sales", "Marketing", "Engineering", "Support"];

/// Create random employee records
fn create_records(count: usize) -> Vec<Record> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            Record::new()
                .with("age", rng.gen_range(18..70i32))
                .with("department", DEPARTMENTS[rng.gen_range(0..DEPARTMENTS.len())])
                .with("salary", rng.gen_range(20_000..120_000i32))
                .with("experience", rng.gen_range(0..30i32).to_string())
        })
        .collect()
}

fn benchmark_parse(c: &mut Criterion) {
    c.bench_function("parse_nested_rule", |b| {
        b.iter(|| parse(black_box(RULE)).unwrap())
    });

    let engine = RuleEngine::default();
    engine.parse(RULE).unwrap();
    c.bench_function("parse_cached_rule", |b| {
        b.iter(|| engine.parse(black_box(RULE)).unwrap())
    });
}

fn benchmark_evaluate(c: &mut Criterion) {
    let ast = parse(RULE).unwrap();
    let records = create_records(1_000);

    c.bench_function("evaluate_1000_records_eager", |b| {
        b.iter(|| {
            records
                .iter()
                .filter(|record| evaluate(black_box(&ast), record).unwrap())
                .count()
        })
    });

    c.bench_function("evaluate_1000_records_short_circuit", |b| {
        b.iter(|| {
            records
                .iter()
                .filter(|record| {
                    evaluate_with(black_box(&ast), record, EvalStrategy::ShortCircuit).unwrap()
                })
                .count()
        })
    });
}

fn benchmark_combine(c: &mut Criterion) {
    let rules: Vec<String> = (0..50).map(|i| format!("f{} > {}", i, i)).collect();
    let asts: Vec<_> = rules.iter().map(|r| parse(r).unwrap()).collect();

    c.bench_function("combine_50_rules", |b| {
        b.iter(|| combine(black_box(asts.clone())).unwrap())
    });
}

criterion_group!(benches, benchmark_parse, benchmark_evaluate, benchmark_combine);
criterion_main!(benches);
