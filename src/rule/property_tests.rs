//! Property tests for the rule engine facade

use proptest::prelude::*;

use crate::record::Record;
use crate::rule::{CompiledRule, RuleEngine};

/// Generate rules over `age` and `department` from a small grammar
fn rule_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (18..=70i32).prop_map(|n| format!("age > {}", n)),
        (18..=70i32).prop_map(|n| format!("age < {}", n)),
        prop_oneof![Just("Sales"), Just("Marketing"), Just("Engineering")]
            .prop_map(|d| format!("department = '{}'", d)),
    ];
    leaf.prop_recursive(4, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{} AND {}", l, r)),
            (inner.clone(), inner.clone()).prop_map(|(l, r)| format!("{} OR {}", l, r)),
            inner.prop_map(|r| format!("({})", r)),
        ]
    })
}

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        0..=100i32,
        prop_oneof![Just("Sales"), Just("Marketing"), Just("sales")],
    )
        .prop_map(|(age, department)| Record::new().with("age", age).with("department", department))
}

proptest! {
    /// A compiled rule stored as JSON and loaded back is unchanged
    #[test]
    fn prop_compiled_rule_survives_storage(rule in rule_strategy()) {
        let engine = RuleEngine::default();
        let compiled = engine.compile("generated", &rule).unwrap();

        let stored = compiled.to_json().unwrap();
        let loaded = CompiledRule::from_json(&stored).unwrap();
        prop_assert_eq!(loaded, compiled);
    }

    /// Evaluating the stored JSON form matches evaluating the in-memory AST
    #[test]
    fn prop_evaluate_json_matches_evaluate(rule in rule_strategy(), record in record_strategy()) {
        let engine = RuleEngine::default();
        let compiled = engine.compile("generated", &rule).unwrap();

        let direct = engine.evaluate(&compiled.ast, &record).unwrap();
        let ast_json = serde_json::to_string(&compiled.ast).unwrap();
        let record_json = serde_json::to_string(&record).unwrap();
        let stored = engine.evaluate_json(&ast_json, &record_json).unwrap();

        prop_assert_eq!(direct, stored);
    }

    /// Combining a rule with itself never changes its verdict
    #[test]
    fn prop_combine_with_self_is_stable(rule in rule_strategy(), record in record_strategy()) {
        let engine = RuleEngine::default();
        let single = engine.check(&rule, &record).unwrap();
        let doubled = engine.combine(&[rule.as_str(), rule.as_str()]).unwrap();
        prop_assert_eq!(engine.evaluate(&doubled, &record).unwrap().result, single);
    }
}
