//! Rule evaluator

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use tracing::trace;

use crate::condition::ast::{AstNode, Comparator, Condition, Connective};
use crate::error::{Result, RuleError};
use crate::record::Record;

/// How connectives treat their right-hand side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalStrategy {
    /// Always evaluate both sides, left first. Errors surface deterministically.
    #[default]
    Eager,
    /// Skip the right side once the left side decides the result.
    ShortCircuit,
}

impl FromStr for EvalStrategy {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "eager" => Ok(EvalStrategy::Eager),
            "short_circuit" => Ok(EvalStrategy::ShortCircuit),
            other => Err(RuleError::DeserializationError(format!(
                "unknown evaluation strategy: {}",
                other
            ))),
        }
    }
}

/// Pending work while walking the tree
enum Step<'a> {
    /// Evaluate a subtree
    Visit(&'a AstNode),
    /// Left side is done; decide whether the right side is needed
    Join(Connective, &'a AstNode),
    /// Right side is done; combine with the saved left value
    Finish(Connective, bool),
}

/// Evaluate an AST against a record
pub fn evaluate(ast: &AstNode, record: &Record) -> Result<bool> {
    evaluate_with(ast, record, EvalStrategy::Eager)
}

/// Evaluate an AST against a record using the given strategy
///
/// The walk uses an explicit stack, so tree depth is bounded by memory rather
/// than by the thread's stack.
pub fn evaluate_with(ast: &AstNode, record: &Record, strategy: EvalStrategy) -> Result<bool> {
    let mut pending: SmallVec<[Step<'_>; 16]> = smallvec![Step::Visit(ast)];
    // Result of the most recently finished subtree
    let mut value = false;

    while let Some(step) = pending.pop() {
        match step {
            Step::Visit(AstNode::Operand(cond)) => value = check_condition(cond, record)?,
            Step::Visit(AstNode::Operator {
                connective,
                left,
                right,
            }) => {
                pending.push(Step::Join(*connective, right));
                pending.push(Step::Visit(left));
            }
            Step::Join(connective, right) => {
                if strategy == EvalStrategy::ShortCircuit {
                    if let Some(decided) = connective.short_circuit(value) {
                        value = decided;
                        continue;
                    }
                }
                pending.push(Step::Finish(connective, value));
                pending.push(Step::Visit(right));
            }
            Step::Finish(connective, left) => value = connective.apply(left, value),
        }
    }

    Ok(value)
}

/// Check a single condition against a record
pub fn check_condition(cond: &Condition, record: &Record) -> Result<bool> {
    let value = record
        .get(&cond.field)
        .ok_or_else(|| RuleError::UnknownField(cond.field.clone()))?;

    let ordering = match (value.as_number(), cond.literal.as_number()) {
        (Some(actual), Some(expected)) => actual.partial_cmp(&expected),
        _ => Some(value.as_text().as_ref().cmp(cond.literal.as_text().as_ref())),
    };

    let result = match (cond.comparator, ordering) {
        (Comparator::Gt, Some(Ordering::Greater)) => true,
        (Comparator::Lt, Some(Ordering::Less)) => true,
        (Comparator::Eq, Some(Ordering::Equal)) => true,
        _ => false,
    };

    trace!(field = %cond.field, comparator = %cond.comparator, result, "checked condition");
    Ok(result)
}
