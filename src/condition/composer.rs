//! Combine independently parsed rules into one AST

use tracing::debug;

use crate::condition::ast::{AstNode, MAX_DEPTH};
use crate::error::{Result, RuleError};

/// Fold ASTs into their conjunction, grouped right to left:
/// `A AND (B AND (C AND D))`.
///
/// A single AST is returned unchanged. An empty input yields
/// [`RuleError::EmptyRuleSet`]; a result deeper than [`MAX_DEPTH`] yields
/// [`RuleError::InvalidRule`].
pub fn combine(asts: Vec<AstNode>) -> Result<AstNode> {
    let count = asts.len();
    // rule i sits i + 1 levels below the root, except the last, which shares
    // the innermost AND with its predecessor
    let depth = asts
        .iter()
        .enumerate()
        .map(|(i, ast)| (i + 1).min(count - 1) + ast.depth())
        .max()
        .unwrap_or(0);
    if depth > MAX_DEPTH {
        return Err(RuleError::InvalidRule(format!(
            "combining {} rules nests deeper than {} levels",
            count, MAX_DEPTH
        )));
    }

    let mut reversed = asts.into_iter().rev();
    let last = reversed.next().ok_or(RuleError::EmptyRuleSet)?;
    let combined = reversed.fold(last, |acc, ast| AstNode::and(ast, acc));

    debug!(count, "combined rules");
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::evaluator::evaluate;
    use crate::condition::parser::parse;
    use crate::record::Record;

    fn leaf(text: &str) -> AstNode {
        AstNode::Operand(text.parse().unwrap())
    }

    #[test]
    fn test_combine_empty() {
        assert_eq!(combine(vec![]), Err(RuleError::EmptyRuleSet));
    }

    #[test]
    fn test_combine_single_is_unchanged() {
        let ast = parse("a > 1 OR b > 2").unwrap();
        assert_eq!(combine(vec![ast.clone()]).unwrap(), ast);
    }

    #[test]
    fn test_combine_groups_right_to_left() {
        let combined = combine(vec![
            leaf("a > 1"),
            leaf("b > 2"),
            leaf("c > 3"),
            leaf("d > 4"),
        ])
        .unwrap();
        assert_eq!(
            combined,
            AstNode::and(
                leaf("a > 1"),
                AstNode::and(leaf("b > 2"), AstNode::and(leaf("c > 3"), leaf("d > 4")))
            )
        );
    }

    #[test]
    fn test_combined_rule_is_conjunction() {
        let combined = combine(vec![
            parse("a > 1").unwrap(),
            parse("b > 2").unwrap(),
            parse("c > 3").unwrap(),
        ])
        .unwrap();

        let all = Record::new().with("a", 2).with("b", 3).with("c", 4);
        assert!(evaluate(&combined, &all).unwrap());

        let one_fails = Record::new().with("a", 2).with("b", 1).with("c", 4);
        assert!(!evaluate(&combined, &one_fails).unwrap());
    }

    #[test]
    fn test_combine_depth() {
        let deep = parse("a > 1 OR b > 2 AND c > 3").unwrap();
        let combined = combine(vec![deep.clone(), leaf("d > 4")]).unwrap();
        assert_eq!(combined.depth(), 1 + deep.depth());

        let leaves = |n: usize| (0..n).map(|i| leaf(&format!("f{} > {}", i, i))).collect();
        assert_eq!(combine(leaves(200)).unwrap().depth(), 200);
        assert_eq!(combine(leaves(MAX_DEPTH)).unwrap().depth(), MAX_DEPTH);
        assert!(matches!(
            combine(leaves(MAX_DEPTH + 1)),
            Err(RuleError::InvalidRule(_))
        ));
    }

    #[test]
    fn test_combine_keeps_inner_structure() {
        let left = parse("a > 1 OR b > 2").unwrap();
        let right = parse("c > 3").unwrap();
        let combined = combine(vec![left.clone(), right.clone()]).unwrap();
        assert_eq!(combined, AstNode::and(left, right));
        assert_eq!(combined.to_string(), "(a > 1 OR b > 2) AND c > 3");
    }
}
