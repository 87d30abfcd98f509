//! Rule string parser
//!
//! Two-stack (shunting-yard) parser turning a token sequence into an
//! [`AstNode`]. `AND` binds tighter than `OR`; both are left-associative.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::condition::ast::{AstNode, Connective, MAX_DEPTH};
use crate::condition::tokenizer::{tokenize_with, Token};
use crate::error::{Result, RuleError};

/// Entry on the operator stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackOp {
    Open,
    Connective(Connective),
}

/// Finished sub-expressions, each with its depth
type OutputStack = SmallVec<[(AstNode, usize); 8]>;

/// Parse a rule string into an AST
pub fn parse(rule: &str) -> Result<AstNode> {
    parse_with(rule, false)
}

/// Parse a rule string, optionally rejecting text the tokenizer does not recognize
pub fn parse_with(rule: &str, strict: bool) -> Result<AstNode> {
    let tokens = tokenize_with(rule, strict)?;
    parse_tokens(&tokens).inspect_err(|err| debug!(rule, error = %err, "failed to parse rule"))
}

/// Build an AST from an already tokenized rule
pub fn parse_tokens(tokens: &[Token]) -> Result<AstNode> {
    if tokens.is_empty() {
        return Err(RuleError::InvalidRule(
            "no valid tokens found".to_string(),
        ));
    }

    let mut output = OutputStack::new();
    let mut operators: SmallVec<[StackOp; 8]> = SmallVec::new();

    for token in tokens {
        match token {
            Token::Condition(text) => output.push((AstNode::Operand(text.parse()?), 1)),
            Token::LParen => operators.push(StackOp::Open),
            Token::RParen => loop {
                match operators.pop() {
                    Some(StackOp::Open) => break,
                    Some(StackOp::Connective(connective)) => reduce(&mut output, connective)?,
                    None => return Err(RuleError::UnbalancedParens),
                }
            },
            Token::And | Token::Or => {
                let incoming = if *token == Token::And {
                    Connective::And
                } else {
                    Connective::Or
                };

                while let Some(&StackOp::Connective(top)) = operators.last() {
                    if top.precedence() < incoming.precedence() {
                        break;
                    }
                    operators.pop();
                    reduce(&mut output, top)?;
                }
                operators.push(StackOp::Connective(incoming));
            }
        }
    }

    while let Some(op) = operators.pop() {
        match op {
            StackOp::Open => return Err(RuleError::UnbalancedParens),
            StackOp::Connective(connective) => reduce(&mut output, connective)?,
        }
    }

    match output.len() {
        0 => Err(RuleError::EmptyExpression),
        1 => {
            let (ast, depth) = output.pop().ok_or(RuleError::EmptyExpression)?;
            trace!(depth, "parsed rule");
            Ok(ast)
        }
        n => Err(RuleError::InvalidRule(format!(
            "could not fully parse, {} expressions left without a connective",
            n
        ))),
    }
}

/// Pop two operands and combine them under `connective`
fn reduce(output: &mut OutputStack, connective: Connective) -> Result<()> {
    let (Some((right, right_depth)), Some((left, left_depth))) = (output.pop(), output.pop())
    else {
        return Err(RuleError::InvalidRule(format!(
            "{} is missing an operand",
            connective
        )));
    };

    let depth = 1 + left_depth.max(right_depth);
    if depth > MAX_DEPTH {
        return Err(RuleError::InvalidRule(format!(
            "rule nests deeper than {} levels",
            MAX_DEPTH
        )));
    }
    output.push((AstNode::binary(connective, left, right), depth));
    Ok(())
}
