//! Abstract Syntax Tree for rule expressions

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};

/// Shape of a single condition: `<field> <op> <value>`, value optionally quoted.
static CONDITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<field>\w+)\s*(?P<op>[<>=!]+)\s*(?:'(?P<quoted>[^']*)'|(?P<bare>[^\s']+))\s*$")
        .unwrap()
});

static FIELD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").unwrap());

/// Deepest tree the parser, the composer and the JSON loader will build.
///
/// Rendering and serialization recurse once per level, so trees past this
/// depth are rejected with [`RuleError::InvalidRule`] rather than risking the
/// stack.
pub const MAX_DEPTH: usize = 1024;

/// AST node for rule expressions
///
/// Every tree is a strict binary tree: operators always carry two children,
/// operands are always leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "super::interchange::RawNode",
    into = "super::interchange::RawNode"
)]
pub enum AstNode {
    /// Logical connective joining two sub-expressions
    Operator {
        connective: Connective,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    /// Single condition like `age > 30`
    Operand(Condition),
}

/// Logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connective {
    And,
    Or,
}

/// Single condition expression
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub comparator: Comparator,
    pub literal: Literal,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// Greater than (>)
    Gt,
    /// Less than (<)
    Lt,
    /// Equal (=)
    Eq,
}

/// Literal value on the right-hand side of a condition
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Bare numeric operand, e.g. `30` or `-2.5`
    Number(f64),
    /// Bare word or single-quoted string, e.g. `Sales` or `'New York'`
    ///
    /// The rule syntax has no quote escape, so text containing `'` cannot be
    /// rendered back into a rule. [`Condition::try_new`] rejects it.
    Text(String),
}

/// Parse a finite number, ignoring surrounding whitespace.
pub(crate) fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

impl AstNode {
    pub fn and(left: AstNode, right: AstNode) -> Self {
        Self::binary(Connective::And, left, right)
    }

    pub fn or(left: AstNode, right: AstNode) -> Self {
        Self::binary(Connective::Or, left, right)
    }

    pub fn binary(connective: Connective, left: AstNode, right: AstNode) -> Self {
        AstNode::Operator {
            connective,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn operand(condition: Condition) -> Self {
        AstNode::Operand(condition)
    }

    /// Leaf conditions in left-to-right order
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut leaves = Vec::new();
        let mut pending = vec![self];

        while let Some(node) = pending.pop() {
            match node {
                AstNode::Operand(cond) => leaves.push(cond),
                AstNode::Operator { left, right, .. } => {
                    pending.push(right);
                    pending.push(left);
                }
            }
        }

        leaves
    }

    /// Distinct field names referenced by the tree, in first-seen order
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        for cond in self.conditions() {
            if !fields.contains(&cond.field.as_str()) {
                fields.push(&cond.field);
            }
        }
        fields
    }

    /// Number of levels in the tree; a single operand has depth 1
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];

        while let Some((node, level)) = pending.pop() {
            deepest = deepest.max(level);
            if let AstNode::Operator { left, right, .. } = node {
                pending.push((right, level + 1));
                pending.push((left, level + 1));
            }
        }

        deepest
    }
}

/// Renders the tree as a rule string that parses back to the same tree.
impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Operand(cond) => write!(f, "{}", cond),
            AstNode::Operator {
                connective,
                left,
                right,
            } => {
                write_child(f, left, *connective, false)?;
                write!(f, " {} ", connective)?;
                write_child(f, right, *connective, true)
            }
        }
    }
}

fn write_child(
    f: &mut fmt::Formatter<'_>,
    child: &AstNode,
    parent: Connective,
    is_right: bool,
) -> fmt::Result {
    let needs_parens = match child {
        AstNode::Operator { connective, .. } => {
            let (own, outer) = (connective.precedence(), parent.precedence());
            own < outer || (is_right && own == outer)
        }
        AstNode::Operand(_) => false,
    };

    if needs_parens {
        write!(f, "({})", child)
    } else {
        write!(f, "{}", child)
    }
}

impl Connective {
    /// Binding strength; higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            Connective::And => 2,
            Connective::Or => 1,
        }
    }

    pub fn apply(self, left: bool, right: bool) -> bool {
        match self {
            Connective::And => left && right,
            Connective::Or => left || right,
        }
    }

    /// The result implied by the left operand alone, if any
    pub(crate) fn short_circuit(self, left: bool) -> Option<bool> {
        match (self, left) {
            (Connective::And, false) => Some(false),
            (Connective::Or, true) => Some(true),
            _ => None,
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        })
    }
}

impl Condition {
    pub fn new(field: impl Into<String>, comparator: Comparator, literal: Literal) -> Self {
        Self {
            field: field.into(),
            comparator,
            literal,
        }
    }

    /// Build a condition that is guaranteed to render back into rule syntax.
    ///
    /// The field must be a single word, text literals may not contain `'`
    /// and numbers must be finite.
    pub fn try_new(
        field: impl Into<String>,
        comparator: Comparator,
        literal: Literal,
    ) -> Result<Self> {
        let cond = Self::new(field, comparator, literal);
        if !FIELD_RE.is_match(&cond.field) {
            return Err(RuleError::BadConditionFormat(format!(
                "field name must be a single word: {:?}",
                cond.field
            )));
        }
        match &cond.literal {
            Literal::Text(text) if text.contains('\'') => Err(RuleError::BadConditionFormat(
                format!("text literal cannot contain a single quote: {:?}", text),
            )),
            Literal::Number(n) if !n.is_finite() => Err(RuleError::BadConditionFormat(
                format!("number literal must be finite: {}", n),
            )),
            _ => Ok(cond),
        }
    }
}

impl FromStr for Condition {
    type Err = RuleError;

    fn from_str(text: &str) -> Result<Self> {
        let caps = CONDITION_RE
            .captures(text)
            .ok_or_else(|| RuleError::BadConditionFormat(text.to_string()))?;

        let comparator: Comparator = caps["op"].parse()?;
        let literal = match (caps.name("quoted"), caps.name("bare")) {
            (Some(quoted), _) => Literal::Text(quoted.as_str().to_string()),
            (None, Some(bare)) => Literal::from_bare(bare.as_str()),
            (None, None) => return Err(RuleError::BadConditionFormat(text.to_string())),
        };

        Ok(Condition::new(&caps["field"], comparator, literal))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.comparator, self.literal)
    }
}

impl Comparator {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::Eq => "=",
        }
    }
}

impl FromStr for Comparator {
    type Err = RuleError;

    fn from_str(op: &str) -> Result<Self> {
        match op {
            ">" => Ok(Comparator::Gt),
            "<" => Ok(Comparator::Lt),
            "=" => Ok(Comparator::Eq),
            other => Err(RuleError::BadComparator(other.to_string())),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Literal {
    /// Classify an unquoted operand: numeric text becomes a number.
    pub fn from_bare(value: &str) -> Self {
        match parse_number(value) {
            Some(n) => Literal::Number(n),
            None => Literal::Text(value.to_string()),
        }
    }

    /// Numeric reading of the literal, if it has one. Quoted digits count.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Literal::Number(n) => Some(*n),
            Literal::Text(s) => parse_number(s),
        }
    }

    /// String form used for non-numeric comparisons, without quotes
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Literal::Number(n) => Cow::Owned(n.to_string()),
            Literal::Text(s) => Cow::Borrowed(s),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Text(s) => write!(f, "'{}'", s),
        }
    }
}
