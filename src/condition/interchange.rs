//! JSON interchange shape of the AST
//!
//! Operators serialize as
//! `{"type": "operator", "operator": "AND", "left": {..}, "right": {..}}` and
//! operands as `{"type": "operand", "value": "age > 30"}`. This is the shape the
//! persistence layer stores, so a store/load cycle must give back an equal tree.
//!
//! The wire form nests one object per tree level. serde_json stops at 128
//! levels by default, so loading goes through `load_nested`, which lifts
//! that limit for documents within [`MAX_DEPTH`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::ast::{AstNode, Connective, MAX_DEPTH};
use crate::error::{Result, RuleError};

/// Node kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Operator,
    Operand,
}

/// Loosely-typed node as it appears on the wire
///
/// Unused fields may be absent or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Connective>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<RawNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<RawNode>>,
}

/// Load an AST from its JSON form, keeping the precise error kind on failure
pub fn from_json(json: &str) -> Result<AstNode> {
    let raw: RawNode = load_nested(json, MAX_DEPTH)?;
    AstNode::try_from(raw)
}

/// Load an AST from an already decoded JSON value
pub fn from_value(value: Value) -> Result<AstNode> {
    check_nesting(value_nesting(&value), MAX_DEPTH)?;
    let raw = RawNode::deserialize(serde_stacker::Deserializer::new(value))?;
    AstNode::try_from(raw)
}

/// Deserialize a document whose objects and arrays nest at most `max_nesting`
/// levels, without serde_json's recursion limit.
///
/// The nesting is measured up front so deeper input is rejected before any
/// recursive deserialization starts.
pub(crate) fn load_nested<T: DeserializeOwned>(json: &str, max_nesting: usize) -> Result<T> {
    check_nesting(text_nesting(json), max_nesting)?;

    let mut de = serde_json::Deserializer::from_str(json);
    de.disable_recursion_limit();
    let parsed = T::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(parsed)
}

fn check_nesting(nesting: usize, max_nesting: usize) -> Result<()> {
    if nesting > max_nesting {
        return Err(RuleError::InvalidRule(format!(
            "JSON nests {} levels deep, limit is {}",
            nesting, max_nesting
        )));
    }
    Ok(())
}

/// Deepest object/array nesting in JSON text; brackets inside strings are ignored
fn text_nesting(json: &str) -> usize {
    let (mut depth, mut deepest) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);

    for byte in json.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    deepest
}

/// Same measure as [`text_nesting`], for a decoded value
fn value_nesting(value: &Value) -> usize {
    let mut deepest = 0;
    let mut pending = vec![(value, 1)];

    while let Some((value, depth)) = pending.pop() {
        match value {
            Value::Object(map) => {
                deepest = deepest.max(depth);
                pending.extend(map.values().map(|child| (child, depth + 1)));
            }
            Value::Array(items) => {
                deepest = deepest.max(depth);
                pending.extend(items.iter().map(|child| (child, depth + 1)));
            }
            _ => {}
        }
    }

    deepest
}

pub fn to_json(ast: &AstNode) -> Result<String> {
    Ok(serde_json::to_string(ast)?)
}

pub fn to_value(ast: &AstNode) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(ast)?)
}

impl TryFrom<RawNode> for AstNode {
    type Error = RuleError;

    fn try_from(raw: RawNode) -> Result<Self> {
        build(raw, 1)
    }
}

/// Convert a wire node found `level` levels below the root
fn build(raw: RawNode, level: usize) -> Result<AstNode> {
    if level > MAX_DEPTH {
        return Err(RuleError::InvalidRule(format!(
            "rule nests deeper than {} levels",
            MAX_DEPTH
        )));
    }

    match raw.node_type {
        NodeType::Operand => {
            if raw.left.is_some() || raw.right.is_some() {
                return Err(RuleError::InvalidRule(
                    "operand node cannot have children".to_string(),
                ));
            }
            let value = raw.value.ok_or_else(|| {
                RuleError::BadConditionFormat("operand node has no value".to_string())
            })?;
            Ok(AstNode::Operand(value.parse()?))
        }
        NodeType::Operator => {
            let connective = raw.operator.ok_or_else(|| {
                RuleError::InvalidRule("operator node has no connective".to_string())
            })?;
            match (raw.left, raw.right) {
                (Some(left), Some(right)) => Ok(AstNode::binary(
                    connective,
                    build(*left, level + 1)?,
                    build(*right, level + 1)?,
                )),
                _ => Err(RuleError::InvalidRule(format!(
                    "{} node is missing a child",
                    connective
                ))),
            }
        }
    }
}

impl From<AstNode> for RawNode {
    fn from(ast: AstNode) -> Self {
        match ast {
            AstNode::Operand(cond) => RawNode {
                node_type: NodeType::Operand,
                operator: None,
                value: Some(cond.to_string()),
                left: None,
                right: None,
            },
            AstNode::Operator {
                connective,
                left,
                right,
            } => RawNode {
                node_type: NodeType::Operator,
                operator: Some(connective),
                value: None,
                left: Some(Box::new(RawNode::from(*left))),
                right: Some(Box::new(RawNode::from(*right))),
            },
        }
    }
}
