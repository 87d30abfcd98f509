//! Rule compilation and evaluation module
//!
//! This module handles parsing rule strings like
//! `age > 30 AND (department = 'Sales' OR experience > 5)` into an AST and
//! evaluating that AST against a [`Record`](crate::record::Record).

pub mod ast;
pub mod cache;
pub mod composer;
mod evaluator;
pub mod interchange;
pub mod parser;
pub mod tokenizer;


pub use ast::*;
pub use cache::RuleCache;
pub use composer::combine;
pub use evaluator::*;
pub use parser::{parse, parse_tokens, parse_with};
pub use tokenizer::{tokenize, tokenize_with, Token};
