//! Rule Engine Core - compile eligibility rules once, evaluate them many times
//!
//! Rules are boolean expressions over named attributes, e.g.
//! `age > 30 AND (department = 'Sales' OR experience > 5)`. This crate
//! tokenizes and parses them into an AST, combines ASTs, and evaluates them
//! against records. Python bindings are available behind the `python` feature.
//!
//! ```
//! use rule_engine_core::condition::{evaluate, parse};
//! use rule_engine_core::record::Record;
//!
//! let ast = parse("age > 30 AND department = 'Sales'").unwrap();
//! let record = Record::new().with("age", "35").with("department", "Sales");
//! assert!(evaluate(&ast, &record).unwrap());
//! ```

pub mod condition;
pub mod config;
pub mod error;
pub mod record;
pub mod rule;

#[cfg(feature = "python")]
mod python;

pub use condition::{AstNode, Comparator, Condition, Connective, EvalStrategy, Literal};
pub use config::EngineConfig;
pub use error::{Result, RuleError};
pub use record::{FieldValue, Record};
pub use rule::{CompiledRule, EvaluationResult, RuleEngine};
