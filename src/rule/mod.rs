//! Rule engine module
//!
//! The contract points the request-handling layer calls: compile a named
//! rule, evaluate a stored AST against a record, and combine rule strings.

mod engine;

#[cfg(test)]
mod property_tests;

pub use engine::*;
