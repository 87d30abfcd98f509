//! Python bindings via PyO3
//!
//! ASTs cross the boundary in their JSON interchange form, so Python callers
//! can store them as-is and hand them back for evaluation.

use std::sync::Arc;

use pyo3::exceptions::{PyRuntimeError, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict};

use crate::condition::interchange;
use crate::config::{deserialize_engine_config, EngineConfig};
use crate::error::RuleError;
use crate::record::{FieldValue, Record};
use crate::rule::RuleEngine;

// ============================================================================
// Helper Functions
// ============================================================================

/// Deserialize a record from a Python dict of str -> str | int | float
///
/// `bool` is rejected even though Python treats it as an int.
fn deserialize_record(dict: &Bound<'_, PyDict>) -> PyResult<Record> {
    let mut record = Record::new();
    for (key, value) in dict.iter() {
        let field: String = key.extract()?;
        let value = if value.is_instance_of::<PyBool>() {
            return Err(PyTypeError::new_err(format!(
                "Unsupported value for field {}: expected str or number, got bool",
                field
            )));
        } else if let Ok(text) = value.extract::<String>() {
            FieldValue::Text(text)
        } else if let Ok(number) = value.extract::<f64>() {
            FieldValue::Number(number)
        } else {
            return Err(PyTypeError::new_err(format!(
                "Unsupported value for field {}: expected str or number",
                field
            )));
        };
        record.insert(field, value);
    }
    Ok(record)
}

// ============================================================================
// Python Classes
// ============================================================================

/// Rule engine holding its configuration and parse cache
///
/// # Example (Python)
/// ```python
/// engine = RuleEngine({"strict_tokens": True})
/// rule = json.loads(engine.create_rule("senior", "age > 30"))
/// engine.evaluate_rule(json.dumps(rule["ast"]), {"age": 35})
/// ```
#[pyclass(name = "RuleEngine", module = "rule_engine_core")]
pub struct PyRuleEngine {
    inner: Arc<RuleEngine>,
}

#[pymethods]
impl PyRuleEngine {
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(config: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let config = match config {
            Some(dict) => deserialize_engine_config(dict)?,
            None => EngineConfig::default(),
        };
        Ok(Self {
            inner: Arc::new(RuleEngine::new(config)),
        })
    }

    /// Compile a rule string; returns `{"name": ..., "ast": ...}` as JSON
    fn create_rule(&self, name: &str, rule_string: &str) -> PyResult<String> {
        let rule = self.inner.compile(name, rule_string)?;
        Ok(serde_json::to_string(&rule).map_err(RuleError::from)?)
    }

    /// Parse each rule string and combine them with AND; returns the AST as JSON
    fn combine_rules(&self, rules: Vec<String>) -> PyResult<String> {
        let ast = self.inner.combine(rules.as_slice())?;
        Ok(interchange::to_json(&ast)?)
    }

    /// Evaluate a JSON AST against a record dict
    fn evaluate_rule(&self, ast_json: &str, record: &Bound<'_, PyDict>) -> PyResult<bool> {
        let ast = interchange::from_json(ast_json)?;
        let record = deserialize_record(record)?;
        Ok(self.inner.evaluate(&ast, &record)?.result)
    }

    /// Evaluate a JSON AST against a record dict without blocking the event loop
    ///
    /// The record is read while holding the GIL; loading and evaluation run
    /// on Tokio's blocking pool.
    fn evaluate_rule_async<'py>(
        &self,
        py: Python<'py>,
        ast_json: String,
        record: &Bound<'py, PyDict>,
    ) -> PyResult<Bound<'py, PyAny>> {
        let record = deserialize_record(record)?;
        let engine = Arc::clone(&self.inner);

        pyo3_async_runtimes::tokio::future_into_py(py, async move {
            let evaluation = tokio::task::spawn_blocking(move || {
                let ast = interchange::from_json(&ast_json)?;
                engine.evaluate(&ast, &record)
            })
            .await
            .map_err(|e| {
                PyRuntimeError::new_err(format!("Evaluation task panicked: {}", e))
            })??;

            Ok(evaluation.result)
        })
    }

    /// Number of rule strings currently cached
    fn cache_size(&self) -> usize {
        self.inner.cache().len()
    }

    fn clear_cache(&self) {
        self.inner.cache().clear();
    }

    fn __repr__(&self) -> String {
        format!(
            "RuleEngine(strict_tokens={}, cached_rules={})",
            self.inner.config().strict_tokens,
            self.inner.cache().len()
        )
    }
}

// ============================================================================
// Python Module Definition
// ============================================================================

/// Python module definition
#[pymodule]
fn rule_engine_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyRuleEngine>()?;
    Ok(())
}
