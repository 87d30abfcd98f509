//! Engine configuration
//!
//! Loaded from JSON, or from a Python dict when built with the `python` feature.
//! Every field is optional and falls back to its default.

use serde::{Deserialize, Serialize};

use crate::condition::EvalStrategy;
use crate::error::{Result, RuleError};

pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Keys accepted in a config mapping
pub const CONFIG_KEYS: [&str; 3] = ["strict_tokens", "strategy", "cache_capacity"];

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Reject text the tokenizer does not recognize instead of skipping it
    pub strict_tokens: bool,
    /// Evaluation strategy for connectives
    pub strategy: EvalStrategy,
    /// Maximum number of parsed rule strings kept; 0 disables the cache
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_tokens: false,
            strategy: EvalStrategy::Eager,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Reject any key outside [`CONFIG_KEYS`]
pub fn check_config_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<()> {
    for key in keys {
        if !CONFIG_KEYS.contains(&key) {
            return Err(RuleError::DeserializationError(format!(
                "unknown config key `{}`, expected one of {}",
                key,
                CONFIG_KEYS.join(", ")
            )));
        }
    }
    Ok(())
}

/// Deserialize engine config from a Python dict
/// Expected format: {"strict_tokens": bool, "strategy": "eager" | "short_circuit", "cache_capacity": int}
#[cfg(feature = "python")]
pub fn deserialize_engine_config(
    config: &pyo3::Bound<'_, pyo3::types::PyDict>,
) -> pyo3::PyResult<EngineConfig> {
    use pyo3::types::{PyAnyMethods, PyDictMethods, PyListMethods};

    let keys: Vec<String> = config
        .keys()
        .iter()
        .map(|key| key.extract())
        .collect::<pyo3::PyResult<_>>()?;
    check_config_keys(keys.iter().map(String::as_str))?;

    let mut parsed = EngineConfig::default();

    if let Some(strict) = config.get_item("strict_tokens")? {
        parsed.strict_tokens = strict.extract()?;
    }
    if let Some(strategy) = config.get_item("strategy")? {
        let strategy: String = strategy.extract()?;
        parsed.strategy = strategy.parse()?;
    }
    if let Some(capacity) = config.get_item("cache_capacity")? {
        parsed.cache_capacity = capacity.extract()?;
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleError;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(!config.strict_tokens);
        assert_eq!(config.strategy, EvalStrategy::Eager);
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn test_partial_override() {
        let config =
            EngineConfig::from_json(r#"{"strategy": "short_circuit", "cache_capacity": 0}"#)
                .unwrap();
        assert!(!config.strict_tokens);
        assert_eq!(config.strategy, EvalStrategy::ShortCircuit);
        assert_eq!(config.cache_capacity, 0);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"strict": true}"#),
            Err(RuleError::DeserializationError(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"strategy": "lazy"}"#),
            Err(RuleError::DeserializationError(_))
        ));
    }

    #[test]
    fn test_check_config_keys() {
        assert!(check_config_keys(CONFIG_KEYS).is_ok());
        assert!(check_config_keys(["strategy"]).is_ok());
        assert!(check_config_keys([]).is_ok());

        let err = check_config_keys(["strategy", "strict"]).unwrap_err();
        assert!(matches!(err, RuleError::DeserializationError(ref msg) if msg.contains("`strict`")));
    }
}
