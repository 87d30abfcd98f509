//! Rule engine facade

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::condition::{self, interchange, AstNode, RuleCache, MAX_DEPTH};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::record::Record;

/// Named rule with its compiled AST
///
/// This is the unit the persistence layer stores (adding its own id and
/// creation time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledRule {
    pub name: String,
    pub ast: AstNode,
}

impl CompiledRule {
    /// Load a stored rule. Unlike `serde_json::from_str`, this accepts ASTs
    /// nested past serde_json's default recursion limit.
    pub fn from_json(json: &str) -> Result<Self> {
        // one extra level for the wrapping object
        interchange::load_nested(json, MAX_DEPTH + 1)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Evaluation outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub result: bool,
}

/// Compiles, combines and evaluates rules according to an [`EngineConfig`]
#[derive(Debug)]
pub struct RuleEngine {
    config: EngineConfig,
    cache: RuleCache,
}

impl RuleEngine {
    pub fn new(config: EngineConfig) -> Self {
        let cache = RuleCache::with_mode(config.cache_capacity, config.strict_tokens);
        Self { config, cache }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &RuleCache {
        &self.cache
    }

    /// Parse a rule string, reusing the cached AST for repeated rules
    pub fn parse(&self, rule_string: &str) -> Result<Arc<AstNode>> {
        self.cache.get_or_parse(rule_string)
    }

    /// Compile a named rule string
    #[instrument(skip(self, rule_string))]
    pub fn compile(&self, name: &str, rule_string: &str) -> Result<CompiledRule> {
        let ast = self.parse(rule_string).inspect_err(|err| {
            warn!(error = %err, "failed to compile rule");
        })?;

        debug!(fields = ?ast.fields(), "compiled rule");
        Ok(CompiledRule {
            name: name.to_string(),
            ast: AstNode::clone(&ast),
        })
    }

    /// Evaluate a previously compiled AST against a record
    pub fn evaluate(&self, ast: &AstNode, record: &Record) -> Result<EvaluationResult> {
        let result = condition::evaluate_with(ast, record, self.config.strategy)?;
        Ok(EvaluationResult { result })
    }

    /// Evaluate an AST in its stored JSON form against a JSON record
    pub fn evaluate_json(&self, ast_json: &str, record_json: &str) -> Result<EvaluationResult> {
        let ast = interchange::from_json(ast_json)?;
        let record = Record::from_json(record_json)?;
        self.evaluate(&ast, &record)
    }

    /// Parse (through the cache) and evaluate a rule string in one step
    pub fn check(&self, rule_string: &str, record: &Record) -> Result<bool> {
        let ast = self.parse(rule_string)?;
        Ok(self.evaluate(&ast, record)?.result)
    }

    /// Parse each rule string independently and combine them with AND
    #[instrument(skip_all, fields(count = rules.len()))]
    pub fn combine<S: AsRef<str>>(&self, rules: &[S]) -> Result<AstNode> {
        let mut asts = Vec::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            let ast = self.parse(rule.as_ref()).inspect_err(|err| {
                warn!(index, error = %err, "failed to parse rule for combination");
            })?;
            asts.push(AstNode::clone(&ast));
        }
        condition::combine(asts)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
