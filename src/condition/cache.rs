//! Rule parsing cache - Optimized with faster hashing

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::trace;

use crate::condition::ast::AstNode;
use crate::condition::parser;
use crate::error::Result;

/// Parsed ASTs keyed by rule string
///
/// Owned by the caller; there is no process-wide instance. Once `capacity`
/// entries are stored, new rules are parsed but no longer cached.
#[derive(Debug)]
pub struct RuleCache {
    entries: RwLock<AHashMap<String, Arc<AstNode>>>,
    capacity: usize,
    strict: bool,
}

impl RuleCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_mode(capacity, false)
    }

    /// Cache whose misses are parsed in strict or lenient tokenizer mode
    pub fn with_mode(capacity: usize, strict: bool) -> Self {
        Self {
            entries: RwLock::new(AHashMap::with_capacity(capacity.min(2048))),
            capacity,
            strict,
        }
    }

    /// Get or parse a rule string, using the cache for repeated rules
    #[inline]
    pub fn get_or_parse(&self, rule: &str) -> Result<Arc<AstNode>> {
        // Fast path: check read lock first
        {
            let entries = self.entries.read();
            if let Some(ast) = entries.get(rule) {
                trace!(rule, "rule cache hit");
                return Ok(Arc::clone(ast));
            }
        }

        // Slow path: parse and cache
        let ast = Arc::new(parser::parse_with(rule, self.strict)?);

        let mut entries = self.entries.write();
        if entries.len() < self.capacity {
            entries.insert(rule.to_string(), Arc::clone(&ast));
        } else {
            trace!(rule, capacity = self.capacity, "rule cache full, not caching");
        }

        Ok(ast)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl Default for RuleCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CACHE_CAPACITY)
    }
}
