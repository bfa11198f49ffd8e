//! In-memory rule registry.

use std::sync::Arc;

use dashmap::DashMap;

use crate::observability::metrics;
use crate::rules::rule::{Rule, RuleId};
use crate::rules::RuleError;

/// Thread-safe registry of rules, shared by the HTTP layer and the scheduler.
#[derive(Clone, Default)]
pub struct RuleManager {
    rules: Arc<DashMap<RuleId, Rule>>,
}

impl RuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a rule. Returns `true` if the rule was new.
    pub fn upsert(&self, rule: Rule) -> Result<bool, RuleError> {
        if rule.name.trim().is_empty() {
            return Err(RuleError::InvalidRule("rule name must not be empty".into()));
        }

        let id = rule.id.clone();
        let all_disabled = rule.is_all_queries_disabled();
        let created = self.rules.insert(id.clone(), rule).is_none();
        metrics::record_rule_count(self.rules.len());

        tracing::info!(
            rule_id = %id,
            created,
            all_queries_disabled = all_disabled,
            "Rule stored"
        );
        Ok(created)
    }

    pub fn get(&self, id: &RuleId) -> Option<Rule> {
        self.rules.get(id).map(|r| r.value().clone())
    }

    pub fn remove(&self, id: &RuleId) -> Result<Rule, RuleError> {
        let (_, rule) = self
            .rules
            .remove(id)
            .ok_or_else(|| RuleError::NotFound(id.clone()))?;
        metrics::record_rule_count(self.rules.len());
        tracing::info!(rule_id = %id, "Rule removed");
        Ok(rule)
    }

    /// All rules, ordered by id.
    pub fn list(&self) -> Vec<Rule> {
        let mut rules = self.snapshot();
        rules.sort_by(|a, b| a.id.cmp(&b.id));
        rules
    }

    /// Cloned rules for one evaluation cycle.
    pub fn snapshot(&self) -> Vec<Rule> {
        self.rules.iter().map(|r| r.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
