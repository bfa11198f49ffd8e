//! Periodic rule evaluation.
//!
//! # Responsibilities
//! - Snapshot the registry once per cycle
//! - Skip rules whose sub-queries are all disabled
//! - Hand the remaining rules to the query executor

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::RulesConfig;
use crate::observability::metrics;
use crate::rules::manager::RuleManager;
use crate::rules::rule::Rule;
use crate::rules::RuleError;

/// Runs a rule's queries against the backing store.
pub trait QueryExecutor: Send + Sync {
    fn execute(&self, rule: &Rule) -> Result<(), RuleError>;
}

/// Executor that only records the dispatch.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingExecutor;

impl QueryExecutor for LoggingExecutor {
    fn execute(&self, rule: &Rule) -> Result<(), RuleError> {
        let query_type = rule
            .condition
            .composite_query
            .as_ref()
            .map(|q| q.query_type)
            .unwrap_or_default();
        tracing::info!(rule_id = %rule.id, rule = %rule.name, %query_type, "Dispatching rule queries");
        Ok(())
    }
}

/// Outcome counts of one evaluation cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationSummary {
    pub executed: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct RuleScheduler {
    rules: RuleManager,
    executor: Arc<dyn QueryExecutor>,
    config: RulesConfig,
}

impl RuleScheduler {
    pub fn new(rules: RuleManager, executor: Arc<dyn QueryExecutor>, config: RulesConfig) -> Self {
        Self {
            rules,
            executor,
            config,
        }
    }

    /// Evaluate every registered rule once.
    pub fn evaluate_once(&self) -> EvaluationSummary {
        let mut summary = EvaluationSummary::default();

        for rule in self.rules.snapshot() {
            if rule.is_all_queries_disabled() {
                tracing::debug!(rule_id = %rule.id, "All queries disabled, skipping rule");
                metrics::record_rule_evaluation("skipped");
                summary.skipped += 1;
                continue;
            }

            match self.executor.execute(&rule) {
                Ok(()) => {
                    metrics::record_rule_evaluation("executed");
                    summary.executed += 1;
                }
                Err(e) => {
                    tracing::warn!(rule_id = %rule.id, error = %e, "Rule evaluation failed");
                    metrics::record_rule_evaluation("failed");
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Rule evaluation disabled");
            return;
        }

        tracing::info!(interval_secs = self.config.eval_interval_secs, "Rule scheduler starting");

        let mut ticker = time::interval(Duration::from_secs(self.config.eval_interval_secs));
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = self.evaluate_once();
                    tracing::debug!(
                        executed = summary.executed,
                        skipped = summary.skipped,
                        failed = summary.failed,
                        "Evaluation cycle complete"
                    );
                }
                _ = shutdown.recv() => {
                    tracing::info!("Rule scheduler received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
