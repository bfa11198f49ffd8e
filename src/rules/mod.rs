//! Rule engine subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP API (create / replace / delete)
//!     → manager.rs (in-memory registry, DashMap)
//!
//! Every eval interval:
//!     scheduler.rs takes a snapshot of the registry
//!     → api_params.rs: all sub-queries disabled?
//!         yes → skip the rule (no query execution)
//!         no  → QueryExecutor::execute
//! ```
//!
//! # Design Decisions
//! - The disablement check is a pure function; it holds no state between calls
//! - Each cycle evaluates a cloned snapshot, so API writes never race a cycle
//! - Query execution sits behind a trait; this crate ships a logging executor only

pub mod api_params;
pub mod manager;
pub mod rule;
pub mod scheduler;

use thiserror::Error;

pub use api_params::is_all_queries_disabled;
pub use manager::RuleManager;
pub use rule::{PostableRule, Rule, RuleCondition, RuleId};
pub use scheduler::{EvaluationSummary, LoggingExecutor, QueryExecutor, RuleScheduler};

/// Errors raised by the rule engine.
#[derive(Debug, Error)]
pub enum RuleError {
    /// No rule with this id is registered.
    #[error("rule not found: {0}")]
    NotFound(RuleId),

    /// The rule definition was rejected.
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    /// The executor failed to run the rule's queries.
    #[error("execution of rule {rule} failed: {reason}")]
    Execution { rule: RuleId, reason: String },
}
