//! Alerting rule definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::CompositeQuery;
use crate::rules::api_params::is_all_queries_disabled;

/// Identifier of a rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a rule queries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleCondition {
    pub composite_query: Option<CompositeQuery>,
}

/// A monitoring/alerting rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub condition: RuleCondition,
}

impl Rule {
    /// Whether evaluation of this rule can be skipped entirely.
    pub fn is_all_queries_disabled(&self) -> bool {
        is_all_queries_disabled(self.condition.composite_query.as_ref())
    }
}

/// Request body for creating or replacing a rule.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostableRule {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub condition: RuleCondition,
}

impl From<PostableRule> for Rule {
    fn from(postable: PostableRule) -> Self {
        let id = match postable.id {
            Some(id) if !id.trim().is_empty() => RuleId::new(id),
            _ => RuleId::generate(),
        };
        Self {
            id,
            name: postable.name,
            description: postable.description,
            labels: postable.labels,
            condition: postable.condition,
        }
    }
}
