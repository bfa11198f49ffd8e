//! Route handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::model::{CompositeQuery, QueryType};
use crate::rules::{is_all_queries_disabled, PostableRule, Rule, RuleId};

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the query service!" }))
}

/// Demo handler with a custom span, span attribute and span event.
pub async fn books() -> Json<Value> {
    let span = tracing::info_span!("BooksHandler", controller = "books");
    span.in_scope(|| {
        tracing::info!(pid = 4328, sampleAttribute = "Test", "This is a sample event");
    });

    Json(json!({ "message": "List of books" }))
}

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisabledCheck {
    pub all_disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_type: Option<QueryType>,
    /// Names of the sub-queries that were inspected.
    pub queries: Vec<String>,
}

/// Run the disablement check on a posted composite query (`null` allowed).
pub async fn check_disabled(
    payload: Result<Json<Option<CompositeQuery>>, JsonRejection>,
) -> Result<Json<DisabledCheck>, ApiError> {
    let Json(query) = payload?;

    let queries = query
        .as_ref()
        .and_then(CompositeQuery::sub_queries)
        .map(|selected| selected.names().into_iter().map(str::to_string).collect())
        .unwrap_or_default();

    Ok(Json(DisabledCheck {
        all_disabled: is_all_queries_disabled(query.as_ref()),
        query_type: query.as_ref().map(|q| q.query_type),
        queries,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleView {
    #[serde(flatten)]
    pub rule: Rule,
    pub all_queries_disabled: bool,
}

impl From<Rule> for RuleView {
    fn from(rule: Rule) -> Self {
        let all_queries_disabled = rule.is_all_queries_disabled();
        Self {
            rule,
            all_queries_disabled,
        }
    }
}

pub async fn list_rules(State(state): State<AppState>) -> Json<Vec<RuleView>> {
    Json(state.rules.list().into_iter().map(RuleView::from).collect())
}

pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RuleView>, ApiError> {
    let id = RuleId::new(id);
    state
        .rules
        .get(&id)
        .map(|rule| Json(RuleView::from(rule)))
        .ok_or_else(|| ApiError::NotFound(format!("rule not found: {id}")))
}

pub async fn upsert_rule(
    State(state): State<AppState>,
    payload: Result<Json<PostableRule>, JsonRejection>,
) -> Result<(StatusCode, Json<RuleView>), ApiError> {
    let Json(postable) = payload?;
    let rule = Rule::from(postable);

    let created = state.rules.upsert(rule.clone())?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(RuleView::from(rule))))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.rules.remove(&RuleId::new(id))?;
    Ok(StatusCode::NO_CONTENT)
}
