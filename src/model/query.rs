//! Composite query definitions (v3 query model).
//!
//! A rule's data source is a [`CompositeQuery`]: a bundle of named sub-queries
//! written in one query language. The language is selected by
//! [`QueryType`]; the collections for the other languages are carried on the
//! wire but never consulted.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Query language of a composite query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QueryType {
    /// Query builder (metrics/logs/traces builder queries).
    #[serde(rename = "builder")]
    Builder,
    /// Raw PromQL.
    #[serde(rename = "promql")]
    PromQL,
    /// Raw ClickHouse SQL.
    #[serde(rename = "clickhouse_sql")]
    ClickHouseSql,
    /// Unset or unrecognized type.
    #[default]
    #[serde(rename = "", other)]
    Unknown,
}

impl QueryType {
    /// Wire name. `Unknown` is the empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Builder => "builder",
            QueryType::PromQL => "promql",
            QueryType::ClickHouseSql => "clickhouse_sql",
            QueryType::Unknown => "",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `null` is an unset type.
fn nullable_query_type<'de, D>(deserializer: D) -> Result<QueryType, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<QueryType>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Anything that can be administratively switched off.
pub trait SubQuery {
    /// Whether this sub-query is turned off and must not be executed.
    fn is_disabled(&self) -> bool;
}

/// A query-builder sub-query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderQuery {
    pub query_name: String,
    pub data_source: String,
    pub expression: String,
    pub legend: String,
    pub disabled: bool,
}

/// A PromQL sub-query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromQuery {
    pub query: String,
    pub legend: String,
    pub disabled: bool,
}

/// A ClickHouse SQL sub-query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClickHouseQuery {
    pub query: String,
    pub legend: String,
    pub disabled: bool,
}

impl SubQuery for BuilderQuery {
    fn is_disabled(&self) -> bool {
        self.disabled
    }
}

impl SubQuery for PromQuery {
    fn is_disabled(&self) -> bool {
        self.disabled
    }
}

impl SubQuery for ClickHouseQuery {
    fn is_disabled(&self) -> bool {
        self.disabled
    }
}

/// Data source definition of a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompositeQuery {
    #[serde(deserialize_with = "nullable_query_type")]
    pub query_type: QueryType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder_queries: Option<HashMap<String, BuilderQuery>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prom_queries: Option<HashMap<String, PromQuery>>,

    #[serde(rename = "chQueries", skip_serializing_if = "Option::is_none")]
    pub clickhouse_queries: Option<HashMap<String, ClickHouseQuery>>,

    /// Panel the query was authored for. Carried, never inspected here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_type: Option<String>,
}

impl CompositeQuery {
    /// Empty composite query of the given type.
    pub fn new(query_type: QueryType) -> Self {
        Self {
            query_type,
            ..Self::default()
        }
    }

    /// The sub-query collection selected by `query_type`.
    ///
    /// Returns `None` for [`QueryType::Unknown`] or when the selected
    /// collection is absent. Collections of the other types are never returned.
    pub fn sub_queries(&self) -> Option<SubQueries<'_>> {
        match self.query_type {
            QueryType::Builder => self.builder_queries.as_ref().map(SubQueries::Builder),
            QueryType::PromQL => self.prom_queries.as_ref().map(SubQueries::PromQL),
            QueryType::ClickHouseSql => {
                self.clickhouse_queries.as_ref().map(SubQueries::ClickHouseSql)
            }
            QueryType::Unknown => None,
        }
    }

    /// Whether every selected sub-query is disabled. See
    /// [`crate::rules::is_all_queries_disabled`].
    pub fn is_all_disabled(&self) -> bool {
        self.sub_queries().is_some_and(|queries| queries.all_disabled())
    }
}

/// Borrowed view of the authoritative sub-query collection.
#[derive(Debug, Clone, Copy)]
pub enum SubQueries<'a> {
    Builder(&'a HashMap<String, BuilderQuery>),
    PromQL(&'a HashMap<String, PromQuery>),
    ClickHouseSql(&'a HashMap<String, ClickHouseQuery>),
}

impl<'a> SubQueries<'a> {
    pub fn len(&self) -> usize {
        match self {
            SubQueries::Builder(queries) => queries.len(),
            SubQueries::PromQL(queries) => queries.len(),
            SubQueries::ClickHouseSql(queries) => queries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sub-query names, sorted.
    pub fn names(&self) -> Vec<&'a str> {
        let mut names: Vec<&'a str> = match *self {
            SubQueries::Builder(queries) => queries.keys().map(String::as_str).collect(),
            SubQueries::PromQL(queries) => queries.keys().map(String::as_str).collect(),
            SubQueries::ClickHouseSql(queries) => queries.keys().map(String::as_str).collect(),
        };
        names.sort_unstable();
        names
    }

    /// `true` iff the collection is non-empty and every entry is disabled.
    ///
    /// An empty collection has nothing to disable and yields `false`.
    pub fn all_disabled(&self) -> bool {
        match self {
            SubQueries::Builder(queries) => all_disabled(queries.values()),
            SubQueries::PromQL(queries) => all_disabled(queries.values()),
            SubQueries::ClickHouseSql(queries) => all_disabled(queries.values()),
        }
    }
}

fn all_disabled<'q, Q, I>(queries: I) -> bool
where
    Q: SubQuery + 'q,
    I: IntoIterator<Item = &'q Q>,
{
    let mut seen = false;
    for query in queries {
        if !query.is_disabled() {
            return false;
        }
        seen = true;
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_type_wire_names() {
        let parsed: QueryType = serde_json::from_str("\"clickhouse_sql\"").unwrap();
        assert_eq!(parsed, QueryType::ClickHouseSql);
        let parsed: QueryType = serde_json::from_str("\"promql\"").unwrap();
        assert_eq!(parsed, QueryType::PromQL);
        assert_eq!(serde_json::to_string(&QueryType::Builder).unwrap(), "\"builder\"");
    }

    #[test]
    fn unrecognized_query_type_is_unknown() {
        let parsed: QueryType = serde_json::from_str("\"graphql\"").unwrap();
        assert_eq!(parsed, QueryType::Unknown);
        let parsed: QueryType = serde_json::from_str("\"\"").unwrap();
        assert_eq!(parsed, QueryType::Unknown);
    }

    #[test]
    fn composite_query_from_json() {
        let json = r#"{
            "queryType": "builder",
            "panelType": "graph",
            "builderQueries": {
                "A": { "queryName": "A", "dataSource": "metrics", "expression": "A", "disabled": true }
            },
            "chQueries": {
                "B": { "query": "SELECT 1" }
            }
        }"#;
        let query: CompositeQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.query_type, QueryType::Builder);
        let builder = query.builder_queries.as_ref().unwrap();
        assert!(builder["A"].disabled);
        assert_eq!(builder["A"].data_source, "metrics");
        assert!(!query.clickhouse_queries.as_ref().unwrap()["B"].disabled);
        assert!(query.prom_queries.is_none());
    }

    #[test]
    fn null_query_type_is_unknown() {
        let json = r#"{"queryType": null, "builderQueries": {"a": {"disabled": true}}}"#;
        let query: CompositeQuery = serde_json::from_str(json).unwrap();
        assert_eq!(query.query_type, QueryType::Unknown);
        assert!(query.builder_queries.is_some());
        assert!(!query.is_all_disabled());
    }

    #[test]
    fn unknown_displays_as_wire_name() {
        for query_type in [
            QueryType::Builder,
            QueryType::PromQL,
            QueryType::ClickHouseSql,
            QueryType::Unknown,
        ] {
            let wire = serde_json::to_string(&query_type).unwrap();
            assert_eq!(wire, format!("\"{query_type}\""));
        }
        assert_eq!(QueryType::Unknown.to_string(), "");
    }

    #[test]
    fn missing_query_type_defaults_to_unknown() {
        let query: CompositeQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.query_type, QueryType::Unknown);
        assert!(query.sub_queries().is_none());
    }

    #[test]
    fn sub_queries_follow_query_type() {
        let mut query = CompositeQuery::new(QueryType::PromQL);
        query.builder_queries = Some(HashMap::from([(
            "A".to_string(),
            BuilderQuery::default(),
        )]));
        assert!(query.sub_queries().is_none());

        query.prom_queries = Some(HashMap::from([
            ("b".to_string(), PromQuery::default()),
            ("a".to_string(), PromQuery::default()),
        ]));
        let selected = query.sub_queries().unwrap();
        assert!(matches!(selected, SubQueries::PromQL(_)));
        assert_eq!(selected.len(), 2);
        assert_eq!(selected.names(), vec!["a", "b"]);
    }

    #[test]
    fn empty_collection_is_not_all_disabled() {
        let mut query = CompositeQuery::new(QueryType::ClickHouseSql);
        query.clickhouse_queries = Some(HashMap::new());
        let selected = query.sub_queries().unwrap();
        assert!(selected.is_empty());
        assert!(!selected.all_disabled());
        assert!(!query.is_all_disabled());
    }
}
