//! Pre-checks applied to rule parameters before evaluation.

use crate::model::CompositeQuery;

/// Whether every sub-query of `query` has been disabled.
///
/// Only the collection selected by `query_type` is consulted. Returns `false`
/// when the composite query is absent, the type is unknown, or the selected
/// collection is absent or empty: a rule with nothing to disable is never
/// suppressed.
pub fn is_all_queries_disabled(query: Option<&CompositeQuery>) -> bool {
    match query.and_then(CompositeQuery::sub_queries) {
        Some(queries) => queries.all_disabled(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::model::{BuilderQuery, ClickHouseQuery, PromQuery, QueryType};

    fn builder(entries: &[(&str, bool)]) -> HashMap<String, BuilderQuery> {
        entries
            .iter()
            .map(|(name, disabled)| {
                (
                    name.to_string(),
                    BuilderQuery {
                        query_name: name.to_string(),
                        disabled: *disabled,
                        ..BuilderQuery::default()
                    },
                )
            })
            .collect()
    }

    fn prom(entries: &[(&str, bool)]) -> HashMap<String, PromQuery> {
        entries
            .iter()
            .map(|(name, disabled)| {
                (
                    name.to_string(),
                    PromQuery {
                        disabled: *disabled,
                        ..PromQuery::default()
                    },
                )
            })
            .collect()
    }

    fn clickhouse(entries: &[(&str, bool)]) -> HashMap<String, ClickHouseQuery> {
        entries
            .iter()
            .map(|(name, disabled)| {
                (
                    name.to_string(),
                    ClickHouseQuery {
                        disabled: *disabled,
                        ..ClickHouseQuery::default()
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_is_all_queries_disabled() {
        let cases: Vec<Option<CompositeQuery>> = vec![
            Some(CompositeQuery {
                builder_queries: Some(builder(&[("query1", true), ("query2", true)])),
                ..CompositeQuery::new(QueryType::Builder)
            }),
            None,
            Some(CompositeQuery::new(QueryType::Builder)),
            Some(CompositeQuery {
                builder_queries: Some(builder(&[("query1", true), ("query2", false)])),
                ..CompositeQuery::new(QueryType::Builder)
            }),
            Some(CompositeQuery::new(QueryType::PromQL)),
            Some(CompositeQuery {
                prom_queries: Some(prom(&[("query3", false)])),
                ..CompositeQuery::new(QueryType::PromQL)
            }),
            Some(CompositeQuery {
                prom_queries: Some(prom(&[("query3", true)])),
                ..CompositeQuery::new(QueryType::PromQL)
            }),
            Some(CompositeQuery::new(QueryType::ClickHouseSql)),
            Some(CompositeQuery {
                clickhouse_queries: Some(clickhouse(&[("query4", false)])),
                ..CompositeQuery::new(QueryType::ClickHouseSql)
            }),
            Some(CompositeQuery {
                clickhouse_queries: Some(clickhouse(&[("query4", true)])),
                ..CompositeQuery::new(QueryType::ClickHouseSql)
            }),
        ];
        let expected = [true, false, false, false, false, false, true, false, false, true];

        for (index, (query, expected)) in cases.iter().zip(expected).enumerate() {
            assert_eq!(
                is_all_queries_disabled(query.as_ref()),
                expected,
                "case {index}"
            );
        }
    }

    #[test]
    fn empty_collection_is_not_vacuously_disabled() {
        let query = CompositeQuery {
            builder_queries: Some(HashMap::new()),
            ..CompositeQuery::new(QueryType::Builder)
        };
        assert!(!is_all_queries_disabled(Some(&query)));
    }

    #[test]
    fn unknown_type_never_suppresses() {
        let query = CompositeQuery {
            builder_queries: Some(builder(&[("a", true)])),
            prom_queries: Some(prom(&[("b", true)])),
            clickhouse_queries: Some(clickhouse(&[("c", true)])),
            ..CompositeQuery::new(QueryType::Unknown)
        };
        assert!(!is_all_queries_disabled(Some(&query)));
    }

    #[test]
    fn non_selected_collections_are_ignored() {
        let query = CompositeQuery {
            prom_queries: Some(prom(&[("q", true)])),
            builder_queries: Some(builder(&[("x", false)])),
            clickhouse_queries: Some(clickhouse(&[("y", false)])),
            ..CompositeQuery::new(QueryType::PromQL)
        };
        assert!(is_all_queries_disabled(Some(&query)));

        let query = CompositeQuery {
            prom_queries: Some(prom(&[("q", false)])),
            builder_queries: Some(builder(&[("x", true)])),
            ..CompositeQuery::new(QueryType::PromQL)
        };
        assert!(!is_all_queries_disabled(Some(&query)));
    }

    #[test]
    fn single_enabled_entry_among_many() {
        let mut entries: Vec<(String, bool)> =
            (0..64).map(|i| (format!("q{i}"), true)).collect();
        entries[37].1 = false;
        let refs: Vec<(&str, bool)> = entries.iter().map(|(n, d)| (n.as_str(), *d)).collect();
        let query = CompositeQuery {
            builder_queries: Some(builder(&refs)),
            ..CompositeQuery::new(QueryType::Builder)
        };
        assert!(!is_all_queries_disabled(Some(&query)));
    }

    #[test]
    fn repeated_calls_agree() {
        let query = CompositeQuery {
            clickhouse_queries: Some(clickhouse(&[("a", true), ("b", true)])),
            ..CompositeQuery::new(QueryType::ClickHouseSql)
        };
        let first = is_all_queries_disabled(Some(&query));
        let second = is_all_queries_disabled(Some(&query));
        assert!(first);
        assert_eq!(first, second);
        assert_eq!(first, query.is_all_disabled());
    }

    #[test]
    fn toggling_between_calls_is_observed() {
        let mut query = CompositeQuery {
            prom_queries: Some(prom(&[("a", true)])),
            ..CompositeQuery::new(QueryType::PromQL)
        };
        assert!(is_all_queries_disabled(Some(&query)));

        if let Some(queries) = query.prom_queries.as_mut() {
            queries.get_mut("a").unwrap().disabled = false;
        }
        assert!(!is_all_queries_disabled(Some(&query)));
    }

    #[test]
    fn concurrent_readers_agree() {
        let query = std::sync::Arc::new(CompositeQuery {
            builder_queries: Some(builder(&[("a", true), ("b", true), ("c", true)])),
            ..CompositeQuery::new(QueryType::Builder)
        });

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let query = query.clone();
                std::thread::spawn(move || is_all_queries_disabled(Some(query.as_ref())))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
