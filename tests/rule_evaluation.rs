//! Rules registered through the API are gated by the disablement check.

use std::sync::{Arc, Mutex};

use query_service::config::RulesConfig;
use query_service::rules::{QueryExecutor, Rule, RuleError, RuleScheduler};
use query_service_sdk::QueryServiceClient;

mod common;

#[derive(Default)]
struct CountingExecutor {
    seen: Mutex<Vec<String>>,
}

impl QueryExecutor for CountingExecutor {
    fn execute(&self, rule: &Rule) -> Result<(), RuleError> {
        self.seen.lock().unwrap().push(rule.id.to_string());
        Ok(())
    }
}

#[tokio::test]
async fn test_fully_disabled_rules_never_reach_executor() {
    let server = common::start_server().await;
    let client = QueryServiceClient::new(&server.url());

    let rules = [
        common::rule_json("builder-off", "builder", &[("q1", true), ("q2", true)]),
        common::rule_json("builder-mixed", "builder", &[("q1", true), ("q2", false)]),
        common::rule_json("prom-off", "promql", &[("q3", true)]),
        common::rule_json("ch-on", "clickhouse_sql", &[("q4", false)]),
        common::rule_json("ch-empty", "clickhouse_sql", &[]),
    ];
    for rule in &rules {
        client.create_rule(rule).await.unwrap();
    }

    let executor = Arc::new(CountingExecutor::default());
    let scheduler = RuleScheduler::new(
        server.rules.clone(),
        executor.clone(),
        RulesConfig {
            enabled: true,
            eval_interval_secs: 60,
        },
    );

    let summary = scheduler.evaluate_once();
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.executed, 3);
    assert_eq!(summary.failed, 0);

    let mut seen = executor.seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(seen, vec!["builder-mixed", "ch-empty", "ch-on"]);

    // Re-enabling a query is picked up on the next cycle.
    client
        .create_rule(&common::rule_json("prom-off", "promql", &[("q3", false)]))
        .await
        .unwrap();
    let summary = scheduler.evaluate_once();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.executed, 4);

    server.shutdown.trigger();
}
