//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use query_service::config::ServiceConfig;
use query_service::http::HttpServer;
use query_service::lifecycle::Shutdown;
use query_service::rules::RuleManager;
use tokio::net::TcpListener;

/// A server bound to an ephemeral local port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub rules: RuleManager,
    pub shutdown: Shutdown,
    pub handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start the HTTP server with the scheduler left to the caller.
pub async fn start_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = ServiceConfig::default();
    config.listener.bind_address = addr.to_string();
    config.rules.enabled = false;

    let rules = RuleManager::new();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, rules.clone());
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    // Let the accept loop start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        rules,
        shutdown,
        handle,
    }
}

/// Rule body over the given query type and `(name, disabled)` sub-queries.
#[allow(dead_code)]
pub fn rule_json(id: &str, query_type: &str, queries: &[(&str, bool)]) -> serde_json::Value {
    let collection = match query_type {
        "builder" => "builderQueries",
        "promql" => "promQueries",
        _ => "chQueries",
    };
    let entries: serde_json::Map<String, serde_json::Value> = queries
        .iter()
        .map(|(name, disabled)| (name.to_string(), serde_json::json!({ "disabled": disabled })))
        .collect();

    serde_json::json!({
        "id": id,
        "name": format!("rule {id}"),
        "condition": {
            "compositeQuery": {
                "queryType": query_type,
                collection: entries,
            }
        }
    })
}
