//! Query service library: composite query model, the rule pre-check that
//! decides whether a rule's queries are all disabled, and the HTTP service
//! around it.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod observability;
pub mod rules;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use model::{CompositeQuery, QueryType};
pub use rules::{is_all_queries_disabled, RuleManager};
