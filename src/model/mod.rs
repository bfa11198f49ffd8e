//! Query model shared by the rule engine and the HTTP API.

pub mod query;

pub use query::{
    BuilderQuery, ClickHouseQuery, CompositeQuery, PromQuery, QueryType, SubQueries, SubQuery,
};
