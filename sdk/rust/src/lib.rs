//! HTTP client for the query service API.

pub mod client;

pub use client::{ClientError, DisabledCheck, HealthStatus, QueryServiceClient};
