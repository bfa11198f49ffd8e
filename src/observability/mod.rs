//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (spans, batched and exported)
//!
//! Consumers:
//!     → Log output (stdout: pretty, compact or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Span exporter (log exporter by default)
//! ```
//!
//! # Design Decisions
//! - Structured logging for machine parsing
//! - Request ID flows through every request span
//! - Span export is optional and sampled

pub mod logging;
pub mod metrics;
pub mod tracing;
