//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Init logging/telemetry → Start scheduler → Bind listener
//!     → (optional) startup.rs self-check
//!
//! Shutdown (shutdown.rs):
//!     Signal received (signals.rs) → Stop scheduler → Drain HTTP → Flush spans → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then listeners
//! - Span pipeline flushes last so shutdown logs are still exported

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
