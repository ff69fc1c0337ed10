//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Client operations produce:
//!     → tracing events (structured logs, installed by logging.rs)
//!     → metrics.rs (request counters, latency histogram, cache stats)
//!
//! Consumers:
//!     → stderr (pretty or JSON)
//!     → whatever `metrics` recorder the host application installs
//! ```

pub mod logging;
pub mod metrics;
