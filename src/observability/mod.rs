//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All gates produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every span (see `http::request`)
//! - Metrics are cheap (atomic increments); recording without an installed
//!   recorder is a no-op, so unit tests need no setup

pub mod logging;
pub mod metrics;
