//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Ingestion pipeline and handlers produce:
//!     → logging.rs (structured log events, request_id on every line)
//!     → metrics.rs (counters and latency histograms per route)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Rejection details are logged, never returned to clients
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
