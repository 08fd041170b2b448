//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client_ip.rs (resolve client identity from proxy headers)
//!     → rate_limit.rs (per route + client fixed-window budget)
//!     → limits.rs (content-length, content-type, declared size)
//!     → http::request (bounded body read and JSON validation)
//!
//! Outgoing response:
//!     → headers.rs (fixed security headers)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod client_ip;
pub mod headers;
pub mod limits;
pub mod rate_limit;

pub use client_ip::{resolve_client_ip, ANONYMOUS};
pub use rate_limit::{RateLimitDecision, RateLimitKey, RateLimitRule, RateLimiter};
