//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::http::request::ReadOptions;
use crate::security::rate_limit::RateLimitRule;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Per-endpoint ingestion and rate-limit policies.
    pub routes: RoutesConfig,

    /// Rate limiter housekeeping.
    pub rate_limiter: RateLimiterConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    /// Also bounds a body read that stalls.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Character budget for chat bodies.
pub const CHAT_MAX_CHARS: usize = 96_000;

/// Policies for the three API endpoints.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RoutesConfig {
    pub chat: RoutePolicy,
    pub contact: RoutePolicy,
    pub recommend: RoutePolicy,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            // Fits a 2000-char message plus 20 history turns of 4000 chars.
            chat: RoutePolicy {
                max_requests: 50,
                max_body_bytes: Some(CHAT_MAX_CHARS * 4),
                max_chars: Some(CHAT_MAX_CHARS),
                ..RoutePolicy::default()
            },
            contact: RoutePolicy {
                max_requests: 5,
                max_body_bytes: Some(16 * 1024),
                max_chars: Some(8_000),
                ..RoutePolicy::default()
            },
            recommend: RoutePolicy {
                max_requests: 40,
                max_body_bytes: Some(4 * 1024),
                max_chars: Some(2_000),
                ..RoutePolicy::default()
            },
        }
    }
}

/// Ingestion and rate-limit policy for a single endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RoutePolicy {
    /// Requests admitted per client per window.
    pub max_requests: u32,

    /// Fixed window length in seconds.
    pub window_secs: u64,

    /// Maximum body size in bytes. `None` disables the byte budget.
    pub max_body_bytes: Option<usize>,

    /// Maximum decoded body length in characters.
    pub max_chars: Option<usize>,

    /// Reject requests that carry no content-type header.
    pub require_content_type: bool,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            max_requests: 20,
            window_secs: 3600,
            max_body_bytes: Some(64 * 1024),
            max_chars: None,
            require_content_type: true,
        }
    }
}

impl RoutePolicy {
    pub fn rate_limit_rule(&self) -> RateLimitRule {
        RateLimitRule {
            max_requests: self.max_requests,
            window: Duration::from_secs(self.window_secs),
        }
    }

    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            max_bytes: self.max_body_bytes,
            max_chars: self.max_chars,
            require_content_type: self.require_content_type,
        }
    }
}

/// Rate limiter housekeeping configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    /// How often expired windows are swept from memory, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 300,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
