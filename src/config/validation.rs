//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, budgets > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, RoutePolicy};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    MustBePositive { field: String },
}

/// Validate a fully deserialized configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(positive("timeouts.request_secs"));
    }

    if config.rate_limiter.sweep_interval_secs == 0 {
        errors.push(positive("rate_limiter.sweep_interval_secs"));
    }

    let routes = &config.routes;
    validate_route("routes.chat", &routes.chat, &mut errors);
    validate_route("routes.contact", &routes.contact, &mut errors);
    validate_route("routes.recommend", &routes.recommend, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_route(prefix: &str, policy: &RoutePolicy, errors: &mut Vec<ValidationError>) {
    if policy.max_requests == 0 {
        errors.push(positive(format!("{prefix}.max_requests")));
    }
    if policy.window_secs == 0 {
        errors.push(positive(format!("{prefix}.window_secs")));
    }
    if policy.max_body_bytes == Some(0) {
        errors.push(positive(format!("{prefix}.max_body_bytes")));
    }
    if policy.max_chars == Some(0) {
        errors.push(positive(format!("{prefix}.max_chars")));
    }
}

fn positive(field: impl Into<String>) -> ValidationError {
    ValidationError::MustBePositive {
        field: field.into(),
    }
}
