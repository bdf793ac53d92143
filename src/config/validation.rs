//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//! - Check that route prefixes are absolute paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GateConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },
    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },
    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },
    #[error("{field}: path '{value}' must start with '/'")]
    RelativePath { field: &'static str, value: String },
    #[error("{field}: must not be empty")]
    Empty { field: &'static str },
}

pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.upstream.address.is_empty() {
        errors.push(ValidationError::Empty { field: "upstream.address" });
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if url::Url::parse(&config.auth.base_url).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field: "auth.base_url",
            value: config.auth.base_url.clone(),
        });
    }
    check_path(&mut errors, "auth.session_path", &config.auth.session_path);
    if config.auth.required_role.is_empty() {
        errors.push(ValidationError::Empty { field: "auth.required_role" });
    }

    let paths = &config.paths;
    check_path(&mut errors, "paths.admin_prefix", &paths.admin_prefix);
    check_path(&mut errors, "paths.api_prefix", &paths.api_prefix);
    check_path(&mut errors, "paths.auth_prefix", &paths.auth_prefix);
    check_path(&mut errors, "paths.login_path", &paths.login_path);
    for prefix in &paths.public {
        check_path(&mut errors, "paths.public", prefix);
    }
    for prefix in &paths.excluded {
        check_path(&mut errors, "paths.excluded", prefix);
    }
    if paths.suspicious.iter().any(String::is_empty) {
        errors.push(ValidationError::Empty { field: "paths.suspicious" });
    }

    let limits = &config.rate_limit;
    if limits.max_requests == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.max_requests" });
    }
    if limits.window_secs == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.window_secs" });
    }
    if limits.max_identifiers == 0 {
        errors.push(ValidationError::Zero { field: "rate_limit.max_identifiers" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::RelativePath {
            field,
            value: value.to_string(),
        });
    }
}
