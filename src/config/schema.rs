//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the admin gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream frontend that allowed requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// External auth service used to resolve sessions.
    pub auth: AuthConfig,

    /// Path classification lists and route prefixes.
    pub paths: PathConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

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

/// Upstream frontend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Auth service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Base URL of the auth service (scheme + host, no trailing slash).
    pub base_url: String,

    /// Path of the session lookup endpoint.
    pub session_path: String,

    /// Role a session must carry to reach protected paths.
    pub required_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            session_path: "/api/auth/get-session".to_string(),
            required_role: "admin".to_string(),
        }
    }
}

/// Path lists consulted by the classifier and the gate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathConfig {
    /// Substrings that mark a path as a scanner probe.
    pub suspicious: Vec<String>,

    /// Public prefixes. `/` only matches the root itself.
    pub public: Vec<String>,

    /// Prefixes that bypass the gate entirely.
    pub excluded: Vec<String>,

    /// Prefix of the admin pages.
    pub admin_prefix: String,

    /// Prefix of the API routes.
    pub api_prefix: String,

    /// Prefix of the auth service's own routes.
    pub auth_prefix: String,

    /// Where denied visitors are redirected.
    pub login_path: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            suspicious: [
                "/.env",
                "/wp-admin",
                "/wp-login",
                "/.git",
                "/admin.php",
                "/phpmyadmin",
                "/config.php",
                "/.aws",
                "/xmlrpc.php",
                "/.htaccess",
            ]
            .map(String::from)
            .to_vec(),
            public: [
                "/",
                "/_next",
                "/favicon.ico",
                "/robots.txt",
                "/sitemap.xml",
                "/manifest.json",
                "/health",
                "/images",
                "/api/auth",
            ]
            .map(String::from)
            .to_vec(),
            excluded: [
                "/_next/static",
                "/_next/image",
                "/favicon.ico",
                "/robots.txt",
                "/sitemap.xml",
                "/images/",
            ]
            .map(String::from)
            .to_vec(),
            admin_prefix: "/admin".to_string(),
            api_prefix: "/api".to_string(),
            auth_prefix: "/api/auth".to_string(),
            login_path: "/".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting on API paths.
    pub enabled: bool,

    /// Accepted requests per identifier per window.
    pub max_requests: usize,

    /// Sliding window length in seconds.
    pub window_secs: u64,

    /// Tracked identifiers above which the whole map is cleared.
    pub max_identifiers: usize,

    /// Value of the `Retry-After` header on 429 responses.
    pub retry_after_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 60,
            max_identifiers: 1000,
            retry_after_secs: 60,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
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
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: GateConfig = toml::from_str(
            r#"
            [upstream]
            address = "10.0.0.5:3000"

            [rate_limit]
            max_requests = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.address, "10.0.0.5:3000");
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.paths.api_prefix, "/api");
        assert_eq!(config.auth.required_role, "admin");
    }
}
