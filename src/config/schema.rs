//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the admission gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Credential verification settings.
    pub auth: AuthConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Captcha issuing settings.
    pub captcha: CaptchaConfig,

    /// Static subject -> permission table used by the bundled loader.
    pub permissions: PermissionTableConfig,

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
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Credential verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret. Absence is reported per request, not at startup.
    pub secret: Option<String>,

    /// Cookie consulted when neither header nor query carry a token.
    pub cookie_name: String,

    /// Query parameter consulted after the Authorization header.
    pub query_param: String,

    /// Deadline for the permission-loading collaborator, in milliseconds.
    pub permission_load_timeout_ms: u64,
}

impl AuthConfig {
    /// The secret, treating an empty string the same as an absent one.
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref().filter(|s| !s.is_empty())
    }

    pub fn permission_load_timeout(&self) -> Duration {
        Duration::from_millis(self.permission_load_timeout_ms)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            cookie_name: "token".to_string(),
            query_param: "token".to_string(),
            permission_load_timeout_ms: 3_000,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sustained requests per second per client key. `<= 0` disables limiting.
    pub requests_per_second: f64,

    /// Burst capacity (clamped to at least 1).
    pub burst: u32,

    /// Buckets untouched for this long are dropped on the next sweep.
    pub idle_ttl_secs: u64,

    /// Sweep idle buckets once more than this many are tracked.
    pub eviction_threshold: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10.0,
            burst: 20,
            idle_ttl_secs: 15 * 60,
            eviction_threshold: 1024,
        }
    }
}

/// Captcha configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Lifetime of an issued challenge in seconds.
    pub ttl_secs: u64,

    /// Number of characters in the answer.
    pub length: usize,

    /// Characters the answer is drawn from.
    pub alphabet: String,

    /// Length of the opaque challenge id.
    pub id_length: usize,

    /// Image width in pixels.
    pub width: u32,

    /// Image height in pixels.
    pub height: u32,

    /// Straight noise lines drawn under the text.
    pub noise_lines: u32,

    /// Single-pixel noise dots.
    pub noise_dots: u32,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            length: 4,
            // No I, O, 0 or 1.
            alphabet: "ABCDEFGHJKLMNPQRSTUVWXYZ23456789".to_string(),
            id_length: 16,
            width: 120,
            height: 40,
            noise_lines: 4,
            noise_dots: 60,
        }
    }
}

/// Permissions granted per subject id.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PermissionTableConfig {
    pub subjects: HashMap<String, Vec<String>>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
