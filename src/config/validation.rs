//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, lengths > 0)
//! - Check the captcha canvas can hold the rendered answer
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - A missing signing secret is not an error here; the auth gate reports it
//!   per request

use std::fmt;
use std::net::SocketAddr;

use crate::captcha::font;
use crate::config::schema::GateConfig;

const MAX_CAPTCHA_LENGTH: usize = 32;
const MAX_CAPTCHA_ID_LENGTH: usize = 128;
const MAX_CANVAS_SIDE: u32 = 4096;

/// A single semantic problem with a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.auth.permission_load_timeout_ms == 0 {
        errors.push(ValidationError::new(
            "auth.permission_load_timeout_ms",
            "must be > 0",
        ));
    }
    if config.auth.cookie_name.trim().is_empty() {
        errors.push(ValidationError::new("auth.cookie_name", "must not be empty"));
    }
    if config.auth.query_param.trim().is_empty() {
        errors.push(ValidationError::new("auth.query_param", "must not be empty"));
    }

    let rl = &config.rate_limit;
    if !rl.requests_per_second.is_finite() {
        errors.push(ValidationError::new(
            "rate_limit.requests_per_second",
            "must be a finite number",
        ));
    }
    if rl.idle_ttl_secs == 0 {
        errors.push(ValidationError::new("rate_limit.idle_ttl_secs", "must be > 0"));
    }
    if rl.eviction_threshold == 0 {
        errors.push(ValidationError::new(
            "rate_limit.eviction_threshold",
            "must be > 0",
        ));
    }

    let cap = &config.captcha;
    if cap.ttl_secs == 0 {
        errors.push(ValidationError::new("captcha.ttl_secs", "must be > 0"));
    }
    if cap.length == 0 || cap.length > MAX_CAPTCHA_LENGTH {
        errors.push(ValidationError::new(
            "captcha.length",
            format!("must be between 1 and {MAX_CAPTCHA_LENGTH}"),
        ));
    }
    if cap.id_length < 8 || cap.id_length > MAX_CAPTCHA_ID_LENGTH {
        errors.push(ValidationError::new(
            "captcha.id_length",
            format!("must be between 8 and {MAX_CAPTCHA_ID_LENGTH}"),
        ));
    }
    if cap.width > MAX_CANVAS_SIDE || cap.height > MAX_CANVAS_SIDE {
        errors.push(ValidationError::new(
            "captcha.width",
            format!("canvas sides must be <= {MAX_CANVAS_SIDE}"),
        ));
    }
    if cap.alphabet.trim().is_empty() {
        errors.push(ValidationError::new("captcha.alphabet", "must not be empty"));
    } else if let Some(c) = cap.alphabet.chars().find(|c| !font::has_glyph(*c)) {
        errors.push(ValidationError::new(
            "captcha.alphabet",
            format!("no glyph for character '{c}'"),
        ));
    }
    if cap.width < font::text_width(cap.length).saturating_add(2 * font::MARGIN) {
        errors.push(ValidationError::new(
            "captcha.width",
            format!("too narrow for {} characters", cap.length),
        ));
    }
    if cap.height < font::text_height() + 2 * font::MARGIN {
        errors.push(ValidationError::new("captcha.height", "too short for the glyph row"));
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&GateConfig::default()), Ok(()));
    }

    #[test]
    fn test_missing_secret_is_not_a_validation_error() {
        let mut config = GateConfig::default();
        config.auth.secret = None;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GateConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.captcha.length = 0;
        config.rate_limit.eviction_threshold = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"listener.bind_address"));
        assert!(fields.contains(&"captcha.length"));
        assert!(fields.contains(&"rate_limit.eviction_threshold"));
    }

    #[test]
    fn test_canvas_must_fit_answer() {
        let mut config = GateConfig::default();
        config.captcha.length = 12;
        config.captcha.width = 60;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "captcha.width");
    }

    #[test]
    fn test_oversized_captcha_is_reported() {
        let mut config = GateConfig::default();
        config.captcha.length = 500_000_000;
        config.captcha.id_length = usize::MAX;
        config.captcha.height = 100_000;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"captcha.length"));
        assert!(fields.contains(&"captcha.id_length"));
        assert!(fields.contains(&"captcha.width"));
    }

    #[test]
    fn test_alphabet_needs_glyphs() {
        let mut config = GateConfig::default();
        config.captcha.alphabet = "AB#".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "captcha.alphabet");
    }
}
