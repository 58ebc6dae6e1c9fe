//! Bearer credential verification.
//!
//! Credentials are HS256 JWTs: three base64url segments, HMAC-SHA256 over
//! header and payload with the configured secret. Signature and structure are
//! checked first, so a forged token is `Invalid` even when it is also past
//! its expiry.

use std::sync::Arc;

use arc_swap::ArcSwap;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::extract::{self, TokenSources};
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::error::{AuthError, GateError};

/// Verified identity carried by a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account) id.
    pub sub: String,
    /// Expiry, Unix seconds.
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// Verify `token` against `secret` at time `now` (Unix seconds).
pub fn verify(token: &str, secret: &str, now: u64) -> Result<Claims, GateError> {
    if secret.is_empty() {
        return Err(GateError::Configuration("token signing secret is not configured"));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    // Expiry is judged against the injected clock below, with no leeway.
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.validate_aud = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| {
            tracing::debug!(error = %e, "Credential rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid,
            }
        })?;

    if data.claims.exp <= now {
        return Err(AuthError::Expired.into());
    }
    Ok(data.claims)
}

/// Locates and verifies credentials using the live auth settings.
#[derive(Debug)]
pub struct TokenVerifier {
    settings: ArcSwap<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(settings: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings: ArcSwap::from_pointee(settings),
            clock,
        }
    }

    /// Atomically replace the auth settings (secret rotation, cookie rename).
    pub fn reconfigure(&self, settings: AuthConfig) {
        self.settings.store(Arc::new(settings));
    }

    pub fn settings(&self) -> Arc<AuthConfig> {
        self.settings.load_full()
    }

    /// Verify a raw token with the configured secret.
    pub fn verify(&self, token: &str) -> Result<Claims, GateError> {
        let settings = self.settings.load();
        verify(token, settings.secret().unwrap_or_default(), self.clock.now_secs())
    }

    /// Full gate: secret configured → token located → token verified.
    pub fn authenticate(&self, sources: &TokenSources<'_>) -> Result<Claims, GateError> {
        let settings = self.settings.load();
        let Some(secret) = settings.secret() else {
            return Err(GateError::Configuration(
                "token signing secret is not configured",
            ));
        };

        let token = extract::locate_token(sources, &settings.query_param, &settings.cookie_name)
            .ok_or(AuthError::Missing)?;

        verify(&token, secret, self.clock.now_secs())
    }
}
