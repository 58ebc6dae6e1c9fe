use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::RequestContext;
use crate::http::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoAmI {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub expires_at: u64,
    pub allow_all: bool,
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub enabled: bool,
    pub entries: usize,
    pub requests_per_second: f64,
    pub burst: u32,
    pub idle_ttl_secs: u64,
    pub eviction_threshold: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptchaStatus {
    pub entries: usize,
    pub ttl_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GateStatus {
    pub version: String,
    pub rate_limit: RateLimitStatus,
    pub captcha: CaptchaStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EvictionReport {
    pub rate_limit_evicted: usize,
    pub captcha_swept: usize,
}

pub async fn whoami(context: RequestContext) -> Json<WhoAmI> {
    Json(WhoAmI {
        subject: context.claims.sub.clone(),
        username: context.claims.username.clone(),
        expires_at: context.claims.exp,
        allow_all: context.permissions.allows_all(),
        permissions: context
            .permissions
            .permissions()
            .iter()
            .map(|p| p.to_string())
            .collect(),
    })
}

pub async fn get_gate_status(State(state): State<AppState>) -> Json<GateStatus> {
    let settings = state.limiter.settings();

    Json(GateStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        rate_limit: RateLimitStatus {
            enabled: settings.enabled(),
            entries: state.limiter.len(),
            requests_per_second: settings.rate_per_second,
            burst: settings.burst,
            idle_ttl_secs: settings.idle_ttl.as_secs(),
            eviction_threshold: settings.eviction_threshold,
        },
        captcha: CaptchaStatus {
            entries: state.captcha.len(),
            ttl_secs: state.captcha.ttl().as_secs(),
        },
    })
}

/// Sweep idle rate-limit buckets and expired captchas now.
pub async fn evict_idle(
    State(state): State<AppState>,
    context: RequestContext,
) -> Json<EvictionReport> {
    let report = EvictionReport {
        rate_limit_evicted: state.limiter.evict_idle(),
        captcha_swept: state.captcha.sweep_expired(),
    };

    tracing::info!(
        subject = %context.subject(),
        rate_limit_evicted = report.rate_limit_evicted,
        captcha_swept = report.captcha_swept,
        "Manual eviction"
    );
    Json(report)
}
