//! Unauthenticated captcha endpoints.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::http::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptchaResponse {
    pub captcha_id: String,
    /// PNG as a base64 data URI.
    pub image: String,
    /// Seconds until the challenge expires.
    pub expires_in: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub captcha_id: String,
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub code: u16,
    pub message: String,
    pub success: bool,
}

pub async fn issue_captcha(
    State(state): State<AppState>,
) -> Result<Json<CaptchaResponse>, GateError> {
    let issued = state
        .captcha
        .generate()
        .map_err(|e| GateError::Internal(format!("captcha encoding failed: {e}")))?;

    tracing::debug!(captcha_id = %issued.id, "Captcha issued");

    Ok(Json(CaptchaResponse {
        captcha_id: issued.id,
        image: issued.image,
        expires_in: issued.expires_in.as_secs(),
    }))
}

/// Verifies and consumes the challenge. Every failure reads the same to the caller.
pub async fn verify_captcha(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, GateError> {
    let Json(request) = payload?;
    if let Err(reason) = state
        .captcha
        .check(&request.captcha_id, &request.answer, true)
    {
        tracing::info!(captcha_id = %request.captcha_id, reason = %reason, "Captcha verification failed");
        return Err(reason.into());
    }

    Ok(Json(VerifyResponse {
        code: 200,
        message: "captcha verified".to_string(),
        success: true,
    }))
}
