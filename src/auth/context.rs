//! Typed per-request authorization context.
//!
//! Inserted into request extensions by the authentication gate and read by the
//! permission gate and handlers. Nothing else writes it.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::token::Claims;
use crate::error::{ForbiddenReason, GateError};
use crate::permission::PermissionSet;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub claims: Claims,
    pub permissions: PermissionSet,
}

impl RequestContext {
    pub fn subject(&self) -> &str {
        &self.claims.sub
    }
}

/// Handlers that take a `RequestContext` refuse to run without one.
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or(GateError::Authorization(ForbiddenReason::ContextMissing))
    }
}
