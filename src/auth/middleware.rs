//! Authentication gate.
//!
//! Verifies the credential, loads the subject's permissions under a deadline,
//! builds the permission set and attaches a [`RequestContext`]. Any failure
//! ends the request here.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::context::RequestContext;
use crate::auth::extract::TokenSources;
use crate::error::GateError;
use crate::http::server::AppState;
use crate::permission::{load_with_deadline, PermissionSet};

pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    match attach_context(&state, &mut request).await {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

async fn attach_context(state: &AppState, request: &mut Request<Body>) -> Result<(), GateError> {
    let claims = {
        let sources = TokenSources::new(request.headers(), request.uri().query());
        state.verifier.authenticate(&sources)?
    };

    let deadline = state.verifier.settings().permission_load_timeout();
    let raw = load_with_deadline(state.permissions.as_ref(), &claims.sub, deadline).await?;
    let permissions = PermissionSet::build(claims.sub.clone(), raw);

    tracing::debug!(
        subject = %claims.sub,
        allow_all = permissions.allows_all(),
        granted = permissions.len(),
        "Request authenticated"
    );

    request
        .extensions_mut()
        .insert(RequestContext { claims, permissions });
    Ok(())
}
