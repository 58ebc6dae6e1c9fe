//! Per-route authorization gate.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::RequestContext;
use crate::error::{ForbiddenReason, GateError};
use crate::permission::set::check;

/// Permissions a route accepts; holding any one of them is enough.
#[derive(Debug, Clone)]
pub struct RequiredPermissions(Arc<[&'static str]>);

impl RequiredPermissions {
    pub fn any_of(permissions: &[&'static str]) -> Self {
        Self(permissions.into())
    }

    pub fn as_slice(&self) -> &[&'static str] {
        &self.0
    }
}

/// Layer with `middleware::from_fn_with_state(RequiredPermissions::any_of(..), require_permissions)`.
///
/// Only mount on routes that declare a requirement; a route with none should
/// not carry this layer at all.
pub async fn require_permissions(
    State(required): State<RequiredPermissions>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let context = request.extensions().get::<RequestContext>();
    if check(context.map(|c| &c.permissions), required.as_slice()) {
        return next.run(request).await;
    }

    let reason = if context.is_none() {
        ForbiddenReason::ContextMissing
    } else {
        ForbiddenReason::PermissionDenied
    };
    tracing::info!(
        subject = context.map(RequestContext::subject).unwrap_or("-"),
        required = ?required.as_slice(),
        path = %request.uri().path(),
        %reason,
        "Permission denied"
    );
    GateError::Authorization(reason).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Claims;
    use crate::permission::PermissionSet;
    use axum::{http::StatusCode, middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(required: &[&'static str]) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(
                RequiredPermissions::any_of(required),
                require_permissions,
            ))
    }

    fn request_with(perms: Option<&[&str]>) -> Request<Body> {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        if let Some(perms) = perms {
            request.extensions_mut().insert(RequestContext {
                claims: Claims {
                    sub: "7".into(),
                    exp: u64::MAX,
                    iat: None,
                    username: None,
                },
                permissions: PermissionSet::build("7", perms.iter().copied()),
            });
        }
        request
    }

    #[tokio::test]
    async fn test_missing_context_is_forbidden() {
        let response = app(&["system:user:list"])
            .oneshot(request_with(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_held_permission_passes() {
        let response = app(&["system:user:list"])
            .oneshot(request_with(Some(&["system:user:list"])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unheld_permission_is_forbidden() {
        let response = app(&["system:user:delete"])
            .oneshot(request_with(Some(&["system:user:list"])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_wildcard_passes_any_route() {
        let response = app(&["system:gate:evict"])
            .oneshot(request_with(Some(&["*:*:*"])))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_empty_requirement_passes_without_context() {
        let response = app(&[]).oneshot(request_with(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
