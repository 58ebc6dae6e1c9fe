//! Authenticated operator API.
//!
//! Every route here sits behind the authentication gate; the system routes
//! additionally require their named permission.

pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::handlers::*;
use crate::http::server::AppState;
use crate::permission::{require_permissions, RequiredPermissions};

pub const GATE_VIEW: &str = "system:gate:view";
pub const GATE_EVICT: &str = "system:gate:evict";

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/whoami", get(whoami))
        .route(
            "/api/system/gate",
            get(get_gate_status).route_layer(middleware::from_fn_with_state(
                RequiredPermissions::any_of(&[GATE_VIEW]),
                require_permissions,
            )),
        )
        .route(
            "/api/system/gate/evict",
            post(evict_idle).route_layer(middleware::from_fn_with_state(
                RequiredPermissions::any_of(&[GATE_EVICT]),
                require_permissions,
            )),
        )
}
