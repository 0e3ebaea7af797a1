use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::controller::{me, sign_in};
use crate::middleware::require_authenticated;
use crate::state::AppState;

pub fn init_auth_router() -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(me).route_layer(middleware::from_fn(require_authenticated)),
        )
        .route("/sign-in", post(sign_in))
}
