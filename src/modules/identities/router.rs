use axum::{Router, routing::get};

use super::controller::get_identity;
use crate::state::AppState;

pub fn init_identities_router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_identity))
}
