//! HTTP facade over `TokenService`. No policy logic of its own: handlers
//! translate request shapes to service calls and service results to
//! responses.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;

use auth_core::TokenService;
use axum::Router;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub token_service: Arc<TokenService>,
}

pub fn app(state: AppState) -> Router {
    router::api_router().with_state(state)
}

impl axum::extract::FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.token_service.clone()
    }
}
