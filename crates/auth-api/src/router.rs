use crate::handlers::{health, token};
use crate::middleware::request_id_middleware;
use crate::AppState;
use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn api_router() -> Router<AppState> {
    let token_routes = Router::new()
        .route(
            "/",
            put(token::create)
                .post(token::refresh)
                .delete(token::logout)
                .get(token::introspect)
                .options(token::options),
        )
        .route("/all", axum::routing::delete(token::logout_all));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/token/api/v1", token_routes)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}
