use axum::{response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    const MESSAGE: &str = "refresh-token authority is healthy";
    Json(json!({
        "status": "ok",
        "message": MESSAGE,
        "version": env!("CARGO_PKG_VERSION")
    }))
}
