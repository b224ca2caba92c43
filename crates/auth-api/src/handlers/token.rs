//! Thin translation layer: HTTP <-> `TokenService`. No policy logic lives
//! here, only request-shape extraction and response assembly.

use crate::error::ApiError;
use crate::handlers::extract::{bearer_token, client_ip, refresh_cookie, user_agent, REFRESH_COOKIE};
use crate::AppState;
use auth_core::{RefreshToken, TokenService};
use axum::{
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

const MOUNT_PATH: &str = "/token/api/v1";

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub login: Uuid,
    pub fingerprint: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub fingerprint: String,
}

#[derive(Debug, Serialize)]
pub struct TokenInfoResponse {
    pub login: Uuid,
    pub expires_in: DateTime<Utc>,
}

fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn issued_response(token: &RefreshToken, jwt: &str) -> Response {
    let cookie = format!(
        "{REFRESH_COOKIE}={}; HttpOnly; Path={MOUNT_PATH}; Expires={}",
        token.handle,
        http_date(token.expires_in),
    );

    axum::http::Response::builder()
        .status(StatusCode::OK)
        .header(axum::http::header::SET_COOKIE, cookie)
        .header(axum::http::header::AUTHORIZATION, format!("Bearer {jwt}"))
        .body(axum::body::Body::empty())
        .expect("static response is well-formed")
}

/// `PUT /` — issue a fresh refresh handle and access token for `login`.
#[instrument(skip(state, headers))]
pub async fn create(
    State(state): State<Arc<TokenService>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<CreateRequest>,
) -> Result<Response, ApiError> {
    let (token, jwt) = state
        .create(
            body.login,
            client_ip(&headers, peer),
            body.fingerprint,
            user_agent(&headers),
        )
        .await?;

    Ok(issued_response(&token, &jwt))
}

/// `POST /` — exchange a still-live refresh handle for a new one.
#[instrument(skip(state, headers))]
pub async fn refresh(
    State(state): State<Arc<TokenService>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<RefreshRequest>,
) -> Result<Response, ApiError> {
    let handle = refresh_cookie(&headers)?;

    let (token, jwt) = state
        .refresh(
            handle,
            client_ip(&headers, peer),
            body.fingerprint,
            user_agent(&headers),
        )
        .await?;

    Ok(issued_response(&token, &jwt))
}

/// `DELETE /` — log out: revoke the current handle and clear its cookie.
#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<Arc<TokenService>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let handle = refresh_cookie(&headers)?;
    state.disable(handle);

    let cleared = format!(
        "{REFRESH_COOKIE}=; HttpOnly; Path={MOUNT_PATH}; Expires={}",
        http_date(DateTime::<Utc>::UNIX_EPOCH),
    );

    Ok(axum::http::Response::builder()
        .status(StatusCode::ACCEPTED)
        .header(axum::http::header::SET_COOKIE, cleared)
        .body(axum::body::Body::empty())
        .expect("static response is well-formed"))
}

/// `GET /` — introspect the bearer token.
#[instrument(skip(state, headers))]
pub async fn introspect(
    State(state): State<Arc<TokenService>>,
    headers: HeaderMap,
) -> Result<Json<TokenInfoResponse>, ApiError> {
    let jwt = bearer_token(&headers)?;
    let claims = state.validate(jwt)?;

    Ok(Json(TokenInfoResponse {
        login: claims.login,
        expires_in: claims.expires_in,
    }))
}

/// `OPTIONS /` — confirms the bearer is valid, no body.
#[instrument(skip(state, headers))]
pub async fn options(
    State(state): State<Arc<TokenService>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let jwt = bearer_token(&headers)?;
    state.validate(jwt)?;
    Ok(StatusCode::OK)
}

/// `DELETE /all` — revoke every live handle for the caller's account
/// except the one presented in the refresh cookie.
#[instrument(skip(state, headers))]
pub async fn logout_all(
    State(state): State<Arc<TokenService>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let jwt = bearer_token(&headers)?;
    let claims = state.parse(jwt)?;
    let current = refresh_cookie(&headers)?;

    state.disable_all(claims.login, &[current]).await?;
    Ok(StatusCode::ACCEPTED)
}
