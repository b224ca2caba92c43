//! Request-shape extraction shared by the token handlers: bearer header,
//! refresh cookie, and the client IP/User-Agent pair Store records alongside
//! each handle.

use crate::error::ApiError;
use axum::http::HeaderMap;
use std::net::SocketAddr;
use uuid::Uuid;

pub const REFRESH_COOKIE: &str = "refresh_token";

/// Split the `Authorization` header into exactly two non-empty parts around
/// the literal `"Bearer"`. Anything else is an invalid bearer.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Forbidden("missing bearer token".into()))?;

    let mut parts = header.split_whitespace();
    let (scheme, token) = (parts.next(), parts.next());
    match (scheme, token, parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Ok(token),
        _ => Err(ApiError::Forbidden("malformed bearer header".into())),
    }
}

/// Pull the refresh handle out of the `refresh_token` cookie.
pub fn refresh_cookie(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let raw = headers
        .get(axum::http::header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Forbidden("missing refresh cookie".into()))?;

    raw.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_COOKIE)
        .map(|(_, value)| value)
        .ok_or_else(|| ApiError::Forbidden("missing refresh cookie".into()))
        .and_then(|value| {
            Uuid::parse_str(value)
                .map_err(|_| ApiError::Forbidden("malformed refresh cookie".into()))
        })
}

/// Best-effort client IP: the load balancer's `X-Forwarded-For` header when
/// present, otherwise the socket peer address.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| peer.ip().to_string())
}

pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
