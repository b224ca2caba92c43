//! HS256 access-token signing and parsing.
//!
//! Wire format: `{"login": "<uuid>", "exp": <unix-seconds>}`, signed with a
//! single HMAC secret. Only HMAC algorithms are ever accepted on decode —
//! this defends against alg-confusion attacks where a caller presents a
//! token signed (or unsigned) under a different algorithm family.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("token encoding failed: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("token uses a non-HMAC algorithm")]
    UnsupportedAlgorithm,

    #[error("claim '{0}' is missing or has the wrong type")]
    MalformedClaim(&'static str),

    #[error("token is expired")]
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireClaims {
    login: String,
    exp: i64,
}

/// The decoded, strongly-typed form of [`WireClaims`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwtClaims {
    pub login: Uuid,
    pub expires_in: DateTime<Utc>,
}

pub struct JwtService {
    secret: Secret<String>,
}

impl JwtService {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Secret::new(secret.into()),
        }
    }

    /// Mint a signed access token for `login`, expiring at `expires_at`.
    pub fn encode(&self, login: Uuid, expires_at: DateTime<Utc>) -> Result<String, JwtError> {
        let claims = WireClaims {
            login: login.to_string(),
            exp: expires_at.timestamp(),
        };

        let key = EncodingKey::from_secret(self.secret.expose_secret().as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(JwtError::Encoding)
    }

    /// Verify the signature and algorithm family and require the token to
    /// be unexpired. This is what gates access to protected endpoints.
    pub fn validate(&self, token: &str) -> Result<JwtClaims, JwtError> {
        self.decode_with(token, true)
    }

    /// Verify the signature and algorithm family but tolerate expiry,
    /// returning claims even for a token whose `exp` has passed. Used where
    /// the caller needs the account a bearer token names (e.g. revoking all
    /// of an account's other sessions) without re-authenticating first.
    pub fn parse(&self, token: &str) -> Result<JwtClaims, JwtError> {
        self.decode_with(token, false)
    }

    fn decode_with(&self, token: &str, require_unexpired: bool) -> Result<JwtClaims, JwtError> {
        let header = jsonwebtoken::decode_header(token)?;
        if !matches!(
            header.alg,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(JwtError::UnsupportedAlgorithm);
        }

        let mut validation = Validation::new(header.alg);
        validation.validate_exp = require_unexpired;
        validation.required_spec_claims.clear();

        let key = DecodingKey::from_secret(self.secret.expose_secret().as_bytes());
        let data = match decode::<WireClaims>(token, &key, &validation) {
            Ok(data) => data,
            Err(e) if matches!(e.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature) => {
                return Err(JwtError::Expired)
            }
            Err(e) => return Err(JwtError::Encoding(e)),
        };

        let login =
            Uuid::parse_str(&data.claims.login).map_err(|_| JwtError::MalformedClaim("login"))?;
        let expires_in = Utc
            .timestamp_opt(data.claims.exp, 0)
            .single()
            .ok_or(JwtError::MalformedClaim("exp"))?;

        Ok(JwtClaims { login, expires_in })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn round_trips_claims() {
        let service = JwtService::new("test-secret-at-least-this-long");
        let login = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::minutes(30);

        let token = service.encode(login, expires_at).unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.login, login);
        assert_eq!(claims.expires_in.timestamp(), expires_at.timestamp());
    }

    #[test]
    fn validate_rejects_expired_tokens() {
        let service = JwtService::new("test-secret-at-least-this-long");
        let token = service
            .encode(Uuid::new_v4(), Utc::now() - Duration::seconds(1))
            .unwrap();

        assert!(matches!(service.validate(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn parse_tolerates_expired_tokens() {
        let service = JwtService::new("test-secret-at-least-this-long");
        let login = Uuid::new_v4();
        let token = service
            .encode(login, Utc::now() - Duration::seconds(1))
            .unwrap();

        let claims = service.parse(&token).unwrap();
        assert_eq!(claims.login, login);
    }

    #[test]
    fn rejects_wrong_secret() {
        let service = JwtService::new("right-secret");
        let other = JwtService::new("wrong-secret");
        let token = service
            .encode(Uuid::new_v4(), Utc::now() + Duration::minutes(5))
            .unwrap();

        assert!(other.validate(&token).is_err());
    }

    #[test]
    fn rejects_malformed_login_claim() {
        let service = JwtService::new("test-secret-at-least-this-long");
        let key = EncodingKey::from_secret(b"test-secret-at-least-this-long");
        let token = encode(
            &Header::new(Algorithm::HS256),
            &WireClaims {
                login: "not-a-uuid".to_string(),
                exp: (Utc::now() + Duration::minutes(5)).timestamp(),
            },
            &key,
        )
        .unwrap();

        assert!(matches!(
            service.validate(&token),
            Err(JwtError::MalformedClaim("login"))
        ));
    }
}
