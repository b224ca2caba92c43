//! The policy kernel: quota-enforced creation, anti-replay refresh, and
//! JWT issuance/validation.

use crate::error::AuthError;
use crate::models::RefreshToken;
use crate::services::insert_buffer::InsertBuffer;
use crate::services::revoke_buffer::RevokeBuffer;
use auth_config::{AccessViolationAction, RefreshCheckField, TokenConfig};
use auth_crypto::{JwtClaims, JwtService};
use chrono::{Duration, Utc};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// The subset of `TokenConfig` the policy kernel actually consults,
/// decoupled from how configuration is loaded or validated.
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    pub maximum_tokens: u32,
    pub access_lifetime: Duration,
    pub refresh_lifetime: Duration,
    pub refresh_check_fields: Vec<RefreshCheckField>,
    pub access_violation_action: AccessViolationAction,
}

impl From<&TokenConfig> for TokenServiceConfig {
    fn from(config: &TokenConfig) -> Self {
        Self {
            maximum_tokens: config.maximum_tokens,
            access_lifetime: Duration::seconds(config.access_lifetime_seconds),
            refresh_lifetime: Duration::seconds(config.refresh_lifetime_seconds),
            refresh_check_fields: config.refresh_check_fields.clone(),
            access_violation_action: config.access_violation_action,
        }
    }
}

pub struct TokenService {
    insert_buffer: Arc<InsertBuffer>,
    revoke_buffer: Arc<RevokeBuffer>,
    jwt: JwtService,
    config: TokenServiceConfig,
}

impl TokenService {
    pub fn new(
        insert_buffer: Arc<InsertBuffer>,
        revoke_buffer: Arc<RevokeBuffer>,
        token_config: &TokenConfig,
    ) -> Self {
        Self {
            insert_buffer,
            revoke_buffer,
            jwt: JwtService::new(token_config.secret.expose_secret().clone()),
            config: TokenServiceConfig::from(token_config),
        }
    }

    /// Create a token for `account`, evicting the oldest existing token
    /// first if the account is already at or above its quota.
    #[instrument(skip(self, ip, fingerprint, user_agent))]
    pub async fn create(
        &self,
        account: Uuid,
        ip: String,
        fingerprint: String,
        user_agent: String,
    ) -> Result<(RefreshToken, String), AuthError> {
        let existing = match self.insert_buffer.find_by_account(account).await {
            Ok(tokens) => tokens,
            Err(AuthError::NotFound) => Vec::new(),
            Err(e) => return Err(e),
        };

        if existing.len() as u32 >= self.config.maximum_tokens {
            // Oldest-first: find_by_account is contractually ordered by
            // created_at ascending. Fire-and-forget — its failure must
            // not block Create.
            self.revoke_buffer.enqueue([existing[0].handle]);
        }

        self.generate(account, ip, fingerprint, user_agent).await
    }

    /// Refresh a handle, enforcing anti-replay checks and issuing a new
    /// handle and access token on success. The old handle is always
    /// revoked — refresh is single-use regardless of whether the new
    /// handle persists.
    #[instrument(skip(self, ip, fingerprint, user_agent))]
    pub async fn refresh(
        &self,
        handle: Uuid,
        ip: String,
        fingerprint: String,
        user_agent: String,
    ) -> Result<(RefreshToken, String), AuthError> {
        let stored = match self.insert_buffer.find_by_handle(handle).await {
            Ok(token) => token,
            Err(AuthError::NotFound) => {
                return Err(AuthError::AccessDenied("refresh token not found".into()))
            }
            Err(e) => return Err(e),
        };

        if stored.is_expired(Utc::now()) {
            self.revoke_buffer.enqueue([handle]);
            return Err(AuthError::AccessDenied("refresh token expired".into()));
        }

        if let Some(mismatch) = self.first_mismatch(&stored, &ip, &fingerprint, &user_agent) {
            self.apply_violation(stored.account, handle).await?;
            return Err(AuthError::AccessDenied(format!(
                "refresh token {mismatch} mismatch"
            )));
        }

        // Single-use: the old handle dies regardless of what happens next.
        self.revoke_buffer.enqueue([handle]);

        self.generate(stored.account, ip, fingerprint, user_agent)
            .await
    }

    fn first_mismatch(
        &self,
        stored: &RefreshToken,
        ip: &str,
        fingerprint: &str,
        user_agent: &str,
    ) -> Option<&'static str> {
        for field in &self.config.refresh_check_fields {
            let matches = match field {
                RefreshCheckField::Ip => stored.ip == ip,
                RefreshCheckField::Fingerprint => stored.fingerprint == fingerprint,
                RefreshCheckField::UserAgent => stored.user_agent == user_agent,
            };
            if !matches {
                return Some(match field {
                    RefreshCheckField::Ip => "ip",
                    RefreshCheckField::Fingerprint => "fingerprint",
                    RefreshCheckField::UserAgent => "user_agent",
                });
            }
        }
        None
    }

    async fn apply_violation(&self, account: Uuid, handle: Uuid) -> Result<(), AuthError> {
        match self.config.access_violation_action {
            AccessViolationAction::DisableAll => self.disable_all(account, &[]).await,
            AccessViolationAction::DisableCurrent => {
                self.disable(handle);
                Ok(())
            }
            AccessViolationAction::None => Ok(()),
        }
    }

    /// Mint a fresh handle and access token, inserting the handle into the
    /// write-behind buffer before returning. The insert happens-before the
    /// caller sees the JWT, so the new handle is immediately refreshable.
    async fn generate(
        &self,
        account: Uuid,
        ip: String,
        fingerprint: String,
        user_agent: String,
    ) -> Result<(RefreshToken, String), AuthError> {
        let now = Utc::now();
        let mut token = RefreshToken::new(account, ip, fingerprint, user_agent);
        token.created_at = now;
        token.expires_in = now + self.config.refresh_lifetime;

        self.insert_buffer
            .insert(std::slice::from_ref(&token))
            .await;

        let access_jwt = self
            .jwt
            .encode(account, now + self.config.access_lifetime)?;

        Ok((token, access_jwt))
    }

    /// Revoke every token for `account` except those in `exclude`.
    /// Absence of any tokens for the account is not an error.
    #[instrument(skip(self))]
    pub async fn disable_all(&self, account: Uuid, exclude: &[Uuid]) -> Result<(), AuthError> {
        let tokens = match self.insert_buffer.find_by_account(account).await {
            Ok(tokens) => tokens,
            Err(AuthError::NotFound) => return Ok(()),
            Err(e) => return Err(e),
        };

        let handles: Vec<Uuid> = tokens
            .into_iter()
            .map(|t| t.handle)
            .filter(|h| !exclude.contains(h))
            .collect();

        self.revoke_buffer.enqueue(handles);
        Ok(())
    }

    /// Revoke a single handle. No existence check — revocation is
    /// idempotent.
    pub fn disable(&self, handle: Uuid) {
        self.revoke_buffer.enqueue([handle]);
    }

    /// Authenticate a bearer token: rejects non-HMAC algs, bad signatures,
    /// and expired tokens.
    pub fn validate(&self, jwt: &str) -> Result<JwtClaims, AuthError> {
        self.jwt
            .validate(jwt)
            .map_err(|e| AuthError::AccessDenied(e.to_string()))
    }

    /// Extract claims from a bearer token without requiring it to be
    /// unexpired — used where the caller only needs to know which account
    /// a (possibly stale) token names.
    pub fn parse(&self, jwt: &str) -> Result<JwtClaims, AuthError> {
        self.jwt.parse(jwt).map_err(|e| {
            warn!(error = %e, "failed to parse bearer token");
            AuthError::ParseError(e.to_string())
        })
    }
}
