//! MySQL-backed implementation of `auth_core::services::Store`.

use auth_core::{AuthError, RefreshToken};
use chrono::{DateTime, Utc};
use sqlx::{MySql, Pool, Row};
use uuid::Uuid;

pub struct RefreshTokenRepository {
    pool: Pool<MySql>,
}

impl RefreshTokenRepository {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    fn row_to_token(row: sqlx::mysql::MySqlRow) -> Result<RefreshToken, AuthError> {
        let handle: String = row.try_get("uuid")?;
        let account: String = row.try_get("login")?;

        Ok(RefreshToken {
            handle: Uuid::parse_str(&handle)
                .map_err(|e| AuthError::StorageError(format!("malformed uuid column: {e}")))?,
            account: Uuid::parse_str(&account)
                .map_err(|e| AuthError::StorageError(format!("malformed login column: {e}")))?,
            ip: row.try_get("ip")?,
            fingerprint: row.try_get("fingerprint")?,
            user_agent: row.try_get("user_agent")?,
            created_at: row.try_get("created_at")?,
            expires_in: row.try_get("expires_in")?,
        })
    }
}

#[async_trait::async_trait]
impl auth_core::services::Store for RefreshTokenRepository {
    async fn find_by_account(&self, account: Uuid) -> Result<Vec<RefreshToken>, AuthError> {
        let rows = sqlx::query(
            r#"
            SELECT uuid, login, ip, fingerprint, user_agent, created_at, expires_in
            FROM refresh_tokens
            WHERE login = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(account.to_string())
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(AuthError::NotFound);
        }

        rows.into_iter().map(Self::row_to_token).collect()
    }

    async fn find_by_handle(&self, handle: Uuid) -> Result<RefreshToken, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT uuid, login, ip, fingerprint, user_agent, created_at, expires_in
            FROM refresh_tokens
            WHERE uuid = ?
            "#,
        )
        .bind(handle.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::NotFound)?;

        Self::row_to_token(row)
    }

    async fn insert(&self, tokens: &mut [RefreshToken]) -> Result<(), AuthError> {
        if tokens.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        for token in tokens.iter_mut() {
            token.created_at = now;
        }

        let mut tx = self.pool.begin().await?;
        for token in tokens.iter() {
            sqlx::query(
                r#"
                INSERT INTO refresh_tokens
                    (uuid, login, ip, fingerprint, user_agent, created_at, expires_in)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(token.handle.to_string())
            .bind(token.account.to_string())
            .bind(&token.ip)
            .bind(&token.fingerprint)
            .bind(&token.user_agent)
            .bind(token.created_at)
            .bind(token.expires_in)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn delete_by_handles(&self, handles: &[Uuid]) -> Result<(), AuthError> {
        if handles.is_empty() {
            return Ok(());
        }

        let placeholders = std::iter::repeat("?")
            .take(handles.len())
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!("DELETE FROM refresh_tokens WHERE uuid IN ({placeholders})");

        let mut q = sqlx::query(&query);
        for handle in handles {
            q = q.bind(handle.to_string());
        }
        q.execute(&self.pool).await?;

        Ok(())
    }

    async fn delete_by_expiry(&self, cutoff: DateTime<Utc>) -> Result<(), AuthError> {
        sqlx::query("DELETE FROM refresh_tokens WHERE expires_in <= ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
