//! The durable refresh-token record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A refresh token: the durable, server-side half of a session. `handle`
/// is the opaque identifier a client holds as a cookie; everything else is
/// compared against request-borne attributes on refresh or used to decide
/// who owns the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub handle: Uuid,
    pub account: Uuid,
    pub ip: String,
    pub fingerprint: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub expires_in: DateTime<Utc>,
}

impl RefreshToken {
    /// A fresh, not-yet-persisted token for `account`. `created_at` and
    /// `expires_in` are placeholders — `Store::insert` sets `created_at`
    /// as a side effect, and callers are expected to set `expires_in`
    /// before handing the record to a buffer.
    pub fn new(account: Uuid, ip: String, fingerprint: String, user_agent: String) -> Self {
        let now = Utc::now();
        Self {
            handle: Uuid::new_v4(),
            account,
            ip,
            fingerprint,
            user_agent,
            created_at: now,
            expires_in: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_in <= now
    }
}
