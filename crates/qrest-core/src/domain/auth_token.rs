//! Persisted bearer secrets. Only SHA-256 digests of the tokens are stored.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// A refresh token doubles as the session record for its user.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub id: Uuid,
    pub token_hash: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(user_id: Uuid, token_hash: String, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            token_hash,
            user_id,
            expires_at: now + Duration::seconds(ttl_seconds),
            revoked: false,
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct VerificationToken {
    pub identifier: String,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationToken {
    pub fn new(identifier: &str, token_hash: String, ttl_hours: i64) -> Self {
        Self {
            identifier: identifier.to_string(),
            token_hash,
            expires_at: Utc::now() + Duration::hours(ttl_hours),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    pub fn new(user_id: Uuid, token_hash: String, ttl_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            token_hash,
            expires_at: now + Duration::hours(ttl_hours),
            created_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry() {
        let live = RefreshToken::new(Uuid::new_v4(), "h".into(), 60);
        assert!(!live.is_expired());
        let dead = RefreshToken::new(Uuid::new_v4(), "h".into(), -1);
        assert!(dead.is_expired());

        let reset = PasswordResetToken::new(Uuid::new_v4(), "h".into(), 1);
        assert!(!reset.is_expired());
        let verify = VerificationToken::new("a@b.com", "h".into(), -1);
        assert!(verify.is_expired());
    }
}
