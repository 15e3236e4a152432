use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

pub const RESET_TOKEN_TTL_MINUTES: i64 = 15;

#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: i64,
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub is_used: bool,
}

impl PasswordResetToken {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::minutes(RESET_TOKEN_TTL_MINUTES)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }
}
