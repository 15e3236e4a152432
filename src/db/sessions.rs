use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{db::DbPool, error::AppError, models::session::Session};

pub async fn create(db: &DbPool, user_id: i64, ttl_hours: i64) -> Result<Session, AppError> {
    let now = Utc::now();
    let expires_at = (ttl_hours > 0).then(|| now + Duration::hours(ttl_hours));
    let session = sqlx::query_as::<_, Session>(
        r#"INSERT INTO sessions (id, user_id, created_at, last_seen_at, expires_at)
           VALUES (?, ?, ?, ?, ?)
           RETURNING *"#,
    )
    .bind(Uuid::new_v4().simple().to_string())
    .bind(user_id)
    .bind(now)
    .bind(now)
    .bind(expires_at)
    .fetch_one(db)
    .await?;
    Ok(session)
}

pub async fn find(db: &DbPool, id: &str) -> Result<Option<Session>, AppError> {
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(session)
}

pub async fn touch(db: &DbPool, id: &str) -> Result<(), AppError> {
    sqlx::query("UPDATE sessions SET last_seen_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete(db: &DbPool, id: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
