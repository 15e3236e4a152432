use chrono::Utc;
use rand::Rng;

use crate::{db::DbPool, error::AppError, models::password_reset::PasswordResetToken};

/// Replaces every token of the user with a fresh six-digit code.
///
/// Delete and insert share one transaction so two concurrent requests can
/// never leave two valid codes behind.
pub async fn issue(db: &DbPool, user_id: i64) -> Result<PasswordResetToken, AppError> {
    let code = rand::thread_rng().gen_range(100_000..=999_999).to_string();

    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    let token = sqlx::query_as::<_, PasswordResetToken>(
        r#"INSERT INTO password_reset_tokens (user_id, token, created_at, is_used)
           VALUES (?, ?, ?, 0)
           RETURNING *"#,
    )
    .bind(user_id)
    .bind(code)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(token)
}

pub async fn find_unused(
    db: &DbPool,
    user_id: i64,
    code: &str,
) -> Result<Option<PasswordResetToken>, AppError> {
    let token = sqlx::query_as::<_, PasswordResetToken>(
        "SELECT * FROM password_reset_tokens WHERE user_id = ? AND token = ? AND is_used = 0",
    )
    .bind(user_id)
    .bind(code)
    .fetch_optional(db)
    .await?;
    Ok(token)
}

pub async fn count_for_user(db: &DbPool, user_id: i64) -> Result<i64, AppError> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM password_reset_tokens WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// Stores the new password hash, burns the token and drops every session of
/// the user.
pub async fn consume(
    db: &DbPool,
    token: &PasswordResetToken,
    password_hash: &str,
) -> Result<(), AppError> {
    let mut tx = db.begin().await?;
    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(password_hash)
        .bind(token.user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE password_reset_tokens SET is_used = 1 WHERE id = ?")
        .bind(token.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM sessions WHERE user_id = ?")
        .bind(token.user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(())
}
