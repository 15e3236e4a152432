use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{db::DbPool, error::AppError, models::user::User};

pub struct UserRecord<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

pub async fn insert(db: &DbPool, record: UserRecord<'_>) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"INSERT INTO users (uuid, username, email, password_hash, first_name, last_name, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)
           RETURNING *"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(record.username)
    .bind(record.email)
    .bind(record.password_hash)
    .bind(record.first_name)
    .bind(record.last_name)
    .bind(Utc::now())
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn find_by_id(db: &DbPool, id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

pub async fn find_by_email(db: &DbPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
        .bind(email)
        .fetch_optional(db)
        .await?;
    Ok(user)
}

/// Looks the identifier up as a username first, then as an email.
pub async fn find_by_login(db: &DbPool, identifier: &str) -> Result<Option<User>, AppError> {
    let by_username = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(identifier)
        .fetch_optional(db)
        .await?;
    match by_username {
        Some(user) => Ok(Some(user)),
        None => find_by_email(db, identifier).await,
    }
}

pub async fn username_taken(db: &DbPool, username: &str) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(db)
        .await?;
    Ok(count > 0)
}

pub async fn email_taken(
    db: &DbPool,
    email: &str,
    except_user: Option<i64>,
) -> Result<bool, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE email = ? COLLATE NOCASE AND (? IS NULL OR id != ?)",
    )
    .bind(email)
    .bind(except_user)
    .bind(except_user)
    .fetch_one(db)
    .await?;
    Ok(count > 0)
}

pub async fn touch_last_login(db: &DbPool, user_id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub struct ProfileRecord<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub date_of_birth: Option<NaiveDate>,
}

pub async fn update_profile(
    db: &DbPool,
    user_id: i64,
    record: ProfileRecord<'_>,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"UPDATE users
           SET first_name = ?, last_name = ?, email = ?, phone = ?, date_of_birth = ?
           WHERE id = ?
           RETURNING *"#,
    )
    .bind(record.first_name)
    .bind(record.last_name)
    .bind(record.email)
    .bind(record.phone)
    .bind(record.date_of_birth)
    .bind(user_id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound)?;
    Ok(user)
}
