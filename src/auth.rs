use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use chrono::Utc;
use tracing::{debug, info};
use validator::{Validate, ValidationError};

use crate::{
    db::{self, users::UserRecord},
    error::{AppError, FieldErrors},
    models::{
        session::Session,
        user::{NewUser, User},
    },
    state::AppState,
};

pub const SESSION_COOKIE: &str = "tripmate_session";

/// The account behind the current request together with the session that
/// authenticated it.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub uuid: String,
    pub username: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = match bearer_token(parts) {
            Some(token) => Some(token),
            None => PrivateCookieJar::from_headers(&parts.headers, state.cookie_key.clone())
                .get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_string()),
        };
        let Some(token) = token else {
            return Ok(Self(None));
        };

        Ok(Self(resolve_session(&state, &token).await?))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }
}

/// Token from an `Authorization: Token <t>` or `Authorization: Bearer <t>` header.
fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    match scheme {
        s if s.eq_ignore_ascii_case("token") || s.eq_ignore_ascii_case("bearer") => {
            Some(token.to_string())
        }
        _ => None,
    }
}

/// Looks a session token up; expired sessions are removed on sight.
pub async fn resolve_session(
    state: &AppState,
    token: &str,
) -> Result<Option<AuthenticatedUser>, AppError> {
    let Some(session) = db::sessions::find(&state.db, token).await? else {
        return Ok(None);
    };
    if session.is_expired_at(Utc::now()) {
        debug!(user_id = session.user_id, "discarding expired session");
        db::sessions::delete(&state.db, &session.id).await?;
        return Ok(None);
    }

    let user = match db::users::find_by_id(&state.db, session.user_id).await? {
        Some(user) if user.is_active => user,
        _ => return Ok(None),
    };
    db::sessions::touch(&state.db, &session.id).await?;

    Ok(Some(AuthenticatedUser {
        id: user.id,
        uuid: user.uuid,
        username: user.username,
        session_id: session.id,
    }))
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Other(anyhow::anyhow!("password hashing failed: {err}")))
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    PasswordHash::new(password_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Rejects passwords made only of digits. Used as a custom `validator` rule,
/// so the empty string passes and length is checked separately.
pub fn not_entirely_numeric(password: &str) -> Result<(), ValidationError> {
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("password_entirely_numeric"));
    }
    Ok(())
}

pub async fn register_user(state: &AppState, input: NewUser) -> Result<User, AppError> {
    let input = input.normalized();
    let mut errors = match input.validate() {
        Ok(()) => FieldErrors::new(),
        Err(err) => FieldErrors::from(err),
    };

    if input.password != input.password2 {
        errors.add("password2", "Password fields didn't match.");
    }
    if !errors.contains("username")
        && db::users::username_taken(&state.db, &input.username).await?
    {
        errors.add("username", "A user with this username already exists.");
    }
    if !errors.contains("email")
        && db::users::email_taken(&state.db, &input.email, None).await?
    {
        errors.add("email", "A user with this email already exists.");
    }
    errors.into_result()?;

    let password_hash = hash_password(&input.password)?;
    let user = db::users::insert(
        &state.db,
        UserRecord {
            username: &input.username,
            email: &input.email,
            password_hash: &password_hash,
            first_name: &input.first_name,
            last_name: &input.last_name,
        },
    )
    .await
    .map_err(|err| match err {
        AppError::Database(err) => {
            AppError::conflict_on_unique(err, "A user with that username or email already exists.")
        }
        other => other,
    })?;

    info!(user_id = user.id, username = %user.username, "registered user");
    Ok(user)
}

/// Accepts either the username or the email as identifier.
pub async fn authenticate_user(
    state: &AppState,
    identifier: &str,
    password: &str,
) -> Result<User, AppError> {
    let identifier = identifier.trim();
    if identifier.is_empty() || password.is_empty() {
        return Err(login_error("Must include username/email and password."));
    }

    let user = db::users::find_by_login(&state.db, identifier)
        .await?
        .filter(|user| verify_password(password, &user.password_hash))
        .ok_or_else(|| login_error("Unable to log in with provided credentials."))?;
    if !user.is_active {
        return Err(login_error("User account is disabled."));
    }

    db::users::touch_last_login(&state.db, user.id).await?;
    Ok(user)
}

fn login_error(message: &str) -> AppError {
    let mut errors = FieldErrors::new();
    errors.add("non_field_errors", message);
    AppError::Validation(errors)
}

pub async fn create_session(state: &AppState, user_id: i64) -> Result<Session, AppError> {
    let session = db::sessions::create(&state.db, user_id, state.config.session_ttl_hours).await?;
    debug!(user_id, "session created");
    Ok(session)
}

pub async fn destroy_session(state: &AppState, session_id: &str) -> Result<(), AppError> {
    db::sessions::delete(&state.db, session_id).await
}

pub fn apply_session_cookie(jar: PrivateCookieJar, session_id: &str) -> PrivateCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    jar.add(cookie)
}

pub fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").expect("hash");
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }

    #[test]
    fn numeric_passwords_are_rejected() {
        assert!(not_entirely_numeric("12345678").is_err());
        assert!(not_entirely_numeric("travel2025").is_ok());
        assert!(not_entirely_numeric("").is_ok());
    }
}
