use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    auth::hash_password,
    db,
    error::{AppError, FieldErrors},
    models::password_reset::RESET_TOKEN_TTL_MINUTES,
    services::mailer::password_reset_mail,
    state::AppState,
};

/// Returned for every reset request, whether or not the address is known.
pub const RESET_REQUESTED_MESSAGE: &str = "If the email exists, a reset code has been sent";
pub const RESET_DONE_MESSAGE: &str = "Password reset successful";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ResetRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ResetConfirm {
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 6))]
    pub token: String,
    #[serde(default)]
    #[validate(
        length(
            min = 8,
            message = "This password is too short. It must contain at least 8 characters."
        ),
        custom(
            function = "crate::auth::not_entirely_numeric",
            message = "This password is entirely numeric."
        )
    )]
    pub password: String,
    #[serde(default)]
    pub password2: String,
}

/// Issues a fresh code for a known address and mails it. The caller always
/// answers with the same message: a malformed address, an unknown address and
/// delivery problems are only logged.
pub async fn request_reset(state: &AppState, request: ResetRequest) -> Result<(), AppError> {
    let request = ResetRequest {
        email: request.email.trim().to_string(),
    };
    if let Err(err) = request.validate() {
        debug!("ignoring password reset request with invalid address: {err}");
        return Ok(());
    }
    let email = request.email.as_str();

    let Some(user) = db::users::find_by_email(&state.db, email).await? else {
        info!("password reset requested for unknown address");
        return Ok(());
    };

    let token = db::reset_tokens::issue(&state.db, user.id).await?;
    let mail = password_reset_mail(
        &user.email,
        user.greeting_name(),
        &token.token,
        RESET_TOKEN_TTL_MINUTES,
    )?;
    match state.mailer.send(mail).await {
        Ok(()) => info!(user_id = user.id, "password reset code sent"),
        Err(err) => warn!(user_id = user.id, "failed to send password reset code: {err}"),
    }
    Ok(())
}

/// Replaces the password when the code matches an unused, unexpired token.
/// Every session of the user is revoked.
pub async fn confirm_reset(state: &AppState, confirm: ResetConfirm) -> Result<(), AppError> {
    let confirm = ResetConfirm {
        email: confirm.email.trim().to_string(),
        token: confirm.token.trim().to_string(),
        ..confirm
    };

    let mut errors = match confirm.validate() {
        Ok(()) => FieldErrors::new(),
        Err(err) => FieldErrors::from(err),
    };
    if confirm.password != confirm.password2 {
        errors.add("password", "Password fields didn't match.");
    }
    errors.into_result()?;

    let user = db::users::find_by_email(&state.db, &confirm.email)
        .await?
        .ok_or(AppError::InvalidResetCode)?;
    let token = db::reset_tokens::find_unused(&state.db, user.id, &confirm.token)
        .await?
        .ok_or(AppError::InvalidResetCode)?;
    if token.is_expired_at(Utc::now()) {
        return Err(AppError::ResetCodeExpired);
    }

    let password_hash = hash_password(&confirm.password)?;
    db::reset_tokens::consume(&state.db, &token, &password_hash).await?;
    info!(user_id = user.id, "password reset completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_reset_address_fails_validation() {
        let request = ResetRequest {
            email: "not-an-email".into(),
        };
        assert!(request.validate().is_err());
        let request = ResetRequest {
            email: "ana@example.com".into(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn confirm_checks_code_length_and_password_rules() {
        let confirm = ResetConfirm {
            email: "ana@example.com".into(),
            token: "1234567".into(),
            password: "12345678".into(),
            password2: "12345678".into(),
        };
        let errors = FieldErrors::from(confirm.validate().unwrap_err());
        assert_eq!(
            errors.messages("token"),
            ["Ensure this field has no more than 6 characters."]
        );
        assert_eq!(errors.messages("password"), ["This password is entirely numeric."]);
        assert!(!errors.contains("email"));
    }
}
