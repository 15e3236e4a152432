use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};
use validator::{ValidationError, ValidationErrors};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("mail delivery failed: {0}")]
    Mail(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("Invalid reset code")]
    InvalidResetCode,
    #[error("Reset code has expired. Please request a new one.")]
    ResetCodeExpired,
    #[error("{0}")]
    Conflict(String),
    #[error("not found")]
    NotFound,
    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthorized,
}

impl AppError {
    /// Maps a unique-constraint violation onto a conflict, leaving every other
    /// database error untouched.
    pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(message.to_string())
            }
            _ => AppError::Database(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Config(_)
            | AppError::Io(_)
            | AppError::Database(_)
            | AppError::Mail(_)
            | AppError::Other(_) => {
                error!("request failed: {self:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error" }),
                )
            }
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, json!({ "errors": errors })),
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::InvalidResetCode => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "code": "invalid_code" }),
            ),
            AppError::ResetCodeExpired => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "code": "expired_code" }),
            ),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::NotFound => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, json!({ "error": self.to_string() }))
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Field-level validation messages, keyed by the offending input field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn extend(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Short human-readable rendering, used where a single line is reported.
    pub fn summary(&self) -> String {
        self.0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(" ")))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                fields.add(field.to_string(), describe(error));
            }
        }
        fields
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors.into())
    }
}

/// Message for a failed rule; attributes without an explicit message get a
/// wording derived from the rule's parameters.
fn describe(error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }
    match error.code.as_ref() {
        "email" => "Enter a valid email address.".to_string(),
        "length" => length_message(error),
        "range" => match (error.params.get("min"), error.params.get("max")) {
            (Some(min), Some(max)) => format!("Ensure this value is between {min} and {max}."),
            (Some(min), None) => format!("Ensure this value is greater than or equal to {min}."),
            (None, Some(max)) => format!("Ensure this value is less than or equal to {max}."),
            (None, None) => "Value is out of range.".to_string(),
        },
        code => format!("Invalid value ({code})."),
    }
}

fn length_message(error: &ValidationError) -> String {
    let bound = |name: &str| error.params.get(name).and_then(Value::as_u64);
    let chars = error
        .params
        .get("value")
        .and_then(Value::as_str)
        .map(|value| value.chars().count() as u64);

    match (chars, bound("min"), bound("max")) {
        (Some(0), Some(_), _) => "This field is required.".to_string(),
        (Some(len), Some(min), _) if len < min => {
            format!("Ensure this field has at least {min} characters.")
        }
        (_, _, Some(max)) => format!("Ensure this field has no more than {max} characters."),
        (_, Some(1), None) => "This field is required.".to_string(),
        (_, Some(min), None) => format!("Ensure this field has at least {min} characters."),
        _ => "Ensure this field has a valid length.".to_string(),
    }
}

/// Body parse failures come back as JSON like every other error. A value of
/// the wrong type is reported under the field it was found at.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        debug!("rejected JSON body: {}", rejection.body_text());
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let text = err.body_text();
                let detail = text.split_once(": ").map_or(text.as_str(), |(_, rest)| rest);
                let mut errors = FieldErrors::new();
                match detail.split_once(": ") {
                    Some((path, message)) if !path.is_empty() && !path.contains(' ') => {
                        errors.add(path, message)
                    }
                    _ => errors.add("non_field_errors", detail),
                }
                AppError::Validation(errors)
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 1, max = 5))]
        name: String,
        #[validate(email)]
        email: String,
        #[validate(range(min = 1, message = "At least one traveler."))]
        travelers: i64,
    }

    #[test]
    fn validator_errors_keep_field_names_and_messages() {
        let signup = Signup {
            name: String::new(),
            email: "nope".into(),
            travelers: 0,
        };
        let errors = FieldErrors::from(signup.validate().unwrap_err());
        assert_eq!(errors.messages("name"), ["This field is required."]);
        assert_eq!(errors.messages("email"), ["Enter a valid email address."]);
        assert_eq!(errors.messages("travelers"), ["At least one traveler."]);
    }

    #[test]
    fn overlong_text_reports_the_limit() {
        let signup = Signup {
            name: "abcdefg".into(),
            email: "ana@example.com".into(),
            travelers: 2,
        };
        let errors = FieldErrors::from(signup.validate().unwrap_err());
        assert_eq!(
            errors.messages("name"),
            ["Ensure this field has no more than 5 characters."]
        );
        assert!(!errors.contains("email"));
    }
}
