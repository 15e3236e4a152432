use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub uuid: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name used when addressing the user, e.g. in emails.
    pub fn greeting_name(&self) -> &str {
        if self.first_name.trim().is_empty() {
            &self.username
        } else {
            &self.first_name
        }
    }
}

/// Public view of an account.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            date_of_birth: user.date_of_birth,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewUser {
    #[serde(default)]
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
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
    #[serde(default)]
    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
}

impl NewUser {
    /// Trims the identifying fields; passwords are taken verbatim.
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            ..self
        }
    }
}

/// Blank strings mean "leave unchanged" and are dropped by [`ProfileUpdate::normalized`].
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,
    #[validate(length(max = 150))]
    pub last_name: Option<String>,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

impl ProfileUpdate {
    pub fn normalized(self) -> Self {
        Self {
            first_name: provided(self.first_name),
            last_name: provided(self.last_name),
            email: provided(self.email),
            phone: provided(self.phone),
            date_of_birth: self.date_of_birth,
        }
    }
}

fn provided(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
