use axum::{extract::State, routing::get, Json, Router};

use validator::Validate;

use crate::{
    auth::CurrentUser,
    db::{self, users::ProfileRecord},
    error::{AppError, FieldErrors},
    models::user::{ProfileUpdate, UserProfile},
    routes::ApiJson,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(profile).patch(update_profile))
}

async fn profile(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    let user = current.require_user()?;
    let user = db::users::find_by_id(&state.db, user.id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(UserProfile::from(&user)))
}

/// Blank values leave the stored field untouched.
async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    let current = current.require_user()?;
    let user = db::users::find_by_id(&state.db, current.id)
        .await?
        .ok_or(AppError::NotFound)?;

    let update = update.normalized();
    update.validate()?;

    let email = update.email.as_deref().unwrap_or(&user.email);
    if email != user.email && db::users::email_taken(&state.db, email, Some(user.id)).await? {
        let mut errors = FieldErrors::new();
        errors.add("email", "A user with this email already exists.");
        return Err(errors.into());
    }

    let updated = db::users::update_profile(
        &state.db,
        user.id,
        ProfileRecord {
            first_name: update.first_name.as_deref().unwrap_or(&user.first_name),
            last_name: update.last_name.as_deref().unwrap_or(&user.last_name),
            email,
            phone: update.phone.as_deref().unwrap_or(&user.phone),
            date_of_birth: update.date_of_birth.or(user.date_of_birth),
        },
    )
    .await?;
    Ok(Json(UserProfile::from(&updated)))
}
