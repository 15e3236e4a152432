use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::{self, CurrentUser},
    error::AppError,
    models::user::{NewUser, UserProfile},
    routes::ApiJson,
    services::password_reset::{
        self, ResetConfirm, ResetRequest, RESET_DONE_MESSAGE, RESET_REQUESTED_MESSAGE,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/password-reset", post(password_reset_request))
        .route("/password-reset-confirm", post(password_reset_confirm))
}

pub fn health_router() -> Router<AppState> {
    Router::new().route("/", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "app": "tripmate-backend" }))
}

async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewUser>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth::register_user(&state, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Account created successfully! Please sign in to continue.",
            "user": UserProfile::from(&user),
        })),
    ))
}

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth::authenticate_user(&state, &form.username, &form.password).await?;
    let session = auth::create_session(&state, user.id).await?;
    Ok((
        auth::apply_session_cookie(jar, &session.id),
        Json(json!({
            "token": session.id,
            "user": UserProfile::from(&user),
        })),
    ))
}

async fn logout(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, AppError> {
    let user = current.require_user()?;
    auth::destroy_session(&state, &user.session_id).await?;
    Ok((
        auth::clear_session_cookie(jar),
        Json(json!({ "message": "Successfully logged out" })),
    ))
}

async fn password_reset_request(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ResetRequest>,
) -> Result<Json<Value>, AppError> {
    password_reset::request_reset(&state, request).await?;
    Ok(Json(json!({ "message": RESET_REQUESTED_MESSAGE })))
}

async fn password_reset_confirm(
    State(state): State<AppState>,
    ApiJson(confirm): ApiJson<ResetConfirm>,
) -> Result<Json<Value>, AppError> {
    password_reset::confirm_reset(&state, confirm).await?;
    Ok(Json(json!({ "message": RESET_DONE_MESSAGE })))
}
