pub mod checklist;
pub mod media;
pub mod places;
pub mod public;
pub mod trips;
pub mod user;

use axum::{
    extract::{DefaultBodyLimit, FromRequest},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{error::AppError, state::AppState};

/// `Json` whose rejections are rendered as [`AppError`] JSON bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

pub fn create_router(state: AppState) -> Router {
    let media_root = state.storage.root().to_path_buf();
    let upload_limit = state.config.max_upload_bytes;

    let trips = trips::router()
        .merge(checklist::router())
        .merge(media::router())
        .merge(places::router());

    Router::new()
        .merge(public::health_router())
        .nest("/api/auth", public::router().merge(user::router()))
        .nest("/api/trips", trips)
        .nest_service("/media", ServeDir::new(media_root))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
