use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use tracing::info;

use crate::{
    auth::CurrentUser,
    db,
    error::AppError,
    models::{checklist::ChecklistItem, trip::Trip},
    routes::ApiJson,
    services::checklist::{self, ChecklistProgress},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/checklist", get(get_checklist).put(update_checklist))
        .route("/:id/checklist/regenerate", post(regenerate_checklist))
}

#[skip_serializing_none]
#[derive(Debug, Serialize)]
struct ChecklistResponse {
    message: Option<&'static str>,
    trip_id: i64,
    trip_type: String,
    checklist_data: Vec<ChecklistItem>,
    progress: ChecklistProgress,
}

impl ChecklistResponse {
    fn new(trip: &Trip) -> Self {
        Self {
            message: None,
            trip_id: trip.id,
            trip_type: trip.trip_type.clone(),
            checklist_data: trip.checklist().to_vec(),
            progress: checklist::progress(trip.checklist()),
        }
    }

    fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

async fn get_checklist(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Json<ChecklistResponse>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;
    Ok(Json(ChecklistResponse::new(&trip)))
}

#[derive(Debug, Deserialize)]
struct ChecklistUpdate {
    checklist_data: Vec<Value>,
}

async fn update_checklist(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    ApiJson(update): ApiJson<ChecklistUpdate>,
) -> Result<Json<ChecklistResponse>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;

    let items = checklist::parse_submitted(update.checklist_data)?;
    let saved = db::trips::update_checklist(&state.db, trip.id, &trip.trip_type, &items).await?;
    Ok(Json(
        ChecklistResponse::new(&saved).with_message("Checklist updated successfully"),
    ))
}

#[derive(Debug, Deserialize)]
struct RegenerateRequest {
    #[serde(default = "merge_by_default")]
    merge_with_existing: bool,
    trip_type: Option<String>,
}

impl Default for RegenerateRequest {
    fn default() -> Self {
        Self {
            merge_with_existing: merge_by_default(),
            trip_type: None,
        }
    }
}

fn merge_by_default() -> bool {
    true
}

/// The request body is optional; without one the existing checklist is
/// merged into a fresh one for the stored trip type.
async fn regenerate_checklist(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    body: Option<ApiJson<RegenerateRequest>>,
) -> Result<Json<ChecklistResponse>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;
    let request = body.map(|ApiJson(request)| request).unwrap_or_default();

    let trip_type = request
        .trip_type
        .as_deref()
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .unwrap_or(&trip.trip_type)
        .to_string();
    let duration = trip
        .start_date
        .zip(trip.end_date)
        .map(|_| trip.duration_days());

    let fresh = checklist::generate(&trip_type, duration, trip.travelers, trip.is_international());
    let merged = checklist::merge(fresh, trip.checklist(), request.merge_with_existing);
    let saved = db::trips::update_checklist(&state.db, trip.id, &trip_type, &merged).await?;

    info!(
        trip_id = trip.id,
        trip_type = %trip_type,
        merged = request.merge_with_existing,
        items = merged.len(),
        "checklist regenerated"
    );
    Ok(Json(
        ChecklistResponse::new(&saved).with_message("Checklist regenerated successfully"),
    ))
}
