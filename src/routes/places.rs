use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    auth::CurrentUser,
    db,
    error::AppError,
    models::place::{
        BulkItemError, BulkPlaces, BulkSaveResult, PlaceInput, PlaceMarker, PlaceResponse,
        PlaceUpdate, PlacesMapData, TripPlace,
    },
    routes::ApiJson,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/places", get(list_places).post(save_place))
        .route("/:id/places/bulk", post(bulk_save_places))
        .route("/:id/places/map-data", get(map_data))
        .route(
            "/:id/places/:place_id",
            put(update_place).patch(update_place).delete(delete_place),
        )
}

#[derive(Debug, Deserialize)]
struct StopFilter {
    stop_index: Option<i64>,
}

async fn list_places(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Query(filter): Query<StopFilter>,
) -> Result<Json<Vec<PlaceResponse>>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;
    let places = db::places::list_for_trip(&state.db, trip.id, filter.stop_index).await?;
    Ok(Json(places.iter().map(PlaceResponse::from).collect()))
}

async fn save_place(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    ApiJson(input): ApiJson<PlaceInput>,
) -> Result<(StatusCode, Json<PlaceResponse>), AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;

    let place = input.into_new_place()?;
    let saved = db::places::insert(&state.db, trip.id, place).await?;
    info!(trip_id = trip.id, place = %saved.place_id, "place saved");
    Ok((StatusCode::CREATED, Json(PlaceResponse::from(&saved))))
}

/// Saves each submitted place on its own; failures are reported per item and
/// never roll back the places that were stored.
async fn bulk_save_places(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    ApiJson(bulk): ApiJson<BulkPlaces>,
) -> Result<Json<BulkSaveResult>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;

    let mut saved = Vec::new();
    let mut errors = Vec::new();
    for (index, raw) in bulk.places.into_iter().enumerate() {
        let place_id = raw
            .get("place_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        match save_one(&state, trip.id, raw).await? {
            Ok(place) => saved.push(PlaceResponse::from(&place)),
            Err(error) => {
                debug!(trip_id = trip.id, index, "bulk place rejected: {error}");
                errors.push(BulkItemError {
                    index,
                    place_id,
                    error,
                });
            }
        }
    }

    info!(
        trip_id = trip.id,
        saved = saved.len(),
        failed = errors.len(),
        "bulk place save finished"
    );
    Ok(Json(BulkSaveResult {
        saved_count: saved.len(),
        error_count: errors.len(),
        saved,
        errors,
    }))
}

/// Stores one bulk item. The inner error is the per-item message; database
/// faults other than duplicates abort the whole request.
async fn save_one(
    state: &AppState,
    trip_id: i64,
    raw: Value,
) -> Result<Result<TripPlace, String>, AppError> {
    let input = match serde_json::from_value::<PlaceInput>(raw) {
        Ok(input) => input,
        Err(err) => return Ok(Err(format!("Invalid place: {err}"))),
    };
    let place = match input.into_new_place() {
        Ok(place) => place,
        Err(errors) => return Ok(Err(errors.summary())),
    };
    match db::places::insert(&state.db, trip_id, place).await {
        Ok(saved) => Ok(Ok(saved)),
        Err(AppError::Conflict(message)) => Ok(Err(message)),
        Err(err) => Err(err),
    }
}

async fn update_place(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, id)): Path<(i64, i64)>,
    ApiJson(update): ApiJson<PlaceUpdate>,
) -> Result<Json<PlaceResponse>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;
    let mut place = db::places::find(&state.db, trip.id, id).await?;

    update.check()?;
    if let Some(stop_index) = update.stop_index {
        place.stop_index = stop_index;
    }
    if let Some(notes) = update.user_notes {
        place.user_notes = notes;
    }
    if let Some(visited) = update.is_visited {
        place.is_visited = visited;
    }
    if let Some(visit_date) = update.visit_date {
        place.visit_date = visit_date;
    }
    if let Some(rating) = update.user_rating {
        place.user_rating = rating;
    }

    let saved = db::places::save(&state.db, &place).await?;
    Ok(Json(PlaceResponse::from(&saved)))
}

async fn delete_place(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;
    let place = db::places::find(&state.db, trip.id, id).await?;
    db::places::delete(&state.db, place.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn map_data(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Json<PlacesMapData>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;
    let places = db::places::list_for_trip(&state.db, trip.id, None).await?;

    Ok(Json(PlacesMapData {
        trip_id: trip.id,
        total_places: places.len(),
        visited_count: places.iter().filter(|place| place.is_visited).count(),
        places: places.iter().map(PlaceMarker::from).collect(),
    }))
}
