use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    auth::CurrentUser,
    db,
    error::AppError,
    models::{
        checklist::{CategoryInfo, ChecklistItem, TripType},
        trip::{NewTrip, TripDetail, TripFields, TripStats, TripSummary, TripUpdate},
    },
    routes::ApiJson,
    services::{checklist, checklist_templates::CATEGORIES},
    state::AppState,
};

const RECENT_TRIPS: i64 = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(create_trip))
        .route("/stats", get(trip_stats))
        .route("/types", get(trip_types))
        .route("/checklist/categories", get(checklist_categories))
        .route(
            "/:id",
            get(get_trip)
                .put(update_trip)
                .patch(update_trip)
                .delete(delete_trip),
        )
}

#[derive(Debug, Deserialize)]
struct TripQuery {
    search: Option<String>,
}

async fn list_trips(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<TripQuery>,
) -> Result<Json<Vec<TripSummary>>, AppError> {
    let user = current.require_user()?;
    let trips = db::trips::list_for_user(&state.db, user.id, query.search.as_deref()).await?;
    Ok(Json(trips.iter().map(TripSummary::from).collect()))
}

async fn create_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(input): ApiJson<NewTrip>,
) -> Result<(StatusCode, Json<TripDetail>), AppError> {
    let user = current.require_user()?;
    let fields = TripFields::from_new(&input);

    let submitted = input.checklist_data.map(checklist::parse_submitted);
    let checklist = match (fields.check(), submitted) {
        (Ok(()), None) => generated_checklist(&fields),
        (Ok(()), Some(Ok(items))) => items,
        (Err(mut errors), Some(Err(item_errors))) => {
            errors.extend(item_errors);
            return Err(errors.into());
        }
        (Err(errors), _) | (Ok(()), Some(Err(errors))) => return Err(errors.into()),
    };

    let route_data = state.route_codec.compact(input.route_data);
    let trip = db::trips::insert(&state.db, user.id, &fields, route_data, &checklist).await?;
    info!(trip_id = trip.id, user_id = user.id, "trip created");
    Ok((StatusCode::CREATED, Json(TripDetail::from(&trip))))
}

fn generated_checklist(fields: &TripFields) -> Vec<ChecklistItem> {
    checklist::generate(
        &fields.trip_type,
        fields.known_duration(),
        fields.travelers,
        fields.is_international(),
    )
}

async fn get_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Json<TripDetail>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;
    Ok(Json(TripDetail::from(&trip)))
}

async fn update_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    ApiJson(update): ApiJson<TripUpdate>,
) -> Result<Json<TripDetail>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;

    let mut fields = trip.fields();
    fields.apply(&update);
    fields.check()?;

    let route_data = update
        .route_data
        .map(|raw| state.route_codec.compact(raw));
    let saved = db::trips::save(&state.db, trip.id, &fields, route_data).await?;
    Ok(Json(TripDetail::from(&saved)))
}

async fn delete_trip(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;

    let files = db::media::files_for_trip(&state.db, trip.id).await?;
    db::trips::delete(&state.db, trip.id).await?;
    for file in files {
        if let Err(err) = state.storage.delete(&file).await {
            warn!(trip_id = trip.id, %file, "failed to remove media file: {err}");
        }
    }

    info!(trip_id = trip.id, user_id = user.id, "trip deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn trip_stats(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<TripStats>, AppError> {
    let user = current.require_user()?;
    let (total_trips, total_distance, total_duration) =
        db::trips::totals_for_user(&state.db, user.id).await?;
    let recent = db::trips::recent_for_user(&state.db, user.id, RECENT_TRIPS).await?;
    Ok(Json(TripStats {
        total_trips,
        total_distance,
        total_duration,
        recent_trips: recent.iter().map(TripSummary::from).collect(),
    }))
}

#[derive(Debug, Serialize)]
struct TripTypeEntry {
    value: &'static str,
    label: &'static str,
}

async fn trip_types() -> Json<Vec<TripTypeEntry>> {
    Json(
        TripType::ALL
            .iter()
            .map(|trip_type| TripTypeEntry {
                value: trip_type.as_str(),
                label: trip_type.label(),
            })
            .collect(),
    )
}

async fn checklist_categories() -> Json<BTreeMap<&'static str, CategoryInfo>> {
    Json(CATEGORIES.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_checklist_uses_trip_facts() {
        let fields = TripFields {
            title: "Tour".into(),
            start_location: "Tokyo".into(),
            end_location: "Paris".into(),
            start_date: chrono::NaiveDate::from_ymd_opt(2025, 5, 1),
            end_date: chrono::NaiveDate::from_ymd_opt(2025, 5, 20),
            travelers: 2,
            waypoints: Vec::new(),
            trip_type: "business".into(),
            total_distance: 0.0,
            total_duration: 0,
        };
        let items = generated_checklist(&fields);
        let texts: Vec<&str> = items.iter().map(|item| item.text.as_str()).collect();
        assert!(texts.contains(&"Arrange mail hold/forwarding"));
        assert!(texts.contains(&"Notify employers/schools of extended absence"));
        assert!(texts.contains(&"Check visa requirements"));
        assert_eq!(items.first().map(|item| item.id), Some(1));
        assert_eq!(items.last().map(|item| item.id), Some(items.len() as i64));
    }

    #[tokio::test]
    async fn category_table_has_every_tag() {
        let Json(table) = checklist_categories().await;
        assert_eq!(table.len(), 22);
        assert!(table.contains_key("permits"));
    }
}
