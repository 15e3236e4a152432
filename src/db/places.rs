use chrono::Utc;
use sqlx::types::Json;

use crate::{
    db::DbPool,
    error::AppError,
    models::place::{NewPlace, TripPlace},
};

pub const DUPLICATE_PLACE: &str = "This place is already saved for this trip.";

pub async fn list_for_trip(
    db: &DbPool,
    trip_id: i64,
    stop_index: Option<i64>,
) -> Result<Vec<TripPlace>, AppError> {
    let places = sqlx::query_as::<_, TripPlace>(
        r#"SELECT * FROM trip_places
           WHERE trip_id = ? AND (? IS NULL OR stop_index = ?)
           ORDER BY stop_index, created_at, id"#,
    )
    .bind(trip_id)
    .bind(stop_index)
    .bind(stop_index)
    .fetch_all(db)
    .await?;
    Ok(places)
}

pub async fn find(db: &DbPool, trip_id: i64, id: i64) -> Result<TripPlace, AppError> {
    sqlx::query_as::<_, TripPlace>("SELECT * FROM trip_places WHERE id = ? AND trip_id = ?")
        .bind(id)
        .bind(trip_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound)
}

/// Fails with a conflict when the trip already has this external place.
pub async fn insert(db: &DbPool, trip_id: i64, place: NewPlace) -> Result<TripPlace, AppError> {
    let now = Utc::now();
    sqlx::query_as::<_, TripPlace>(
        r#"INSERT INTO trip_places (
               trip_id, stop_index, place_id, name, address, latitude, longitude, rating,
               user_ratings_total, phone, website, types, user_notes, created_at, updated_at
           )
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           RETURNING *"#,
    )
    .bind(trip_id)
    .bind(place.stop_index)
    .bind(place.place_id)
    .bind(place.name)
    .bind(place.address)
    .bind(place.latitude)
    .bind(place.longitude)
    .bind(place.rating)
    .bind(place.user_ratings_total)
    .bind(place.phone)
    .bind(place.website)
    .bind(Json(place.types))
    .bind(place.user_notes)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await
    .map_err(|err| AppError::conflict_on_unique(err, DUPLICATE_PLACE))
}

/// Writes the user-editable fields back.
pub async fn save(db: &DbPool, place: &TripPlace) -> Result<TripPlace, AppError> {
    let saved = sqlx::query_as::<_, TripPlace>(
        r#"UPDATE trip_places
           SET stop_index = ?, user_notes = ?, is_visited = ?, visit_date = ?, user_rating = ?,
               updated_at = ?
           WHERE id = ?
           RETURNING *"#,
    )
    .bind(place.stop_index)
    .bind(&place.user_notes)
    .bind(place.is_visited)
    .bind(place.visit_date)
    .bind(place.user_rating)
    .bind(Utc::now())
    .bind(place.id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound)?;
    Ok(saved)
}

pub async fn delete(db: &DbPool, id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM trip_places WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}
