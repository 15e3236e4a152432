use chrono::Utc;
use sqlx::types::Json;

use crate::{
    db::{contains_pattern, DbPool},
    error::AppError,
    models::{
        checklist::ChecklistItem,
        trip::{Trip, TripFields},
    },
    services::route_data::StoredRouteData,
};

pub async fn insert(
    db: &DbPool,
    user_id: i64,
    fields: &TripFields,
    route_data: Option<StoredRouteData>,
    checklist: &[ChecklistItem],
) -> Result<Trip, AppError> {
    let now = Utc::now();
    let trip = sqlx::query_as::<_, Trip>(
        r#"INSERT INTO trips (
               user_id, title, start_location, end_location, start_date, end_date, travelers,
               waypoints, trip_type, route_data, checklist_data, total_distance, total_duration,
               created_at, updated_at
           )
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           RETURNING *"#,
    )
    .bind(user_id)
    .bind(&fields.title)
    .bind(&fields.start_location)
    .bind(&fields.end_location)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(fields.travelers)
    .bind(Json(&fields.waypoints))
    .bind(&fields.trip_type)
    .bind(route_data.map(Json))
    .bind(Json(checklist))
    .bind(fields.total_distance)
    .bind(fields.total_duration)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await?;
    Ok(trip)
}

/// Newest first, optionally filtered by a case-insensitive search over the
/// title and both end points.
pub async fn list_for_user(
    db: &DbPool,
    user_id: i64,
    search: Option<&str>,
) -> Result<Vec<Trip>, AppError> {
    let pattern = search
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(contains_pattern);
    let trips = sqlx::query_as::<_, Trip>(
        r#"SELECT * FROM trips
           WHERE user_id = ?
             AND (? IS NULL
                  OR title LIKE ? ESCAPE '\'
                  OR start_location LIKE ? ESCAPE '\'
                  OR end_location LIKE ? ESCAPE '\')
           ORDER BY created_at DESC, id DESC"#,
    )
    .bind(user_id)
    .bind(pattern.as_deref())
    .bind(pattern.as_deref())
    .bind(pattern.as_deref())
    .bind(pattern.as_deref())
    .fetch_all(db)
    .await?;
    Ok(trips)
}

pub async fn recent_for_user(db: &DbPool, user_id: i64, limit: i64) -> Result<Vec<Trip>, AppError> {
    let trips = sqlx::query_as::<_, Trip>(
        "SELECT * FROM trips WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(trips)
}

/// Count, summed distance and summed duration over the user's trips.
pub async fn totals_for_user(db: &DbPool, user_id: i64) -> Result<(i64, f64, i64), AppError> {
    let totals = sqlx::query_as::<_, (i64, f64, i64)>(
        r#"SELECT COUNT(*),
                  COALESCE(SUM(total_distance), 0.0),
                  COALESCE(SUM(total_duration), 0)
           FROM trips WHERE user_id = ?"#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(totals)
}

pub async fn find_for_user(db: &DbPool, user_id: i64, trip_id: i64) -> Result<Trip, AppError> {
    sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = ? AND user_id = ?")
        .bind(trip_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound)
}

/// Writes the scalar columns back; `route_data` is only touched when it is
/// `Some`, and `Some(None)` clears it.
pub async fn save(
    db: &DbPool,
    trip_id: i64,
    fields: &TripFields,
    route_data: Option<Option<StoredRouteData>>,
) -> Result<Trip, AppError> {
    let mut tx = db.begin().await?;
    let updated = sqlx::query(
        r#"UPDATE trips
           SET title = ?, start_location = ?, end_location = ?, start_date = ?, end_date = ?,
               travelers = ?, waypoints = ?, trip_type = ?, total_distance = ?,
               total_duration = ?, updated_at = ?
           WHERE id = ?"#,
    )
    .bind(&fields.title)
    .bind(&fields.start_location)
    .bind(&fields.end_location)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(fields.travelers)
    .bind(Json(&fields.waypoints))
    .bind(&fields.trip_type)
    .bind(fields.total_distance)
    .bind(fields.total_duration)
    .bind(Utc::now())
    .bind(trip_id)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Some(route_data) = route_data {
        sqlx::query("UPDATE trips SET route_data = ? WHERE id = ?")
            .bind(route_data.map(Json))
            .bind(trip_id)
            .execute(&mut *tx)
            .await?;
    }

    let saved = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = ?")
        .bind(trip_id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(saved)
}

pub async fn update_checklist(
    db: &DbPool,
    trip_id: i64,
    trip_type: &str,
    checklist: &[ChecklistItem],
) -> Result<Trip, AppError> {
    let trip = sqlx::query_as::<_, Trip>(
        r#"UPDATE trips SET trip_type = ?, checklist_data = ?, updated_at = ?
           WHERE id = ?
           RETURNING *"#,
    )
    .bind(trip_type)
    .bind(Json(checklist))
    .bind(Utc::now())
    .bind(trip_id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound)?;
    Ok(trip)
}

pub async fn delete(db: &DbPool, trip_id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM trips WHERE id = ?")
        .bind(trip_id)
        .execute(db)
        .await?;
    Ok(())
}
