use chrono::Utc;

use crate::{
    db::DbPool,
    error::AppError,
    models::media::{NewMedia, TripMedia},
};

/// Media of a trip ordered by the day it is shown on, then time, then upload.
pub async fn list_for_trip(
    db: &DbPool,
    trip_id: i64,
    stop_index: Option<i64>,
) -> Result<Vec<TripMedia>, AppError> {
    let media = sqlx::query_as::<_, TripMedia>(
        r#"SELECT * FROM trip_media
           WHERE trip_id = ? AND (? IS NULL OR stop_index = ?)
           ORDER BY stop_index, custom_date, custom_time, uploaded_at DESC"#,
    )
    .bind(trip_id)
    .bind(stop_index)
    .bind(stop_index)
    .fetch_all(db)
    .await?;
    Ok(media)
}

pub async fn find(db: &DbPool, trip_id: i64, media_id: i64) -> Result<TripMedia, AppError> {
    sqlx::query_as::<_, TripMedia>("SELECT * FROM trip_media WHERE id = ? AND trip_id = ?")
        .bind(media_id)
        .bind(trip_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn insert(db: &DbPool, trip_id: i64, media: NewMedia) -> Result<TripMedia, AppError> {
    let created = sqlx::query_as::<_, TripMedia>(
        r#"INSERT INTO trip_media (
               trip_id, stop_index, media_type, file, title, description, notes,
               latitude, longitude, custom_date, custom_time, uploaded_at
           )
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           RETURNING *"#,
    )
    .bind(trip_id)
    .bind(media.stop_index)
    .bind(media.media_type.as_str())
    .bind(media.file)
    .bind(media.title)
    .bind(media.description)
    .bind(media.notes)
    .bind(media.latitude)
    .bind(media.longitude)
    .bind(media.custom_date)
    .bind(media.custom_time)
    .bind(Utc::now())
    .fetch_one(db)
    .await?;
    Ok(created)
}

/// Writes the editable metadata back. The stored file never changes.
pub async fn save(db: &DbPool, media: &TripMedia) -> Result<TripMedia, AppError> {
    let saved = sqlx::query_as::<_, TripMedia>(
        r#"UPDATE trip_media
           SET stop_index = ?, title = ?, description = ?, notes = ?,
               latitude = ?, longitude = ?, custom_date = ?, custom_time = ?
           WHERE id = ?
           RETURNING *"#,
    )
    .bind(media.stop_index)
    .bind(&media.title)
    .bind(&media.description)
    .bind(&media.notes)
    .bind(media.latitude)
    .bind(media.longitude)
    .bind(media.custom_date)
    .bind(media.custom_time)
    .bind(media.id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound)?;
    Ok(saved)
}

pub async fn delete(db: &DbPool, media_id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM trip_media WHERE id = ?")
        .bind(media_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Stored file paths of every media item of a trip, for cleanup before the
/// trip row cascades away.
pub async fn files_for_trip(db: &DbPool, trip_id: i64) -> Result<Vec<String>, AppError> {
    let files = sqlx::query_scalar("SELECT file FROM trip_media WHERE trip_id = ?")
        .bind(trip_id)
        .fetch_all(db)
        .await?;
    Ok(files)
}

pub async fn count_for_trip(db: &DbPool, trip_id: i64) -> Result<i64, AppError> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM trip_media WHERE trip_id = ?")
        .bind(trip_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}
