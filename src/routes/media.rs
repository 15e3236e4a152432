use std::collections::HashMap;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    auth::CurrentUser,
    db,
    error::{AppError, FieldErrors},
    models::media::{
        group_by_day, MediaResponse, MediaType, MediaUpdate, NewMedia, Timeline, TripMedia,
    },
    routes::ApiJson,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/media", get(list_media).post(upload_media))
        .route("/:id/media/:media_id", patch(update_media).delete(delete_media))
        .route("/:id/timeline", get(timeline))
}

#[derive(Debug, Deserialize)]
struct StopFilter {
    stop_index: Option<i64>,
}

fn respond(state: &AppState, media: &TripMedia) -> MediaResponse {
    MediaResponse::new(media, state.storage.file_url(&media.file))
}

async fn list_media(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    Query(filter): Query<StopFilter>,
) -> Result<Json<Vec<MediaResponse>>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;
    let media = db::media::list_for_trip(&state.db, trip.id, filter.stop_index).await?;
    Ok(Json(media.iter().map(|item| respond(&state, item)).collect()))
}

struct UploadedFile {
    name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Metadata of an upload, validated before the file touches the disk.
#[derive(Debug, Clone, PartialEq)]
struct MediaMeta {
    stop_index: i64,
    media_type: MediaType,
    title: String,
    description: String,
    notes: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    custom_date: Option<NaiveDate>,
    custom_time: Option<NaiveTime>,
}

impl MediaMeta {
    fn into_new_media(self, file: String) -> NewMedia {
        NewMedia {
            stop_index: self.stop_index,
            media_type: self.media_type,
            file,
            title: self.title,
            description: self.description,
            notes: self.notes,
            latitude: self.latitude,
            longitude: self.longitude,
            custom_date: self.custom_date,
            custom_time: self.custom_time,
        }
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::BadRequest(err.body_text())
}

async fn upload_media(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MediaResponse>), AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;

    let mut text = HashMap::new();
    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "file" {
            let original = field.file_name().unwrap_or("upload").to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            file = Some(UploadedFile {
                name: original,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            text.insert(name, value);
        }
    }

    let mut errors = FieldErrors::new();
    let meta = parse_meta(&text, file.as_ref().and_then(|f| f.content_type.as_deref()));
    let file = match file {
        Some(file) if !file.bytes.is_empty() => Some(file),
        Some(_) => {
            errors.add("file", "The submitted file is empty.");
            None
        }
        None => {
            errors.add("file", "No file was submitted.");
            None
        }
    };
    let (meta, file) = match (meta, file) {
        (Ok(meta), Some(file)) if errors.is_empty() => (meta, file),
        (Err(meta_errors), _) => {
            errors.extend(meta_errors);
            return Err(errors.into());
        }
        _ => return Err(errors.into()),
    };

    let stored = state.storage.save(&file.name, &file.bytes).await?;
    let media = match db::media::insert(&state.db, trip.id, meta.into_new_media(stored.clone())).await
    {
        Ok(media) => media,
        Err(err) => {
            if let Err(cleanup) = state.storage.delete(&stored).await {
                warn!(file = %stored, "failed to remove orphaned upload: {cleanup}");
            }
            return Err(err);
        }
    };

    info!(trip_id = trip.id, media_id = media.id, kind = %media.media_type, "media uploaded");
    Ok((StatusCode::CREATED, Json(respond(&state, &media))))
}

fn parse_meta(
    text: &HashMap<String, String>,
    content_type: Option<&str>,
) -> Result<MediaMeta, FieldErrors> {
    let mut errors = FieldErrors::new();
    let value = |key: &str| {
        text.get(key)
            .map(|raw| raw.trim())
            .filter(|raw| !raw.is_empty())
    };

    let stop_index = match value("stop_index").map(str::parse::<i64>) {
        Some(Ok(index)) if index >= 0 => index,
        Some(Ok(_)) => {
            errors.add("stop_index", "Ensure this value is greater than or equal to 0.");
            0
        }
        Some(Err(_)) => {
            errors.add("stop_index", "A valid integer is required.");
            0
        }
        None => {
            errors.add("stop_index", "This field is required.");
            0
        }
    };

    let media_type = match value("media_type") {
        Some(raw) => raw.parse::<MediaType>().map_err(|msg| errors.add("media_type", msg)).ok(),
        None => match content_type.and_then(media_type_for) {
            Some(kind) => Some(kind),
            None => {
                errors.add("media_type", "This field is required.");
                None
            }
        },
    };

    let latitude = parse_coordinate(&mut errors, "latitude", value("latitude"), 90.0);
    let longitude = parse_coordinate(&mut errors, "longitude", value("longitude"), 180.0);

    let custom_date = value("custom_date").and_then(|raw| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| errors.add("custom_date", "Date has wrong format. Use YYYY-MM-DD."))
            .ok()
    });
    let custom_time = value("custom_time").and_then(|raw| {
        let parsed = parse_time(raw);
        if parsed.is_none() {
            errors.add("custom_time", "Time has wrong format. Use hh:mm[:ss].");
        }
        parsed
    });

    let text_field = |key: &str| value(key).unwrap_or_default().to_string();
    let title = text_field("title");
    if title.chars().count() > 200 {
        errors.add("title", "Ensure this field has no more than 200 characters.");
    }

    match media_type {
        Some(media_type) if errors.is_empty() => Ok(MediaMeta {
            stop_index,
            media_type,
            title,
            description: text_field("description"),
            notes: text_field("notes"),
            latitude,
            longitude,
            custom_date,
            custom_time,
        }),
        _ => Err(errors),
    }
}

fn media_type_for(content_type: &str) -> Option<MediaType> {
    match content_type.split('/').next()? {
        "image" => Some(MediaType::Photo),
        "video" => Some(MediaType::Video),
        "audio" => Some(MediaType::Audio),
        _ => None,
    }
}

fn parse_coordinate(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<&str>,
    limit: f64,
) -> Option<f64> {
    let raw = raw?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() <= limit => Some(value),
        Ok(_) => {
            errors.add(field, format!("Ensure this value is between -{limit} and {limit}."));
            None
        }
        Err(_) => {
            errors.add(field, "A valid number is required.");
            None
        }
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

async fn update_media(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, media_id)): Path<(i64, i64)>,
    ApiJson(update): ApiJson<MediaUpdate>,
) -> Result<Json<MediaResponse>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;
    let mut media = db::media::find(&state.db, trip.id, media_id).await?;

    apply_update(&mut media, update)?;
    let saved = db::media::save(&state.db, &media).await?;
    Ok(Json(respond(&state, &saved)))
}

fn apply_update(media: &mut TripMedia, update: MediaUpdate) -> Result<(), FieldErrors> {
    let mut errors = match update.validate() {
        Ok(()) => FieldErrors::new(),
        Err(err) => FieldErrors::from(err),
    };
    if let Some(stop_index) = update.stop_index {
        media.stop_index = stop_index;
    }
    if let Some(title) = update.title {
        media.title = title.trim().to_string();
    }
    if let Some(description) = update.description {
        media.description = description;
    }
    if let Some(notes) = update.notes {
        media.notes = notes;
    }
    if let Some(latitude) = update.latitude {
        if latitude.is_some_and(|lat| lat.abs() > 90.0) {
            errors.add("latitude", "Ensure this value is between -90 and 90.");
        }
        media.latitude = latitude;
    }
    if let Some(longitude) = update.longitude {
        if longitude.is_some_and(|lng| lng.abs() > 180.0) {
            errors.add("longitude", "Ensure this value is between -180 and 180.");
        }
        media.longitude = longitude;
    }
    if let Some(custom_date) = update.custom_date {
        media.custom_date = custom_date;
    }
    if let Some(custom_time) = update.custom_time {
        media.custom_time = custom_time;
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

async fn delete_media(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((trip_id, media_id)): Path<(i64, i64)>,
) -> Result<StatusCode, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;
    let media = db::media::find(&state.db, trip.id, media_id).await?;

    db::media::delete(&state.db, media.id).await?;
    if let Err(err) = state.storage.delete(&media.file).await {
        warn!(media_id = media.id, file = %media.file, "failed to remove media file: {err}");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn timeline(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(trip_id): Path<i64>,
) -> Result<Json<Timeline>, AppError> {
    let user = current.require_user()?;
    let trip = db::trips::find_for_user(&state.db, user.id, trip_id).await?;
    let media = db::media::list_for_trip(&state.db, trip.id, None).await?;

    let items = media.iter().map(|item| respond(&state, item)).collect();
    Ok(Json(Timeline {
        id: trip.id,
        title: trip.title.clone(),
        start_location: trip.start_location.clone(),
        end_location: trip.end_location.clone(),
        start_date: trip.start_date,
        end_date: trip.end_date,
        duration_days: trip.duration_days(),
        media_items: group_by_day(items, trip.start_date, trip.end_date),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn parses_a_complete_form() {
        let meta = parse_meta(
            &form(&[
                ("stop_index", "2"),
                ("media_type", "Photo"),
                ("title", " Sunset "),
                ("latitude", "43.7"),
                ("longitude", "7.26"),
                ("custom_date", "2025-08-01"),
                ("custom_time", "19:45"),
            ]),
            None,
        )
        .expect("valid form");
        assert_eq!(meta.stop_index, 2);
        assert_eq!(meta.media_type, MediaType::Photo);
        assert_eq!(meta.title, "Sunset");
        assert_eq!(meta.latitude, Some(43.7));
        assert_eq!(meta.custom_time, NaiveTime::from_hms_opt(19, 45, 0));
    }

    #[test]
    fn media_type_falls_back_to_content_type() {
        let meta = parse_meta(&form(&[("stop_index", "0")]), Some("video/mp4")).expect("valid");
        assert_eq!(meta.media_type, MediaType::Video);

        let errors = parse_meta(&form(&[("stop_index", "0")]), Some("application/pdf"))
            .unwrap_err();
        assert!(errors.contains("media_type"));
    }

    #[test]
    fn reports_every_bad_field() {
        let errors = parse_meta(
            &form(&[
                ("stop_index", "-1"),
                ("media_type", "gif"),
                ("latitude", "123"),
                ("custom_date", "01/08/2025"),
                ("custom_time", "late"),
            ]),
            None,
        )
        .unwrap_err();
        for field in ["stop_index", "media_type", "latitude", "custom_date", "custom_time"] {
            assert!(errors.contains(field), "missing error for {field}");
        }
    }

    #[test]
    fn update_can_clear_optional_fields() {
        let mut media = TripMedia {
            id: 1,
            trip_id: 1,
            stop_index: 0,
            media_type: "photo".into(),
            file: "trip_media/a.jpg".into(),
            title: String::new(),
            description: String::new(),
            notes: String::new(),
            latitude: Some(1.0),
            longitude: Some(2.0),
            custom_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            custom_time: None,
            uploaded_at: chrono::Utc::now(),
        };
        let update: MediaUpdate =
            serde_json::from_str(r#"{"latitude": null, "custom_date": null, "notes": "n"}"#)
                .expect("parse");
        apply_update(&mut media, update).expect("valid");
        assert_eq!(media.latitude, None);
        assert_eq!(media.longitude, Some(2.0));
        assert_eq!(media.custom_date, None);
        assert_eq!(media.notes, "n");
    }
}
