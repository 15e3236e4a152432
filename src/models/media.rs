use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Photo,
    Video,
    Audio,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photo" => Ok(MediaType::Photo),
            "video" => Ok(MediaType::Video),
            "audio" => Ok(MediaType::Audio),
            other => Err(format!("\"{other}\" is not a valid media type.")),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TripMedia {
    pub id: i64,
    pub trip_id: i64,
    pub stop_index: i64,
    pub media_type: String,
    pub file: String,
    pub title: String,
    pub description: String,
    pub notes: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub custom_date: Option<NaiveDate>,
    pub custom_time: Option<NaiveTime>,
    pub uploaded_at: DateTime<Utc>,
}

impl TripMedia {
    /// Day the item belongs to on the trip timeline.
    pub fn timeline_date(&self) -> NaiveDate {
        self.custom_date
            .unwrap_or_else(|| self.uploaded_at.date_naive())
    }

    /// Moment used to order items; a custom date without a time means noon.
    pub fn display_datetime(&self) -> NaiveDateTime {
        match self.custom_date {
            Some(date) => date.and_time(self.custom_time.unwrap_or_else(noon)),
            None => self.uploaded_at.naive_utc(),
        }
    }
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MediaResponse {
    pub id: i64,
    pub trip_id: i64,
    pub stop_index: i64,
    pub media_type: String,
    pub file: String,
    pub file_url: String,
    pub title: String,
    pub description: String,
    pub notes: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub custom_date: Option<NaiveDate>,
    pub custom_time: Option<NaiveTime>,
    pub uploaded_at: DateTime<Utc>,
    pub timeline_date: NaiveDate,
    pub display_datetime: NaiveDateTime,
}

impl MediaResponse {
    pub fn new(media: &TripMedia, file_url: String) -> Self {
        Self {
            id: media.id,
            trip_id: media.trip_id,
            stop_index: media.stop_index,
            media_type: media.media_type.clone(),
            file: media.file.clone(),
            file_url,
            title: media.title.clone(),
            description: media.description.clone(),
            notes: media.notes.clone(),
            latitude: media.latitude,
            longitude: media.longitude,
            custom_date: media.custom_date,
            custom_time: media.custom_time,
            uploaded_at: media.uploaded_at,
            timeline_date: media.timeline_date(),
            display_datetime: media.display_datetime(),
        }
    }
}

/// Metadata accompanying an upload, already parsed from the multipart form.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub stop_index: i64,
    pub media_type: MediaType,
    pub file: String,
    pub title: String,
    pub description: String,
    pub notes: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub custom_date: Option<NaiveDate>,
    pub custom_time: Option<NaiveTime>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MediaUpdate {
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub stop_index: Option<i64>,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub longitude: Option<Option<f64>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub custom_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub custom_time: Option<Option<NaiveTime>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TimelineDay {
    pub date: NaiveDate,
    pub items: Vec<MediaResponse>,
}

/// Longest date range that is filled with empty days.
const MAX_FILLED_DAYS: i64 = 3660;

/// Groups media per timeline day, ordered by display time within a day.
///
/// When both trip dates are known every day of the range is present, even
/// without media. Days outside the range that carry media are kept too.
pub fn group_by_day(
    items: Vec<MediaResponse>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<TimelineDay> {
    let mut days: BTreeMap<NaiveDate, Vec<MediaResponse>> = BTreeMap::new();
    if let (Some(start), Some(end)) = (start, end) {
        if end >= start && (end - start).num_days() < MAX_FILLED_DAYS {
            for day in start.iter_days().take_while(|day| *day <= end) {
                days.entry(day).or_default();
            }
        }
    }
    for item in items {
        days.entry(item.timeline_date).or_default().push(item);
    }

    days.into_iter()
        .map(|(date, mut items)| {
            items.sort_by_key(|item| item.display_datetime);
            TimelineDay { date, items }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Timeline {
    pub id: i64,
    pub title: String,
    pub start_location: String,
    pub end_location: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration_days: i64,
    pub media_items: Vec<TimelineDay>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn media(custom_date: Option<NaiveDate>, custom_time: Option<NaiveTime>) -> TripMedia {
        TripMedia {
            id: 1,
            trip_id: 1,
            stop_index: 0,
            media_type: "photo".into(),
            file: "trip_media/a.jpg".into(),
            title: String::new(),
            description: String::new(),
            notes: String::new(),
            latitude: None,
            longitude: None,
            custom_date,
            custom_time,
            uploaded_at: Utc.with_ymd_and_hms(2025, 7, 4, 18, 30, 0).unwrap(),
        }
    }

    #[test]
    fn upload_timestamp_is_the_fallback() {
        let item = media(None, None);
        assert_eq!(item.timeline_date(), NaiveDate::from_ymd_opt(2025, 7, 4).unwrap());
        assert_eq!(item.display_datetime(), item.uploaded_at.naive_utc());
    }

    #[test]
    fn custom_date_defaults_to_noon() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let item = media(Some(day), None);
        assert_eq!(item.timeline_date(), day);
        assert_eq!(item.display_datetime(), day.and_hms_opt(12, 0, 0).unwrap());

        let evening = NaiveTime::from_hms_opt(20, 15, 0).unwrap();
        assert_eq!(media(Some(day), Some(evening)).display_datetime(), day.and_time(evening));
    }

    #[test]
    fn timeline_fills_the_trip_range() {
        let day = |d| NaiveDate::from_ymd_opt(2025, 7, d).unwrap();
        let late = MediaResponse::new(
            &media(Some(day(2)), NaiveTime::from_hms_opt(18, 0, 0)),
            "/media/a.jpg".into(),
        );
        let early = MediaResponse::new(
            &media(Some(day(2)), NaiveTime::from_hms_opt(8, 0, 0)),
            "/media/b.jpg".into(),
        );
        let after_trip = MediaResponse::new(&media(None, None), "/media/c.jpg".into());

        let days = group_by_day(vec![late, early, after_trip], Some(day(1)), Some(day(3)));
        let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
        assert_eq!(dates, [day(1), day(2), day(3), day(4)]);
        assert!(days[0].items.is_empty());
        assert_eq!(days[1].items[0].file_url, "/media/b.jpg");
        assert_eq!(days[3].items.len(), 1);
    }

    #[test]
    fn timeline_without_dates_only_has_media_days() {
        let days = group_by_day(
            vec![MediaResponse::new(&media(None, None), "/media/a.jpg".into())],
            None,
            None,
        );
        assert_eq!(days.len(), 1);
    }

    #[test]
    fn media_type_parses_case_insensitively() {
        assert_eq!("Photo".parse::<MediaType>(), Ok(MediaType::Photo));
        assert!("gif".parse::<MediaType>().is_err());
    }
}
