use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow};
use validator::Validate;

use crate::{
    error::FieldErrors,
    models::checklist::ChecklistItem,
    services::{
        geo,
        route_data::{self, StoredRouteData},
    },
};

pub const DEFAULT_TRIP_TYPE: &str = "leisure";

#[derive(Debug, Clone, FromRow)]
pub struct Trip {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub start_location: String,
    pub end_location: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub travelers: i64,
    pub waypoints: Json<Vec<String>>,
    pub trip_type: String,
    pub route_data: Option<Json<StoredRouteData>>,
    pub checklist_data: Json<Vec<ChecklistItem>>,
    pub total_distance: f64,
    pub total_duration: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn duration_days(&self) -> i64 {
        duration_days(self.start_date, self.end_date)
    }

    /// Start, waypoints and end, in travel order.
    pub fn locations(&self) -> Vec<&str> {
        std::iter::once(self.start_location.as_str())
            .chain(self.waypoints.iter().map(String::as_str))
            .chain(std::iter::once(self.end_location.as_str()))
            .collect()
    }

    pub fn is_international(&self) -> bool {
        geo::is_international(&self.locations())
    }

    pub fn checklist(&self) -> &[ChecklistItem] {
        &self.checklist_data.0
    }

    pub fn stored_route_data(&self) -> Option<&StoredRouteData> {
        self.route_data.as_ref().map(|json| &json.0)
    }

    pub fn fields(&self) -> TripFields {
        TripFields {
            title: self.title.clone(),
            start_location: self.start_location.clone(),
            end_location: self.end_location.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            travelers: self.travelers,
            waypoints: self.waypoints.0.clone(),
            trip_type: self.trip_type.clone(),
            total_distance: self.total_distance,
            total_duration: self.total_duration,
        }
    }
}

/// Editable scalar columns of a trip. Route data and the checklist travel
/// separately because they are transformed before storage.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct TripFields {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub start_location: String,
    #[validate(length(min = 1, max = 200))]
    pub end_location: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(range(min = 1, message = "Ensure this value is greater than or equal to 1."))]
    pub travelers: i64,
    pub waypoints: Vec<String>,
    #[validate(length(max = 20))]
    pub trip_type: String,
    #[validate(range(min = 0.0, message = "Ensure this value is greater than or equal to 0."))]
    pub total_distance: f64,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub total_duration: i64,
}

impl TripFields {
    pub fn from_new(new: &NewTrip) -> Self {
        Self {
            title: new.title.trim().to_string(),
            start_location: new.start_location.trim().to_string(),
            end_location: new.end_location.trim().to_string(),
            start_date: new.start_date,
            end_date: new.end_date,
            travelers: new.travelers,
            waypoints: clean_waypoints(&new.waypoints),
            trip_type: trip_type_or_default(new.trip_type.as_deref()),
            total_distance: new.total_distance,
            total_duration: new.total_duration,
        }
    }

    /// Applies every field present in `update`; `route_data` is left to the
    /// caller.
    pub fn apply(&mut self, update: &TripUpdate) {
        if let Some(title) = &update.title {
            self.title = title.trim().to_string();
        }
        if let Some(start) = &update.start_location {
            self.start_location = start.trim().to_string();
        }
        if let Some(end) = &update.end_location {
            self.end_location = end.trim().to_string();
        }
        if let Some(start_date) = update.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            self.end_date = end_date;
        }
        if let Some(travelers) = update.travelers {
            self.travelers = travelers;
        }
        if let Some(waypoints) = &update.waypoints {
            self.waypoints = clean_waypoints(waypoints);
        }
        if let Some(trip_type) = &update.trip_type {
            self.trip_type = trip_type_or_default(Some(trip_type));
        }
        if let Some(distance) = update.total_distance {
            self.total_distance = distance;
        }
        if let Some(duration) = update.total_duration {
            self.total_duration = duration;
        }
    }

    /// Field rules plus the date ordering, reported together.
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(err) => FieldErrors::from(err),
        };
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.add("end_date", "End date must be on or after the start date.");
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Day count when both dates are set.
    pub fn known_duration(&self) -> Option<i64> {
        self.start_date
            .zip(self.end_date)
            .map(|(start, end)| duration_days(Some(start), Some(end)))
    }

    pub fn is_international(&self) -> bool {
        let locations: Vec<&str> = std::iter::once(self.start_location.as_str())
            .chain(self.waypoints.iter().map(String::as_str))
            .chain(std::iter::once(self.end_location.as_str()))
            .collect();
        geo::is_international(&locations)
    }
}

fn clean_waypoints(waypoints: &[String]) -> Vec<String> {
    waypoints
        .iter()
        .map(|waypoint| waypoint.trim())
        .filter(|waypoint| !waypoint.is_empty())
        .map(str::to_string)
        .collect()
}

fn trip_type_or_default(tag: Option<&str>) -> String {
    match tag.map(str::trim) {
        Some(tag) if !tag.is_empty() => tag.to_string(),
        _ => DEFAULT_TRIP_TYPE.to_string(),
    }
}

pub fn duration_days(start: Option<NaiveDate>, end: Option<NaiveDate>) -> i64 {
    match (start, end) {
        (Some(start), Some(end)) => (end - start).num_days() + 1,
        _ => 0,
    }
}

/// Lightweight listing view without the route and checklist documents.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TripSummary {
    pub id: i64,
    pub title: String,
    pub start_location: String,
    pub end_location: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub travelers: i64,
    pub waypoints: Vec<String>,
    pub trip_type: String,
    pub total_distance: f64,
    pub total_duration: i64,
    pub duration_days: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Trip> for TripSummary {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id,
            title: trip.title.clone(),
            start_location: trip.start_location.clone(),
            end_location: trip.end_location.clone(),
            start_date: trip.start_date,
            end_date: trip.end_date,
            travelers: trip.travelers,
            waypoints: trip.waypoints.0.clone(),
            trip_type: trip.trip_type.clone(),
            total_distance: trip.total_distance,
            total_duration: trip.total_duration,
            duration_days: trip.duration_days(),
            created_at: trip.created_at,
            updated_at: trip.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TripDetail {
    #[serde(flatten)]
    pub summary: TripSummary,
    pub route_data: Option<Value>,
    pub checklist_data: Vec<ChecklistItem>,
}

impl From<&Trip> for TripDetail {
    fn from(trip: &Trip) -> Self {
        Self {
            summary: TripSummary::from(trip),
            route_data: route_data::expand(trip.stored_route_data()),
            checklist_data: trip.checklist().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TripStats {
    pub total_trips: i64,
    pub total_distance: f64,
    pub total_duration: i64,
    pub recent_trips: Vec<TripSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrip {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub start_location: String,
    #[serde(default)]
    pub end_location: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_travelers")]
    pub travelers: i64,
    #[serde(default)]
    pub waypoints: Vec<String>,
    pub trip_type: Option<String>,
    pub route_data: Option<Value>,
    #[serde(default)]
    pub total_distance: f64,
    #[serde(default)]
    pub total_duration: i64,
    pub checklist_data: Option<Vec<Value>>,
}

fn default_travelers() -> i64 {
    1
}

/// Partial update. Doubly optional fields distinguish "leave as is" from an
/// explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripUpdate {
    pub title: Option<String>,
    pub start_location: Option<String>,
    pub end_location: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub end_date: Option<Option<NaiveDate>>,
    pub travelers: Option<i64>,
    pub waypoints: Option<Vec<String>>,
    pub trip_type: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub route_data: Option<Option<Value>>,
    pub total_distance: Option<f64>,
    pub total_duration: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn duration_counts_both_ends() {
        assert_eq!(duration_days(date(2025, 6, 1), date(2025, 6, 10)), 10);
        assert_eq!(duration_days(date(2025, 6, 1), date(2025, 6, 1)), 1);
        assert_eq!(duration_days(date(2025, 6, 1), None), 0);
        assert_eq!(duration_days(None, None), 0);
    }

    fn new_trip(value: serde_json::Value) -> NewTrip {
        serde_json::from_value(value).expect("new trip")
    }

    #[test]
    fn new_trip_fields_are_normalised() {
        let fields = TripFields::from_new(&new_trip(serde_json::json!({
            "title": "  Alps ",
            "start_location": "Munich",
            "end_location": "Zurich",
            "waypoints": ["Innsbruck", "  ", " Vaduz "],
            "trip_type": ""
        })));
        assert_eq!(fields.title, "Alps");
        assert_eq!(fields.waypoints, ["Innsbruck", "Vaduz"]);
        assert_eq!(fields.trip_type, DEFAULT_TRIP_TYPE);
        assert_eq!(fields.travelers, 1);
        assert!(fields.check().is_ok());
    }

    #[test]
    fn unknown_trip_type_is_kept_verbatim() {
        let fields = TripFields::from_new(&new_trip(serde_json::json!({
            "title": "x", "start_location": "a", "end_location": "b", "trip_type": "pilgrimage"
        })));
        assert_eq!(fields.trip_type, "pilgrimage");
    }

    #[test]
    fn validation_reports_each_field() {
        let fields = TripFields::from_new(&new_trip(serde_json::json!({
            "title": "",
            "start_location": "Oslo",
            "end_location": "",
            "travelers": 0,
            "start_date": "2025-06-10",
            "end_date": "2025-06-01"
        })));
        let errors = fields.check().unwrap_err();
        for field in ["title", "end_location", "travelers", "end_date"] {
            assert!(errors.contains(field), "missing error for {field}");
        }
        assert!(!errors.contains("start_location"));
    }

    #[test]
    fn locations_are_limited_to_two_hundred_chars() {
        let mut fields = TripFields::from_new(&new_trip(serde_json::json!({
            "title": "x", "start_location": "a".repeat(200), "end_location": "b"
        })));
        assert!(fields.check().is_ok());

        fields.end_location = "b".repeat(201);
        let errors = fields.check().unwrap_err();
        assert_eq!(
            errors.messages("end_location"),
            ["Ensure this field has no more than 200 characters."]
        );
        assert!(!errors.contains("start_location"));
    }

    #[test]
    fn negative_totals_are_rejected() {
        let fields = TripFields::from_new(&new_trip(serde_json::json!({
            "title": "x", "start_location": "a", "end_location": "b",
            "total_distance": -1.5, "total_duration": -10
        })));
        let errors = fields.check().unwrap_err();
        assert!(errors.contains("total_distance"));
        assert!(errors.contains("total_duration"));
    }

    #[test]
    fn apply_clears_dates_on_null() {
        let mut fields = TripFields::from_new(&new_trip(serde_json::json!({
            "title": "x", "start_location": "a", "end_location": "b",
            "start_date": "2025-06-01", "end_date": "2025-06-20"
        })));
        assert_eq!(fields.known_duration(), Some(20));

        let update: TripUpdate =
            serde_json::from_str(r#"{"end_date": null, "travelers": 3}"#).expect("parse");
        fields.apply(&update);
        assert_eq!(fields.end_date, None);
        assert_eq!(fields.known_duration(), None);
        assert_eq!(fields.travelers, 3);
        assert_eq!(fields.title, "x");
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let update: TripUpdate =
            serde_json::from_str(r#"{"start_date": null, "title": "x"}"#).expect("parse");
        assert_eq!(update.start_date, Some(None));
        assert_eq!(update.end_date, None);
        assert!(update.route_data.is_none());
    }
}
