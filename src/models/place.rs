use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use validator::Validate;

use crate::error::FieldErrors;

#[derive(Debug, Clone, FromRow)]
pub struct TripPlace {
    pub id: i64,
    pub trip_id: i64,
    pub stop_index: i64,
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<i64>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub types: Json<Vec<String>>,
    pub user_notes: String,
    pub is_visited: bool,
    pub visit_date: Option<NaiveDate>,
    pub user_rating: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlaceResponse {
    pub id: i64,
    pub trip_id: i64,
    pub stop_index: i64,
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<i64>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub types: Vec<String>,
    pub user_notes: String,
    pub is_visited: bool,
    pub visit_date: Option<NaiveDate>,
    pub user_rating: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TripPlace> for PlaceResponse {
    fn from(place: &TripPlace) -> Self {
        Self {
            id: place.id,
            trip_id: place.trip_id,
            stop_index: place.stop_index,
            place_id: place.place_id.clone(),
            name: place.name.clone(),
            address: place.address.clone(),
            latitude: place.latitude,
            longitude: place.longitude,
            rating: place.rating,
            user_ratings_total: place.user_ratings_total,
            phone: place.phone.clone(),
            website: place.website.clone(),
            types: place.types.0.clone(),
            user_notes: place.user_notes.clone(),
            is_visited: place.is_visited,
            visit_date: place.visit_date,
            user_rating: place.user_rating,
            created_at: place.created_at,
            updated_at: place.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A place as submitted by the client. Coordinates arrive either as a
/// `location` object or as flat `latitude`/`longitude` fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PlaceInput {
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub place_id: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub stop_index: Option<i64>,
    pub location: Option<LatLng>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5."))]
    pub rating: Option<f64>,
    pub user_ratings_total: Option<i64>,
    pub phone: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub user_notes: String,
}

/// Validated form of [`PlaceInput`], ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlace {
    pub stop_index: i64,
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<i64>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub types: Vec<String>,
    pub user_notes: String,
}

impl PlaceInput {
    pub fn into_new_place(self) -> Result<NewPlace, FieldErrors> {
        let input = Self {
            place_id: self.place_id.trim().to_string(),
            name: self.name.trim().to_string(),
            ..self
        };
        let mut errors = match input.validate() {
            Ok(()) => FieldErrors::new(),
            Err(err) => FieldErrors::from(err),
        };
        let coordinates = input.coordinates().unwrap_or_else(|message| {
            errors.add("location", message);
            (0.0, 0.0)
        });
        if !errors.is_empty() {
            return Err(errors);
        }

        let (latitude, longitude) = coordinates;
        Ok(NewPlace {
            stop_index: input.stop_index.unwrap_or(0),
            place_id: input.place_id,
            name: input.name,
            address: input.address.trim().to_string(),
            latitude,
            longitude,
            rating: input.rating,
            user_ratings_total: input.user_ratings_total,
            phone: non_blank(input.phone),
            website: non_blank(input.website),
            types: input.types,
            user_notes: input.user_notes,
        })
    }

    /// The nested `location` wins over the flat pair.
    fn coordinates(&self) -> Result<(f64, f64), &'static str> {
        let (lat, lng) = match (self.location, self.latitude, self.longitude) {
            (Some(location), _, _) => (location.lat, location.lng),
            (None, Some(lat), Some(lng)) => (lat, lng),
            _ => return Err("Place coordinates are required."),
        };
        if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) {
            Ok((lat, lng))
        } else {
            Err("Coordinates are out of range.")
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PlaceUpdate {
    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub stop_index: Option<i64>,
    pub user_notes: Option<String>,
    pub is_visited: Option<bool>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub visit_date: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub user_rating: Option<Option<i64>>,
}

/// The rating a [`PlaceUpdate`] would store; `None` clears it.
#[derive(Validate)]
struct RatingChange {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5."))]
    user_rating: Option<i64>,
}

impl PlaceUpdate {
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Err(err) = self.validate() {
            errors.extend(err.into());
        }
        let rating = RatingChange {
            user_rating: self.user_rating.flatten(),
        };
        if let Err(err) = rating.validate() {
            errors.extend(err.into());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkPlaces {
    #[serde(default)]
    pub places: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BulkItemError {
    pub index: usize,
    pub place_id: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BulkSaveResult {
    pub saved: Vec<PlaceResponse>,
    pub errors: Vec<BulkItemError>,
    pub saved_count: usize,
    pub error_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlaceMarker {
    pub id: i64,
    pub place_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub stop_index: i64,
    pub is_visited: bool,
    pub rating: Option<f64>,
}

impl From<&TripPlace> for PlaceMarker {
    fn from(place: &TripPlace) -> Self {
        Self {
            id: place.id,
            place_id: place.place_id.clone(),
            name: place.name.clone(),
            latitude: place.latitude,
            longitude: place.longitude,
            stop_index: place.stop_index,
            is_visited: place.is_visited,
            rating: place.rating,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlacesMapData {
    pub trip_id: i64,
    pub total_places: usize,
    pub visited_count: usize,
    pub places: Vec<PlaceMarker>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn input(value: serde_json::Value) -> PlaceInput {
        serde_json::from_value(value).expect("place input")
    }

    #[test]
    fn accepts_nested_or_flat_coordinates() {
        let nested = input(json!({
            "place_id": "abc", "name": "Cafe", "location": {"lat": 1.5, "lng": 2.5}
        }))
        .into_new_place()
        .expect("valid");
        assert_eq!((nested.latitude, nested.longitude), (1.5, 2.5));

        let flat = input(json!({
            "place_id": "abc", "name": "Cafe", "latitude": -3.0, "longitude": 4.0, "stop_index": 2
        }))
        .into_new_place()
        .expect("valid");
        assert_eq!((flat.latitude, flat.longitude, flat.stop_index), (-3.0, 4.0, 2));
    }

    #[test]
    fn missing_coordinates_is_a_field_error() {
        let errors = input(json!({"place_id": "abc", "name": "Cafe", "latitude": 1.0}))
            .into_new_place()
            .unwrap_err();
        assert_eq!(errors.messages("location"), ["Place coordinates are required."]);
    }

    #[test]
    fn user_rating_must_be_one_to_five() {
        let update: PlaceUpdate = serde_json::from_value(json!({"user_rating": 6})).unwrap();
        assert!(update.check().unwrap_err().contains("user_rating"));
        let cleared: PlaceUpdate = serde_json::from_value(json!({"user_rating": null})).unwrap();
        assert!(cleared.check().is_ok());
        let moved: PlaceUpdate = serde_json::from_value(json!({"stop_index": -1})).unwrap();
        assert!(moved.check().unwrap_err().contains("stop_index"));
    }

    #[test]
    fn field_rules_and_coordinates_are_reported_together() {
        let errors = input(json!({
            "place_id": " ", "name": "Cafe", "rating": 7.5, "location": {"lat": 95.0, "lng": 0.0}
        }))
        .into_new_place()
        .unwrap_err();
        assert_eq!(errors.messages("place_id"), ["This field is required."]);
        assert_eq!(errors.messages("rating"), ["Rating must be between 0 and 5."]);
        assert_eq!(errors.messages("location"), ["Coordinates are out of range."]);
        assert!(!errors.contains("name"));
    }
}
