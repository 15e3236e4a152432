//! Storage codec for third-party route payloads.
//!
//! Directions responses are large and mostly irrelevant to the app, so on the
//! write path they are pruned to the fields the client renders and, when still
//! too big, gzipped and base64-encoded into a tagged wrapper. The read path
//! reverses the compression. Neither direction ever fails: malformed input
//! degrades to a compressed copy of the raw payload or a fixed placeholder.

use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 1_000_000;

/// Upper bound on the decompressed size of a stored payload.
const MAX_EXPANDED_SIZE: u64 = 100 * 1024 * 1024;

const MINIMAL_NOTE: &str =
    "Route data could not be stored in full; only a placeholder was kept.";

#[derive(Debug, Error)]
pub enum RouteDataError {
    #[error("malformed route data: {0}")]
    Malformed(&'static str),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Base64(#[from] base64::DecodeError),
}

/// What actually lives in a trip's `route_data` column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoredRouteData {
    Compressed(CompressedRoute),
    Minimal(MinimalRoute),
    Plain(Value),
}

impl From<Value> for StoredRouteData {
    fn from(value: Value) -> Self {
        if value.get("_compressed") == Some(&Value::Bool(true)) {
            // A damaged wrapper still expands to the decompression error body.
            let wrapper = serde_json::from_value(value).unwrap_or_default();
            return StoredRouteData::Compressed(wrapper);
        }
        if value.get("_minimal") == Some(&Value::Bool(true)) {
            if let Ok(minimal) = serde_json::from_value(value.clone()) {
                return StoredRouteData::Minimal(minimal);
            }
        }
        StoredRouteData::Plain(value)
    }
}

impl<'de> Deserialize<'de> for StoredRouteData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(StoredRouteData::from)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedRoute {
    #[serde(rename = "_compressed")]
    pub compressed: bool,
    #[serde(rename = "_data", default)]
    pub data: String,
    #[serde(rename = "_original_size", default)]
    pub original_size: u64,
    #[serde(rename = "_compressed_size", default)]
    pub compressed_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimalRoute {
    pub status: String,
    pub routes: Vec<Value>,
    #[serde(rename = "_minimal")]
    pub minimal: bool,
    #[serde(rename = "_note", default)]
    pub note: String,
}

impl MinimalRoute {
    pub fn placeholder() -> Self {
        Self {
            status: "OK".into(),
            routes: vec![json!({
                "summary": "Route calculated successfully",
                "legs": [{
                    "distance": { "text": "N/A", "value": 0 },
                    "duration": { "text": "N/A", "value": 0 },
                }],
            })],
            minimal: true,
            note: MINIMAL_NOTE.into(),
        }
    }

    fn to_value(&self) -> Value {
        json!({
            "status": self.status,
            "routes": self.routes,
            "_minimal": self.minimal,
            "_note": self.note,
        })
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    pub status: Option<Value>,
    pub routes: Vec<RouteSummary>,
    pub waypoint_order: Option<Value>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub summary: Option<Value>,
    pub bounds: Option<Value>,
    pub legs: Vec<LegSummary>,
    pub overview_polyline: Option<Value>,
    pub warnings: Option<Value>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegSummary {
    pub distance: Option<Value>,
    pub duration: Option<Value>,
    pub start_address: Option<Value>,
    pub end_address: Option<Value>,
    pub start_location: Option<Value>,
    pub end_location: Option<Value>,
    pub steps_count: usize,
}

/// Prunes a raw directions payload down to the fields the client renders.
pub fn optimize(raw: &Value) -> Result<OptimizedRoute, RouteDataError> {
    let root = raw
        .as_object()
        .ok_or(RouteDataError::Malformed("payload is not an object"))?;

    let routes = array_field(root, "routes")?
        .iter()
        .map(optimize_route)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OptimizedRoute {
        status: field(root, "status"),
        routes,
        waypoint_order: field(root, "waypoint_order"),
    })
}

fn optimize_route(route: &Value) -> Result<RouteSummary, RouteDataError> {
    let route = route
        .as_object()
        .ok_or(RouteDataError::Malformed("route is not an object"))?;
    let legs = array_field(route, "legs")?
        .iter()
        .map(optimize_leg)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RouteSummary {
        summary: field(route, "summary"),
        bounds: field(route, "bounds"),
        legs,
        overview_polyline: field(route, "overview_polyline"),
        warnings: field(route, "warnings"),
    })
}

fn optimize_leg(leg: &Value) -> Result<LegSummary, RouteDataError> {
    let leg = leg
        .as_object()
        .ok_or(RouteDataError::Malformed("leg is not an object"))?;

    Ok(LegSummary {
        distance: field(leg, "distance"),
        duration: field(leg, "duration"),
        start_address: field(leg, "start_address"),
        end_address: field(leg, "end_address"),
        start_location: field(leg, "start_location"),
        end_location: field(leg, "end_location"),
        steps_count: array_field(leg, "steps")?.len(),
    })
}

fn field(object: &Map<String, Value>, key: &str) -> Option<Value> {
    object.get(key).filter(|value| !value.is_null()).cloned()
}

fn array_field<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a [Value], RouteDataError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(RouteDataError::Malformed(key)),
    }
}

/// Falsy payloads are stored as given instead of being optimized.
fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Write-path codec: prunes and, above the size threshold, compresses.
#[derive(Debug, Clone, Copy)]
pub struct RouteDataCodec {
    threshold: usize,
}

impl Default for RouteDataCodec {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_THRESHOLD)
    }
}

impl RouteDataCodec {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn compact(&self, raw: Option<Value>) -> Option<StoredRouteData> {
        let raw = match raw {
            None | Some(Value::Null) => return None,
            Some(value) if is_empty_payload(&value) => {
                return Some(StoredRouteData::Plain(value));
            }
            Some(value) => value,
        };

        match self.compact_optimized(&raw) {
            Ok(stored) => Some(stored),
            Err(err) => {
                warn!("route data optimization failed, compressing raw payload: {err}");
                let fallback = serde_json::to_vec(&raw)
                    .map_err(RouteDataError::from)
                    .and_then(|bytes| compress(&bytes));
                match fallback {
                    Ok(wrapper) => Some(StoredRouteData::Compressed(wrapper)),
                    Err(err) => {
                        warn!("raw route data compression failed, storing placeholder: {err}");
                        Some(StoredRouteData::Minimal(MinimalRoute::placeholder()))
                    }
                }
            }
        }
    }

    fn compact_optimized(&self, raw: &Value) -> Result<StoredRouteData, RouteDataError> {
        let optimized = optimize(raw)?;
        let bytes = serde_json::to_vec(&optimized)?;
        if bytes.len() <= self.threshold {
            debug!(size = bytes.len(), "storing optimized route data");
            return Ok(StoredRouteData::Plain(serde_json::to_value(&optimized)?));
        }

        let wrapper = compress(&bytes)?;
        info!(
            original = wrapper.original_size,
            compressed = wrapper.compressed_size,
            "compressed oversized route data"
        );
        Ok(StoredRouteData::Compressed(wrapper))
    }
}

fn compress(bytes: &[u8]) -> Result<CompressedRoute, RouteDataError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    let gzipped = encoder.finish()?;
    Ok(CompressedRoute {
        compressed: true,
        data: STANDARD.encode(&gzipped),
        original_size: bytes.len() as u64,
        compressed_size: gzipped.len() as u64,
    })
}

fn decompress(wrapper: &CompressedRoute) -> Result<Value, RouteDataError> {
    let gzipped = STANDARD.decode(wrapper.data.as_bytes())?;
    let mut decoded = Vec::new();
    GzDecoder::new(gzipped.as_slice())
        .take(MAX_EXPANDED_SIZE)
        .read_to_end(&mut decoded)?;
    Ok(serde_json::from_slice(&decoded)?)
}

/// Read-path counterpart of [`RouteDataCodec::compact`].
pub fn expand(stored: Option<&StoredRouteData>) -> Option<Value> {
    match stored? {
        StoredRouteData::Compressed(wrapper) => Some(decompress(wrapper).unwrap_or_else(|err| {
            warn!("failed to decompress stored route data: {err}");
            json!({
                "status": "OK",
                "routes": [],
                "error": "Failed to decompress route data",
            })
        })),
        StoredRouteData::Minimal(minimal) => Some(minimal.to_value()),
        StoredRouteData::Plain(value) => Some(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directions(polyline: &str) -> Value {
        json!({
            "status": "OK",
            "geocoded_waypoints": [{ "place_id": "abc", "types": ["locality"] }],
            "routes": [{
                "summary": "A1",
                "bounds": { "northeast": { "lat": 1.0, "lng": 2.0 }, "southwest": { "lat": 0.0, "lng": 0.5 } },
                "copyrights": "Map data",
                "overview_polyline": { "points": polyline },
                "warnings": [],
                "legs": [{
                    "distance": { "text": "10 km", "value": 10000 },
                    "duration": { "text": "12 mins", "value": 720 },
                    "start_address": "Start",
                    "end_address": "End",
                    "start_location": { "lat": 0.0, "lng": 0.5 },
                    "end_location": { "lat": 1.0, "lng": 2.0 },
                    "steps": [
                        { "html_instructions": "Head north", "polyline": { "points": "aaa" } },
                        { "html_instructions": "Turn left", "polyline": { "points": "bbb" } },
                    ],
                    "traffic_speed_entry": [],
                }],
            }],
        })
    }

    #[test]
    fn absent_values_stay_absent() {
        let codec = RouteDataCodec::default();
        assert_eq!(codec.compact(None), None);
        assert_eq!(codec.compact(Some(Value::Null)), None);
        assert_eq!(expand(None), None);
        assert_eq!(
            codec.compact(Some(json!({}))),
            Some(StoredRouteData::Plain(json!({})))
        );
    }

    #[test]
    fn falsy_scalars_are_stored_verbatim() {
        let codec = RouteDataCodec::default();
        for value in [json!(0), json!(0.0), json!(false), json!(""), json!([])] {
            assert_eq!(
                codec.compact(Some(value.clone())),
                Some(StoredRouteData::Plain(value))
            );
        }
        assert!(is_empty_payload(&json!(null)));
        assert!(!is_empty_payload(&json!(1)));
        assert!(!is_empty_payload(&json!(true)));
    }

    #[test]
    fn small_payloads_are_pruned_not_compressed() {
        let codec = RouteDataCodec::default();
        let stored = codec.compact(Some(directions("abc"))).expect("stored");
        let StoredRouteData::Plain(value) = &stored else {
            panic!("expected plain route data, got {stored:?}");
        };
        assert!(value.get("geocoded_waypoints").is_none());
        let leg = &value["routes"][0]["legs"][0];
        assert_eq!(leg["steps_count"], json!(2));
        assert!(leg.get("steps").is_none());
        assert_eq!(value["routes"][0]["overview_polyline"]["points"], json!("abc"));
        assert_eq!(expand(Some(&stored)).as_ref(), Some(value));
    }

    #[test]
    fn oversized_payloads_round_trip_through_compression() {
        let codec = RouteDataCodec::default();
        let polyline = "x".repeat(DEFAULT_COMPRESSION_THRESHOLD + 10);
        let raw = directions(&polyline);
        let stored = codec.compact(Some(raw.clone())).expect("stored");
        let StoredRouteData::Compressed(wrapper) = &stored else {
            panic!("expected compressed route data");
        };
        assert!(wrapper.compressed);
        assert!(wrapper.compressed_size < wrapper.original_size);

        let optimized = serde_json::to_value(optimize(&raw).expect("optimize")).expect("value");
        assert_eq!(expand(Some(&stored)), Some(optimized));
    }

    #[test]
    fn wrapper_keeps_its_wire_shape() {
        let codec = RouteDataCodec::new(16);
        let stored = codec.compact(Some(directions("abc"))).expect("stored");
        let wire = serde_json::to_value(&stored).expect("serialize");
        assert_eq!(wire["_compressed"], json!(true));
        assert!(wire["_data"].is_string());
        assert!(wire["_original_size"].is_u64());
        assert!(wire["_compressed_size"].is_u64());

        let reloaded: StoredRouteData = serde_json::from_value(wire).expect("deserialize");
        assert_eq!(reloaded, stored);
    }

    #[test]
    fn malformed_payload_is_compressed_verbatim() {
        let codec = RouteDataCodec::default();
        let raw = json!({ "status": "OK", "routes": "not-a-list" });
        let stored = codec.compact(Some(raw.clone())).expect("stored");
        assert!(matches!(stored, StoredRouteData::Compressed(_)));
        assert_eq!(expand(Some(&stored)), Some(raw));
    }

    #[test]
    fn broken_wrapper_expands_to_error_body() {
        let stored = StoredRouteData::from(json!({ "_compressed": true, "_data": "%%%" }));
        let expanded = expand(Some(&stored)).expect("value");
        assert_eq!(expanded["error"], json!("Failed to decompress route data"));
        assert_eq!(expanded["routes"], json!([]));
    }

    #[test]
    fn placeholder_round_trips_as_minimal() {
        let wire = MinimalRoute::placeholder().to_value();
        assert_eq!(wire["_minimal"], json!(true));
        assert_eq!(wire["routes"][0]["legs"][0]["distance"]["text"], json!("N/A"));
        let stored = StoredRouteData::from(wire.clone());
        assert!(matches!(stored, StoredRouteData::Minimal(_)));
        assert_eq!(expand(Some(&stored)), Some(wire));
    }
}
