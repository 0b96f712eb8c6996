//! GeoJSON FeatureCollection → `Hazard` mapping.
//!
//! The feed is loosely typed: numbers arrive as floats or ints, optional
//! strings may be `null`, and ids may be numeric. Anything a feature cannot
//! be mapped without is a reason to skip that feature, never the batch.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use hazard_core::{FetchError, Hazard, HazardId};
use serde_json::{Map, Value};
use tracing::debug;

const SUB_CATEGORY_KEYS: [&str; 4] = ["subCategoryA", "subCategoryB", "subCategoryC", "subCategoryD"];

/// Property keys mapped onto named `Hazard` fields. Everything else lands in
/// `Hazard::extra`.
const MAPPED_KEYS: &[&str] = &[
    "id",
    "headline",
    "mainCategory",
    "subCategoryA",
    "subCategoryB",
    "subCategoryC",
    "subCategoryD",
    "created",
    "lastUpdated",
    "start",
    "end",
    "roads",
    "locationQualifier",
    "adviceA",
    "adviceB",
    "otherAdvice",
    "weblinkUrl",
    "webLinks",
    "impact",
    "status",
    "isMajor",
    "ended",
    "durationMinutes",
    "periodType",
    "isEvent",
];

/// Parse a response body. Fails only when the body is not JSON or has no
/// `features` array.
pub fn parse_feature_collection(body: &[u8]) -> Result<Vec<Hazard>, FetchError> {
    let doc: Value =
        serde_json::from_slice(body).map_err(|e| FetchError::Parse(format!("invalid JSON: {e}")))?;

    let features = doc
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::Parse("response has no features array".into()))?;

    let mut hazards = Vec::with_capacity(features.len());
    for (index, feature) in features.iter().enumerate() {
        match parse_feature(feature) {
            Ok(hazard) => hazards.push(hazard),
            Err(reason) => debug!(index, reason, "skipping feature"),
        }
    }
    Ok(hazards)
}

fn parse_feature(feature: &Value) -> Result<Hazard, &'static str> {
    let empty = Map::new();
    let props = feature
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let id = props
        .get("id")
        .and_then(id_string)
        .or_else(|| feature.get("id").and_then(id_string))
        .ok_or("missing id")?;

    let (longitude, latitude) = point(feature).ok_or("missing or invalid Point geometry")?;

    let headline = text(props, "headline").unwrap_or_else(|| "Unknown Hazard".to_string());
    let main_category = text(props, "mainCategory").unwrap_or_default();
    let mut hazard = Hazard::new(HazardId(id), &headline, &main_category, latitude, longitude);

    hazard.sub_categories = SUB_CATEGORY_KEYS
        .iter()
        .filter_map(|key| text(props, key))
        .collect();

    hazard.created_at = epoch_ms(props, "created");
    hazard.last_updated_at = epoch_ms(props, "lastUpdated");
    hazard.start_at = epoch_ms(props, "start");
    hazard.end_at = epoch_ms(props, "end");

    let roads: &[Value] = props
        .get("roads")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    hazard.affected_roads = roads
        .iter()
        .filter_map(|r| r.get("roadName").and_then(Value::as_str))
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .collect();
    hazard.location_qualifier = text(props, "locationQualifier").or_else(|| {
        roads
            .first()
            .and_then(|r| r.get("locationQualifier"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    });

    hazard.advice_a = text(props, "adviceA");
    hazard.advice_b = text(props, "adviceB");
    hazard.other_advice = text(props, "otherAdvice");
    hazard.web_link = web_link(props);
    hazard.impact = text(props, "impact");
    hazard.status = text(props, "status");
    hazard.is_major = flag(props, "isMajor");
    hazard.ended = flag(props, "ended");
    hazard.duration_minutes = props.get("durationMinutes").and_then(integer);
    hazard.period_type = text(props, "periodType");
    hazard.is_event = flag(props, "isEvent");

    hazard.extra = props
        .iter()
        .filter(|(k, _)| !MAPPED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect::<BTreeMap<_, _>>();

    Ok(hazard)
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `[lon, lat]` of a Point geometry.
fn point(feature: &Value) -> Option<(f64, f64)> {
    let geometry = feature.get("geometry")?;
    if geometry.get("type").and_then(Value::as_str) != Some("Point") {
        return None;
    }
    let coords = geometry.get("coordinates")?.as_array()?;
    if coords.len() < 2 {
        return None;
    }
    let lon = coords[0].as_f64()?;
    let lat = coords[1].as_f64()?;
    (lon.is_finite() && lat.is_finite()).then_some((lon, lat))
}

fn text(props: &Map<String, Value>, key: &str) -> Option<String> {
    props
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn flag(props: &Map<String, Value>, key: &str) -> bool {
    props.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

/// Epoch milliseconds; zero, negative or absent means unknown.
fn epoch_ms(props: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    let ms = props.get(key).and_then(integer)?;
    if ms <= 0 {
        return None;
    }
    Utc.timestamp_millis_opt(ms).single()
}

/// `weblinkUrl`, else the first entry of `webLinks` (an object with `url`,
/// or a bare string).
fn web_link(props: &Map<String, Value>) -> Option<String> {
    if let Some(url) = text(props, "weblinkUrl") {
        return Some(url);
    }
    let first = props.get("webLinks")?.as_array()?.first()?;
    let url = match first {
        Value::String(s) => s.as_str(),
        Value::Object(o) => o.get("url")?.as_str()?,
        _ => return None,
    };
    let url = url.trim();
    (!url.is_empty()).then(|| url.to_string())
}
