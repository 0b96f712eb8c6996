//! Proximity zones and the matches hazards make against them.

use serde::{Deserialize, Serialize};

use crate::geo::haversine_km;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        GeoPoint {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometres.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(self, other)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// What a zone is centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Home,
    DeviceTracker,
}

impl ZoneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneKind::Home => "home",
            ZoneKind::DeviceTracker => "device_tracker",
        }
    }
}

impl std::fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named circular monitoring region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub kind: ZoneKind,
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl Zone {
    pub fn home(name: &str, center: GeoPoint, radius_km: f64) -> Self {
        Zone {
            name: name.to_string(),
            kind: ZoneKind::Home,
            center,
            radius_km,
        }
    }

    pub fn device_tracker(tracker_id: &str, center: GeoPoint, radius_km: f64) -> Self {
        Zone {
            name: tracker_id.to_string(),
            kind: ZoneKind::DeviceTracker,
            center,
            radius_km,
        }
    }

    /// Match `point` against this zone. The boundary is inclusive.
    pub fn match_point(&self, point: &GeoPoint) -> Option<ZoneMatch> {
        let distance_km = self.center.distance_km(point);
        (distance_km <= self.radius_km).then(|| ZoneMatch {
            zone_name: self.name.clone(),
            zone_kind: self.kind,
            distance_km,
        })
    }
}

/// One hazard falling inside one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneMatch {
    pub zone_name: String,
    pub zone_kind: ZoneKind,
    pub distance_km: f64,
}
