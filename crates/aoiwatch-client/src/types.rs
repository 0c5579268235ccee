//! Response types for the monitoring, discovery and streaming APIs.
//!
//! Monitoring endpoints wrap their payload in a `{"data": {...}}` envelope;
//! discovery search returns a bare GeoJSON `FeatureCollection`.

use aoiwatch_core::RawEvent;
use serde::{Deserialize, Serialize};

/// Top-level `{"data": ...}` envelope for monitoring responses.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// `data` payload of `GET /monitoring/v1/monitors`.
///
/// Records stay untyped here and are converted one by one.
#[derive(Debug, Deserialize)]
pub struct MonitorList {
    #[serde(default)]
    pub monitors: Vec<serde_json::Value>,
}

/// `data` payload of `GET /monitoring/v1/monitors/{id}/events`.
#[derive(Debug, Deserialize)]
pub struct EventList {
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

// ---------------------------------------------------------------------------
// discovery search
// ---------------------------------------------------------------------------

/// Result of `GET /discovery/v1/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub features: Vec<SearchFeature>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFeature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `[min_lon, min_lat, max_lon, max_lat]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SearchResponse {
    /// Bounding box of the first feature, if it has a well-formed one.
    #[must_use]
    pub fn first_bbox(&self) -> Option<BoundingBox> {
        self.features
            .first()
            .and_then(|f| f.bbox.as_deref())
            .and_then(BoundingBox::from_slice)
    }
}

/// Geographic extent in EPSG:4326 longitude/latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Parse a GeoJSON 2D bbox. Anything other than four finite numbers is rejected.
    #[must_use]
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [min_lon, min_lat, max_lon, max_lat] if values.iter().all(|v| v.is_finite()) => {
                Some(Self {
                    min_lon: *min_lon,
                    min_lat: *min_lat,
                    max_lon: *max_lon,
                    max_lat: *max_lat,
                })
            }
            _ => None,
        }
    }

    /// WMS 1.3.0 `bbox` value; EPSG:4326 uses latitude-first axis order.
    #[must_use]
    pub fn wms_param(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

// ---------------------------------------------------------------------------
// pass-through responses
// ---------------------------------------------------------------------------

/// Binary body of a rendered map request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Status and body of a call the caller interprets itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    Enable,
    Disable,
}

impl MonitorAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MonitorAction::Enable => "enable",
            MonitorAction::Disable => "disable",
        }
    }
}

impl std::fmt::Display for MonitorAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_from_slice_requires_four_finite_values() {
        assert!(BoundingBox::from_slice(&[1.0, 2.0, 3.0]).is_none());
        assert!(BoundingBox::from_slice(&[1.0, 2.0, 3.0, f64::NAN]).is_none());
        let bbox = BoundingBox::from_slice(&[-105.0, 39.7, -104.9, 39.8]).unwrap();
        assert!((bbox.max_lat - 39.8).abs() < f64::EPSILON);
    }

    #[test]
    fn wms_param_swaps_axis_order() {
        let bbox = BoundingBox::from_slice(&[-105.0, 39.5, -104.0, 40.5]).unwrap();
        assert_eq!(bbox.wms_param(), "39.5,-105,40.5,-104");
    }

    #[test]
    fn first_bbox_reads_first_feature_only() {
        let response: SearchResponse = serde_json::from_value(serde_json::json!({
            "type": "FeatureCollection",
            "features": [
                { "id": "a", "properties": {} },
                { "id": "b", "bbox": [0.0, 0.0, 1.0, 1.0], "properties": {} }
            ]
        }))
        .unwrap();
        assert!(response.first_bbox().is_none());
        assert_eq!(
            response.extra.get("type").and_then(|v| v.as_str()),
            Some("FeatureCollection")
        );
    }

    #[test]
    fn raw_response_success_range() {
        let ok = RawResponse { status: 204, body: String::new() };
        let bad = RawResponse { status: 409, body: "conflict".to_string() };
        assert!(ok.is_success());
        assert!(!bad.is_success());
    }
}
