//! Monitor types mirroring the provider's monitoring API.
//!
//! The same types deserialize both live API responses and the bundled demo
//! fixture, so most optional upstream fields carry `#[serde(default)]`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Imaging platforms offered when creating a monitor.
pub const DEFAULT_PLATFORMS: &[&str] = &[
    "geoeye-01",
    "worldview-01",
    "worldview-02",
    "worldview-03",
    "worldview-legion-01",
    "worldview-legion-02",
    "worldview-legion-03",
    "worldview-legion-04",
];

/// A provider-side monitor (watched area of interest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monitor {
    pub id: String,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_modified: Option<String>,
    #[serde(default)]
    pub creator_id: Option<String>,
    #[serde(default)]
    pub creator_group_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_datetime: Option<String>,
    #[serde(default)]
    pub end_datetime: Option<String>,
    #[serde(default)]
    pub aoi_geojson: Option<AoiGeometry>,
    #[serde(default)]
    pub match_criteria: Option<MatchCriteria>,
    #[serde(default)]
    pub erode_area: bool,
    #[serde(default)]
    pub erosion_complete_threshold_pct: Option<f64>,
    #[serde(default)]
    pub order_when_complete: bool,
    #[serde(default)]
    pub order_templates: Option<serde_json::Value>,
    #[serde(default)]
    pub batch_order_templates: Option<serde_json::Value>,
    #[serde(default)]
    pub monitor_notifications: Option<serde_json::Value>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub metadata: MonitorMetadata,
    #[serde(default)]
    pub monitor_links: Option<MonitorLinks>,
}

impl Monitor {
    /// The monitor's store name when present and non-empty.
    #[must_use]
    pub fn store_name(&self) -> Option<&str> {
        self.metadata
            .store_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }

    /// Whether this monitor carries the metadata the dashboard needs.
    #[must_use]
    pub fn has_store_metadata(&self) -> bool {
        self.store_name().is_some()
    }
}

/// Caller-supplied metadata attached to a monitor at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_segment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// SHA-256 hex digest of the creating API key; used to filter the monitor list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_key: Option<String>,
}

/// GeoJSON polygon outlining the area of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AoiGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

/// Filters an imagery capture must satisfy to raise an event.
///
/// Comparison filters map an operator (`eq`, `lte`, `gte`, ...) to a number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformFilter>,
    #[serde(
        rename = "eo:cloud_cover",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub cloud_cover: Option<BTreeMap<String, f64>>,
    #[serde(
        rename = "view:off_nadir",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub off_nadir: Option<BTreeMap<String, f64>>,
    #[serde(
        rename = "aoi:coverage_pct",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub coverage_pct: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFilter {
    #[serde(rename = "in")]
    pub platforms: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    pub events: String,
}

/// Monitor lookup by id, rebuilt on every successful fetch.
#[derive(Debug, Clone, Default)]
pub struct MonitorIndex {
    by_id: HashMap<String, Monitor>,
}

impl MonitorIndex {
    #[must_use]
    pub fn build(monitors: &[Monitor]) -> Self {
        let by_id = monitors
            .iter()
            .map(|m| (m.id.clone(), m.clone()))
            .collect();
        Self { by_id }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Monitor> {
        self.by_id.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Keep only monitors whose metadata names a store.
#[must_use]
pub fn retain_store_monitors(monitors: Vec<Monitor>) -> Vec<Monitor> {
    monitors
        .into_iter()
        .filter(Monitor::has_store_metadata)
        .collect()
}

/// Body of `POST /monitoring/v1/monitors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMonitorRequest {
    pub source: String,
    pub description: String,
    pub aoi_geojson: AoiGeometry,
    pub match_criteria: MatchCriteria,
    pub metadata: CreateMonitorMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateMonitorMetadata {
    pub store_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_segment: Option<String>,
    pub creator_key: Option<String>,
}
