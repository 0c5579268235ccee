//! Offline demo data: bundled monitors and events, plus synthesized catalog
//! results and preview images.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use aoiwatch_client::{SearchFeature, SearchResponse};
use aoiwatch_core::{Monitor, RawEvent};
use rand::Rng;
use serde::Deserialize;

use crate::error::DashboardError;
use crate::state::{ImageOrigin, PreviewImage};

/// Monitor ids with this prefix are served from the fixture in demo mode.
pub const DEMO_MONITOR_PREFIX: &str = "demo:";
/// Imagery ids with this prefix get synthesized enrichment in demo mode.
pub const DEMO_IMAGE_PREFIX: &str = "demo-image:";

const BUNDLED_FIXTURE: &str = include_str!("../fixtures/demo_data.json");
const BUNDLED_SATELLITE_SVG: &str = include_str!("../fixtures/demo-satellite.svg");

const PLACEHOLDER_SIZE: u32 = 512;
const PLACEHOLDER_COLORS: [&str; 4] = ["#4a5d23", "#6b7c32", "#8b9a41", "#a8b850"];

#[derive(Debug, Clone, Deserialize)]
pub struct DemoFixture {
    data: FixtureData,
    #[serde(default)]
    events: HashMap<String, Vec<RawEvent>>,
}

#[derive(Debug, Clone, Deserialize)]
struct FixtureData {
    #[serde(default)]
    monitors: Vec<Monitor>,
}

impl DemoFixture {
    /// Parses the fixture compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Fixture`] if the bundled JSON is malformed.
    pub fn bundled() -> Result<Self, DashboardError> {
        Self::from_json(BUNDLED_FIXTURE)
    }

    /// # Errors
    ///
    /// Returns [`DashboardError::Fixture`] if `json` does not match the fixture shape.
    pub fn from_json(json: &str) -> Result<Self, DashboardError> {
        serde_json::from_str(json).map_err(DashboardError::Fixture)
    }

    #[must_use]
    pub fn monitors(&self) -> &[Monitor] {
        &self.data.monitors
    }

    /// Events recorded for `monitor_id`; unknown ids have none.
    #[must_use]
    pub fn events_for(&self, monitor_id: &str) -> Vec<RawEvent> {
        self.events.get(monitor_id).cloned().unwrap_or_default()
    }
}

/// A plausible single-feature catalog result around Denver.
#[must_use]
pub fn synthesize_source(demo_image_id: &str) -> SearchResponse {
    let mut rng = rand::rng();
    let bbox = vec![
        -105.1 + rng.random::<f64>() * 0.2,
        39.7 + rng.random::<f64>() * 0.2,
        -104.9 + rng.random::<f64>() * 0.2,
        39.9 + rng.random::<f64>() * 0.2,
    ];

    let mut properties = serde_json::Map::new();
    properties.insert(
        "datetime".to_owned(),
        chrono::Utc::now()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            .into(),
    );
    properties.insert("platform".to_owned(), "worldview-03".into());
    properties.insert(
        "cloud_cover".to_owned(),
        serde_json::Value::from(rng.random_range(0_u32..20)),
    );

    SearchResponse {
        features: vec![SearchFeature {
            id: Some(demo_image_id.to_owned()),
            bbox: Some(bbox),
            properties,
            extra: serde_json::Map::new(),
        }],
        extra: serde_json::Map::new(),
    }
}

/// Preview for a demo event.
///
/// Uses `custom` when it is set and readable, the bundled satellite SVG when
/// it is unset, and a generated placeholder when reading `custom` fails.
pub async fn demo_preview(custom: Option<&Path>) -> PreviewImage {
    let Some(path) = custom else {
        return PreviewImage {
            content_type: "image/svg+xml".to_owned(),
            bytes: BUNDLED_SATELLITE_SVG.as_bytes().to_vec(),
            origin: ImageOrigin::DemoAsset,
        };
    };

    match tokio::fs::read(path).await {
        Ok(bytes) => PreviewImage {
            content_type: content_type_for(path).to_owned(),
            bytes,
            origin: ImageOrigin::DemoAsset,
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "demo image unreadable, rendering placeholder"
            );
            render_placeholder()
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Procedural stand-in: a green gradient with a few field-like blocks and a
/// "DEMO IMAGE" caption.
#[must_use]
pub fn render_placeholder() -> PreviewImage {
    let mut rng = rand::rng();
    let start = PLACEHOLDER_COLORS[rng.random_range(0..PLACEHOLDER_COLORS.len())];
    let size = PLACEHOLDER_SIZE;

    let mut svg = format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#,
            r#"<defs><linearGradient id="g" x1="0" y1="0" x2="1" y2="1">"#,
            r##"<stop offset="0" stop-color="{start}"/><stop offset="1" stop-color="#2d3a1a"/>"##,
            r#"</linearGradient></defs>"#,
            r#"<rect width="{size}" height="{size}" fill="url(#g)"/>"#
        ),
        size = size,
        start = start,
    );
    for _ in 0..5 {
        let x = rng.random::<f64>() * 400.0;
        let y = rng.random::<f64>() * 400.0;
        let side = 20.0 + rng.random::<f64>() * 80.0;
        let _ = write!(
            svg,
            r#"<rect x="{x:.1}" y="{y:.1}" width="{side:.1}" height="{side:.1}" fill="rgba(139, 154, 65, 0.6)"/>"#
        );
    }
    svg.push_str(
        r#"<text x="10" y="30" font-family="Arial" font-size="16" fill="rgba(255, 255, 255, 0.8)">DEMO IMAGE</text></svg>"#,
    );

    PreviewImage {
        content_type: "image/svg+xml".to_owned(),
        bytes: svg.into_bytes(),
        origin: ImageOrigin::DemoPlaceholder,
    }
}
