//! Monitor command handlers: `monitors`, `enable`, `disable` and `create`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use aoiwatch_client::MonitorAction;
use aoiwatch_core::{
    AoiGeometry, BannerKind, CreateMonitorMetadata, CreateMonitorRequest, MatchCriteria,
    PlatformFilter, DEFAULT_PLATFORMS,
};
use aoiwatch_dashboard::{Dashboard, DEMO_MONITOR_PREFIX};
use clap::Args;

const MONITOR_SOURCE: &str = "maxar";

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Store name; also used as the description unless one is given
    #[arg(long)]
    pub store_name: String,
    /// GeoJSON file with a Polygon geometry, Feature or FeatureCollection
    #[arg(long)]
    pub aoi: PathBuf,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub market_segment: Option<String>,
    /// Platform to match (repeatable); defaults to every supported platform
    #[arg(long = "platform")]
    pub platforms: Vec<String>,
    /// Maximum cloud cover percentage
    #[arg(long)]
    pub max_cloud_cover: Option<f64>,
    /// Maximum off-nadir angle in degrees
    #[arg(long)]
    pub max_off_nadir: Option<f64>,
    #[arg(long)]
    pub description: Option<String>,
}

/// List retained monitors as a table.
///
/// # Errors
///
/// Returns an error if the monitor list cannot be fetched.
pub(crate) async fn run_monitors(dashboard: &mut Dashboard) -> anyhow::Result<()> {
    let count = dashboard.refresh_monitors().await?;

    if count == 0 {
        println!("no monitors found; create one with `aoiwatch create`");
    } else {
        println!(
            "{:<40}{:<9}{:<28}{:<14}ADDRESS",
            "ID", "ENABLED", "STORE", "SEGMENT"
        );
        for monitor in dashboard.state().monitors() {
            println!(
                "{:<40}{:<9}{:<28}{:<14}{}",
                monitor.id,
                if monitor.enabled { "yes" } else { "no" },
                crate::truncate(crate::or_dash(monitor.store_name()), 26),
                crate::truncate(
                    crate::or_dash(monitor.metadata.market_segment.as_deref()),
                    12
                ),
                crate::or_dash(monitor.metadata.address.as_deref()),
            );
        }
    }

    dashboard.set_banner(BannerKind::Success, format!("Loaded {count} monitors"));
    Ok(())
}

/// Enable or disable one monitor.
///
/// # Errors
///
/// Returns an error for demo monitors, on network failure, or when the
/// provider answers with a non-2xx status.
pub(crate) async fn run_set_enabled(
    dashboard: &mut Dashboard,
    id: &str,
    action: MonitorAction,
) -> anyhow::Result<()> {
    if dashboard.state().demo_mode() && id.starts_with(DEMO_MONITOR_PREFIX) {
        anyhow::bail!("demo monitor {id} cannot be changed");
    }

    let response = dashboard.toggle_monitor_status(id, action).await?;
    if !response.is_success() {
        anyhow::bail!(
            "failed to {action} monitor {id}: HTTP {}: {}",
            response.status,
            response.body.trim()
        );
    }

    dashboard.set_banner(BannerKind::Success, format!("Monitor {id} {action}d"));
    Ok(())
}

/// Create a monitor from command-line arguments and an AOI file.
///
/// # Errors
///
/// Returns an error in demo mode, if the AOI file cannot be read or is not a
/// polygon, on network failure, or on a non-2xx response.
pub(crate) async fn run_create(dashboard: &mut Dashboard, args: CreateArgs) -> anyhow::Result<()> {
    if dashboard.state().demo_mode() {
        anyhow::bail!("monitors cannot be created in demo mode");
    }

    let raw = tokio::fs::read_to_string(&args.aoi)
        .await
        .with_context(|| format!("reading AOI file {}", args.aoi.display()))?;
    let aoi = parse_aoi(&raw).with_context(|| format!("parsing AOI file {}", args.aoi.display()))?;
    let request = build_request(args, aoi);
    let store_name = request.metadata.store_name.clone();

    let response = dashboard.create_monitor(request).await?;
    if !response.is_success() {
        anyhow::bail!(
            "failed to create monitor for {store_name}: HTTP {}: {}",
            response.status,
            response.body.trim()
        );
    }

    dashboard.set_banner(
        BannerKind::Success,
        format!("Monitor created for {store_name}"),
    );
    Ok(())
}

/// Extract a polygon from a GeoJSON geometry, Feature or the first feature
/// of a FeatureCollection.
pub(crate) fn parse_aoi(json: &str) -> anyhow::Result<AoiGeometry> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let geometry = match value.get("type").and_then(serde_json::Value::as_str) {
        Some("Feature") => value
            .get("geometry")
            .cloned()
            .context("feature has no geometry")?,
        Some("FeatureCollection") => value
            .pointer("/features/0/geometry")
            .cloned()
            .context("feature collection has no feature with a geometry")?,
        _ => value,
    };

    let aoi: AoiGeometry = serde_json::from_value(geometry)?;
    if aoi.kind != "Polygon" {
        anyhow::bail!("AOI must be a Polygon, got {}", aoi.kind);
    }
    if aoi.coordinates.first().map_or(true, |ring| ring.len() < 4) {
        anyhow::bail!("AOI polygon needs a closed outer ring of at least four positions");
    }
    Ok(aoi)
}

pub(crate) fn build_request(args: CreateArgs, aoi: AoiGeometry) -> CreateMonitorRequest {
    let platforms = if args.platforms.is_empty() {
        DEFAULT_PLATFORMS.iter().map(|p| (*p).to_owned()).collect()
    } else {
        args.platforms
    };
    let at_most = |limit: Option<f64>| limit.map(|v| BTreeMap::from([("lte".to_owned(), v)]));

    CreateMonitorRequest {
        source: MONITOR_SOURCE.to_owned(),
        description: args.description.unwrap_or_else(|| args.store_name.clone()),
        aoi_geojson: aoi,
        match_criteria: MatchCriteria {
            platform: Some(PlatformFilter { platforms }),
            cloud_cover: at_most(args.max_cloud_cover),
            off_nadir: at_most(args.max_off_nadir),
            coverage_pct: None,
        },
        metadata: CreateMonitorMetadata {
            store_name: args.store_name,
            address: args.address,
            market_segment: args.market_segment,
            creator_key: None,
        },
    }
}
