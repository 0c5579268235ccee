//! `events` command: aggregate, enrich and print every monitor's events.

use std::path::Path;

use anyhow::Context;
use aoiwatch_core::{BannerKind, Event};
use aoiwatch_dashboard::{Dashboard, DashboardState, EventImage};

/// Load monitors, then their events with source metadata and previews.
///
/// Per-monitor and per-image failures are reported in the banner, not
/// propagated.
///
/// # Errors
///
/// Returns an error if the monitor list cannot be loaded or a preview
/// cannot be written to `images_dir`.
pub(crate) async fn run_events(
    dashboard: &mut Dashboard,
    images_dir: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    dashboard.refresh_monitors().await?;
    let summary = dashboard.fetch_all_events().await;

    let state = dashboard.state();
    if json {
        println!("{}", serde_json::to_string_pretty(state.events())?);
    } else if state.events().is_empty() {
        println!("no events recorded for any monitor");
    } else {
        print_table(state);
    }

    let written = match images_dir {
        Some(dir) => write_previews(state, dir).await?,
        None => 0,
    };
    if written > 0 {
        tracing::info!(written, "previews written");
    }

    let failed_monitors = summary.failures.len();
    let failed_previews = summary.enrichment.failures.len();
    let loaded = format!(
        "Loaded {} events from {} monitors",
        summary.events, summary.monitors
    );
    if failed_monitors == 0 && failed_previews == 0 {
        dashboard.set_banner(BannerKind::Success, loaded);
    } else {
        dashboard.set_banner(
            BannerKind::Warning,
            format!("{loaded}; {failed_monitors} monitors and {failed_previews} previews failed"),
        );
    }
    Ok(())
}

fn print_table(state: &DashboardState) {
    println!(
        "{:<26}{:<10}{:<28}{:<14}IMAGE",
        "TIMESTAMP", "TYPE", "STORE", "SEGMENT"
    );
    for event in state.events() {
        println!(
            "{:<26}{:<10}{:<28}{:<14}{}",
            event.event_timestamp,
            crate::or_dash(Some(event.kind.as_str())),
            crate::truncate(crate::or_dash(Some(event.store_name.as_str())), 26),
            crate::truncate(crate::or_dash(Some(event.market_segment.as_str())), 12),
            image_status(state, event),
        );
    }
}

fn image_status(state: &DashboardState, event: &Event) -> String {
    let key = DashboardState::lookup_key(event);
    match state.event_image(key) {
        Some(EventImage::Preview(preview)) => {
            format!("{key} ({}, {} bytes)", preview.file_extension(), preview.bytes.len())
        }
        Some(EventImage::NoImage) => "no image".to_owned(),
        None => format!("{key} (unavailable)"),
    }
}

async fn write_previews(state: &DashboardState, dir: &Path) -> anyhow::Result<usize> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {}", dir.display()))?;

    let mut written = 0;
    for (key, image) in state.event_images() {
        let EventImage::Preview(preview) = image else {
            continue;
        };
        let path = dir.join(format!("{}.{}", file_stem(key), preview.file_extension()));
        tokio::fs::write(&path, &preview.bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
        written += 1;
    }
    Ok(written)
}

/// Keep ids usable as file names on every platform.
pub(crate) fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
