mod auth;
mod events;
mod monitors;

use std::path::PathBuf;
use std::process::ExitCode;

use aoiwatch_client::MonitorAction;
use aoiwatch_core::BannerKind;
use aoiwatch_dashboard::Dashboard;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "aoiwatch")]
#[command(about = "Watch imagery-provider monitors and their capture events")]
struct Cli {
    /// Serve monitors and events from the bundled demo fixture
    #[arg(long, global = true)]
    demo: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate an API key with the provider and store it
    Login {
        #[arg(long, env = "AOIWATCH_API_KEY", hide_env_values = true)]
        key: String,
    },
    /// Forget the stored API key
    Logout,
    /// Show login and demo-mode status
    Status,
    /// List monitors created with the stored key
    Monitors,
    /// Load every monitor's events with source metadata and previews
    Events {
        /// Write preview images into this directory
        #[arg(long)]
        images_dir: Option<PathBuf>,
        /// Print events as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Enable a monitor
    Enable { id: String },
    /// Disable a monitor
    Disable { id: String },
    /// Create a monitor for a store location
    Create(monitors::CreateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = aoiwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(env = %config.env, demo_mode = config.demo_mode, "configuration loaded");

    let cli = Cli::parse();
    let mut dashboard = Dashboard::from_config(&config)?;
    if cli.demo && !dashboard.state().demo_mode() {
        dashboard.toggle_demo_mode();
    }

    let result = match cli.command {
        Commands::Login { key } => auth::run_login(&mut dashboard, &key).await,
        Commands::Logout => auth::run_logout(&mut dashboard),
        Commands::Status => auth::run_status(&mut dashboard),
        Commands::Monitors => monitors::run_monitors(&mut dashboard).await,
        Commands::Events { images_dir, json } => {
            events::run_events(&mut dashboard, images_dir.as_deref(), json).await
        }
        Commands::Enable { id } => {
            monitors::run_set_enabled(&mut dashboard, &id, MonitorAction::Enable).await
        }
        Commands::Disable { id } => {
            monitors::run_set_enabled(&mut dashboard, &id, MonitorAction::Disable).await
        }
        Commands::Create(args) => monitors::run_create(&mut dashboard, args).await,
    };

    if let Err(e) = &result {
        dashboard.set_banner(BannerKind::Error, format!("{e:#}"));
    }
    print_banner(&dashboard);

    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Banners go to stderr so `--json` output stays parseable.
fn print_banner(dashboard: &Dashboard) {
    let banner = dashboard.banner();
    if let Some(kind) = banner.kind {
        eprintln!("[{kind}] {}", banner.message);
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        text.to_owned()
    }
}

/// Display an optional field, returning `"—"` when absent or empty.
fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "\u{2014}",
    }
}

#[cfg(test)]
mod tests;
