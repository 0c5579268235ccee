pub mod app_config;
pub mod banner;
pub mod config;
pub mod events;
pub mod monitors;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use banner::{Banner, BannerKind, BannerState};
pub use config::{load_app_config, load_app_config_from_env};
pub use events::{Event, EventDetail, RawEvent};
pub use monitors::{
    AoiGeometry, CreateMonitorMetadata, CreateMonitorRequest, MatchCriteria, Monitor,
    MonitorIndex, MonitorLinks, MonitorMetadata, PlatformFilter, retain_store_monitors,
    DEFAULT_PLATFORMS,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
