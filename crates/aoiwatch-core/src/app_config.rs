use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Root of the provider API; endpoint paths are joined onto it.
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// `limit` sent with the single monitor-list request.
    pub monitor_page_limit: u32,
    /// Width and height of WMS preview images, in pixels.
    pub preview_size_px: u32,
    pub demo_mode: bool,
    pub demo_image_path: Option<PathBuf>,
    pub banner_dismiss_secs: u64,
    /// Session-lived credential scope.
    pub session_path: PathBuf,
    /// Long-lived credential scope.
    pub credentials_path: PathBuf,
}
