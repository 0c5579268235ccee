//! The [`Dashboard`] controller: owns the client, credentials, demo fixture
//! and session state. Loading operations live in `registry`, `aggregate`
//! and `enrich`.

use std::path::PathBuf;
use std::time::Duration;

use aoiwatch_client::{MonitorAction, MonitoringClient, RawResponse};
use aoiwatch_core::{AppConfig, Banner, BannerKind, BannerState, CreateMonitorRequest};
use tokio::sync::broadcast;

use crate::credentials::{CredentialStore, FileScope};
use crate::demo::DemoFixture;
use crate::error::DashboardError;
use crate::state::{DashboardState, StateChange};

/// Tunables the dashboard reads while loading.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub monitor_page_limit: u32,
    pub preview_size_px: u32,
    /// Preview served for demo events instead of the bundled asset.
    pub demo_image_path: Option<PathBuf>,
    pub banner_dismiss: Duration,
}

impl DashboardSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            monitor_page_limit: config.monitor_page_limit,
            preview_size_px: config.preview_size_px,
            demo_image_path: config.demo_image_path.clone(),
            banner_dismiss: Duration::from_secs(config.banner_dismiss_secs),
        }
    }
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            monitor_page_limit: 1000,
            preview_size_px: 512,
            demo_image_path: None,
            banner_dismiss: Duration::from_secs(5),
        }
    }
}

#[derive(Debug)]
pub struct Dashboard {
    pub(crate) client: MonitoringClient,
    pub(crate) credentials: CredentialStore,
    pub(crate) fixture: DemoFixture,
    pub(crate) state: DashboardState,
    pub(crate) settings: DashboardSettings,
}

impl Dashboard {
    /// # Errors
    ///
    /// Returns [`DashboardError::Fixture`] if the bundled demo fixture is invalid.
    pub fn new(
        client: MonitoringClient,
        credentials: CredentialStore,
        settings: DashboardSettings,
    ) -> Result<Self, DashboardError> {
        let fixture = DemoFixture::bundled()?;
        let state = DashboardState::new(BannerState::new(settings.banner_dismiss));
        Ok(Self {
            client,
            credentials,
            fixture,
            state,
            settings,
        })
    }

    /// Builds a dashboard from application config, with file-backed session
    /// and persistent credential scopes.
    ///
    /// # Errors
    ///
    /// - [`DashboardError::Fetch`] if the HTTP client cannot be built or the
    ///   base URL is invalid.
    /// - A storage error if a credential file exists but cannot be read.
    pub fn from_config(config: &AppConfig) -> Result<Self, DashboardError> {
        let client = MonitoringClient::with_base_url(
            config.request_timeout_secs,
            &config.user_agent,
            &config.api_base_url,
        )?;
        let credentials = CredentialStore::load(
            Box::new(FileScope::new(config.session_path.clone())),
            Box::new(FileScope::new(config.credentials_path.clone())),
        )?;
        let mut dashboard = Self::new(client, credentials, DashboardSettings::from_config(config))?;
        if config.demo_mode {
            dashboard.state.set_demo_mode(true);
        }
        Ok(dashboard)
    }

    #[must_use]
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    #[must_use]
    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn credentials_mut(&mut self) -> &mut CredentialStore {
        &mut self.credentials
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.state.subscribe()
    }

    /// Flips demo mode and returns the new value.
    pub fn toggle_demo_mode(&mut self) -> bool {
        let on = !self.state.demo_mode();
        self.state.set_demo_mode(on);
        tracing::info!(demo_mode = on, "demo mode toggled");
        on
    }

    pub fn set_banner(&mut self, kind: BannerKind, message: impl Into<String>) {
        self.state.set_banner(kind, message);
    }

    pub fn clear_banner(&mut self) {
        self.state.clear_banner();
    }

    #[must_use]
    pub fn banner(&self) -> Banner {
        self.state.banner()
    }

    /// Validates `api_key` with the provider and stores it on success.
    ///
    /// # Errors
    ///
    /// See [`CredentialStore::validate`].
    pub async fn check_api_key(&mut self, api_key: &str) -> Result<(), DashboardError> {
        self.credentials.validate(&self.client, api_key).await
    }

    /// # Errors
    ///
    /// Returns a storage error if a credential scope cannot be written.
    pub fn logout(&mut self) -> Result<(), DashboardError> {
        self.credentials.logout()
    }

    /// Enables or disables a monitor. State is left untouched; the caller
    /// refetches if it wants the new status.
    ///
    /// # Errors
    ///
    /// - [`DashboardError::NotAuthenticated`] if no key is in the session.
    /// - [`DashboardError::Fetch`] on network failure. A non-2xx status is
    ///   returned in the [`RawResponse`], not as an error.
    pub async fn toggle_monitor_status(
        &self,
        monitor_id: &str,
        action: MonitorAction,
    ) -> Result<RawResponse, DashboardError> {
        let credential = self.credentials.session_credential()?;
        match self
            .client
            .set_monitor_enabled(&credential.api_key, monitor_id, action)
            .await
        {
            Ok(response) => {
                tracing::info!(
                    monitor_id,
                    action = %action,
                    status = response.status,
                    "monitor status request sent"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::error!(monitor_id, action = %action, error = %e, "monitor status request failed");
                Err(e.into())
            }
        }
    }

    /// Creates a monitor owned by the session's key: `metadata.creator_key`
    /// is overwritten with the key hash.
    ///
    /// # Errors
    ///
    /// - [`DashboardError::NotAuthenticated`] if no key is in the session.
    /// - [`DashboardError::Fetch`] on network failure.
    pub async fn create_monitor(
        &self,
        mut request: CreateMonitorRequest,
    ) -> Result<RawResponse, DashboardError> {
        let credential = self.credentials.session_credential()?;
        request.metadata.creator_key = Some(credential.api_key_hash.clone());
        match self
            .client
            .create_monitor(&credential.api_key, &request)
            .await
        {
            Ok(response) => {
                tracing::info!(
                    store_name = %request.metadata.store_name,
                    status = response.status,
                    "monitor create request sent"
                );
                Ok(response)
            }
            Err(e) => {
                tracing::error!(error = %e, "monitor create request failed");
                Err(e.into())
            }
        }
    }
}
