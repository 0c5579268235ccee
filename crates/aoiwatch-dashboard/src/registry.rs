//! Monitor registry: loads the monitor list and rebuilds the id index.

use aoiwatch_core::retain_store_monitors;

use crate::dashboard::Dashboard;
use crate::error::DashboardError;

impl Dashboard {
    /// Fetches the monitors created with the session's key and keeps those
    /// with a store name. Returns the number retained.
    ///
    /// On error the previous monitor list and index are left in place.
    ///
    /// # Errors
    ///
    /// - [`DashboardError::NotAuthenticated`] if no key is in the session.
    /// - [`DashboardError::Fetch`] on network failure, a non-2xx status or a
    ///   malformed body.
    pub async fn fetch_monitors(&mut self) -> Result<usize, DashboardError> {
        let credential = match self.credentials.session_credential() {
            Ok(credential) => credential,
            Err(e) => {
                tracing::error!(error = %e, "cannot fetch monitors");
                return Err(e);
            }
        };

        let monitors = match self
            .client
            .list_monitors(
                &credential.api_key,
                &credential.api_key_hash,
                self.settings.monitor_page_limit,
            )
            .await
        {
            Ok(monitors) => monitors,
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch monitors");
                return Err(e.into());
            }
        };

        let fetched = monitors.len();
        let retained = self.state.replace_monitors(retain_store_monitors(monitors));
        tracing::info!(fetched, retained, "monitors loaded");
        Ok(retained)
    }

    /// Loads monitors from the bundled fixture without touching the network.
    pub fn fetch_demo_monitors(&mut self) -> usize {
        let monitors = retain_store_monitors(self.fixture.monitors().to_vec());
        let retained = self.state.replace_monitors(monitors);
        tracing::info!(retained, "demo monitors loaded");
        retained
    }

    /// Loads monitors from the fixture in demo mode, otherwise from the API.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_monitors`].
    pub async fn refresh_monitors(&mut self) -> Result<usize, DashboardError> {
        if self.state.demo_mode() {
            Ok(self.fetch_demo_monitors())
        } else {
            self.fetch_monitors().await
        }
    }
}
