//! Event aggregation across all known monitors.

use aoiwatch_core::{Event, RawEvent};
use futures::future::join_all;

use crate::dashboard::Dashboard;
use crate::demo::DEMO_MONITOR_PREFIX;
use crate::enrich::EnrichmentSummary;
use crate::error::DashboardError;

/// A monitor whose events could not be fetched.
#[derive(Debug)]
pub struct MonitorFailure {
    pub monitor_id: String,
    pub error: DashboardError,
}

/// Outcome of [`Dashboard::fetch_all_events`].
#[derive(Debug, Default)]
pub struct AggregateSummary {
    /// Monitors queried.
    pub monitors: usize,
    /// Events stored after flattening.
    pub events: usize,
    pub failures: Vec<MonitorFailure>,
    pub enrichment: EnrichmentSummary,
}

impl Dashboard {
    /// Fetches and shapes the events of one monitor.
    ///
    /// In demo mode, `demo:` ids are served from the bundled fixture.
    ///
    /// # Errors
    ///
    /// - [`DashboardError::NotAuthenticated`] if no key is in the session.
    /// - [`DashboardError::Fetch`] on network failure, a non-2xx status or a
    ///   malformed body.
    pub async fn fetch_monitor_events(&self, monitor_id: &str) -> Result<Vec<Event>, DashboardError> {
        if self.state.demo_mode() && monitor_id.starts_with(DEMO_MONITOR_PREFIX) {
            return Ok(self.fetch_demo_monitor_events(monitor_id));
        }
        let credential = self.credentials.session_credential()?;
        let raw = self
            .client
            .monitor_events(&credential.api_key, monitor_id)
            .await?;
        Ok(self.shape_events(monitor_id, raw))
    }

    /// Fixture events for `monitor_id`; an unknown id has none.
    #[must_use]
    pub fn fetch_demo_monitor_events(&self, monitor_id: &str) -> Vec<Event> {
        self.shape_events(monitor_id, self.fixture.events_for(monitor_id))
    }

    /// Fetches every known monitor's events concurrently, stores them in
    /// monitor order, then runs enrichment over the new collection.
    ///
    /// A failing monitor contributes no events and is listed in the summary.
    pub async fn fetch_all_events(&mut self) -> AggregateSummary {
        let ids: Vec<String> = self.state.monitors().iter().map(|m| m.id.clone()).collect();

        let results = {
            let this = &*self;
            join_all(ids.iter().map(|id| this.fetch_monitor_events(id))).await
        };

        let mut events = Vec::new();
        let mut failures = Vec::new();
        for (monitor_id, result) in ids.iter().zip(results) {
            match result {
                Ok(mut batch) => events.append(&mut batch),
                Err(error) => {
                    tracing::warn!(monitor_id = %monitor_id, error = %error, "failed to fetch monitor events");
                    failures.push(MonitorFailure {
                        monitor_id: monitor_id.clone(),
                        error,
                    });
                }
            }
        }

        let stored = self.state.replace_events(events);
        tracing::info!(
            monitors = ids.len(),
            events = stored,
            failed = failures.len(),
            "events aggregated"
        );

        let enrichment = self.fetch_all_events_info().await;
        AggregateSummary {
            monitors: ids.len(),
            events: stored,
            failures,
            enrichment,
        }
    }

    fn shape_events(&self, monitor_id: &str, raw: Vec<RawEvent>) -> Vec<Event> {
        let monitor = self.state.monitor_index().get(monitor_id);
        raw.into_iter()
            .map(|event| Event::from_raw(event, monitor))
            .collect()
    }
}
