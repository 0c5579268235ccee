//! Dashboard controller for imagery-provider monitors.
//!
//! [`Dashboard`] owns the API client, the credential store and all session
//! state. Loading runs in three stages: monitors, then every monitor's events
//! concurrently, then per-event source metadata and preview images
//! concurrently.

pub mod aggregate;
pub mod credentials;
pub mod dashboard;
pub mod demo;
pub mod enrich;
pub mod error;
pub mod registry;
pub mod state;

pub use aggregate::{AggregateSummary, MonitorFailure};
pub use credentials::{
    hash_api_key, Credential, CredentialScope, CredentialStore, FileScope, MemoryScope,
    API_KEY_HASH_NAME, API_KEY_NAME,
};
pub use dashboard::{Dashboard, DashboardSettings};
pub use demo::{DemoFixture, DEMO_IMAGE_PREFIX, DEMO_MONITOR_PREFIX};
pub use enrich::{EnrichmentFailure, EnrichmentSummary};
pub use error::DashboardError;
pub use state::{DashboardState, EventImage, EventSource, ImageOrigin, PreviewImage, StateChange};
