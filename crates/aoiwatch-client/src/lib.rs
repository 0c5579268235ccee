pub mod client;
pub mod error;
pub mod types;

pub use client::MonitoringClient;
pub use error::ClientError;
pub use types::{BoundingBox, ImageBytes, MonitorAction, RawResponse, SearchFeature, SearchResponse};
