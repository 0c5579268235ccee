use aoiwatch_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The provider rejected a candidate API key, or could not be reached to check it.
    #[error("API key validation failed: {0}")]
    Authentication(#[source] ClientError),

    /// No API key in the session scope.
    #[error("not authenticated; log in with an API key first")]
    NotAuthenticated,

    #[error(transparent)]
    Fetch(#[from] ClientError),

    /// A response parsed but lacked a field the dashboard needs.
    #[error("unexpected data shape: {0}")]
    DataShape(String),

    #[error("credential storage error at {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("credential file {path} is not valid JSON: {source}")]
    StorageFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("bundled demo fixture is invalid: {0}")]
    Fixture(#[source] serde_json::Error),
}
