//! HTTP client for the imagery provider's monitoring, discovery and
//! streaming APIs.
//!
//! Wraps `reqwest` with endpoint URL construction, API key handling and typed
//! response deserialization. Every request authenticates with the
//! `maxar_api_key` query parameter; that parameter is stripped from any URL
//! that ends up in a log line or error.

use std::time::Duration;

use aoiwatch_core::{CreateMonitorRequest, Monitor, RawEvent};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;

use crate::error::ClientError;
use crate::types::{
    BoundingBox, DataEnvelope, EventList, ImageBytes, MonitorAction, MonitorList, RawResponse,
    SearchResponse,
};

const API_KEY_PARAM: &str = "maxar_api_key";

/// Client for the provider REST API.
///
/// Holds no credentials: callers pass the API key per request so one client
/// can validate a candidate key before it is stored.
#[derive(Debug, Clone)]
pub struct MonitoringClient {
    client: Client,
    base_url: Url,
}

impl MonitoringClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// A `timeout_secs` of `0` disables the per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` is not an absolute hierarchical URL.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent);
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build()?;

        // Normalise to exactly one trailing slash so endpoint segments append
        // to the configured path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "URL cannot carry a path".to_owned(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// Checks a candidate API key with a lightweight `HEAD` on the OGC
    /// web-feature service.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UnexpectedStatus`] if the key is rejected.
    /// - [`ClientError::Http`] on network failure.
    pub async fn probe_api_key(&self, api_key: &str) -> Result<(), ClientError> {
        let url = self.build_url(
            &["streaming", "v1", "ogc", "ows"],
            &[
                ("service", "WFS"),
                ("request", "DescribeFeatureType"),
                ("version", "2.0.0"),
            ],
            api_key,
        );
        tracing::debug!(url = %redacted(&url), "HEAD");
        let response = self.client.head(url.clone()).send().await?;
        ensure_success(response, &url)?;
        Ok(())
    }

    /// Lists monitors created with the key whose hash is `creator_key_hash`,
    /// oldest first, in a single page of at most `limit`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx status.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the body is not a monitor envelope.
    ///
    /// Individual monitors that fail to parse are logged and skipped.
    pub async fn list_monitors(
        &self,
        api_key: &str,
        creator_key_hash: &str,
        limit: u32,
    ) -> Result<Vec<Monitor>, ClientError> {
        let filter = format!("metadata.creator_key:{creator_key_hash}");
        let limit = limit.to_string();
        let url = self.build_url(
            &["monitoring", "v1", "monitors"],
            &[("limit", &limit), ("sort", "asc"), ("filter", &filter)],
            api_key,
        );
        let envelope: DataEnvelope<MonitorList> = self.get_json(&url, "list monitors").await?;
        Ok(parse_monitors(envelope.data.monitors))
    }

    /// Fetches the events raised by one monitor.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx status.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the body does not match the
    ///   expected shape.
    pub async fn monitor_events(
        &self,
        api_key: &str,
        monitor_id: &str,
    ) -> Result<Vec<RawEvent>, ClientError> {
        let url = self.build_url(
            &["monitoring", "v1", "monitors", monitor_id, "events"],
            &[],
            api_key,
        );
        let envelope: DataEnvelope<EventList> = self
            .get_json(&url, &format!("events for monitor {monitor_id}"))
            .await?;
        Ok(envelope.data.events)
    }

    /// Looks up catalog metadata for one imagery identifier.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx status.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the body is not a feature collection.
    pub async fn search_imagery(
        &self,
        api_key: &str,
        image_id: &str,
    ) -> Result<SearchResponse, ClientError> {
        let url = self.build_url(
            &["discovery", "v1", "search"],
            &[("sortby", "datetime"), ("ids", image_id)],
            api_key,
        );
        self.get_json(&url, &format!("search for {image_id}")).await
    }

    /// Renders a square PNG of `image_id` cropped to `bbox` through the WMS
    /// `GetMap` endpoint.
    ///
    /// # Errors
    ///
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx status.
    /// - [`ClientError::Http`] on network failure.
    pub async fn wms_preview(
        &self,
        api_key: &str,
        image_id: &str,
        bbox: &BoundingBox,
        size_px: u32,
    ) -> Result<ImageBytes, ClientError> {
        let bbox_param = bbox.wms_param();
        let size = size_px.to_string();
        let cql = format!("legacyIdentifier='{image_id}'");
        let url = self.build_url(
            &["streaming", "v1", "ogc", "wms"],
            &[
                ("service", "WMS"),
                ("request", "GetMap"),
                ("version", "1.3.0"),
                ("bbox", &bbox_param),
                ("crs", "EPSG:4326"),
                ("layers", "Maxar:Imagery"),
                ("height", &size),
                ("width", &size),
                ("format", "image/png"),
                ("cql_Filter", &cql),
                ("transparent", "true"),
            ],
            api_key,
        );
        tracing::debug!(url = %redacted(&url), "GET");
        let response = self.client.get(url.clone()).send().await?;
        let response = ensure_success(response, &url)?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_owned();
        let bytes = response.bytes().await?.to_vec();
        Ok(ImageBytes {
            content_type,
            bytes,
        })
    }

    /// Enables or disables a monitor. The response is returned as-is for the
    /// caller to interpret; a non-2xx status is not an error here.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] on network failure.
    pub async fn set_monitor_enabled(
        &self,
        api_key: &str,
        monitor_id: &str,
        action: MonitorAction,
    ) -> Result<RawResponse, ClientError> {
        let url = self.build_url(
            &["monitoring", "v1", "monitors", monitor_id, action.as_str()],
            &[],
            api_key,
        );
        tracing::debug!(url = %redacted(&url), "POST");
        let response = self.client.post(url).send().await?;
        raw_response(response).await
    }

    /// Creates a monitor. Like [`Self::set_monitor_enabled`], the response is
    /// passed through untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] on network failure.
    pub async fn create_monitor(
        &self,
        api_key: &str,
        request: &CreateMonitorRequest,
    ) -> Result<RawResponse, ClientError> {
        let url = self.build_url(&["monitoring", "v1", "monitors"], &[], api_key);
        tracing::debug!(url = %redacted(&url), "POST");
        let response = self.client.post(url).json(request).send().await?;
        raw_response(response).await
    }

    /// Builds an endpoint URL from path segments and query parameters, with
    /// the API key appended last.
    ///
    /// Segments are percent-encoded individually, so ids containing `/` or
    /// `?` cannot escape their path position.
    fn build_url(&self, segments: &[&str], params: &[(&str, &str)], api_key: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
            pairs.append_pair(API_KEY_PARAM, api_key);
        }
        url
    }

    /// Sends a GET request, asserts a 2xx status, and parses the body as `T`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        context: &str,
    ) -> Result<T, ClientError> {
        tracing::debug!(url = %redacted(url), "GET");
        let response = self.client.get(url.clone()).send().await?;
        let response = ensure_success(response, url)?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

fn ensure_success(response: Response, url: &Url) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::UnexpectedStatus {
            status: status.as_u16(),
            url: redacted(url),
        })
    }
}

async fn raw_response(response: Response) -> Result<RawResponse, ClientError> {
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok(RawResponse { status, body })
}

/// Converts raw monitor records one at a time so a single record of an
/// unexpected shape does not hide the rest.
fn parse_monitors(records: Vec<serde_json::Value>) -> Vec<Monitor> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record
                .get("id")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_owned();
            match serde_json::from_value::<Monitor>(record) {
                Ok(monitor) => Some(monitor),
                Err(e) => {
                    tracing::warn!(monitor_id = %id, error = %e, "skipping unparseable monitor");
                    None
                }
            }
        })
        .collect()
}

/// Renders `url` without its API key parameter.
pub(crate) fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != API_KEY_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        shown.set_query(None);
    } else {
        shown.query_pairs_mut().clear().extend_pairs(kept);
    }
    shown.to_string()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
