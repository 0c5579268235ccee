//! Monitor events: the raw provider record and the dashboard view model.

use serde::{Deserialize, Serialize};

use crate::monitors::Monitor;

/// An event as returned by `GET /monitors/{id}/events`.
///
/// Fields the dashboard does not read are kept in `extra` so the record can
/// be shown or re-serialized without loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    pub event_timestamp: String,
    #[serde(default)]
    pub event: EventDetail,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The nested `event` object of a [`RawEvent`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Imagery identifier; absent when the event carries no capture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawEvent {
    /// The imagery identifier, treating an empty string as absent.
    #[must_use]
    pub fn image_id(&self) -> Option<&str> {
        self.event.event_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// A raw event joined with its owning monitor's store metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub store_name: String,
    pub market_segment: String,
    pub address: String,
    pub metadata: RawEvent,
}

impl Event {
    /// Shape a raw event for display.
    ///
    /// Missing upstream values, including a missing monitor, become `""`.
    #[must_use]
    pub fn from_raw(raw: RawEvent, monitor: Option<&Monitor>) -> Self {
        let meta = monitor.map(|m| &m.metadata);
        let text = |value: Option<&String>| value.cloned().unwrap_or_default();
        Self {
            id: raw.id.clone(),
            event_timestamp: raw.event_timestamp.clone(),
            kind: raw.event.kind.clone().unwrap_or_default(),
            store_name: text(meta.and_then(|m| m.store_name.as_ref())),
            market_segment: text(meta.and_then(|m| m.market_segment.as_ref())),
            address: text(meta.and_then(|m| m.address.as_ref())),
            metadata: raw,
        }
    }

    #[must_use]
    pub fn image_id(&self) -> Option<&str> {
        self.metadata.image_id()
    }
}
