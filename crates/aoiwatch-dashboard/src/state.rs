//! Session state owned by the [`Dashboard`](crate::Dashboard).
//!
//! Readers get shared references; every mutation goes through a
//! crate-internal method that also publishes a [`StateChange`].

use std::collections::{HashMap, HashSet};

use aoiwatch_client::SearchResponse;
use aoiwatch_core::{Banner, BannerKind, BannerState, Event, Monitor, MonitorIndex, RawEvent};
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Source metadata recorded for an event.
#[derive(Debug, Clone, PartialEq)]
pub enum EventSource {
    /// Catalog search result for the event's imagery, live or synthesized.
    Search(SearchResponse),
    /// The event's own record, used when it references no imagery.
    Event(RawEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Wms,
    DemoAsset,
    DemoPlaceholder,
}

/// A displayable preview held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub origin: ImageOrigin,
}

impl PreviewImage {
    /// File extension matching the content type, for writing previews to disk.
    #[must_use]
    pub fn file_extension(&self) -> &'static str {
        match self.content_type.split(';').next().map(str::trim) {
            Some("image/png") => "png",
            Some("image/jpeg") => "jpg",
            Some("image/svg+xml") => "svg",
            Some("image/gif") => "gif",
            Some("image/webp") => "webp",
            _ => "bin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventImage {
    Preview(PreviewImage),
    /// The event has no imagery; show a placeholder.
    NoImage,
}

impl EventImage {
    #[must_use]
    pub fn is_no_image(&self) -> bool {
        matches!(self, EventImage::NoImage)
    }
}

/// Published after each state mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    DemoMode(bool),
    Monitors { count: usize },
    Events { count: usize },
    Source { key: String },
    Image { key: String },
    Banner,
}

#[derive(Debug)]
pub struct DashboardState {
    demo_mode: bool,
    monitors: Vec<Monitor>,
    monitor_index: MonitorIndex,
    events: Vec<Event>,
    event_sources: HashMap<String, EventSource>,
    event_images: HashMap<String, EventImage>,
    in_flight: HashSet<String>,
    banner: BannerState,
    changes: broadcast::Sender<StateChange>,
}

impl DashboardState {
    #[must_use]
    pub fn new(banner: BannerState) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            demo_mode: false,
            monitors: Vec::new(),
            monitor_index: MonitorIndex::default(),
            events: Vec::new(),
            event_sources: HashMap::new(),
            event_images: HashMap::new(),
            in_flight: HashSet::new(),
            banner,
            changes,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    #[must_use]
    pub fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    #[must_use]
    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    #[must_use]
    pub fn monitor_index(&self) -> &MonitorIndex {
        &self.monitor_index
    }

    /// Aggregated events in monitor order.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn event_source(&self, key: &str) -> Option<&EventSource> {
        self.event_sources.get(key)
    }

    #[must_use]
    pub fn event_image(&self, key: &str) -> Option<&EventImage> {
        self.event_images.get(key)
    }

    #[must_use]
    pub fn event_images(&self) -> &HashMap<String, EventImage> {
        &self.event_images
    }

    /// The key an event's source and image are stored under.
    #[must_use]
    pub fn lookup_key(event: &Event) -> &str {
        event.image_id().unwrap_or(&event.id)
    }

    #[must_use]
    pub fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.contains(key)
    }

    #[must_use]
    pub fn banner(&self) -> Banner {
        self.banner.view()
    }

    pub(crate) fn set_demo_mode(&mut self, on: bool) {
        self.demo_mode = on;
        self.publish(StateChange::DemoMode(on));
    }

    /// Replaces the monitor list and rebuilds the index. Returns the new count.
    pub(crate) fn replace_monitors(&mut self, monitors: Vec<Monitor>) -> usize {
        self.monitor_index = MonitorIndex::build(&monitors);
        self.monitors = monitors;
        let count = self.monitors.len();
        self.publish(StateChange::Monitors { count });
        count
    }

    pub(crate) fn replace_events(&mut self, events: Vec<Event>) -> usize {
        self.events = events;
        let count = self.events.len();
        self.publish(StateChange::Events { count });
        count
    }

    pub(crate) fn insert_source(&mut self, key: &str, source: EventSource) {
        self.event_sources.insert(key.to_owned(), source);
        self.publish(StateChange::Source {
            key: key.to_owned(),
        });
    }

    pub(crate) fn insert_image(&mut self, key: &str, image: EventImage) {
        self.event_images.insert(key.to_owned(), image);
        self.publish(StateChange::Image {
            key: key.to_owned(),
        });
    }

    /// Marks `key` as being fetched. Returns `false` if it already was.
    pub(crate) fn begin_fetch(&mut self, key: &str) -> bool {
        self.in_flight.insert(key.to_owned())
    }

    pub(crate) fn finish_fetch(&mut self, key: &str) {
        self.in_flight.remove(key);
    }

    pub(crate) fn set_banner(&mut self, kind: BannerKind, message: impl Into<String>) {
        self.banner.set(kind, message);
        self.publish(StateChange::Banner);
    }

    pub(crate) fn clear_banner(&mut self) {
        self.banner.clear();
        self.publish(StateChange::Banner);
    }

    fn publish(&self, change: StateChange) {
        // No receivers is fine.
        let _ = self.changes.send(change);
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(BannerState::default())
    }
}
