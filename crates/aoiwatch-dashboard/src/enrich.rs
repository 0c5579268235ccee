//! Per-event enrichment: catalog source metadata and a preview image for
//! every stored event.
//!
//! Results are keyed by imagery id, or by event id for events without
//! imagery. A failed live fetch leaves its image key unset so the next pass
//! picks it up again.

use aoiwatch_client::{MonitoringClient, SearchResponse};
use futures::stream::{FuturesUnordered, StreamExt};

use crate::dashboard::{Dashboard, DashboardSettings};
use crate::demo::{self, DEMO_IMAGE_PREFIX};
use crate::error::DashboardError;
use crate::state::{DashboardState, EventImage, EventSource, ImageOrigin, PreviewImage};

/// An imagery id whose enrichment failed.
#[derive(Debug)]
pub struct EnrichmentFailure {
    pub image_id: String,
    pub error: DashboardError,
}

/// Outcome of [`Dashboard::fetch_all_events_info`].
#[derive(Debug, Default)]
pub struct EnrichmentSummary {
    /// Imagery ids handed to demo or live enrichment.
    pub dispatched: usize,
    /// Events without imagery, marked with [`EventImage::NoImage`].
    pub no_image: usize,
    /// Imagery ids already loaded or already in flight.
    pub skipped: usize,
    pub failures: Vec<EnrichmentFailure>,
}

enum Step {
    NoImage { event_id: String, source: aoiwatch_core::RawEvent },
    Fetch { image_id: String, event_id: String },
}

struct LiveOutcome {
    image_id: String,
    source: Option<SearchResponse>,
    image: Result<PreviewImage, DashboardError>,
}

impl Dashboard {
    /// Enriches every stored event that still lacks an image.
    pub async fn fetch_all_events_info(&mut self) -> EnrichmentSummary {
        let Self {
            client,
            credentials,
            state,
            settings,
            ..
        } = self;

        let steps: Vec<Step> = state
            .events()
            .iter()
            .map(|event| match event.image_id() {
                None => Step::NoImage {
                    event_id: event.id.clone(),
                    source: event.metadata.clone(),
                },
                Some(image_id) => Step::Fetch {
                    image_id: image_id.to_owned(),
                    event_id: event.id.clone(),
                },
            })
            .collect();

        let mut summary = EnrichmentSummary::default();
        let mut live = Vec::new();
        let mut demo_jobs = Vec::new();

        for step in steps {
            match step {
                Step::NoImage { event_id, source } => {
                    state.insert_source(&event_id, EventSource::Event(source));
                    state.insert_image(&event_id, EventImage::NoImage);
                    summary.no_image += 1;
                }
                Step::Fetch { image_id, event_id } => {
                    if state.event_image(&image_id).is_some() || !state.begin_fetch(&image_id) {
                        summary.skipped += 1;
                        continue;
                    }
                    summary.dispatched += 1;
                    if state.demo_mode() && image_id.starts_with(DEMO_IMAGE_PREFIX) {
                        demo_jobs.push((image_id, event_id));
                    } else {
                        live.push(image_id);
                    }
                }
            }
        }

        for (image_id, event_id) in demo_jobs {
            apply_demo(state, settings, &image_id, &event_id).await;
            state.finish_fetch(&image_id);
        }

        if !live.is_empty() {
            let credential = credentials.session_credential();
            if let Err(e) = &credential {
                tracing::warn!(error = %e, pending = live.len(), "no session credential for enrichment");
            }

            let client: &MonitoringClient = client;
            let size_px = settings.preview_size_px;
            let mut pending = FuturesUnordered::new();
            for image_id in live {
                match &credential {
                    Ok(credential) => {
                        pending.push(load_live(client, &credential.api_key, image_id, size_px));
                    }
                    Err(_) => {
                        state.finish_fetch(&image_id);
                        summary.failures.push(EnrichmentFailure {
                            image_id,
                            error: DashboardError::NotAuthenticated,
                        });
                    }
                }
            }

            while let Some(outcome) = pending.next().await {
                let image_id = outcome.image_id.clone();
                if let Err(error) = apply_live(state, outcome) {
                    summary.failures.push(EnrichmentFailure { image_id, error });
                }
            }
        }

        tracing::info!(
            dispatched = summary.dispatched,
            no_image = summary.no_image,
            skipped = summary.skipped,
            failed = summary.failures.len(),
            "event enrichment finished"
        );
        summary
    }

    /// Loads the catalog record and WMS preview for one imagery id.
    ///
    /// The source is stored as soon as the search succeeds, even if the
    /// preview then fails.
    ///
    /// # Errors
    ///
    /// - [`DashboardError::NotAuthenticated`] if no key is in the session.
    /// - [`DashboardError::DataShape`] if the first search feature has no
    ///   usable bbox.
    /// - [`DashboardError::Fetch`] if either request fails.
    pub async fn fetch_event_info(&mut self, image_id: &str) -> Result<(), DashboardError> {
        let credential = self.credentials.session_credential()?;
        let outcome = load_live(
            &self.client,
            &credential.api_key,
            image_id.to_owned(),
            self.settings.preview_size_px,
        )
        .await;
        apply_live(&mut self.state, outcome)
    }

    /// Stores a synthesized catalog record and the demo preview under
    /// `demo_image_id`.
    pub async fn fetch_demo_event_info(&mut self, demo_image_id: &str, event_id: &str) {
        apply_demo(&mut self.state, &self.settings, demo_image_id, event_id).await;
    }
}

async fn load_live(
    client: &MonitoringClient,
    api_key: &str,
    image_id: String,
    size_px: u32,
) -> LiveOutcome {
    let source = match client.search_imagery(api_key, &image_id).await {
        Ok(source) => source,
        Err(e) => {
            return LiveOutcome {
                image_id,
                source: None,
                image: Err(e.into()),
            }
        }
    };

    let image = match source.first_bbox() {
        Some(bbox) => client
            .wms_preview(api_key, &image_id, &bbox, size_px)
            .await
            .map(|preview| PreviewImage {
                content_type: preview.content_type,
                bytes: preview.bytes,
                origin: ImageOrigin::Wms,
            })
            .map_err(DashboardError::from),
        None => Err(DashboardError::DataShape(format!(
            "search result for {image_id} has no usable bbox"
        ))),
    };

    LiveOutcome {
        image_id,
        source: Some(source),
        image,
    }
}

fn apply_live(state: &mut DashboardState, outcome: LiveOutcome) -> Result<(), DashboardError> {
    let LiveOutcome {
        image_id,
        source,
        image,
    } = outcome;
    state.finish_fetch(&image_id);
    if let Some(source) = source {
        state.insert_source(&image_id, EventSource::Search(source));
    }
    match image {
        Ok(preview) => {
            tracing::debug!(image_id = %image_id, bytes = preview.bytes.len(), "preview loaded");
            state.insert_image(&image_id, EventImage::Preview(preview));
            Ok(())
        }
        Err(e) => {
            tracing::warn!(image_id = %image_id, error = %e, "event enrichment failed");
            Err(e)
        }
    }
}

async fn apply_demo(
    state: &mut DashboardState,
    settings: &DashboardSettings,
    demo_image_id: &str,
    event_id: &str,
) {
    state.insert_source(
        demo_image_id,
        EventSource::Search(demo::synthesize_source(demo_image_id)),
    );
    let preview = demo::demo_preview(settings.demo_image_path.as_deref()).await;
    tracing::debug!(image_id = demo_image_id, event_id, "demo preview loaded");
    state.insert_image(demo_image_id, EventImage::Preview(preview));
}
