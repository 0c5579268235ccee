//! End-to-end dashboard flows against wiremock.

use aoiwatch_client::{MonitorAction, MonitoringClient};
use aoiwatch_core::CreateMonitorRequest;
use aoiwatch_dashboard::{
    hash_api_key, CredentialStore, Dashboard, DashboardError, DashboardSettings, EventImage,
    EventSource, ImageOrigin, StateChange,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";

fn dashboard(server: &MockServer) -> Dashboard {
    let client = MonitoringClient::with_base_url(5, "aoiwatch-test/0.1", &server.uri())
        .expect("client construction should not fail");
    Dashboard::new(
        client,
        CredentialStore::in_memory(),
        DashboardSettings::default(),
    )
    .expect("bundled fixture must parse")
}

fn logged_in(server: &MockServer) -> Dashboard {
    let mut dashboard = dashboard(server);
    dashboard
        .credentials_mut()
        .save_api_key(API_KEY)
        .expect("memory scope write");
    dashboard
}

async fn mount_monitors(server: &MockServer, monitors: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/monitoring/v1/monitors"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "monitors": monitors } })),
        )
        .mount(server)
        .await;
}

async fn mount_events(server: &MockServer, monitor_id: &str, events: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/monitoring/v1/monitors/{monitor_id}/events")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "events": events } })),
        )
        .mount(server)
        .await;
}

fn search_body(image_id: &str) -> serde_json::Value {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "id": image_id,
            "bbox": [-105.0, 39.7, -104.9, 39.8],
            "properties": { "platform": "worldview-03" }
        }]
    })
}

#[tokio::test]
async fn check_api_key_stores_sha256_hash() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/streaming/v1/ogc/ows"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut dashboard = dashboard(&server);
    dashboard
        .check_api_key("abc")
        .await
        .expect("key should validate");

    let credential = dashboard.credentials().current().expect("credential stored");
    assert_eq!(
        credential.api_key_hash,
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert!(dashboard.credentials().is_valid().unwrap());
}

#[tokio::test]
async fn rejected_api_key_is_not_stored() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/streaming/v1/ogc/ows"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let mut dashboard = dashboard(&server);
    let err = dashboard.check_api_key("nope").await.unwrap_err();

    assert!(matches!(err, DashboardError::Authentication(_)), "got: {err:?}");
    assert!(dashboard.credentials().current().is_none());
    assert!(!dashboard.credentials().is_valid().unwrap());
}

#[tokio::test]
async fn fetch_monitors_filters_by_key_hash_and_store_name() {
    let server = MockServer::start().await;
    let filter = format!("metadata.creator_key:{}", hash_api_key(API_KEY));
    Mock::given(method("GET"))
        .and(path("/monitoring/v1/monitors"))
        .and(query_param("filter", filter.as_str()))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "monitors": [
                { "id": "a", "metadata": { "store_name": "Store A" } },
                { "id": "b", "metadata": { "store_name": "" } },
                { "id": "c", "metadata": {} }
            ] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut dashboard = logged_in(&server);
    let retained = dashboard.fetch_monitors().await.expect("fetch");

    assert_eq!(retained, 1);
    assert_eq!(dashboard.state().monitors()[0].id, "a");
    assert!(dashboard.state().monitor_index().get("a").is_some());
    assert!(dashboard.state().monitor_index().get("c").is_none());
}

#[tokio::test]
async fn failed_monitor_fetch_keeps_previous_list() {
    let server = MockServer::start().await;
    mount_monitors(
        &server,
        json!([{ "id": "a", "metadata": { "store_name": "Store A" } }]),
    )
    .await;

    let mut dashboard = logged_in(&server);
    dashboard.fetch_monitors().await.expect("first fetch");

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/monitoring/v1/monitors"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = dashboard.fetch_monitors().await.unwrap_err();
    assert!(matches!(err, DashboardError::Fetch(_)), "got: {err:?}");
    assert_eq!(dashboard.state().monitors().len(), 1);
    assert!(dashboard.state().monitor_index().get("a").is_some());
}

#[tokio::test]
async fn fetch_monitors_without_session_key_is_not_authenticated() {
    let server = MockServer::start().await;
    let mut dashboard = dashboard(&server);

    let err = dashboard.fetch_monitors().await.unwrap_err();
    assert!(matches!(err, DashboardError::NotAuthenticated));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn fetch_all_events_flattens_in_monitor_order_and_skips_failures() {
    let server = MockServer::start().await;
    mount_monitors(
        &server,
        json!([
            { "id": "A", "metadata": { "store_name": "Store A", "address": "1 Main" } },
            { "id": "B", "metadata": { "store_name": "Store B" } }
        ]),
    )
    .await;
    mount_events(
        &server,
        "A",
        json!([
            { "id": "a1", "event_timestamp": "2025-02-02T00:00:00Z", "event": { "type": "status" } },
            { "id": "a2", "event_timestamp": "2025-02-01T00:00:00Z", "event": { "type": "status" } }
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/monitoring/v1/monitors/B/events"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut dashboard = logged_in(&server);
    dashboard.fetch_monitors().await.expect("monitors");
    let summary = dashboard.fetch_all_events().await;

    assert_eq!(summary.monitors, 2);
    assert_eq!(summary.events, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].monitor_id, "B");

    let events = dashboard.state().events();
    let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["a1", "a2"]);
    assert_eq!(events[0].store_name, "Store A");
    assert_eq!(events[0].address, "1 Main");
    assert_eq!(events[0].market_segment, "");
}

#[tokio::test]
async fn event_without_imagery_gets_no_image_and_own_metadata() {
    let server = MockServer::start().await;
    mount_monitors(
        &server,
        json!([{ "id": "A", "metadata": { "store_name": "Store A" } }]),
    )
    .await;
    mount_events(
        &server,
        "A",
        json!([{ "id": "e1", "event_timestamp": "t", "event": { "type": "status" } }]),
    )
    .await;

    let mut dashboard = logged_in(&server);
    dashboard.fetch_monitors().await.expect("monitors");
    let summary = dashboard.fetch_all_events().await;

    assert_eq!(summary.enrichment.no_image, 1);
    assert_eq!(summary.enrichment.dispatched, 0);
    assert_eq!(
        dashboard.state().event_image("e1"),
        Some(&EventImage::NoImage)
    );
    match dashboard.state().event_source("e1") {
        Some(EventSource::Event(raw)) => assert_eq!(raw.id, "e1"),
        other => panic!("expected event metadata as source, got {other:?}"),
    }
}

#[tokio::test]
async fn enrichment_stores_search_source_and_wms_preview() {
    let server = MockServer::start().await;
    mount_monitors(
        &server,
        json!([{ "id": "A", "metadata": { "store_name": "Store A" } }]),
    )
    .await;
    mount_events(
        &server,
        "A",
        json!([
            { "id": "e1", "event_timestamp": "t1", "event": { "type": "image", "event_id": "img-1" } },
            { "id": "e2", "event_timestamp": "t2", "event": { "type": "image", "event_id": "img-1" } }
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/discovery/v1/search"))
        .and(query_param("ids", "img-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body("img-1")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/streaming/v1/ogc/wms"))
        .and(query_param("cql_Filter", "legacyIdentifier='img-1'"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1_u8, 2, 3], "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let mut dashboard = logged_in(&server);
    dashboard.fetch_monitors().await.expect("monitors");
    let summary = dashboard.fetch_all_events().await;

    assert_eq!(summary.enrichment.dispatched, 1);
    assert_eq!(summary.enrichment.skipped, 1);
    assert!(summary.enrichment.failures.is_empty());

    match dashboard.state().event_image("img-1") {
        Some(EventImage::Preview(preview)) => {
            assert_eq!(preview.origin, ImageOrigin::Wms);
            assert_eq!(preview.bytes, vec![1, 2, 3]);
        }
        other => panic!("expected preview, got {other:?}"),
    }
    assert!(matches!(
        dashboard.state().event_source("img-1"),
        Some(EventSource::Search(_))
    ));
    assert!(!dashboard.state().is_in_flight("img-1"));

    // Already loaded: a second pass makes no requests.
    let again = dashboard.fetch_all_events_info().await;
    assert_eq!(again.dispatched, 0);
    assert_eq!(again.skipped, 2);
}

#[tokio::test]
async fn one_failed_search_does_not_block_other_images_and_is_retried() {
    let server = MockServer::start().await;
    mount_monitors(
        &server,
        json!([{ "id": "A", "metadata": { "store_name": "Store A" } }]),
    )
    .await;
    mount_events(
        &server,
        "A",
        json!([
            { "id": "e1", "event_timestamp": "t1", "event": { "type": "image", "event_id": "img-ok" } },
            { "id": "e2", "event_timestamp": "t2", "event": { "type": "image", "event_id": "img-bad" } }
        ]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/discovery/v1/search"))
        .and(query_param("ids", "img-ok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body("img-ok")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/discovery/v1/search"))
        .and(query_param("ids", "img-bad"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/streaming/v1/ogc/wms"))
        .and(query_param("cql_Filter", "legacyIdentifier='img-ok'"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![7_u8, 8], "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let mut dashboard = logged_in(&server);
    dashboard.fetch_monitors().await.expect("monitors");
    let summary = dashboard.fetch_all_events().await;

    assert_eq!(summary.enrichment.dispatched, 2);
    assert_eq!(summary.enrichment.failures.len(), 1);
    assert_eq!(summary.enrichment.failures[0].image_id, "img-bad");
    assert!(matches!(
        summary.enrichment.failures[0].error,
        DashboardError::Fetch(_)
    ));

    let state = dashboard.state();
    assert!(matches!(
        state.event_image("img-ok"),
        Some(EventImage::Preview(_))
    ));
    assert!(state.event_image("img-bad").is_none());
    assert!(state.event_source("img-bad").is_none());
    assert!(!state.is_in_flight("img-bad"));
    assert!(!state.is_in_flight("img-ok"));

    // Only the failed image goes out again.
    let again = dashboard.fetch_all_events_info().await;
    assert_eq!(again.dispatched, 1);
    assert_eq!(again.skipped, 1);
    assert_eq!(again.failures.len(), 1);
    assert_eq!(again.failures[0].image_id, "img-bad");
}

#[tokio::test]
async fn failed_preview_leaves_image_unset_for_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discovery/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body("img-9")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/streaming/v1/ogc/wms"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut dashboard = logged_in(&server);
    let err = dashboard.fetch_event_info("img-9").await.unwrap_err();

    assert!(matches!(err, DashboardError::Fetch(_)), "got: {err:?}");
    assert!(dashboard.state().event_image("img-9").is_none());
    assert!(dashboard.state().event_source("img-9").is_some());
    assert!(!dashboard.state().is_in_flight("img-9"));
}

#[tokio::test]
async fn search_without_bbox_is_a_data_shape_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discovery/v1/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "features": [] })))
        .mount(&server)
        .await;

    let mut dashboard = logged_in(&server);
    let err = dashboard.fetch_event_info("img-0").await.unwrap_err();

    assert!(matches!(err, DashboardError::DataShape(_)), "got: {err:?}");
    assert!(dashboard.state().event_image("img-0").is_none());
}

#[tokio::test]
async fn demo_mode_loads_fixture_without_network() {
    let server = MockServer::start().await;
    let mut dashboard = dashboard(&server);
    assert!(dashboard.toggle_demo_mode());

    let retained = dashboard.refresh_monitors().await.expect("demo monitors");
    assert_eq!(retained, 2, "the unlabelled fixture monitor is dropped");

    let summary = dashboard.fetch_all_events().await;
    assert!(summary.failures.is_empty());
    assert_eq!(summary.events, 4);
    assert_eq!(summary.enrichment.no_image, 1);
    assert_eq!(summary.enrichment.dispatched, 3);
    assert!(summary.enrichment.failures.is_empty());

    let first = &dashboard.state().events()[0];
    assert_eq!(first.store_name, "Larimer Square Market");
    let key = first.image_id().expect("demo event has imagery");
    match dashboard.state().event_image(key) {
        Some(EventImage::Preview(preview)) => assert_eq!(preview.origin, ImageOrigin::DemoAsset),
        other => panic!("expected demo preview, got {other:?}"),
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn toggle_monitor_status_requires_session_key() {
    let server = MockServer::start().await;
    let dashboard = dashboard(&server);

    let err = dashboard
        .toggle_monitor_status("m1", MonitorAction::Enable)
        .await
        .unwrap_err();
    assert!(matches!(err, DashboardError::NotAuthenticated));
}

#[tokio::test]
async fn toggle_monitor_status_returns_raw_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/monitoring/v1/monitors/m1/enable"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = logged_in(&server);
    let response = dashboard
        .toggle_monitor_status("m1", MonitorAction::Enable)
        .await
        .expect("request sent");
    assert!(response.is_success());
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn create_monitor_stamps_creator_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/monitoring/v1/monitors"))
        .and(body_partial_json(json!({
            "metadata": { "store_name": "Store 9", "creator_key": hash_api_key(API_KEY) }
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let request: CreateMonitorRequest = serde_json::from_value(json!({
        "source": "maxar",
        "description": "Store 9",
        "aoi_geojson": { "type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]] },
        "match_criteria": { "platform": { "in": ["worldview-03"] } },
        "metadata": { "store_name": "Store 9", "creator_key": "spoofed" }
    }))
    .unwrap();

    let dashboard = logged_in(&server);
    let response = dashboard.create_monitor(request).await.expect("create");
    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn subscribers_see_state_changes() {
    let server = MockServer::start().await;
    let mut dashboard = dashboard(&server);
    let mut changes = dashboard.subscribe();

    dashboard.toggle_demo_mode();
    dashboard.fetch_demo_monitors();

    assert_eq!(changes.try_recv().unwrap(), StateChange::DemoMode(true));
    assert_eq!(
        changes.try_recv().unwrap(),
        StateChange::Monitors { count: 2 }
    );
}

#[tokio::test]
async fn logout_clears_credentials() {
    let server = MockServer::start().await;
    let mut dashboard = logged_in(&server);

    dashboard.logout().expect("logout");
    assert!(dashboard.credentials().current().is_none());
    assert!(dashboard.credentials().login_required());
    assert!(matches!(
        dashboard.credentials().session_credential(),
        Err(DashboardError::NotAuthenticated)
    ));
}
