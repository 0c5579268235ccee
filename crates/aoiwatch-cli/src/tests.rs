use super::*;

#[test]
fn parses_login_with_key() {
    let cli =
        Cli::try_parse_from(["aoiwatch", "login", "--key", "abc"]).expect("expected valid cli args");

    assert!(!cli.demo);
    assert!(matches!(cli.command, Commands::Login { ref key } if key == "abc"));
}

#[test]
fn missing_command_is_rejected() {
    assert!(Cli::try_parse_from(["aoiwatch"]).is_err());
}

#[test]
fn demo_flag_is_global() {
    let cli = Cli::try_parse_from(["aoiwatch", "monitors", "--demo"]).unwrap();
    assert!(cli.demo);
    assert!(matches!(cli.command, Commands::Monitors));
}

#[test]
fn parses_events_options() {
    let cli = Cli::try_parse_from([
        "aoiwatch",
        "events",
        "--images-dir",
        "previews",
        "--json",
    ])
    .unwrap();

    assert!(matches!(
        cli.command,
        Commands::Events {
            images_dir: Some(ref dir),
            json: true
        } if dir == std::path::Path::new("previews")
    ));
}

#[test]
fn events_defaults_to_table_without_images() {
    let cli = Cli::try_parse_from(["aoiwatch", "events"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Events {
            images_dir: None,
            json: false
        }
    ));
}

#[test]
fn parses_enable_and_disable_ids() {
    let cli = Cli::try_parse_from(["aoiwatch", "enable", "m-1"]).unwrap();
    assert!(matches!(cli.command, Commands::Enable { ref id } if id == "m-1"));

    let cli = Cli::try_parse_from(["aoiwatch", "disable", "m-2"]).unwrap();
    assert!(matches!(cli.command, Commands::Disable { ref id } if id == "m-2"));
}

#[test]
fn enable_requires_an_id() {
    assert!(Cli::try_parse_from(["aoiwatch", "enable"]).is_err());
}

#[test]
fn parses_create_with_repeated_platforms() {
    let cli = Cli::try_parse_from([
        "aoiwatch",
        "create",
        "--store-name",
        "Store 1",
        "--aoi",
        "store1.geojson",
        "--platform",
        "worldview-02",
        "--platform",
        "worldview-03",
        "--max-cloud-cover",
        "25",
    ])
    .unwrap();

    let Commands::Create(args) = cli.command else {
        panic!("expected create command");
    };
    assert_eq!(args.store_name, "Store 1");
    assert_eq!(args.platforms, ["worldview-02", "worldview-03"]);
    assert_eq!(args.max_cloud_cover, Some(25.0));
    assert!(args.max_off_nadir.is_none());
}

const SQUARE: &str = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#;

#[test]
fn parse_aoi_accepts_bare_polygon() {
    let aoi = monitors::parse_aoi(SQUARE).unwrap();
    assert_eq!(aoi.kind, "Polygon");
    assert_eq!(aoi.coordinates[0].len(), 4);
}

#[test]
fn parse_aoi_unwraps_feature_and_collection() {
    let feature = format!(r#"{{"type":"Feature","properties":{{}},"geometry":{SQUARE}}}"#);
    assert!(monitors::parse_aoi(&feature).is_ok());

    let collection = format!(r#"{{"type":"FeatureCollection","features":[{feature}]}}"#);
    assert!(monitors::parse_aoi(&collection).is_ok());
}

#[test]
fn parse_aoi_rejects_non_polygons() {
    let point = r#"{"type":"Point","coordinates":[0,0]}"#;
    assert!(monitors::parse_aoi(point).is_err());

    let open = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0]]]}"#;
    assert!(monitors::parse_aoi(open).is_err());
}

#[test]
fn build_request_defaults_platforms_and_description() {
    let cli = Cli::try_parse_from([
        "aoiwatch",
        "create",
        "--store-name",
        "Store 2",
        "--aoi",
        "a.geojson",
        "--max-off-nadir",
        "20",
    ])
    .unwrap();
    let Commands::Create(args) = cli.command else {
        panic!("expected create command");
    };

    let request = monitors::build_request(args, monitors::parse_aoi(SQUARE).unwrap());

    assert_eq!(request.description, "Store 2");
    assert_eq!(request.source, "maxar");
    let platforms = &request.match_criteria.platform.as_ref().unwrap().platforms;
    assert_eq!(platforms.len(), aoiwatch_core::DEFAULT_PLATFORMS.len());
    assert!(request.match_criteria.cloud_cover.is_none());
    assert_eq!(
        request.match_criteria.off_nadir.as_ref().and_then(|m| m.get("lte")),
        Some(&20.0)
    );
    assert!(request.metadata.creator_key.is_none());
}

#[test]
fn file_stem_replaces_path_characters() {
    assert_eq!(events::file_stem("demo-image:larimer/1"), "demo-image_larimer_1");
    assert_eq!(events::file_stem("1040010012345600"), "1040010012345600");
}

#[test]
fn truncate_marks_cut_text() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a very long store name", 10), "a very ...");
}

#[test]
fn or_dash_treats_empty_as_missing() {
    assert_eq!(or_dash(Some("")), "\u{2014}");
    assert_eq!(or_dash(None), "\u{2014}");
    assert_eq!(or_dash(Some("x")), "x");
}
