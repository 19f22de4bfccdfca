use chrono::{TimeZone, Utc};
use shared::splits::api::{
    Ack, ApiErrorBody, AreasList, ConfigDetail, ConfigStatus, ConfigsList, ConfigsSnapshot,
    NewPreset, NewPresetPosition, PresetDetail, PresetsList, SavedConfig, api_datetime,
};
use shared::splits::boundaries::{FeatureCollection, Geometry, Stratum};

const CONFIG_DETAIL: &str = r##"{
    "config": {
        "id": 42,
        "artcc": "ZDC",
        "config_name": "Evening Split",
        "status": "active",
        "start_time_utc": "2025-03-01 18:00:00",
        "end_time_utc": "2025-03-02 02:00:00",
        "created_at": "2025-02-28 15:30:12",
        "updated_at": "2025-03-01 17:59:01",
        "positions": [
            {
                "position_name": "METRO",
                "color": "#e63946",
                "sectors": ["ZDC50", "ZDC51"],
                "sort_order": 1,
                "start_time_utc": null,
                "end_time_utc": null,
                "frequency": "133.725",
                "controller_oi": "AB",
                "filters": {"route": {"dest": "DCA"}, "altitude": {"block": "240B350"}}
            },
            {
                "position_name": "SOUTH",
                "color": "#2563eb",
                "sectors": ["ZDC52"],
                "sort_order": 2,
                "start_time_utc": null,
                "end_time_utc": null
            }
        ]
    }
}"##;

const CONFIG_LIST: &str = r#"{
    "configs": [
        {"id": 42, "artcc": "ZDC", "config_name": "Evening Split", "status": "active",
         "created_at": "2025-02-28 15:30:12", "position_count": 2},
        {"id": 41, "artcc": "ZOB", "config_name": "Midday", "status": "draft",
         "created_at": "2025-02-27 09:00:00", "position_count": 4}
    ]
}"#;

const SCHEDULED_SNAPSHOT: &str = r##"{
    "timestamp": "2025-03-01T12:00:00Z",
    "configs": [
        {
            "id": 7,
            "artcc": "ZNY",
            "config_name": "Overnight",
            "status": "scheduled",
            "start_time_utc": "2025-03-02 04:00:00",
            "end_time_utc": null,
            "created_at": "2025-03-01 10:00:00",
            "updated_at": "2025-03-01 10:00:00",
            "positions": [
                {"position_name": "ALL", "color": "#808080", "sectors": ["ZNY10"], "sort_order": 1,
                 "start_time_utc": null, "end_time_utc": null,
                 "frequency": null, "controller_oi": null, "filters": null}
            ]
        }
    ]
}"##;

const PRESET_DETAIL: &str = r##"{
    "preset": {
        "id": 3,
        "preset_name": "ZDC 3-way",
        "artcc": "ZDC",
        "description": "Standard evening",
        "created_at": "2025-01-15T20:11:02Z",
        "updated_at": "2025-02-01T08:00:00Z",
        "positions": [
            {"id": 11, "position_name": "METRO", "sectors": ["ZDC50"], "color": "#4dabf7",
             "frequency": null, "sort_order": 0, "filters": null, "strata_filter": ["low", "high"]},
            {"id": 12, "position_name": "HIGH", "sectors": ["ZDC72"], "color": "#16a34a",
             "frequency": "134.15", "sort_order": 1, "filters": null, "strata_filter": null}
        ]
    }
}"##;

const BOUNDARIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": {"label": "ZDC50", "artcc": "ZDC", "sector": 50},
            "geometry": {"type": "Polygon", "coordinates": [[[-77.0, 38.0, 0], [-76.0, 38.0], [-76.0, 39.0], [-77.0, 38.0]]]}
        },
        {
            "type": "Feature",
            "properties": {"name": "ZDC Boundary", "id": "ZDC"},
            "geometry": {"type": "MultiPolygon", "coordinates": [[[[-78.0, 37.0], [-75.0, 37.0], [-75.0, 40.0], [-78.0, 37.0]]]]}
        },
        {
            "type": "Feature",
            "properties": {"label": "AWY J121"},
            "geometry": {"type": "LineString", "coordinates": [[-77.0, 38.0], [-76.0, 39.0]]}
        }
    ]
}"#;

#[test]
fn verify_config_detail_dto() -> Result<(), serde_json::Error> {
    let detail: ConfigDetail = serde_json::from_str(CONFIG_DETAIL)?;
    let config = detail.config;

    assert_eq!(config.id, 42);
    assert_eq!(config.status, ConfigStatus::Active);
    assert_eq!(
        config.start_time_utc,
        Some(Utc.with_ymd_and_hms(2025, 3, 1, 18, 0, 0).unwrap())
    );
    assert_eq!(config.positions.len(), 2);

    let metro = &config.positions[0];
    assert_eq!(metro.sectors, vec!["ZDC50", "ZDC51"]);
    assert_eq!(metro.controller_oi.as_deref(), Some("AB"));
    let filters = metro.filters.as_ref().unwrap();
    assert_eq!(
        filters.route.as_ref().unwrap().dest.as_deref(),
        Some("DCA")
    );
    assert_eq!(
        filters.altitude.as_ref().unwrap().block.as_deref(),
        Some("240B350")
    );

    // Fallback rows omit frequency/controller_oi/filters entirely
    let south = &config.positions[1];
    assert!(south.frequency.is_none() && south.filters.is_none());
    Ok(())
}

#[test]
fn verify_config_list_dto() -> Result<(), serde_json::Error> {
    let list: ConfigsList = serde_json::from_str(CONFIG_LIST)?;
    assert_eq!(list.configs.len(), 2);
    assert_eq!(list.configs[0].position_count, 2);
    assert_eq!(list.configs[1].status, ConfigStatus::Draft);
    Ok(())
}

#[test]
fn verify_snapshot_dto() -> Result<(), serde_json::Error> {
    let snapshot: ConfigsSnapshot = serde_json::from_str(SCHEDULED_SNAPSHOT)?;
    assert_eq!(
        snapshot.timestamp,
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    );
    assert_eq!(snapshot.configs[0].status, ConfigStatus::Scheduled);
    assert_eq!(snapshot.configs[0].positions[0].color, "#808080");
    Ok(())
}

#[test]
fn verify_preset_dtos() -> Result<(), serde_json::Error> {
    let detail: PresetDetail = serde_json::from_str(PRESET_DETAIL)?;
    let preset = detail.preset;
    assert_eq!(preset.positions[0].strata_filter.as_deref(), Some(&[Stratum::Low, Stratum::High][..]));
    assert!(preset.positions[1].strata_filter.is_none());
    assert_eq!(
        preset.created_at,
        Some(Utc.with_ymd_and_hms(2025, 1, 15, 20, 11, 2).unwrap())
    );

    let list: PresetsList = serde_json::from_str(
        r#"{"presets": [{"id": 3, "preset_name": "ZDC 3-way", "artcc": "ZDC",
            "description": null, "created_at": "2025-01-15T20:11:02Z",
            "updated_at": "2025-02-01T08:00:00Z", "position_count": 2}]}"#,
    )?;
    assert_eq!(list.presets[0].position_count, 2);
    Ok(())
}

#[test]
fn verify_area_dtos() -> Result<(), serde_json::Error> {
    let list: AreasList = serde_json::from_str(
        r##"{"areas": [{"id": 5, "artcc": "ZDC", "area_name": "Potomac Shelf",
            "sectors": ["ZDC32", "ZDC33"], "description": "", "color": "#ca8a04",
            "created_by": "system", "created_at": "2025-02-01 00:00:00",
            "updated_at": "2025-02-01 00:00:00"}]}"##,
    )?;
    assert_eq!(list.areas[0].sectors.len(), 2);
    assert_eq!(list.areas[0].color.as_deref(), Some("#ca8a04"));
    Ok(())
}

#[test]
fn verify_save_responses() -> Result<(), serde_json::Error> {
    // POST returns a numeric id, PUT echoes the query-string id back
    let created: SavedConfig = serde_json::from_str(
        r#"{"success": true, "id": 43, "positions_inserted": 3, "message": "Config created with 3 positions"}"#,
    )?;
    assert_eq!(created.id, 43);
    assert_eq!(created.positions_inserted, Some(3));

    let updated: SavedConfig = serde_json::from_str(
        r#"{"success": true, "id": "43", "positions_updated": 2, "message": "Config updated with 2 positions"}"#,
    )?;
    assert_eq!(updated.id, 43);

    let ack: Ack = serde_json::from_str(r#"{"success": true, "message": "Config deleted"}"#)?;
    assert!(ack.success);

    let error: ApiErrorBody =
        serde_json::from_str(r#"{"error": "Query failed", "details": "timeout"}"#)?;
    assert_eq!(error.error, "Query failed");
    Ok(())
}

#[test]
fn new_preset_payload_uses_camel_case_strata_key() -> Result<(), serde_json::Error> {
    let payload = NewPreset {
        preset_name: "Test".to_string(),
        artcc: "ZDC".to_string(),
        description: None,
        positions: vec![NewPresetPosition {
            position_name: "METRO".to_string(),
            sectors: vec!["ZDC50".to_string()],
            color: "#4dabf7".to_string(),
            frequency: None,
            sort_order: 0,
            filters: None,
            strata_filter: Some(vec![Stratum::SuperHigh]),
        }],
    };

    let json = serde_json::to_string(&payload)?;
    assert!(json.contains(r#""strataFilter":["superhigh"]"#));
    assert!(!json.contains("strata_filter"));
    Ok(())
}

#[test]
fn verify_boundary_dtos() -> Result<(), serde_json::Error> {
    let collection: FeatureCollection = serde_json::from_str(BOUNDARIES)?;
    assert_eq!(collection.features.len(), 3);

    let sector = &collection.features[0];
    assert!(sector.properties.matches("ZDC50"));
    // Numeric sector property is normalized to a string
    assert_eq!(sector.properties.sector.as_deref(), Some("50"));
    let ring = sector.geometry.as_ref().unwrap().outer_ring().unwrap();
    assert_eq!(ring.len(), 4);
    assert_eq!(ring[0].lng, -77.0);

    let artcc = &collection.features[1];
    assert!(artcc.properties.matches("ZDC"));
    assert_eq!(artcc.geometry.as_ref().unwrap().polygons().count(), 1);

    // Line features deserialize but carry no polygon data
    let airway = &collection.features[2];
    assert!(matches!(
        airway.geometry,
        Some(Geometry::Unsupported)
    ));
    Ok(())
}

#[test]
fn datetime_parsing_accepts_all_server_forms() {
    let expected = Utc.with_ymd_and_hms(2025, 1, 5, 6, 7, 0).unwrap();
    assert_eq!(api_datetime::parse("2025-01-05 06:07:00"), Some(expected));
    assert_eq!(api_datetime::parse("2025-01-05T06:07"), Some(expected));
    assert_eq!(api_datetime::parse("2025-01-05T06:07:00Z"), Some(expected));
    assert_eq!(api_datetime::parse("2025-01-05T06:07:00+00:00"), Some(expected));
    assert_eq!(api_datetime::parse("not a date"), None);

    let rendered = expected.format(api_datetime::WIRE_FORMAT).to_string();
    assert_eq!(rendered, "2025-01-05 06:07:00");
}
