use shared::splits::api::{ConfigStatus, SplitConfig};
use splits_editor::assignment::{
    AreaDraft, BulkOutcome, ConfigDraft, PresetDraft, Toggled, parse_sector_input,
};
use splits_editor::error::AssignError;

fn two_position_draft() -> ConfigDraft {
    let mut draft = ConfigDraft::new("ZDC", "4-way split");
    draft.add_position("METRO");
    draft.add_position("SOUTH");
    draft
}

#[test]
fn a_sector_belongs_to_at_most_one_position() {
    let mut draft = two_position_draft();

    draft.assign_sector(0, "ZDC50").unwrap();
    draft.assign_sector(0, "ZDC51").unwrap();

    let err = draft.assign_sector(1, "ZDC51").unwrap_err();
    assert_eq!(
        err,
        AssignError::AlreadyAssigned {
            sector: "ZDC51".to_string(),
            owner: "METRO".to_string(),
        }
    );

    // the rejected assignment must not mutate either roster
    assert_eq!(draft.positions[0].sectors, ["ZDC50", "ZDC51"]);
    assert!(draft.positions[1].sectors.is_empty());

    assert!(draft.unassign_sector(0, "ZDC51"));
    draft.assign_sector(1, "ZDC51").unwrap();
    assert_eq!(draft.owner_of("ZDC51"), Some(1));
}

#[test]
fn assigning_an_owned_sector_again_is_a_noop() {
    let mut draft = two_position_draft();
    draft.assign_sector(0, "ZDC50").unwrap();
    draft.assign_sector(0, "zdc50").unwrap();
    assert_eq!(draft.positions[0].sectors, ["ZDC50"]);
}

#[test]
fn ownership_checks_ignore_case_and_whitespace() {
    let mut draft = two_position_draft();
    draft.assign_sector(0, " zdc50 ").unwrap();
    assert_eq!(draft.positions[0].sectors, ["ZDC50"]);
    assert_eq!(draft.owner_of("Zdc50"), Some(0));
    assert!(draft.unassign_sector(0, "ZDC50 "));
    assert_eq!(draft.owner_of("ZDC50"), None);
}

#[test]
fn toggle_adds_removes_and_respects_ownership() {
    let mut draft = two_position_draft();

    assert_eq!(draft.toggle_sector(0, "ZDC50").unwrap(), Toggled::Added);
    assert_eq!(draft.toggle_sector(0, "ZDC50").unwrap(), Toggled::Removed);
    assert!(draft.positions[0].sectors.is_empty());

    draft.assign_sector(0, "ZDC50").unwrap();
    let err = draft.toggle_sector(1, "ZDC50").unwrap_err();
    assert!(matches!(err, AssignError::AlreadyAssigned { .. }));

    let err = draft.toggle_sector(5, "ZDC50").unwrap_err();
    assert_eq!(err, AssignError::NoSuchPosition(5));
}

#[test]
fn bulk_selection_reconciles_against_the_desired_set() {
    let mut draft = two_position_draft();
    for sector in ["ZDC50", "ZDC51", "ZDC52"] {
        draft.assign_sector(0, sector).unwrap();
    }

    let desired: Vec<String> = ["ZDC51", "ZDC52", "ZDC54"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let outcome = draft.apply_bulk_selection(0, &desired).unwrap();

    assert_eq!(outcome.added, ["ZDC54"]);
    assert_eq!(outcome.removed, ["ZDC50"]);
    assert!(outcome.skipped.is_empty());
    assert!(!outcome.is_noop());

    let mut sectors = draft.positions[0].sectors.clone();
    sectors.sort();
    assert_eq!(sectors, ["ZDC51", "ZDC52", "ZDC54"]);
}

#[test]
fn bulk_selection_skips_sectors_owned_by_another_position() {
    let mut draft = two_position_draft();
    draft.assign_sector(1, "ZDC60").unwrap();

    let desired: Vec<String> = ["ZDC50", "ZDC60"].iter().map(|s| s.to_string()).collect();
    let outcome = draft.apply_bulk_selection(0, &desired).unwrap();

    assert_eq!(outcome.added, ["ZDC50"]);
    assert_eq!(outcome.skipped, ["ZDC60"]);
    assert_eq!(draft.owner_of("ZDC60"), Some(1));

    let repeat = draft.apply_bulk_selection(0, &desired).unwrap();
    assert_eq!(
        repeat,
        BulkOutcome {
            added: vec![],
            removed: vec![],
            skipped: vec!["ZDC60".to_string()],
        }
    );
    assert!(repeat.is_noop());
}

#[test]
fn parse_sector_input_resolves_mixed_token_forms() {
    assert_eq!(
        parse_sector_input("ZDC50,51,ZDC-52, ZDC", "ZDC"),
        ["ZDC50", "ZDC51", "ZDC52"]
    );
    assert_eq!(
        parse_sector_input("zny_86\n34  ZDC12", "zny"),
        ["ZNY86", "ZNY34", "ZDC12"]
    );
    // bare numbers are dropped when no default center is set
    assert_eq!(parse_sector_input("50 ZDC51", ""), ["ZDC51"]);
    assert!(parse_sector_input(",, ,", "ZDC").is_empty());
}

#[test]
fn position_colors_rotate_through_the_palette() {
    let mut draft = ConfigDraft::new("ZDC", "big split");
    for i in 0..31 {
        draft.add_position(format!("P{i}"));
    }
    assert_eq!(draft.positions[0].color, "#e63946");
    assert_eq!(draft.positions[1].color, "#2563eb");
    assert_eq!(draft.positions[30].color, draft.positions[0].color);
    assert_eq!(draft.positions[30].sort_order, 30);
}

#[test]
fn removing_a_position_frees_its_sectors() {
    let mut draft = two_position_draft();
    draft.assign_sector(0, "ZDC50").unwrap();

    let removed = draft.remove_position(0).unwrap();
    assert_eq!(removed.position_name, "METRO");
    assert_eq!(draft.owner_of("ZDC50"), None);
    assert!(draft.remove_position(7).is_none());

    // the surviving position shifted down and may take the sector now
    draft.assign_sector(0, "ZDC50").unwrap();
    assert_eq!(draft.positions[0].position_name, "SOUTH");
}

#[test]
fn draft_round_trips_through_the_wire_format() {
    let mut draft = two_position_draft();
    draft.assign_sector(0, "ZDC50").unwrap();
    draft.assign_sector(0, "ZDC51").unwrap();
    draft.assign_sector(1, "ZDC72").unwrap();

    let payload = draft.create_payload(None);
    assert_eq!(payload.status, ConfigStatus::Draft);

    // simulate the server echoing the stored config back with an id
    let mut body = serde_json::to_value(&payload).unwrap();
    body.as_object_mut()
        .unwrap()
        .insert("id".to_string(), serde_json::json!(41));
    let stored: SplitConfig = serde_json::from_value(body).unwrap();
    assert_eq!(stored.id, 41);

    let reloaded = ConfigDraft::from_config(&stored);
    assert_eq!(reloaded.server_id, Some(41));
    assert_eq!(reloaded.artcc, draft.artcc);
    assert_eq!(reloaded.config_name, draft.config_name);
    assert_eq!(reloaded.positions.len(), 2);
    for (before, after) in draft.positions.iter().zip(&reloaded.positions) {
        assert_eq!(before.position_name, after.position_name);
        assert_eq!(before.color, after.color);
        assert_eq!(before.sectors, after.sectors);
    }
}

#[test]
fn update_payload_carries_every_editable_field() {
    let mut draft = two_position_draft();
    draft.assign_sector(1, "ZDC72").unwrap();

    let update = draft.update_payload();
    assert_eq!(update.config_name.as_deref(), Some("4-way split"));
    assert_eq!(update.artcc.as_deref(), Some("ZDC"));
    assert_eq!(update.status, Some(ConfigStatus::Draft));
    assert_eq!(update.positions.unwrap()[1].sectors, ["ZDC72"]);
}

#[test]
fn preset_capture_drops_time_windows_and_initials() {
    let mut draft = two_position_draft();
    draft.assign_sector(0, "ZDC50").unwrap();
    draft.positions[0].controller_oi = Some("AB".to_string());
    draft.positions[0].start_time_utc = shared::splits::api::api_datetime::parse("2026-03-01 12:00:00");

    let preset = PresetDraft::from_config_draft(&draft, "weekend split");
    assert_eq!(preset.preset_name, "weekend split");
    assert_eq!(preset.artcc, "ZDC");
    assert_eq!(preset.positions[0].sectors, ["ZDC50"]);
    assert_eq!(preset.positions[0].color, draft.positions[0].color);
    assert!(preset.positions[0].strata_filter.is_none());

    let payload = preset.create_payload();
    let body = serde_json::to_value(&payload).unwrap();
    assert!(body["positions"][0].get("start_time_utc").is_none());
    assert!(body["positions"][0].get("controller_oi").is_none());
}

#[test]
fn preset_drafts_enforce_the_same_exclusivity() {
    let mut preset = PresetDraft::new("zdc", "night split");
    preset.add_position("EAST");
    preset.add_position("WEST");

    preset.assign_sector(0, "ZDC50").unwrap();
    let err = preset.assign_sector(1, "ZDC50").unwrap_err();
    assert!(matches!(err, AssignError::AlreadyAssigned { ref owner, .. } if owner == "EAST"));

    assert_eq!(preset.toggle_sector(0, "ZDC50").unwrap(), Toggled::Removed);
    preset.assign_sector(1, "ZDC50").unwrap();
    assert_eq!(preset.owner_of("ZDC50"), Some(1));
}

#[test]
fn area_membership_is_a_plain_set() {
    let mut area = AreaDraft::new("zdc", "Shenandoah");
    assert_eq!(area.artcc, "ZDC");

    assert_eq!(area.toggle_sector("zdc50"), Toggled::Added);
    assert_eq!(area.toggle_sector("ZDC51"), Toggled::Added);
    // no ownership rule: the same sector toggles freely
    assert_eq!(area.toggle_sector("ZDC50"), Toggled::Removed);
    assert_eq!(area.sectors, ["ZDC51"]);

    area.set_sectors(&[
        "zdc52".to_string(),
        "ZDC52".to_string(),
        "ZDC54".to_string(),
    ]);
    assert_eq!(area.sectors, ["ZDC52", "ZDC54"]);

    let payload = area.create_payload(Some("AB".to_string()));
    assert_eq!(payload.area_name, "Shenandoah");
    assert_eq!(payload.sectors, ["ZDC52", "ZDC54"]);
}
