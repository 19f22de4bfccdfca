use crate::assignment::{
    AreaDraft, BulkOutcome, ConfigDraft, PresetDraft, normalize_sector, parse_sector_input,
};
use crate::datablock::{DatablockKey, DatablockRegistry, LeaderLine, leader_lines_for_block};
use crate::error::{AssignError, SurfaceError};
use crate::geometry::{BoundaryIndex, geometry_bounds, geometry_contains};
use crate::layers::{LayerController, LayerGroup, label_visible};
use crate::selection::{
    Candidate, CandidateKey, ClickOutcome, SectorChoice, SelectionMode, SelectionTarget,
    resolve_idle_click,
};
use crate::surface::{MapSurface, Projection, ScreenPoint};
use serde_json::{Value, json};
use shared::RequestGen;
use shared::splits::api::{Area, Preset, SplitConfig, SplitPosition};
use shared::splits::boundaries::{BoundaryKind, Geometry, LngLat, LngLatBounds, Stratum};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

pub const FIT_PADDING_PX: f64 = 50.0;
pub const FIT_MAX_ZOOM: f64 = 8.0;

pub struct SplitsEditor {
    index: BoundaryIndex,
    pub layers: LayerController,
    pub datablocks: DatablockRegistry,
    selection: SelectionMode,
    config_draft: Option<ConfigDraft>,
    preset_draft: Option<PresetDraft>,
    area_draft: Option<AreaDraft>,
    areas: Vec<Area>,
    shown_areas: HashSet<i64>,
    presets: Vec<Preset>,
    shown_presets: HashSet<i64>,
    active: Vec<SplitConfig>,
    scheduled: Vec<SplitConfig>,
    active_gen: RequestGen,
    scheduled_gen: RequestGen,
}

impl SplitsEditor {
    pub fn new(index: BoundaryIndex) -> Self {
        Self {
            index,
            layers: LayerController::new(),
            datablocks: DatablockRegistry::new(),
            selection: SelectionMode::Idle,
            config_draft: None,
            preset_draft: None,
            area_draft: None,
            areas: vec![],
            shown_areas: HashSet::new(),
            presets: vec![],
            shown_presets: HashSet::new(),
            active: vec![],
            scheduled: vec![],
            active_gen: RequestGen::new(),
            scheduled_gen: RequestGen::new(),
        }
    }

    pub fn index(&self) -> &BoundaryIndex {
        &self.index
    }

    // ---- draft lifecycle ----

    pub fn begin_config(&mut self, artcc: &str, config_name: &str) -> &mut ConfigDraft {
        self.selection = SelectionMode::Idle;
        self.config_draft.insert(ConfigDraft::new(artcc, config_name))
    }

    pub fn edit_config(&mut self, config: &SplitConfig) -> &mut ConfigDraft {
        self.selection = SelectionMode::Idle;
        self.config_draft.insert(ConfigDraft::from_config(config))
    }

    pub fn begin_config_from_preset(
        &mut self,
        preset: &Preset,
        config_name: &str,
    ) -> &mut ConfigDraft {
        self.selection = SelectionMode::Idle;
        self.config_draft
            .insert(ConfigDraft::from_preset(preset, config_name))
    }

    pub fn config_draft(&self) -> Option<&ConfigDraft> {
        self.config_draft.as_ref()
    }

    pub fn config_draft_mut(&mut self) -> Option<&mut ConfigDraft> {
        self.config_draft.as_mut()
    }

    pub fn discard_config_draft(&mut self) {
        self.config_draft = None;
        self.selection = SelectionMode::Idle;
    }

    pub fn begin_area(&mut self, artcc: &str, area_name: &str) -> &mut AreaDraft {
        self.area_draft.insert(AreaDraft::new(artcc, area_name))
    }

    pub fn edit_area(&mut self, area: &Area) -> &mut AreaDraft {
        self.area_draft.insert(AreaDraft::from_area(area))
    }

    pub fn area_draft(&self) -> Option<&AreaDraft> {
        self.area_draft.as_ref()
    }

    pub fn area_draft_mut(&mut self) -> Option<&mut AreaDraft> {
        self.area_draft.as_mut()
    }

    pub fn discard_area_draft(&mut self) {
        self.area_draft = None;
        if self.selection == SelectionMode::Selecting(SelectionTarget::Area) {
            self.selection = SelectionMode::Idle;
        }
    }

    pub fn begin_preset(&mut self, artcc: &str, preset_name: &str) -> &mut PresetDraft {
        self.preset_draft.insert(PresetDraft::new(artcc, preset_name))
    }

    pub fn edit_preset(&mut self, preset: &Preset) -> &mut PresetDraft {
        self.preset_draft.insert(PresetDraft::from_preset(preset))
    }

    /// Captures the current config draft as a preset draft.
    pub fn capture_preset(&mut self, preset_name: &str) -> Result<&mut PresetDraft, AssignError> {
        let draft = self.config_draft.as_ref().ok_or(AssignError::NoDraft)?;
        let preset = PresetDraft::from_config_draft(draft, preset_name);
        Ok(self.preset_draft.insert(preset))
    }

    pub fn preset_draft(&self) -> Option<&PresetDraft> {
        self.preset_draft.as_ref()
    }

    pub fn preset_draft_mut(&mut self) -> Option<&mut PresetDraft> {
        self.preset_draft.as_mut()
    }

    pub fn discard_preset_draft(&mut self) {
        self.preset_draft = None;
        if let SelectionMode::Selecting(SelectionTarget::PresetPosition(_)) = self.selection {
            self.selection = SelectionMode::Idle;
        }
    }

    // ---- selection mode ----

    pub fn selection(&self) -> SelectionMode {
        self.selection
    }

    pub fn begin_selection(&mut self, target: SelectionTarget) -> Result<(), AssignError> {
        match target {
            SelectionTarget::ConfigPosition(index) => {
                let draft = self.config_draft.as_ref().ok_or(AssignError::NoDraft)?;
                if index >= draft.positions.len() {
                    return Err(AssignError::NoSuchPosition(index));
                }
            }
            SelectionTarget::PresetPosition(index) => {
                let draft = self.preset_draft.as_ref().ok_or(AssignError::NoDraft)?;
                if index >= draft.positions.len() {
                    return Err(AssignError::NoSuchPosition(index));
                }
            }
            SelectionTarget::Area => {
                self.area_draft.as_ref().ok_or(AssignError::NoDraft)?;
            }
        }
        self.selection = SelectionMode::Selecting(target);
        Ok(())
    }

    pub fn end_selection(&mut self) {
        self.selection = SelectionMode::Idle;
    }

    // ---- click handling ----

    pub fn handle_map_click(&mut self, point: LngLat) -> ClickOutcome {
        match self.selection {
            SelectionMode::Idle => resolve_idle_click(self.idle_candidates(point)),
            SelectionMode::Selecting(target) => self.selecting_click(target, point),
        }
    }

    fn selecting_click(&mut self, target: SelectionTarget, point: LngLat) -> ClickOutcome {
        let strata: Vec<Stratum> = Stratum::ALL
            .into_iter()
            .filter(|s| self.layers.state(LayerGroup::from_stratum(*s)).visible)
            .collect();
        let picked: Vec<(String, Stratum)> = self
            .index
            .hit_test(point, &strata)
            .iter()
            .filter_map(|hit| hit.ident().map(|id| (id, hit.stratum)))
            .collect();
        match picked.as_slice() {
            [] => ClickOutcome::None,
            [(sector, _)] => {
                let sector = sector.clone();
                self.toggle_for_target(target, &sector)
            }
            _ => ClickOutcome::ChooseSectors(self.sector_choices(target, &picked)),
        }
    }

    fn toggle_for_target(&mut self, target: SelectionTarget, sector: &str) -> ClickOutcome {
        let result = match target {
            SelectionTarget::ConfigPosition(index) => self
                .config_draft
                .as_mut()
                .map(|draft| draft.toggle_sector(index, sector)),
            SelectionTarget::PresetPosition(index) => self
                .preset_draft
                .as_mut()
                .map(|draft| draft.toggle_sector(index, sector)),
            SelectionTarget::Area => self
                .area_draft
                .as_mut()
                .map(|draft| Ok(draft.toggle_sector(sector))),
        };
        match result {
            None => {
                warn!(%sector, "sector click with no draft to edit");
                ClickOutcome::None
            }
            Some(Ok(state)) => ClickOutcome::Toggled {
                sector: normalize_sector(sector),
                state,
            },
            Some(Err(AssignError::AlreadyAssigned { sector, owner })) => {
                ClickOutcome::Rejected { sector, owner }
            }
            Some(Err(error)) => {
                warn!(%error, "sector toggle failed");
                ClickOutcome::None
            }
        }
    }

    fn sector_choices(
        &self,
        target: SelectionTarget,
        picked: &[(String, Stratum)],
    ) -> Vec<SectorChoice> {
        picked
            .iter()
            .map(|(sector, stratum)| {
                let (assigned_here, owned_by) = self.ownership_for(target, sector);
                SectorChoice {
                    sector: sector.clone(),
                    stratum: *stratum,
                    assigned_here,
                    owned_by,
                }
            })
            .collect()
    }

    fn ownership_for(&self, target: SelectionTarget, sector: &str) -> (bool, Option<String>) {
        match target {
            SelectionTarget::ConfigPosition(index) => {
                let Some(draft) = self.config_draft.as_ref() else {
                    return (false, None);
                };
                match draft.owner_of(sector) {
                    Some(owner) if owner == index => (true, None),
                    Some(owner) => (false, Some(draft.positions[owner].position_name.clone())),
                    None => (false, None),
                }
            }
            SelectionTarget::PresetPosition(index) => {
                let Some(draft) = self.preset_draft.as_ref() else {
                    return (false, None);
                };
                match draft.owner_of(sector) {
                    Some(owner) if owner == index => (true, None),
                    Some(owner) => (false, Some(draft.positions[owner].position_name.clone())),
                    None => (false, None),
                }
            }
            SelectionTarget::Area => {
                let assigned = self.area_draft.as_ref().is_some_and(|draft| {
                    draft.sectors.iter().any(|s| s.eq_ignore_ascii_case(sector))
                });
                (assigned, None)
            }
        }
    }

    fn idle_candidates(&self, point: LngLat) -> Vec<Candidate> {
        let mut candidates = vec![];
        let strata = self.layers.strata();

        if self.layers.state(LayerGroup::ActiveConfigs).visible {
            for config in &self.active {
                if self.layers.is_config_hidden(config.id) {
                    continue;
                }
                for position in &config.positions {
                    for sector in &position.sectors {
                        let Some(hit) = self.index.find_sector(sector) else {
                            continue;
                        };
                        if !strata.is_visible(hit.stratum)
                            || !geometry_contains(hit.geometry, point)
                        {
                            continue;
                        }
                        candidates.push(
                            Candidate::new(
                                CandidateKey::ActiveSector {
                                    sector: normalize_sector(sector),
                                },
                                normalize_sector(sector),
                            )
                            .with_subtitle(format!(
                                "{} / {}",
                                config.config_name, position.position_name
                            )),
                        );
                    }
                }
            }
        }

        for stratum in Stratum::ALL {
            if !self.layers.state(LayerGroup::from_stratum(stratum)).visible {
                continue;
            }
            for hit in self.index.hit_test(point, &[stratum]) {
                let Some(label) = hit.ident() else { continue };
                let mut candidate = Candidate::new(
                    CandidateKey::Sector {
                        stratum,
                        label: label.clone(),
                    },
                    label,
                );
                if let Some(name) = &hit.feature.properties.name {
                    candidate = candidate.with_subtitle(name.clone());
                }
                candidates.push(candidate);
            }
        }

        for (group, kind) in [
            (LayerGroup::Artcc, BoundaryKind::Artcc),
            (LayerGroup::Tracon, BoundaryKind::Tracon),
        ] {
            if !self.layers.state(group).visible {
                continue;
            }
            for feature in self.index.features_at(kind, point) {
                let Some(id) = feature.properties.ident() else {
                    continue;
                };
                let key = match kind {
                    BoundaryKind::Artcc => CandidateKey::Artcc { id: id.clone() },
                    _ => CandidateKey::Tracon { id: id.clone() },
                };
                let mut candidate = Candidate::new(key, id);
                if let Some(name) = &feature.properties.name {
                    candidate = candidate.with_subtitle(name.clone());
                }
                candidates.push(candidate);
            }
        }

        if self.layers.state(LayerGroup::Areas).visible {
            for area in &self.areas {
                if !self.shown_areas.contains(&area.id) {
                    continue;
                }
                let inside = area.sectors.iter().any(|sector| {
                    self.index
                        .find_sector(sector)
                        .is_some_and(|hit| geometry_contains(hit.geometry, point))
                });
                if inside {
                    candidates.push(
                        Candidate::new(
                            CandidateKey::Area { id: area.id },
                            area.area_name.clone(),
                        )
                        .with_subtitle(area.artcc.clone()),
                    );
                }
            }
        }

        if self.layers.state(LayerGroup::Presets).visible {
            for preset in &self.presets {
                if !self.shown_presets.contains(&preset.id) {
                    continue;
                }
                for position in &preset.positions {
                    let inside = position.sectors.iter().any(|sector| {
                        self.index
                            .find_sector(sector)
                            .is_some_and(|hit| geometry_contains(hit.geometry, point))
                    });
                    if inside {
                        candidates.push(
                            Candidate::new(
                                CandidateKey::PresetPosition {
                                    preset_id: preset.id,
                                    position: position.position_name.clone(),
                                },
                                position.position_name.clone(),
                            )
                            .with_subtitle(preset.preset_name.clone()),
                        );
                    }
                }
            }
        }

        candidates
    }

    // ---- assignment entry points ----

    pub fn apply_sector_choices(
        &mut self,
        target: SelectionTarget,
        decisions: &[(String, bool)],
    ) -> Result<BulkOutcome, AssignError> {
        let mut outcome = BulkOutcome::default();
        for (sector, wanted) in decisions {
            if *wanted {
                match self.assign_for_target(target, sector) {
                    Ok(true) => outcome.added.push(normalize_sector(sector)),
                    Ok(false) => {}
                    Err(AssignError::AlreadyAssigned { sector, .. }) => {
                        outcome.skipped.push(sector);
                    }
                    Err(error) => return Err(error),
                }
            } else if self.unassign_for_target(target, sector)? {
                outcome.removed.push(normalize_sector(sector));
            }
        }
        Ok(outcome)
    }

    pub fn apply_bulk_selection(
        &mut self,
        target: SelectionTarget,
        desired: &[String],
    ) -> Result<BulkOutcome, AssignError> {
        match target {
            SelectionTarget::ConfigPosition(index) => self
                .config_draft
                .as_mut()
                .ok_or(AssignError::NoDraft)?
                .apply_bulk_selection(index, desired),
            SelectionTarget::PresetPosition(index) => self
                .preset_draft
                .as_mut()
                .ok_or(AssignError::NoDraft)?
                .apply_bulk_selection(index, desired),
            SelectionTarget::Area => {
                let draft = self.area_draft.as_mut().ok_or(AssignError::NoDraft)?;
                let before: BTreeSet<String> = draft.sectors.iter().cloned().collect();
                draft.set_sectors(desired);
                let after: BTreeSet<String> = draft.sectors.iter().cloned().collect();
                Ok(BulkOutcome {
                    added: after.difference(&before).cloned().collect(),
                    removed: before.difference(&after).cloned().collect(),
                    skipped: vec![],
                })
            }
        }
    }

    /// Parses free text and assigns every recognized sector to the
    /// target, reporting conflicts as skips.
    pub fn add_parsed_sectors(
        &mut self,
        target: SelectionTarget,
        text: &str,
    ) -> Result<BulkOutcome, AssignError> {
        let artcc = self.target_artcc(target)?.to_string();
        let mut outcome = BulkOutcome::default();
        for sector in parse_sector_input(text, &artcc) {
            if self.index.find_sector(&sector).is_none() {
                warn!(%sector, "no boundary geometry for parsed sector");
            }
            match self.assign_for_target(target, &sector) {
                Ok(true) => outcome.added.push(sector),
                Ok(false) => {}
                Err(AssignError::AlreadyAssigned { sector, .. }) => outcome.skipped.push(sector),
                Err(error) => return Err(error),
            }
        }
        Ok(outcome)
    }

    fn target_artcc(&self, target: SelectionTarget) -> Result<&str, AssignError> {
        match target {
            SelectionTarget::ConfigPosition(_) => self
                .config_draft
                .as_ref()
                .map(|d| d.artcc.as_str())
                .ok_or(AssignError::NoDraft),
            SelectionTarget::PresetPosition(_) => self
                .preset_draft
                .as_ref()
                .map(|d| d.artcc.as_str())
                .ok_or(AssignError::NoDraft),
            SelectionTarget::Area => self
                .area_draft
                .as_ref()
                .map(|d| d.artcc.as_str())
                .ok_or(AssignError::NoDraft),
        }
    }

    /// Ok(true) when the sector was newly added, Ok(false) when the
    /// target already owned it.
    fn assign_for_target(
        &mut self,
        target: SelectionTarget,
        sector: &str,
    ) -> Result<bool, AssignError> {
        match target {
            SelectionTarget::ConfigPosition(index) => {
                let draft = self.config_draft.as_mut().ok_or(AssignError::NoDraft)?;
                let already = draft.owner_of(sector) == Some(index);
                draft.assign_sector(index, sector)?;
                Ok(!already)
            }
            SelectionTarget::PresetPosition(index) => {
                let draft = self.preset_draft.as_mut().ok_or(AssignError::NoDraft)?;
                let already = draft.owner_of(sector) == Some(index);
                draft.assign_sector(index, sector)?;
                Ok(!already)
            }
            SelectionTarget::Area => {
                let draft = self.area_draft.as_mut().ok_or(AssignError::NoDraft)?;
                let sector = normalize_sector(sector);
                if draft.sectors.iter().any(|s| s.eq_ignore_ascii_case(&sector)) {
                    Ok(false)
                } else {
                    draft.sectors.push(sector);
                    Ok(true)
                }
            }
        }
    }

    fn unassign_for_target(
        &mut self,
        target: SelectionTarget,
        sector: &str,
    ) -> Result<bool, AssignError> {
        match target {
            SelectionTarget::ConfigPosition(index) => {
                let draft = self.config_draft.as_mut().ok_or(AssignError::NoDraft)?;
                Ok(draft.unassign_sector(index, sector))
            }
            SelectionTarget::PresetPosition(index) => {
                let draft = self.preset_draft.as_mut().ok_or(AssignError::NoDraft)?;
                Ok(draft.unassign_sector(index, sector))
            }
            SelectionTarget::Area => {
                let draft = self.area_draft.as_mut().ok_or(AssignError::NoDraft)?;
                let sector = normalize_sector(sector);
                let before = draft.sectors.len();
                draft.sectors.retain(|s| !s.eq_ignore_ascii_case(&sector));
                Ok(draft.sectors.len() != before)
            }
        }
    }

    // ---- remote data ----

    pub fn begin_active_refresh(&self) -> u64 {
        self.active_gen.next()
    }

    /// Applies an active-configs snapshot unless a newer refresh has
    /// been issued since this one started.
    pub fn apply_active_snapshot(&mut self, generation: u64, configs: Vec<SplitConfig>) -> bool {
        if !self.active_gen.is_current(generation) {
            debug!(
                generation,
                current = self.active_gen.current(),
                "dropping stale active snapshot"
            );
            return false;
        }
        self.active = configs;
        let ids: Vec<i64> = self.active.iter().map(|c| c.id).collect();
        self.layers.retain_configs(&ids);
        self.datablocks.retain_configs(&ids);
        true
    }

    pub fn begin_scheduled_refresh(&self) -> u64 {
        self.scheduled_gen.next()
    }

    pub fn apply_scheduled_snapshot(
        &mut self,
        generation: u64,
        configs: Vec<SplitConfig>,
    ) -> bool {
        if !self.scheduled_gen.is_current(generation) {
            debug!(
                generation,
                current = self.scheduled_gen.current(),
                "dropping stale scheduled snapshot"
            );
            return false;
        }
        self.scheduled = configs;
        true
    }

    pub fn active_configs(&self) -> &[SplitConfig] {
        &self.active
    }

    pub fn scheduled_configs(&self) -> &[SplitConfig] {
        &self.scheduled
    }

    pub fn set_areas(&mut self, areas: Vec<Area>) {
        self.areas = areas;
        let ids: HashSet<i64> = self.areas.iter().map(|a| a.id).collect();
        self.shown_areas.retain(|id| ids.contains(id));
    }

    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    pub fn show_area(&mut self, area_id: i64, shown: bool) {
        if shown && self.areas.iter().any(|a| a.id == area_id) {
            self.shown_areas.insert(area_id);
        } else {
            self.shown_areas.remove(&area_id);
        }
    }

    pub fn is_area_shown(&self, area_id: i64) -> bool {
        self.shown_areas.contains(&area_id)
    }

    pub fn set_presets(&mut self, presets: Vec<Preset>) {
        self.presets = presets;
        let ids: HashSet<i64> = self.presets.iter().map(|p| p.id).collect();
        self.shown_presets.retain(|id| ids.contains(id));
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn show_preset(&mut self, preset_id: i64, shown: bool) {
        if shown && self.presets.iter().any(|p| p.id == preset_id) {
            self.shown_presets.insert(preset_id);
        } else {
            self.shown_presets.remove(&preset_id);
        }
    }

    pub fn is_preset_shown(&self, preset_id: i64) -> bool {
        self.shown_presets.contains(&preset_id)
    }

    // ---- overlay geojson ----

    pub fn active_overlay(&self) -> Value {
        let mut features = vec![];
        for config in &self.active {
            for position in &config.positions {
                self.push_position_features(
                    config.id,
                    &config.config_name,
                    position,
                    &mut features,
                );
            }
        }
        json!({ "type": "FeatureCollection", "features": features })
    }

    /// The editor preview renders the in-progress draft through the
    /// active overlay source and styling.
    pub fn draft_overlay(&self) -> Value {
        let mut features = vec![];
        if let Some(draft) = &self.config_draft {
            let config_id = draft.server_id.unwrap_or(0);
            for position in &draft.positions {
                self.push_position_features(
                    config_id,
                    &draft.config_name,
                    position,
                    &mut features,
                );
            }
        }
        json!({ "type": "FeatureCollection", "features": features })
    }

    fn push_position_features(
        &self,
        config_id: i64,
        config_name: &str,
        position: &SplitPosition,
        features: &mut Vec<Value>,
    ) {
        for sector in &position.sectors {
            let Some(hit) = self.index.find_sector(sector) else {
                warn!(
                    %sector,
                    position = %position.position_name,
                    "no boundary geometry for sector"
                );
                continue;
            };
            features.push(json!({
                "type": "Feature",
                "properties": {
                    "config_id": config_id,
                    "config_name": config_name,
                    "position_name": position.position_name,
                    "color": position.color,
                    "sector": normalize_sector(sector),
                    "stratum": hit.stratum,
                },
                "geometry": hit.geometry,
            }));
        }
    }

    pub fn areas_overlay(&self) -> Value {
        let mut features = vec![];
        for area in &self.areas {
            if !self.shown_areas.contains(&area.id) {
                continue;
            }
            for sector in &area.sectors {
                let Some(hit) = self.index.find_sector(sector) else {
                    warn!(%sector, area = %area.area_name, "no boundary geometry for sector");
                    continue;
                };
                features.push(json!({
                    "type": "Feature",
                    "properties": {
                        "area_id": area.id,
                        "area_name": area.area_name,
                        "color": area.color,
                        "sector": normalize_sector(sector),
                        "stratum": hit.stratum,
                    },
                    "geometry": hit.geometry,
                }));
            }
        }
        json!({ "type": "FeatureCollection", "features": features })
    }

    pub fn presets_overlay(&self) -> Value {
        let mut features = vec![];
        for preset in &self.presets {
            if !self.shown_presets.contains(&preset.id) {
                continue;
            }
            for position in &preset.positions {
                for sector in &position.sectors {
                    let hits: Vec<_> = match &position.strata_filter {
                        Some(strata) => strata
                            .iter()
                            .filter_map(|s| self.index.find_sector_in_stratum(sector, *s))
                            .collect(),
                        None => self.index.find_sector(sector).into_iter().collect(),
                    };
                    if hits.is_empty() {
                        warn!(
                            %sector,
                            position = %position.position_name,
                            "no boundary geometry for preset sector"
                        );
                    }
                    for hit in hits {
                        features.push(json!({
                            "type": "Feature",
                            "properties": {
                                "preset_id": preset.id,
                                "position_name": position.position_name,
                                "color": position.color,
                                "sector": normalize_sector(sector),
                                "stratum": hit.stratum,
                            },
                            "geometry": hit.geometry,
                        }));
                    }
                }
            }
        }
        json!({ "type": "FeatureCollection", "features": features })
    }

    // ---- surface sync ----

    pub fn sync_layers(&self, surface: &mut dyn MapSurface) -> Result<(), SurfaceError> {
        self.layers.sync_all(surface)
    }

    pub fn sync_boundaries(&self, surface: &mut dyn MapSurface) -> Result<(), SurfaceError> {
        for (group, kind) in [
            (LayerGroup::Artcc, BoundaryKind::Artcc),
            (LayerGroup::Tracon, BoundaryKind::Tracon),
            (LayerGroup::Low, BoundaryKind::Low),
            (LayerGroup::High, BoundaryKind::High),
            (LayerGroup::SuperHigh, BoundaryKind::SuperHigh),
        ] {
            let data = serde_json::to_value(self.index.collection(kind))
                .map_err(|e| SurfaceError::Encode(e.to_string()))?;
            surface.set_source_data(group.source_id(), data)?;
        }
        Ok(())
    }

    pub fn sync_active(&self, surface: &mut dyn MapSurface) -> Result<(), SurfaceError> {
        surface.set_source_data(LayerGroup::ActiveConfigs.source_id(), self.active_overlay())?;
        let ids: Vec<i64> = self.active.iter().map(|c| c.id).collect();
        self.layers.sync_active_filters(surface, &ids)
    }

    pub fn sync_draft(&self, surface: &mut dyn MapSurface) -> Result<(), SurfaceError> {
        surface.set_source_data(LayerGroup::ActiveConfigs.source_id(), self.draft_overlay())
    }

    pub fn sync_areas(&self, surface: &mut dyn MapSurface) -> Result<(), SurfaceError> {
        surface.set_source_data(LayerGroup::Areas.source_id(), self.areas_overlay())
    }

    pub fn sync_presets(&self, surface: &mut dyn MapSurface) -> Result<(), SurfaceError> {
        surface.set_source_data(LayerGroup::Presets.source_id(), self.presets_overlay())
    }

    // ---- view fitting ----

    pub fn fit_to_sectors(
        &self,
        sectors: &[String],
        surface: &mut dyn MapSurface,
    ) -> Result<(), SurfaceError> {
        let mut bounds: Option<LngLatBounds> = None;
        for sector in sectors {
            let Some(hit) = self.index.find_sector(sector) else {
                continue;
            };
            let Some(gb) = geometry_bounds(hit.geometry) else {
                continue;
            };
            match &mut bounds {
                Some(b) => {
                    b.extend(gb.sw());
                    b.extend(gb.ne());
                }
                None => bounds = Some(gb),
            }
        }
        if let Some(bounds) = bounds {
            surface.fit_bounds(bounds, FIT_PADDING_PX, FIT_MAX_ZOOM)?;
        }
        Ok(())
    }

    pub fn fit_to_draft(&self, surface: &mut dyn MapSurface) -> Result<(), SurfaceError> {
        let Some(draft) = &self.config_draft else {
            return Ok(());
        };
        self.fit_to_sectors(&draft.assigned_sectors(), surface)
    }

    pub fn fit_to_config(
        &self,
        config_id: i64,
        surface: &mut dyn MapSurface,
    ) -> Result<(), SurfaceError> {
        let Some(config) = self
            .active
            .iter()
            .chain(self.scheduled.iter())
            .find(|c| c.id == config_id)
        else {
            return Ok(());
        };
        let sectors: Vec<String> = config
            .positions
            .iter()
            .flat_map(|p| p.sectors.iter().cloned())
            .collect();
        self.fit_to_sectors(&sectors, surface)
    }

    // ---- datablocks ----

    /// Opens or closes the datablock for an active position. The block
    /// anchors at the average of its sector centroids, or at the
    /// fallback point when none resolve.
    pub fn toggle_datablock(
        &mut self,
        config_id: i64,
        position_name: &str,
        fallback: LngLat,
    ) -> Option<bool> {
        let anchor = {
            let position = self.active_position(config_id, position_name)?;
            self.position_anchor(position).unwrap_or(fallback)
        };
        Some(
            self.datablocks
                .toggle(DatablockKey::new(config_id, position_name), anchor),
        )
    }

    pub fn drag_datablock(
        &mut self,
        key: &DatablockKey,
        position: ScreenPoint,
        projection: &dyn Projection,
    ) -> bool {
        self.datablocks.drag_to(key, position, projection)
    }

    pub fn datablock_leaders(
        &self,
        key: &DatablockKey,
        projection: &dyn Projection,
    ) -> Vec<LeaderLine> {
        let Some(block) = self.datablocks.get(key) else {
            return vec![];
        };
        let Some(position) = self.active_position(key.config_id, &key.position_name) else {
            return vec![];
        };
        let geometries: Vec<&Geometry> = position
            .sectors
            .iter()
            .filter_map(|s| self.index.find_sector(s).map(|hit| hit.geometry))
            .collect();
        leader_lines_for_block(block, &geometries, projection)
    }

    /// Labels follow the strata filter: hidden when every sector of the
    /// position sits in a hidden stratum or the config is hidden.
    pub fn datablock_label_visible(&self, key: &DatablockKey) -> bool {
        if self.layers.is_config_hidden(key.config_id) {
            return false;
        }
        let Some(position) = self.active_position(key.config_id, &key.position_name) else {
            return false;
        };
        let strata: Vec<Stratum> = position
            .sectors
            .iter()
            .filter_map(|s| self.index.find_sector(s).map(|hit| hit.stratum))
            .collect();
        label_visible(self.layers.strata(), &strata)
    }

    fn active_position(&self, config_id: i64, position_name: &str) -> Option<&SplitPosition> {
        self.active
            .iter()
            .find(|c| c.id == config_id)?
            .positions
            .iter()
            .find(|p| p.position_name == position_name)
    }

    fn position_anchor(&self, position: &SplitPosition) -> Option<LngLat> {
        let centroids: Vec<LngLat> = position
            .sectors
            .iter()
            .filter_map(|s| self.index.find_sector(s).map(|hit| hit.centroid))
            .collect();
        if centroids.is_empty() {
            return None;
        }
        let n = centroids.len() as f64;
        Some(LngLat::new(
            centroids.iter().map(|c| c.lng).sum::<f64>() / n,
            centroids.iter().map(|c| c.lat).sum::<f64>() / n,
        ))
    }
}
