use crate::error::AssignError;
use chrono::{DateTime, Utc};
use shared::splits::api::{
    Area, AreaUpdate, ConfigStatus, ConfigUpdate, NewArea, NewConfig, NewPreset, NewPresetPosition,
    Preset, SplitConfig, SplitPosition,
};
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

pub const POSITION_PALETTE: [&str; 30] = [
    "#e63946", "#2563eb", "#16a34a", "#ca8a04", "#ea580c", "#7c3aed", "#0891b2", "#db2777",
    "#059669", "#be123c", "#1d4ed8", "#b91c1c", "#15803d", "#a16207", "#c2410c", "#6d28d9",
    "#0e7490", "#a21caf", "#047857", "#9f1239", "#3b82f6", "#ef4444", "#22c55e", "#eab308",
    "#f97316", "#8b5cf6", "#06b6d4", "#ec4899", "#10b981", "#e11d48",
];

pub fn palette_color(index: usize) -> &'static str {
    POSITION_PALETTE[index % POSITION_PALETTE.len()]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    Added,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BulkOutcome {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub skipped: Vec<String>,
}

impl BulkOutcome {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub fn normalize_sector(sector: &str) -> String {
    sector.trim().to_uppercase()
}

/// Splits free text on commas and whitespace and resolves each token to
/// a sector identifier. Bare numbers take the default ARTCC prefix and
/// `ZDC-52` / `ZDC_52` forms lose the separator. Unrecognized tokens
/// are dropped.
pub fn parse_sector_input(text: &str, default_artcc: &str) -> Vec<String> {
    let artcc = default_artcc.trim().to_uppercase();
    let mut sectors = vec![];
    for raw in text.split(|c: char| c == ',' || c.is_whitespace()) {
        let token = raw.trim().to_uppercase();
        if token.is_empty() {
            continue;
        }
        match parse_token(&token, &artcc) {
            Some(id) => sectors.push(id),
            None => debug!(%token, "ignoring unrecognized sector token"),
        }
    }
    sectors
}

fn parse_token(token: &str, artcc: &str) -> Option<String> {
    let bytes = token.as_bytes();
    if token.len() > 3
        && bytes[..3].iter().all(u8::is_ascii_uppercase)
        && bytes[3..].iter().all(u8::is_ascii_digit)
    {
        return Some(token.to_string());
    }
    if bytes.iter().all(u8::is_ascii_digit) {
        return (!artcc.is_empty()).then(|| format!("{artcc}{token}"));
    }
    if token.len() > 4 {
        let (facility, rest) = token.split_at(3);
        let rest = rest.as_bytes();
        if facility.bytes().all(|b| b.is_ascii_uppercase())
            && matches!(rest[0], b'-' | b'_')
            && rest[1..].iter().all(u8::is_ascii_digit)
        {
            return Some(format!(
                "{facility}{}",
                std::str::from_utf8(&rest[1..]).ok()?
            ));
        }
    }
    None
}

trait RosterPosition {
    fn name(&self) -> &str;
    fn sectors(&self) -> &[String];
    fn sectors_mut(&mut self) -> &mut Vec<String>;
}

impl RosterPosition for SplitPosition {
    fn name(&self) -> &str {
        &self.position_name
    }

    fn sectors(&self) -> &[String] {
        &self.sectors
    }

    fn sectors_mut(&mut self) -> &mut Vec<String> {
        &mut self.sectors
    }
}

impl RosterPosition for NewPresetPosition {
    fn name(&self) -> &str {
        &self.position_name
    }

    fn sectors(&self) -> &[String] {
        &self.sectors
    }

    fn sectors_mut(&mut self) -> &mut Vec<String> {
        &mut self.sectors
    }
}

fn roster_owner<P: RosterPosition>(positions: &[P], sector: &str) -> Option<usize> {
    positions
        .iter()
        .position(|p| p.sectors().iter().any(|s| s.eq_ignore_ascii_case(sector)))
}

fn roster_assign<P: RosterPosition>(
    positions: &mut [P],
    index: usize,
    sector: &str,
) -> Result<(), AssignError> {
    if index >= positions.len() {
        return Err(AssignError::NoSuchPosition(index));
    }
    let sector = normalize_sector(sector);
    match roster_owner(positions, &sector) {
        Some(owner) if owner != index => Err(AssignError::AlreadyAssigned {
            sector,
            owner: positions[owner].name().to_string(),
        }),
        Some(_) => Ok(()),
        None => {
            positions[index].sectors_mut().push(sector);
            Ok(())
        }
    }
}

fn roster_unassign<P: RosterPosition>(positions: &mut [P], index: usize, sector: &str) -> bool {
    let Some(position) = positions.get_mut(index) else {
        return false;
    };
    let sector = normalize_sector(sector);
    let before = position.sectors().len();
    position
        .sectors_mut()
        .retain(|s| !s.eq_ignore_ascii_case(&sector));
    position.sectors().len() != before
}

fn roster_toggle<P: RosterPosition>(
    positions: &mut [P],
    index: usize,
    sector: &str,
) -> Result<Toggled, AssignError> {
    if index >= positions.len() {
        return Err(AssignError::NoSuchPosition(index));
    }
    let sector = normalize_sector(sector);
    if roster_owner(positions, &sector) == Some(index) {
        roster_unassign(positions, index, &sector);
        return Ok(Toggled::Removed);
    }
    roster_assign(positions, index, &sector).map(|_| Toggled::Added)
}

/// Reconciles one position's sectors against a desired set. Removals
/// always apply; additions owned by another position are skipped and
/// reported rather than stolen.
fn roster_bulk<P: RosterPosition>(
    positions: &mut [P],
    index: usize,
    desired: &[String],
) -> Result<BulkOutcome, AssignError> {
    if index >= positions.len() {
        return Err(AssignError::NoSuchPosition(index));
    }
    let desired: BTreeSet<String> = desired.iter().map(|s| normalize_sector(s)).collect();
    let current: BTreeSet<String> = positions[index]
        .sectors()
        .iter()
        .map(|s| normalize_sector(s))
        .collect();

    let mut outcome = BulkOutcome::default();
    for sector in current.difference(&desired) {
        roster_unassign(positions, index, sector);
        outcome.removed.push(sector.clone());
    }
    for sector in desired.difference(&current) {
        match roster_owner(positions, sector) {
            Some(owner) if owner != index => {
                debug!(
                    %sector,
                    owner = positions[owner].name(),
                    "bulk selection skipping sector owned by another position"
                );
                outcome.skipped.push(sector.clone());
            }
            _ => {
                positions[index].sectors_mut().push(sector.clone());
                outcome.added.push(sector.clone());
            }
        }
    }
    Ok(outcome)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDraft {
    pub draft_id: Uuid,
    pub server_id: Option<i64>,
    pub artcc: String,
    pub config_name: String,
    pub status: ConfigStatus,
    pub start_time_utc: Option<DateTime<Utc>>,
    pub end_time_utc: Option<DateTime<Utc>>,
    pub positions: Vec<SplitPosition>,
}

impl ConfigDraft {
    pub fn new(artcc: impl Into<String>, config_name: impl Into<String>) -> Self {
        Self {
            draft_id: Uuid::now_v7(),
            server_id: None,
            artcc: artcc.into().trim().to_uppercase(),
            config_name: config_name.into(),
            status: ConfigStatus::Draft,
            start_time_utc: None,
            end_time_utc: None,
            positions: vec![],
        }
    }

    pub fn from_config(config: &SplitConfig) -> Self {
        Self {
            draft_id: Uuid::now_v7(),
            server_id: Some(config.id),
            artcc: config.artcc.clone(),
            config_name: config.config_name.clone(),
            status: config.status,
            start_time_utc: config.start_time_utc,
            end_time_utc: config.end_time_utc,
            positions: config.positions.clone(),
        }
    }

    /// Seeds a fresh config from a preset. Time windows start empty and
    /// per-position time windows are not part of presets.
    pub fn from_preset(preset: &Preset, config_name: impl Into<String>) -> Self {
        let positions = preset
            .positions
            .iter()
            .map(|p| SplitPosition {
                position_name: p.position_name.clone(),
                color: p.color.clone(),
                sectors: p.sectors.clone(),
                sort_order: p.sort_order,
                frequency: p.frequency.clone(),
                controller_oi: None,
                filters: p.filters.clone(),
                start_time_utc: None,
                end_time_utc: None,
            })
            .collect();
        Self {
            draft_id: Uuid::now_v7(),
            server_id: None,
            artcc: preset.artcc.clone(),
            config_name: config_name.into(),
            status: ConfigStatus::Draft,
            start_time_utc: None,
            end_time_utc: None,
            positions,
        }
    }

    /// Appends a position colored from the rotating palette and returns
    /// its index.
    pub fn add_position(&mut self, position_name: impl Into<String>) -> usize {
        let index = self.positions.len();
        self.positions.push(SplitPosition {
            position_name: position_name.into(),
            color: palette_color(index).to_string(),
            sectors: vec![],
            sort_order: index as i64,
            frequency: None,
            controller_oi: None,
            filters: None,
            start_time_utc: None,
            end_time_utc: None,
        });
        index
    }

    pub fn remove_position(&mut self, index: usize) -> Option<SplitPosition> {
        if index >= self.positions.len() {
            return None;
        }
        Some(self.positions.remove(index))
    }

    pub fn owner_of(&self, sector: &str) -> Option<usize> {
        roster_owner(&self.positions, &normalize_sector(sector))
    }

    pub fn assign_sector(&mut self, index: usize, sector: &str) -> Result<(), AssignError> {
        roster_assign(&mut self.positions, index, sector)
    }

    pub fn unassign_sector(&mut self, index: usize, sector: &str) -> bool {
        roster_unassign(&mut self.positions, index, sector)
    }

    pub fn toggle_sector(&mut self, index: usize, sector: &str) -> Result<Toggled, AssignError> {
        roster_toggle(&mut self.positions, index, sector)
    }

    pub fn apply_bulk_selection(
        &mut self,
        index: usize,
        desired: &[String],
    ) -> Result<BulkOutcome, AssignError> {
        roster_bulk(&mut self.positions, index, desired)
    }

    pub fn assigned_sectors(&self) -> Vec<String> {
        self.positions
            .iter()
            .flat_map(|p| p.sectors.iter().cloned())
            .collect()
    }

    pub fn create_payload(&self, created_by: Option<String>) -> NewConfig {
        NewConfig {
            artcc: self.artcc.clone(),
            config_name: self.config_name.clone(),
            status: self.status,
            start_time_utc: self.start_time_utc,
            end_time_utc: self.end_time_utc,
            created_by,
            positions: self.positions.clone(),
        }
    }

    pub fn update_payload(&self) -> ConfigUpdate {
        ConfigUpdate {
            config_name: Some(self.config_name.clone()),
            artcc: Some(self.artcc.clone()),
            status: Some(self.status),
            start_time_utc: self.start_time_utc,
            end_time_utc: self.end_time_utc,
            positions: Some(self.positions.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresetDraft {
    pub draft_id: Uuid,
    pub server_id: Option<i64>,
    pub preset_name: String,
    pub artcc: String,
    pub description: Option<String>,
    pub positions: Vec<NewPresetPosition>,
}

impl PresetDraft {
    pub fn new(artcc: impl Into<String>, preset_name: impl Into<String>) -> Self {
        Self {
            draft_id: Uuid::now_v7(),
            server_id: None,
            preset_name: preset_name.into(),
            artcc: artcc.into().trim().to_uppercase(),
            description: None,
            positions: vec![],
        }
    }

    pub fn from_preset(preset: &Preset) -> Self {
        let positions = preset
            .positions
            .iter()
            .map(|p| NewPresetPosition {
                position_name: p.position_name.clone(),
                sectors: p.sectors.clone(),
                color: p.color.clone(),
                frequency: p.frequency.clone(),
                sort_order: p.sort_order,
                filters: p.filters.clone(),
                strata_filter: p.strata_filter.clone(),
            })
            .collect();
        Self {
            draft_id: Uuid::now_v7(),
            server_id: Some(preset.id),
            preset_name: preset.preset_name.clone(),
            artcc: preset.artcc.clone(),
            description: preset.description.clone(),
            positions,
        }
    }

    /// Captures a config's positions as preset positions, dropping the
    /// per-position time windows and controller initials.
    pub fn from_config_draft(draft: &ConfigDraft, preset_name: impl Into<String>) -> Self {
        let positions = draft
            .positions
            .iter()
            .map(|p| NewPresetPosition {
                position_name: p.position_name.clone(),
                sectors: p.sectors.clone(),
                color: p.color.clone(),
                frequency: p.frequency.clone(),
                sort_order: p.sort_order,
                filters: p.filters.clone(),
                strata_filter: None,
            })
            .collect();
        Self {
            draft_id: Uuid::now_v7(),
            server_id: None,
            preset_name: preset_name.into(),
            artcc: draft.artcc.clone(),
            description: None,
            positions,
        }
    }

    pub fn add_position(&mut self, position_name: impl Into<String>) -> usize {
        let index = self.positions.len();
        self.positions.push(NewPresetPosition {
            position_name: position_name.into(),
            sectors: vec![],
            color: palette_color(index).to_string(),
            frequency: None,
            sort_order: index as i64,
            filters: None,
            strata_filter: None,
        });
        index
    }

    pub fn owner_of(&self, sector: &str) -> Option<usize> {
        roster_owner(&self.positions, &normalize_sector(sector))
    }

    pub fn assign_sector(&mut self, index: usize, sector: &str) -> Result<(), AssignError> {
        roster_assign(&mut self.positions, index, sector)
    }

    pub fn unassign_sector(&mut self, index: usize, sector: &str) -> bool {
        roster_unassign(&mut self.positions, index, sector)
    }

    pub fn toggle_sector(&mut self, index: usize, sector: &str) -> Result<Toggled, AssignError> {
        roster_toggle(&mut self.positions, index, sector)
    }

    pub fn apply_bulk_selection(
        &mut self,
        index: usize,
        desired: &[String],
    ) -> Result<BulkOutcome, AssignError> {
        roster_bulk(&mut self.positions, index, desired)
    }

    pub fn create_payload(&self) -> NewPreset {
        NewPreset {
            preset_name: self.preset_name.clone(),
            artcc: self.artcc.clone(),
            description: self.description.clone(),
            positions: self.positions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AreaDraft {
    pub draft_id: Uuid,
    pub server_id: Option<i64>,
    pub artcc: String,
    pub area_name: String,
    pub sectors: Vec<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl AreaDraft {
    pub fn new(artcc: impl Into<String>, area_name: impl Into<String>) -> Self {
        Self {
            draft_id: Uuid::now_v7(),
            server_id: None,
            artcc: artcc.into().trim().to_uppercase(),
            area_name: area_name.into(),
            sectors: vec![],
            description: None,
            color: None,
        }
    }

    pub fn from_area(area: &Area) -> Self {
        Self {
            draft_id: Uuid::now_v7(),
            server_id: Some(area.id),
            artcc: area.artcc.clone(),
            area_name: area.area_name.clone(),
            sectors: area.sectors.iter().map(|s| normalize_sector(s)).collect(),
            description: area.description.clone(),
            color: area.color.clone(),
        }
    }

    /// Areas have no exclusivity rule; toggling simply flips membership.
    pub fn toggle_sector(&mut self, sector: &str) -> Toggled {
        let sector = normalize_sector(sector);
        let before = self.sectors.len();
        self.sectors.retain(|s| !s.eq_ignore_ascii_case(&sector));
        if self.sectors.len() != before {
            Toggled::Removed
        } else {
            self.sectors.push(sector);
            Toggled::Added
        }
    }

    pub fn set_sectors(&mut self, sectors: &[String]) {
        let mut seen = BTreeSet::new();
        self.sectors = sectors
            .iter()
            .map(|s| normalize_sector(s))
            .filter(|s| seen.insert(s.clone()))
            .collect();
    }

    pub fn create_payload(&self, created_by: Option<String>) -> NewArea {
        NewArea {
            artcc: self.artcc.clone(),
            area_name: self.area_name.clone(),
            sectors: self.sectors.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            created_by,
        }
    }

    pub fn update_payload(&self) -> AreaUpdate {
        AreaUpdate {
            area_name: Some(self.area_name.clone()),
            sectors: Some(self.sectors.clone()),
            description: self.description.clone(),
            color: self.color.clone(),
        }
    }
}
