use crate::assignment::Toggled;
use shared::splits::boundaries::Stratum;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionTarget {
    ConfigPosition(usize),
    PresetPosition(usize),
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    #[default]
    Idle,
    Selecting(SelectionTarget),
}

impl SelectionMode {
    pub const fn is_selecting(self) -> bool {
        matches!(self, SelectionMode::Selecting(_))
    }
}

/// Identity of one clickable feature. A feature reachable through
/// several layers must map to the same key so the info popup lists it
/// once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CandidateKey {
    ActiveSector { sector: String },
    Sector { stratum: Stratum, label: String },
    Artcc { id: String },
    Tracon { id: String },
    Area { id: i64 },
    PresetPosition { preset_id: i64, position: String },
}

impl Display for CandidateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CandidateKey::ActiveSector { sector } => write!(f, "active-{sector}"),
            CandidateKey::Sector { stratum, label } => write!(f, "{stratum}-{label}"),
            CandidateKey::Artcc { id } => write!(f, "artcc-{id}"),
            CandidateKey::Tracon { id } => write!(f, "tracon-{id}"),
            CandidateKey::Area { id } => write!(f, "area-{id}"),
            CandidateKey::PresetPosition {
                preset_id,
                position,
            } => write!(f, "preset-{preset_id}-{position}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub key: CandidateKey,
    pub title: String,
    pub subtitle: Option<String>,
}

impl Candidate {
    pub fn new(key: CandidateKey, title: impl Into<String>) -> Self {
        Self {
            key,
            title: title.into(),
            subtitle: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorChoice {
    pub sector: String,
    pub stratum: Stratum,
    pub assigned_here: bool,
    pub owned_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    None,
    ShowInfo(Candidate),
    Disambiguate(Vec<Candidate>),
    Toggled { sector: String, state: Toggled },
    Rejected { sector: String, owner: String },
    ChooseSectors(Vec<SectorChoice>),
}

/// First occurrence of each key wins; layer assembly order is the
/// popup order.
pub fn dedupe_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.key.clone()))
        .collect()
}

pub fn resolve_idle_click(candidates: Vec<Candidate>) -> ClickOutcome {
    let mut candidates = dedupe_candidates(candidates);
    match candidates.len() {
        0 => ClickOutcome::None,
        1 => ClickOutcome::ShowInfo(candidates.remove(0)),
        _ => ClickOutcome::Disambiguate(candidates),
    }
}
