use crate::error::SurfaceError;
use crate::surface::MapSurface;
use serde_json::{Value, json};
use shared::splits::api::{DEFAULT_POSITION_COLOR, DEFAULT_PRESET_COLOR};
use shared::splits::boundaries::Stratum;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerGroup {
    Artcc,
    Tracon,
    Low,
    High,
    SuperHigh,
    Areas,
    Presets,
    ActiveConfigs,
}

impl LayerGroup {
    pub const ALL: [LayerGroup; 8] = [
        LayerGroup::Artcc,
        LayerGroup::Tracon,
        LayerGroup::Low,
        LayerGroup::High,
        LayerGroup::SuperHigh,
        LayerGroup::Areas,
        LayerGroup::Presets,
        LayerGroup::ActiveConfigs,
    ];

    pub const fn from_stratum(stratum: Stratum) -> LayerGroup {
        match stratum {
            Stratum::Low => LayerGroup::Low,
            Stratum::High => LayerGroup::High,
            Stratum::SuperHigh => LayerGroup::SuperHigh,
        }
    }

    pub const fn source_id(self) -> &'static str {
        match self {
            LayerGroup::Artcc => "artcc",
            LayerGroup::Tracon => "tracon",
            LayerGroup::Low => "low",
            LayerGroup::High => "high",
            LayerGroup::SuperHigh => "superhigh",
            LayerGroup::Areas => "areas",
            LayerGroup::Presets => "presets",
            LayerGroup::ActiveConfigs => "active",
        }
    }

    pub const fn fill_layer_id(self) -> &'static str {
        match self {
            LayerGroup::Artcc => "artcc-fill",
            LayerGroup::Tracon => "tracon-fill",
            LayerGroup::Low => "low-fill",
            LayerGroup::High => "high-fill",
            LayerGroup::SuperHigh => "superhigh-fill",
            LayerGroup::Areas => "areas-fill",
            LayerGroup::Presets => "presets-fill",
            LayerGroup::ActiveConfigs => "active-fill",
        }
    }

    pub const fn line_layer_id(self) -> &'static str {
        match self {
            LayerGroup::Artcc => "artcc-line",
            LayerGroup::Tracon => "tracon-line",
            LayerGroup::Low => "low-line",
            LayerGroup::High => "high-line",
            LayerGroup::SuperHigh => "superhigh-line",
            LayerGroup::Areas => "areas-line",
            LayerGroup::Presets => "presets-line",
            LayerGroup::ActiveConfigs => "active-line",
        }
    }

    pub const fn label_layer_id(self) -> Option<&'static str> {
        match self {
            LayerGroup::Areas => Some("areas-labels"),
            LayerGroup::Presets => Some("presets-labels"),
            LayerGroup::ActiveConfigs => Some("active-labels"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasePaint {
    pub color: &'static str,
    pub fill_opacity: f64,
    pub line_opacity: f64,
}

pub const fn base_paint(group: LayerGroup) -> BasePaint {
    match group {
        LayerGroup::Artcc => BasePaint {
            color: "#4682B4",
            fill_opacity: 0.0,
            line_opacity: 0.5,
        },
        LayerGroup::Tracon => BasePaint {
            color: "#20B2AA",
            fill_opacity: 0.1,
            line_opacity: 0.5,
        },
        LayerGroup::Low => BasePaint {
            color: "#228B22",
            fill_opacity: 0.25,
            line_opacity: 0.5,
        },
        LayerGroup::High => BasePaint {
            color: "#FF6347",
            fill_opacity: 0.25,
            line_opacity: 0.5,
        },
        LayerGroup::SuperHigh => BasePaint {
            color: "#9932CC",
            fill_opacity: 0.25,
            line_opacity: 0.5,
        },
        LayerGroup::Areas => BasePaint {
            color: DEFAULT_POSITION_COLOR,
            fill_opacity: 0.3,
            line_opacity: 0.7,
        },
        LayerGroup::Presets => BasePaint {
            color: DEFAULT_PRESET_COLOR,
            fill_opacity: 0.3,
            line_opacity: 0.7,
        },
        LayerGroup::ActiveConfigs => BasePaint {
            color: DEFAULT_POSITION_COLOR,
            fill_opacity: 0.6,
            line_opacity: 0.9,
        },
    }
}

/// Overlay groups take their fill color from the feature; boundary
/// groups paint a flat color.
pub fn fill_color_expression(group: LayerGroup) -> Value {
    let base = base_paint(group).color;
    match group {
        LayerGroup::Areas | LayerGroup::Presets | LayerGroup::ActiveConfigs => {
            json!(["coalesce", ["get", "color"], base])
        }
        _ => json!(base),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerState {
    pub visible: bool,
    pub fill: bool,
    pub line: bool,
    pub opacity_pct: u8,
}

impl LayerState {
    /// Slider percentage scales the base opacity; hidden groups and
    /// disabled render modes collapse to zero.
    pub fn effective_fill_opacity(&self, base: f64) -> f64 {
        if !self.visible || !self.fill {
            return 0.0;
        }
        base * f64::from(self.opacity_pct) / 100.0
    }

    pub fn effective_line_opacity(&self, base: f64) -> f64 {
        if !self.visible || !self.line {
            return 0.0;
        }
        base * f64::from(self.opacity_pct) / 100.0
    }
}

pub const fn initial_state(group: LayerGroup) -> LayerState {
    match group {
        LayerGroup::ActiveConfigs => LayerState {
            visible: true,
            fill: true,
            line: true,
            opacity_pct: 75,
        },
        _ => LayerState {
            visible: false,
            fill: true,
            line: true,
            opacity_pct: 50,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrataVisibility {
    pub low: bool,
    pub high: bool,
    pub superhigh: bool,
}

impl Default for StrataVisibility {
    fn default() -> Self {
        Self {
            low: true,
            high: true,
            superhigh: true,
        }
    }
}

impl StrataVisibility {
    pub const fn is_visible(self, stratum: Stratum) -> bool {
        match stratum {
            Stratum::Low => self.low,
            Stratum::High => self.high,
            Stratum::SuperHigh => self.superhigh,
        }
    }

    pub fn set(&mut self, stratum: Stratum, visible: bool) {
        match stratum {
            Stratum::Low => self.low = visible,
            Stratum::High => self.high = visible,
            Stratum::SuperHigh => self.superhigh = visible,
        }
    }

    pub const fn all_visible(self) -> bool {
        self.low && self.high && self.superhigh
    }

    pub fn visible_strata(self) -> Vec<Stratum> {
        Stratum::ALL
            .into_iter()
            .filter(|s| self.is_visible(*s))
            .collect()
    }
}

/// Filter expression restricting overlay features to visible strata,
/// or None when nothing is filtered out.
pub fn strata_filter_expression(strata: StrataVisibility) -> Option<Value> {
    if strata.all_visible() {
        return None;
    }
    let visible: Vec<String> = strata
        .visible_strata()
        .iter()
        .map(|s| s.to_string())
        .collect();
    if visible.is_empty() {
        return Some(json!(["==", ["get", "stratum"], "none"]));
    }
    Some(json!(["in", ["get", "stratum"], ["literal", visible]]))
}

/// Filter expression restricting overlay features to visible configs.
/// The impossible id match hides everything when all configs are off.
pub fn config_filter_expression(visible_ids: &[i64], any_hidden: bool) -> Option<Value> {
    if !any_hidden {
        return None;
    }
    if visible_ids.is_empty() {
        return Some(json!(["==", ["get", "config_id"], -9999]));
    }
    Some(json!(["in", ["get", "config_id"], ["literal", visible_ids]]))
}

pub fn combine_filters(a: Option<Value>, b: Option<Value>) -> Option<Value> {
    match (a, b) {
        (None, None) => None,
        (Some(f), None) | (None, Some(f)) => Some(f),
        (Some(a), Some(b)) => Some(json!(["all", a, b])),
    }
}

/// A position label survives the strata filter while any of its
/// sectors still resolves into a visible stratum.
pub fn label_visible(strata: StrataVisibility, sector_strata: &[Stratum]) -> bool {
    sector_strata.iter().any(|s| strata.is_visible(*s))
}

#[derive(Debug, Clone)]
pub struct LayerController {
    states: HashMap<LayerGroup, LayerState>,
    strata: StrataVisibility,
    hidden_configs: HashSet<i64>,
}

impl Default for LayerController {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerController {
    pub fn new() -> Self {
        Self {
            states: LayerGroup::ALL
                .into_iter()
                .map(|g| (g, initial_state(g)))
                .collect(),
            strata: StrataVisibility::default(),
            hidden_configs: HashSet::new(),
        }
    }

    pub fn state(&self, group: LayerGroup) -> LayerState {
        self.states
            .get(&group)
            .copied()
            .unwrap_or(initial_state(group))
    }

    pub fn set_visible(&mut self, group: LayerGroup, visible: bool) {
        self.entry(group).visible = visible;
    }

    pub fn set_fill(&mut self, group: LayerGroup, fill: bool) {
        self.entry(group).fill = fill;
    }

    pub fn set_line(&mut self, group: LayerGroup, line: bool) {
        self.entry(group).line = line;
    }

    pub fn set_opacity_pct(&mut self, group: LayerGroup, pct: u8) {
        self.entry(group).opacity_pct = pct.min(100);
    }

    fn entry(&mut self, group: LayerGroup) -> &mut LayerState {
        self.states.entry(group).or_insert(initial_state(group))
    }

    pub const fn strata(&self) -> StrataVisibility {
        self.strata
    }

    pub fn set_stratum_visible(&mut self, stratum: Stratum, visible: bool) {
        self.strata.set(stratum, visible);
    }

    pub fn is_config_hidden(&self, config_id: i64) -> bool {
        self.hidden_configs.contains(&config_id)
    }

    pub fn set_config_hidden(&mut self, config_id: i64, hidden: bool) {
        if hidden {
            self.hidden_configs.insert(config_id);
        } else {
            self.hidden_configs.remove(&config_id);
        }
    }

    /// Drops hidden ids for configs that no longer exist.
    pub fn retain_configs(&mut self, existing: &[i64]) {
        self.hidden_configs.retain(|id| existing.contains(id));
    }

    pub fn visible_config_ids(&self, all: &[i64]) -> Vec<i64> {
        all.iter()
            .copied()
            .filter(|id| !self.hidden_configs.contains(id))
            .collect()
    }

    /// Emits visibility and paint for one group.
    pub fn sync_group(
        &self,
        group: LayerGroup,
        surface: &mut dyn MapSurface,
    ) -> Result<(), SurfaceError> {
        let state = self.state(group);
        let paint = base_paint(group);

        let fill_id = group.fill_layer_id();
        surface.set_layer_visibility(fill_id, state.visible && state.fill)?;
        surface.set_paint_property(fill_id, "fill-color", fill_color_expression(group))?;
        surface.set_paint_property(
            fill_id,
            "fill-opacity",
            json!(state.effective_fill_opacity(paint.fill_opacity)),
        )?;

        let line_id = group.line_layer_id();
        surface.set_layer_visibility(line_id, state.visible && state.line)?;
        surface.set_paint_property(
            line_id,
            "line-opacity",
            json!(state.effective_line_opacity(paint.line_opacity)),
        )?;

        if let Some(label_id) = group.label_layer_id() {
            surface.set_layer_visibility(label_id, state.visible)?;
        }
        Ok(())
    }

    pub fn sync_all(&self, surface: &mut dyn MapSurface) -> Result<(), SurfaceError> {
        for group in LayerGroup::ALL {
            self.sync_group(group, surface)?;
        }
        Ok(())
    }

    /// Applies the combined strata and per-config filter to the active
    /// overlay layers.
    pub fn sync_active_filters(
        &self,
        surface: &mut dyn MapSurface,
        all_config_ids: &[i64],
    ) -> Result<(), SurfaceError> {
        let any_hidden = all_config_ids
            .iter()
            .any(|id| self.hidden_configs.contains(id));
        let filter = combine_filters(
            strata_filter_expression(self.strata),
            config_filter_expression(&self.visible_config_ids(all_config_ids), any_hidden),
        );
        let group = LayerGroup::ActiveConfigs;
        surface.set_filter(group.fill_layer_id(), filter.clone())?;
        surface.set_filter(group.line_layer_id(), filter.clone())?;
        if let Some(label_id) = group.label_layer_id() {
            surface.set_filter(label_id, filter)?;
        }
        Ok(())
    }
}
