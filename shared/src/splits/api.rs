use crate::splits::boundaries::{Geometry, LngLat, LngLatBounds, Stratum};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

pub const CONFIGS_ENDPOINT: &str = "api/splits/configs.php";
pub const AREAS_ENDPOINT: &str = "api/splits/areas.php";
pub const PRESETS_ENDPOINT: &str = "api/splits/presets.php";
pub const ACTIVE_ENDPOINT: &str = "api/splits/active.php";
pub const SCHEDULED_ENDPOINT: &str = "api/splits/scheduled.php";
pub const TRACONS_ENDPOINT: &str = "api/splits/tracons.php";
pub const SECTORS_ENDPOINT: &str = "api/splits/sectors.php";

pub const DEFAULT_POSITION_COLOR: &str = "#808080";
pub const DEFAULT_PRESET_COLOR: &str = "#4dabf7";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigStatus {
    Draft,
    Scheduled,
    Active,
    Expired,
}

impl Display for ConfigStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigStatus::Draft => write!(f, "draft"),
            ConfigStatus::Scheduled => write!(f, "scheduled"),
            ConfigStatus::Active => write!(f, "active"),
            ConfigStatus::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitConfig {
    #[serde(deserialize_with = "flexible_id")]
    pub id: i64,
    pub artcc: String,
    pub config_name: String,
    pub status: ConfigStatus,
    #[serde(default, with = "api_datetime_opt")]
    pub start_time_utc: Option<DateTime<Utc>>,
    #[serde(default, with = "api_datetime_opt")]
    pub end_time_utc: Option<DateTime<Utc>>,
    #[serde(default, with = "api_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "api_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub positions: Vec<SplitPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSummary {
    #[serde(deserialize_with = "flexible_id")]
    pub id: i64,
    pub artcc: String,
    pub config_name: String,
    pub status: ConfigStatus,
    #[serde(default, with = "api_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitPosition {
    pub position_name: String,
    #[serde(default = "default_position_color")]
    pub color: String,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller_oi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<PositionFilters>,
    #[serde(default, with = "api_datetime_opt", skip_serializing_if = "Option::is_none")]
    pub start_time_utc: Option<DateTime<Utc>>,
    #[serde(default, with = "api_datetime_opt", skip_serializing_if = "Option::is_none")]
    pub end_time_utc: Option<DateTime<Utc>>,
}

fn default_position_color() -> String {
    DEFAULT_POSITION_COLOR.to_string()
}

fn default_preset_color() -> String {
    DEFAULT_PRESET_COLOR.to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PositionFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<AltitudeFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aircraft: Option<AircraftFilters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orig: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_other: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AltitudeFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceiling: Option<String>,
    // Block altitude shorthand, e.g. "240B350"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AircraftFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acft_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rvsm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nav_equip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acft_other: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Area {
    #[serde(deserialize_with = "flexible_id")]
    pub id: i64,
    pub artcc: String,
    pub area_name: String,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, with = "api_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "api_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetSummary {
    #[serde(deserialize_with = "flexible_id")]
    pub id: i64,
    pub preset_name: String,
    pub artcc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, with = "api_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "api_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub position_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preset {
    #[serde(deserialize_with = "flexible_id")]
    pub id: i64,
    pub preset_name: String,
    pub artcc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, with = "api_datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "api_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub positions: Vec<PresetPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetPosition {
    #[serde(deserialize_with = "flexible_id")]
    pub id: i64,
    pub position_name: String,
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default = "default_preset_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<PositionFilters>,
    #[serde(default, alias = "strataFilter", skip_serializing_if = "Option::is_none")]
    pub strata_filter: Option<Vec<Stratum>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConfig {
    pub artcc: String,
    pub config_name: String,
    pub status: ConfigStatus,
    #[serde(default, with = "api_datetime_opt", skip_serializing_if = "Option::is_none")]
    pub start_time_utc: Option<DateTime<Utc>>,
    #[serde(default, with = "api_datetime_opt", skip_serializing_if = "Option::is_none")]
    pub end_time_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default)]
    pub positions: Vec<SplitPosition>,
}

// PUT body; omitted fields are left untouched server-side
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artcc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ConfigStatus>,
    #[serde(default, with = "api_datetime_opt", skip_serializing_if = "Option::is_none")]
    pub start_time_utc: Option<DateTime<Utc>>,
    #[serde(default, with = "api_datetime_opt", skip_serializing_if = "Option::is_none")]
    pub end_time_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<SplitPosition>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewArea {
    pub artcc: String,
    pub area_name: String,
    pub sectors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AreaUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sectors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPreset {
    pub preset_name: String,
    pub artcc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub positions: Vec<NewPresetPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPresetPosition {
    pub position_name: String,
    pub sectors: Vec<String>,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<PositionFilters>,
    // The server reads the camelCase key on create and update
    #[serde(
        default,
        rename = "strataFilter",
        skip_serializing_if = "Option::is_none"
    )]
    pub strata_filter: Option<Vec<Stratum>>,
}

// PATCH body for a preset position
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PresetPositionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strata_filter: Option<Vec<Stratum>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AreaPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigsList {
    pub configs: Vec<ConfigSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDetail {
    pub config: SplitConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreasList {
    pub areas: Vec<Area>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetsList {
    pub presets: Vec<PresetSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetDetail {
    pub preset: Preset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub configs: Vec<SplitConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedConfig {
    pub success: bool,
    #[serde(deserialize_with = "flexible_id")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions_inserted: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions_updated: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedArea {
    pub success: bool,
    #[serde(deserialize_with = "flexible_id")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPreset {
    pub success: bool,
    #[serde(deserialize_with = "flexible_id")]
    pub preset_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraconDirectory {
    pub tracons: HashMap<String, TraconInfo>,
    #[serde(default)]
    pub by_name: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraconInfo {
    pub name: String,
    pub artcc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcc_region: Option<String>,
    #[serde(default)]
    pub airports: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectorFilter {
    All,
    High,
    Low,
    Ultra,
}

impl Display for SectorFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SectorFilter::All => write!(f, "all"),
            SectorFilter::High => write!(f, "high"),
            SectorFilter::Low => write!(f, "low"),
            SectorFilter::Ultra => write!(f, "ultra"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacilitySectors {
    pub success: bool,
    pub facility: String,
    pub filter: SectorFilter,
    pub demo: bool,
    pub sectors: Vec<FacilitySector>,
    #[serde(default)]
    pub bounds: Option<LngLatBounds>,
    #[serde(default)]
    pub center: Option<LngLat>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacilitySector {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub freq: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub geometry: Geometry,
    #[serde(default)]
    pub centroid: Option<LngLat>,
}

// The server stores zoneless UTC DATETIMEs; list endpoints sometimes
// append a Z suffix and datetime-local inputs arrive without seconds.
pub mod api_datetime {
    use super::{DateTime, NaiveDateTime, Utc, de};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const WIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    const ACCEPTED_FORMATS: [&str; 4] = [
        WIRE_FORMAT,
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%dT%H:%M:%SZ",
    ];

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        for format in ACCEPTED_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Some(naive.and_utc());
            }
        }
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(WIRE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).ok_or_else(|| de::Error::custom(format!("unrecognized datetime: {s}")))
    }
}

pub mod api_datetime_opt {
    use super::{DateTime, Utc, api_datetime, de};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => api_datetime::serialize(dt, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.is_empty() => api_datetime::parse(&s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("unrecognized datetime: {s}"))),
            _ => Ok(None),
        }
    }
}

// Create responses carry numeric ids; update responses echo the query
// parameter back as a string.
fn flexible_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(n) => Ok(n),
        Raw::Str(s) => s.trim().parse().map_err(de::Error::custom),
    }
}
