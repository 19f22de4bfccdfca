use serde::de::{self, IgnoredAny, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stratum {
    Low,
    High,
    SuperHigh,
}

impl Stratum {
    pub const ALL: [Stratum; 3] = [Stratum::Low, Stratum::High, Stratum::SuperHigh];
}

impl Display for Stratum {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stratum::Low => write!(f, "low"),
            Stratum::High => write!(f, "high"),
            Stratum::SuperHigh => write!(f, "superhigh"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    Artcc,
    Tracon,
    Low,
    High,
    SuperHigh,
}

impl BoundaryKind {
    pub const ALL: [BoundaryKind; 5] = [
        BoundaryKind::Artcc,
        BoundaryKind::Tracon,
        BoundaryKind::Low,
        BoundaryKind::High,
        BoundaryKind::SuperHigh,
    ];

    pub const fn stratum(self) -> Option<Stratum> {
        match self {
            BoundaryKind::Low => Some(Stratum::Low),
            BoundaryKind::High => Some(Stratum::High),
            BoundaryKind::SuperHigh => Some(Stratum::SuperHigh),
            BoundaryKind::Artcc | BoundaryKind::Tracon => None,
        }
    }
}

impl Display for BoundaryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryKind::Artcc => write!(f, "artcc"),
            BoundaryKind::Tracon => write!(f, "tracon"),
            BoundaryKind::Low => write!(f, "low"),
            BoundaryKind::High => write!(f, "high"),
            BoundaryKind::SuperHigh => write!(f, "superhigh"),
        }
    }
}

pub const fn boundary_asset_path(kind: BoundaryKind) -> &'static str {
    match kind {
        BoundaryKind::Artcc => "assets/geojson/artcc.json",
        BoundaryKind::Tracon => "assets/geojson/tracon.json",
        BoundaryKind::Low => "assets/geojson/low.json",
        BoundaryKind::High => "assets/geojson/high.json",
        BoundaryKind::SuperHigh => "assets/geojson/superhigh.json",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl Serialize for LngLat {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.lng)?;
        seq.serialize_element(&self.lat)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for LngLat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LngLatVisitor;

        impl<'de> Visitor<'de> for LngLatVisitor {
            type Value = LngLat;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str("a [lng, lat] coordinate pair")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<LngLat, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let lng = seq
                    .next_element::<f64>()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let lat = seq
                    .next_element::<f64>()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                // Some exports append an altitude element
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(LngLat { lng, lat })
            }
        }

        deserializer.deserialize_seq(LngLatVisitor)
    }
}

// Serializes as [[west, south], [east, north]], the order map engines take
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLatBounds(pub LngLat, pub LngLat);

impl LngLatBounds {
    pub const fn sw(&self) -> LngLat {
        self.0
    }

    pub const fn ne(&self) -> LngLat {
        self.1
    }

    pub fn extend(&mut self, p: LngLat) {
        self.0.lng = self.0.lng.min(p.lng);
        self.0.lat = self.0.lat.min(p.lat);
        self.1.lng = self.1.lng.max(p.lng);
        self.1.lat = self.1.lat.max(p.lat);
    }
}

pub type Ring = Vec<LngLat>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon {
        coordinates: Vec<Ring>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Ring>>,
    },
    // Boundary files also carry lines and points; sector logic skips them
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Outer ring of the first polygon. Centroid and label math follow
    /// this convention for MultiPolygon geometries.
    pub fn outer_ring(&self) -> Option<&Ring> {
        match self {
            Geometry::Polygon { coordinates } => coordinates.first(),
            Geometry::MultiPolygon { coordinates } => {
                coordinates.first().and_then(|polygon| polygon.first())
            }
            Geometry::Unsupported => None,
        }
    }

    pub fn polygons(&self) -> impl Iterator<Item = &Vec<Ring>> {
        match self {
            Geometry::Polygon { coordinates } => std::slice::from_ref(coordinates).iter(),
            Geometry::MultiPolygon { coordinates } => coordinates.iter(),
            Geometry::Unsupported => [].iter(),
        }
    }

    pub fn is_polygonal(&self) -> bool {
        !matches!(self, Geometry::Unsupported)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundaryProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artcc: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub sector: Option<String>,
}

impl BoundaryProperties {
    /// True when any identifying property equals the query. `query`
    /// must already be uppercased.
    pub fn matches(&self, query: &str) -> bool {
        let eq = |v: &Option<String>| v.as_deref().is_some_and(|v| v.to_uppercase() == query);
        if eq(&self.label) || eq(&self.name) || eq(&self.id) {
            return true;
        }
        if let (Some(artcc), Some(sector)) = (&self.artcc, &self.sector) {
            return format!("{artcc}{sector}").to_uppercase() == query;
        }
        false
    }

    /// Canonical identifier, uppercased, in the same priority order
    /// `matches` checks.
    pub fn ident(&self) -> Option<String> {
        if let Some(v) = self.display_name() {
            return Some(v.to_uppercase());
        }
        if let (Some(artcc), Some(sector)) = (&self.artcc, &self.sector) {
            return Some(format!("{artcc}{sector}").to_uppercase());
        }
        None
    }

    pub fn display_name(&self) -> Option<&str> {
        self.label
            .as_deref()
            .or(self.name.as_deref())
            .or(self.id.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    #[serde(default, deserialize_with = "null_default")]
    pub properties: BoundaryProperties,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn empty() -> Self {
        Self { features: vec![] }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundarySets {
    pub artcc: FeatureCollection,
    pub tracon: FeatureCollection,
    pub low: FeatureCollection,
    pub high: FeatureCollection,
    pub superhigh: FeatureCollection,
}

impl BoundarySets {
    pub fn get(&self, kind: BoundaryKind) -> &FeatureCollection {
        match kind {
            BoundaryKind::Artcc => &self.artcc,
            BoundaryKind::Tracon => &self.tracon,
            BoundaryKind::Low => &self.low,
            BoundaryKind::High => &self.high,
            BoundaryKind::SuperHigh => &self.superhigh,
        }
    }

    pub fn set(&mut self, kind: BoundaryKind, collection: FeatureCollection) {
        match kind {
            BoundaryKind::Artcc => self.artcc = collection,
            BoundaryKind::Tracon => self.tracon = collection,
            BoundaryKind::Low => self.low = collection,
            BoundaryKind::High => self.high = collection,
            BoundaryKind::SuperHigh => self.superhigh = collection,
        }
    }

    pub fn stratum(&self, stratum: Stratum) -> &FeatureCollection {
        match stratum {
            Stratum::Low => &self.low,
            Stratum::High => &self.high,
            Stratum::SuperHigh => &self.superhigh,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Str(s)) => Some(s),
        Some(Raw::Int(n)) => Some(n.to_string()),
        Some(Raw::Float(n)) => Some(n.to_string()),
        None => None,
    })
}

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
