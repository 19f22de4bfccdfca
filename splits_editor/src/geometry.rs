use shared::splits::boundaries::{
    BoundaryKind, BoundarySets, Feature, FeatureCollection, Geometry, LngLat, LngLatBounds, Ring,
    Stratum,
};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct BoundaryIndex {
    sets: BoundarySets,
}

#[derive(Debug, Clone, Copy)]
pub struct SectorHit<'a> {
    pub feature: &'a Feature,
    pub geometry: &'a Geometry,
    pub centroid: LngLat,
    pub stratum: Stratum,
}

impl SectorHit<'_> {
    pub fn ident(&self) -> Option<String> {
        self.feature.properties.ident()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorSummary {
    pub id: String,
    pub name: Option<String>,
    pub stratum: Stratum,
}

impl BoundaryIndex {
    pub fn new(sets: BoundarySets) -> Self {
        Self { sets }
    }

    pub fn collection(&self, kind: BoundaryKind) -> &FeatureCollection {
        self.sets.get(kind)
    }

    pub fn stratum_collection(&self, stratum: Stratum) -> &FeatureCollection {
        self.sets.stratum(stratum)
    }

    /// Resolves a sector identifier to the first matching polygonal
    /// feature, searching low, then high, then superhigh.
    pub fn find_sector(&self, id: &str) -> Option<SectorHit<'_>> {
        let query = id.trim().to_uppercase();
        Stratum::ALL
            .iter()
            .find_map(|&stratum| self.find_in(stratum, &query))
    }

    pub fn find_sector_in_stratum(&self, id: &str, stratum: Stratum) -> Option<SectorHit<'_>> {
        self.find_in(stratum, &id.trim().to_uppercase())
    }

    fn find_in(&self, stratum: Stratum, query: &str) -> Option<SectorHit<'_>> {
        self.sets.stratum(stratum).features.iter().find_map(|feature| {
            if !feature.properties.matches(query) {
                return None;
            }
            let geometry = feature.geometry.as_ref().filter(|g| g.is_polygonal())?;
            let centroid = bbox_center(geometry)?;
            Some(SectorHit {
                feature,
                geometry,
                centroid,
                stratum,
            })
        })
    }

    /// Sectors belonging to one ARTCC across all three strata,
    /// deduplicated by identifier with the lowest stratum winning.
    pub fn sectors_for_artcc(&self, artcc: &str) -> Vec<SectorSummary> {
        let prefix = artcc.trim().to_uppercase();
        if prefix.is_empty() {
            return vec![];
        }
        let mut seen = HashSet::new();
        let mut sectors = vec![];
        for &stratum in &Stratum::ALL {
            for feature in &self.sets.stratum(stratum).features {
                let props = &feature.properties;
                let Some(id) = props.ident() else { continue };
                let belongs = id.starts_with(&prefix)
                    || props
                        .artcc
                        .as_deref()
                        .is_some_and(|a| a.to_uppercase() == prefix);
                if !belongs || !seen.insert(id.clone()) {
                    continue;
                }
                sectors.push(SectorSummary {
                    id,
                    name: props.name.clone(),
                    stratum,
                });
            }
        }
        sectors.sort_by(|a, b| a.id.cmp(&b.id));
        sectors
    }

    /// All features of one boundary set containing the point.
    pub fn features_at(&self, kind: BoundaryKind, point: LngLat) -> Vec<&Feature> {
        self.sets
            .get(kind)
            .features
            .iter()
            .filter(|f| {
                f.geometry
                    .as_ref()
                    .is_some_and(|g| geometry_contains(g, point))
            })
            .collect()
    }

    /// Sector hits under a point, restricted to the given strata and
    /// ordered by the strata slice.
    pub fn hit_test(&self, point: LngLat, strata: &[Stratum]) -> Vec<SectorHit<'_>> {
        let mut hits = vec![];
        for &stratum in strata {
            for feature in &self.sets.stratum(stratum).features {
                let Some(geometry) = feature.geometry.as_ref() else {
                    continue;
                };
                if !geometry_contains(geometry, point) {
                    continue;
                }
                let Some(centroid) = bbox_center(geometry) else {
                    continue;
                };
                hits.push(SectorHit {
                    feature,
                    geometry,
                    centroid,
                    stratum,
                });
            }
        }
        hits
    }
}

/// Midpoint of the outer ring's bounding box. This is intentionally not
/// an area centroid; labels and leader targets share the convention.
pub fn bbox_center(geometry: &Geometry) -> Option<LngLat> {
    let bounds = ring_bounds(geometry.outer_ring()?)?;
    Some(LngLat::new(
        (bounds.sw().lng + bounds.ne().lng) / 2.0,
        (bounds.sw().lat + bounds.ne().lat) / 2.0,
    ))
}

/// Bounding box across the outer rings of every polygon.
pub fn geometry_bounds(geometry: &Geometry) -> Option<LngLatBounds> {
    let mut bounds: Option<LngLatBounds> = None;
    for polygon in geometry.polygons() {
        let Some(ring) = polygon.first() else { continue };
        let Some(rb) = ring_bounds(ring) else { continue };
        match &mut bounds {
            Some(b) => {
                b.extend(rb.sw());
                b.extend(rb.ne());
            }
            None => bounds = Some(rb),
        }
    }
    bounds
}

fn ring_bounds(ring: &Ring) -> Option<LngLatBounds> {
    let mut points = ring.iter();
    let first = points.next()?;
    let mut bounds = LngLatBounds(*first, *first);
    for p in points {
        bounds.extend(*p);
    }
    Some(bounds)
}

/// Ray casting against the outer ring of each polygon. Holes are not
/// punched out; sector boundaries do not carry them.
pub fn geometry_contains(geometry: &Geometry, point: LngLat) -> bool {
    geometry
        .polygons()
        .any(|polygon| polygon.first().is_some_and(|ring| ring_contains(ring, point)))
}

fn ring_contains(ring: &[LngLat], p: LngLat) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = ring[i];
        let b = ring[j];
        if (a.lat > p.lat) != (b.lat > p.lat) {
            let intersect_lng = (b.lng - a.lng) * (p.lat - a.lat) / (b.lat - a.lat) + a.lng;
            if p.lng < intersect_lng {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
