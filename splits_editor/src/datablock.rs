use crate::geometry::geometry_bounds;
use crate::surface::{Projection, ScreenPoint, ScreenRect};
use shared::splits::boundaries::{Geometry, LngLat};
use std::collections::HashMap;

/// Edge endpoints closer than this are treated as the same boundary.
pub const CONTIGUITY_THRESHOLD_PX: f64 = 3.0;

/// Projected edges this far outside the viewport still participate in
/// grouping so leaders stay stable while panning.
const EDGE_CULL_MARGIN_PX: f64 = 32.0;

pub const DATABLOCK_WIDTH: f64 = 120.0;
pub const DATABLOCK_HEIGHT: f64 = 50.0;

pub struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl DisjointSet {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    pub fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    pub fn union(&mut self, x: usize, y: usize) {
        let px = self.find(x);
        let py = self.find(y);
        if px == py {
            return;
        }
        if self.rank[px] < self.rank[py] {
            self.parent[px] = py;
        } else if self.rank[px] > self.rank[py] {
            self.parent[py] = px;
        } else {
            self.parent[py] = px;
            self.rank[px] += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSegment {
    pub a: ScreenPoint,
    pub b: ScreenPoint,
}

impl ScreenSegment {
    fn bbox(&self) -> ScreenRect {
        ScreenRect::new(
            ScreenPoint::new(self.a.x.min(self.b.x), self.a.y.min(self.b.y)),
            ScreenPoint::new(self.a.x.max(self.b.x), self.a.y.max(self.b.y)),
        )
    }

    fn touches(&self, other: &ScreenSegment, threshold: f64) -> bool {
        self.a.distance_to(other.a) <= threshold
            || self.a.distance_to(other.b) <= threshold
            || self.b.distance_to(other.a) <= threshold
            || self.b.distance_to(other.b) <= threshold
    }
}

/// Projects the outer rings of a sector into screen space, dropping
/// edges far outside the viewport. A bounds check in geographic space
/// skips sectors that cannot intersect the view at all.
pub fn project_sector_edges(geometry: &Geometry, projection: &dyn Projection) -> Vec<ScreenSegment> {
    if let Some(gb) = geometry_bounds(geometry) {
        let vb = projection.viewport_bounds();
        let disjoint = gb.sw().lng > vb.ne().lng
            || gb.ne().lng < vb.sw().lng
            || gb.sw().lat > vb.ne().lat
            || gb.ne().lat < vb.sw().lat;
        if disjoint {
            return vec![];
        }
    }

    let keep_rect = projection.viewport().expanded(EDGE_CULL_MARGIN_PX);
    let mut segments = vec![];
    for polygon in geometry.polygons() {
        let Some(ring) = polygon.first() else { continue };
        let mut points = projection.project_ring(ring);
        if ring.first() != ring.last() && points.len() >= 2 {
            points.push(points[0]);
        }
        for pair in points.windows(2) {
            let segment = ScreenSegment {
                a: pair[0],
                b: pair[1],
            };
            if segment.bbox().intersects(&keep_rect) {
                segments.push(segment);
            }
        }
    }
    segments
}

/// Partitions segments into visually contiguous groups: two segments
/// share a group when any pair of their endpoints sits within the
/// threshold.
pub fn group_contiguous_segments(segments: &[ScreenSegment], threshold: f64) -> Vec<Vec<usize>> {
    let n = segments.len();
    if n == 0 {
        return vec![];
    }
    let mut set = DisjointSet::new(n);
    for i in 0..n {
        let reach = segments[i].bbox().expanded(threshold);
        for j in (i + 1)..n {
            if !reach.intersects(&segments[j].bbox()) {
                continue;
            }
            if segments[i].touches(&segments[j], threshold) {
                set.union(i, j);
            }
        }
    }

    let mut groups: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..n {
        let root = set.find(i);
        groups.entry(root).or_default().push(i);
    }
    let mut groups: Vec<Vec<usize>> = groups.into_values().collect();
    groups.sort_by_key(|g| g[0]);
    groups
}

pub fn nearest_point_on_segment(p: ScreenPoint, a: ScreenPoint, b: ScreenPoint) -> ScreenPoint {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return a;
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
    ScreenPoint::new(a.x + t * dx, a.y + t * dy)
}

fn nearest_point_in_group(
    target: ScreenPoint,
    segments: &[ScreenSegment],
    group: &[usize],
) -> Option<ScreenPoint> {
    let mut best: Option<(f64, ScreenPoint)> = None;
    for &i in group {
        let candidate = nearest_point_on_segment(target, segments[i].a, segments[i].b);
        let d = target.distance_to(candidate);
        if best.is_none_or(|(bd, _)| d < bd) {
            best = Some((d, candidate));
        }
    }
    best.map(|(_, p)| p)
}

/// Point on the rectangle border closest to the target, so leaders
/// start at the block edge instead of its center.
pub fn rect_border_anchor(rect: ScreenRect, target: ScreenPoint) -> ScreenPoint {
    let clamped = ScreenPoint::new(
        target.x.clamp(rect.min.x, rect.max.x),
        target.y.clamp(rect.min.y, rect.max.y),
    );
    if clamped != target {
        return clamped;
    }
    let left = clamped.x - rect.min.x;
    let right = rect.max.x - clamped.x;
    let top = clamped.y - rect.min.y;
    let bottom = rect.max.y - clamped.y;
    let nearest = left.min(right).min(top).min(bottom);
    if nearest == left {
        ScreenPoint::new(rect.min.x, clamped.y)
    } else if nearest == right {
        ScreenPoint::new(rect.max.x, clamped.y)
    } else if nearest == top {
        ScreenPoint::new(clamped.x, rect.min.y)
    } else {
        ScreenPoint::new(clamped.x, rect.max.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderLine {
    pub from: ScreenPoint,
    pub to: ScreenPoint,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatablockKey {
    pub config_id: i64,
    pub position_name: String,
}

impl DatablockKey {
    pub fn new(config_id: i64, position_name: impl Into<String>) -> Self {
        Self {
            config_id,
            position_name: position_name.into(),
        }
    }
}

// Anchored in geographic space so pan and zoom carry the block with
// the sectors it annotates.
#[derive(Debug, Clone, PartialEq)]
pub struct Datablock {
    pub key: DatablockKey,
    pub anchor: LngLat,
    pub width: f64,
    pub height: f64,
}

impl Datablock {
    pub fn new(key: DatablockKey, anchor: LngLat) -> Self {
        Self {
            key,
            anchor,
            width: DATABLOCK_WIDTH,
            height: DATABLOCK_HEIGHT,
        }
    }

    pub fn rect(&self, projection: &dyn Projection) -> ScreenRect {
        ScreenRect::centered(projection.project(self.anchor), self.width, self.height)
    }
}

/// One leader per contiguity group of the position's sector edges.
pub fn leader_lines_for_block(
    block: &Datablock,
    geometries: &[&Geometry],
    projection: &dyn Projection,
) -> Vec<LeaderLine> {
    let rect = block.rect(projection);
    let mut segments = vec![];
    for geometry in geometries {
        segments.extend(project_sector_edges(geometry, projection));
    }
    let groups = group_contiguous_segments(&segments, CONTIGUITY_THRESHOLD_PX);
    let center = rect.center();
    groups
        .iter()
        .filter_map(|group| {
            let to = nearest_point_in_group(center, &segments, group)?;
            Some(LeaderLine {
                from: rect_border_anchor(rect, to),
                to,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct DatablockRegistry {
    open: HashMap<DatablockKey, Datablock>,
}

impl DatablockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, key: &DatablockKey) -> bool {
        self.open.contains_key(key)
    }

    /// Opens the block at the given anchor, or closes it if already
    /// open. Returns whether the block is open afterwards.
    pub fn toggle(&mut self, key: DatablockKey, anchor: LngLat) -> bool {
        if self.open.remove(&key).is_some() {
            return false;
        }
        self.open.insert(key.clone(), Datablock::new(key, anchor));
        true
    }

    pub fn close(&mut self, key: &DatablockKey) {
        self.open.remove(key);
    }

    /// Drops blocks for configs that no longer exist.
    pub fn retain_configs(&mut self, existing: &[i64]) {
        self.open.retain(|key, _| existing.contains(&key.config_id));
    }

    /// Re-anchors a dragged block at the screen position's geographic
    /// location. Returns false for blocks that are not open.
    pub fn drag_to(
        &mut self,
        key: &DatablockKey,
        position: ScreenPoint,
        projection: &dyn Projection,
    ) -> bool {
        let Some(block) = self.open.get_mut(key) else {
            return false;
        };
        block.anchor = projection.unproject(position);
        true
    }

    pub fn get(&self, key: &DatablockKey) -> Option<&Datablock> {
        self.open.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Datablock> {
        self.open.values()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}
