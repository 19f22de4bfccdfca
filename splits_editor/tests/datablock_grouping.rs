use shared::splits::boundaries::{Geometry, LngLat};
use splits_editor::datablock::{
    CONTIGUITY_THRESHOLD_PX, Datablock, DatablockKey, DatablockRegistry, DisjointSet,
    ScreenSegment, group_contiguous_segments, leader_lines_for_block, nearest_point_on_segment,
    project_sector_edges, rect_border_anchor,
};
use splits_editor::surface::{Projection, ScreenPoint, ScreenRect, WebMercator};

// Maps degrees straight to pixels so expected coordinates stay exact.
struct FlatProjection {
    width: f64,
    height: f64,
}

impl Projection for FlatProjection {
    fn project(&self, point: LngLat) -> ScreenPoint {
        ScreenPoint::new(point.lng, point.lat)
    }

    fn unproject(&self, point: ScreenPoint) -> LngLat {
        LngLat::new(point.x, point.y)
    }

    fn viewport(&self) -> ScreenRect {
        ScreenRect::new(
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(self.width, self.height),
        )
    }
}

fn flat() -> FlatProjection {
    FlatProjection {
        width: 800.0,
        height: 600.0,
    }
}

fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> ScreenSegment {
    ScreenSegment {
        a: ScreenPoint::new(ax, ay),
        b: ScreenPoint::new(bx, by),
    }
}

fn square_geometry(min_x: f64, min_y: f64, side: f64) -> Geometry {
    Geometry::Polygon {
        coordinates: vec![vec![
            LngLat::new(min_x, min_y),
            LngLat::new(min_x + side, min_y),
            LngLat::new(min_x + side, min_y + side),
            LngLat::new(min_x, min_y + side),
            LngLat::new(min_x, min_y),
        ]],
    }
}

#[test]
fn disjoint_set_unions_transitively() {
    let mut set = DisjointSet::new(5);
    set.union(0, 1);
    set.union(1, 2);
    assert_eq!(set.find(0), set.find(2));
    assert_ne!(set.find(0), set.find(3));
    set.union(3, 4);
    set.union(2, 4);
    assert_eq!(set.find(0), set.find(3));
}

#[test]
fn segments_group_by_endpoint_proximity() {
    let segments = [
        seg(10.0, 10.0, 50.0, 10.0),
        seg(52.0, 10.0, 52.0, 40.0),
        seg(200.0, 200.0, 240.0, 200.0),
    ];
    let groups = group_contiguous_segments(&segments, CONTIGUITY_THRESHOLD_PX);
    assert_eq!(groups, [vec![0, 1], vec![2]]);
}

#[test]
fn grouping_respects_the_exact_threshold() {
    let touching = [seg(0.0, 0.0, 10.0, 0.0), seg(13.0, 0.0, 20.0, 0.0)];
    assert_eq!(group_contiguous_segments(&touching, 3.0).len(), 1);

    let apart = [seg(0.0, 0.0, 10.0, 0.0), seg(13.5, 0.0, 20.0, 0.0)];
    assert_eq!(group_contiguous_segments(&apart, 3.0).len(), 2);

    assert!(group_contiguous_segments(&[], 3.0).is_empty());
}

#[test]
fn nearest_point_clamps_to_segment_ends() {
    let a = ScreenPoint::new(0.0, 0.0);
    let b = ScreenPoint::new(10.0, 0.0);

    assert_eq!(nearest_point_on_segment(ScreenPoint::new(-5.0, 3.0), a, b), a);
    assert_eq!(nearest_point_on_segment(ScreenPoint::new(15.0, 3.0), a, b), b);
    assert_eq!(
        nearest_point_on_segment(ScreenPoint::new(4.0, 5.0), a, b),
        ScreenPoint::new(4.0, 0.0)
    );
    // degenerate segment
    assert_eq!(nearest_point_on_segment(ScreenPoint::new(7.0, 7.0), a, a), a);
}

#[test]
fn border_anchor_sits_on_the_rectangle_edge() {
    let rect = ScreenRect::new(ScreenPoint::new(0.0, 0.0), ScreenPoint::new(120.0, 50.0));

    // outside targets clamp to the border
    assert_eq!(
        rect_border_anchor(rect, ScreenPoint::new(200.0, 25.0)),
        ScreenPoint::new(120.0, 25.0)
    );
    assert_eq!(
        rect_border_anchor(rect, ScreenPoint::new(60.0, -30.0)),
        ScreenPoint::new(60.0, 0.0)
    );

    // inside targets snap to the nearest side
    assert_eq!(
        rect_border_anchor(rect, ScreenPoint::new(10.0, 25.0)),
        ScreenPoint::new(0.0, 25.0)
    );
    assert_eq!(
        rect_border_anchor(rect, ScreenPoint::new(60.0, 45.0)),
        ScreenPoint::new(60.0, 50.0)
    );
}

#[test]
fn one_leader_per_contiguity_group() {
    let projection = flat();
    let block = Datablock::new(DatablockKey::new(41, "METRO"), LngLat::new(400.0, 300.0));

    // two squares sharing an edge form one island, the third stands apart
    let a = square_geometry(100.0, 100.0, 40.0);
    let b = square_geometry(140.0, 100.0, 40.0);
    let c = square_geometry(700.0, 500.0, 40.0);

    let lines = leader_lines_for_block(&block, &[&a, &b, &c], &projection);
    assert_eq!(lines.len(), 2);

    let rect = block.rect(&projection);
    for line in &lines {
        let on_border = line.from.x == rect.min.x
            || line.from.x == rect.max.x
            || line.from.y == rect.min.y
            || line.from.y == rect.max.y;
        assert!(on_border, "leader must start on the block border");
    }

    // nearest edge points of each island
    assert!(lines.iter().any(|l| l.to == ScreenPoint::new(180.0, 140.0)));
    assert!(lines.iter().any(|l| l.to == ScreenPoint::new(700.0, 500.0)));
}

#[test]
fn no_leaders_without_visible_edges() {
    let projection = flat();
    let block = Datablock::new(DatablockKey::new(41, "METRO"), LngLat::new(400.0, 300.0));
    assert!(leader_lines_for_block(&block, &[], &projection).is_empty());

    let far = square_geometry(5000.0, 5000.0, 40.0);
    assert!(leader_lines_for_block(&block, &[&far], &projection).is_empty());
}

#[test]
fn offscreen_geometry_is_culled_before_grouping() {
    let projection = flat();

    let far = square_geometry(2000.0, 100.0, 40.0);
    assert!(project_sector_edges(&far, &projection).is_empty());

    // a square straddling the viewport corner keeps only its near edges
    let straddling = square_geometry(-100.0, -100.0, 150.0);
    let segments = project_sector_edges(&straddling, &projection);
    assert_eq!(segments.len(), 2);
}

#[test]
fn open_rings_are_closed_when_projected() {
    let projection = flat();
    let open = Geometry::Polygon {
        coordinates: vec![vec![
            LngLat::new(100.0, 100.0),
            LngLat::new(140.0, 100.0),
            LngLat::new(140.0, 140.0),
            LngLat::new(100.0, 140.0),
        ]],
    };
    let closed = square_geometry(100.0, 100.0, 40.0);

    assert_eq!(project_sector_edges(&open, &projection).len(), 4);
    assert_eq!(project_sector_edges(&closed, &projection).len(), 4);
}

#[test]
fn registry_toggles_drags_and_prunes() {
    let projection = flat();
    let mut registry = DatablockRegistry::new();
    let key = DatablockKey::new(41, "METRO");

    assert!(registry.toggle(key.clone(), LngLat::new(10.0, 20.0)));
    assert!(registry.is_open(&key));
    assert_eq!(registry.len(), 1);

    assert!(registry.drag_to(&key, ScreenPoint::new(250.0, 125.0), &projection));
    assert_eq!(registry.get(&key).unwrap().anchor, LngLat::new(250.0, 125.0));

    let other = DatablockKey::new(99, "NORTH");
    assert!(!registry.drag_to(&other, ScreenPoint::new(0.0, 0.0), &projection));

    registry.toggle(other.clone(), LngLat::new(1.0, 1.0));
    registry.retain_configs(&[41]);
    assert!(registry.is_open(&key));
    assert!(!registry.is_open(&other));

    assert!(!registry.toggle(key.clone(), LngLat::new(0.0, 0.0)));
    assert!(registry.is_empty());
}

#[test]
fn web_mercator_round_trips_and_centers() {
    let projection = WebMercator::new(LngLat::new(-77.0, 38.5), 7.0, 800.0, 600.0);

    let center = projection.project(LngLat::new(-77.0, 38.5));
    assert!((center.x - 400.0).abs() < 1e-9);
    assert!((center.y - 300.0).abs() < 1e-9);

    for point in [
        LngLat::new(-77.0, 38.5),
        LngLat::new(-76.2, 39.1),
        LngLat::new(-78.9, 37.8),
    ] {
        let back = projection.unproject(projection.project(point));
        assert!((back.lng - point.lng).abs() < 1e-6);
        assert!((back.lat - point.lat).abs() < 1e-6);
    }

    // northern latitudes sit higher on screen
    let north = projection.project(LngLat::new(-77.0, 39.5));
    let south = projection.project(LngLat::new(-77.0, 37.5));
    assert!(north.y < south.y);

    let block = Datablock::new(DatablockKey::new(41, "METRO"), LngLat::new(-77.0, 38.5));
    let rect = block.rect(&projection);
    assert!((rect.center().x - 400.0).abs() < 1e-9);
    assert!((rect.width() - 120.0).abs() < 1e-9);
}
