use shared::splits::boundaries::{
    BoundaryKind, BoundaryProperties, BoundarySets, Feature, FeatureCollection, Geometry, LngLat,
    Stratum,
};
use splits_editor::geometry::{BoundaryIndex, bbox_center, geometry_bounds, geometry_contains};

fn ring(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Vec<LngLat> {
    vec![
        LngLat::new(min_lng, min_lat),
        LngLat::new(max_lng, min_lat),
        LngLat::new(max_lng, max_lat),
        LngLat::new(min_lng, max_lat),
        LngLat::new(min_lng, min_lat),
    ]
}

fn square(label: &str, min_lng: f64, min_lat: f64, side: f64) -> Feature {
    Feature {
        properties: BoundaryProperties {
            label: Some(label.to_string()),
            ..Default::default()
        },
        geometry: Some(Geometry::Polygon {
            coordinates: vec![ring(min_lng, min_lat, min_lng + side, min_lat + side)],
        }),
    }
}

fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection { features }
}

fn index(low: Vec<Feature>, high: Vec<Feature>, superhigh: Vec<Feature>) -> BoundaryIndex {
    BoundaryIndex::new(BoundarySets {
        low: collection(low),
        high: collection(high),
        superhigh: collection(superhigh),
        ..Default::default()
    })
}

#[test]
fn find_sector_matches_each_property_shape() {
    let by_name = Feature {
        properties: BoundaryProperties {
            name: Some("ZDC12".to_string()),
            ..Default::default()
        },
        geometry: Some(Geometry::Polygon {
            coordinates: vec![ring(20.0, 20.0, 22.0, 22.0)],
        }),
    };
    let by_id = Feature {
        properties: BoundaryProperties {
            id: Some("ZDC33".to_string()),
            ..Default::default()
        },
        geometry: Some(Geometry::Polygon {
            coordinates: vec![ring(30.0, 30.0, 32.0, 32.0)],
        }),
    };
    let by_concat = Feature {
        properties: BoundaryProperties {
            artcc: Some("ZDC".to_string()),
            sector: Some("54".to_string()),
            ..Default::default()
        },
        geometry: Some(Geometry::Polygon {
            coordinates: vec![ring(40.0, 40.0, 42.0, 42.0)],
        }),
    };
    let idx = index(
        vec![square("ZDC50", 0.0, 0.0, 2.0), by_name, by_id, by_concat],
        vec![],
        vec![],
    );

    assert!(idx.find_sector("ZDC50").is_some());
    assert!(idx.find_sector("zdc12").is_some());
    assert!(idx.find_sector(" ZDC33 ").is_some());
    assert!(idx.find_sector("ZDC54").is_some());
    assert!(idx.find_sector("ZDC99").is_none());
}

#[test]
fn find_sector_searches_low_before_high_before_superhigh() {
    let idx = index(
        vec![square("ZDC50", 0.0, 0.0, 2.0)],
        vec![square("ZDC50", 10.0, 10.0, 2.0)],
        vec![square("ZDC50", 20.0, 20.0, 2.0)],
    );

    let hit = idx.find_sector("ZDC50").unwrap();
    assert_eq!(hit.stratum, Stratum::Low);

    let high = idx.find_sector_in_stratum("ZDC50", Stratum::High).unwrap();
    assert_eq!(high.stratum, Stratum::High);
    assert_eq!(high.centroid, LngLat::new(11.0, 11.0));

    let superhigh = idx
        .find_sector_in_stratum("ZDC50", Stratum::SuperHigh)
        .unwrap();
    assert_eq!(superhigh.centroid, LngLat::new(21.0, 21.0));
}

#[test]
fn find_sector_returns_the_same_geometry_reference() {
    let idx = index(vec![square("ZDC50", 0.0, 0.0, 2.0)], vec![], vec![]);
    let first = idx.find_sector("ZDC50").unwrap();
    let second = idx.find_sector("ZDC50").unwrap();
    assert!(std::ptr::eq(first.geometry, second.geometry));
}

#[test]
fn find_sector_skips_non_polygonal_matches() {
    let unsupported = Feature {
        properties: BoundaryProperties {
            label: Some("ZDC60".to_string()),
            ..Default::default()
        },
        geometry: Some(Geometry::Unsupported),
    };
    let polygonal = square("ZDC60", 5.0, 5.0, 2.0);
    let idx = index(vec![unsupported, polygonal], vec![], vec![]);

    let hit = idx.find_sector("ZDC60").unwrap();
    assert_eq!(hit.centroid, LngLat::new(6.0, 6.0));
}

#[test]
fn sectors_for_artcc_dedups_across_strata_and_sorts() {
    let idx = index(
        vec![square("ZDC52", 0.0, 0.0, 2.0), square("ZDC50", 4.0, 0.0, 2.0)],
        vec![square("ZDC50", 8.0, 0.0, 2.0), square("ZDC72", 12.0, 0.0, 2.0)],
        vec![square("ZNY86", 16.0, 0.0, 2.0)],
    );

    let sectors = idx.sectors_for_artcc("zdc");
    let ids: Vec<&str> = sectors.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, ["ZDC50", "ZDC52", "ZDC72"]);

    let zdc50 = sectors.iter().find(|s| s.id == "ZDC50").unwrap();
    assert_eq!(zdc50.stratum, Stratum::Low);

    assert!(idx.sectors_for_artcc("").is_empty());
}

#[test]
fn hit_test_orders_by_requested_strata() {
    let idx = index(
        vec![square("ZDC50", 0.0, 0.0, 10.0)],
        vec![square("ZDC70", 0.0, 0.0, 10.0)],
        vec![],
    );
    let point = LngLat::new(5.0, 5.0);

    let hits = idx.hit_test(point, &[Stratum::Low, Stratum::High, Stratum::SuperHigh]);
    let labels: Vec<String> = hits.iter().filter_map(|h| h.ident()).collect();
    assert_eq!(labels, ["ZDC50", "ZDC70"]);

    let high_only = idx.hit_test(point, &[Stratum::High]);
    assert_eq!(high_only.len(), 1);
    assert_eq!(high_only[0].stratum, Stratum::High);

    assert!(idx.hit_test(LngLat::new(50.0, 50.0), &[Stratum::Low]).is_empty());
}

#[test]
fn features_at_checks_boundary_collections() {
    let sets = BoundarySets {
        artcc: collection(vec![square("ZDC", 0.0, 0.0, 20.0)]),
        tracon: collection(vec![square("PCT", 5.0, 5.0, 2.0)]),
        ..Default::default()
    };
    let idx = BoundaryIndex::new(sets);

    assert_eq!(idx.features_at(BoundaryKind::Artcc, LngLat::new(6.0, 6.0)).len(), 1);
    assert_eq!(idx.features_at(BoundaryKind::Tracon, LngLat::new(6.0, 6.0)).len(), 1);
    assert!(idx.features_at(BoundaryKind::Tracon, LngLat::new(15.0, 15.0)).is_empty());
}

#[test]
fn bbox_center_is_the_outer_ring_bbox_midpoint() {
    let geometry = Geometry::Polygon {
        coordinates: vec![ring(2.0, 2.0, 4.0, 6.0)],
    };
    assert_eq!(bbox_center(&geometry), Some(LngLat::new(3.0, 4.0)));

    let empty = Geometry::Polygon {
        coordinates: vec![vec![]],
    };
    assert_eq!(bbox_center(&empty), None);
    assert_eq!(bbox_center(&Geometry::Unsupported), None);
}

#[test]
fn multipolygon_uses_first_polygon_for_centroid_but_all_for_containment() {
    let geometry = Geometry::MultiPolygon {
        coordinates: vec![
            vec![ring(0.0, 0.0, 2.0, 2.0)],
            vec![ring(10.0, 10.0, 12.0, 12.0)],
        ],
    };

    assert_eq!(bbox_center(&geometry), Some(LngLat::new(1.0, 1.0)));
    assert!(geometry_contains(&geometry, LngLat::new(1.0, 1.0)));
    assert!(geometry_contains(&geometry, LngLat::new(11.0, 11.0)));
    assert!(!geometry_contains(&geometry, LngLat::new(5.0, 5.0)));

    let bounds = geometry_bounds(&geometry).unwrap();
    assert_eq!(bounds.sw(), LngLat::new(0.0, 0.0));
    assert_eq!(bounds.ne(), LngLat::new(12.0, 12.0));
}

#[test]
fn containment_handles_concave_rings() {
    // L-shaped polygon: the notch at the top right is outside
    let geometry = Geometry::Polygon {
        coordinates: vec![vec![
            LngLat::new(0.0, 0.0),
            LngLat::new(4.0, 0.0),
            LngLat::new(4.0, 2.0),
            LngLat::new(2.0, 2.0),
            LngLat::new(2.0, 4.0),
            LngLat::new(0.0, 4.0),
            LngLat::new(0.0, 0.0),
        ]],
    };

    assert!(geometry_contains(&geometry, LngLat::new(1.0, 3.0)));
    assert!(geometry_contains(&geometry, LngLat::new(3.0, 1.0)));
    assert!(!geometry_contains(&geometry, LngLat::new(3.0, 3.0)));
}
