use crate::error::SurfaceError;
use serde_json::Value;
use shared::splits::boundaries::{LngLat, LngLatBounds, Ring};
use std::f64::consts::PI;

const TILE_SIZE: f64 = 256.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: ScreenPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: ScreenPoint,
    pub max: ScreenPoint,
}

impl ScreenRect {
    pub const fn new(min: ScreenPoint, max: ScreenPoint) -> Self {
        Self { min, max }
    }

    pub fn centered(center: ScreenPoint, width: f64, height: f64) -> Self {
        Self {
            min: ScreenPoint::new(center.x - width / 2.0, center.y - height / 2.0),
            max: ScreenPoint::new(center.x + width / 2.0, center.y + height / 2.0),
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &ScreenRect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn expanded(&self, margin: f64) -> ScreenRect {
        Self {
            min: ScreenPoint::new(self.min.x - margin, self.min.y - margin),
            max: ScreenPoint::new(self.max.x + margin, self.max.y + margin),
        }
    }
}

pub trait Projection {
    fn project(&self, point: LngLat) -> ScreenPoint;
    fn unproject(&self, point: ScreenPoint) -> LngLat;
    fn viewport(&self) -> ScreenRect;

    fn project_ring(&self, ring: &Ring) -> Vec<ScreenPoint> {
        ring.iter().map(|p| self.project(*p)).collect()
    }

    /// Geographic bounds covered by the viewport.
    fn viewport_bounds(&self) -> LngLatBounds {
        let view = self.viewport();
        let a = self.unproject(view.min);
        let b = self.unproject(view.max);
        let mut bounds = LngLatBounds(a, a);
        bounds.extend(b);
        bounds
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    pub center: LngLat,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl WebMercator {
    pub fn new(center: LngLat, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom,
            width,
            height,
        }
    }

    fn world_scale(&self) -> f64 {
        TILE_SIZE * 2_f64.powf(self.zoom)
    }

    fn lng_to_world_x(&self, lng: f64) -> f64 {
        (lng + 180.0) / 360.0 * self.world_scale()
    }

    fn lat_to_world_y(&self, lat: f64) -> f64 {
        let lat_rad = lat.to_radians();
        (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * self.world_scale()
    }
}

impl Projection for WebMercator {
    fn project(&self, point: LngLat) -> ScreenPoint {
        let cx = self.lng_to_world_x(self.center.lng);
        let cy = self.lat_to_world_y(self.center.lat);
        ScreenPoint::new(
            self.lng_to_world_x(point.lng) - cx + self.width / 2.0,
            self.lat_to_world_y(point.lat) - cy + self.height / 2.0,
        )
    }

    fn unproject(&self, point: ScreenPoint) -> LngLat {
        let scale = self.world_scale();
        let world_x = point.x - self.width / 2.0 + self.lng_to_world_x(self.center.lng);
        let world_y = point.y - self.height / 2.0 + self.lat_to_world_y(self.center.lat);
        let lng = world_x / scale * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * world_y / scale)).sinh().atan().to_degrees();
        LngLat::new(lng, lat)
    }

    fn viewport(&self) -> ScreenRect {
        ScreenRect::new(
            ScreenPoint::new(0.0, 0.0),
            ScreenPoint::new(self.width, self.height),
        )
    }
}

/// Rendering seam. The editor drives map state exclusively through
/// these operations, so the whole pipeline runs without a map engine.
pub trait MapSurface {
    fn set_source_data(&mut self, source: &str, data: Value) -> Result<(), SurfaceError>;
    fn set_layer_visibility(&mut self, layer: &str, visible: bool) -> Result<(), SurfaceError>;
    fn set_paint_property(
        &mut self,
        layer: &str,
        property: &str,
        value: Value,
    ) -> Result<(), SurfaceError>;
    fn set_filter(&mut self, layer: &str, filter: Option<Value>) -> Result<(), SurfaceError>;
    fn fit_bounds(
        &mut self,
        bounds: LngLatBounds,
        padding: f64,
        max_zoom: f64,
    ) -> Result<(), SurfaceError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    SetSourceData {
        source: String,
        data: Value,
    },
    SetLayerVisibility {
        layer: String,
        visible: bool,
    },
    SetPaintProperty {
        layer: String,
        property: String,
        value: Value,
    },
    SetFilter {
        layer: String,
        filter: Option<Value>,
    },
    FitBounds {
        bounds: LngLatBounds,
        padding: f64,
        max_zoom: f64,
    },
}

/// Records every operation it receives. Stands in for a live map in
/// tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<SurfaceOp>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn last_filter_for(&self, layer: &str) -> Option<&Option<Value>> {
        self.ops.iter().rev().find_map(|op| match op {
            SurfaceOp::SetFilter { layer: l, filter } if l == layer => Some(filter),
            _ => None,
        })
    }

    pub fn last_paint_for(&self, layer: &str, property: &str) -> Option<&Value> {
        self.ops.iter().rev().find_map(|op| match op {
            SurfaceOp::SetPaintProperty {
                layer: l,
                property: p,
                value,
            } if l == layer && p == property => Some(value),
            _ => None,
        })
    }

    pub fn last_visibility_for(&self, layer: &str) -> Option<bool> {
        self.ops.iter().rev().find_map(|op| match op {
            SurfaceOp::SetLayerVisibility { layer: l, visible } if l == layer => Some(*visible),
            _ => None,
        })
    }

    pub fn last_source_data(&self, source: &str) -> Option<&Value> {
        self.ops.iter().rev().find_map(|op| match op {
            SurfaceOp::SetSourceData { source: s, data } if s == source => Some(data),
            _ => None,
        })
    }
}

impl MapSurface for RecordingSurface {
    fn set_source_data(&mut self, source: &str, data: Value) -> Result<(), SurfaceError> {
        self.ops.push(SurfaceOp::SetSourceData {
            source: source.to_string(),
            data,
        });
        Ok(())
    }

    fn set_layer_visibility(&mut self, layer: &str, visible: bool) -> Result<(), SurfaceError> {
        self.ops.push(SurfaceOp::SetLayerVisibility {
            layer: layer.to_string(),
            visible,
        });
        Ok(())
    }

    fn set_paint_property(
        &mut self,
        layer: &str,
        property: &str,
        value: Value,
    ) -> Result<(), SurfaceError> {
        self.ops.push(SurfaceOp::SetPaintProperty {
            layer: layer.to_string(),
            property: property.to_string(),
            value,
        });
        Ok(())
    }

    fn set_filter(&mut self, layer: &str, filter: Option<Value>) -> Result<(), SurfaceError> {
        self.ops.push(SurfaceOp::SetFilter {
            layer: layer.to_string(),
            filter,
        });
        Ok(())
    }

    fn fit_bounds(
        &mut self,
        bounds: LngLatBounds,
        padding: f64,
        max_zoom: f64,
    ) -> Result<(), SurfaceError> {
        self.ops.push(SurfaceOp::FitBounds {
            bounds,
            padding,
            max_zoom,
        });
        Ok(())
    }
}
