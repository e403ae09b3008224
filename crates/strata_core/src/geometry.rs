//! Geometry collaborator interface
//!
//! Layers never build geometries themselves. Masks are supplied by the
//! geometry subsystem through the [`Geometry`] trait, which exposes just what
//! a layer needs: type discrimination, layer binding, symbol restyling, the
//! JSON form and the painted extent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::layer::Layer;

// ─────────────────────────────────────────────────────────────────────────────
// Geometry Types
// ─────────────────────────────────────────────────────────────────────────────

/// GeoJSON-style geometry type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::LineString => "LineString",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extent
// ─────────────────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box in map coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    /// Create an extent, normalizing swapped corners
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            xmin: x0.min(x1),
            ymin: y0.min(y1),
            xmax: x0.max(x1),
            ymax: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Edges touching counts as intersecting
    pub fn intersects(&self, other: &Extent) -> bool {
        self.xmin <= other.xmax
            && self.xmax >= other.xmin
            && self.ymin <= other.ymax
            && self.ymax >= other.ymin
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    /// Smallest extent covering both
    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Symbols
// ─────────────────────────────────────────────────────────────────────────────

/// RGBA color (alpha in 0.0..=1.0)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0.0,
    };

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Styling properties of a geometry
///
/// Every property is optional; `None` means "inherit the geometry's default".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon_fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_line_color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_fill_opacity: Option<f64>,
}

impl Symbol {
    /// Patch for a vector marker that draws nothing
    pub fn invisible_marker() -> Self {
        Self {
            marker_line_color: Some(Color::TRANSPARENT),
            marker_fill_opacity: Some(0.0),
            ..Default::default()
        }
    }

    /// Complete symbol for a polygon that draws nothing
    pub fn invisible_polygon() -> Self {
        Self {
            line_color: Some(Color::TRANSPARENT),
            polygon_opacity: Some(0.0),
            ..Default::default()
        }
    }

    /// Overwrite every property that is set in `patch`
    pub fn merge(&mut self, patch: &Symbol) {
        fn take<T: Copy>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }
        take(&mut self.line_color, patch.line_color);
        take(&mut self.line_width, patch.line_width);
        take(&mut self.line_opacity, patch.line_opacity);
        take(&mut self.polygon_fill, patch.polygon_fill);
        take(&mut self.polygon_opacity, patch.polygon_opacity);
        take(&mut self.marker_line_color, patch.marker_line_color);
        take(&mut self.marker_fill, patch.marker_fill);
        take(&mut self.marker_fill_opacity, patch.marker_fill_opacity);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A geometry supplied by the geometry subsystem
///
/// Implementations use interior mutability: a mask is shared between the
/// layer that owns it and whatever painter draws it.
pub trait Geometry {
    fn geometry_type(&self) -> GeometryType;

    /// Whether this is a point drawn with a vector marker symbol
    fn is_vector_marker(&self) -> bool {
        false
    }

    /// Record the layer that owns this geometry
    ///
    /// Implementations should keep a [`crate::layer::WeakLayer`], not the
    /// handle itself, or the layer and its mask keep each other alive.
    fn bind_layer(&self, layer: &Layer);

    /// Merge `patch` into the current symbol
    fn update_symbol(&self, patch: &Symbol);

    /// Replace the current symbol
    fn set_symbol(&self, symbol: Symbol);

    /// Serialized (GeoJSON-like) form
    fn to_json(&self) -> serde_json::Value;

    /// Extent covered by the geometry's painter, if it has been painted
    fn painted_extent(&self) -> Option<Extent> {
        None
    }
}

/// Whether `geometry` may clip a layer
pub fn is_valid_mask(geometry: &dyn Geometry) -> bool {
    match geometry.geometry_type() {
        GeometryType::Point => geometry.is_vector_marker(),
        GeometryType::Polygon | GeometryType::MultiPolygon => true,
        _ => false,
    }
}
