//! Layer configuration
//!
//! [`LayerOptions`] is the canonical store for everything a layer is
//! configured with. It serializes with camelCase keys so profiles written by
//! other map tooling load unchanged; unknown keys are ignored and missing keys
//! take their defaults.
//!
//! ```ignore
//! let options = LayerOptions::from_json(r#"{ "opacity": 0.5, "minZoom": 3 }"#)?;
//! assert_eq!(options.renderer.as_deref(), Some("canvas"));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Renderer kind used when none is configured
pub const DEFAULT_RENDERER: &str = "canvas";

/// Where a layer's labels and markers are checked for overlap
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionScope {
    /// The layer owns a dedicated index
    #[default]
    Layer,
    /// All map-scoped layers share the map's index
    Map,
}

/// Per-layer configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayerOptions {
    /// Explicit visibility; unset reads as visible and is materialized on
    /// first read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,

    pub opacity: f64,

    /// Stacking order; unset is distinct from an explicit 0
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<f64>,

    /// Renderer kind, resolved through the layer kind's registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renderer: Option<String>,

    pub collision_scope: CollisionScope,

    /// Serialized mask geometry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<serde_json::Value>,

    pub force_render_on_moving: bool,
    pub force_render_on_zooming: bool,
    pub force_render_on_rotating: bool,
}

impl Default for LayerOptions {
    fn default() -> Self {
        Self {
            visible: None,
            opacity: 1.0,
            z_index: None,
            min_zoom: None,
            max_zoom: None,
            renderer: Some(DEFAULT_RENDERER.to_string()),
            collision_scope: CollisionScope::Layer,
            mask: None,
            force_render_on_moving: false,
            force_render_on_zooming: false,
            force_render_on_rotating: false,
        }
    }
}

impl LayerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: Option<f64>, max_zoom: Option<f64>) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_renderer(mut self, renderer: impl Into<String>) -> Self {
        self.renderer = Some(renderer.into());
        self
    }

    pub fn with_collision_scope(mut self, scope: CollisionScope) -> Self {
        self.collision_scope = scope;
        self
    }

    /// Whether any render-forcing flag is set
    pub fn forces_render(&self) -> bool {
        self.force_render_on_moving || self.force_render_on_zooming || self.force_render_on_rotating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LayerOptions::default();
        assert_eq!(options.visible, None);
        assert_eq!(options.opacity, 1.0);
        assert_eq!(options.z_index, None);
        assert_eq!(options.renderer.as_deref(), Some(DEFAULT_RENDERER));
        assert_eq!(options.collision_scope, CollisionScope::Layer);
        assert!(!options.forces_render());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let options = LayerOptions::from_json(
            r#"{ "opacity": 0.5, "minZoom": 3, "collisionScope": "map", "someOtherKey": true }"#,
        )
        .unwrap();

        assert_eq!(options.opacity, 0.5);
        assert_eq!(options.min_zoom, Some(3.0));
        assert_eq!(options.max_zoom, None);
        assert_eq!(options.collision_scope, CollisionScope::Map);
        assert_eq!(options.renderer.as_deref(), Some("canvas"));
    }

    #[test]
    fn test_unset_keys_are_absent() {
        let value = LayerOptions::default().to_value().unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("zIndex"));
        assert!(!object.contains_key("visible"));
        assert!(!object.contains_key("mask"));

        let value = LayerOptions::default().with_z_index(0).to_value().unwrap();
        assert_eq!(value["zIndex"], 0);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(LayerOptions::from_json(r#"{ "opacity": "opaque" }"#).is_err());
    }

    #[test]
    fn test_builders() {
        let mut options = LayerOptions::new()
            .with_visible(false)
            .with_opacity(0.25)
            .with_zoom_range(Some(2.0), Some(18.0))
            .with_renderer("dom")
            .with_collision_scope(CollisionScope::Map);
        options.force_render_on_zooming = true;

        assert_eq!(options.visible, Some(false));
        assert_eq!(options.min_zoom, Some(2.0));
        assert_eq!(options.renderer.as_deref(), Some("dom"));
        assert!(options.forces_render());
    }
}
