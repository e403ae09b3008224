//! Visibility policy and clipping mask

use std::rc::Rc;

use super::Layer;
use crate::error::{LayerError, Result};
use crate::events::{EventData, LayerEventKind};
use crate::geometry::{self, Extent, Geometry, GeometryType, Symbol};

impl Layer {
    /// Whether the layer should currently be drawn
    ///
    /// False when fully transparent, or when attached and the map's zoom is
    /// outside the layer's own zoom range. Otherwise the visible flag.
    pub fn is_visible(&self) -> bool {
        let (opacity, min_zoom, max_zoom) = {
            let state = self.state();
            (
                state.options.opacity,
                state.options.min_zoom,
                state.options.max_zoom,
            )
        };
        if opacity <= 0.0 {
            return false;
        }
        if let Some(map) = self.map() {
            let zoom = map.zoom();
            if max_zoom.is_some_and(|max| max < zoom) || min_zoom.is_some_and(|min| min > zoom) {
                return false;
            }
        }
        self.visible_flag()
    }

    /// The explicit visible flag, materialized to `true` when unset
    pub(super) fn visible_flag(&self) -> bool {
        *self.state_mut().options.visible.get_or_insert(true)
    }

    /// Effective lower zoom bound
    ///
    /// Attached layers never go below the map's own bound.
    pub fn min_zoom(&self) -> Option<f64> {
        let own = self.state().options.min_zoom;
        match self.map() {
            Some(map) => match (map.min_zoom(), own) {
                (Some(global), Some(own)) => Some(global.max(own)),
                (global, own) => global.or(own),
            },
            None => own,
        }
    }

    /// Effective upper zoom bound
    ///
    /// Attached layers never go above the map's own bound.
    pub fn max_zoom(&self) -> Option<f64> {
        let own = self.state().options.max_zoom;
        match self.map() {
            Some(map) => match (map.max_zoom(), own) {
                (Some(global), Some(own)) => Some(global.min(own)),
                (global, own) => global.or(own),
            },
            None => own,
        }
    }

    /// Make the layer visible
    ///
    /// With both a renderer and a map, `show` fires after the next completed
    /// render so observers see the layer painted.
    pub fn show(&self) -> &Self {
        if self.visible_flag() {
            return self;
        }
        self.state_mut().options.visible = Some(true);
        let renderer = self.renderer();
        if let Some(renderer) = &renderer {
            renderer.show();
        }
        self.fire_after_render(LayerEventKind::Show, renderer.is_some());
        self
    }

    /// Hide the layer; `hide` is deferred like [`show`](Self::show)
    pub fn hide(&self) -> &Self {
        if !self.visible_flag() {
            return self;
        }
        self.state_mut().options.visible = Some(false);
        let renderer = self.renderer();
        if let Some(renderer) = &renderer {
            renderer.hide();
        }
        self.fire_after_render(LayerEventKind::Hide, renderer.is_some());
        self
    }

    fn fire_after_render(&self, kind: LayerEventKind, has_renderer: bool) {
        match self.map() {
            Some(map) if has_renderer => {
                tracing::trace!(event = %kind, layer = ?self.id(), "deferring until render end");
                let layer = self.clone();
                map.once_render_end(Box::new(move || {
                    layer.fire(kind, EventData::None);
                }));
            }
            _ => {
                self.fire(kind, EventData::None);
            }
        }
    }

    // =========================================================================
    // MASK
    // =========================================================================

    pub fn mask(&self) -> Option<Rc<dyn Geometry>> {
        self.state().mask.clone()
    }

    /// Clip the layer with `mask`
    ///
    /// The mask must be a vector marker point, a polygon or a multi-polygon.
    /// It is bound to this layer and restyled so it draws nothing itself.
    pub fn set_mask(&self, mask: Rc<dyn Geometry>) -> Result<&Self> {
        let geometry_type = mask.geometry_type();
        if !geometry::is_valid_mask(mask.as_ref()) {
            tracing::warn!(layer = ?self.id(), %geometry_type, "rejecting mask geometry");
            return Err(LayerError::InvalidMask(geometry_type));
        }

        mask.bind_layer(self);
        if geometry_type == GeometryType::Point {
            mask.update_symbol(&Symbol::invisible_marker());
        } else {
            mask.set_symbol(Symbol::invisible_polygon());
        }

        let json = mask.to_json();
        {
            let mut state = self.state_mut();
            state.options.mask = Some(json);
            state.mask = Some(mask);
        }
        self.redraw_for_mask();
        Ok(self)
    }

    pub fn remove_mask(&self) -> &Self {
        {
            let mut state = self.state_mut();
            state.mask = None;
            state.options.mask = None;
        }
        self.redraw_for_mask();
        self
    }

    /// Extent the mask's painter covers
    pub fn mask_extent(&self) -> Option<Extent> {
        self.mask().and_then(|mask| mask.painted_extent())
    }

    fn redraw_for_mask(&self) {
        let Some(map) = self.map() else {
            return;
        };
        if map.is_zooming() {
            return;
        }
        if let Some(renderer) = self.renderer() {
            renderer.set_to_redraw();
        }
    }
}
