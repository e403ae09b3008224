//! Layer id and z-ordering

use super::Layer;
use crate::events::{EventData, LayerEventKind};

impl Layer {
    pub fn id(&self) -> Option<String> {
        self.state().id.clone()
    }

    /// Replace the id and fire `idchange`, even when the value is unchanged
    pub fn set_id<S: ToString>(&self, id: Option<S>) -> &Self {
        let new = id.map(|id| id.to_string());
        let old = std::mem::replace(&mut self.state_mut().id, new.clone());
        self.fire(LayerEventKind::IdChange, EventData::IdChange { old, new })
    }

    /// Stored z-index, 0 when unset
    pub fn z_index(&self) -> i32 {
        self.state().options.z_index.unwrap_or(0)
    }

    /// Set (`Some`) or clear (`None`) the z-index
    ///
    /// Re-sorts the map's layers when attached and pushes the value to the
    /// renderer when one exists. Always fires `setzindex`.
    pub fn set_z_index(&self, z_index: Option<i32>) -> &Self {
        self.state_mut().options.z_index = z_index;
        if let Some(map) = self.map() {
            map.sort_layers_by_z_index();
        }
        if let Some(renderer) = self.renderer() {
            renderer.set_z_index(self.z_index());
        }
        self.fire(LayerEventKind::SetZIndex, EventData::ZIndex(z_index))
    }

    /// Move above every sibling layer
    ///
    /// No-op when the top layer already sits at `i32::MAX`.
    pub fn bring_to_front(&self) -> &Self {
        let layers = self.sibling_layers();
        let Some(top) = layers.last() else {
            return self;
        };
        if layers.len() == 1 || top == self {
            return self;
        }
        match top.z_index().checked_add(1) {
            Some(z_index) => self.set_z_index(Some(z_index)),
            None => {
                tracing::debug!(layer = ?self.id(), "top layer at the z-index limit");
                self
            }
        }
    }

    /// Move below every sibling layer
    ///
    /// No-op when the bottom layer already sits at `i32::MIN`.
    pub fn bring_to_back(&self) -> &Self {
        let layers = self.sibling_layers();
        let Some(bottom) = layers.first() else {
            return self;
        };
        if layers.len() == 1 || bottom == self {
            return self;
        }
        match bottom.z_index().checked_sub(1) {
            Some(z_index) => self.set_z_index(Some(z_index)),
            None => {
                tracing::debug!(layer = ?self.id(), "bottom layer at the z-index limit");
                self
            }
        }
    }

    /// The map's layers in z-order, empty when detached
    fn sibling_layers(&self) -> Vec<Layer> {
        self.map().map(|map| map.layers()).unwrap_or_default()
    }
}
