//! Attach, load and removal

use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use super::Layer;
use crate::error::{LayerError, Result};
use crate::events::{EventData, LayerEventKind};
use crate::map::{MapHost, MapListener, Projection, SubscriptionId};
use crate::renderer::RepaintMode;

impl Layer {
    /// Add this layer to `map`
    pub fn add_to(&self, map: &dyn MapHost) -> &Self {
        map.add_layer(self.clone());
        self
    }

    /// Remove this layer from its map, if attached
    pub fn remove(&self) -> &Self {
        if let Some(map) = self.map() {
            map.remove_layer(self);
        }
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.state().loaded
    }

    /// Whether the renderer is painted by the map's frame loop
    pub fn is_canvas_render(&self) -> bool {
        self.renderer()
            .is_some_and(|renderer| renderer.repaint_mode() == RepaintMode::FrameLoop)
    }

    pub fn projection(&self) -> Option<Projection> {
        self.map().and_then(|map| map.projection())
    }

    /// Attach to a map; called by [`MapHost::add_layer`]
    pub fn bind_map(&self, map: Weak<dyn MapHost>, z_index: Option<i32>) {
        tracing::debug!(layer = ?self.id(), "binding layer to map");
        self.state_mut().map = Some(map);
        if z_index.is_some() {
            self.set_z_index(z_index);
        }

        let listeners = self.kind().map_events(self);
        let ids = self.subscribe_all(listeners);
        self.state_mut().map_subscriptions = ids;

        self.kind().on_add(self);
        self.fire(LayerEventKind::Add, EventData::None);
    }

    /// Run `on_load` and, if it agrees, create the renderer
    ///
    /// A detached layer does nothing. An unknown renderer kind aborts with no
    /// renderer attached and no further hooks run.
    pub fn load(&self) -> Result<&Self> {
        if self.map().is_none() {
            return Ok(self);
        }
        let kind = self.kind();
        if !kind.on_load(self) {
            tracing::debug!(layer = ?self.id(), "on_load declined, skipping renderer");
            return Ok(self);
        }

        self.init_renderer()?;

        let z_index = self.state().options.z_index;
        if let (Some(z_index), Some(renderer)) = (z_index, self.renderer()) {
            renderer.set_z_index(z_index);
            if renderer.repaint_mode() == RepaintMode::OnDemand {
                renderer.render();
            }
        }

        kind.on_load_end(self);
        Ok(self)
    }

    fn init_renderer(&self) -> Result<()> {
        let kind = self.kind();
        let Some(registry) = kind.renderer_registry() else {
            return Ok(());
        };

        // a reload replaces the renderer; the old one must not stay wired
        let map = self.map();
        self.teardown_renderer(map.as_deref());

        let renderer_kind = self.state().options.renderer.clone();
        let Some(factory) = renderer_kind
            .as_deref()
            .and_then(|name| registry.get(name))
            .cloned()
        else {
            tracing::warn!(layer = ?self.id(), renderer = ?renderer_kind, "no renderer registered");
            return Err(LayerError::UnknownRenderer {
                kind: renderer_kind,
                layer_id: self.id(),
            });
        };

        let renderer = factory(self);
        tracing::debug!(layer = ?self.id(), renderer = ?renderer_kind, "renderer created");
        self.state_mut().renderer = Some(Rc::clone(&renderer));
        renderer.set_z_index(self.z_index());

        let ids = self.subscribe_all(renderer.events());
        self.state_mut().renderer_subscriptions = ids;

        renderer.on_add();
        kind.on_renderer_create(self);
        self.fire(LayerEventKind::RendererCreate, EventData::Renderer(renderer));
        Ok(())
    }

    /// Detach from the map; called by [`MapHost::remove_layer`]
    ///
    /// `remove` fires once the renderer is gone, while the map still sees
    /// the layer's events.
    pub fn do_remove(&self) {
        tracing::debug!(layer = ?self.id(), "removing layer");
        let map = self.map();
        let layer_subscriptions = {
            let mut state = self.state_mut();
            state.loaded = false;
            std::mem::take(&mut state.map_subscriptions)
        };
        Self::unsubscribe_all(map.as_deref(), layer_subscriptions);

        self.kind().on_remove(self);
        self.teardown_renderer(map.as_deref());
        self.fire(LayerEventKind::Remove, EventData::None);

        let mut state = self.state_mut();
        state.map = None;
        state.collision_index = None;
    }

    /// Unwire, remove and drop the current renderer, if any
    fn teardown_renderer(&self, map: Option<&dyn MapHost>) {
        let renderer = self.state_mut().renderer.take();
        if let Some(renderer) = renderer {
            let ids = std::mem::take(&mut self.state_mut().renderer_subscriptions);
            Self::unsubscribe_all(map, ids);
            renderer.remove();
        }
    }

    /// Entry point for renderers once their drawing surface exists
    pub fn notify_canvas_create(&self) -> &Self {
        self.kind().on_canvas_create(self);
        self.fire(LayerEventKind::CanvasCreate, EventData::None)
    }

    fn subscribe_all(&self, listeners: Vec<MapListener>) -> SmallVec<[SubscriptionId; 4]> {
        match self.map() {
            Some(map) => listeners
                .into_iter()
                .map(|listener| map.subscribe(listener))
                .collect(),
            None => SmallVec::new(),
        }
    }

    fn unsubscribe_all(map: Option<&dyn MapHost>, ids: SmallVec<[SubscriptionId; 4]>) {
        if let Some(map) = map {
            for id in ids {
                map.unsubscribe(id);
            }
        }
    }
}
