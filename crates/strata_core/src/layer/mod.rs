//! Layer base
//!
//! A [`Layer`] is a cheap-to-clone handle to shared layer state. The map
//! holds layer handles; a layer holds its map weakly. Concrete layer types
//! (tile, vector, image, ...) specialize the base through a [`LayerKind`],
//! whose hooks the base calls at fixed points of the lifecycle.
//!
//! # Lifecycle
//!
//! ```text
//! detached ──bind_map──▶ attached ──load──▶ rendering ──do_remove──▶ detached
//!             on_add                on_load             on_remove
//!             `add`                 renderer created
//!                                   on_renderer_create
//!                                   `renderercreate`
//!                                   on_load_end
//! ```
//!
//! # Example
//!
//! ```ignore
//! use strata_core::{Layer, LayerOptions, BaseKind};
//!
//! let layer = Layer::builder(BaseKind)
//!     .id("roads")
//!     .z_index(2)
//!     .options(LayerOptions::new().with_opacity(0.8))
//!     .build()?;
//!
//! layer.on(LayerEventKind::Show, |event| println!("{} shown", event.event_type()));
//! layer.add_to(&*map);
//! layer.bring_to_front();
//! ```

mod collision;
mod identity;
mod lifecycle;
mod profile;
mod visibility;

pub use profile::LayerProfile;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::collision::CollisionIndex;
use crate::error::Result;
use crate::events::{self, EventData, EventDispatcher, LayerEvent, LayerEventKind, ListenerId};
use crate::geometry::Geometry;
use crate::map::{MapHost, MapListener, SubscriptionId};
use crate::options::LayerOptions;
use crate::renderer::{LayerRenderer, RendererRegistry};

// ─────────────────────────────────────────────────────────────────────────────
// Layer Kind
// ─────────────────────────────────────────────────────────────────────────────

/// Specialization point for concrete layer types
///
/// Every hook has a default, so a kind overrides only what it needs. Hooks
/// receive the layer handle and may call any layer method, except re-entering
/// the lifecycle step that is invoking them.
pub trait LayerKind {
    /// Type name written to profiles
    fn name(&self) -> &str {
        "Layer"
    }

    /// Renderers this kind can be drawn with; `None` means the kind never
    /// creates a renderer
    fn renderer_registry(&self) -> Option<&RendererRegistry> {
        None
    }

    /// Map event subscriptions the layer needs while attached
    fn map_events(&self, _layer: &Layer) -> Vec<MapListener> {
        Vec::new()
    }

    /// Return false to abort loading (no renderer is created)
    fn on_load(&self, _layer: &Layer) -> bool {
        true
    }

    fn on_load_end(&self, _layer: &Layer) {}

    fn on_add(&self, _layer: &Layer) {}

    fn on_remove(&self, _layer: &Layer) {}

    fn on_renderer_create(&self, _layer: &Layer) {}

    fn on_canvas_create(&self, _layer: &Layer) {}

    /// Called after the options changed through [`Layer::config`]
    fn on_config(&self, _layer: &Layer, _options: &LayerOptions) {}
}

/// Layer kind with no specialization and no renderer
#[derive(Clone, Copy, Debug, Default)]
pub struct BaseKind;

impl LayerKind for BaseKind {}

// ─────────────────────────────────────────────────────────────────────────────
// Layer State
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct LayerState {
    id: Option<String>,
    options: LayerOptions,
    mask: Option<Rc<dyn Geometry>>,
    collision_index: Option<Rc<CollisionIndex>>,
    renderer: Option<Rc<dyn LayerRenderer>>,
    map: Option<Weak<dyn MapHost>>,
    loaded: bool,
    /// Map subscriptions wired for the layer kind
    map_subscriptions: SmallVec<[SubscriptionId; 4]>,
    /// Map subscriptions wired for the renderer
    renderer_subscriptions: SmallVec<[SubscriptionId; 4]>,
}

struct LayerInner {
    kind: Rc<dyn LayerKind>,
    state: RefCell<LayerState>,
    events: EventDispatcher,
}

/// Handle to a layer
///
/// Clones share the same layer; equality is identity.
#[derive(Clone)]
pub struct Layer {
    inner: Rc<LayerInner>,
}

/// Non-owning handle to a layer
#[derive(Clone)]
pub struct WeakLayer {
    inner: Weak<LayerInner>,
}

impl WeakLayer {
    pub fn upgrade(&self) -> Option<Layer> {
        self.inner.upgrade().map(|inner| Layer { inner })
    }
}

impl fmt::Debug for WeakLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakLayer(..)")
    }
}

impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Layer {}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // try_borrow: Debug may run while the state is mutably borrowed
        match self.inner.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Layer")
                .field("kind", &self.inner.kind.name())
                .field("id", &state.id)
                .field("z_index", &state.options.z_index)
                .field("attached", &state.map.is_some())
                .field("renderer", &state.renderer.is_some())
                .field("loaded", &state.loaded)
                .finish(),
            Err(_) => f
                .debug_struct("Layer")
                .field("kind", &self.inner.kind.name())
                .finish_non_exhaustive(),
        }
    }
}

impl Layer {
    /// Create a detached layer
    pub fn new(options: LayerOptions, kind: impl LayerKind + 'static) -> Self {
        Self::with_kind(None, options, Rc::new(kind))
    }

    pub fn builder(kind: impl LayerKind + 'static) -> LayerBuilder {
        LayerBuilder::new(Rc::new(kind))
    }

    fn with_kind(id: Option<String>, options: LayerOptions, kind: Rc<dyn LayerKind>) -> Self {
        Self {
            inner: Rc::new(LayerInner {
                kind,
                state: RefCell::new(LayerState {
                    id,
                    options,
                    ..Default::default()
                }),
                events: EventDispatcher::new(),
            }),
        }
    }

    fn state(&self) -> Ref<'_, LayerState> {
        self.inner.state.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, LayerState> {
        self.inner.state.borrow_mut()
    }

    fn kind(&self) -> Rc<dyn LayerKind> {
        Rc::clone(&self.inner.kind)
    }

    /// Type name of the layer kind
    pub fn kind_name(&self) -> String {
        self.inner.kind.name().to_string()
    }

    pub fn downgrade(&self) -> WeakLayer {
        WeakLayer {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// The map this layer is attached to
    pub fn map(&self) -> Option<Rc<dyn MapHost>> {
        self.state().map.as_ref().and_then(Weak::upgrade)
    }

    pub fn renderer(&self) -> Option<Rc<dyn LayerRenderer>> {
        self.state().renderer.clone()
    }

    // =========================================================================
    // OPTIONS
    // =========================================================================

    /// Snapshot of the current options
    pub fn options(&self) -> LayerOptions {
        self.state().options.clone()
    }

    /// Mutate the options, then ask the renderer to redraw and run the kind's
    /// `on_config` hook
    ///
    /// `f` edits a copy, so it may read the layer.
    pub fn config(&self, f: impl FnOnce(&mut LayerOptions)) -> &Self {
        let mut options = self.options();
        f(&mut options);
        self.state_mut().options = options.clone();
        if let Some(renderer) = self.renderer() {
            renderer.set_to_redraw();
        }
        self.kind().on_config(self, &options);
        self
    }

    pub fn opacity(&self) -> f64 {
        self.state().options.opacity
    }

    pub fn set_opacity(&self, opacity: f64) -> &Self {
        self.config(|options| options.opacity = opacity)
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    pub fn on<F>(&self, kind: LayerEventKind, handler: F) -> ListenerId
    where
        F: Fn(&LayerEvent) + 'static,
    {
        self.inner.events.on(kind, handler)
    }

    pub fn once<F>(&self, kind: LayerEventKind, handler: F) -> ListenerId
    where
        F: Fn(&LayerEvent) + 'static,
    {
        self.inner.events.once(kind, handler)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.events.off(id)
    }

    pub fn listens(&self, kind: &LayerEventKind) -> bool {
        self.inner.events.listens(kind)
    }

    /// Fire an event: mirror it to the map, dispatch it locally, then derive
    /// `visiblechange` from `show`/`hide`
    pub fn fire(&self, kind: LayerEventKind, data: EventData) -> &Self {
        self.emit(LayerEvent::new(kind, data));
        self
    }

    fn emit(&self, mut event: LayerEvent) {
        if event.kind == LayerEventKind::LayerLoad {
            self.state_mut().loaded = true;
        }

        events::stamp(&mut event, self);
        if let Some(map) = self.map() {
            tracing::trace!(event = %event.kind, layer = ?self.id(), "mirroring layer event to map");
            map.on_layer_event(&event);
        }

        self.inner.events.dispatch(&event);

        if let Some(derived) = events::derive_visible_change(&event, self.visible_flag()) {
            self.emit(derived);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builds a detached layer, optionally pre-seeded with id, z-index and mask
pub struct LayerBuilder {
    kind: Rc<dyn LayerKind>,
    id: Option<String>,
    options: LayerOptions,
    z_index: Option<i32>,
    mask: Option<Rc<dyn Geometry>>,
}

impl fmt::Debug for LayerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerBuilder")
            .field("kind", &self.kind.name())
            .field("id", &self.id)
            .field("options", &self.options)
            .field("z_index", &self.z_index)
            .field("mask", &self.mask.is_some())
            .finish()
    }
}

impl LayerBuilder {
    fn new(kind: Rc<dyn LayerKind>) -> Self {
        Self {
            kind,
            id: None,
            options: LayerOptions::default(),
            z_index: None,
            mask: None,
        }
    }

    pub fn id(mut self, id: impl ToString) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn options(mut self, options: LayerOptions) -> Self {
        self.options = options;
        self
    }

    /// Overrides any z-index carried by the options
    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn mask(mut self, mask: Rc<dyn Geometry>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Fails with [`crate::LayerError::InvalidMask`] if the mask is rejected
    pub fn build(self) -> Result<Layer> {
        let mut options = self.options;
        if self.z_index.is_some() {
            options.z_index = self.z_index;
        }
        let layer = Layer::with_kind(self.id, options, self.kind);
        if let Some(mask) = self.mask {
            layer.set_mask(mask)?;
        }
        Ok(layer)
    }
}
