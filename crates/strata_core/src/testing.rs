//! Test doubles for the map, renderer, geometry and layer kind collaborators

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use slotmap::SlotMap;

use crate::collision::CollisionIndex;
use crate::events::{LayerEvent, LayerEventKind};
use crate::geometry::{Extent, Geometry, GeometryType, Symbol};
use crate::layer::{Layer, LayerKind, WeakLayer};
use crate::map::{MapEvent, MapHost, MapListener, Projection, SubscriptionId};
use crate::options::{LayerOptions, DEFAULT_RENDERER};
use crate::renderer::{LayerRenderer, RendererRegistry, RepaintMode};

/// Shared call log
pub type Log = Rc<RefCell<Vec<String>>>;

/// Events captured by [`record_events`]
pub type EventLog = Rc<RefCell<Vec<LayerEvent>>>;

pub fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

/// Route `tracing` output through the test harness, `RUST_LOG` filtered
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Record every event of the given kinds fired on `layer`
pub fn record_events(layer: &Layer, kinds: &[LayerEventKind]) -> EventLog {
    let events: EventLog = Rc::new(RefCell::new(Vec::new()));
    for kind in kinds {
        let sink = Rc::clone(&events);
        layer.on(kind.clone(), move |event| sink.borrow_mut().push(event.clone()));
    }
    events
}

// ─────────────────────────────────────────────────────────────────────────────
// Map
// ─────────────────────────────────────────────────────────────────────────────

/// In-memory map host
pub struct MockMap {
    me: Weak<MockMap>,
    /// (insertion sequence, layer), kept sorted by (z-index, sequence)
    layers: RefCell<Vec<(u64, Layer)>>,
    next_seq: Cell<u64>,
    sorts: Cell<usize>,
    zoom: Cell<f64>,
    zoom_range: Cell<(Option<f64>, Option<f64>)>,
    zooming: Cell<bool>,
    collision: Rc<CollisionIndex>,
    render_callbacks: RefCell<Vec<Box<dyn FnOnce()>>>,
    layer_events: RefCell<Vec<LayerEvent>>,
    load_errors: RefCell<Vec<String>>,
    listeners: RefCell<SlotMap<SubscriptionId, MapListener>>,
}

impl MockMap {
    pub fn new() -> Rc<Self> {
        init_tracing();
        Rc::new_cyclic(|me| Self {
            me: me.clone(),
            layers: RefCell::new(Vec::new()),
            next_seq: Cell::new(0),
            sorts: Cell::new(0),
            zoom: Cell::new(10.0),
            zoom_range: Cell::new((None, None)),
            zooming: Cell::new(false),
            collision: Rc::new(CollisionIndex::new()),
            render_callbacks: RefCell::new(Vec::new()),
            layer_events: RefCell::new(Vec::new()),
            load_errors: RefCell::new(Vec::new()),
            listeners: RefCell::new(SlotMap::with_key()),
        })
    }

    /// Add `layer` with an explicit z-index
    pub fn add_layer_at(&self, layer: Layer, z_index: i32) {
        self.insert(layer, Some(z_index));
    }

    fn insert(&self, layer: Layer, z_index: Option<i32>) {
        if self.layers.borrow().iter().any(|(_, l)| *l == layer) {
            return;
        }
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.layers.borrow_mut().push((seq, layer.clone()));

        let me: Weak<dyn MapHost> = self.me.clone();
        layer.bind_map(me, z_index);
        self.sort_layers_by_z_index();
        if let Err(err) = layer.load() {
            self.load_errors.borrow_mut().push(err.to_string());
        }
    }

    pub fn sort_count(&self) -> usize {
        self.sorts.get()
    }

    pub fn set_zoom(&self, zoom: f64) {
        self.zoom.set(zoom);
    }

    pub fn set_zoom_range(&self, min: Option<f64>, max: Option<f64>) {
        self.zoom_range.set((min, max));
    }

    pub fn set_zooming(&self, zooming: bool) {
        self.zooming.set(zooming);
    }

    /// Complete a render cycle, running every queued render-end callback
    pub fn finish_render(&self) {
        let callbacks = std::mem::take(&mut *self.render_callbacks.borrow_mut());
        for callback in callbacks {
            callback();
        }
    }

    pub fn pending_render_callbacks(&self) -> usize {
        self.render_callbacks.borrow().len()
    }

    pub fn layer_events(&self) -> Vec<LayerEvent> {
        self.layer_events.borrow().clone()
    }

    pub fn layer_event_kinds(&self) -> Vec<String> {
        self.layer_events
            .borrow()
            .iter()
            .map(|event| event.event_type().to_string())
            .collect()
    }

    pub fn load_errors(&self) -> Vec<String> {
        self.load_errors.borrow().clone()
    }

    pub fn subscription_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Fire a map event at every matching subscription
    pub fn emit(&self, kind: &str) {
        let event = MapEvent::new(kind);
        let handlers: Vec<_> = self
            .listeners
            .borrow()
            .values()
            .filter(|listener| listener.event == kind)
            .map(|listener| Rc::clone(&listener.handler))
            .collect();
        for handler in handlers {
            handler(&event);
        }
    }
}

impl MapHost for MockMap {
    fn add_layer(&self, layer: Layer) {
        self.insert(layer, None);
    }

    fn remove_layer(&self, layer: &Layer) {
        let removed = {
            let mut layers = self.layers.borrow_mut();
            let before = layers.len();
            layers.retain(|(_, l)| l != layer);
            layers.len() != before
        };
        if removed {
            layer.do_remove();
        }
    }

    fn layers(&self) -> Vec<Layer> {
        self.layers
            .borrow()
            .iter()
            .map(|(_, layer)| layer.clone())
            .collect()
    }

    fn sort_layers_by_z_index(&self) {
        self.sorts.set(self.sorts.get() + 1);
        self.layers
            .borrow_mut()
            .sort_by_key(|(seq, layer)| (layer.z_index(), *seq));
    }

    fn zoom(&self) -> f64 {
        self.zoom.get()
    }

    fn min_zoom(&self) -> Option<f64> {
        self.zoom_range.get().0
    }

    fn max_zoom(&self) -> Option<f64> {
        self.zoom_range.get().1
    }

    fn projection(&self) -> Option<Projection> {
        Some(Projection::Epsg3857)
    }

    fn collision_index(&self) -> Rc<CollisionIndex> {
        Rc::clone(&self.collision)
    }

    fn is_zooming(&self) -> bool {
        self.zooming.get()
    }

    fn once_render_end(&self, callback: Box<dyn FnOnce()>) {
        self.render_callbacks.borrow_mut().push(callback);
    }

    fn on_layer_event(&self, event: &LayerEvent) {
        self.layer_events.borrow_mut().push(event.clone());
    }

    fn subscribe(&self, listener: MapListener) -> SubscriptionId {
        self.listeners.borrow_mut().insert(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().remove(id);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

/// Renderer logging every call as `renderer.<method>`
pub struct MockRenderer {
    log: Log,
    mode: RepaintMode,
}

impl MockRenderer {
    pub fn new(log: &Log) -> Rc<Self> {
        Rc::new(Self {
            log: Rc::clone(log),
            mode: RepaintMode::FrameLoop,
        })
    }

    pub fn on_demand(log: &Log) -> Rc<Self> {
        Rc::new(Self {
            log: Rc::clone(log),
            mode: RepaintMode::OnDemand,
        })
    }

    fn record(&self, entry: impl Into<String>) {
        self.log.borrow_mut().push(entry.into());
    }
}

impl LayerRenderer for MockRenderer {
    fn set_z_index(&self, z_index: i32) {
        self.record(format!("renderer.set_z_index {z_index}"));
    }

    fn render(&self) {
        self.record("renderer.render");
    }

    fn show(&self) {
        self.record("renderer.show");
    }

    fn hide(&self) {
        self.record("renderer.hide");
    }

    fn remove(&self) {
        self.record("renderer.remove");
    }

    fn on_add(&self) {
        self.record("renderer.on_add");
    }

    fn set_to_redraw(&self) {
        self.record("renderer.set_to_redraw");
    }

    fn events(&self) -> Vec<MapListener> {
        let log = Rc::clone(&self.log);
        vec![MapListener::new("moveend", move |_| {
            log.borrow_mut().push("renderer.moveend".to_string());
        })]
    }

    fn repaint_mode(&self) -> RepaintMode {
        self.mode
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

pub struct MockGeometry {
    geometry_type: GeometryType,
    vector_marker: bool,
    symbol: RefCell<Symbol>,
    bound: RefCell<Option<WeakLayer>>,
    extent: Cell<Option<Extent>>,
}

impl MockGeometry {
    pub fn new(geometry_type: GeometryType) -> Self {
        Self {
            geometry_type,
            vector_marker: false,
            symbol: RefCell::new(Symbol::default()),
            bound: RefCell::new(None),
            extent: Cell::new(None),
        }
    }

    /// A point drawn with a vector marker
    pub fn vector_marker() -> Self {
        Self {
            vector_marker: true,
            ..Self::new(GeometryType::Point)
        }
    }

    pub fn shared(geometry_type: GeometryType) -> Rc<Self> {
        Rc::new(Self::new(geometry_type))
    }

    pub fn shared_vector_marker() -> Rc<Self> {
        Rc::new(Self::vector_marker())
    }

    pub fn bound_layer(&self) -> Option<Layer> {
        self.bound.borrow().as_ref().and_then(WeakLayer::upgrade)
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol.borrow().clone()
    }

    pub fn set_painted_extent(&self, extent: Extent) {
        self.extent.set(Some(extent));
    }
}

impl Geometry for MockGeometry {
    fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    fn is_vector_marker(&self) -> bool {
        self.vector_marker
    }

    fn bind_layer(&self, layer: &Layer) {
        *self.bound.borrow_mut() = Some(layer.downgrade());
    }

    fn update_symbol(&self, patch: &Symbol) {
        self.symbol.borrow_mut().merge(patch);
    }

    fn set_symbol(&self, symbol: Symbol) {
        *self.symbol.borrow_mut() = symbol;
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "type": self.geometry_type.as_str() })
    }

    fn painted_extent(&self) -> Option<Extent> {
        self.extent.get()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Layer Kind
// ─────────────────────────────────────────────────────────────────────────────

/// Layer kind logging every hook by name
pub struct RecordingKind {
    log: Log,
    load_result: Cell<bool>,
    registry: Option<RendererRegistry>,
    listening: Vec<String>,
}

impl RecordingKind {
    /// A kind without renderers
    pub fn new(log: &Log) -> Self {
        Self {
            log: Rc::clone(log),
            load_result: Cell::new(true),
            registry: None,
            listening: Vec::new(),
        }
    }

    /// A kind drawn by a [`MockRenderer`] logging to the same log
    pub fn with_canvas(log: &Log) -> Self {
        let renderer_log = Rc::clone(log);
        let registry = RendererRegistry::new().with(DEFAULT_RENDERER, move |_| {
            MockRenderer::new(&renderer_log) as Rc<dyn LayerRenderer>
        });
        Self::with_registry(log, registry)
    }

    pub fn with_registry(log: &Log, registry: RendererRegistry) -> Self {
        Self {
            registry: Some(registry),
            ..Self::new(log)
        }
    }

    pub fn set_load_result(&self, result: bool) {
        self.load_result.set(result);
    }

    /// Subscribe to `event` on the map while attached, logging `kind.<event>`
    pub fn listening_to(mut self, event: &str) -> Self {
        self.listening.push(event.to_string());
        self
    }

    fn record(&self, entry: impl Into<String>) {
        self.log.borrow_mut().push(entry.into());
    }
}

impl LayerKind for RecordingKind {
    fn renderer_registry(&self) -> Option<&RendererRegistry> {
        self.registry.as_ref()
    }

    fn map_events(&self, _layer: &Layer) -> Vec<MapListener> {
        self.listening
            .iter()
            .map(|event| {
                let log = Rc::clone(&self.log);
                MapListener::new(event.as_str(), move |e| {
                    log.borrow_mut().push(format!("kind.{}", e.kind));
                })
            })
            .collect()
    }

    fn on_load(&self, _layer: &Layer) -> bool {
        self.record("on_load");
        self.load_result.get()
    }

    fn on_load_end(&self, _layer: &Layer) {
        self.record("on_load_end");
    }

    fn on_add(&self, _layer: &Layer) {
        self.record("on_add");
    }

    fn on_remove(&self, _layer: &Layer) {
        self.record("on_remove");
    }

    fn on_renderer_create(&self, _layer: &Layer) {
        self.record("on_renderer_create");
    }

    fn on_canvas_create(&self, _layer: &Layer) {
        self.record("on_canvas_create");
    }

    fn on_config(&self, _layer: &Layer, options: &LayerOptions) {
        self.record(format!("on_config opacity={}", options.opacity));
    }
}
