//! Layer events
//!
//! Every event fired on a layer goes through the same pipeline:
//!
//! ```text
//! Layer::fire(kind, data)
//!     ↓ `layerload` marks the layer loaded
//!     ↓ stamp(target)            (attached: forwarded to MapHost::on_layer_event)
//!     ↓ EventDispatcher::dispatch (local listeners)
//!     ↓ derive_visible_change    (`show`/`hide` only, fired the same way)
//! ```
//!
//! The map aggregator always sees an event before local listeners do.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::layer::Layer;
use crate::renderer::LayerRenderer;

/// Event type names
pub mod event_types {
    pub const ADD: &str = "add";
    pub const REMOVE: &str = "remove";
    pub const ID_CHANGE: &str = "idchange";
    pub const SET_Z_INDEX: &str = "setzindex";
    pub const SHOW: &str = "show";
    pub const HIDE: &str = "hide";
    pub const VISIBLE_CHANGE: &str = "visiblechange";
    pub const RENDERER_CREATE: &str = "renderercreate";
    pub const LAYER_LOAD: &str = "layerload";
    pub const CANVAS_CREATE: &str = "canvascreate";
}

/// Kind of a layer event
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LayerEventKind {
    Add,
    /// Fired by `Layer::do_remove` once the renderer is torn down
    Remove,
    IdChange,
    SetZIndex,
    Show,
    Hide,
    VisibleChange,
    RendererCreate,
    /// Fired by the renderer once the layer's content is ready
    LayerLoad,
    CanvasCreate,
    /// Any event type defined by a layer kind or renderer
    Custom(String),
}

impl LayerEventKind {
    pub fn as_str(&self) -> &str {
        match self {
            LayerEventKind::Add => event_types::ADD,
            LayerEventKind::Remove => event_types::REMOVE,
            LayerEventKind::IdChange => event_types::ID_CHANGE,
            LayerEventKind::SetZIndex => event_types::SET_Z_INDEX,
            LayerEventKind::Show => event_types::SHOW,
            LayerEventKind::Hide => event_types::HIDE,
            LayerEventKind::VisibleChange => event_types::VISIBLE_CHANGE,
            LayerEventKind::RendererCreate => event_types::RENDERER_CREATE,
            LayerEventKind::LayerLoad => event_types::LAYER_LOAD,
            LayerEventKind::CanvasCreate => event_types::CANVAS_CREATE,
            LayerEventKind::Custom(name) => name,
        }
    }

    /// Parse an event type name, case-insensitively for the built-in types
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            event_types::ADD => LayerEventKind::Add,
            event_types::REMOVE => LayerEventKind::Remove,
            event_types::ID_CHANGE => LayerEventKind::IdChange,
            event_types::SET_Z_INDEX => LayerEventKind::SetZIndex,
            event_types::SHOW => LayerEventKind::Show,
            event_types::HIDE => LayerEventKind::Hide,
            event_types::VISIBLE_CHANGE => LayerEventKind::VisibleChange,
            event_types::RENDERER_CREATE => LayerEventKind::RendererCreate,
            event_types::LAYER_LOAD => LayerEventKind::LayerLoad,
            event_types::CANVAS_CREATE => LayerEventKind::CanvasCreate,
            _ => LayerEventKind::Custom(name.to_string()),
        }
    }
}

impl From<&str> for LayerEventKind {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl fmt::Display for LayerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event payload
#[derive(Clone, Default)]
pub enum EventData {
    #[default]
    None,
    IdChange {
        old: Option<String>,
        new: Option<String>,
    },
    /// The z-index just set (`None` when cleared)
    ZIndex(Option<i32>),
    Renderer(Rc<dyn LayerRenderer>),
    Custom(serde_json::Value),
}

impl fmt::Debug for EventData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventData::None => f.write_str("None"),
            EventData::IdChange { old, new } => f
                .debug_struct("IdChange")
                .field("old", old)
                .field("new", new)
                .finish(),
            EventData::ZIndex(z) => f.debug_tuple("ZIndex").field(z).finish(),
            EventData::Renderer(_) => f.write_str("Renderer(..)"),
            EventData::Custom(value) => f.debug_tuple("Custom").field(value).finish(),
        }
    }
}

/// An event fired by a layer
#[derive(Clone, Debug)]
pub struct LayerEvent {
    pub kind: LayerEventKind,
    /// The firing layer; set by [`stamp`]
    pub target: Option<Layer>,
    pub data: EventData,
    /// Visible flag, carried by `visiblechange`
    pub visible: Option<bool>,
}

impl LayerEvent {
    pub fn new(kind: LayerEventKind, data: EventData) -> Self {
        Self {
            kind,
            target: None,
            data,
            visible: None,
        }
    }

    /// The event type name
    pub fn event_type(&self) -> &str {
        self.kind.as_str()
    }
}

/// Tag `event` as fired by `target`
pub fn stamp(event: &mut LayerEvent, target: &Layer) {
    event.target = Some(target.clone());
}

/// The `visiblechange` event a `show`/`hide` event synthesizes
///
/// Returns `None` for every other kind. The derived event keeps the original
/// payload and target.
pub fn derive_visible_change(event: &LayerEvent, visible: bool) -> Option<LayerEvent> {
    match event.kind {
        LayerEventKind::Show | LayerEventKind::Hide => Some(LayerEvent {
            kind: LayerEventKind::VisibleChange,
            target: event.target.clone(),
            data: event.data.clone(),
            visible: Some(visible),
        }),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

new_key_type! {
    /// Handle to a registered layer event listener
    pub struct ListenerId;
}

/// Callback invoked for a layer event
pub type LayerEventHandler = Rc<dyn Fn(&LayerEvent)>;

struct Listener {
    kind: LayerEventKind,
    handler: LayerEventHandler,
    once: bool,
}

#[derive(Default)]
struct Listeners {
    entries: SlotMap<ListenerId, Listener>,
    /// Registration order (slot order is not stable across removals)
    order: Vec<ListenerId>,
}

/// Local listener registry of a layer
///
/// Handlers may re-enter the dispatcher: matching handlers are snapshotted
/// before any of them runs, so listeners added during dispatch first see the
/// next event.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RefCell<Listeners>,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.len())
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, kind: LayerEventKind, handler: LayerEventHandler, once: bool) -> ListenerId {
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.entries.insert(Listener {
            kind,
            handler,
            once,
        });
        listeners.order.push(id);
        id
    }

    pub fn on<F>(&self, kind: LayerEventKind, handler: F) -> ListenerId
    where
        F: Fn(&LayerEvent) + 'static,
    {
        self.insert(kind, Rc::new(handler), false)
    }

    /// Register a listener removed after its first invocation
    pub fn once<F>(&self, kind: LayerEventKind, handler: F) -> ListenerId
    where
        F: Fn(&LayerEvent) + 'static,
    {
        self.insert(kind, Rc::new(handler), true)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.entries.remove(id).is_none() {
            return false;
        }
        listeners.order.retain(|l| *l != id);
        true
    }

    pub fn listens(&self, kind: &LayerEventKind) -> bool {
        self.listeners
            .borrow()
            .entries
            .values()
            .any(|l| l.kind == *kind)
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every listener registered for `event.kind`, in registration order
    pub fn dispatch(&self, event: &LayerEvent) {
        let handlers: SmallVec<[LayerEventHandler; 4]> = {
            let mut listeners = self.listeners.borrow_mut();
            let Listeners { entries, order } = &mut *listeners;
            let mut handlers = SmallVec::new();
            order.retain(|id| {
                let Some(listener) = entries.get(*id) else {
                    return false;
                };
                if listener.kind != event.kind {
                    return true;
                }
                handlers.push(Rc::clone(&listener.handler));
                if listener.once {
                    entries.remove(*id);
                    return false;
                }
                true
            });
            handlers
        };

        for handler in handlers {
            handler(event);
        }
    }
}
