//! Map (viewport) collaborator interface
//!
//! The map owns the z-ordered layer collection, the zoom state, the shared
//! collision index and the render loop. A layer only ever sees it through
//! [`MapHost`] and holds it weakly: the map owns its layers, a layer merely
//! participates while attached.
//!
//! # Attach / detach protocol
//!
//! ```text
//! MapHost::add_layer(layer)
//!     ↓ insert into the collection
//! layer.bind_map(weak_self, z_index)   → on_add hook, `add` event
//!     ↓
//! layer.load()                         → on_load, renderer creation, on_load_end
//!
//! MapHost::remove_layer(layer)
//!     ↓ remove from the collection
//! layer.do_remove()                    → on_remove hook, renderer removed
//! ```

use std::fmt;
use std::rc::Rc;

use slotmap::new_key_type;

use crate::collision::CollisionIndex;
use crate::events::LayerEvent;
use crate::layer::Layer;

new_key_type! {
    /// Handle to a map event subscription
    pub struct SubscriptionId;
}

/// An event emitted by the map itself (zoomstart, moveend, resize, ...)
#[derive(Clone, Debug, PartialEq)]
pub struct MapEvent {
    pub kind: String,
    pub data: serde_json::Value,
}

impl MapEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}

/// Callback invoked for a map event
pub type MapEventHandler = Rc<dyn Fn(&MapEvent)>;

/// A subscription request for one map event type
#[derive(Clone)]
pub struct MapListener {
    pub event: String,
    pub handler: MapEventHandler,
}

impl MapListener {
    pub fn new<F>(event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&MapEvent) + 'static,
    {
        Self {
            event: event.into(),
            handler: Rc::new(handler),
        }
    }
}

impl fmt::Debug for MapListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapListener")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

/// Map projection identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Projection {
    /// Web Mercator
    Epsg3857,
    /// WGS84 longitude/latitude
    Epsg4326,
    /// Planar coordinates, no projection
    Identity,
    Custom(String),
}

impl Projection {
    pub fn code(&self) -> &str {
        match self {
            Projection::Epsg3857 => "EPSG:3857",
            Projection::Epsg4326 => "EPSG:4326",
            Projection::Identity => "IDENTITY",
            Projection::Custom(code) => code,
        }
    }
}

/// The viewport a layer can be attached to
///
/// All methods take `&self`; implementations are expected to use interior
/// mutability and must not hold a borrow of their layer collection while
/// calling back into a layer.
pub trait MapHost {
    /// Insert `layer`, bind it (`Layer::bind_map`) and load it (`Layer::load`)
    fn add_layer(&self, layer: Layer);

    /// Remove `layer` from the collection and detach it (`Layer::do_remove`)
    fn remove_layer(&self, layer: &Layer);

    /// Layers in ascending z-order; ties keep insertion order
    fn layers(&self) -> Vec<Layer>;

    /// Re-sort the collection after a z-index change
    fn sort_layers_by_z_index(&self);

    fn zoom(&self) -> f64;

    /// Global lower zoom bound, `None` if unbounded
    fn min_zoom(&self) -> Option<f64>;

    /// Global upper zoom bound, `None` if unbounded
    fn max_zoom(&self) -> Option<f64>;

    fn projection(&self) -> Option<Projection>;

    /// The collision index shared by every map-scoped layer
    fn collision_index(&self) -> Rc<CollisionIndex>;

    /// Whether a zoom gesture or animation is in progress
    fn is_zooming(&self) -> bool;

    /// Run `callback` once, after the next completed render cycle
    fn once_render_end(&self, callback: Box<dyn FnOnce()>);

    /// Aggregation sink receiving every event fired by an attached layer
    fn on_layer_event(&self, event: &LayerEvent);

    fn subscribe(&self, listener: MapListener) -> SubscriptionId;

    fn unsubscribe(&self, id: SubscriptionId);
}
