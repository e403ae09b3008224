//! Strata Core
//!
//! The base every map layer is built on. A layer is a stackable unit of map
//! content; this crate gives it:
//!
//! - **Identity & Ordering**: ids, z-index, bring-to-front/back within the map
//! - **Visibility**: opacity, zoom range and visible flag, with deferred
//!   `show`/`hide` notifications
//! - **Masks**: clipping geometry bound to the layer and restyled invisible
//! - **Collision Scopes**: a dedicated index per layer or the map's shared one
//! - **Lifecycle**: attach, load, renderer creation and removal, driven by
//!   [`LayerKind`] hooks
//! - **Events**: layer events mirrored to the map before local listeners run
//!
//! The map, renderers and geometries are collaborators reached through the
//! [`MapHost`], [`LayerRenderer`] and [`Geometry`] traits.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use strata_core::{BaseKind, Layer, LayerEventKind, LayerOptions};
//!
//! let layer = Layer::builder(BaseKind)
//!     .id("roads")
//!     .options(LayerOptions::new().with_opacity(0.8))
//!     .z_index(2)
//!     .build()
//!     .unwrap();
//!
//! let hidden = Rc::new(Cell::new(false));
//! let flag = Rc::clone(&hidden);
//! layer.on(LayerEventKind::Hide, move |_| flag.set(true));
//!
//! // detached layers fire synchronously
//! layer.hide();
//! assert!(hidden.get());
//! assert!(!layer.is_visible());
//! assert_eq!(layer.z_index(), 2);
//! ```

pub mod collision;
pub mod error;
pub mod events;
pub mod geometry;
pub mod layer;
pub mod map;
pub mod options;
pub mod renderer;

#[cfg(test)]
mod testing;

pub use collision::{BoxId, CollisionIndex};
pub use error::{LayerError, Result};
pub use events::{EventData, EventDispatcher, LayerEvent, LayerEventKind, ListenerId};
pub use geometry::{Color, Extent, Geometry, GeometryType, Symbol};
pub use layer::{BaseKind, Layer, LayerBuilder, LayerKind, LayerProfile, WeakLayer};
pub use map::{MapEvent, MapHost, MapListener, Projection, SubscriptionId};
pub use options::{CollisionScope, LayerOptions};
pub use renderer::{LayerRenderer, RendererFactory, RendererRegistry, RepaintMode};
