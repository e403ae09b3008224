//! Renderer collaborator interface and registry
//!
//! Concrete renderers (canvas, DOM, WebGL, ...) live outside this crate. A
//! layer kind publishes the renderers it supports through a
//! [`RendererRegistry`]; the layer picks one by its configured `renderer`
//! option when it loads.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::layer::Layer;
use crate::map::MapListener;

/// How a renderer gets its frames painted
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepaintMode {
    /// Painted by the map's frame loop (canvas, GL)
    #[default]
    FrameLoop,
    /// Paints only when asked to render
    OnDemand,
}

/// Backend painting a single layer
pub trait LayerRenderer {
    fn set_z_index(&self, z_index: i32);

    fn render(&self);

    fn show(&self);

    fn hide(&self);

    /// Release everything the renderer holds; called once, on layer removal
    fn remove(&self);

    /// Called right after the renderer is bound to its layer
    fn on_add(&self) {}

    /// Mark the layer dirty for the next frame
    fn set_to_redraw(&self) {}

    /// Map event subscriptions this renderer needs while alive
    fn events(&self) -> Vec<MapListener> {
        Vec::new()
    }

    fn repaint_mode(&self) -> RepaintMode {
        RepaintMode::FrameLoop
    }
}

/// Builds a renderer bound to a layer
pub type RendererFactory = Rc<dyn Fn(&Layer) -> Rc<dyn LayerRenderer>>;

/// Renderer implementations keyed by kind ("canvas", "dom", "gl", ...)
#[derive(Clone, Default)]
pub struct RendererRegistry {
    factories: IndexMap<String, RendererFactory>,
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("kinds", &self.kinds().collect::<Vec<_>>())
            .finish()
    }
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory; a later registration for the same kind wins
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Layer) -> Rc<dyn LayerRenderer> + 'static,
    {
        self.factories.insert(kind.into(), Rc::new(factory));
        self
    }

    /// Builder form of [`register`](Self::register)
    pub fn with<F>(mut self, kind: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Layer) -> Rc<dyn LayerRenderer> + 'static,
    {
        self.register(kind, factory);
        self
    }

    pub fn get(&self, kind: &str) -> Option<&RendererFactory> {
        self.factories.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
