//! Collision index scoping

use std::rc::Rc;

use super::Layer;
use crate::collision::CollisionIndex;
use crate::options::CollisionScope;

impl Layer {
    /// The collision index this layer places labels into
    ///
    /// Layer scope: a dedicated index, created on first request. Map scope:
    /// the map's shared index, `None` while detached.
    pub fn collision_index(&self) -> Option<Rc<CollisionIndex>> {
        if self.state().options.collision_scope == CollisionScope::Layer {
            let mut state = self.state_mut();
            let index = state
                .collision_index
                .get_or_insert_with(|| Rc::new(CollisionIndex::new()));
            return Some(Rc::clone(index));
        }
        self.map().map(|map| map.collision_index())
    }

    /// Empty the dedicated index; the map's shared index is left to the map
    pub fn clear_collision_index(&self) -> &Self {
        let state = self.state();
        if state.options.collision_scope == CollisionScope::Layer {
            if let Some(index) = &state.collision_index {
                index.clear();
            }
        }
        drop(state);
        self
    }
}
