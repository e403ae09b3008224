//! Collision index for label and marker placement
//!
//! A uniform grid over axis-aligned boxes. Placed items register their
//! screen-space box; later items ask whether their box would overlap
//! anything already placed.
//!
//! The index is shared by reference (`Rc<CollisionIndex>`) between a layer or
//! map and its renderers, so all operations take `&self`.

use std::cell::RefCell;
use std::fmt;

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use crate::geometry::Extent;

new_key_type! {
    /// Handle to a box placed in a collision index
    pub struct BoxId;
}

type CellKey = (i64, i64);

/// Widest span, in cells per axis, a box may cover before it moves to the
/// overflow bucket
const MAX_CELL_SPAN: i64 = 64;

struct GridIndex {
    cell_size: f64,
    boxes: SlotMap<BoxId, Extent>,
    cells: FxHashMap<CellKey, SmallVec<[BoxId; 4]>>,
    /// Boxes too large (or not finite) to bucket; checked by every lookup
    overflow: SmallVec<[BoxId; 4]>,
}

impl GridIndex {
    /// Cell range covered by `extent`, `None` when it belongs in overflow
    fn cell_range(&self, extent: &Extent) -> Option<(CellKey, CellKey)> {
        let finite = [extent.xmin, extent.ymin, extent.xmax, extent.ymax]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return None;
        }
        let cell = |v: f64| (v / self.cell_size).floor() as i64;
        let (x0, y0, x1, y1) = (
            cell(extent.xmin),
            cell(extent.ymin),
            cell(extent.xmax),
            cell(extent.ymax),
        );
        if x1.saturating_sub(x0) >= MAX_CELL_SPAN || y1.saturating_sub(y0) >= MAX_CELL_SPAN {
            return None;
        }
        Some(((x0, y0), (x1, y1)))
    }

    fn cell_keys(&self, range: (CellKey, CellKey)) -> SmallVec<[CellKey; 8]> {
        let ((x0, y0), (x1, y1)) = range;
        let mut keys = SmallVec::new();
        for x in x0..=x1 {
            for y in y0..=y1 {
                keys.push((x, y));
            }
        }
        keys
    }

    fn intersects(&self, id: BoxId, extent: &Extent) -> bool {
        self.boxes.get(id).is_some_and(|b| b.intersects(extent))
    }

    /// Ids of boxes that may overlap `extent`, possibly repeated
    fn candidates(&self, extent: &Extent) -> Vec<BoxId> {
        match self.cell_range(extent) {
            Some(range) => {
                let mut ids: Vec<BoxId> = self.overflow.to_vec();
                for key in self.cell_keys(range) {
                    if let Some(bucket) = self.cells.get(&key) {
                        ids.extend(bucket.iter().copied());
                    }
                }
                ids
            }
            // oversized query: scanning every box beats walking the grid
            None => self.boxes.keys().collect(),
        }
    }
}

/// Spatial index of placed boxes
pub struct CollisionIndex {
    grid: RefCell<GridIndex>,
}

impl fmt::Debug for CollisionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.grid.borrow();
        f.debug_struct("CollisionIndex")
            .field("cell_size", &grid.cell_size)
            .field("boxes", &grid.boxes.len())
            .field("cells", &grid.cells.len())
            .field("overflow", &grid.overflow.len())
            .finish()
    }
}

impl Default for CollisionIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionIndex {
    /// Grid cell edge length in pixels
    pub const DEFAULT_CELL_SIZE: f64 = 64.0;

    pub fn new() -> Self {
        Self::with_cell_size(Self::DEFAULT_CELL_SIZE)
    }

    /// Create an index with a custom cell size (non-positive sizes fall back
    /// to the default)
    pub fn with_cell_size(cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() {
            cell_size
        } else {
            Self::DEFAULT_CELL_SIZE
        };
        Self {
            grid: RefCell::new(GridIndex {
                cell_size,
                boxes: SlotMap::with_key(),
                cells: FxHashMap::default(),
                overflow: SmallVec::new(),
            }),
        }
    }

    /// Place a box
    ///
    /// Boxes spanning many cells, or with non-finite edges, are kept in an
    /// overflow bucket instead of the grid.
    pub fn insert(&self, extent: Extent) -> BoxId {
        let mut grid = self.grid.borrow_mut();
        let id = grid.boxes.insert(extent);
        match grid.cell_range(&extent) {
            Some(range) => {
                let keys = grid.cell_keys(range);
                for key in keys {
                    grid.cells.entry(key).or_default().push(id);
                }
            }
            None => {
                tracing::trace!(?extent, "collision box placed in overflow");
                grid.overflow.push(id);
            }
        }
        id
    }

    /// Remove a previously placed box
    pub fn remove(&self, id: BoxId) -> bool {
        let mut grid = self.grid.borrow_mut();
        let Some(extent) = grid.boxes.remove(id) else {
            return false;
        };
        let Some(range) = grid.cell_range(&extent) else {
            grid.overflow.retain(|b| *b != id);
            return true;
        };
        let keys = grid.cell_keys(range);
        for key in keys {
            if let Some(bucket) = grid.cells.get_mut(&key) {
                bucket.retain(|b| *b != id);
                if bucket.is_empty() {
                    grid.cells.remove(&key);
                }
            }
        }
        true
    }

    /// Whether `extent` overlaps any placed box
    pub fn collides(&self, extent: &Extent) -> bool {
        let grid = self.grid.borrow();
        grid.candidates(extent)
            .into_iter()
            .any(|id| grid.intersects(id, extent))
    }

    /// All placed boxes overlapping `extent`, each reported once
    pub fn query(&self, extent: &Extent) -> Vec<BoxId> {
        let grid = self.grid.borrow();
        let mut found: Vec<BoxId> = Vec::new();
        for id in grid.candidates(extent) {
            if !found.contains(&id) && grid.intersects(id, extent) {
                found.push(id);
            }
        }
        found
    }

    pub fn get(&self, id: BoxId) -> Option<Extent> {
        self.grid.borrow().boxes.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.grid.borrow().boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.borrow().boxes.is_empty()
    }

    /// Drop every placed box, keeping the index itself
    pub fn clear(&self) {
        let mut grid = self.grid.borrow_mut();
        grid.boxes.clear();
        grid.cells.clear();
        grid.overflow.clear();
    }
}
