use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Integer grid coordinate of one unit cell.
/// `x` maps to world X, `y` maps to world Z; elevation is world Y.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: i32,
    pub y: i32,
}

impl CellCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighboring coordinate, or None past the edge of the `i32` plane.
    pub fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        Some(Self::new(self.x.checked_add(dx)?, self.y.checked_add(dy)?))
    }
}

impl From<(i32, i32)> for CellCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Pending work raised by store mutations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    /// The compiled mesh no longer matches the cells.
    pub mesh: bool,
    /// The persisted record list no longer matches the cells.
    pub persistence: bool,
}

impl DirtyFlags {
    pub fn mark_all(&mut self) {
        self.mesh = true;
        self.persistence = true;
    }
}

/// Sparse 2D grid mapping coordinates to material indices.
/// Absent coordinates are void. Indices are not checked against any catalog here.
#[derive(Clone, Debug, Default)]
pub struct CellStore {
    cells: HashMap<CellCoord, u32>,
    dirty: DirtyFlags,
}

impl CellStore {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
            dirty: DirtyFlags::default(),
        }
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        self.cells.contains_key(&coord)
    }

    /// True if the cell exists and its index resolves into a catalog of `catalog_len` entries.
    pub fn contains_valid(&self, coord: CellCoord, catalog_len: usize) -> bool {
        self.cells
            .get(&coord)
            .is_some_and(|&index| (index as usize) < catalog_len)
    }

    /// Material index at `coord`. Callers check `contains` first.
    pub fn get(&self, coord: CellCoord) -> GridResult<u32> {
        self.cells
            .get(&coord)
            .copied()
            .ok_or(GridError::MissingCell {
                x: coord.x,
                y: coord.y,
            })
    }

    /// Insert or overwrite a cell.
    pub fn set(&mut self, coord: CellCoord, index: u32) {
        self.cells.insert(coord, index);
        self.dirty.mark_all();
    }

    /// Remove a cell if present. Flags are raised either way.
    pub fn remove(&mut self, coord: CellCoord) -> Option<u32> {
        self.dirty.mark_all();
        self.cells.remove(&coord)
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.dirty.mark_all();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CellCoord, &u32)> {
        self.cells.iter()
    }

    /// Replace every cell in one step, as done after a load.
    /// The store is now in sync with its persisted form, so only the mesh is dirtied.
    pub fn replace_all(&mut self, cells: HashMap<CellCoord, u32>) {
        self.cells = cells;
        self.dirty.mesh = true;
        self.dirty.persistence = false;
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn mark_mesh_dirty(&mut self) {
        self.dirty.mesh = true;
    }

    pub fn set_persistence_dirty(&mut self) {
        self.dirty.persistence = true;
    }

    /// Returns whether a rebuild was pending and clears the flag.
    pub fn take_mesh_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty.mesh)
    }

    /// Returns whether a re-encode was pending and clears the flag.
    pub fn take_persistence_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty.persistence)
    }

    /// Bounding box of all occupied cells: (min, max).
    /// Returns None if the store is empty.
    pub fn bounds(&self) -> Option<(CellCoord, CellCoord)> {
        if self.cells.is_empty() {
            return None;
        }

        let mut min = CellCoord::new(i32::MAX, i32::MAX);
        let mut max = CellCoord::new(i32::MIN, i32::MIN);

        for coord in self.cells.keys() {
            min.x = min.x.min(coord.x);
            min.y = min.y.min(coord.y);
            max.x = max.x.max(coord.x);
            max.y = max.y.max(coord.y);
        }

        Some((min, max))
    }
}
