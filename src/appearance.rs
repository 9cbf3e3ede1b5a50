//! Pairs each submesh bucket with the appearance its cell type assigns.

use crate::cell_catalog::CellCatalog;
use crate::grid_compiler::SURFACES_PER_TYPE;

/// Appearance per bucket, in the same `[floor, wall, ceiling]` per-type order
/// the compiler uses. `None` slots draw nothing.
pub fn sync_appearances<A: Clone>(catalog: &CellCatalog<A>) -> Vec<Option<A>> {
    let mut slots = Vec::with_capacity(catalog.len() * SURFACES_PER_TYPE);
    for cell_type in catalog.iter() {
        slots.push(cell_type.floor.clone());
        slots.push(cell_type.wall.clone());
        slots.push(cell_type.ceiling.clone());
    }
    slots
}
