//! The grid object: owns cells, catalog and the derived mesh.
//!
//! Mutations only raise dirty flags. `process_tick` folds any number of edits
//! since the previous tick into at most one compile.

use crate::appearance::sync_appearances;
use crate::catalog_watcher::CatalogWatcher;
use crate::cell_catalog::CellCatalog;
use crate::cell_codec::{self, CellRecord, PersistedCells};
use crate::cell_sheet::CellSheet;
use crate::cell_store::{CellCoord, CellStore};
use crate::debug_log::{debug_log, log_compile};
use crate::error::GridResult;
use crate::grid_compiler::{self, CompiledMesh};
use crate::grid_region::GridRegion;

pub struct Grid<A> {
    store: CellStore,
    catalog: CellCatalog<A>,
    region: GridRegion,
    watcher: CatalogWatcher<A>,
    persisted: PersistedCells,
    mesh: CompiledMesh,
    appearances: Vec<Option<A>>,
    compile_count: u64,
    active: bool,
}

impl<A: Clone + PartialEq> Default for Grid<A> {
    fn default() -> Self {
        Self::new(CellCatalog::new())
    }
}

impl<A: Clone + PartialEq> Grid<A> {
    pub fn new(catalog: CellCatalog<A>) -> Self {
        Self {
            store: CellStore::new(),
            catalog,
            region: GridRegion::default(),
            watcher: CatalogWatcher::default(),
            persisted: PersistedCells::new(),
            mesh: CompiledMesh::default(),
            appearances: Vec::new(),
            compile_count: 0,
            active: false,
        }
    }

    /// Start ticking: seed the catalog snapshot and schedule the first compile.
    pub fn activate(&mut self) {
        self.catalog.validate();
        self.watcher.reset(&self.catalog);
        self.store.mark_mesh_dirty();
        self.active = true;
    }

    // ---- cells ----

    pub fn contains(&self, coord: CellCoord) -> bool {
        self.store.contains(coord)
    }

    pub fn contains_valid(&self, coord: CellCoord) -> bool {
        self.store.contains_valid(coord, self.catalog.len())
    }

    pub fn get(&self, coord: CellCoord) -> GridResult<u32> {
        self.store.get(coord)
    }

    pub fn set(&mut self, coord: CellCoord, index: u32) {
        self.store.set(coord, index);
    }

    pub fn remove(&mut self, coord: CellCoord) -> Option<u32> {
        self.store.remove(coord)
    }

    pub fn clear_cells(&mut self) {
        self.store.clear();
    }

    pub fn cell_count(&self) -> usize {
        self.store.len()
    }

    pub fn bounds(&self) -> Option<(CellCoord, CellCoord)> {
        self.store.bounds()
    }

    pub fn store(&self) -> &CellStore {
        &self.store
    }

    // ---- catalog ----

    pub fn catalog(&self) -> &CellCatalog<A> {
        &self.catalog
    }

    /// In-place edits are picked up by the next tick's catalog diff.
    pub fn catalog_mut(&mut self) -> &mut CellCatalog<A> {
        &mut self.catalog
    }

    pub fn set_catalog(&mut self, mut catalog: CellCatalog<A>) {
        catalog.validate();
        self.catalog = catalog;
    }

    // ---- region ----

    pub fn region(&self) -> GridRegion {
        self.region
    }

    pub fn set_region(&mut self, start: CellCoord, span: CellCoord) {
        self.region.set_start(start);
        self.region.set_span(span);
    }

    // ---- persistence ----

    /// Replace all cells with a loaded record list. Returns the number of duplicates dropped.
    pub fn load_records(&mut self, records: Vec<CellRecord>) -> usize {
        let duplicates = cell_codec::decode_into(&mut self.store, &records);
        self.persisted = PersistedCells::from_records(cell_codec::encode(&self.store));
        duplicates
    }

    /// The record list to persist, re-encoded only if cells changed since the last call.
    pub fn records(&mut self) -> &[CellRecord] {
        if self.persisted.sync(&mut self.store) {
            debug_log(&format!(
                "[records] re-encoded {} cells",
                self.persisted.records().len()
            ));
        }
        self.persisted.records()
    }

    pub fn needs_persist(&self) -> bool {
        self.store.dirty().persistence
    }

    /// Snapshot of region and cells. Leaves the pending save untouched.
    pub fn to_sheet(&self) -> CellSheet {
        CellSheet::new(self.region, cell_codec::encode(&self.store))
    }

    /// Load region and cells from a sheet. Returns the number of duplicates dropped.
    pub fn apply_sheet(&mut self, sheet: CellSheet) -> usize {
        self.region = sheet.region;
        let duplicates = cell_codec::decode_into(&mut self.store, &sheet.cells);
        // The sheet is not what the engine last saved, so persist it on the next save.
        self.store.set_persistence_dirty();
        duplicates
    }

    // ---- compile ----

    pub fn needs_rebuild(&self) -> bool {
        self.store.dirty().mesh
    }

    pub fn force_rebuild(&mut self) {
        self.store.mark_mesh_dirty();
    }

    /// One tick: diff the catalog, then compile if anything is dirty.
    /// Returns the new mesh only when a compile ran.
    pub fn process_tick(&mut self) -> Option<&CompiledMesh> {
        if !self.active {
            self.activate();
        }

        self.catalog.validate();
        if self.watcher.check_and_update(&self.catalog) {
            debug_log("[tick] catalog changed");
            self.store.mark_mesh_dirty();
        }

        if self.compile_if_dirty() {
            Some(&self.mesh)
        } else {
            None
        }
    }

    /// Compile once if the mesh is stale. Returns whether a compile ran.
    pub fn compile_if_dirty(&mut self) -> bool {
        if !self.store.take_mesh_dirty() {
            return false;
        }
        self.mesh = grid_compiler::compile(&self.store, &self.catalog);
        self.appearances = sync_appearances(&self.catalog);
        self.compile_count += 1;
        log_compile(self.compile_count, self.store.len(), &self.mesh);
        true
    }

    pub fn mesh(&self) -> &CompiledMesh {
        &self.mesh
    }

    /// Appearance per bucket of the current mesh.
    pub fn appearances(&self) -> &[Option<A>] {
        &self.appearances
    }

    pub fn compile_count(&self) -> u64 {
        self.compile_count
    }
}
