//! Detects catalog edits that invalidate the compiled mesh without any cell changing.
//!
//! Catalog entries are edited in place (for example a height tweaked in the
//! inspector), so nothing intercepts the write. Instead the catalog is diffed
//! against a deep snapshot once per tick.

use crate::cell_catalog::CellCatalog;

#[derive(Clone, Debug)]
pub struct CatalogWatcher<A> {
    snapshot: CellCatalog<A>,
}

impl<A> Default for CatalogWatcher<A> {
    fn default() -> Self {
        Self {
            snapshot: CellCatalog::new(),
        }
    }
}

impl<A: Clone + PartialEq> CatalogWatcher<A> {
    /// Seed from the catalog as it is when the grid becomes active.
    pub fn new(current: &CellCatalog<A>) -> Self {
        Self {
            snapshot: current.clone(),
        }
    }

    /// Re-seed without reporting a change.
    pub fn reset(&mut self, current: &CellCatalog<A>) {
        self.snapshot = current.clone();
    }

    /// Compare against the snapshot and take a new one if anything differs.
    pub fn check_and_update(&mut self, current: &CellCatalog<A>) -> bool {
        if self.snapshot == *current {
            return false;
        }
        self.snapshot = current.clone();
        true
    }

    pub fn snapshot(&self) -> &CellCatalog<A> {
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_catalog::CellType;

    fn catalog() -> CellCatalog<&'static str> {
        CellCatalog::from_entries(vec![
            CellType::new(0.0, 3.0).with_floor("grass"),
            CellType::new(1.0, 0.0).with_wall("brick"),
        ])
    }

    #[test]
    fn test_seeded_watcher_reports_no_change() {
        let current = catalog();
        let mut watcher = CatalogWatcher::new(&current);
        assert!(!watcher.check_and_update(&current));
    }

    #[test]
    fn test_height_edit_detected_once() {
        let mut current = catalog();
        let mut watcher = CatalogWatcher::new(&current);

        current.get_mut(1).unwrap().floor_height = 2.0;
        assert!(watcher.check_and_update(&current));
        assert!(!watcher.check_and_update(&current));
        assert_eq!(watcher.snapshot().get(1).unwrap().floor_height, 2.0);
    }

    #[test]
    fn test_length_change_detected() {
        let mut current = catalog();
        let mut watcher = CatalogWatcher::new(&current);

        current.push(CellType::default());
        assert!(watcher.check_and_update(&current));

        current.remove(0);
        current.remove(0);
        assert!(watcher.check_and_update(&current));
    }

    #[test]
    fn test_appearance_edit_detected() {
        let mut current = catalog();
        let mut watcher = CatalogWatcher::new(&current);

        current.get_mut(0).unwrap().ceiling = Some("plaster");
        assert!(watcher.check_and_update(&current));
    }

    #[test]
    fn test_unseeded_watcher_sees_first_catalog() {
        let mut watcher = CatalogWatcher::default();
        assert!(watcher.check_and_update(&catalog()));
    }
}
