//! Flat persistence form of the cell store.
//!
//! The engine serializes ordered lists, not maps, so cells are written as a list
//! of `(coord, material)` records and rebuilt into a map on load. Record order
//! carries no meaning.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cell_store::{CellCoord, CellStore};
use crate::debug_log::debug_log;

/// One persisted cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub x: i32,
    pub y: i32,
    pub material: u32,
}

impl CellRecord {
    pub fn new(coord: CellCoord, material: u32) -> Self {
        Self {
            x: coord.x,
            y: coord.y,
            material,
        }
    }

    pub fn coord(&self) -> CellCoord {
        CellCoord::new(self.x, self.y)
    }
}

/// Result of decoding a record list.
#[derive(Debug, Default)]
pub struct DecodedCells {
    pub cells: HashMap<CellCoord, u32>,
    /// Records whose coordinate was already seen. Non-zero means a corrupt save.
    pub duplicates: usize,
}

/// One record per stored cell, in no particular order.
pub fn encode(store: &CellStore) -> Vec<CellRecord> {
    store
        .iter()
        .map(|(&coord, &material)| CellRecord::new(coord, material))
        .collect()
}

/// Rebuild the coordinate map. The last record for a repeated coordinate wins.
pub fn decode(records: &[CellRecord]) -> DecodedCells {
    let mut decoded = DecodedCells {
        cells: HashMap::with_capacity(records.len()),
        duplicates: 0,
    };

    for record in records {
        if decoded.cells.insert(record.coord(), record.material).is_some() {
            decoded.duplicates += 1;
        }
    }

    if decoded.duplicates > 0 {
        debug_log(&format!(
            "[decode] {} duplicate cell records, last write kept",
            decoded.duplicates
        ));
    }

    decoded
}

/// Load `records` into `store`, replacing its contents and marking the mesh stale.
/// Returns the number of duplicate records that were collapsed.
pub fn decode_into(store: &mut CellStore, records: &[CellRecord]) -> usize {
    let decoded = decode(records);
    store.replace_all(decoded.cells);
    decoded.duplicates
}

/// Cached encoded form, refreshed only when the store changed since the last encode.
#[derive(Clone, Debug, Default)]
pub struct PersistedCells {
    records: Vec<CellRecord>,
}

impl PersistedCells {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Seed the cache from a freshly loaded list.
    pub fn from_records(records: Vec<CellRecord>) -> Self {
        Self { records }
    }

    /// Re-encode if the store is persistence-dirty. Returns true if the cache changed.
    pub fn sync(&mut self, store: &mut CellStore) -> bool {
        if !store.take_persistence_dirty() {
            return false;
        }
        self.records = encode(store);
        true
    }

    pub fn records(&self) -> &[CellRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> CellStore {
        let mut store = CellStore::new();
        store.set(CellCoord::new(0, 0), 0);
        store.set(CellCoord::new(-4, 9), 2);
        store.set(CellCoord::new(7, -1), 11);
        store
    }

    #[test]
    fn test_encode_one_record_per_cell() {
        let store = sample_store();
        let records = encode(&store);
        assert_eq!(records.len(), 3);
        assert!(records.contains(&CellRecord::new(CellCoord::new(7, -1), 11)));
    }

    #[test]
    fn test_decode_rebuilds_mapping() {
        let store = sample_store();
        let decoded = decode(&encode(&store));
        assert_eq!(decoded.duplicates, 0);
        assert_eq!(decoded.cells.len(), store.len());
        for (coord, material) in store.iter() {
            assert_eq!(decoded.cells.get(coord), Some(material));
        }
    }

    #[test]
    fn test_decode_duplicate_last_wins() {
        let records = [
            CellRecord::new(CellCoord::new(1, 1), 3),
            CellRecord::new(CellCoord::new(2, 2), 0),
            CellRecord::new(CellCoord::new(1, 1), 5),
        ];
        let decoded = decode(&records);
        assert_eq!(decoded.duplicates, 1);
        assert_eq!(decoded.cells.len(), 2);
        assert_eq!(decoded.cells[&CellCoord::new(1, 1)], 5);
    }

    #[test]
    fn test_decode_into_marks_mesh_dirty() {
        let mut store = CellStore::new();
        let records = [CellRecord::new(CellCoord::new(0, 3), 1)];
        decode_into(&mut store, &records);
        assert_eq!(store.get(CellCoord::new(0, 3)), Ok(1));
        assert!(store.dirty().mesh);
    }

    #[test]
    fn test_decode_empty_list_still_marks_mesh_dirty() {
        let mut store = sample_store();
        store.take_mesh_dirty();
        decode_into(&mut store, &[]);
        assert!(store.is_empty());
        assert!(store.dirty().mesh);
    }

    #[test]
    fn test_persisted_cells_encode_lazily() {
        let mut store = sample_store();
        let mut persisted = PersistedCells::new();

        assert!(persisted.sync(&mut store));
        assert_eq!(persisted.records().len(), 3);

        // No mutation since the last encode
        assert!(!persisted.sync(&mut store));

        store.remove(CellCoord::new(0, 0));
        assert!(persisted.sync(&mut store));
        assert_eq!(persisted.records().len(), 2);
    }
}
