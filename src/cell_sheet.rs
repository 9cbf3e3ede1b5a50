//! Plain-text layout sheets.
//!
//! A sheet holds the grid region and the cell records as TOML so a layout can
//! be diffed, reviewed or hand-edited outside the engine. Cell types carry
//! engine resources and stay in the scene.

use serde::{Deserialize, Serialize};

use crate::cell_codec::CellRecord;
use crate::error::{GridError, GridResult};
use crate::grid_region::GridRegion;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellSheet {
    #[serde(default)]
    pub region: GridRegion,
    #[serde(default)]
    pub cells: Vec<CellRecord>,
}

impl CellSheet {
    pub fn new(region: GridRegion, cells: Vec<CellRecord>) -> Self {
        Self { region, cells }
    }

    /// Serialize with cells sorted row by row so repeated saves diff cleanly.
    pub fn to_toml_string(&self) -> GridResult<String> {
        let mut sorted = self.clone();
        sorted.cells.sort_by_key(|c| (c.y, c.x));
        toml::to_string(&sorted).map_err(|e| GridError::Sheet(e.to_string()))
    }

    /// Parse a sheet. The region span is re-clamped after parsing.
    pub fn from_toml_str(toml_str: &str) -> GridResult<Self> {
        let mut sheet: CellSheet =
            toml::from_str(toml_str).map_err(|e| GridError::Sheet(e.to_string()))?;
        sheet.region = GridRegion::new(sheet.region.start, sheet.region.span);
        Ok(sheet)
    }
}
