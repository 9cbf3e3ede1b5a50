use serde::{Deserialize, Serialize};

use crate::cell_store::CellCoord;

/// Editable rectangle shown by editing tools. The compiler ignores it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRegion {
    pub start: CellCoord,
    /// Cells per axis, always at least 1
    pub span: CellCoord,
}

impl Default for GridRegion {
    fn default() -> Self {
        Self {
            start: CellCoord::new(0, 0),
            span: CellCoord::new(16, 16),
        }
    }
}

impl GridRegion {
    pub fn new(start: CellCoord, span: CellCoord) -> Self {
        Self {
            start,
            span: clamp_span(span),
        }
    }

    pub fn set_start(&mut self, start: CellCoord) {
        self.start = start;
    }

    pub fn set_span(&mut self, span: CellCoord) {
        self.span = clamp_span(span);
    }

    /// Exclusive far corner, saturated at `i32::MAX`
    pub fn end(&self) -> CellCoord {
        CellCoord::new(
            self.start.x.saturating_add(self.span.x),
            self.start.y.saturating_add(self.span.y),
        )
    }

    pub fn contains(&self, coord: CellCoord) -> bool {
        within(coord.x, self.start.x, self.span.x) && within(coord.y, self.start.y, self.span.y)
    }
}

fn within(v: i32, start: i32, span: i32) -> bool {
    let (v, start) = (i64::from(v), i64::from(start));
    v >= start && v < start + i64::from(span)
}

fn clamp_span(span: CellCoord) -> CellCoord {
    CellCoord::new(span.x.max(1), span.y.max(1))
}
