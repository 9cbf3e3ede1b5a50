//! Ordered list of cell types. A cell's material index selects an entry here.

/// Editor swatch color for cells with no preference.
pub const DEFAULT_CELL_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// One cell type: elevations plus the appearances used for each surface.
/// `A` is the engine's appearance handle; tests use plain values.
#[derive(Clone, Debug, PartialEq)]
pub struct CellType<A> {
    /// Editor-only swatch color (RGBA)
    pub color: [f32; 4],
    pub floor_height: f32,
    pub ceiling_height: f32,
    pub floor: Option<A>,
    /// Walls are emitted with or without this; it only picks what they look like.
    pub wall: Option<A>,
    pub ceiling: Option<A>,
}

impl<A> Default for CellType<A> {
    fn default() -> Self {
        Self {
            color: DEFAULT_CELL_COLOR,
            floor_height: 0.0,
            ceiling_height: 0.0,
            floor: None,
            wall: None,
            ceiling: None,
        }
    }
}

impl<A> CellType<A> {
    pub fn new(floor_height: f32, ceiling_height: f32) -> Self {
        let mut cell_type = Self {
            floor_height,
            ceiling_height,
            ..Self::default()
        };
        cell_type.clamp_heights();
        cell_type
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_floor(mut self, appearance: A) -> Self {
        self.floor = Some(appearance);
        self
    }

    pub fn with_wall(mut self, appearance: A) -> Self {
        self.wall = Some(appearance);
        self
    }

    pub fn with_ceiling(mut self, appearance: A) -> Self {
        self.ceiling = Some(appearance);
        self
    }

    /// Negative (and NaN) heights become zero.
    pub fn clamp_heights(&mut self) {
        self.floor_height = clamp_height(self.floor_height);
        self.ceiling_height = clamp_height(self.ceiling_height);
    }

    pub fn has_floor(&self) -> bool {
        self.floor.is_some()
    }

    /// A ceiling needs both an appearance and a positive height.
    pub fn has_ceiling(&self) -> bool {
        self.ceiling.is_some() && self.ceiling_height > 0.0
    }
}

fn clamp_height(height: f32) -> f32 {
    if height > 0.0 {
        height
    } else {
        0.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CellCatalog<A> {
    entries: Vec<CellType<A>>,
}

impl<A> Default for CellCatalog<A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<A> CellCatalog<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries, clamping their heights.
    pub fn from_entries(entries: Vec<CellType<A>>) -> Self {
        let mut catalog = Self { entries };
        catalog.validate();
        catalog
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&CellType<A>> {
        self.entries.get(index as usize)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut CellType<A>> {
        self.entries.get_mut(index as usize)
    }

    pub fn push(&mut self, mut cell_type: CellType<A>) -> u32 {
        cell_type.clamp_heights();
        self.entries.push(cell_type);
        (self.entries.len() - 1) as u32
    }

    /// Remove an entry. Cells that pointed past the new end become invalid, not deleted.
    pub fn remove(&mut self, index: u32) -> Option<CellType<A>> {
        let index = index as usize;
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CellType<A>> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[CellType<A>] {
        &self.entries
    }

    /// Clamp every entry's heights. Run after any inspector edit.
    pub fn validate(&mut self) {
        for entry in &mut self.entries {
            entry.clamp_heights();
        }
    }

    /// Floor and ceiling heights of a valid index, or (0, 0) for void and invalid indices.
    pub fn heights_or_void(&self, index: Option<u32>) -> (f32, f32) {
        index
            .and_then(|i| self.get(i))
            .map_or((0.0, 0.0), |t| (t.floor_height, t.ceiling_height))
    }
}
