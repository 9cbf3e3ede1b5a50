use godot::classes::{Material, Resource};
use godot::prelude::*;

use crate::cell_catalog::CellType;

/// One entry of a grid's cell catalog, edited in the inspector.
#[derive(GodotClass)]
#[class(base=Resource, init, tool)]
pub struct GridCellType {
    base: Base<Resource>,

    /// Swatch color used by editing tools.
    #[export]
    #[init(val = Color::from_rgba(1.0, 1.0, 1.0, 1.0))]
    pub color: Color,

    /// Floor elevation in world units. Negative values are treated as 0.
    #[export]
    #[init(val = 0.0)]
    pub floor_height: f32,

    /// Ceiling elevation in world units. 0 disables the ceiling.
    #[export]
    #[init(val = 0.0)]
    pub ceiling_height: f32,

    #[export]
    pub floor_material: Option<Gd<Material>>,

    #[export]
    pub wall_material: Option<Gd<Material>>,

    #[export]
    pub ceiling_material: Option<Gd<Material>>,
}

#[godot_api]
impl GridCellType {
    /// Whether this type draws a ceiling at all.
    #[func]
    pub fn has_ceiling(&self) -> bool {
        self.to_cell_type().has_ceiling()
    }
}

impl GridCellType {
    /// Snapshot as a core catalog entry, heights clamped.
    pub fn to_cell_type(&self) -> CellType<Gd<Material>> {
        let mut cell_type = CellType::new(self.floor_height, self.ceiling_height)
            .with_color([self.color.r, self.color.g, self.color.b, self.color.a]);
        cell_type.floor = self.floor_material.clone();
        cell_type.wall = self.wall_material.clone();
        cell_type.ceiling = self.ceiling_material.clone();
        cell_type
    }
}
