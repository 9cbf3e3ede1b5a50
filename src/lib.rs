use godot::prelude::*;

pub mod appearance;
pub mod catalog_watcher;
pub mod cell_catalog;
pub mod cell_codec;
pub mod cell_sheet;
pub mod cell_store;
mod cell_type_resource;
pub mod debug_log;
pub mod error;
pub mod grid;
pub mod grid_compiler;
mod grid_node;
pub mod grid_region;

pub use cell_catalog::{CellCatalog, CellType};
pub use cell_store::CellCoord;
pub use error::{GridError, GridResult};
pub use grid::Grid;
pub use grid_compiler::CompiledMesh;

struct GridBuilderExtension;

#[gdextension]
unsafe impl ExtensionLibrary for GridBuilderExtension {}
