use godot::classes::mesh::PrimitiveType;
use godot::classes::notify::Node3DNotification;
use godot::classes::rendering_server::ArrayType;
use godot::classes::{
    ArrayMesh, CollisionShape3D, ConcavePolygonShape3D, Engine, IMeshInstance3D, Material,
    MeshInstance3D, Shape3D,
};
use godot::global::Error;
use godot::prelude::*;

use crate::cell_catalog::{CellCatalog, CellType};
use crate::cell_codec::CellRecord;
use crate::cell_sheet::CellSheet;
use crate::cell_store::CellCoord;
use crate::cell_type_resource::GridCellType;
use crate::debug_log::{compute_normal_stats, debug_log, init_debug_log};
use crate::grid::Grid;
use crate::grid_compiler::{CompiledMesh, SurfaceArrays};

type VariantArray = Array<Variant>;

/// Grid of floor/ceiling cells compiled into a mesh with transition walls.
/// Cells are edited through the `*_cell` methods; the mesh is rebuilt at most once per frame.
#[derive(GodotClass)]
#[class(base=MeshInstance3D, init, tool)]
pub struct GridBuilder {
    base: Base<MeshInstance3D>,

    /// First cell of the editable region (editing tools only).
    #[export]
    #[init(val = Vector2i::new(0, 0))]
    region_start: Vector2i,

    /// Size of the editable region in cells, at least 1 per axis.
    #[export]
    #[init(val = Vector2i::new(16, 16))]
    region_span: Vector2i,

    /// Cell types; a cell's index selects an entry. Empty slots act as bare types.
    #[export]
    cell_types: Array<Option<Gd<GridCellType>>>,

    /// Persisted cells as (x, y, cell type index).
    #[export]
    cell_records: Array<Vector3i>,

    /// Receives a trimesh shape of the compiled mesh.
    #[export]
    collision_shape: Option<Gd<CollisionShape3D>>,

    /// Unwrap a lightmap UV2 layout after each compile (editor only).
    #[export]
    #[init(val = true)]
    generate_lightmap_uv: bool,

    #[export]
    #[init(val = 0.2)]
    lightmap_texel_size: f32,

    /// Write compile and persistence details to `debug_grid.log`.
    #[export]
    #[init(val = false)]
    debug_logging: bool,

    grid: Grid<Gd<Material>>,
}

#[godot_api]
impl IMeshInstance3D for GridBuilder {
    fn ready(&mut self) {
        if self.debug_logging {
            init_debug_log();
        }

        self.sync_catalog();
        self.sync_region();

        let records = self.persisted_records();
        let duplicates = self.grid.load_records(records);
        if duplicates > 0 {
            godot_warn!(
                "GridBuilder: {} duplicate cell records in saved data, kept the last of each",
                duplicates
            );
        }

        self.grid.activate();
        godot_print!(
            "GridBuilder ready: {} cells, {} cell types",
            self.grid.cell_count(),
            self.grid.catalog().len()
        );
    }

    fn process(&mut self, _delta: f64) {
        self.sync_catalog();
        self.sync_region();

        if self.grid.process_tick().is_some() {
            self.push_mesh();
        }
    }

    fn on_notification(&mut self, what: Node3DNotification) {
        if what == Node3DNotification::EDITOR_PRE_SAVE {
            self.flush_records();
        }
    }
}

#[godot_api]
impl GridBuilder {
    #[func]
    pub fn has_cell(&self, coords: Vector2i) -> bool {
        self.grid.contains(to_coord(coords))
    }

    /// True if the cell exists and its type index is in range.
    #[func]
    pub fn has_valid_cell(&self, coords: Vector2i) -> bool {
        self.grid.contains_valid(to_coord(coords))
    }

    /// Cell type index at `coords`, or -1 (with an error) if there is no cell.
    #[func]
    pub fn get_cell(&self, coords: Vector2i) -> i32 {
        match self.grid.get(to_coord(coords)) {
            Ok(index) => index as i32,
            Err(e) => {
                godot_error!("GridBuilder: {}", e);
                -1
            }
        }
    }

    #[func]
    pub fn set_cell(&mut self, coords: Vector2i, index: i32) {
        if index < 0 {
            godot_warn!("GridBuilder: ignoring negative cell type {} at {}", index, coords);
            return;
        }
        self.grid.set(to_coord(coords), index as u32);
    }

    #[func]
    pub fn remove_cell(&mut self, coords: Vector2i) {
        self.grid.remove(to_coord(coords));
    }

    #[func]
    pub fn clear_cells(&mut self) {
        self.grid.clear_cells();
    }

    #[func]
    pub fn cell_count(&self) -> i32 {
        i32::try_from(self.grid.cell_count()).unwrap_or(i32::MAX)
    }

    /// Smallest rectangle covering every cell; zero-sized when the grid is empty.
    #[func]
    pub fn get_bounds(&self) -> Rect2i {
        match self.grid.bounds() {
            Some((min, max)) => Rect2i::new(
                Vector2i::new(min.x, min.y),
                Vector2i::new(
                    max.x.saturating_sub(min.x).saturating_add(1),
                    max.y.saturating_sub(min.y).saturating_add(1),
                ),
            ),
            None => Rect2i::default(),
        }
    }

    /// Schedule a rebuild on the next frame.
    #[func]
    pub fn rebuild(&mut self) {
        self.grid.force_rebuild();
    }

    /// Region and cells as a TOML layout sheet, or an empty string on failure.
    #[func]
    pub fn export_sheet(&self) -> GString {
        match self.grid.to_sheet().to_toml_string() {
            Ok(text) => GString::from(text.as_str()),
            Err(e) => {
                godot_error!("GridBuilder: {}", e);
                GString::new()
            }
        }
    }

    /// Replace region and cells from a TOML layout sheet.
    #[func]
    pub fn import_sheet(&mut self, text: GString) -> bool {
        let sheet = match CellSheet::from_toml_str(&text.to_string()) {
            Ok(sheet) => sheet,
            Err(e) => {
                godot_error!("GridBuilder: {}", e);
                return false;
            }
        };

        let region = sheet.region;
        let duplicates = self.grid.apply_sheet(sheet);
        if duplicates > 0 {
            godot_warn!("GridBuilder: sheet had {} duplicate cells", duplicates);
        }
        self.region_start = Vector2i::new(region.start.x, region.start.y);
        self.region_span = Vector2i::new(region.span.x, region.span.y);
        true
    }
}

impl GridBuilder {
    /// Snapshot the inspector's cell types into the core catalog.
    fn sync_catalog(&mut self) {
        let entries: Vec<CellType<Gd<Material>>> = self
            .cell_types
            .iter_shared()
            .map(|slot| match slot {
                Some(cell_type) => cell_type.bind().to_cell_type(),
                None => CellType::default(),
            })
            .collect();
        self.grid.set_catalog(CellCatalog::from_entries(entries));
    }

    fn sync_region(&mut self) {
        self.grid
            .set_region(to_coord(self.region_start), to_coord(self.region_span));
        let span = self.grid.region().span;
        self.region_span = Vector2i::new(span.x, span.y);
    }

    fn persisted_records(&self) -> Vec<CellRecord> {
        let mut skipped = 0;
        let records = self
            .cell_records
            .iter_shared()
            .filter_map(|r| {
                if r.z < 0 {
                    skipped += 1;
                    return None;
                }
                Some(CellRecord::new(CellCoord::new(r.x, r.y), r.z as u32))
            })
            .collect();
        if skipped > 0 {
            godot_warn!("GridBuilder: skipped {} records with a negative cell type", skipped);
        }
        records
    }

    /// Re-encode the persisted cell list if cells changed since the last save.
    fn flush_records(&mut self) {
        if !self.grid.needs_persist() {
            return;
        }
        self.cell_records = self
            .grid
            .records()
            .iter()
            .map(|r| Vector3i::new(r.x, r.y, r.material as i32))
            .collect();
        debug_log(&format!("[save] wrote {} cell records", self.cell_records.len()));
    }

    /// Hand the compiled mesh to the mesh slot and the collision shape.
    fn push_mesh(&mut self) {
        let compiled = self.grid.mesh();
        let (mut mesh, surface_buckets) = build_array_mesh(compiled);
        let vertex_count = compiled.vertex_count();
        let triangle_count = compiled.triangle_count();
        let stats = compute_normal_stats(&compiled.normals);

        if self.generate_lightmap_uv && vertex_count > 0 && Engine::singleton().is_editor_hint() {
            let transform = self.base().get_global_transform();
            let result = mesh.lightmap_unwrap(transform, self.lightmap_texel_size);
            if result != Error::OK {
                godot_warn!("GridBuilder: lightmap unwrap failed: {:?}", result);
            }
        }

        // Empty buckets produce no surface, so bind by bucket index
        let appearances = self.grid.appearances();
        for (surface, &bucket) in surface_buckets.iter().enumerate() {
            if let Some(Some(material)) = appearances.get(bucket) {
                mesh.surface_set_material(surface as i32, material);
            }
        }

        if let Some(mut shape) = self.collision_shape.clone() {
            let trimesh = mesh
                .create_trimesh_shape()
                .unwrap_or_else(ConcavePolygonShape3D::new_gd);
            shape.set_shape(&trimesh.upcast::<Shape3D>());
        }

        self.base_mut().set_mesh(&mesh);

        if stats.degenerate_count > 0 {
            godot_warn!(
                "GridBuilder: {} degenerate normals in compiled mesh",
                stats.degenerate_count
            );
        }
        debug_log(&format!(
            "[push_mesh] {} verts, {} tris, {} surfaces, normal len {:.3}..{:.3}",
            vertex_count,
            triangle_count,
            surface_buckets.len(),
            stats.min_len,
            stats.max_len
        ));
    }
}

fn to_coord(v: Vector2i) -> CellCoord {
    CellCoord::new(v.x, v.y)
}

/// One surface per non-empty bucket. Returns the mesh and the bucket behind each surface.
fn build_array_mesh(compiled: &CompiledMesh) -> (Gd<ArrayMesh>, Vec<usize>) {
    let mut mesh = ArrayMesh::new_gd();
    let mut surface_buckets = Vec::new();

    for bucket in 0..compiled.submesh_count() {
        let surface = compiled.surface_arrays(bucket);
        if surface.indices.is_empty() {
            continue;
        }
        mesh.add_surface_from_arrays(PrimitiveType::TRIANGLES, &surface_to_arrays(&surface));
        surface_buckets.push(bucket);
    }

    (mesh, surface_buckets)
}

fn surface_to_arrays(surface: &SurfaceArrays) -> VariantArray {
    let vertices: Vec<Vector3> = surface
        .vertices
        .iter()
        .map(|v| Vector3::new(v[0], v[1], v[2]))
        .collect();
    let normals: Vec<Vector3> = surface
        .normals
        .iter()
        .map(|n| Vector3::new(n[0], n[1], n[2]))
        .collect();
    let uvs: Vec<Vector2> = surface.uvs.iter().map(|uv| Vector2::new(uv[0], uv[1])).collect();

    let packed_vertices = PackedVector3Array::from(&vertices[..]);
    let packed_normals = PackedVector3Array::from(&normals[..]);
    let packed_uvs = PackedVector2Array::from(&uvs[..]);
    let packed_indices = PackedInt32Array::from(&surface.indices[..]);

    // All slots up to MAX must be present
    let num_arrays = ArrayType::MAX.ord() as usize;
    let mut arrays: VariantArray = VariantArray::new();

    for i in 0..num_arrays {
        if i == ArrayType::VERTEX.ord() as usize {
            arrays.push(&packed_vertices.to_variant());
        } else if i == ArrayType::NORMAL.ord() as usize {
            arrays.push(&packed_normals.to_variant());
        } else if i == ArrayType::TEX_UV.ord() as usize {
            arrays.push(&packed_uvs.to_variant());
        } else if i == ArrayType::INDEX.ord() as usize {
            arrays.push(&packed_indices.to_variant());
        } else {
            arrays.push(&Variant::nil());
        }
    }

    arrays
}
