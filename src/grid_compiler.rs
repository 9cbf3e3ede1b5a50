//! Compiles the cell store into floor, ceiling and transition-wall quads.
//!
//! Grid `(x, y)` spans world `[x, x+1] x [y, y+1]` on the XZ plane; elevation is
//! world Y. Front faces wind clockwise, matching the engine's convention, so
//! floors face +Y, ceilings face -Y and walls face the lower neighbor.

use std::collections::HashMap;

use crate::cell_catalog::CellCatalog;
use crate::cell_store::{CellCoord, CellStore};
use crate::debug_log::debug_log;

/// Submesh buckets per cell type: floor, wall, ceiling.
pub const SURFACES_PER_TYPE: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Surface {
    Floor = 0,
    Wall = 1,
    Ceiling = 2,
}

/// Bucket that holds `surface` triangles of cell type `material`.
pub fn bucket_index(material: u32, surface: Surface) -> usize {
    material as usize * SURFACES_PER_TYPE + surface as usize
}

/// One side of a cell. `start -> end` runs along the edge so that, with
/// clockwise winding, the wall faces the neighbor at `offset`.
struct WallEdge {
    offset: (i32, i32),
    start: [f32; 2],
    end: [f32; 2],
}

/// Neighbor edges: +X, -X, +Z, -Z
const WALL_EDGES: [WallEdge; 4] = [
    WallEdge {
        offset: (1, 0),
        start: [1.0, 1.0],
        end: [1.0, 0.0],
    },
    WallEdge {
        offset: (-1, 0),
        start: [0.0, 0.0],
        end: [0.0, 1.0],
    },
    WallEdge {
        offset: (0, 1),
        start: [0.0, 1.0],
        end: [1.0, 1.0],
    },
    WallEdge {
        offset: (0, -1),
        start: [1.0, 0.0],
        end: [0.0, 0.0],
    },
];

const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

/// Counters gathered while compiling, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub floor_quads: usize,
    pub ceiling_quads: usize,
    /// Walls bridging a floor step down to a neighbor
    pub floor_walls: usize,
    /// Walls bridging a ceiling step down to a neighbor
    pub ceiling_walls: usize,
    /// Cells whose material index is outside the catalog
    pub invalid_cells: usize,
}

/// Vertex, UV and per-bucket index buffers of one compile.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompiledMesh {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    /// `3 * catalog.len()` triangle lists, `[t0.floor, t0.wall, t0.ceiling, t1.floor, ...]`
    pub submeshes: Vec<Vec<i32>>,
    pub stats: CompileStats,
}

/// One bucket as a standalone surface with its own vertex buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SurfaceArrays {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<i32>,
}

impl CompiledMesh {
    fn with_buckets(bucket_count: usize) -> Self {
        Self {
            submeshes: vec![Vec::new(); bucket_count],
            ..Self::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.len() / 3).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Extract one bucket, re-indexed from zero. Empty for unknown buckets.
    pub fn surface_arrays(&self, bucket: usize) -> SurfaceArrays {
        let mut surface = SurfaceArrays::default();
        let Some(indices) = self.submeshes.get(bucket) else {
            return surface;
        };

        let mut remap: HashMap<i32, i32> = HashMap::new();
        for &index in indices {
            let local = *remap.entry(index).or_insert_with(|| {
                let i = index as usize;
                surface.vertices.push(self.vertices[i]);
                surface.normals.push(self.normals[i]);
                surface.uvs.push(self.uvs[i]);
                (surface.vertices.len() - 1) as i32
            });
            surface.indices.push(local);
        }
        surface
    }

    fn add_quad(&mut self, bucket: usize, corners: [[f32; 3]; 4], uvs: [[f32; 2]; 4]) {
        let base = self.vertices.len() as i32;
        self.vertices.extend(corners);
        self.uvs.extend(uvs);
        self.submeshes[bucket].extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Vertex normals from triangle winding, accumulated per vertex.
    pub fn recalculate_normals(&mut self) {
        let mut normals = vec![[0.0f32; 3]; self.vertices.len()];

        for tri in self.submeshes.iter().flat_map(|s| s.chunks_exact(3)) {
            let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let v0 = self.vertices[i0];
            let edge1 = sub(self.vertices[i1], v0);
            let edge2 = sub(self.vertices[i2], v0);

            // Clockwise front faces
            let face = cross(edge2, edge1);
            for i in [i0, i1, i2] {
                normals[i] = add(normals[i], face);
            }
        }

        self.normals = normals.into_iter().map(normalize).collect();
    }
}

/// Build the full mesh for the current cells and catalog.
pub fn compile<A>(store: &CellStore, catalog: &CellCatalog<A>) -> CompiledMesh {
    let mut mesh = CompiledMesh::with_buckets(catalog.len() * SURFACES_PER_TYPE);

    // Map order is arbitrary; sort so equal inputs give identical buffers.
    let mut cells: Vec<(CellCoord, u32)> = store.iter().map(|(&c, &m)| (c, m)).collect();
    cells.sort_unstable();

    for (coord, material) in cells {
        let Some(cell_type) = catalog.get(material) else {
            mesh.stats.invalid_cells += 1;
            continue;
        };

        let x0 = coord.x as f32;
        let z0 = coord.y as f32;
        let x1 = x0 + 1.0;
        let z1 = z0 + 1.0;

        if cell_type.has_floor() {
            let h = cell_type.floor_height;
            mesh.add_quad(
                bucket_index(material, Surface::Floor),
                [[x0, h, z0], [x1, h, z0], [x1, h, z1], [x0, h, z1]],
                QUAD_UVS,
            );
            mesh.stats.floor_quads += 1;
        }

        if cell_type.has_ceiling() {
            let h = cell_type.ceiling_height;
            mesh.add_quad(
                bucket_index(material, Surface::Ceiling),
                [[x0, h, z0], [x0, h, z1], [x1, h, z1], [x1, h, z0]],
                [QUAD_UVS[0], QUAD_UVS[3], QUAD_UVS[2], QUAD_UVS[1]],
            );
            mesh.stats.ceiling_quads += 1;
        }

        let wall_bucket = bucket_index(material, Surface::Wall);
        for edge in &WALL_EDGES {
            // No neighbor past the plane edge; it reads as void
            let neighbor_index = coord
                .offset(edge.offset.0, edge.offset.1)
                .filter(|&n| store.contains_valid(n, catalog.len()))
                .and_then(|n| store.get(n).ok());
            let (neighbor_floor, neighbor_ceiling) = catalog.heights_or_void(neighbor_index);

            if neighbor_floor < cell_type.floor_height {
                add_wall(
                    &mut mesh,
                    wall_bucket,
                    coord,
                    edge,
                    neighbor_floor,
                    cell_type.floor_height,
                );
                mesh.stats.floor_walls += 1;
            }
            if neighbor_ceiling < cell_type.ceiling_height {
                add_wall(
                    &mut mesh,
                    wall_bucket,
                    coord,
                    edge,
                    neighbor_ceiling,
                    cell_type.ceiling_height,
                );
                mesh.stats.ceiling_walls += 1;
            }
        }
    }

    mesh.recalculate_normals();

    debug_log(&format!(
        "[compile] {} cells -> {} verts, {} tris, {} buckets ({:?})",
        store.len(),
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.submesh_count(),
        mesh.stats
    ));

    mesh
}

/// Vertical band on one cell edge. V runs from 0 at the bottom to the absolute
/// top height, so texture density follows world elevation rather than band size.
fn add_wall(
    mesh: &mut CompiledMesh,
    bucket: usize,
    coord: CellCoord,
    edge: &WallEdge,
    bottom: f32,
    top: f32,
) {
    let (x, z) = (coord.x as f32, coord.y as f32);
    let a = [x + edge.start[0], z + edge.start[1]];
    let b = [x + edge.end[0], z + edge.end[1]];

    mesh.add_quad(
        bucket,
        [
            [a[0], bottom, a[1]],
            [a[0], top, a[1]],
            [b[0], top, b[1]],
            [b[0], bottom, b[1]],
        ],
        [[0.0, 0.0], [0.0, top], [1.0, top], [1.0, 0.0]],
    );
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn add(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > 1e-10 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 1.0, 0.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_catalog::CellType;

    fn approx(a: [f32; 3], b: [f32; 3]) -> bool {
        (0..3).all(|i| (a[i] - b[i]).abs() < 1e-5)
    }

    fn room_type() -> CellType<&'static str> {
        CellType::new(0.0, 3.0)
            .with_floor("floor")
            .with_wall("wall")
            .with_ceiling("ceiling")
    }

    /// Quads in a bucket, as lists of their four corners.
    fn quads(mesh: &CompiledMesh, bucket: usize) -> Vec<[[f32; 3]; 4]> {
        mesh.submeshes[bucket]
            .chunks_exact(6)
            .map(|q| {
                let base = q[0] as usize;
                [
                    mesh.vertices[base],
                    mesh.vertices[base + 1],
                    mesh.vertices[base + 2],
                    mesh.vertices[base + 3],
                ]
            })
            .collect()
    }

    fn vertical_span(quad: &[[f32; 3]; 4]) -> (f32, f32) {
        let lo = quad.iter().map(|v| v[1]).fold(f32::MAX, f32::min);
        let hi = quad.iter().map(|v| v[1]).fold(f32::MIN, f32::max);
        (lo, hi)
    }

    #[test]
    fn test_single_room_cell() {
        let catalog = CellCatalog::from_entries(vec![room_type()]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(0, 0), 0);

        let mesh = compile(&store, &catalog);

        assert_eq!(mesh.submesh_count(), 3);
        assert_eq!(mesh.stats.floor_quads, 1);
        assert_eq!(mesh.stats.ceiling_quads, 1);
        assert_eq!(mesh.stats.floor_walls, 0);
        assert_eq!(mesh.stats.ceiling_walls, 4);

        let floors = quads(&mesh, 0);
        assert_eq!(floors.len(), 1);
        assert!(floors[0].iter().all(|v| v[1] == 0.0));

        let walls = quads(&mesh, 1);
        assert_eq!(walls.len(), 4);
        for wall in &walls {
            assert_eq!(vertical_span(wall), (0.0, 3.0));
        }

        let ceilings = quads(&mesh, 2);
        assert_eq!(ceilings.len(), 1);
        assert!(ceilings[0].iter().all(|v| v[1] == 3.0));

        // 6 quads, 4 verts each, 2 tris each
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_floor_faces_up_and_ceiling_faces_down() {
        let catalog = CellCatalog::from_entries(vec![room_type()]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(0, 0), 0);

        let mesh = compile(&store, &catalog);

        let floor_vertex = mesh.submeshes[0][0] as usize;
        assert!(approx(mesh.normals[floor_vertex], [0.0, 1.0, 0.0]));

        let ceiling_vertex = mesh.submeshes[2][0] as usize;
        assert!(approx(mesh.normals[ceiling_vertex], [0.0, -1.0, 0.0]));
    }

    #[test]
    fn test_walls_face_the_void() {
        let catalog = CellCatalog::from_entries(vec![CellType::<&str>::new(2.0, 0.0)]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(5, 5), 0);

        let mesh = compile(&store, &catalog);

        let mut outward: Vec<[f32; 3]> = mesh.submeshes[1]
            .chunks_exact(6)
            .map(|q| mesh.normals[q[0] as usize])
            .collect();
        outward.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let mut expected = vec![
            [1.0, 0.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.0, -1.0],
        ];
        expected.sort_by(|a, b| a.partial_cmp(b).unwrap());

        for (got, want) in outward.iter().zip(&expected) {
            assert!(approx(*got, *want), "{:?} vs {:?}", got, want);
        }
    }

    #[test]
    fn test_raised_floor_next_to_void_gets_one_wall_per_edge() {
        let catalog = CellCatalog::from_entries(vec![CellType::new(2.0, 0.0).with_floor("f")]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(0, 0), 0);

        let mesh = compile(&store, &catalog);
        assert_eq!(mesh.stats.floor_walls, 4);
        for wall in quads(&mesh, 1) {
            assert_eq!(vertical_span(&wall), (0.0, 2.0));
        }
    }

    #[test]
    fn test_equal_neighbors_share_no_wall() {
        let catalog = CellCatalog::from_entries(vec![CellType::new(2.0, 0.0).with_floor("f")]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(0, 0), 0);
        store.set(CellCoord::new(1, 0), 0);

        let mesh = compile(&store, &catalog);

        // Each cell has 3 outer edges; the shared edge emits nothing
        assert_eq!(mesh.stats.floor_walls, 6);
        for wall in quads(&mesh, 1) {
            let on_shared_edge = wall.iter().all(|v| v[0] == 1.0);
            assert!(!on_shared_edge);
        }
    }

    #[test]
    fn test_step_emits_wall_only_on_higher_side() {
        let catalog = CellCatalog::from_entries(vec![
            CellType::new(1.0, 0.0).with_floor("low"),
            CellType::new(3.0, 0.0).with_floor("high"),
        ]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(0, 0), 0);
        store.set(CellCoord::new(1, 0), 1);

        let mesh = compile(&store, &catalog);

        let shared: Vec<_> = quads(&mesh, bucket_index(1, Surface::Wall))
            .into_iter()
            .filter(|w| w.iter().all(|v| v[0] == 1.0))
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(vertical_span(&shared[0]), (1.0, 3.0));

        let low_on_shared = quads(&mesh, bucket_index(0, Surface::Wall))
            .into_iter()
            .filter(|w| w.iter().all(|v| v[0] == 1.0))
            .count();
        assert_eq!(low_on_shared, 0);
    }

    #[test]
    fn test_floor_and_ceiling_steps_are_separate_bands() {
        let catalog = CellCatalog::from_entries(vec![
            CellType::<&str>::new(0.0, 2.0),
            CellType::new(1.0, 4.0),
        ]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(0, 0), 0);
        store.set(CellCoord::new(0, 1), 1);

        let mesh = compile(&store, &catalog);

        let mut shared_spans: Vec<(f32, f32)> = quads(&mesh, bucket_index(1, Surface::Wall))
            .iter()
            .filter(|w| w.iter().all(|v| v[2] == 1.0))
            .map(vertical_span)
            .collect();
        shared_spans.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(shared_spans, vec![(0.0, 1.0), (2.0, 4.0)]);
    }

    #[test]
    fn test_invalid_cell_emits_nothing_and_reads_as_void() {
        let catalog = CellCatalog::from_entries(vec![CellType::new(2.0, 0.0).with_floor("f")]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(0, 0), 0);
        store.set(CellCoord::new(1, 0), 7);

        let mesh = compile(&store, &catalog);

        assert_eq!(mesh.stats.invalid_cells, 1);
        assert_eq!(mesh.stats.floor_quads, 1);
        // The invalid neighbor counts as height 0, so all four edges step down
        assert_eq!(mesh.stats.floor_walls, 4);
        assert!(store.contains(CellCoord::new(1, 0)));
        assert!(!store.contains_valid(CellCoord::new(1, 0), catalog.len()));
    }

    #[test]
    fn test_missing_appearances_skip_floor_and_ceiling_but_not_walls() {
        let catalog = CellCatalog::from_entries(vec![CellType::<&str>::new(1.0, 2.0)]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(0, 0), 0);

        let mesh = compile(&store, &catalog);
        assert_eq!(mesh.stats.floor_quads, 0);
        assert_eq!(mesh.stats.ceiling_quads, 0);
        assert_eq!(mesh.stats.floor_walls, 4);
        assert_eq!(mesh.stats.ceiling_walls, 4);
    }

    #[test]
    fn test_wall_uv_uses_absolute_top_height() {
        let catalog = CellCatalog::from_entries(vec![
            CellType::<&str>::new(1.0, 0.0),
            CellType::new(3.0, 0.0),
        ]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(0, 0), 0);
        store.set(CellCoord::new(1, 0), 1);

        let mesh = compile(&store, &catalog);

        let quad = mesh.submeshes[bucket_index(1, Surface::Wall)]
            .chunks_exact(6)
            .find(|q| mesh.vertices[q[0] as usize][0] == 1.0)
            .unwrap();
        let base = quad[0] as usize;
        let vs: Vec<f32> = (0..4).map(|i| mesh.uvs[base + i][1]).collect();
        assert_eq!(vs, vec![0.0, 3.0, 3.0, 0.0]);
    }

    #[test]
    fn test_bucket_count_tracks_catalog_even_when_empty() {
        let catalog: CellCatalog<u8> =
            CellCatalog::from_entries(vec![CellType::default(), CellType::default()]);
        let mesh = compile(&CellStore::new(), &catalog);
        assert_eq!(mesh.submesh_count(), 6);
        assert!(mesh.is_empty());
        assert!(mesh.submeshes.iter().all(|s| s.is_empty()));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let catalog = CellCatalog::from_entries(vec![room_type(), CellType::new(1.0, 2.0)]);
        let mut store = CellStore::new();
        for x in -3..3 {
            for y in -2..2 {
                store.set(CellCoord::new(x, y), ((x + y).rem_euclid(2)) as u32);
            }
        }

        assert_eq!(compile(&store, &catalog), compile(&store, &catalog));
    }

    #[test]
    fn test_surface_arrays_reindex_bucket() {
        let catalog = CellCatalog::from_entries(vec![room_type()]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(0, 0), 0);

        let mesh = compile(&store, &catalog);
        let walls = mesh.surface_arrays(bucket_index(0, Surface::Wall));

        assert_eq!(walls.vertices.len(), 16);
        assert_eq!(walls.normals.len(), 16);
        assert_eq!(walls.uvs.len(), 16);
        assert_eq!(walls.indices.len(), 24);
        assert!(walls.indices.iter().all(|&i| (i as usize) < walls.vertices.len()));

        assert_eq!(mesh.surface_arrays(99), SurfaceArrays::default());
    }

    #[test]
    fn test_cells_on_plane_edge_see_void_past_it() {
        let catalog = CellCatalog::from_entries(vec![
            CellType::new(2.0, 0.0).with_floor("low"),
            CellType::new(5.0, 0.0).with_floor("high"),
        ]);
        let mut store = CellStore::new();
        store.set(CellCoord::new(i32::MAX, 0), 0);
        store.set(CellCoord::new(i32::MIN, 0), 1);
        store.set(CellCoord::new(0, i32::MAX), 0);
        store.set(CellCoord::new(0, i32::MIN), 1);

        let mesh = compile(&store, &catalog);

        // Nothing wraps around to the opposite edge
        assert_eq!(mesh.stats.floor_quads, 4);
        assert_eq!(mesh.stats.floor_walls, 16);
        for wall in quads(&mesh, bucket_index(0, Surface::Wall)) {
            assert_eq!(vertical_span(&wall), (0.0, 2.0));
        }
    }
}
