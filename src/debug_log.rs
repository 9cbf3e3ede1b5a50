//! Debug logging for grid compilation and persistence.
//!
//! Writes to `debug_grid.log` in the working directory.
//! The log file is recreated on each `init_debug_log()` call; until then
//! messages are dropped, which keeps pure-Rust tests quiet.

use std::fs::File;
use std::io::Write;
use std::sync::Mutex;

use crate::grid_compiler::CompiledMesh;

lazy_static::lazy_static! {
    static ref DEBUG_LOG: Mutex<Option<File>> = Mutex::new(None);
}

/// Log a debug message to the grid debug log file
pub fn debug_log(msg: &str) {
    if let Ok(mut guard) = DEBUG_LOG.lock() {
        if let Some(ref mut file) = *guard {
            let _ = writeln!(file, "{}", msg);
            let _ = file.flush();
        }
    }
}

/// Initialize the debug log file (overwrites any existing log)
pub fn init_debug_log() {
    if let Ok(mut guard) = DEBUG_LOG.lock() {
        *guard = File::create("debug_grid.log").ok();
        if let Some(ref mut file) = *guard {
            let _ = writeln!(file, "=== GRID BUILDER DEBUG LOG ===");
            let _ = writeln!(file, "Timestamp: {:?}", std::time::SystemTime::now());
            let _ = writeln!(file);
        }
    }
}

/// Close the debug log file. Later messages are dropped.
pub fn close_debug_log() {
    if let Ok(mut guard) = DEBUG_LOG.lock() {
        *guard = None;
    }
}

/// One line per compile: quad and wall counts plus cells skipped for a bad type index.
pub fn log_compile(compile: u64, cells: usize, mesh: &CompiledMesh) {
    let stats = mesh.stats;
    debug_log(&format_compile(compile, cells, mesh));
    if stats.invalid_cells > 0 {
        debug_log(&format!(
            "[compile #{}] {} cells reference a missing cell type",
            compile, stats.invalid_cells
        ));
    }
}

fn format_compile(compile: u64, cells: usize, mesh: &CompiledMesh) -> String {
    let stats = mesh.stats;
    format!(
        "[compile #{}] {} cells -> floors={} ceilings={} walls={}+{} verts={} buckets={}",
        compile,
        cells,
        stats.floor_quads,
        stats.ceiling_quads,
        stats.floor_walls,
        stats.ceiling_walls,
        mesh.vertex_count(),
        mesh.submesh_count()
    )
}

/// Statistics about normals in a mesh
#[derive(Debug)]
pub struct NormalStats {
    pub min_len: f32,
    pub max_len: f32,
    pub degenerate_count: usize,
}

/// Compute statistics about normal vectors
/// A normal is considered degenerate if its length is not close to 1.0
pub fn compute_normal_stats(normals: &[[f32; 3]]) -> NormalStats {
    let mut min_len = f32::MAX;
    let mut max_len = f32::MIN;
    let mut degenerate_count = 0;

    for n in normals {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        min_len = min_len.min(len);
        max_len = max_len.max(len);

        if !(0.99..=1.01).contains(&len) || len.is_nan() {
            degenerate_count += 1;
        }
    }

    if normals.is_empty() {
        min_len = 0.0;
        max_len = 0.0;
    }

    NormalStats {
        min_len,
        max_len,
        degenerate_count,
    }
}
