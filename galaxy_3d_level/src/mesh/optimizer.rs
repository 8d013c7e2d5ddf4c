/// Mesh optimization pipeline.
///
/// Raw imported geometry -> deduplicated vertices -> vertex cache order ->
/// overdraw order -> vertex fetch order -> LOD chain.

use crate::config::MeshOptimizerConfig;
use super::lod::{generate_lods, LodChain};
use super::overdraw::optimize_overdraw;
use super::remap::{generate_vertex_remap, remap_index_buffer, remap_vertex_buffer};
use super::vertex::Vertex;
use super::vertex_cache::optimize_vertex_cache;
use super::vertex_fetch::optimize_vertex_fetch;

/// Result of [`optimize_mesh`]
#[derive(Debug, Clone, Default)]
pub struct OptimizedMesh {
    /// Unique vertices in fetch order
    pub vertices: Vec<Vertex>,
    /// LOD0 is the full optimized index buffer
    pub lods: LodChain,
}

impl OptimizedMesh {
    /// Full detail index buffer
    pub fn indices(&self) -> &[u32] {
        self.lods.lods.first().map(|lod| lod.as_slice()).unwrap_or(&[])
    }
}

/// Optimize one mesh and build its LOD chain.
///
/// Pure function over the geometry. `raw_indices.len()` must be a
/// multiple of three and every index must address `raw_vertices`.
pub fn optimize_mesh(
    raw_vertices: &[Vertex],
    raw_indices: &[u32],
    config: &MeshOptimizerConfig,
) -> OptimizedMesh {
    let (unique_count, remap) = generate_vertex_remap(raw_vertices, raw_indices);
    let indices = remap_index_buffer(raw_indices, &remap);
    let vertices = remap_vertex_buffer(raw_vertices, unique_count, &remap);

    let indices = optimize_vertex_cache(&indices, vertices.len());
    let mut indices = optimize_overdraw(&indices, &vertices, config.overdraw_threshold);
    let vertices = optimize_vertex_fetch(&mut indices, &vertices);

    let lods = generate_lods(&indices, &vertices, &config.lod);

    OptimizedMesh { vertices, lods }
}
