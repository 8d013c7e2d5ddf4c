/// Vertex deduplication.
///
/// Imported meshes usually arrive with one vertex per face corner. The
/// remap table collapses corners whose attributes are bit-identical into
/// a single unique vertex.

use rustc_hash::FxHashMap;
use super::vertex::Vertex;

/// Marker for raw vertices no index refers to
pub const UNUSED: u32 = u32::MAX;

/// Build the remap table for a raw vertex/index pair.
///
/// Returns `(unique_vertex_count, remap)` where `remap[raw]` is the new
/// index of raw vertex `raw`, or [`UNUSED`] if no index references it.
/// New indices are assigned in order of first reference.
pub fn generate_vertex_remap(vertices: &[Vertex], indices: &[u32]) -> (usize, Vec<u32>) {
    let mut remap = vec![UNUSED; vertices.len()];
    let mut unique: FxHashMap<[u32; 8], u32> = FxHashMap::default();
    unique.reserve(vertices.len());

    let mut next = 0u32;
    for &index in indices {
        let raw = index as usize;
        debug_assert!(raw < vertices.len(), "index {} out of range", raw);
        if remap[raw] != UNUSED {
            continue;
        }

        let id = *unique.entry(vertices[raw].bits()).or_insert_with(|| {
            let id = next;
            next += 1;
            id
        });
        remap[raw] = id;
    }

    (next as usize, remap)
}

/// Rewrite an index buffer through a remap table
pub fn remap_index_buffer(indices: &[u32], remap: &[u32]) -> Vec<u32> {
    indices.iter().map(|&i| remap[i as usize]).collect()
}

/// Scatter raw vertices into a deduplicated vertex buffer
pub fn remap_vertex_buffer(vertices: &[Vertex], unique_count: usize, remap: &[u32]) -> Vec<Vertex> {
    let mut result = vec![Vertex::default(); unique_count];
    for (vertex, &target) in vertices.iter().zip(remap) {
        if target != UNUSED {
            result[target as usize] = *vertex;
        }
    }
    result
}
