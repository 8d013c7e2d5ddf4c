/// Vertex fetch optimization.
///
/// Renumbers vertices in the order the index buffer first references
/// them, so the vertex fetch walks memory mostly linearly. Vertices no
/// index refers to are dropped.

use super::remap::UNUSED;
use super::vertex::Vertex;

/// Reorder `vertices` by first use and rewrite `indices` in place.
///
/// Returns the new vertex buffer, possibly shorter than the input.
pub fn optimize_vertex_fetch(indices: &mut [u32], vertices: &[Vertex]) -> Vec<Vertex> {
    let mut remap = vec![UNUSED; vertices.len()];
    let mut result = Vec::with_capacity(vertices.len());

    for index in indices.iter_mut() {
        let old = *index as usize;
        if remap[old] == UNUSED {
            remap[old] = result.len() as u32;
            result.push(vertices[old]);
        }
        *index = remap[old];
    }

    result
}
