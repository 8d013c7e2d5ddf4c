/// LOD chain generation.

use crate::config::LodConfig;
use super::simplify::{simplify, simplify_sloppy};
use super::vertex::Vertex;
use super::vertex_cache::optimize_vertex_cache;

/// Index sets of one mesh, from full detail (LOD0) to coarsest
#[derive(Debug, Clone, Default)]
pub struct LodChain {
    /// `lods[0]` is the full optimized index set; counts never increase
    pub lods: Vec<Vec<u32>>,
    /// The chain stopped while the coarsest LOD was still above the
    /// target index count
    pub exhausted: bool,
}

impl LodChain {
    pub fn len(&self) -> usize {
        self.lods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lods.is_empty()
    }

    /// Index counts of every level, in order
    pub fn index_counts(&self) -> Vec<usize> {
        self.lods.iter().map(|lod| lod.len()).collect()
    }
}

fn made_progress(result: &[u32], input: usize, min_reduction: f32) -> bool {
    !result.is_empty() && (result.len() as f32) < input as f32 * min_reduction
}

/// Build the LOD chain of an optimized mesh.
///
/// Each level halves the previous one with the topology-preserving
/// simplifier. Once at least one simplified level exists, a stalled
/// simplification falls back to the sloppy simplifier; if that stalls too
/// the chain ends. Every new level is re-optimized for the vertex cache.
pub fn generate_lods(indices: &[u32], vertices: &[Vertex], config: &LodConfig) -> LodChain {
    let mut lods = vec![indices.to_vec()];
    let max_lods = config.max_lods.max(1);

    loop {
        let current = &lods[lods.len() - 1];
        if current.len() <= config.target_index_count || lods.len() >= max_lods {
            break;
        }

        let target = current.len() / 6 * 3;
        let mut next = simplify(current, vertices, target, config.target_error);

        if !made_progress(&next, current.len(), config.min_reduction) {
            if lods.len() < 2 {
                break;
            }
            next = simplify_sloppy(current, vertices, target);
            if !made_progress(&next, current.len(), config.min_reduction) {
                break;
            }
        }

        lods.push(optimize_vertex_cache(&next, vertices.len()));
    }

    let exhausted = lods[lods.len() - 1].len() > config.target_index_count;
    LodChain { lods, exhausted }
}
