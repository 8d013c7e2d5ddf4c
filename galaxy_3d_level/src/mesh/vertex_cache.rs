/// Post-transform vertex cache optimization.
///
/// Reorders triangles with Tom Forsyth's linear-speed algorithm: every
/// vertex gets a score from its position in a simulated LRU cache and
/// from the number of triangles still waiting for it, and the
/// highest-scoring triangle next to the cache is emitted greedily.

const CACHE_SIZE: usize = 32;
const CACHE_DECAY_POWER: f32 = 1.5;
const LAST_TRIANGLE_SCORE: f32 = 0.75;
const VALENCE_BOOST_SCALE: f32 = 2.0;
const VALENCE_BOOST_POWER: f32 = 0.5;

/// FIFO cache size used for statistics (typical hardware)
pub const DEFAULT_FIFO_SIZE: usize = 16;

fn vertex_score(cache_position: Option<usize>, live_triangles: u32) -> f32 {
    if live_triangles == 0 {
        return -1.0;
    }

    let cache_score = match cache_position {
        None => 0.0,
        // The three vertices of the last triangle get a fixed score so
        // the next triangle does not simply reuse the same edge forever
        Some(position) if position < 3 => LAST_TRIANGLE_SCORE,
        Some(position) => {
            let scaler = 1.0 / (CACHE_SIZE - 3) as f32;
            (1.0 - (position - 3) as f32 * scaler).powf(CACHE_DECAY_POWER)
        }
    };

    cache_score + VALENCE_BOOST_SCALE * (live_triangles as f32).powf(-VALENCE_BOOST_POWER)
}

/// Reorder triangles for vertex cache locality.
///
/// Returns a new index buffer containing the same triangles (same corner
/// order inside each triangle) in a cache-friendly order.
pub fn optimize_vertex_cache(indices: &[u32], vertex_count: usize) -> Vec<u32> {
    debug_assert!(indices.len() % 3 == 0);
    let face_count = indices.len() / 3;
    if face_count == 0 {
        return Vec::new();
    }

    // Vertex -> triangle adjacency, stored as one flat array
    let mut live = vec![0u32; vertex_count];
    for &index in indices {
        live[index as usize] += 1;
    }

    let mut offsets = vec![0usize; vertex_count + 1];
    for v in 0..vertex_count {
        offsets[v + 1] = offsets[v] + live[v] as usize;
    }

    let mut fill = offsets.clone();
    let mut adjacency = vec![0u32; indices.len()];
    for (face, triangle) in indices.chunks_exact(3).enumerate() {
        for &v in triangle {
            adjacency[fill[v as usize]] = face as u32;
            fill[v as usize] += 1;
        }
    }

    let mut cache_position: Vec<Option<usize>> = vec![None; vertex_count];
    let mut vertex_scores: Vec<f32> = live.iter().map(|&l| vertex_score(None, l)).collect();
    let mut face_scores: Vec<f32> = indices
        .chunks_exact(3)
        .map(|t| t.iter().map(|&v| vertex_scores[v as usize]).sum())
        .collect();

    let mut emitted = vec![false; face_count];
    let mut cache: Vec<u32> = Vec::with_capacity(CACHE_SIZE + 3);
    let mut result = Vec::with_capacity(indices.len());
    let mut input_cursor = 0usize;

    let mut best_face = face_scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(face, _)| face);

    for _ in 0..face_count {
        let face = match best_face {
            Some(face) => face,
            None => {
                // Dead end: nothing adjacent to the cache, resume in input order
                while emitted[input_cursor] {
                    input_cursor += 1;
                }
                input_cursor
            }
        };

        let triangle = [indices[face * 3], indices[face * 3 + 1], indices[face * 3 + 2]];
        result.extend_from_slice(&triangle);
        emitted[face] = true;

        for &v in &triangle {
            let v = v as usize;
            let start = offsets[v];
            let end = start + live[v] as usize;
            if let Some(slot) = adjacency[start..end].iter().position(|&f| f as usize == face) {
                adjacency.swap(start + slot, end - 1);
                live[v] -= 1;
            }
        }

        // Triangle vertices move to the front; everything else shifts back
        let mut new_cache: Vec<u32> = Vec::with_capacity(CACHE_SIZE + 3);
        for &v in &triangle {
            if !new_cache.contains(&v) {
                new_cache.push(v);
            }
        }
        for &v in &cache {
            if !triangle.contains(&v) {
                new_cache.push(v);
            }
        }

        for (position, &v) in new_cache.iter().enumerate() {
            let v = v as usize;
            cache_position[v] = if position < CACHE_SIZE { Some(position) } else { None };
            vertex_scores[v] = vertex_score(cache_position[v], live[v]);
        }

        best_face = None;
        let mut best_score = f32::NEG_INFINITY;
        for &v in &new_cache {
            let v = v as usize;
            let start = offsets[v];
            for &f in &adjacency[start..start + live[v] as usize] {
                let f = f as usize;
                let score = vertex_scores[indices[f * 3] as usize]
                    + vertex_scores[indices[f * 3 + 1] as usize]
                    + vertex_scores[indices[f * 3 + 2] as usize];
                face_scores[f] = score;
                if score > best_score {
                    best_score = score;
                    best_face = Some(f);
                }
            }
        }

        new_cache.truncate(CACHE_SIZE);
        cache = new_cache;
    }

    result
}

/// FIFO cache simulation results
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexCacheStatistics {
    /// Number of vertex shader invocations
    pub vertices_transformed: u32,
    /// Average cache miss ratio: transformed vertices per triangle (0.5 .. 3)
    pub acmr: f32,
    /// Average transformed vertex ratio: transformed per unique vertex (1 .. )
    pub atvr: f32,
}

/// Simulate a FIFO post-transform cache over an index buffer
pub fn analyze_vertex_cache(indices: &[u32], vertex_count: usize, cache_size: usize) -> VertexCacheStatistics {
    let mut cache_time = vec![0u32; vertex_count];
    let mut time = cache_size as u32 + 1;
    let mut misses = 0u32;

    for &index in indices {
        let v = index as usize;
        if time - cache_time[v] > cache_size as u32 {
            cache_time[v] = time;
            time += 1;
            misses += 1;
        }
    }

    let face_count = (indices.len() / 3).max(1);
    let used = {
        let mut seen = vec![false; vertex_count];
        indices.iter().filter(|&&i| !std::mem::replace(&mut seen[i as usize], true)).count()
    };

    VertexCacheStatistics {
        vertices_transformed: misses,
        acmr: misses as f32 / face_count as f32,
        atvr: misses as f32 / used.max(1) as f32,
    }
}
