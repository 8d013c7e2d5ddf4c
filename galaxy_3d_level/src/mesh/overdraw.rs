/// Overdraw reduction.
///
/// Splits a cache-optimized index buffer into clusters whose local vertex
/// cache efficiency stays within `threshold` of the cluster average, then
/// draws clusters that face away from the mesh center first. Outer
/// surfaces occlude inner ones, so the depth test rejects more fragments.

use glam::Vec3;
use rdst::RadixSort;
use super::vertex::Vertex;

const FIFO_SIZE: u32 = 16;

/// FIFO vertex cache used to measure locality while clustering
struct FifoCache {
    timestamps: Vec<u32>,
    time: u32,
}

impl FifoCache {
    fn new(vertex_count: usize) -> Self {
        Self {
            timestamps: vec![0; vertex_count],
            time: FIFO_SIZE + 1,
        }
    }

    /// Invalidate every entry
    fn flush(&mut self) {
        self.time += FIFO_SIZE + 1;
    }

    /// Feed one triangle, returning the number of misses (0..=3)
    fn triangle(&mut self, triangle: &[u32]) -> u32 {
        let mut misses = 0;
        for &v in triangle {
            let v = v as usize;
            if self.time - self.timestamps[v] > FIFO_SIZE {
                self.timestamps[v] = self.time;
                self.time += 1;
                misses += 1;
            }
        }
        misses
    }
}

/// Triangle indices where the cache restarts from scratch (three misses)
fn hard_boundaries(indices: &[u32], vertex_count: usize) -> Vec<usize> {
    let mut cache = FifoCache::new(vertex_count);
    let mut boundaries = Vec::new();

    for (face, triangle) in indices.chunks_exact(3).enumerate() {
        if cache.triangle(triangle) == 3 || face == 0 {
            boundaries.push(face);
        }
    }

    boundaries
}

/// Split each hard cluster where the running ACMR drops under the
/// cluster average scaled by `threshold`
fn soft_boundaries(indices: &[u32], vertex_count: usize, hard: &[usize], threshold: f32) -> Vec<usize> {
    let face_count = indices.len() / 3;
    let mut cache = FifoCache::new(vertex_count);
    let mut boundaries = Vec::with_capacity(hard.len());

    for (i, &start) in hard.iter().enumerate() {
        let end = hard.get(i + 1).copied().unwrap_or(face_count);

        cache.flush();
        let mut cluster_misses = 0u32;
        for face in start..end {
            cluster_misses += cache.triangle(&indices[face * 3..face * 3 + 3]);
        }
        let cluster_threshold = threshold * cluster_misses as f32 / (end - start) as f32;

        boundaries.push(start);
        let first = boundaries.len() - 1;

        cache.flush();
        let mut running_misses = 0u32;
        let mut running_faces = 0u32;
        for face in start..end {
            running_misses += cache.triangle(&indices[face * 3..face * 3 + 3]);
            running_faces += 1;

            if running_misses as f32 / running_faces as f32 <= cluster_threshold {
                boundaries.push(face + 1);
                cache.flush();
                running_misses = 0;
                running_faces = 0;
            }
        }

        // The trailing cluster is usually a handful of poor triangles;
        // merge it into the previous one (also drops a boundary at `end`)
        if boundaries.len() - 1 != first {
            boundaries.pop();
        }
    }

    boundaries
}

/// Map a float to a u32 whose unsigned order matches the float order
fn sortable_bits(value: f32) -> u32 {
    let bits = value.to_bits();
    if bits & 0x8000_0000 != 0 {
        !bits
    } else {
        bits | 0x8000_0000
    }
}

/// Reorder triangles to reduce overdraw.
///
/// `indices` should already be optimized for the vertex cache; the
/// threshold (typically 1.05) bounds how much of that locality may be
/// traded for overdraw.
pub fn optimize_overdraw(indices: &[u32], vertices: &[Vertex], threshold: f32) -> Vec<u32> {
    let face_count = indices.len() / 3;
    if face_count < 2 {
        return indices.to_vec();
    }

    let hard = hard_boundaries(indices, vertices.len());
    let clusters = soft_boundaries(indices, vertices.len(), &hard, threshold);

    let mesh_centroid = {
        let mut sum = Vec3::ZERO;
        for &index in indices {
            sum += vertices[index as usize].position();
        }
        sum / indices.len() as f32
    };

    let mut keys: Vec<u64> = Vec::with_capacity(clusters.len());
    for (cluster, &start) in clusters.iter().enumerate() {
        let end = clusters.get(cluster + 1).copied().unwrap_or(face_count);

        let mut centroid = Vec3::ZERO;
        let mut normal = Vec3::ZERO;
        let mut total_area = 0.0f32;

        for face in start..end {
            let p0 = vertices[indices[face * 3] as usize].position();
            let p1 = vertices[indices[face * 3 + 1] as usize].position();
            let p2 = vertices[indices[face * 3 + 2] as usize].position();

            let face_normal = (p1 - p0).cross(p2 - p0);
            let area = face_normal.length();

            centroid += (p0 + p1 + p2) * (area / 3.0);
            normal += face_normal;
            total_area += area;
        }

        let centroid = if total_area > 0.0 { centroid / total_area } else { mesh_centroid };
        let direction = normal.normalize_or_zero();
        let key = (centroid - mesh_centroid).dot(direction);

        // Descending order by key, ties keep the input order
        let descending = !sortable_bits(key);
        keys.push(((descending as u64) << 32) | cluster as u64);
    }

    keys.radix_sort_unstable();

    let mut result = Vec::with_capacity(indices.len());
    for key in keys {
        let cluster = (key & 0xFFFF_FFFF) as usize;
        let start = clusters[cluster];
        let end = clusters.get(cluster + 1).copied().unwrap_or(face_count);
        result.extend_from_slice(&indices[start * 3..end * 3]);
    }

    result
}
