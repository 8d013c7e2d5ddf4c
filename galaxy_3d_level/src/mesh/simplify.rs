/// Index buffer simplification.
///
/// Two simplifiers share this module:
///
/// - [`simplify`] performs quadric-error edge collapses. It only moves
///   interior vertices onto a neighbor, keeps borders and attribute
///   seams in place and never flips a triangle, so the result keeps the
///   topology and the look of the input.
/// - [`simplify_sloppy`] clusters vertices on a regular grid and keeps
///   one representative per cell. It ignores topology entirely and can
///   reduce anything, at the price of visible artifacts.
///
/// Both return a new index buffer referencing the input vertex buffer.

use glam::DVec3;
use rustc_hash::{FxHashMap, FxHashSet};
use super::vertex::Vertex;

// ===== SHARED =====

/// Positions scaled into the unit cube, `None` for empty or flat-point input
fn normalized_positions(vertices: &[Vertex]) -> Option<Vec<DVec3>> {
    if vertices.is_empty() {
        return None;
    }

    let mut min = DVec3::splat(f64::MAX);
    let mut max = DVec3::splat(f64::MIN);
    for vertex in vertices {
        let p = vertex.position().as_dvec3();
        min = min.min(p);
        max = max.max(p);
    }

    let extent = (max - min).max_element();
    if !(extent > 0.0) {
        return None;
    }

    Some(
        vertices
            .iter()
            .map(|v| (v.position().as_dvec3() - min) / extent)
            .collect(),
    )
}

// ===== QUADRIC ERROR METRIC =====

/// Area-weighted sum of squared plane distances
#[derive(Debug, Clone, Copy, Default)]
struct Quadric {
    a00: f64,
    a11: f64,
    a22: f64,
    a01: f64,
    a02: f64,
    a12: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    c: f64,
    weight: f64,
}

impl Quadric {
    fn from_plane(normal: DVec3, distance: f64, weight: f64) -> Self {
        Self {
            a00: weight * normal.x * normal.x,
            a11: weight * normal.y * normal.y,
            a22: weight * normal.z * normal.z,
            a01: weight * normal.x * normal.y,
            a02: weight * normal.x * normal.z,
            a12: weight * normal.y * normal.z,
            b0: weight * normal.x * distance,
            b1: weight * normal.y * distance,
            b2: weight * normal.z * distance,
            c: weight * distance * distance,
            weight,
        }
    }

    fn add(&mut self, other: &Quadric) {
        self.a00 += other.a00;
        self.a11 += other.a11;
        self.a22 += other.a22;
        self.a01 += other.a01;
        self.a02 += other.a02;
        self.a12 += other.a12;
        self.b0 += other.b0;
        self.b1 += other.b1;
        self.b2 += other.b2;
        self.c += other.c;
        self.weight += other.weight;
    }

    /// Weighted squared distance of `p` to the accumulated planes
    fn evaluate(&self, p: DVec3) -> f64 {
        let rx = self.a00 * p.x + self.a01 * p.y + self.a02 * p.z;
        let ry = self.a01 * p.x + self.a11 * p.y + self.a12 * p.z;
        let rz = self.a02 * p.x + self.a12 * p.y + self.a22 * p.z;
        let r = p.x * rx + p.y * ry + p.z * rz
            + 2.0 * (self.b0 * p.x + self.b1 * p.y + self.b2 * p.z)
            + self.c;
        r.abs()
    }
}

#[derive(Debug, Clone, Copy)]
struct Collapse {
    from: u32,
    to: u32,
    cost: f64,
}

struct EdgeCollapser {
    positions: Vec<DVec3>,
    /// Position class of each vertex (vertices sharing a position)
    class: Vec<u32>,
    triangles: Vec<[u32; 3]>,
    alive: Vec<bool>,
    /// Vertex -> live triangles
    adjacency: Vec<Vec<u32>>,
    quadrics: Vec<Quadric>,
    /// Interior, non-seam, manifold vertices: the only ones allowed to move
    movable: Vec<bool>,
    /// Vertices sharing their position with another vertex
    seam: Vec<bool>,
}

impl EdgeCollapser {
    fn new(indices: &[u32], vertices: &[Vertex], positions: Vec<DVec3>) -> Self {
        let vertex_count = vertices.len();

        let mut class_of: FxHashMap<[u32; 3], u32> = FxHashMap::default();
        let mut class = Vec::with_capacity(vertex_count);
        let mut class_size: Vec<u32> = Vec::new();
        for vertex in vertices {
            let bits: [u32; 3] = bytemuck::cast(vertex.position);
            let next = class_size.len() as u32;
            let id = *class_of.entry(bits).or_insert(next);
            if id == next {
                class_size.push(0);
            }
            class_size[id as usize] += 1;
            class.push(id);
        }
        let seam: Vec<bool> = class.iter().map(|&c| class_size[c as usize] > 1).collect();

        let triangles: Vec<[u32; 3]> = indices
            .chunks_exact(3)
            .map(|t| [t[0], t[1], t[2]])
            .filter(|t| t[0] != t[1] && t[1] != t[2] && t[0] != t[2])
            .collect();

        let mut adjacency = vec![Vec::new(); vertex_count];
        let mut quadrics = vec![Quadric::default(); vertex_count];
        let mut edge_use: FxHashMap<(u32, u32), u32> = FxHashMap::default();

        for (t, triangle) in triangles.iter().enumerate() {
            let p0 = positions[triangle[0] as usize];
            let p1 = positions[triangle[1] as usize];
            let p2 = positions[triangle[2] as usize];
            let cross = (p1 - p0).cross(p2 - p0);
            let length = cross.length();

            if length > 0.0 {
                let normal = cross / length;
                let quadric = Quadric::from_plane(normal, -normal.dot(p0), length * 0.5);
                for &v in triangle {
                    quadrics[v as usize].add(&quadric);
                }
            }

            for corner in 0..3 {
                let v = triangle[corner];
                adjacency[v as usize].push(t as u32);

                let a = class[v as usize];
                let b = class[triangle[(corner + 1) % 3] as usize];
                *edge_use.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }

        // Border (one triangle) and non-manifold (three or more) edges pin
        // both of their endpoint classes
        let mut pinned_class = vec![false; class_size.len()];
        for (&(a, b), &count) in &edge_use {
            if count != 2 {
                pinned_class[a as usize] = true;
                pinned_class[b as usize] = true;
            }
        }

        let movable = (0..vertex_count)
            .map(|v| !seam[v] && !pinned_class[class[v] as usize])
            .collect();

        Self {
            alive: vec![true; triangles.len()],
            positions,
            class,
            triangles,
            adjacency,
            quadrics,
            movable,
            seam,
        }
    }

    fn index_count(&self) -> usize {
        self.alive.iter().filter(|&&a| a).count() * 3
    }

    /// Normalized error of moving `from` onto `to`
    fn cost(&self, from: u32, to: u32) -> f64 {
        let mut quadric = self.quadrics[from as usize];
        quadric.add(&self.quadrics[to as usize]);
        if quadric.weight <= 0.0 {
            return 0.0;
        }
        quadric.evaluate(self.positions[to as usize]) / quadric.weight
    }

    /// Cheapest collapse of `from` that is currently valid
    fn best_collapse(&self, from: u32) -> Option<Collapse> {
        let mut options: Vec<Collapse> = Vec::new();
        for &t in &self.adjacency[from as usize] {
            for &to in &self.triangles[t as usize] {
                if to == from || self.seam[to as usize] || options.iter().any(|c| c.to == to) {
                    continue;
                }
                options.push(Collapse { from, to, cost: self.cost(from, to) });
            }
        }
        options.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        options.into_iter().find(|c| self.is_valid(c))
    }

    fn neighbor_classes(&self, v: u32) -> FxHashSet<u32> {
        let mut result = FxHashSet::default();
        for &t in &self.adjacency[v as usize] {
            for &w in &self.triangles[t as usize] {
                if w != v {
                    result.insert(self.class[w as usize]);
                }
            }
        }
        result
    }

    /// Link condition and orientation check against the current mesh
    fn is_valid(&self, collapse: &Collapse) -> bool {
        let (from, to) = (collapse.from, collapse.to);

        let shared = self.adjacency[from as usize]
            .iter()
            .filter(|&&t| self.triangles[t as usize].contains(&to))
            .count();
        if shared == 0 {
            return false;
        }

        let from_ring = self.neighbor_classes(from);
        let to_ring = self.neighbor_classes(to);
        let (from_class, to_class) = (self.class[from as usize], self.class[to as usize]);
        let common = from_ring
            .intersection(&to_ring)
            .filter(|&&c| c != from_class && c != to_class)
            .count();
        if common != shared {
            return false;
        }

        let target = self.positions[to as usize];
        for &t in &self.adjacency[from as usize] {
            let triangle = self.triangles[t as usize];
            if triangle.contains(&to) {
                continue;
            }

            let p = triangle.map(|v| self.positions[v as usize]);
            let q = triangle.map(|v| if v == from { target } else { self.positions[v as usize] });
            let before = (p[1] - p[0]).cross(p[2] - p[0]);
            let after = (q[1] - q[0]).cross(q[2] - q[0]);
            if before.dot(after) <= 0.0 {
                return false;
            }
        }

        true
    }

    /// Apply a collapse, returning the number of triangles removed
    fn apply(&mut self, collapse: &Collapse) -> usize {
        let (from, to) = (collapse.from, collapse.to);
        let mut removed = 0;

        for t in std::mem::take(&mut self.adjacency[from as usize]) {
            let triangle = &mut self.triangles[t as usize];
            if triangle.contains(&to) {
                self.alive[t as usize] = false;
                removed += 1;
                let others = *triangle;
                for w in others {
                    if w != from {
                        self.adjacency[w as usize].retain(|&x| x != t);
                    }
                }
            } else {
                for v in triangle.iter_mut() {
                    if *v == from {
                        *v = to;
                    }
                }
                self.adjacency[to as usize].push(t);
            }
        }

        let merged = self.quadrics[from as usize];
        self.quadrics[to as usize].add(&merged);
        self.movable[from as usize] = false;
        removed
    }

    fn run(&mut self, target_index_count: usize, max_cost: f64) {
        let mut index_count = self.index_count();
        let vertex_count = self.positions.len();

        while index_count > target_index_count {
            let mut candidates: Vec<Collapse> = (0..vertex_count as u32)
                .filter(|&v| self.movable[v as usize] && !self.adjacency[v as usize].is_empty())
                .filter_map(|v| self.best_collapse(v))
                .filter(|c| c.cost <= max_cost)
                .collect();
            if candidates.is_empty() {
                break;
            }
            candidates.sort_by(|a, b| a.cost.total_cmp(&b.cost));

            // Vertices touched this pass; their candidate data is stale
            let mut locked = vec![false; vertex_count];
            let mut performed = 0;

            for collapse in &candidates {
                if index_count <= target_index_count {
                    break;
                }
                if locked[collapse.from as usize] || locked[collapse.to as usize] {
                    continue;
                }
                if !self.is_valid(collapse) {
                    continue;
                }

                index_count -= self.apply(collapse) * 3;
                performed += 1;

                locked[collapse.from as usize] = true;
                for &t in &self.adjacency[collapse.to as usize] {
                    for &w in &self.triangles[t as usize] {
                        locked[w as usize] = true;
                    }
                }
            }

            if performed == 0 {
                break;
            }
        }
    }

    fn into_indices(self) -> Vec<u32> {
        self.triangles
            .iter()
            .zip(&self.alive)
            .filter(|(_, alive)| **alive)
            .flat_map(|(t, _)| t.iter().copied())
            .collect()
    }
}

/// Topology-preserving simplification.
///
/// Collapses edges in order of increasing quadric error until the index
/// count drops to `target_index_count` or every remaining collapse would
/// exceed `target_error` (relative to the mesh extent). The result may
/// therefore stay above the target.
pub fn simplify(
    indices: &[u32],
    vertices: &[Vertex],
    target_index_count: usize,
    target_error: f32,
) -> Vec<u32> {
    if indices.len() <= target_index_count {
        return indices.to_vec();
    }
    let Some(positions) = normalized_positions(vertices) else {
        return indices.to_vec();
    };

    let max_cost = (target_error as f64) * (target_error as f64);
    let mut collapser = EdgeCollapser::new(indices, vertices, positions);
    collapser.run(target_index_count, max_cost);
    collapser.into_indices()
}

// ===== SLOPPY (VERTEX CLUSTERING) =====

const MAX_GRID_SIZE: u32 = 1024;

fn cell_ids(positions: &[DVec3], grid_size: u32) -> Vec<u32> {
    let scale = grid_size as f64;
    let quantize = |c: f64| ((c * scale) as u32).min(grid_size - 1);
    positions
        .iter()
        .map(|p| quantize(p.x) + quantize(p.y) * grid_size + quantize(p.z) * grid_size * grid_size)
        .collect()
}

/// Distinct non-degenerate triangles left after clustering
fn clustered_triangle_count(indices: &[u32], cells: &[u32]) -> usize {
    let mut seen: FxHashSet<[u32; 3]> = FxHashSet::default();
    for t in indices.chunks_exact(3) {
        let mut key = [cells[t[0] as usize], cells[t[1] as usize], cells[t[2] as usize]];
        if key[0] == key[1] || key[1] == key[2] || key[0] == key[2] {
            continue;
        }
        key.sort_unstable();
        seen.insert(key);
    }
    seen.len()
}

/// Topology-agnostic simplification by vertex clustering.
///
/// Picks the finest grid whose clustered result fits in
/// `target_index_count` indices, replaces every vertex by the vertex of
/// its cell closest to the cell mean, and drops degenerate and duplicate
/// triangles. May return an empty buffer for very small targets.
pub fn simplify_sloppy(indices: &[u32], vertices: &[Vertex], target_index_count: usize) -> Vec<u32> {
    if indices.len() <= target_index_count {
        return indices.to_vec();
    }
    let Some(positions) = normalized_positions(vertices) else {
        return indices.to_vec();
    };

    let fits = |grid_size: u32| {
        clustered_triangle_count(indices, &cell_ids(&positions, grid_size)) * 3 <= target_index_count
    };

    // A 1x1x1 grid leaves nothing, so `low` always fits
    let mut low = 1u32;
    let mut high = MAX_GRID_SIZE;
    if fits(high) {
        low = high;
    } else {
        while high - low > 1 {
            let mid = (low + high) / 2;
            if fits(mid) {
                low = mid;
            } else {
                high = mid;
            }
        }
    }

    let cells = cell_ids(&positions, low);

    let mut used = vec![false; vertices.len()];
    for &index in indices {
        used[index as usize] = true;
    }

    let mut means: FxHashMap<u32, (DVec3, u32)> = FxHashMap::default();
    for v in (0..vertices.len()).filter(|&v| used[v]) {
        let entry = means.entry(cells[v]).or_insert((DVec3::ZERO, 0));
        entry.0 += positions[v];
        entry.1 += 1;
    }

    let mut representative: FxHashMap<u32, (u32, f64)> = FxHashMap::default();
    for v in (0..vertices.len()).filter(|&v| used[v]) {
        let (sum, count) = means[&cells[v]];
        let distance = positions[v].distance_squared(sum / count as f64);
        let best = representative.entry(cells[v]).or_insert((v as u32, distance));
        if distance < best.1 {
            *best = (v as u32, distance);
        }
    }

    let mut seen: FxHashSet<[u32; 3]> = FxHashSet::default();
    let mut result = Vec::new();
    for t in indices.chunks_exact(3) {
        let mut key = [cells[t[0] as usize], cells[t[1] as usize], cells[t[2] as usize]];
        if key[0] == key[1] || key[1] == key[2] || key[0] == key[2] {
            continue;
        }
        let triangle = key.map(|cell| representative[&cell].0);
        key.sort_unstable();
        if seen.insert(key) {
            result.extend_from_slice(&triangle);
        }
    }

    result
}
