use super::*;
use crate::config::{LodConfig, MeshOptimizerConfig};

// ============================================================================
// Helpers
// ============================================================================

/// Flat grid in the XZ plane, one raw vertex per face corner (like an
/// importer produces), `cols * rows * 2` triangles
fn raw_grid(cols: u32, rows: u32) -> (Vec<Vertex>, Vec<u32>) {
    let corner = |x: u32, z: u32| {
        Vertex::new(
            [x as f32, 0.0, z as f32],
            [0.0, 1.0, 0.0],
            [x as f32 / cols as f32, z as f32 / rows as f32],
        )
    };

    let mut vertices = Vec::new();
    for z in 0..rows {
        for x in 0..cols {
            vertices.push(corner(x, z));
            vertices.push(corner(x, z + 1));
            vertices.push(corner(x + 1, z));

            vertices.push(corner(x + 1, z));
            vertices.push(corner(x, z + 1));
            vertices.push(corner(x + 1, z + 1));
        }
    }

    let indices = (0..vertices.len() as u32).collect();
    (vertices, indices)
}

/// Shared-vertex grid (already deduplicated)
fn indexed_grid(cols: u32, rows: u32) -> (Vec<Vertex>, Vec<u32>) {
    let (raw_vertices, raw_indices) = raw_grid(cols, rows);
    let (count, remap) = generate_vertex_remap(&raw_vertices, &raw_indices);
    (
        remap_vertex_buffer(&raw_vertices, count, &remap),
        remap_index_buffer(&raw_indices, &remap),
    )
}

/// Triangles as position bit patterns, sorted, for set comparison
fn triangle_set(vertices: &[Vertex], indices: &[u32]) -> Vec<[u32; 9]> {
    let mut result: Vec<[u32; 9]> = indices
        .chunks_exact(3)
        .map(|t| {
            let mut key = [0u32; 9];
            for corner in 0..3 {
                let bits: [u32; 3] = bytemuck::cast(vertices[t[corner] as usize].position);
                key[corner * 3..corner * 3 + 3].copy_from_slice(&bits);
            }
            key
        })
        .collect();
    result.sort_unstable();
    result
}

fn assert_no_degenerate(indices: &[u32]) {
    assert_eq!(indices.len() % 3, 0);
    for t in indices.chunks_exact(3) {
        assert!(t[0] != t[1] && t[1] != t[2] && t[0] != t[2], "degenerate triangle {:?}", t);
    }
}

// ============================================================================
// Vertex layout
// ============================================================================

#[test]
fn test_vertex_layout() {
    assert_eq!(VERTEX_STRIDE, 32);
    assert_eq!(POSITION_OFFSET, 0);
    assert_eq!(NORMAL_OFFSET, 12);
    assert_eq!(UV_OFFSET, 24);
}

// ============================================================================
// Remap
// ============================================================================

#[test]
fn test_remap_collapses_identical_vertices() {
    let (vertices, indices) = raw_grid(2, 1);
    assert_eq!(vertices.len(), 12);

    let (count, remap) = generate_vertex_remap(&vertices, &indices);

    // 3x2 grid points
    assert_eq!(count, 6);
    assert!(remap.iter().all(|&r| r != UNUSED && (r as usize) < count));
}

#[test]
fn test_remap_round_trip_reproduces_raw_triangles() {
    let (raw_vertices, raw_indices) = raw_grid(5, 4);
    let (count, remap) = generate_vertex_remap(&raw_vertices, &raw_indices);
    let indices = remap_index_buffer(&raw_indices, &remap);
    let vertices = remap_vertex_buffer(&raw_vertices, count, &remap);

    assert_eq!(indices.len(), raw_indices.len());
    for (&raw, &new) in raw_indices.iter().zip(&indices) {
        assert_eq!(raw_vertices[raw as usize], vertices[new as usize]);
    }
}

#[test]
fn test_remap_marks_unreferenced_vertices() {
    let vertices = vec![
        Vertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        Vertex::new([9.0, 9.0, 9.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        Vertex::new([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        Vertex::new([0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
    ];
    let (count, remap) = generate_vertex_remap(&vertices, &[0, 2, 3]);

    assert_eq!(count, 3);
    assert_eq!(remap[1], UNUSED);
    assert_eq!(remap[0], 0);
    assert_eq!(remap[2], 1);
    assert_eq!(remap[3], 2);
}

#[test]
fn test_remap_keeps_seam_vertices_apart() {
    // Same position, different UV
    let vertices = vec![
        Vertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]),
        Vertex::new([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0]),
    ];
    let (count, _) = generate_vertex_remap(&vertices, &[0, 1]);
    assert_eq!(count, 2);
}

// ============================================================================
// Vertex cache / overdraw / fetch
// ============================================================================

#[test]
fn test_vertex_cache_improves_acmr_of_shuffled_mesh() {
    let (vertices, indices) = indexed_grid(20, 30);
    let face_count = indices.len() / 3;

    // Deterministic scramble of the triangle order
    let mut shuffled = Vec::with_capacity(indices.len());
    for i in 0..face_count {
        let face = (i * 7919) % face_count;
        shuffled.extend_from_slice(&indices[face * 3..face * 3 + 3]);
    }

    let before = analyze_vertex_cache(&shuffled, vertices.len(), DEFAULT_FIFO_SIZE);
    let optimized = optimize_vertex_cache(&shuffled, vertices.len());
    let after = analyze_vertex_cache(&optimized, vertices.len(), DEFAULT_FIFO_SIZE);

    assert!(after.acmr < before.acmr, "acmr {} -> {}", before.acmr, after.acmr);
    assert!(after.acmr < 1.2, "grid acmr should be well under 1.2, got {}", after.acmr);
    assert_eq!(triangle_set(&vertices, &optimized), triangle_set(&vertices, &shuffled));
}

#[test]
fn test_vertex_cache_empty_input() {
    assert!(optimize_vertex_cache(&[], 0).is_empty());
}

#[test]
fn test_analyze_vertex_cache_single_triangle() {
    let stats = analyze_vertex_cache(&[0, 1, 2], 3, DEFAULT_FIFO_SIZE);
    assert_eq!(stats.vertices_transformed, 3);
    assert!((stats.acmr - 3.0).abs() < f32::EPSILON);
    assert!((stats.atvr - 1.0).abs() < f32::EPSILON);
}

#[test]
fn test_overdraw_is_a_triangle_permutation() {
    let (vertices, indices) = indexed_grid(12, 12);
    let indices = optimize_vertex_cache(&indices, vertices.len());
    let reordered = optimize_overdraw(&indices, &vertices, 1.05);

    assert_eq!(reordered.len(), indices.len());
    assert_eq!(triangle_set(&vertices, &reordered), triangle_set(&vertices, &indices));
}

#[test]
fn test_vertex_fetch_orders_by_first_use() {
    let vertices: Vec<Vertex> = (0..4)
        .map(|i| Vertex::new([i as f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]))
        .collect();
    let mut indices = vec![3, 1, 2, 2, 1, 0];

    let reordered = optimize_vertex_fetch(&mut indices, &vertices);

    assert_eq!(indices, vec![0, 1, 2, 2, 1, 3]);
    assert_eq!(reordered[0], vertices[3]);
    assert_eq!(reordered[1], vertices[1]);
    assert_eq!(reordered[2], vertices[2]);
    assert_eq!(reordered[3], vertices[0]);
}

#[test]
fn test_vertex_fetch_drops_unused_vertices() {
    let vertices: Vec<Vertex> = (0..5)
        .map(|i| Vertex::new([i as f32, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0]))
        .collect();
    let mut indices = vec![0, 2, 4];

    let reordered = optimize_vertex_fetch(&mut indices, &vertices);
    assert_eq!(reordered.len(), 3);
}

// ============================================================================
// Simplification
// ============================================================================

#[test]
fn test_simplify_reduces_flat_grid() {
    let (vertices, indices) = indexed_grid(20, 30);
    let target = indices.len() / 2;

    let result = simplify(&indices, &vertices, target, 0.02);

    assert!(result.len() <= target, "{} > {}", result.len(), target);
    assert_no_degenerate(&result);
}

#[test]
fn test_simplify_keeps_grid_corners() {
    let (vertices, indices) = indexed_grid(10, 10);
    let result = simplify(&indices, &vertices, 60, 0.02);

    for corner in [[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [0.0, 0.0, 10.0], [10.0, 0.0, 10.0]] {
        assert!(
            result.iter().any(|&i| vertices[i as usize].position == corner),
            "corner {:?} lost",
            corner
        );
    }
}

#[test]
fn test_simplify_below_target_is_identity() {
    let (vertices, indices) = indexed_grid(2, 2);
    assert_eq!(simplify(&indices, &vertices, 1024, 0.02), indices);
}

#[test]
fn test_simplify_respects_error_bound_on_tent() {
    // Two slopes meeting at a ridge along x = 4. Collapses inside a slope
    // are free, anything moving the ridge is far above the error budget.
    let (mut vertices, indices) = indexed_grid(8, 8);
    for v in &mut vertices {
        v.position[1] = 4.0 - (v.position[0] - 4.0).abs();
    }

    let result = simplify(&indices, &vertices, 0, 1e-4);

    assert_no_degenerate(&result);
    assert!(result.len() < indices.len());
    for t in result.chunks_exact(3) {
        let xs = [0, 1, 2].map(|c| vertices[t[c] as usize].position[0]);
        let left = xs.iter().all(|&x| x <= 4.0);
        let right = xs.iter().all(|&x| x >= 4.0);
        assert!(left || right, "triangle {:?} crosses the ridge", xs);
    }
}

#[test]
fn test_simplify_sloppy_reaches_target() {
    let (vertices, indices) = indexed_grid(20, 30);

    let result = simplify_sloppy(&indices, &vertices, 600);

    assert!(!result.is_empty());
    assert!(result.len() <= 600);
    assert_no_degenerate(&result);
}

// ============================================================================
// LOD chain
// ============================================================================

#[test]
fn test_lod_chain_for_1200_triangle_mesh() {
    let (vertices, indices) = indexed_grid(20, 30);
    assert_eq!(indices.len() / 3, 1200);

    let chain = generate_lods(&indices, &vertices, &LodConfig::default());

    assert!(chain.len() >= 2, "got {:?}", chain.index_counts());
    assert_eq!(chain.lods[0], indices);
    let last = chain.lods.last().unwrap().len();
    assert!(last <= 1024 || chain.exhausted);
}

#[test]
fn test_lod_counts_never_increase() {
    let (vertices, indices) = indexed_grid(32, 32);
    let chain = generate_lods(&indices, &vertices, &LodConfig::default());

    let counts = chain.index_counts();
    for pair in counts.windows(2) {
        assert!(pair[1] <= pair[0], "{:?}", counts);
    }
    assert!(chain.len() <= 8);
    for lod in &chain.lods {
        assert_no_degenerate(lod);
    }
}

#[test]
fn test_small_mesh_has_single_lod() {
    let (vertices, indices) = indexed_grid(4, 4);
    let chain = generate_lods(&indices, &vertices, &LodConfig::default());

    assert_eq!(chain.len(), 1);
    assert!(!chain.exhausted);
}

#[test]
fn test_lod_chain_respects_max_lods() {
    let (vertices, indices) = indexed_grid(20, 30);
    let config = LodConfig {
        target_index_count: 0,
        max_lods: 2,
        ..LodConfig::default()
    };

    let chain = generate_lods(&indices, &vertices, &config);
    assert_eq!(chain.len(), 2);
    assert!(chain.exhausted);
}

#[test]
fn test_lod_chain_falls_back_to_sloppy_when_simplify_stalls() {
    let (vertices, indices) = indexed_grid(20, 30);
    let config = LodConfig {
        target_index_count: 0,
        ..LodConfig::default()
    };

    let chain = generate_lods(&indices, &vertices, &config);
    assert!(chain.len() >= 3, "got {:?}", chain.index_counts());

    // Some level below LOD1 is smaller than anything the topology
    // preserving simplifier produces from its parent
    let sloppy_level = (2..chain.len()).find(|&level| {
        let parent = &chain.lods[level - 1];
        let target = parent.len() / 6 * 3;
        let strict = simplify(parent, &vertices, target, config.target_error);
        strict.len() as f32 >= parent.len() as f32 * config.min_reduction
    });
    assert!(sloppy_level.is_some(), "no sloppy level in {:?}", chain.index_counts());

    for pair in chain.lods.windows(2) {
        assert!(pair[1].len() < pair[0].len());
    }
    for lod in &chain.lods {
        assert_no_degenerate(lod);
    }
}

#[test]
fn test_lod_chain_stops_when_first_simplify_stalls() {
    // Per-quad UVs: every shared position is a seam, nothing may collapse
    let (cols, rows) = (20u32, 30u32);
    let mut raw_vertices = Vec::new();
    for z in 0..rows {
        for x in 0..cols {
            let corner = |dx: u32, dz: u32| {
                Vertex::new(
                    [(x + dx) as f32, 0.0, (z + dz) as f32],
                    [0.0, 1.0, 0.0],
                    [dx as f32, dz as f32],
                )
            };
            raw_vertices.extend([corner(0, 0), corner(0, 1), corner(1, 0)]);
            raw_vertices.extend([corner(1, 0), corner(0, 1), corner(1, 1)]);
        }
    }
    let raw_indices: Vec<u32> = (0..raw_vertices.len() as u32).collect();
    let (count, remap) = generate_vertex_remap(&raw_vertices, &raw_indices);
    let vertices = remap_vertex_buffer(&raw_vertices, count, &remap);
    let indices = remap_index_buffer(&raw_indices, &remap);
    assert_eq!(indices.len(), 3600);

    let chain = generate_lods(&indices, &vertices, &LodConfig::default());

    assert_eq!(chain.index_counts(), vec![3600]);
    assert!(chain.exhausted);
}

// ============================================================================
// Full pipeline
// ============================================================================

#[test]
fn test_optimize_mesh_preserves_triangles() {
    let (raw_vertices, raw_indices) = raw_grid(6, 5);
    let mesh = optimize_mesh(&raw_vertices, &raw_indices, &MeshOptimizerConfig::default());

    assert_eq!(mesh.vertices.len(), 7 * 6);
    assert_eq!(mesh.indices().len(), raw_indices.len());
    assert_eq!(
        triangle_set(&mesh.vertices, mesh.indices()),
        triangle_set(&raw_vertices, &raw_indices)
    );
}

#[test]
fn test_optimize_mesh_lod0_is_optimized_index_count() {
    let (raw_vertices, raw_indices) = raw_grid(20, 30);
    let mesh = optimize_mesh(&raw_vertices, &raw_indices, &MeshOptimizerConfig::default());

    assert_eq!(mesh.lods.lods[0].len(), raw_indices.len());
    assert!(mesh.lods.len() >= 2);
    // Vertex fetch order: the first triangle uses the first vertices
    assert_eq!(&mesh.indices()[..3], &[0, 1, 2]);
}

// ============================================================================
// Buffers
// ============================================================================

#[test]
fn test_mesh_buffers_pack_contiguously() {
    let config = MeshOptimizerConfig::default();
    let (v0, i0) = raw_grid(20, 30);
    let (v1, i1) = raw_grid(2, 2);
    let big = optimize_mesh(&v0, &i0, &config);
    let small = optimize_mesh(&v1, &i1, &config);

    let mut buffers = MeshBuffers::new();
    assert_eq!(buffers.push_mesh("big", 0, &big), 0);
    assert_eq!(buffers.push_mesh("small", 3, &small), 1);

    let a = buffers.sub_mesh(0).unwrap();
    let b = buffers.sub_mesh(1).unwrap();

    assert_eq!(a.vertex_offset, 0);
    assert_eq!(b.vertex_offset, a.vertex_count);
    assert_eq!(buffers.vertices().len() as u32, a.vertex_count + b.vertex_count);
    assert_eq!(b.material_index, 3);

    // LOD ranges follow each other without gaps
    let mut expected_offset = 0;
    for range in a.lods.iter().chain(&b.lods) {
        assert_eq!(range.index_offset, expected_offset);
        expected_offset += range.index_count;
    }
    assert_eq!(expected_offset as usize, buffers.indices().len());

    assert_eq!(buffers.vertex_bytes().len(), buffers.vertices().len() * VERTEX_STRIDE);
    assert_eq!(buffers.index_bytes().len(), buffers.indices().len() * 4);
}

#[test]
fn test_sub_mesh_bounds_and_lod_clamp() {
    let (vertices, indices) = raw_grid(3, 2);
    let mesh = optimize_mesh(&vertices, &indices, &MeshOptimizerConfig::default());

    let mut buffers = MeshBuffers::new();
    buffers.push_mesh("grid", 0, &mesh);
    let sub_mesh = &buffers.sub_meshes()[0];

    assert_eq!(sub_mesh.bounds.min, glam::Vec3::ZERO);
    assert_eq!(sub_mesh.bounds.max, glam::Vec3::new(3.0, 0.0, 2.0));
    assert_eq!(sub_mesh.lod_count(), 1);
    assert_eq!(sub_mesh.lod(5), sub_mesh.lods[0]);
}
