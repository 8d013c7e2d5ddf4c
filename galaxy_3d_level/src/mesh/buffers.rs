/// Global vertex/index buffers shared by every mesh of a level.
///
/// Meshes are packed contiguously in load order. Indices stay local to
/// their mesh (they start at 0 for every mesh); draws add the mesh's
/// `vertex_offset` as base vertex.
///
/// ```text
/// vertices: [ mesh 0 ........ | mesh 1 .... | mesh 2 ...... ]
/// indices:  [ m0 lod0 | m0 lod1 | m0 lod2 | m1 lod0 | m2 lod0 | m2 lod1 ]
/// ```

use crate::scene::AABB;
use super::optimizer::OptimizedMesh;
use super::vertex::Vertex;

// ============================================================================
// SUBMESH
// ============================================================================

/// Index range of one LOD inside the global index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodRange {
    /// First index in the global index buffer
    pub index_offset: u32,
    /// Number of indices
    pub index_count: u32,
}

/// One mesh packed into the global buffers.
#[derive(Debug, Clone)]
pub struct SubMesh {
    /// Name of the imported mesh
    pub name: String,
    /// Index into the level's material list
    pub material_index: u32,
    /// First vertex in the global vertex buffer (base vertex)
    pub vertex_offset: u32,
    /// Number of vertices owned by this mesh
    pub vertex_count: u32,
    /// One range per LOD, most detailed first (1 to `max_lods` entries)
    pub lods: Vec<LodRange>,
    /// Model-space bounds of the optimized vertices
    pub bounds: AABB,
}

impl SubMesh {
    pub fn lod_count(&self) -> usize {
        self.lods.len()
    }

    /// Range of `level`, clamped to the coarsest available LOD
    pub fn lod(&self, level: usize) -> LodRange {
        self.lods[level.min(self.lods.len() - 1)]
    }
}

// ============================================================================
// MESH BUFFERS
// ============================================================================

/// Flat vertex and index arrays plus per-mesh metadata
#[derive(Debug, Clone, Default)]
pub struct MeshBuffers {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    sub_meshes: Vec<SubMesh>,
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an optimized mesh, returning its mesh index.
    ///
    /// Every LOD of the chain is appended to the index buffer, LOD0 first.
    pub fn push_mesh(&mut self, name: impl Into<String>, material_index: u32, mesh: &OptimizedMesh) -> u32 {
        let vertex_offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&mesh.vertices);

        let mut lods = Vec::with_capacity(mesh.lods.len());
        for lod in &mesh.lods.lods {
            lods.push(LodRange {
                index_offset: self.indices.len() as u32,
                index_count: lod.len() as u32,
            });
            self.indices.extend_from_slice(lod);
        }

        let bounds = AABB::from_points(mesh.vertices.iter().map(|v| v.position()));

        self.sub_meshes.push(SubMesh {
            name: name.into(),
            material_index,
            vertex_offset,
            vertex_count: mesh.vertices.len() as u32,
            lods,
            bounds,
        });

        (self.sub_meshes.len() - 1) as u32
    }

    // ===== ACCESSORS =====

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn sub_meshes(&self) -> &[SubMesh] {
        &self.sub_meshes
    }

    pub fn sub_mesh(&self, index: u32) -> Option<&SubMesh> {
        self.sub_meshes.get(index as usize)
    }

    pub fn mesh_count(&self) -> usize {
        self.sub_meshes.len()
    }

    /// Vertex buffer as raw bytes, ready for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer as raw bytes (u32 indices), ready for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
