/// In-memory scene produced by an importer.
///
/// This is the boundary with the asset parser: the level never reads a
/// file format itself. Meshes carry raw per-corner attributes, nodes
/// carry local matrices, lights are attached to named nodes below the
/// light container.

use std::path::PathBuf;
use glam::{Mat4, Vec3};
use crate::error::{Error, Result};
use crate::mesh::Vertex;

/// Normal used when a mesh has no normals
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
/// Texture coordinate used when a mesh has no UVs
pub const DEFAULT_UV: [f32; 2] = [0.5, 0.5];

/// Materials and instances share one 32-bit base instance, 16 bits each
pub const MAX_MATERIALS: usize = 1 << 16;

// ============================================================================
// NODES
// ============================================================================

/// Node of the imported tree
#[derive(Debug, Clone)]
pub struct ImportedNode {
    pub name: String,
    /// Local transform relative to the parent
    pub transform: Mat4,
    /// Meshes attached to this node (indices into `ImportedScene::meshes`)
    pub mesh_indices: Vec<u32>,
    pub children: Vec<ImportedNode>,
}

impl ImportedNode {
    pub fn new(name: impl Into<String>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            transform,
            mesh_indices: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_mesh(mut self, mesh_index: u32) -> Self {
        self.mesh_indices.push(mesh_index);
        self
    }

    pub fn with_child(mut self, child: ImportedNode) -> Self {
        self.children.push(child);
        self
    }

    /// Neither children nor meshes
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.mesh_indices.is_empty()
    }

    /// Depth-first visit of this node and its descendants
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a ImportedNode)) {
        f(self);
        for child in &self.children {
            child.visit(f);
        }
    }
}

// ============================================================================
// MESHES
// ============================================================================

/// Raw mesh geometry as delivered by the importer
#[derive(Debug, Clone, Default)]
pub struct ImportedMesh {
    pub name: String,
    pub material_index: u32,
    pub positions: Vec<[f32; 3]>,
    /// Empty, or one per position
    pub normals: Vec<[f32; 3]>,
    /// Empty, or one per position
    pub uvs: Vec<[f32; 2]>,
    /// Polygons as position indices; only triangles are accepted
    pub faces: Vec<Vec<u32>>,
}

impl ImportedMesh {
    /// Interleaved vertices, with default normal/UV where missing
    pub fn raw_vertices(&self) -> Vec<Vertex> {
        (0..self.positions.len())
            .map(|i| {
                Vertex::new(
                    self.positions[i],
                    self.normals.get(i).copied().unwrap_or(DEFAULT_NORMAL),
                    self.uvs.get(i).copied().unwrap_or(DEFAULT_UV),
                )
            })
            .collect()
    }

    /// Flattened triangle list
    pub fn raw_indices(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    fn validate(&self, index: usize, material_count: usize) -> Result<()> {
        if self.material_index as usize >= material_count {
            return Err(Error::InvalidScene(format!(
                "mesh {} '{}' uses material {} but only {} materials exist",
                index, self.name, self.material_index, material_count
            )));
        }
        if !self.normals.is_empty() && self.normals.len() != self.positions.len() {
            return Err(Error::InvalidScene(format!(
                "mesh '{}' has {} normals for {} positions",
                self.name, self.normals.len(), self.positions.len()
            )));
        }
        if !self.uvs.is_empty() && self.uvs.len() != self.positions.len() {
            return Err(Error::InvalidScene(format!(
                "mesh '{}' has {} uvs for {} positions",
                self.name, self.uvs.len(), self.positions.len()
            )));
        }
        for (face_index, face) in self.faces.iter().enumerate() {
            if face.len() != 3 {
                return Err(Error::InvalidScene(format!(
                    "mesh '{}' face {} has {} corners, only triangles are supported",
                    self.name, face_index, face.len()
                )));
            }
            if let Some(&bad) = face.iter().find(|&&i| i as usize >= self.positions.len()) {
                return Err(Error::InvalidScene(format!(
                    "mesh '{}' face {} references vertex {} of {}",
                    self.name, face_index, bad, self.positions.len()
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// MATERIALS & LIGHTS
// ============================================================================

/// Imported material: a name and an optional base color texture
///
/// Materials without a base color texture are invisible (collision or
/// trigger geometry).
#[derive(Debug, Clone)]
pub struct ImportedMaterial {
    pub name: String,
    pub base_color: Option<PathBuf>,
}

impl ImportedMaterial {
    pub fn new(name: impl Into<String>, base_color: Option<PathBuf>) -> Self {
        Self { name: name.into(), base_color }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImportedLightKind {
    /// Direction in the light node's local frame
    Directional { direction: Vec3 },
    /// Positioned at its node's origin
    Point,
}

/// Light source attached to the node with the same name
#[derive(Debug, Clone)]
pub struct ImportedLight {
    pub name: String,
    pub kind: ImportedLightKind,
    /// Diffuse color (linear RGB)
    pub color: Vec3,
}

// ============================================================================
// SCENE
// ============================================================================

/// Complete imported scene
#[derive(Debug, Clone)]
pub struct ImportedScene {
    pub root: ImportedNode,
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<ImportedMaterial>,
    pub lights: Vec<ImportedLight>,
}

impl ImportedScene {
    /// Check every cross reference before anything is built.
    ///
    /// After this passes, mesh and material indices can be used without
    /// further checks.
    pub fn validate(&self) -> Result<()> {
        if self.materials.len() > MAX_MATERIALS {
            return Err(Error::InvalidScene(format!(
                "{} materials exceed the limit of {}", self.materials.len(), MAX_MATERIALS
            )));
        }

        for (index, mesh) in self.meshes.iter().enumerate() {
            mesh.validate(index, self.materials.len())?;
        }

        let mut result = Ok(());
        self.root.visit(&mut |node| {
            if result.is_err() {
                return;
            }
            if let Some(&bad) = node.mesh_indices.iter().find(|&&m| m as usize >= self.meshes.len()) {
                result = Err(Error::InvalidScene(format!(
                    "node '{}' references mesh {} but only {} meshes exist",
                    node.name, bad, self.meshes.len()
                )));
            }
        });
        result
    }

    /// Total number of faces over all meshes
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangle_count()).sum()
    }
}

#[cfg(test)]
#[path = "imported_tests.rs"]
mod tests;
