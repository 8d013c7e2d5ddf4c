/// Geometry handed to the physics engine.
///
/// Every mesh node under a role subtree (rigid or dynamic root) becomes
/// one [`PhysicsMesh`]: its model-space vertex positions, its LOD0
/// triangles, and its decomposed world transform. The [`NodeRef`] lets
/// the physics side write simulated transforms back.

use glam::Mat4;
use crate::error::Result;
use crate::mesh::MeshBuffers;
use super::hierarchy::{NodeKey, NodeRef, NodeRole, SceneGraph};
use super::transform::Trs;

/// Collision geometry of one mesh node
#[derive(Debug, Clone)]
pub struct PhysicsMesh {
    /// Node the body drives
    pub node: NodeRef,
    /// Model-space positions, flattened `x, y, z, x, y, z, ...`
    pub positions: Vec<f32>,
    /// LOD0 triangle list, local to `positions`
    pub indices: Vec<u32>,
    /// World transform of the node at collection time
    pub world: Trs,
}

impl PhysicsMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Collect the meshes of the subtree holding `role`.
///
/// World transforms include the ancestors above the role node. A level
/// without that role yields an empty list.
pub fn collect_physics_meshes(graph: &SceneGraph, buffers: &MeshBuffers, role: NodeRole) -> Vec<PhysicsMesh> {
    let mut meshes = Vec::new();
    if let Some(key) = graph.role_node(role) {
        let parent_world = graph.parent_world_matrix(key);
        collect(graph, buffers, key, &parent_world, &mut meshes);
    }
    meshes
}

fn collect(graph: &SceneGraph, buffers: &MeshBuffers, key: NodeKey, parent_world: &Mat4, out: &mut Vec<PhysicsMesh>) {
    let Some(node) = graph.node(key) else {
        return;
    };
    let world = *parent_world * node.local_matrix();

    if let Some(sub_mesh) = node.mesh_index.and_then(|i| buffers.sub_mesh(i)) {
        let first = sub_mesh.vertex_offset as usize;
        let vertices = &buffers.vertices()[first..first + sub_mesh.vertex_count as usize];
        let lod0 = sub_mesh.lod(0);
        let start = lod0.index_offset as usize;

        out.push(PhysicsMesh {
            node: graph.node_ref(key),
            positions: vertices.iter().flat_map(|v| v.position).collect(),
            indices: buffers.indices()[start..start + lod0.index_count as usize].to_vec(),
            world: Trs::from_matrix(&world),
        });
    }

    for &child in &node.children {
        collect(graph, buffers, child, &world, out);
    }
}

/// Store a world transform computed by physics on `node`.
///
/// The transform is converted to the node's local frame. Bounds are not
/// touched; callers re-propagate the subtree afterwards.
///
/// # Errors
///
/// `InvalidHandle` if `node` was issued by another graph.
pub fn apply_world_trs(graph: &mut SceneGraph, node: NodeRef, world: &Trs) -> Result<NodeKey> {
    let key = graph.resolve(node)?;
    let local = graph.parent_world_matrix(key).inverse() * world.to_matrix();
    if let Some(node) = graph.node_mut(key) {
        node.trs = Trs::from_matrix(&local);
    }
    Ok(key)
}

#[cfg(test)]
#[path = "physics_tests.rs"]
mod tests;
