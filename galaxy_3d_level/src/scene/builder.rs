/// Scene graph construction from an imported node tree.
///
/// One recursive pass mirrors the imported tree into a [`SceneGraph`]:
/// local matrices are decomposed into TRS, mesh nodes pick up the
/// model-space bounds of their already optimized mesh, and special nodes
/// are tagged with their role. The light container subtree and empty
/// leaves (no children, no meshes) are left out.

use crate::config::NodeRoleNames;
use crate::engine_err;
use crate::error::{Error, Result};
use crate::import::ImportedNode;
use crate::mesh::MeshBuffers;
use super::hierarchy::{HierarchyNode, NodeKey, NodeRole, SceneGraph};
use super::transform::Trs;

const SOURCE: &str = "galaxy3d::SceneGraphBuilder";

/// Build the level hierarchy.
///
/// `buffers` must hold the optimized meshes in import order, so imported
/// mesh index `i` is `buffers.sub_mesh(i)`.
///
/// # Errors
///
/// - `DuplicateNode` if two nodes carry the same role name
/// - `LoadFailed` if a role listed in `roles.required` is missing
/// - `InvalidScene` if a node references a mesh that was not loaded
pub fn build_scene_graph(
    root: &ImportedNode,
    buffers: &MeshBuffers,
    roles: &NodeRoleNames,
) -> Result<SceneGraph> {
    let mut graph = SceneGraph::new(HierarchyNode::new(root.name.clone(), Trs::from_matrix(&root.transform)));
    let root_key = graph.root();

    populate(&mut graph, root_key, root, buffers, roles)?;

    for &role in &roles.required {
        if graph.role_node(role).is_none() {
            let name = roles.name_of(role).unwrap_or("<none>");
            return Err(engine_err!(SOURCE, "required node '{}' ({:?}) not found", name, role));
        }
    }

    Ok(graph)
}

/// Fill `key` (already inserted) from `source` and recurse into children
fn populate(
    graph: &mut SceneGraph,
    key: NodeKey,
    source: &ImportedNode,
    buffers: &MeshBuffers,
    roles: &NodeRoleNames,
) -> Result<()> {
    let role = roles.classify(&source.name);
    graph.assign_role(key, role).map_err(|e| {
        crate::engine_error!(SOURCE, "{}", e);
        e
    })?;

    // One mesh per node; further meshes of the same node become
    // children with an identity transform
    for (slot, &mesh_index) in source.mesh_indices.iter().enumerate() {
        let sub_mesh = buffers.sub_mesh(mesh_index).ok_or_else(|| {
            engine_err!(
                SOURCE,
                Error::InvalidScene,
                "node '{}' references mesh {} but {} meshes are loaded",
                source.name,
                mesh_index,
                buffers.mesh_count()
            )
        })?;

        let target = if slot == 0 {
            key
        } else {
            let name = format!("{}#{}", source.name, slot);
            graph.add_child(key, HierarchyNode::new(name, Trs::IDENTITY))?
        };

        if let Some(node) = graph.node_mut(target) {
            node.mesh_index = Some(mesh_index);
            node.model_bounds = sub_mesh.bounds;
        }
    }

    for child in &source.children {
        if child.is_empty() || roles.classify(&child.name) == NodeRole::LightContainer {
            continue;
        }

        let child_key = graph.add_child(
            key,
            HierarchyNode::new(child.name.clone(), Trs::from_matrix(&child.transform)),
        )?;
        populate(graph, child_key, child, buffers, roles)?;
    }

    Ok(())
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
