/// World-space bounding volume propagation.
///
/// A mesh node's box is its model box carried through the accumulated
/// world matrix. Every node's `world_bounds` also covers all of its
/// descendants, so a node failing the frustum test rules out its whole
/// subtree. Inactive nodes keep contributing: activity only matters to
/// the render queue build.

use glam::Mat4;
use super::aabb::AABB;
use super::hierarchy::{NodeKey, SceneGraph};

/// Recompute `world_bounds` for `key` and its descendants.
///
/// `parent_world` is the accumulated matrix of `key`'s parent. Returns the
/// box stored on `key` (`AABB::EMPTY` for a subtree without geometry).
pub fn propagate_bounds(graph: &mut SceneGraph, key: NodeKey, parent_world: &Mat4) -> AABB {
    let Some(node) = graph.node(key) else {
        return AABB::EMPTY;
    };

    let world = *parent_world * node.local_matrix();
    let mut bounds = if node.has_mesh() {
        node.model_bounds.transformed(&world)
    } else {
        AABB::EMPTY
    };

    let children = node.children.clone();
    for child in children {
        bounds = bounds.union(&propagate_bounds(graph, child, &world));
    }

    if let Some(node) = graph.node_mut(key) {
        node.world_bounds = bounds;
    }
    bounds
}

/// Full pass from the root, run once after the graph is built
pub fn propagate_all(graph: &mut SceneGraph) -> AABB {
    let root = graph.root();
    propagate_bounds(graph, root, &Mat4::IDENTITY)
}

/// Re-propagate a moved subtree and patch the boxes above it
pub fn update_subtree(graph: &mut SceneGraph, key: NodeKey) -> AABB {
    let parent_world = graph.parent_world_matrix(key);
    let bounds = propagate_bounds(graph, key, &parent_world);
    refresh_ancestor_bounds(graph, key);
    bounds
}

/// Rebuild the boxes of every ancestor of `key` from their own mesh and
/// their children's current boxes. Descendants are not revisited.
pub fn refresh_ancestor_bounds(graph: &mut SceneGraph, key: NodeKey) {
    let mut current = graph.node(key).and_then(|n| n.parent);

    while let Some(ancestor) = current {
        let Some(node) = graph.node(ancestor) else {
            return;
        };

        let mut bounds = if node.has_mesh() {
            node.model_bounds.transformed(&graph.world_matrix(ancestor))
        } else {
            AABB::EMPTY
        };
        for &child in &node.children {
            if let Some(child) = graph.node(child) {
                bounds = bounds.union(&child.world_bounds);
            }
        }

        let parent = node.parent;
        if let Some(node) = graph.node_mut(ancestor) {
            node.world_bounds = bounds;
        }
        current = parent;
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
