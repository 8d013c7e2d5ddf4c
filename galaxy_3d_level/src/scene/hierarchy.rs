/// Scene graph - the level's node hierarchy.
///
/// Nodes live in a SlotMap arena owned by the graph; parent/child links
/// are keys into that arena. The tree shape is fixed after the build,
/// only node transforms (dynamic subtrees) and `active` flags change.
///
/// Special nodes (dynamic root, animated surface, ...) are tagged with a
/// [`NodeRole`] once at build time and found through the role table,
/// never by name. Handles given out to other systems are [`NodeRef`]s,
/// which remember the graph that issued them.

use std::sync::atomic::{AtomicU32, Ordering};
use glam::Mat4;
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use super::aabb::AABB;
use super::transform::Trs;

// ===== SLOT MAP KEY =====

new_key_type! {
    /// Stable key of a node within its SceneGraph.
    pub struct NodeKey;
}

/// Source of unique graph identifiers (one per built graph)
static NEXT_GRAPH_ID: AtomicU32 = AtomicU32::new(1);

// ===== NODE ROLE =====

/// Special meaning of a node, assigned from its name at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeRole {
    #[default]
    None,
    /// Root of the subtree animated every frame and simulated as dynamic bodies
    DynamicRoot,
    /// Root of the subtree collected as static collision geometry
    RigidRoot,
    /// Animated surface node (e.g. rising lava)
    AnimatedSurface,
    /// Container of light nodes, never part of the hierarchy
    LightContainer,
}

// ===== NODE REF =====

/// Handle to a node, valid only for the graph that issued it.
///
/// Rebuilding a level produces a new graph; refs from the previous one
/// are rejected instead of silently addressing an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    graph_id: u32,
    key: NodeKey,
}

impl NodeRef {
    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn graph_id(&self) -> u32 {
        self.graph_id
    }
}

// ===== HIERARCHY NODE =====

/// One node of the level hierarchy
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub name: String,
    /// Navigation only, `None` for the root
    pub parent: Option<NodeKey>,
    /// Children in import order
    pub children: Vec<NodeKey>,
    /// Local transform relative to the parent
    pub trs: Trs,
    /// Mesh drawn at this node, if any
    pub mesh_index: Option<u32>,
    /// Model-space bounds of the mesh (`EMPTY` without a mesh)
    pub model_bounds: AABB,
    /// World-space bounds of the node and its descendants, valid after
    /// bounds propagation
    pub world_bounds: AABB,
    /// Inactive subtrees are skipped by the render queue build
    pub active: bool,
    pub role: NodeRole,
}

impl HierarchyNode {
    pub fn new(name: impl Into<String>, trs: Trs) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            trs,
            mesh_index: None,
            model_bounds: AABB::EMPTY,
            world_bounds: AABB::EMPTY,
            active: true,
            role: NodeRole::None,
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        self.trs.to_matrix()
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh_index.is_some()
    }
}

// ===== SCENE GRAPH =====

/// Arena-backed node tree with a role lookup table
#[derive(Debug)]
pub struct SceneGraph {
    id: u32,
    nodes: SlotMap<NodeKey, HierarchyNode>,
    root: NodeKey,
    roles: FxHashMap<NodeRole, NodeKey>,
}

impl SceneGraph {
    /// Create a graph holding only `root`
    pub fn new(root: HierarchyNode) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(root);
        Self {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            nodes,
            root,
            roles: FxHashMap::default(),
        }
    }

    /// Append `node` as the last child of `parent`
    pub fn add_child(&mut self, parent: NodeKey, mut node: HierarchyNode) -> Result<NodeKey> {
        if !self.nodes.contains_key(parent) {
            return Err(Error::InvalidHandle(format!(
                "parent of '{}' is not part of this graph", node.name
            )));
        }
        node.parent = Some(parent);
        let key = self.nodes.insert(node);
        self.nodes[parent].children.push(key);
        Ok(key)
    }

    /// Tag `key` with `role`. A role can only be held by one node.
    pub fn assign_role(&mut self, key: NodeKey, role: NodeRole) -> Result<()> {
        if role == NodeRole::None {
            return Ok(());
        }
        if let Some(&existing) = self.roles.get(&role) {
            if existing != key {
                return Err(Error::DuplicateNode(format!(
                    "'{}' and '{}' both claim role {:?}",
                    self.nodes[existing].name, self.nodes[key].name, role
                )));
            }
        }
        self.nodes[key].role = role;
        self.roles.insert(role, key);
        Ok(())
    }

    // ===== ACCESSORS =====

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn node(&self, key: NodeKey) -> Option<&HierarchyNode> {
        self.nodes.get(key)
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Option<&mut HierarchyNode> {
        self.nodes.get_mut(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeKey, &HierarchyNode)> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes drawing a mesh (instances per frame)
    pub fn mesh_node_count(&self) -> usize {
        self.nodes.values().filter(|n| n.has_mesh()).count()
    }

    /// Node holding `role`, if the level has one
    pub fn role_node(&self, role: NodeRole) -> Option<NodeKey> {
        self.roles.get(&role).copied()
    }

    /// First node with this name (debugging and tests; runtime code uses roles)
    pub fn find_by_name(&self, name: &str) -> Option<NodeKey> {
        self.nodes.iter().find(|(_, n)| n.name == name).map(|(k, _)| k)
    }

    // ===== HANDLES =====

    /// Handle for other systems (physics write-back)
    pub fn node_ref(&self, key: NodeKey) -> NodeRef {
        NodeRef { graph_id: self.id, key }
    }

    /// Validate a handle against this graph
    pub fn resolve(&self, node: NodeRef) -> Result<NodeKey> {
        if node.graph_id != self.id {
            return Err(Error::InvalidHandle(format!(
                "node handle from graph {} used on graph {}", node.graph_id, self.id
            )));
        }
        if !self.nodes.contains_key(node.key) {
            return Err(Error::InvalidHandle("node no longer exists".to_string()));
        }
        Ok(node.key)
    }

    // ===== TRANSFORMS =====

    /// Product of the local matrices of all ancestors (excluding `key`)
    pub fn parent_world_matrix(&self, key: NodeKey) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = self.nodes.get(key).and_then(|n| n.parent);
        while let Some(k) = current {
            let node = &self.nodes[k];
            matrix = node.local_matrix() * matrix;
            current = node.parent;
        }
        matrix
    }

    /// Accumulated root-to-node matrix
    pub fn world_matrix(&self, key: NodeKey) -> Mat4 {
        match self.nodes.get(key) {
            Some(node) => self.parent_world_matrix(key) * node.local_matrix(),
            None => Mat4::IDENTITY,
        }
    }

    /// False if the node or any ancestor is inactive
    pub fn is_effectively_active(&self, key: NodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            match self.nodes.get(k) {
                Some(node) if node.active => current = node.parent,
                _ => return false,
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "hierarchy_tests.rs"]
mod tests;
