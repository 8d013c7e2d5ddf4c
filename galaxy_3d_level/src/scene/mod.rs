//! Scene module - level hierarchy and per-frame render queues.
//!
//! The hierarchy is built once from the imported node tree. Each frame
//! the render queue build walks it, culls nodes against the camera
//! frustum, picks a LOD per visible instance and emits indirect draw
//! commands per material.

mod aabb;
mod transform;
mod hierarchy;
mod builder;
mod bounds;
mod lod_selector;
mod culler;
mod render_queue;
mod physics;

pub use aabb::AABB;
pub use transform::Trs;
pub use hierarchy::{HierarchyNode, NodeKey, NodeRef, NodeRole, SceneGraph};
pub use builder::build_scene_graph;
pub use bounds::{propagate_all, propagate_bounds, refresh_ancestor_bounds, update_subtree};
pub use lod_selector::{FixedLodSelector, LodSelector, ProjectedSizeLodSelector};
pub use culler::{CullStats, CullStatsReporter, FrustumCuller};
pub use render_queue::{
    pack_base_instance, unpack_base_instance,
    DrawElementsIndirectCommand, FrameQueues, RenderItem, RenderQueue,
    INSTANCE_SLOT_SHIFT, MAX_INSTANCES_PER_MATERIAL,
};
pub use physics::{apply_world_trs, collect_physics_meshes, PhysicsMesh};
