/// Level - load orchestration and per-frame API.
///
/// Loading runs three independent stages over the imported scene:
///
/// ```text
///             ┌── meshes (worker) ──┐
/// validate ───┼── lights (worker) ──┼──┐
///             └── materials ────────┘  │
///                        join meshes → hierarchy → bounds → join lights
/// ```
///
/// The hierarchy waits for the meshes (it needs their bounds) but not for
/// the lights. After loading, geometry is immutable; only the dynamic
/// subtree, the animated surface and `active` flags change.
///
/// Per frame the caller runs [`Level::build_frame`] once, then reads the
/// scene and shadow batches to issue one multi-draw per material.

use std::path::Path;
use std::thread::ScopedJoinHandle;
use glam::{Mat4, Vec3};
use crate::camera::{tight_orthographic_projection, Camera};
use crate::config::LevelConfig;
use crate::error::{Error, Result};
use crate::import::{ImportedScene, SceneImporter};
use crate::light::{load_lights, LightSources};
use crate::material::{load_materials, Material};
use crate::mesh::{analyze_vertex_cache, optimize_mesh, MeshBuffers, DEFAULT_FIFO_SIZE};
use crate::scene::{
    apply_world_trs, build_scene_graph, collect_physics_meshes, propagate_all, update_subtree,
    CullStats, CullStatsReporter, DrawElementsIndirectCommand, FrameQueues, FrustumCuller,
    LodSelector, NodeKey, NodeRef, NodeRole, PhysicsMesh, RenderQueue, SceneGraph, Trs, AABB,
    MAX_INSTANCES_PER_MATERIAL,
};
use crate::{engine_debug, engine_err, engine_error, engine_info, engine_trace};

const SOURCE: &str = "galaxy3d::Level";

// ============================================================================
// DRAW BATCH
// ============================================================================

/// Everything needed to issue one multi-draw-indirect for a material
#[derive(Debug, Clone, Copy)]
pub struct DrawBatch<'a> {
    pub material_index: u32,
    pub material: &'a Material,
    pub commands: &'a [DrawElementsIndirectCommand],
    /// Instance matrices, `matrices[i]` belongs to `commands[i]`
    pub matrices: &'a [Mat4],
}

impl DrawBatch<'_> {
    /// Enable the vertex animation path of the shader for this batch
    pub fn vertex_animated(&self) -> bool {
        self.material.is_vertex_animated()
    }

    /// Texture maps to bind, in binding order; `None` for invisible
    /// materials (shadow pass only)
    pub fn texture_paths(&self) -> Option<[&Path; 6]> {
        self.material.textures().map(|textures| textures.paths())
    }

    pub fn command_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.commands)
    }

    pub fn matrix_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.matrices)
    }
}

// ============================================================================
// LEVEL
// ============================================================================

/// A loaded level
#[derive(Debug)]
pub struct Level {
    buffers: MeshBuffers,
    graph: SceneGraph,
    materials: Vec<Material>,
    lights: LightSources,
    instance_counts: Vec<usize>,
    queues: FrameQueues,
    culler: FrustumCuller,
    reporter: CullStatsReporter,
    last_stats: CullStats,
}

impl Level {
    /// Import `path` with `importer` and load the result.
    ///
    /// # Errors
    ///
    /// `LoadFailed` if the importer fails, plus every error of
    /// [`from_import`](Self::from_import).
    pub fn load(importer: &dyn SceneImporter, path: &Path, config: &LevelConfig) -> Result<Self> {
        engine_info!(SOURCE, "loading level '{}'", path.display());

        let scene = importer
            .import(path)
            .map_err(|e| engine_err!(SOURCE, "cannot import '{}': {}", path.display(), e))?;

        Self::from_import(&scene, config)
    }

    /// Build a level from an already imported scene.
    ///
    /// # Errors
    ///
    /// - `InvalidScene` if validation fails or a material would need more
    ///   instances than the 16-bit slot allows
    /// - `DuplicateNode` / `LoadFailed` from the hierarchy build
    /// - `LoadFailed` from light extraction or a panicking load task
    pub fn from_import(scene: &ImportedScene, config: &LevelConfig) -> Result<Self> {
        scene.validate().map_err(|e| {
            engine_error!(SOURCE, "{}", e);
            e
        })?;

        engine_info!(
            SOURCE,
            "{} meshes ({} triangles), {} materials, {} lights",
            scene.meshes.len(),
            scene.triangle_count(),
            scene.materials.len(),
            scene.lights.len()
        );

        let (buffers, graph, materials, lights) = std::thread::scope(|s| -> Result<_> {
            let mesh_task = s.spawn(|| load_meshes(scene, config));
            let light_task = s.spawn(|| {
                engine_info!(SOURCE, "loading lights...");
                load_lights(scene, &config.roles, &config.lights)
            });

            engine_info!(SOURCE, "loading materials...");
            let materials = load_materials(&scene.materials, &config.materials);

            let buffers = match join_task(mesh_task, "mesh") {
                Ok(buffers) => buffers,
                Err(e) => {
                    let _ = join_task(light_task, "light");
                    return Err(e);
                }
            };

            engine_info!(SOURCE, "building scene hierarchy...");
            let graph = build_scene_graph(&scene.root, &buffers, &config.roles).map(|mut graph| {
                propagate_all(&mut graph);
                graph
            });

            // Both tasks are joined before any error leaves the scope
            let lights = join_task(light_task, "light");
            let graph = graph?;
            let lights = lights??;
            Ok((buffers, graph, materials, lights))
        })?;

        let instance_counts = count_instances(&graph, &buffers, materials.len())?;
        engine_info!(
            SOURCE,
            "level ready: {} nodes, {} mesh instances, {} vertices, {} indices",
            graph.node_count(),
            graph.mesh_node_count(),
            buffers.vertices().len(),
            buffers.indices().len()
        );

        Ok(Self {
            queues: FrameQueues::new(materials.len(), instance_counts.clone()),
            culler: FrustumCuller::new(config.render.cull, config.render.freeze_cull),
            reporter: CullStatsReporter::new(config.render.stats_interval),
            last_stats: CullStats::default(),
            buffers,
            graph,
            materials,
            lights,
            instance_counts,
        })
    }

    // ===== PER FRAME =====

    /// Rebuild the scene and shadow queues for `camera`
    pub fn build_frame(&mut self, camera: &Camera, selector: &dyn LodSelector) -> CullStats {
        self.culler.update(camera);
        self.last_stats = self.queues.build(&self.graph, &self.buffers, &self.culler, selector, camera);
        self.last_stats
    }

    /// Advance the culling report clock; logs the last frame's statistics
    /// once per configured interval
    pub fn report_stats(&mut self, delta_time: f32) -> bool {
        self.reporter.tick(delta_time, &self.last_stats)
    }

    pub fn last_stats(&self) -> CullStats {
        self.last_stats
    }

    /// Scene pass batches: visible materials with at least one instance
    pub fn scene_batches(&self) -> impl Iterator<Item = DrawBatch<'_>> {
        self.batches(self.queues.scene()).filter(|batch| batch.material.is_visible())
    }

    /// Shadow pass batches: every material with at least one instance
    pub fn shadow_batches(&self) -> impl Iterator<Item = DrawBatch<'_>> {
        self.batches(self.queues.shadow())
    }

    fn batches<'a>(&'a self, queue: &'a RenderQueue) -> impl Iterator<Item = DrawBatch<'a>> {
        queue
            .items()
            .iter()
            .zip(&self.materials)
            .filter(|(item, _)| !item.is_empty())
            .map(|(item, material)| DrawBatch {
                material_index: item.material_index(),
                material,
                commands: item.commands(),
                matrices: item.matrices(),
            })
    }

    pub fn scene_queue(&self) -> &RenderQueue {
        self.queues.scene()
    }

    pub fn shadow_queue(&self) -> &RenderQueue {
        self.queues.shadow()
    }

    // ===== CULLING TOGGLES =====

    pub fn set_cull(&mut self, enabled: bool) {
        self.culler.set_enabled(enabled);
    }

    pub fn set_freeze_cull(&mut self, frozen: bool) {
        self.culler.set_frozen(frozen);
    }

    pub fn culler(&self) -> &FrustumCuller {
        &self.culler
    }

    // ===== DYNAMIC UPDATES =====

    /// Replace the local transform of the node holding `role` and refresh
    /// the bounds it affects
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if the level has no node with that role.
    pub fn set_role_trs(&mut self, role: NodeRole, trs: Trs) -> Result<()> {
        let key = self.role_key(role)?;
        if let Some(node) = self.graph.node_mut(key) {
            node.trs = trs;
        }
        update_subtree(&mut self.graph, key);
        Ok(())
    }

    /// Move the node holding `role` by `offset` (local frame), e.g. the
    /// rising animated surface
    pub fn translate_role(&mut self, role: NodeRole, offset: Vec3) -> Result<()> {
        let key = self.role_key(role)?;
        let mut trs = self.graph.node(key).map(|n| n.trs).unwrap_or_default();
        trs.translation += offset;
        self.set_role_trs(role, trs)
    }

    /// Show or hide a node and its subtree
    pub fn set_node_active(&mut self, node: NodeRef, active: bool) -> Result<()> {
        let key = self.graph.resolve(node)?;
        if let Some(node) = self.graph.node_mut(key) {
            node.active = active;
        }
        Ok(())
    }

    /// False if the node or one of its ancestors is hidden
    pub fn is_node_active(&self, node: NodeRef) -> Result<bool> {
        let key = self.graph.resolve(node)?;
        Ok(self.graph.is_effectively_active(key))
    }

    fn role_key(&self, role: NodeRole) -> Result<NodeKey> {
        self.graph
            .role_node(role)
            .ok_or_else(|| Error::InvalidHandle(format!("level has no {:?} node", role)))
    }

    // ===== PHYSICS =====

    /// Static collision meshes (rigid subtree)
    pub fn rigid_physics_meshes(&self) -> Vec<PhysicsMesh> {
        collect_physics_meshes(&self.graph, &self.buffers, NodeRole::RigidRoot)
    }

    /// Simulated bodies (dynamic subtree)
    pub fn dynamic_physics_meshes(&self) -> Vec<PhysicsMesh> {
        collect_physics_meshes(&self.graph, &self.buffers, NodeRole::DynamicRoot)
    }

    /// Write back a world transform simulated by physics
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if `node` comes from another level.
    pub fn apply_physics_transform(&mut self, node: NodeRef, world: &Trs) -> Result<()> {
        let key = apply_world_trs(&mut self.graph, node, world)?;
        update_subtree(&mut self.graph, key);
        Ok(())
    }

    // ===== SHADOWS =====

    /// Orthographic projection fitted around the whole level as seen from
    /// `light_view`
    pub fn tight_light_projection(&self, light_view: &Mat4) -> Mat4 {
        tight_orthographic_projection(light_view, &self.world_bounds())
    }

    // ===== ACCESSORS =====

    pub fn buffers(&self) -> &MeshBuffers {
        &self.buffers
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn lights(&self) -> &LightSources {
        &self.lights
    }

    /// Mesh instances per material
    pub fn instance_counts(&self) -> &[usize] {
        &self.instance_counts
    }

    /// Bounds of the whole level
    pub fn world_bounds(&self) -> AABB {
        self.graph
            .node(self.graph.root())
            .map(|n| n.world_bounds)
            .unwrap_or_default()
    }

    /// Handle to the node holding `role`
    pub fn role_node(&self, role: NodeRole) -> Option<NodeRef> {
        self.graph.role_node(role).map(|key| self.graph.node_ref(key))
    }
}

// ============================================================================
// LOAD STAGES
// ============================================================================

fn join_task<T>(handle: ScopedJoinHandle<'_, T>, what: &str) -> Result<T> {
    handle
        .join()
        .map_err(|_| engine_err!(SOURCE, "{} loading task panicked", what))
}

fn load_meshes(scene: &ImportedScene, config: &LevelConfig) -> MeshBuffers {
    engine_info!(SOURCE, "loading meshes...");

    let mut buffers = MeshBuffers::new();
    for mesh in &scene.meshes {
        let optimized = optimize_mesh(&mesh.raw_vertices(), &mesh.raw_indices(), &config.optimizer);

        engine_debug!(
            SOURCE,
            "mesh [{}] {} vertices, {} triangles, LODs {:?}{}",
            mesh.name,
            optimized.vertices.len(),
            optimized.indices().len() / 3,
            optimized.lods.index_counts(),
            if optimized.lods.exhausted { " (exhausted)" } else { "" }
        );
        let stats = analyze_vertex_cache(optimized.indices(), optimized.vertices.len(), DEFAULT_FIFO_SIZE);
        engine_trace!(SOURCE, "mesh [{}] ACMR {:.3}, ATVR {:.3}", mesh.name, stats.acmr, stats.atvr);

        buffers.push_mesh(mesh.name.clone(), mesh.material_index, &optimized);
    }
    buffers
}

fn count_instances(graph: &SceneGraph, buffers: &MeshBuffers, material_count: usize) -> Result<Vec<usize>> {
    let mut counts = vec![0usize; material_count];
    for (_, node) in graph.nodes() {
        if let Some(sub_mesh) = node.mesh_index.and_then(|i| buffers.sub_mesh(i)) {
            counts[sub_mesh.material_index as usize] += 1;
        }
    }

    for (material, &count) in counts.iter().enumerate() {
        if count <= MAX_INSTANCES_PER_MATERIAL {
            continue;
        }
        return Err(engine_err!(
            SOURCE,
            Error::InvalidScene,
            "material {} has {} instances, at most {} fit the instance slot",
            material,
            count,
            MAX_INSTANCES_PER_MATERIAL
        ));
    }
    Ok(counts)
}

#[cfg(test)]
#[path = "level_tests.rs"]
mod tests;
