/// Per-frame render queues.
///
/// Two queues are rebuilt from scratch every frame by one depth-first
/// walk of the scene graph:
///
/// - **shadow**: every active mesh instance at LOD0, never culled
/// - **scene**: the same instances, frustum culled and LOD selected
///
/// Each queue holds one [`RenderItem`] per material: a list of indirect
/// draw commands and, at the same positions, the instances' world
/// matrices. One multi-draw-indirect per material consumes an item.
///
/// ```text
/// material 3:  commands  [ c0 | c1 | c2 ]
///              matrices  [ m0 | m1 | m2 ]
///              c1.base_instance = 3 | (1 << 16)
/// ```
///
/// Culled instances stay in the scene queue with `instance_count = 0`, so
/// both queues always hold the same instances in the same slots.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use crate::camera::{Camera, FrustumTest};
use crate::mesh::{LodRange, MeshBuffers};
use super::culler::{CullStats, FrustumCuller};
use super::hierarchy::{NodeKey, SceneGraph};
use super::lod_selector::LodSelector;

/// Bit position of the instance slot inside `base_instance`
pub const INSTANCE_SLOT_SHIFT: u32 = 16;

/// Instances a single material can hold (slot must fit 16 bits)
pub const MAX_INSTANCES_PER_MATERIAL: usize = 1 << 16;

/// Pack a material index (low 16 bits) and an instance slot (high 16 bits)
pub fn pack_base_instance(material_index: u32, slot: u32) -> u32 {
    (material_index & 0xFFFF) | (slot << INSTANCE_SLOT_SHIFT)
}

/// Inverse of [`pack_base_instance`]: `(material_index, slot)`
pub fn unpack_base_instance(base_instance: u32) -> (u32, u32) {
    (base_instance & 0xFFFF, base_instance >> INSTANCE_SLOT_SHIFT)
}

// ============================================================================
// INDIRECT COMMAND
// ============================================================================

/// Indexed indirect draw command, laid out as the GPU reads it
/// (5 x u32, 20 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawElementsIndirectCommand {
    /// Index count of the selected LOD
    pub count: u32,
    /// 1 for a drawn instance, 0 for a culled one
    pub instance_count: u32,
    /// Offset into the global index buffer
    pub first_index: u32,
    /// Mesh vertex offset into the global vertex buffer
    pub base_vertex: i32,
    /// Packed material index and instance slot
    pub base_instance: u32,
}

impl DrawElementsIndirectCommand {
    pub fn new(range: LodRange, instance_count: u32, base_vertex: u32, base_instance: u32) -> Self {
        Self {
            count: range.index_count,
            instance_count,
            first_index: range.index_offset,
            base_vertex: base_vertex as i32,
            base_instance,
        }
    }
}

// ============================================================================
// RENDER ITEM / QUEUE
// ============================================================================

/// Commands and instance matrices of one material, index-aligned
#[derive(Debug, Clone, Default)]
pub struct RenderItem {
    material_index: u32,
    commands: Vec<DrawElementsIndirectCommand>,
    matrices: Vec<Mat4>,
}

impl RenderItem {
    pub fn new(material_index: u32) -> Self {
        Self {
            material_index,
            commands: Vec::new(),
            matrices: Vec::new(),
        }
    }

    pub fn push(&mut self, command: DrawElementsIndirectCommand, matrix: Mat4) {
        self.commands.push(command);
        self.matrices.push(matrix);
    }

    /// Empty both lists, keeping at least `capacity` instances allocated
    pub fn reset(&mut self, capacity: usize) {
        self.commands.clear();
        self.matrices.clear();
        self.commands.reserve(capacity);
        self.matrices.reserve(capacity);
    }

    pub fn material_index(&self) -> u32 {
        self.material_index
    }

    pub fn commands(&self) -> &[DrawElementsIndirectCommand] {
        &self.commands
    }

    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Raw bytes of the command list for upload
    pub fn command_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.commands)
    }

    /// Raw bytes of the matrix list for upload
    pub fn matrix_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }
}

/// One [`RenderItem`] per material, indexed by material index
#[derive(Debug, Clone, Default)]
pub struct RenderQueue {
    items: Vec<RenderItem>,
}

impl RenderQueue {
    pub fn new(material_count: usize) -> Self {
        Self {
            items: (0..material_count as u32).map(RenderItem::new).collect(),
        }
    }

    /// Clear every item. Each keeps room for the larger of `capacities`
    /// (load-time instance counts) and its previous frame's size.
    pub fn reset(&mut self, capacities: &[usize]) {
        for (i, item) in self.items.iter_mut().enumerate() {
            let previous = item.len();
            let capacity = capacities.get(i).copied().unwrap_or(0).max(previous);
            item.reset(capacity);
        }
    }

    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    pub fn item(&self, material_index: u32) -> Option<&RenderItem> {
        self.items.get(material_index as usize)
    }

    /// Total number of commands over all materials
    pub fn command_count(&self) -> usize {
        self.items.iter().map(|item| item.len()).sum()
    }

    /// Commands that draw something (instance count > 0)
    pub fn drawn_count(&self) -> usize {
        self.items
            .iter()
            .flat_map(|item| item.commands())
            .filter(|c| c.instance_count > 0)
            .count()
    }

    fn item_mut(&mut self, material_index: u32) -> &mut RenderItem {
        &mut self.items[material_index as usize]
    }
}

// ============================================================================
// FRAME QUEUES
// ============================================================================

/// Read-only inputs of one queue build
struct FrameContext<'a> {
    graph: &'a SceneGraph,
    buffers: &'a MeshBuffers,
    culler: &'a FrustumCuller,
    selector: &'a dyn LodSelector,
    camera: &'a Camera,
}

/// Shadow and scene queues of the current frame
#[derive(Debug, Clone, Default)]
pub struct FrameQueues {
    shadow: RenderQueue,
    scene: RenderQueue,
    capacities: Vec<usize>,
}

impl FrameQueues {
    /// `capacities[m]` is the number of mesh instances using material `m`
    pub fn new(material_count: usize, capacities: Vec<usize>) -> Self {
        Self {
            shadow: RenderQueue::new(material_count),
            scene: RenderQueue::new(material_count),
            capacities,
        }
    }

    pub fn shadow(&self) -> &RenderQueue {
        &self.shadow
    }

    pub fn scene(&self) -> &RenderQueue {
        &self.scene
    }

    /// Rebuild both queues.
    ///
    /// Inactive nodes and their subtrees contribute nothing. The frustum
    /// test is hierarchical on the nodes' subtree bounds: an `Outside`
    /// node culls its whole subtree, an `Inside` node accepts it, both
    /// without further tests.
    ///
    /// # Panics
    ///
    /// If a node references a mesh or material missing from `buffers` or
    /// from the queues; load-time validation rules this out.
    pub fn build(
        &mut self,
        graph: &SceneGraph,
        buffers: &MeshBuffers,
        culler: &FrustumCuller,
        selector: &dyn LodSelector,
        camera: &Camera,
    ) -> CullStats {
        self.shadow.reset(&self.capacities);
        self.scene.reset(&self.capacities);

        let context = FrameContext { graph, buffers, culler, selector, camera };
        let mut stats = CullStats::default();
        self.visit(&context, graph.root(), &Mat4::IDENTITY, FrustumTest::Partial, &mut stats);
        stats
    }

    fn visit(
        &mut self,
        context: &FrameContext<'_>,
        key: NodeKey,
        parent_world: &Mat4,
        parent_test: FrustumTest,
        stats: &mut CullStats,
    ) {
        let Some(node) = context.graph.node(key) else {
            return;
        };
        if !node.active {
            return;
        }

        let world = *parent_world * node.local_matrix();
        let test = match parent_test {
            FrustumTest::Partial => context.culler.classify(&node.world_bounds),
            decided => decided,
        };

        if let Some(mesh_index) = node.mesh_index {
            let sub_mesh = &context.buffers.sub_meshes()[mesh_index as usize];
            let material = sub_mesh.material_index;

            let slot = self.shadow.item_mut(material).len() as u32;
            let base_instance = pack_base_instance(material, slot);
            let lod0 = sub_mesh.lod(0);

            self.shadow.item_mut(material).push(
                DrawElementsIndirectCommand::new(lod0, 1, sub_mesh.vertex_offset, base_instance),
                world,
            );
            stats.instances_total += 1;

            let command = if test == FrustumTest::Outside {
                DrawElementsIndirectCommand::new(lod0, 0, sub_mesh.vertex_offset, base_instance)
            } else {
                let bounds = node.model_bounds.transformed(&world);
                let level = context.selector.select(sub_mesh.lod_count(), &bounds, context.camera);
                stats.instances_visible += 1;
                DrawElementsIndirectCommand::new(sub_mesh.lod(level), 1, sub_mesh.vertex_offset, base_instance)
            };
            self.scene.item_mut(material).push(command, world);
        }

        for &child in &node.children {
            self.visit(context, child, &world, test, stats);
        }
    }
}

#[cfg(test)]
#[path = "render_queue_tests.rs"]
mod tests;
