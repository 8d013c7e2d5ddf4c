use glam::{Quat, Vec3};
use crate::camera::Camera;
use crate::mesh::{LodChain, MeshBuffers, OptimizedMesh, Vertex};
use crate::scene::bounds::propagate_all;
use crate::scene::hierarchy::HierarchyNode;
use crate::scene::lod_selector::{FixedLodSelector, ProjectedSizeLodSelector};
use crate::scene::transform::Trs;
use super::*;

// ============================================================================
// Helpers
// ============================================================================

/// Unit quad in the XY plane with a two level chain (6 then 3 indices)
fn quad_mesh() -> OptimizedMesh {
    let v = |x: f32, y: f32| Vertex { position: [x, y, 0.0], normal: [0.0, 0.0, 1.0], uv: [x, y] };
    OptimizedMesh {
        vertices: vec![v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)],
        lods: LodChain {
            lods: vec![vec![0, 1, 2, 0, 2, 3], vec![0, 1, 2]],
            exhausted: false,
        },
    }
}

/// Mesh 0 and 2 use material 0, mesh 1 uses material 1
fn buffers() -> MeshBuffers {
    let mut buffers = MeshBuffers::new();
    buffers.push_mesh("a", 0, &quad_mesh());
    buffers.push_mesh("b", 1, &quad_mesh());
    buffers.push_mesh("c", 0, &quad_mesh());
    buffers
}

fn mesh_node(name: &str, mesh_index: u32, position: Vec3, buffers: &MeshBuffers) -> HierarchyNode {
    let mut node = HierarchyNode::new(name, Trs::new(Vec3::ONE, Quat::IDENTITY, position));
    node.mesh_index = Some(mesh_index);
    node.model_bounds = buffers.sub_mesh(mesh_index).unwrap().bounds;
    node
}

/// Camera at z=10 looking down -Z
fn camera() -> Camera {
    Camera::perspective(
        Vec3::new(0.0, 0.0, 10.0),
        Vec3::ZERO,
        Vec3::Y,
        std::f32::consts::FRAC_PI_2,
        1.0,
        0.1,
        100.0,
        720.0,
    )
}

fn culler() -> FrustumCuller {
    let mut culler = FrustumCuller::default();
    culler.update(&camera());
    culler
}

fn build(queues: &mut FrameQueues, graph: &SceneGraph, buffers: &MeshBuffers, culler: &FrustumCuller) -> CullStats {
    queues.build(graph, buffers, culler, &FixedLodSelector(0), &camera())
}

fn assert_aligned(queue: &RenderQueue) {
    for item in queue.items() {
        assert_eq!(item.commands().len(), item.matrices().len());
        for (slot, command) in item.commands().iter().enumerate() {
            assert_eq!(unpack_base_instance(command.base_instance), (item.material_index(), slot as u32));
        }
    }
}

// ============================================================================
// Packing
// ============================================================================

#[test]
fn test_command_layout() {
    assert_eq!(std::mem::size_of::<DrawElementsIndirectCommand>(), 20);
    let item = {
        let mut item = RenderItem::new(0);
        item.push(DrawElementsIndirectCommand::default(), Mat4::IDENTITY);
        item
    };
    assert_eq!(item.command_bytes().len(), 20);
    assert_eq!(item.matrix_bytes().len(), 64);
}

#[test]
fn test_pack_base_instance() {
    assert_eq!(pack_base_instance(3, 0), 3);
    assert_eq!(pack_base_instance(3, 2), 3 | (2 << 16));
    assert_eq!(unpack_base_instance(pack_base_instance(0xFFFF, 0xFFFF)), (0xFFFF, 0xFFFF));
}

// ============================================================================
// Queue build
// ============================================================================

#[test]
fn test_active_and_inactive_nodes() {
    let buffers = buffers();
    let mut graph = SceneGraph::new(HierarchyNode::new("root", Trs::IDENTITY));
    let root = graph.root();
    graph.add_child(root, mesh_node("on", 0, Vec3::ZERO, &buffers)).unwrap();
    let off = graph.add_child(root, mesh_node("off", 0, Vec3::new(2.0, 0.0, 0.0), &buffers)).unwrap();
    graph.node_mut(off).unwrap().active = false;
    propagate_all(&mut graph);

    let mut queues = FrameQueues::new(2, vec![2, 1]);
    let stats = build(&mut queues, &graph, &buffers, &culler());

    let scene = queues.scene().item(0).unwrap();
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.commands()[0].instance_count, 1);
    assert_eq!(queues.shadow().command_count(), 1);
    assert_eq!(stats, CullStats { instances_total: 1, instances_visible: 1 });
}

#[test]
fn test_inactive_parent_hides_subtree() {
    let buffers = buffers();
    let mut graph = SceneGraph::new(HierarchyNode::new("root", Trs::IDENTITY));
    let root = graph.root();
    let group = graph.add_child(root, HierarchyNode::new("group", Trs::IDENTITY)).unwrap();
    graph.add_child(group, mesh_node("a", 0, Vec3::ZERO, &buffers)).unwrap();
    graph.add_child(group, mesh_node("b", 1, Vec3::ZERO, &buffers)).unwrap();
    graph.node_mut(group).unwrap().active = false;
    propagate_all(&mut graph);

    let mut queues = FrameQueues::new(2, Vec::new());
    let stats = build(&mut queues, &graph, &buffers, &culler());

    assert_eq!(queues.scene().command_count(), 0);
    assert_eq!(queues.shadow().command_count(), 0);
    assert_eq!(stats.instances_total, 0);
}

#[test]
fn test_culled_instance_keeps_zero_instance_command() {
    let buffers = buffers();
    let mut graph = SceneGraph::new(HierarchyNode::new("root", Trs::IDENTITY));
    let root = graph.root();
    graph.add_child(root, mesh_node("front", 0, Vec3::ZERO, &buffers)).unwrap();
    graph.add_child(root, mesh_node("behind", 0, Vec3::new(0.0, 0.0, 20.0), &buffers)).unwrap();
    propagate_all(&mut graph);

    let mut queues = FrameQueues::new(2, Vec::new());
    let stats = build(&mut queues, &graph, &buffers, &culler());

    let scene = queues.scene().item(0).unwrap();
    assert_eq!(scene.len(), 2);
    assert_eq!(scene.commands()[0].instance_count, 1);
    assert_eq!(scene.commands()[1].instance_count, 0);
    assert_eq!(scene.commands()[1].count, 6);

    // Shadow queue is never culled
    let shadow = queues.shadow().item(0).unwrap();
    assert!(shadow.commands().iter().all(|c| c.instance_count == 1));

    assert_eq!(stats.instances_total, 2);
    assert_eq!(stats.instances_visible, 1);
    assert_eq!(stats.culled(), 1);
    assert_eq!(queues.scene().drawn_count(), 1);
}

#[test]
fn test_outside_group_culls_whole_subtree() {
    let buffers = buffers();
    let mut graph = SceneGraph::new(HierarchyNode::new("root", Trs::IDENTITY));
    let root = graph.root();
    let far = graph
        .add_child(root, HierarchyNode::new("far", Trs::new(Vec3::ONE, Quat::IDENTITY, Vec3::new(500.0, 0.0, 0.0))))
        .unwrap();
    graph.add_child(far, mesh_node("a", 0, Vec3::ZERO, &buffers)).unwrap();
    graph.add_child(far, mesh_node("b", 1, Vec3::new(1.0, 0.0, 0.0), &buffers)).unwrap();
    propagate_all(&mut graph);

    let mut queues = FrameQueues::new(2, Vec::new());
    let stats = build(&mut queues, &graph, &buffers, &culler());

    assert_eq!(stats.instances_total, 2);
    assert_eq!(stats.instances_visible, 0);
    assert_eq!(queues.scene().command_count(), 2);
    assert_eq!(queues.scene().drawn_count(), 0);
    assert_eq!(queues.shadow().drawn_count(), 2);
}

#[test]
fn test_commands_and_matrices_aligned_per_material() {
    let buffers = buffers();
    let mut graph = SceneGraph::new(HierarchyNode::new("root", Trs::IDENTITY));
    let root = graph.root();
    for i in 0..7 {
        let mesh = (i % 3) as u32;
        let z = if i % 2 == 0 { 0.0 } else { 30.0 };
        graph.add_child(root, mesh_node(&format!("n{}", i), mesh, Vec3::new(i as f32, 0.0, z), &buffers)).unwrap();
    }
    propagate_all(&mut graph);

    let mut queues = FrameQueues::new(2, Vec::new());
    build(&mut queues, &graph, &buffers, &culler());

    assert_aligned(queues.scene());
    assert_aligned(queues.shadow());
    for (scene, shadow) in queues.scene().items().iter().zip(queues.shadow().items()) {
        assert_eq!(scene.matrices(), shadow.matrices());
        let scene_slots: Vec<u32> = scene.commands().iter().map(|c| c.base_instance).collect();
        let shadow_slots: Vec<u32> = shadow.commands().iter().map(|c| c.base_instance).collect();
        assert_eq!(scene_slots, shadow_slots);
    }
    assert_eq!(queues.scene().command_count(), 7);
}

#[test]
fn test_command_addresses_sub_mesh_and_world_matrix() {
    let buffers = buffers();
    let mut graph = SceneGraph::new(HierarchyNode::new("root", Trs::IDENTITY));
    let root = graph.root();
    let group = graph
        .add_child(root, HierarchyNode::new("group", Trs::new(Vec3::ONE, Quat::IDENTITY, Vec3::new(1.0, 0.0, 0.0))))
        .unwrap();
    graph.add_child(group, mesh_node("c", 2, Vec3::new(0.0, 2.0, 0.0), &buffers)).unwrap();
    propagate_all(&mut graph);

    let mut queues = FrameQueues::new(2, Vec::new());
    build(&mut queues, &graph, &buffers, &culler());

    let sub_mesh = buffers.sub_mesh(2).unwrap();
    let item = queues.scene().item(0).unwrap();
    let command = item.commands()[0];
    assert_eq!(command.first_index, sub_mesh.lods[0].index_offset);
    assert_eq!(command.count, 6);
    assert_eq!(command.base_vertex, sub_mesh.vertex_offset as i32);
    assert_eq!(command.base_vertex, 8);
    assert!((item.matrices()[0].w_axis.truncate() - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
}

#[test]
fn test_scene_queue_uses_selected_lod() {
    let buffers = buffers();
    let mut graph = SceneGraph::new(HierarchyNode::new("root", Trs::IDENTITY));
    let root = graph.root();
    graph.add_child(root, mesh_node("a", 0, Vec3::ZERO, &buffers)).unwrap();
    propagate_all(&mut graph);

    let mut queues = FrameQueues::new(2, Vec::new());
    queues.build(&graph, &buffers, &culler(), &FixedLodSelector(1), &camera());

    let lod1 = buffers.sub_mesh(0).unwrap().lods[1];
    let scene = queues.scene().item(0).unwrap().commands()[0];
    assert_eq!(scene.count, 3);
    assert_eq!(scene.first_index, lod1.index_offset);

    let shadow = queues.shadow().item(0).unwrap().commands()[0];
    assert_eq!(shadow.count, 6);
    assert_eq!(shadow.first_index, 0);

    // Far away with the projected-size heuristic lands on the last LOD
    let mut graph = SceneGraph::new(HierarchyNode::new("root", Trs::IDENTITY));
    let root = graph.root();
    graph.add_child(root, mesh_node("a", 0, Vec3::new(0.0, 0.0, -80.0), &buffers)).unwrap();
    propagate_all(&mut graph);
    queues.build(&graph, &buffers, &culler(), &ProjectedSizeLodSelector::default(), &camera());
    assert_eq!(queues.scene().item(0).unwrap().commands()[0].count, 3);
}

#[test]
fn test_rebuild_starts_from_scratch() {
    let buffers = buffers();
    let mut graph = SceneGraph::new(HierarchyNode::new("root", Trs::IDENTITY));
    let root = graph.root();
    let node = graph.add_child(root, mesh_node("a", 1, Vec3::ZERO, &buffers)).unwrap();
    propagate_all(&mut graph);

    let mut queues = FrameQueues::new(2, vec![0, 1]);
    let culler = culler();
    build(&mut queues, &graph, &buffers, &culler);
    build(&mut queues, &graph, &buffers, &culler);
    assert_eq!(queues.scene().command_count(), 1);
    assert_eq!(queues.shadow().command_count(), 1);

    graph.node_mut(node).unwrap().active = false;
    build(&mut queues, &graph, &buffers, &culler);
    assert_eq!(queues.scene().command_count(), 0);
}

#[test]
fn test_disabled_culling_draws_everything() {
    let buffers = buffers();
    let mut graph = SceneGraph::new(HierarchyNode::new("root", Trs::IDENTITY));
    let root = graph.root();
    graph.add_child(root, mesh_node("behind", 0, Vec3::new(0.0, 0.0, 50.0), &buffers)).unwrap();
    propagate_all(&mut graph);

    let mut culler = culler();
    culler.set_enabled(false);
    let mut queues = FrameQueues::new(2, Vec::new());
    let stats = build(&mut queues, &graph, &buffers, &culler);

    assert_eq!(stats.instances_visible, 1);
    assert_eq!(queues.scene().drawn_count(), 1);
}
