/// Level configuration.
///
/// Plain data supplied by the host application. Every section has a
/// `Default` matching the content conventions the level files are
/// authored with (node names, material names, light intensity scale).

use crate::scene::NodeRole;

/// LOD chain generation parameters
#[derive(Debug, Clone)]
pub struct LodConfig {
    /// Keep simplifying while the current LOD has more indices than this
    pub target_index_count: usize,
    /// Maximum number of LOD levels, LOD0 included
    pub max_lods: usize,
    /// Error tolerance of the topology-preserving simplifier,
    /// relative to the mesh extent
    pub target_error: f32,
    /// A simplification counts as progress only if the result has fewer
    /// than `min_reduction * input` indices
    pub min_reduction: f32,
}

impl Default for LodConfig {
    fn default() -> Self {
        Self {
            target_index_count: 1024,
            max_lods: 8,
            target_error: 0.02,
            min_reduction: 0.9,
        }
    }
}

/// Mesh optimization parameters
#[derive(Debug, Clone)]
pub struct MeshOptimizerConfig {
    /// Acceptable vertex cache degradation when reordering for overdraw
    pub overdraw_threshold: f32,
    /// LOD chain parameters
    pub lod: LodConfig,
}

impl Default for MeshOptimizerConfig {
    fn default() -> Self {
        Self {
            overdraw_threshold: 1.05,
            lod: LodConfig::default(),
        }
    }
}

/// Node names that carry a special role
///
/// Names are matched exactly, once, while the scene graph is built.
#[derive(Debug, Clone)]
pub struct NodeRoleNames {
    pub dynamic_root: String,
    pub rigid_root: String,
    pub animated_surface: String,
    pub light_container: String,
    /// Roles whose absence is a load error
    pub required: Vec<NodeRole>,
}

impl NodeRoleNames {
    /// Role a node name maps to, `NodeRole::None` if it has no special meaning
    pub fn classify(&self, name: &str) -> NodeRole {
        if name == self.dynamic_root {
            NodeRole::DynamicRoot
        } else if name == self.rigid_root {
            NodeRole::RigidRoot
        } else if name == self.animated_surface {
            NodeRole::AnimatedSurface
        } else if name == self.light_container {
            NodeRole::LightContainer
        } else {
            NodeRole::None
        }
    }

    /// Configured name for a role
    pub fn name_of(&self, role: NodeRole) -> Option<&str> {
        match role {
            NodeRole::None => None,
            NodeRole::DynamicRoot => Some(&self.dynamic_root),
            NodeRole::RigidRoot => Some(&self.rigid_root),
            NodeRole::AnimatedSurface => Some(&self.animated_surface),
            NodeRole::LightContainer => Some(&self.light_container),
        }
    }
}

impl Default for NodeRoleNames {
    fn default() -> Self {
        Self {
            dynamic_root: "Dynamic".to_string(),
            rigid_root: "Rigid".to_string(),
            animated_surface: "Lava1".to_string(),
            light_container: "Lights".to_string(),
            required: Vec::new(),
        }
    }
}

/// Material classification parameters
#[derive(Debug, Clone)]
pub struct MaterialConfig {
    /// Materials whose shader displaces vertices at draw time
    pub vertex_animated: Vec<String>,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            vertex_animated: vec!["Lava_1".to_string()],
        }
    }
}

/// Light import parameters
#[derive(Debug, Clone)]
pub struct LightConfig {
    /// Multiplier applied to directional light colors (the authoring tool
    /// normalizes them)
    pub directional_intensity_scale: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            directional_intensity_scale: 3.0,
        }
    }
}

/// Per-frame rendering switches
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Frustum culling enabled
    pub cull: bool,
    /// Keep the last culling frustum while the camera moves (debug)
    pub freeze_cull: bool,
    /// Seconds between two culling reports in the log
    pub stats_interval: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cull: true,
            freeze_cull: false,
            stats_interval: 2.0,
        }
    }
}

/// Complete level configuration
#[derive(Debug, Clone, Default)]
pub struct LevelConfig {
    pub optimizer: MeshOptimizerConfig,
    pub roles: NodeRoleNames,
    pub materials: MaterialConfig,
    pub lights: LightConfig,
    pub render: RenderConfig,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
