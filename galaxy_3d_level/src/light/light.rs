/// Light extraction from the imported scene.
///
/// Lights are authored as nodes under the light container node, each
/// referencing an imported light by name:
///
/// ```text
/// Lights
/// ├── SunPre            directional: pre-rotation node
/// │   └── SunPost           post-rotation node
/// │       └── Sun               light node (name matches the light)
/// └── Lamp              point: the node itself, no children
/// ```
///
/// A directional light's rotation is `pre * light * post`; the stored
/// direction is the imported direction rotated by it and negated (it
/// points toward the light). Point lights sit at their node's origin.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3, Vec4};
use rustc_hash::FxHashMap;
use crate::config::{LightConfig, NodeRoleNames};
use crate::error::Result;
use crate::import::{ImportedLight, ImportedLightKind, ImportedNode, ImportedScene};
use crate::scene::NodeRole;
use crate::{engine_bail, engine_debug, engine_warn};

const SOURCE: &str = "galaxy3d::LightLoader";

/// GPU layout of a directional light (32 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirectionalLight {
    /// Direction toward the light, w = 1
    pub direction: Vec4,
    /// Scaled color, w = 1
    pub intensity: Vec4,
}

/// GPU layout of a point light (32 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLight {
    /// World position, w = 1
    pub position: Vec4,
    /// Color, w = 1
    pub intensity: Vec4,
}

/// All lights of a level
#[derive(Debug, Clone, Default)]
pub struct LightSources {
    pub directional: Vec<DirectionalLight>,
    pub point: Vec<PointLight>,
}

impl LightSources {
    pub fn len(&self) -> usize {
        self.directional.len() + self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn directional_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.directional)
    }

    pub fn point_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.point)
    }
}

/// Extract every light under the light container.
///
/// A level without a light container has no lights.
///
/// # Errors
///
/// `LoadFailed` if a light node names no imported light, names a light
/// of the other kind, or a directional chain is incomplete.
pub fn load_lights(scene: &ImportedScene, roles: &NodeRoleNames, config: &LightConfig) -> Result<LightSources> {
    let mut sources = LightSources::default();

    let Some(container) = find_container(&scene.root, roles) else {
        engine_warn!(SOURCE, "no '{}' node, level has no lights", roles.light_container);
        return Ok(sources);
    };

    let light_map: FxHashMap<&str, &ImportedLight> =
        scene.lights.iter().map(|l| (l.name.as_str(), l)).collect();

    for child in &container.children {
        if child.children.len() == 1 {
            sources.directional.push(directional_light(child, &light_map, config)?);
        } else {
            sources.point.push(point_light(child, &light_map)?);
        }
    }

    engine_debug!(
        SOURCE,
        "{} directional, {} point lights",
        sources.directional.len(),
        sources.point.len()
    );
    Ok(sources)
}

fn find_container<'a>(node: &'a ImportedNode, roles: &NodeRoleNames) -> Option<&'a ImportedNode> {
    if roles.classify(&node.name) == NodeRole::LightContainer {
        return Some(node);
    }
    node.children.iter().find_map(|child| find_container(child, roles))
}

fn lookup<'a>(light_map: &FxHashMap<&str, &'a ImportedLight>, name: &str) -> Result<&'a ImportedLight> {
    match light_map.get(name) {
        Some(light) => Ok(*light),
        None => engine_bail!(SOURCE, "light node '{}' has no matching light source", name),
    }
}

fn rotation_of(matrix: &Mat4) -> Quat {
    matrix.to_scale_rotation_translation().1.normalize()
}

fn directional_light(
    pre: &ImportedNode,
    light_map: &FxHashMap<&str, &ImportedLight>,
    config: &LightConfig,
) -> Result<DirectionalLight> {
    let post = &pre.children[0];
    let Some(node) = post.children.first() else {
        engine_bail!(SOURCE, "directional light '{}' misses its light node under '{}'", pre.name, post.name);
    };

    let light = lookup(light_map, &node.name)?;
    let ImportedLightKind::Directional { direction } = light.kind else {
        engine_bail!(SOURCE, "light '{}' is placed as directional but is a point light", light.name);
    };

    let rotation = rotation_of(&pre.transform) * rotation_of(&node.transform) * rotation_of(&post.transform);
    let direction: Vec3 = -(rotation * direction);

    Ok(DirectionalLight {
        direction: direction.extend(1.0),
        intensity: (light.color * config.directional_intensity_scale).extend(1.0),
    })
}

fn point_light(node: &ImportedNode, light_map: &FxHashMap<&str, &ImportedLight>) -> Result<PointLight> {
    let light = lookup(light_map, &node.name)?;
    if light.kind != ImportedLightKind::Point {
        engine_bail!(SOURCE, "light '{}' is placed as point light but is directional", light.name);
    }

    Ok(PointLight {
        position: node.transform * Vec4::W,
        intensity: light.color.extend(1.0),
    })
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
