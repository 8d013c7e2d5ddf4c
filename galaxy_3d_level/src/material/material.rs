/// Level materials.
///
/// A material is either shaded with a fixed PBR texture set or invisible.
/// The texture set lives in the directory of the imported base color
/// texture, one file per map:
///
/// ```text
/// textures/stone/
///     albedo.jpg  normal.jpg  metal.jpg  rough.jpg  ao.jpg  [emissive.jpg]
/// ```
///
/// Materials without a base color texture are invisible: their instances
/// still go through the render queues (and cast shadows) but are never
/// submitted by the scene pass.
///
/// No image is decoded here. Paths are handed to the renderer, which owns
/// texture upload.

use std::path::{Path, PathBuf};
use bitflags::bitflags;
use crate::config::MaterialConfig;
use crate::engine_trace;
use crate::import::ImportedMaterial;

const SOURCE: &str = "galaxy3d::MaterialLoader";

bitflags! {
    /// Per-material rendering capabilities, fixed at load time
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        /// The vertex shader displaces vertices over time
        const VERTEX_ANIMATION = 1 << 0;
    }
}

/// File paths of a shaded material's texture maps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialTextures {
    pub directory: PathBuf,
    pub albedo: PathBuf,
    pub normal: PathBuf,
    pub metal: PathBuf,
    pub rough: PathBuf,
    pub ao: PathBuf,
    /// Optional map; the renderer falls back to black when the file
    /// does not exist
    pub emissive: PathBuf,
}

impl MaterialTextures {
    /// Texture set stored next to `base_color`
    pub fn from_base_color(base_color: &Path) -> Self {
        let directory = base_color.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            albedo: directory.join("albedo.jpg"),
            normal: directory.join("normal.jpg"),
            metal: directory.join("metal.jpg"),
            rough: directory.join("rough.jpg"),
            ao: directory.join("ao.jpg"),
            emissive: directory.join("emissive.jpg"),
            directory,
        }
    }

    /// Maps in binding order: albedo, normal, metal, rough, ao, emissive
    pub fn paths(&self) -> [&Path; 6] {
        [&self.albedo, &self.normal, &self.metal, &self.rough, &self.ao, &self.emissive]
    }
}

/// How a material is drawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaterialKind {
    Shaded(MaterialTextures),
    Invisible,
}

/// Material of the level, indexed like the imported material list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    pub flags: MaterialFlags,
}

impl Material {
    pub fn is_visible(&self) -> bool {
        matches!(self.kind, MaterialKind::Shaded(_))
    }

    pub fn textures(&self) -> Option<&MaterialTextures> {
        match &self.kind {
            MaterialKind::Shaded(textures) => Some(textures),
            MaterialKind::Invisible => None,
        }
    }

    pub fn is_vertex_animated(&self) -> bool {
        self.flags.contains(MaterialFlags::VERTEX_ANIMATION)
    }
}

/// Classify the imported materials, keeping their order
pub fn load_materials(imported: &[ImportedMaterial], config: &MaterialConfig) -> Vec<Material> {
    imported
        .iter()
        .enumerate()
        .map(|(index, source)| {
            let kind = match &source.base_color {
                Some(path) => MaterialKind::Shaded(MaterialTextures::from_base_color(path)),
                None => MaterialKind::Invisible,
            };

            let mut flags = MaterialFlags::empty();
            if config.vertex_animated.iter().any(|name| *name == source.name) {
                flags |= MaterialFlags::VERTEX_ANIMATION;
            }

            engine_trace!(SOURCE, "material [{}] {} {:?} {:?}", source.name, index + 1, kind, flags);

            Material {
                name: source.name.clone(),
                kind,
                flags,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
