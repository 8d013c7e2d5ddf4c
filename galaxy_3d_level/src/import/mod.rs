//! Import module - the opaque scene handed over by the asset parser.

mod imported;
mod importer;

pub use imported::{
    ImportedLight, ImportedLightKind, ImportedMaterial, ImportedMesh, ImportedNode,
    ImportedScene, DEFAULT_NORMAL, DEFAULT_UV, MAX_MATERIALS,
};
pub use importer::SceneImporter;
