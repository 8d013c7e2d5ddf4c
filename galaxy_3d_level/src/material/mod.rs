//! Material module - shaded/invisible classification and texture sets.

mod material;

pub use material::{load_materials, Material, MaterialFlags, MaterialKind, MaterialTextures};
