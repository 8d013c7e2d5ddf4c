//! Mesh module - vertex layout, mesh optimization and LOD generation.
//!
//! Everything here is pure geometry processing: no GPU objects, no
//! scene knowledge. The level loader runs [`optimize_mesh`] on every
//! imported mesh and packs the results into [`MeshBuffers`].

mod buffers;
mod lod;
mod optimizer;
mod overdraw;
mod remap;
mod simplify;
mod vertex;
mod vertex_cache;
mod vertex_fetch;

pub use buffers::{LodRange, MeshBuffers, SubMesh};
pub use lod::{generate_lods, LodChain};
pub use optimizer::{optimize_mesh, OptimizedMesh};
pub use overdraw::optimize_overdraw;
pub use remap::{generate_vertex_remap, remap_index_buffer, remap_vertex_buffer, UNUSED};
pub use simplify::{simplify, simplify_sloppy};
pub use vertex::{Vertex, VERTEX_STRIDE, POSITION_OFFSET, NORMAL_OFFSET, UV_OFFSET};
pub use vertex_cache::{
    analyze_vertex_cache, optimize_vertex_cache, VertexCacheStatistics, DEFAULT_FIFO_SIZE,
};
pub use vertex_fetch::optimize_vertex_fetch;

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
