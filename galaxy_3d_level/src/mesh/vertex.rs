/// Interleaved vertex layout shared by every mesh of a level.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Position, normal and texture coordinate, tightly packed (32 bytes).
///
/// Every vertex in the global vertex buffer uses this layout; the GPU
/// side binds it as three attributes at offsets 0, 12 and 24.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Size of one vertex in bytes
pub const VERTEX_STRIDE: usize = std::mem::size_of::<Vertex>();

/// Attribute byte offsets inside a vertex
pub const POSITION_OFFSET: usize = 0;
pub const NORMAL_OFFSET: usize = 12;
pub const UV_OFFSET: usize = 24;

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, normal, uv }
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Bit pattern used for exact deduplication.
    ///
    /// Two vertices are equal for remapping purposes only if every
    /// attribute matches bit for bit.
    pub(crate) fn bits(&self) -> [u32; 8] {
        bytemuck::cast(*self)
    }
}
