/// Detail level selection for visible instances.
///
/// A selector maps an instance's world box to an index into its mesh's
/// LOD chain. Index 0 is full detail; larger indices are coarser.

use crate::camera::Camera;
use super::aabb::AABB;

/// Strategy for picking a LOD level.
///
/// Implementations must return a value in `[0, lod_count - 1]` (0 when
/// `lod_count` is 0 or 1) and must never pick a finer level for an
/// instance that moved farther away.
pub trait LodSelector: Send + Sync {
    fn select(&self, lod_count: usize, bounds: &AABB, camera: &Camera) -> usize;
}

/// Projected-size heuristic.
///
/// The instance's bounding sphere (center and half-diagonal of the box)
/// is projected to screen pixels:
///
/// ```text
/// pixels = 2 * radius * camera.projection_scale() / distance
/// level  = floor(log2(full_detail_pixels / pixels))
/// ```
///
/// Each LOD holds about half the triangles of the previous one, so every
/// halving of the on-screen size moves one level down the chain. The
/// camera inside the sphere always gets full detail.
#[derive(Debug, Clone, Copy)]
pub struct ProjectedSizeLodSelector {
    /// On-screen diameter at and above which LOD 0 is used
    pub full_detail_pixels: f32,
}

impl Default for ProjectedSizeLodSelector {
    fn default() -> Self {
        Self {
            full_detail_pixels: 400.0,
        }
    }
}

impl ProjectedSizeLodSelector {
    pub fn new(full_detail_pixels: f32) -> Self {
        Self { full_detail_pixels }
    }
}

impl LodSelector for ProjectedSizeLodSelector {
    fn select(&self, lod_count: usize, bounds: &AABB, camera: &Camera) -> usize {
        if lod_count <= 1 || !bounds.is_valid() {
            return 0;
        }

        let radius = bounds.extents().length();
        let distance = bounds.center().distance(camera.position());
        if distance <= radius {
            return 0;
        }

        let pixels = 2.0 * radius * camera.projection_scale() / distance;
        if pixels <= 0.0 {
            return lod_count - 1;
        }

        let ratio = self.full_detail_pixels / pixels;
        if ratio <= 1.0 {
            return 0;
        }

        (ratio.log2().floor() as usize).min(lod_count - 1)
    }
}

/// Always the same level, clamped to the chain (debug views, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLodSelector(pub usize);

impl LodSelector for FixedLodSelector {
    fn select(&self, lod_count: usize, _bounds: &AABB, _camera: &Camera) -> usize {
        self.0.min(lod_count.saturating_sub(1))
    }
}

#[cfg(test)]
#[path = "lod_selector_tests.rs"]
mod tests;
