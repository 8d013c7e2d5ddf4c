/// Frustum - six clipping planes and eight corners for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing normal
/// - D is the signed distance
/// - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes
///
/// Planes and corners follow the OpenGL clip convention (depth in
/// [-1, 1]). With a [0, 1] depth projection the near plane ends up
/// slightly behind the real one, which only makes culling more
/// conservative.

use glam::{Mat4, Vec3, Vec4};
use crate::scene::AABB;

/// Result of a 3-way frustum/AABB classification.
///
/// Used by the render queue build for hierarchical culling:
/// - `Outside` → every mesh in the subtree is culled without testing
/// - `Inside` → every mesh in the subtree is visible without testing
/// - `Partial` → test children individually
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumTest {
    /// AABB is entirely outside the frustum
    Outside,
    /// AABB is entirely inside the frustum
    Inside,
    /// AABB partially overlaps the frustum
    Partial,
}

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes and the eight world-space corners.
///
/// Each plane is (A, B, C, D) where Ax + By + Cz + D = 0.
/// Normal (A, B, C) points inward (toward the visible volume).
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
    /// Corners, bit 0 of the index selecting +x, bit 1 +y, bit 2 far
    pub corners: [Vec3; 8],
}

impl Frustum {
    /// Extract frustum planes and corners from a view-projection matrix.
    ///
    /// Planes use the Gribb & Hartmann method. Corners are the
    /// canonical clip cube unprojected through the inverse matrix; for
    /// a singular matrix they are left at NaN, which disables the
    /// corner refinement of the visibility test.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let m = vp.to_cols_array_2d();

        // Gribb & Hartmann: extract planes from rows of the VP matrix
        // Each plane is normalized so that (A, B, C) is a unit vector
        let mut planes = [
            // Left:   row3 + row0
            Vec4::new(m[0][3] + m[0][0], m[1][3] + m[1][0], m[2][3] + m[2][0], m[3][3] + m[3][0]),
            // Right:  row3 - row0
            Vec4::new(m[0][3] - m[0][0], m[1][3] - m[1][0], m[2][3] - m[2][0], m[3][3] - m[3][0]),
            // Bottom: row3 + row1
            Vec4::new(m[0][3] + m[0][1], m[1][3] + m[1][1], m[2][3] + m[2][1], m[3][3] + m[3][1]),
            // Top:    row3 - row1
            Vec4::new(m[0][3] - m[0][1], m[1][3] - m[1][1], m[2][3] - m[2][1], m[3][3] - m[3][1]),
            // Near:   row3 + row2
            Vec4::new(m[0][3] + m[0][2], m[1][3] + m[1][2], m[2][3] + m[2][2], m[3][3] + m[3][2]),
            // Far:    row3 - row2
            Vec4::new(m[0][3] - m[0][2], m[1][3] - m[1][2], m[2][3] - m[2][2], m[3][3] - m[3][2]),
        ];

        // Normalize each plane
        for plane in &mut planes {
            let normal_len = Vec3::new(plane.x, plane.y, plane.z).length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        let corners = if vp.determinant().abs() > f32::EPSILON {
            let inverse = vp.inverse();
            std::array::from_fn(|i| {
                let ndc = Vec4::new(
                    if i & 1 != 0 { 1.0 } else { -1.0 },
                    if i & 2 != 0 { 1.0 } else { -1.0 },
                    if i & 4 != 0 { 1.0 } else { -1.0 },
                    1.0,
                );
                let world = inverse * ndc;
                world.truncate() / world.w
            })
        } else {
            [Vec3::NAN; 8]
        };

        Self { planes, corners }
    }

    /// Test if an AABB intersects this frustum.
    ///
    /// Uses the "positive vertex" test: for each plane, find the AABB corner
    /// most in the direction of the plane normal. If that corner is outside,
    /// the AABB is fully outside. Large boxes near a frustum edge can pass
    /// every plane while missing the volume, so the corners are then
    /// checked against each face of the box as well.
    ///
    /// Returns `true` if the AABB is (potentially) inside or intersecting.
    /// May return false positives (conservative), never false negatives.
    pub fn intersects_aabb(&self, aabb: &AABB) -> bool {
        for plane in &self.planes {
            let normal = Vec3::new(plane.x, plane.y, plane.z);

            // Find the positive vertex (corner most aligned with the normal)
            let p_vertex = Vec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );

            // If the positive vertex is outside this plane, the AABB is fully outside
            if normal.dot(p_vertex) + plane.w < 0.0 {
                return false;
            }
        }

        !self.corners_outside(aabb)
    }

    /// True if all frustum corners lie beyond one face of the box
    fn corners_outside(&self, aabb: &AABB) -> bool {
        for axis in 0..3 {
            if self.corners.iter().all(|c| c[axis] > aabb.max[axis]) {
                return true;
            }
            if self.corners.iter().all(|c| c[axis] < aabb.min[axis]) {
                return true;
            }
        }
        false
    }

    /// Classify an AABB against the frustum (3-way test).
    ///
    /// Tests both the positive vertex (p-vertex) and negative vertex (n-vertex)
    /// against each plane:
    /// - If the p-vertex is outside any plane → `Outside` (early out)
    /// - If the n-vertex is outside any plane → at least `Partial`
    /// - If all n-vertices are inside all planes → `Inside`
    ///
    /// Agrees with [`intersects_aabb`](Self::intersects_aabb): `Outside`
    /// exactly when it returns false.
    pub fn classify_aabb(&self, aabb: &AABB) -> FrustumTest {
        let mut all_inside = true;

        for plane in &self.planes {
            let normal = Vec3::new(plane.x, plane.y, plane.z);

            // Positive vertex: corner most in the direction of the normal
            let p_vertex = Vec3::new(
                if normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );

            // If the p-vertex is outside → entire AABB is outside
            if normal.dot(p_vertex) + plane.w < 0.0 {
                return FrustumTest::Outside;
            }

            // Negative vertex: corner least in the direction of the normal
            let n_vertex = Vec3::new(
                if normal.x >= 0.0 { aabb.min.x } else { aabb.max.x },
                if normal.y >= 0.0 { aabb.min.y } else { aabb.max.y },
                if normal.z >= 0.0 { aabb.min.z } else { aabb.max.z },
            );

            // If the n-vertex is outside → AABB straddles this plane
            if normal.dot(n_vertex) + plane.w < 0.0 {
                all_inside = false;
            }
        }

        if all_inside {
            FrustumTest::Inside
        } else if self.corners_outside(aabb) {
            FrustumTest::Outside
        } else {
            FrustumTest::Partial
        }
    }
}

/// Orthographic projection enclosing `bounds` as seen from `light_view`.
///
/// The 8 corners of the box are moved to light space and the projection
/// is fitted to their extent (OpenGL clip convention, looking down -Z).
/// Used to fit directional shadow maps tightly around the level.
pub fn tight_orthographic_projection(light_view: &Mat4, bounds: &AABB) -> Mat4 {
    let light_space = bounds.transformed(light_view);
    let (min, max) = (light_space.min, light_space.max);
    Mat4::orthographic_rh_gl(min.x, max.x, min.y, max.y, -max.z, -min.z)
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
