/// Axis-Aligned Bounding Box.
///
/// Used in model space (per mesh, computed once at load) and in world
/// space (per node, recomputed by bounds propagation). A freshly created
/// box is [`AABB::EMPTY`]: inverted infinite corners, so that the first
/// union or point insertion defines it.

use glam::{Mat4, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl AABB {
    /// Sentinel box containing nothing (min = +MAX, max = -MAX)
    pub const EMPTY: AABB = AABB {
        min: Vec3::splat(f32::MAX),
        max: Vec3::splat(f32::MIN),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `EMPTY` for no points
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut aabb = Self::EMPTY;
        for point in points {
            aabb.add_point(point);
        }
        aabb
    }

    /// `min <= max` on every axis (false for `EMPTY`)
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    pub fn add_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Componentwise union. `EMPTY` is the identity.
    pub fn union(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half size on each axis
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The 8 corners, bit i of the index selecting max on axis i
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 != 0 { self.max.x } else { self.min.x },
                if i & 2 != 0 { self.max.y } else { self.min.y },
                if i & 4 != 0 { self.max.z } else { self.min.z },
            )
        })
    }

    /// Transform this box by a matrix, returning a new axis-aligned box.
    ///
    /// All 8 corners are transformed and the result is their
    /// componentwise min/max; rotation and shear are handled, the
    /// result is exact for the transformed corners. `EMPTY` stays empty.
    pub fn transformed(&self, matrix: &Mat4) -> AABB {
        if !self.is_valid() {
            return Self::EMPTY;
        }
        Self::from_points(self.corners().iter().map(|&c| matrix.transform_point3(c)))
    }

    /// Test if this AABB fully contains another AABB.
    pub fn contains(&self, other: &AABB) -> bool {
        self.min.x <= other.min.x && self.max.x >= other.max.x
        && self.min.y <= other.min.y && self.max.y >= other.max.y
        && self.min.z <= other.min.z && self.max.z >= other.max.z
    }

    /// Like [`contains`](Self::contains) with a tolerance, for results
    /// of floating point transforms
    pub fn contains_approx(&self, other: &AABB, epsilon: f32) -> bool {
        let min_ok = (self.min - Vec3::splat(epsilon)).cmple(other.min).all();
        let max_ok = (self.max + Vec3::splat(epsilon)).cmpge(other.max).all();
        min_ok && max_ok
    }
}

#[cfg(test)]
#[path = "aabb_tests.rs"]
mod tests;
