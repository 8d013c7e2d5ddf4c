/// Local transform of a hierarchy node, stored decomposed.

use glam::{Mat4, Quat, Vec3};

/// Scale, rotation, translation. Composes as `T * R * S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trs {
    pub scale: Vec3,
    /// Always normalized
    pub rotation: Quat,
    pub translation: Vec3,
}

impl Default for Trs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Trs {
    pub const IDENTITY: Trs = Trs {
        scale: Vec3::ONE,
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    pub fn new(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self {
            scale,
            rotation: rotation.normalize(),
            translation,
        }
    }

    /// Decompose an affine matrix.
    ///
    /// The rotation comes out of glam already oriented for the
    /// right-handed convention used everywhere in the level, and is
    /// renormalized to absorb rounding. Shear is lost.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self::new(scale, rotation, translation)
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
