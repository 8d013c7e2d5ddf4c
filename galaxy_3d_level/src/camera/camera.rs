/// Camera - passive view description for culling and LOD selection.
///
/// The caller drives the camera: it sets the view and projection
/// matrices each frame. The camera keeps the derived data consistent
/// (world position, frustum) so the render queue build can read them
/// without recomputing per node.

use glam::{Mat4, Vec3};
use super::frustum::Frustum;

/// Low-level camera. Owned and driven by the caller.
#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    position: Vec3,
    frustum: Frustum,
    viewport_height: f32,
}

impl Camera {
    /// Create a camera from view and projection matrices.
    ///
    /// `viewport_height` is in pixels and feeds the projected-size LOD
    /// heuristic.
    pub fn new(view: Mat4, projection: Mat4, viewport_height: f32) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
            position: position_from_view(&view),
            frustum: Frustum::from_view_projection(&(projection * view)),
            viewport_height,
        }
    }

    /// Right-handed perspective camera looking from `eye` at `target`.
    #[allow(clippy::too_many_arguments)]
    pub fn perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
        viewport_height: f32,
    ) -> Self {
        Self::new(
            Mat4::look_at_rh(eye, target, up),
            Mat4::perspective_rh_gl(fov_y, aspect, near, far),
            viewport_height,
        )
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    /// Projection matrix (perspective or orthographic).
    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Frustum of the current view-projection.
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    /// Pixels covered by one world unit at distance 1.
    ///
    /// A sphere of radius `r` at distance `d` covers about
    /// `2 * r * projection_scale() / d` pixels on screen.
    pub fn projection_scale(&self) -> f32 {
        self.projection_matrix.y_axis.y.abs() * self.viewport_height * 0.5
    }

    // ===== SETTERS =====

    /// Set the view matrix. Position and frustum follow.
    pub fn set_view(&mut self, matrix: Mat4) {
        self.view_matrix = matrix;
        self.position = position_from_view(&matrix);
        self.refresh_frustum();
    }

    /// Set the projection matrix. The frustum follows.
    pub fn set_projection(&mut self, matrix: Mat4) {
        self.projection_matrix = matrix;
        self.refresh_frustum();
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height;
    }

    fn refresh_frustum(&mut self) {
        self.frustum = Frustum::from_view_projection(&self.view_projection_matrix());
    }
}

fn position_from_view(view: &Mat4) -> Vec3 {
    view.inverse().w_axis.truncate()
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
