//! Camera module - view description and frustum.
//!
//! The level does NOT own cameras. The caller drives one and hands it
//! to the frame build for culling and LOD selection.

mod camera;
mod frustum;

pub use camera::Camera;
pub use frustum::{
    tight_orthographic_projection,
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
