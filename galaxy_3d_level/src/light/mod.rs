//! Light module - directional and point lights in GPU layout.

mod light;

pub use light::{load_lights, DirectionalLight, LightSources, PointLight};
