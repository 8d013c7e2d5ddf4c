/// Camera culling for the render queue build.
///
/// The culler holds the frustum used for the current frame. It can be
/// disabled (everything visible) or frozen (keeps the frustum captured
/// when freezing while the camera moves on, to inspect culling from
/// outside).

use crate::camera::{Camera, Frustum, FrustumTest};
use crate::engine_debug;
use super::aabb::AABB;

const SOURCE: &str = "galaxy3d::FrustumCuller";

/// Frustum culler with debug toggles
#[derive(Debug, Clone)]
pub struct FrustumCuller {
    frustum: Option<Frustum>,
    enabled: bool,
    frozen: bool,
}

impl Default for FrustumCuller {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl FrustumCuller {
    pub fn new(enabled: bool, frozen: bool) -> Self {
        Self {
            frustum: None,
            enabled,
            frozen,
        }
    }

    /// Capture the camera frustum for this frame.
    ///
    /// While frozen the previous frustum is kept; the first update always
    /// captures one.
    pub fn update(&mut self, camera: &Camera) {
        if self.frozen && self.frustum.is_some() {
            return;
        }
        self.frustum = Some(*camera.frustum());
    }

    /// 3-way test of a world box. Disabled (or never updated) culling
    /// reports everything as `Inside`.
    pub fn classify(&self, bounds: &AABB) -> FrustumTest {
        match (&self.frustum, self.enabled) {
            (Some(frustum), true) => frustum.classify_aabb(bounds),
            _ => FrustumTest::Inside,
        }
    }

    pub fn is_visible(&self, bounds: &AABB) -> bool {
        self.classify(bounds) != FrustumTest::Outside
    }

    // ===== TOGGLES =====

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Freeze or release the frustum. Releasing picks up the camera on
    /// the next update.
    pub fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
    }

    pub fn frustum(&self) -> Option<&Frustum> {
        self.frustum.as_ref()
    }
}

// ===== STATISTICS =====

/// Instance counts of one scene queue build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CullStats {
    /// Mesh instances reached by the traversal (active ones)
    pub instances_total: u32,
    /// Instances that passed the frustum test
    pub instances_visible: u32,
}

impl CullStats {
    pub fn culled(&self) -> u32 {
        self.instances_total - self.instances_visible
    }
}

/// Periodic culling report in the log
#[derive(Debug, Clone)]
pub struct CullStatsReporter {
    interval: f32,
    elapsed: f32,
}

impl CullStatsReporter {
    /// `interval` in seconds
    pub fn new(interval: f32) -> Self {
        Self {
            interval,
            elapsed: 0.0,
        }
    }

    /// Account `delta_time` seconds; logs `stats` and returns true once
    /// per interval. A non-positive interval disables the report.
    pub fn tick(&mut self, delta_time: f32, stats: &CullStats) -> bool {
        if self.interval <= 0.0 {
            return false;
        }

        self.elapsed += delta_time;
        if self.elapsed < self.interval {
            return false;
        }
        self.elapsed = 0.0;

        engine_debug!(
            SOURCE,
            "Models loaded: {}, rendered: {}, culled: {}",
            stats.instances_total,
            stats.instances_visible,
            stats.culled()
        );
        true
    }
}

#[cfg(test)]
#[path = "culler_tests.rs"]
mod tests;
