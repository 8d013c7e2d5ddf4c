/*!
# Galaxy 3D Level

Level loading and render-queue core for the Galaxy 3D engine.

An imported scene (meshes, node tree, materials, lights) is turned into
GPU-ready data: optimized vertex/index buffers with a LOD chain per mesh,
a scene graph with propagated world bounds, per-material indirect draw
queues rebuilt every frame with frustum culling and LOD selection, and
the light and physics data the rest of the engine consumes.

## Architecture

- **mesh**: vertex cache, overdraw and fetch optimization, LOD simplification, shared buffers
- **import**: in-memory representation of a scene produced by an external importer
- **scene**: hierarchy, bounds, culling, LOD selection, render queues, physics extraction
- **camera**: view/projection state and frustum tests
- **material** / **light**: material table and GPU light layouts
- **level**: the [`Level`](galaxy3d::Level) that ties everything together

No GPU API is called here; buffers and commands are exposed as byte slices
ready for upload.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod import;
pub mod mesh;
pub mod camera;
pub mod scene;
pub mod material;
pub mod light;
pub mod level;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Level entry point
    pub use crate::level::{DrawBatch, Level};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{format_entry, Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod config {
        pub use crate::config::*;
    }

    pub mod import {
        pub use crate::import::*;
    }

    pub mod mesh {
        pub use crate::mesh::*;
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod material {
        pub use crate::material::*;
    }

    pub mod light {
        pub use crate::light::*;
    }
}

// Re-export math library at crate root
pub use glam;
