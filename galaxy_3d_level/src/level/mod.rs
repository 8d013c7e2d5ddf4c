//! Level module - loading and per-frame entry points.

mod level;

pub use level::{DrawBatch, Level};
