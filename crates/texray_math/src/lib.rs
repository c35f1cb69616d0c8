//! Math primitives for texray.
//!
//! All geometry is double precision: surface textures are often specified
//! in micrometres with nanometre-scale features, and ray/triangle tests near
//! facet edges need the extra headroom.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
