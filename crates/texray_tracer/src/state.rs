//! Per-ray mutable state carried through the stack.

use serde::{Deserialize, Serialize};
use texray_math::{DVec3, Ray};

/// Vertical travel direction through the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Moving toward -z, from the incidence medium toward the substrate
    Descending,
    /// Moving toward +z
    Ascending,
}

impl Side {
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Side::Descending => Side::Ascending,
            Side::Ascending => Side::Descending,
        }
    }
}

/// Kind of a recorded path point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaypointKind {
    /// Where the ray was launched
    Start,
    /// A surface intersection
    Hit,
    /// Re-entry on the opposite side of the unit cell
    Translation,
    /// A point just past the last interaction of a surface approach
    Exit,
}

/// One recorded point of a ray path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub point: DVec3,
    pub kind: WaypointKind,
}

/// Everything that changes while a ray travels.
#[derive(Debug, Clone)]
pub struct RayState {
    pub ray: Ray,
    pub side: Side,
    /// Medium the ray currently travels in
    pub medium: usize,
    /// Surface the ray approaches next
    pub surface: usize,
    pub intensity: f64,
    path: Option<Vec<Waypoint>>,
}

impl RayState {
    /// A fresh ray in the incidence medium, heading for surface 0.
    pub fn launch(ray: Ray, keep_path: bool) -> Self {
        let mut state = Self {
            ray,
            side: Side::Descending,
            medium: 0,
            surface: 0,
            intensity: 1.0,
            path: keep_path.then(Vec::new),
        };
        state.record(ray.origin, WaypointKind::Start);
        state
    }

    /// Append a path point if paths are being kept.
    #[inline]
    pub fn record(&mut self, point: DVec3, kind: WaypointKind) {
        if let Some(path) = self.path.as_mut() {
            path.push(Waypoint { point, kind });
        }
    }

    pub fn take_path(&mut self) -> Vec<Waypoint> {
        self.path.take().unwrap_or_default()
    }
}
