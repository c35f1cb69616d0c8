use crate::{DVec3, Interval};

/// Axis-aligned bounding box, one interval per axis.
///
/// Surface meshes use it for their lateral unit cell (x, y) and their
/// height range (z).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// An empty box; surrounding it with anything yields that thing.
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// Create an AABB from two corner points.
    pub fn from_points(a: DVec3, b: DVec3) -> Self {
        Self {
            x: Interval::new(a.x.min(b.x), a.x.max(b.x)),
            y: Interval::new(a.y.min(b.y), a.y.max(b.y)),
            z: Interval::new(a.z.min(b.z), a.z.max(b.z)),
        }
    }

    /// Tightest box around a set of points. Empty input gives `Aabb::EMPTY`.
    pub fn enclosing(points: &[DVec3]) -> Self {
        points.iter().fold(Aabb::EMPTY, |acc, p| {
            Aabb::surrounding(&acc, &Aabb::from_points(*p, *p))
        })
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }
}
