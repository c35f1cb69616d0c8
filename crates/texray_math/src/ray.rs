use crate::DVec3;

/// A geometric ray: a half-line starting at `origin` travelling along `direction`.
///
/// The direction is kept unit length by the constructors that derive it
/// (`between`); `new` stores whatever it is given.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self { origin, direction }
    }

    /// Ray starting at `from` and pointing at `to`, with a unit direction.
    pub fn between(from: DVec3, to: DVec3) -> Self {
        Self {
            origin: from,
            direction: (to - from).normalize(),
        }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }
}
