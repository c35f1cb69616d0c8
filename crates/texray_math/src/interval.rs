/// A closed range of reals `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns the size of the interval (max - min).
    pub fn size(&self) -> f64 {
        self.max - self.min
    }

    /// Returns true if x is strictly within the interval (min, max) (exclusive).
    pub fn surrounds(&self, x: f64) -> bool {
        self.min < x && x < self.max
    }

    /// Returns true if x lies in [min, max).
    pub fn contains_half_open(&self, x: f64) -> bool {
        self.min <= x && x < self.max
    }

    /// Creates an interval that surrounds two other intervals.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }

    /// An empty interval (min > max, contains nothing).
    pub const EMPTY: Interval = Interval {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    /// Strictly positive ray parameters.
    pub const FORWARD: Interval = Interval {
        min: 0.0,
        max: f64::INFINITY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_size() {
        assert_eq!(Interval::new(2.0, 7.0).size(), 5.0);
        assert_eq!(Interval::new(-5.0, 5.0).size(), 10.0);
    }

    #[test]
    fn test_interval_half_open() {
        let interval = Interval::new(1.0, 3.0);

        assert!(interval.contains_half_open(1.0));
        assert!(interval.contains_half_open(2.999));
        assert!(!interval.contains_half_open(3.0));
    }

    #[test]
    fn test_forward_excludes_origin() {
        assert!(!Interval::FORWARD.surrounds(0.0));
        assert!(Interval::FORWARD.surrounds(1e-12));
        assert!(!Interval::FORWARD.surrounds(-1.0));
    }

    #[test]
    fn test_interval_empty() {
        let empty = Interval::EMPTY;

        assert!(empty.min > empty.max);
        assert!(!empty.contains_half_open(0.0));
        assert!(!empty.surrounds(f64::INFINITY));
    }

    #[test]
    fn test_interval_surrounding() {
        let joined = Interval::surrounding(&Interval::new(1.0, 2.0), &Interval::new(-1.0, 0.5));
        assert_eq!(joined, Interval::new(-1.0, 2.0));
    }
}
