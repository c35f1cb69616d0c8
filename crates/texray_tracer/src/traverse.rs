//! Beer-Lambert attenuation across a homogeneous layer.

use crate::state::Side;

/// Result of crossing one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    /// Absorbed power density at each depth position of the layer, in the
    /// stack's top-down order
    pub profile: Vec<f64>,
    /// Intensity reaching the far side
    pub intensity: f64,
    /// Whether the ray dropped below the intensity threshold
    pub absorbed: bool,
}

/// Attenuate a ray of intensity `intensity` crossing a layer of `width` at
/// polar angle `theta`.
///
/// `positions` are depths measured from the top of the layer. The density
/// `(α/|cos θ|)·I·exp(-α·z/|cos θ|)` is evaluated from the entry face, so an
/// ascending ray's profile is reversed to put it back in top-down order.
pub fn traverse(
    width: f64,
    theta: f64,
    alpha: f64,
    intensity: f64,
    positions: &[f64],
    threshold: f64,
    side: Side,
) -> Traversal {
    let cos = theta.cos().abs();

    let (mut profile, remaining) = if alpha == 0.0 {
        (vec![0.0; positions.len()], intensity)
    } else if cos < f64::EPSILON {
        // Travels parallel to the layer; nothing gets through
        (vec![0.0; positions.len()], 0.0)
    } else {
        let k = alpha / cos;
        let profile = positions
            .iter()
            .map(|&z| k * intensity * (-k * z).exp())
            .collect();
        (profile, intensity * (-k * width).exp())
    };

    if side == Side::Ascending {
        profile.reverse();
    }

    Traversal {
        profile,
        intensity: remaining,
        absorbed: remaining < threshold,
    }
}
