//! Interface physics: Fresnel reflectance and the reflect/transmit choice.

use num_complex::Complex64;
use rand::Rng;
use texray_math::DVec3;

/// What happened to a ray at a single interface encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Reflected,
    Transmitted,
}

/// Unpolarized Fresnel power reflectance for a ray arriving from a medium of
/// index `n_i` onto a medium of index `n_t` at incidence angle `theta`.
///
/// Both indices may be complex. The refraction angle is taken from the
/// complex arcsine, so total internal reflection falls out as `R = 1`
/// without a special case.
pub fn fresnel_reflectance(n_i: Complex64, n_t: Complex64, theta: f64) -> f64 {
    let cos_i = Complex64::new(theta.cos(), 0.0);
    let sin_i = Complex64::new(theta.sin(), 0.0);
    let theta_t = (n_i / n_t * sin_i).asin();
    let cos_t = theta_t.cos();

    let rs = (n_i * cos_i - n_t * cos_t) / (n_i * cos_i + n_t * cos_t);
    let rp = (n_i * cos_t - n_t * cos_i) / (n_i * cos_t + n_t * cos_i);

    (0.5 * (rs.norm_sqr() + rp.norm_sqr())).clamp(0.0, 1.0)
}

/// Specular reflection of `direction` about `normal`, renormalized.
#[inline]
pub fn reflect(direction: DVec3, normal: DVec3) -> DVec3 {
    (direction - 2.0 * direction.dot(normal) * normal).normalize()
}

/// Refraction through an interface.
///
/// `normal` faces the incident side and `ratio` is `n_i / n_t` (real
/// parts). The tangential component scales by `ratio` and the normal
/// component is rebuilt from it. Past the critical angle of the real parts
/// (an absorbing medium can still transmit there) the result grazes the
/// interface. Always unit length.
#[inline]
pub fn refract(direction: DVec3, normal: DVec3, ratio: f64) -> DVec3 {
    let parallel = ratio * (direction - direction.dot(normal) * normal);
    let perpendicular = -(1.0 - parallel.length_squared()).max(0.0).sqrt() * normal;
    (parallel + perpendicular).normalize()
}

/// Draw one uniform number and reflect if it falls at or below
/// `reflectance`, otherwise refract.
pub fn reflect_or_transmit<R: Rng + ?Sized>(
    direction: DVec3,
    normal: DVec3,
    reflectance: f64,
    ratio: f64,
    rng: &mut R,
) -> (DVec3, Interaction) {
    if rng.gen::<f64>() <= reflectance {
        (reflect(direction, normal), Interaction::Reflected)
    } else {
        (refract(direction, normal, ratio), Interaction::Transmitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::FRAC_PI_2;

    fn real(n: f64) -> Complex64 {
        Complex64::new(n, 0.0)
    }

    #[test]
    fn test_normal_incidence() {
        let r = fresnel_reflectance(real(1.0), real(1.5), 0.0);
        assert!((r - 0.04).abs() < 1e-12);
    }

    #[test]
    fn test_matched_index_is_transparent() {
        for theta in [0.0, 0.3, 0.8, 1.2] {
            let r = fresnel_reflectance(real(1.7), real(1.7), theta);
            assert!(r.abs() < 1e-12, "R = {r} at theta = {theta}");
        }
    }

    #[test]
    fn test_total_internal_reflection() {
        // Critical angle from 1.5 into 1.0 is about 41.8 degrees
        let r = fresnel_reflectance(real(1.5), real(1.0), 60f64.to_radians());
        assert!((r - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_with_absorption() {
        let n_t = Complex64::new(3.6, 0.2);
        let mut theta = 0.0;
        while theta < FRAC_PI_2 {
            let r = fresnel_reflectance(real(1.0), n_t, theta);
            assert!((0.0..=1.0).contains(&r));
            let back = fresnel_reflectance(n_t, real(1.0), theta);
            assert!((0.0..=1.0).contains(&back));
            theta += 0.05;
        }
    }

    #[test]
    fn test_reflect() {
        let d = DVec3::new(1.0, 0.0, -1.0).normalize();
        let r = reflect(d, DVec3::Z);
        assert!((r - DVec3::new(1.0, 0.0, 1.0).normalize()).length() < 1e-12);
    }

    #[test]
    fn test_refract_obeys_snell() {
        let theta_i = 40f64.to_radians();
        let d = DVec3::new(theta_i.sin(), 0.0, -theta_i.cos());
        let t = refract(d, DVec3::Z, 1.0 / 1.5);

        assert!((t.length() - 1.0).abs() < 1e-12);
        assert!(t.z < 0.0);
        let sin_t = t.x;
        assert!((theta_i.sin() - 1.5 * sin_t).abs() < 1e-12);
    }

    #[test]
    fn test_refract_past_critical_angle_is_unit() {
        // Leaving n = 3.6 at 40 degrees: the real parts alone would give TIR
        let theta_i = 40f64.to_radians();
        let d = DVec3::new(theta_i.sin(), 0.0, theta_i.cos());
        assert!(fresnel_reflectance(Complex64::new(3.6, 0.1), real(1.0), theta_i) < 1.0);

        let t = refract(d, DVec3::NEG_Z, 3.6);
        assert!((t.length() - 1.0).abs() < 1e-12);
        assert!(t.z.abs() < 1e-12);
        assert!(t.x > 0.0);
    }

    #[test]
    fn test_refract_upward() {
        // Ascending ray: normal points down toward the incident medium
        let theta_i = 20f64.to_radians();
        let d = DVec3::new(0.0, theta_i.sin(), theta_i.cos());
        let t = refract(d, DVec3::NEG_Z, 1.5);
        assert!(t.z > 0.0);
        assert!((1.5 * theta_i.sin() - t.y).abs() < 1e-12);
    }

    #[test]
    fn test_reflect_or_transmit_extremes() {
        let mut rng = StdRng::seed_from_u64(42);
        let d = DVec3::NEG_Z;
        for _ in 0..100 {
            let (_, always) = reflect_or_transmit(d, DVec3::Z, 1.0, 1.0, &mut rng);
            assert_eq!(always, Interaction::Reflected);
            let (out, never) = reflect_or_transmit(d, DVec3::Z, -1.0, 1.0, &mut rng);
            assert_eq!(never, Interaction::Transmitted);
            assert_eq!(out, DVec3::NEG_Z);
        }
    }
}
