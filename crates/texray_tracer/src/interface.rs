//! One surface approach: repeated hits on a textured interface until the
//! ray leaves it for good.

use log::{debug, warn};
use num_complex::Complex64;
use rand::Rng;
use texray_core::SurfaceMesh;
use texray_math::{DVec3, Ray};

use crate::fresnel::{fresnel_reflectance, reflect_or_transmit, Interaction};
use crate::geometry::{exit_side, intersect};
use crate::state::{RayState, Side, WaypointKind};

/// Distance a ray is pushed past a hit point before the next test.
const NUDGE: f64 = 1e-9;

/// Vertical direction component below which a missing ray counts as level
/// and is not followed into further cells.
const LEVEL: f64 = 1e-12;

/// Summary of a completed surface approach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    /// Net effect: the ray ends on the side it came from, or on the other one
    pub interaction: Interaction,
    /// Number of triangle hits during the approach
    pub hits: usize,
    /// Number of moves into a neighbouring cell
    pub translations: usize,
    /// Whether the tracked side agrees with where the ray leaves the band
    pub consistent: bool,
}

/// Move the ray origin to a height clear of `mesh` on the side it arrives
/// from, keeping its lateral position.
///
/// Successive surfaces are each defined in their own vertical frame, so a
/// ray leaving one surface is re-anchored before it meets the next.
pub fn anchor_to(state: &mut RayState, mesh: &SurfaceMesh) {
    let z = match state.side {
        Side::Descending => mesh.z_max() + 1.0,
        Side::Ascending => mesh.z_min() - 1.0,
    };
    state.ray.origin.z = z;
}

/// Bounce the ray off `mesh` until it leaves the surface for good.
///
/// A ray that misses every triangle of the unit cell is carried through the
/// cell boundary into the neighbouring period and tested again, as long as
/// it can still reach the height band `[z_min, z_max]` of the surface.
///
/// The ray ends on the side it arrived from (net reflection, travel
/// direction reversed) or on the far side (net transmission).
///
/// `above` and `below` are the complex indices of the media on either side
/// of the surface. At most `max_interactions` hits and translations are
/// followed; if the limit is reached the ray is released on whichever side
/// it is currently on.
pub fn cross_interface<R: Rng + ?Sized>(
    state: &mut RayState,
    mesh: &SurfaceMesh,
    above: Complex64,
    below: Complex64,
    max_interactions: usize,
    rng: &mut R,
) -> Crossing {
    let starts_above = state.side == Side::Descending;
    let mut is_above = starts_above;
    state.ray.origin = mesh.wrap_into_cell(state.ray.origin);

    let mut hits = 0;
    let mut translations = 0;

    loop {
        if hits + translations >= max_interactions {
            warn!(
                "Ray still on the surface after {} hits and {} translations; releasing it",
                hits, translations
            );
            break;
        }

        if let Some(hit) = intersect(&state.ray, mesh) {
            hits += 1;

            // Normal and indices oriented toward the side the ray is on
            let (normal, n_i, n_t) = if is_above {
                (hit.normal, above, below)
            } else {
                (-hit.normal, below, above)
            };
            let reflectance = fresnel_reflectance(n_i, n_t, hit.incidence_angle);

            let (direction, interaction) =
                reflect_or_transmit(state.ray.direction, normal, reflectance, n_i.re / n_t.re, rng);
            if interaction == Interaction::Transmitted {
                is_above = !is_above;
            }

            state.record(hit.point, WaypointKind::Hit);
            state.ray.direction = direction;
            state.ray.origin = hit.point + direction * NUDGE;
            continue;
        }

        // Missed this cell: follow the ray into the neighbouring one unless
        // it runs level or has already left the height band for good
        let d_z = state.ray.direction.z;
        if d_z.abs() < LEVEL {
            break;
        }
        let Some((side, t)) = exit_side(&state.ray, mesh) else {
            break;
        };
        let boundary = state.ray.at(t);
        let clear = (d_z < 0.0 && boundary.z < mesh.z_min())
            || (d_z > 0.0 && boundary.z > mesh.z_max());
        if clear {
            break;
        }

        translations += 1;
        state.ray.origin = boundary + side.translation(mesh.width(), mesh.height());
        state.record(state.ray.origin, WaypointKind::Translation);
    }

    let exit = state.ray.at(2.0);
    state.record(exit, WaypointKind::Exit);

    let consistent = band_exit(&state.ray, mesh).map_or(true, |p| mesh.is_above(p) == is_above);
    if !consistent {
        debug!(
            "Tracked side disagrees with ray position after {} hits and {} translations",
            hits, translations
        );
    }

    let interaction = if is_above == starts_above {
        state.side = state.side.flipped();
        Interaction::Reflected
    } else {
        Interaction::Transmitted
    };

    Crossing {
        interaction,
        hits,
        translations,
        consistent,
    }
}

/// Point where the ray leaves the height band of `mesh`, one unit clear of
/// it. `None` for a horizontal ray.
fn band_exit(ray: &Ray, mesh: &SurfaceMesh) -> Option<DVec3> {
    let d_z = ray.direction.z;
    let z = if d_z < 0.0 {
        mesh.z_min() - 1.0
    } else if d_z > 0.0 {
        mesh.z_max() + 1.0
    } else {
        return None;
    };
    let t = (z - ray.origin.z) / d_z;
    (t > 0.0).then(|| ray.at(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use texray_core::texture::{planar, regular_pyramids};

    fn real(n: f64) -> Complex64 {
        Complex64::new(n, 0.0)
    }

    #[test]
    fn test_matched_planar_transmits() {
        let mesh = planar(1.0, 1.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let ray = Ray::new(DVec3::new(0.2, 0.7, 1.0), DVec3::new(0.3, 0.1, -1.0).normalize());
        let mut state = RayState::launch(ray, false);
        let crossing = cross_interface(&mut state, &mesh, real(1.4), real(1.4), 100, &mut rng);

        assert_eq!(crossing.interaction, Interaction::Transmitted);
        assert_eq!(crossing.hits, 1);
        assert!(crossing.consistent);
        assert_eq!(state.side, Side::Descending);
        assert!((state.ray.direction - ray.direction).length() < 1e-12);
    }

    #[test]
    fn test_total_internal_reflection_from_below() {
        let mesh = planar(1.0, 1.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let theta = 60f64.to_radians();
        let ray = Ray::new(
            DVec3::new(0.5, 0.5, -1.0),
            DVec3::new(theta.sin(), 0.0, theta.cos()),
        );
        let mut state = RayState::launch(ray, false);
        state.side = Side::Ascending;
        let crossing = cross_interface(&mut state, &mesh, real(1.0), real(1.5), 100, &mut rng);

        assert_eq!(crossing.interaction, Interaction::Reflected);
        assert_eq!(state.side, Side::Descending);
        assert!(state.ray.direction.z < 0.0);
    }

    #[test]
    fn test_ray_entering_outside_cell_is_wrapped() {
        let mesh = planar(1.0, 1.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let ray = Ray::new(DVec3::new(3.25, -1.5, 1.0), DVec3::NEG_Z);
        let mut state = RayState::launch(ray, true);
        let crossing = cross_interface(&mut state, &mesh, real(1.0), real(1.0), 100, &mut rng);

        assert_eq!(crossing.hits, 1);
        let path = state.take_path();
        let hit = path.iter().find(|w| w.kind == WaypointKind::Hit).unwrap();
        assert!((hit.point - DVec3::new(0.25, 0.5, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_steep_pyramids_bounce_across_cells() {
        // Launched from the dense side, the first hit is past the critical
        // angle; the reflected ray leaves the cell and meets the
        // neighbouring pyramid after one translation
        let mesh = regular_pyramids(1.0, 70f64.to_radians()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let ray = Ray::new(DVec3::new(0.1, 0.5, 5.0), DVec3::NEG_Z);
        let mut state = RayState::launch(ray, true);
        anchor_to(&mut state, &mesh);
        let crossing = cross_interface(&mut state, &mesh, real(1.5), real(1.0), 100, &mut rng);

        assert!(crossing.hits >= 2);
        let path = state.take_path();
        assert!(path.iter().any(|w| w.kind == WaypointKind::Translation));
    }

    #[test]
    fn test_interaction_limit() {
        let mesh = regular_pyramids(1.0, 70f64.to_radians()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let ray = Ray::new(DVec3::new(0.1, 0.5, 5.0), DVec3::NEG_Z);
        let mut state = RayState::launch(ray, false);
        let crossing = cross_interface(&mut state, &mesh, real(1.0), real(1.5), 1, &mut rng);

        assert_eq!(crossing.hits, 1);
    }

    #[test]
    fn test_anchor_to() {
        let mesh = regular_pyramids(1.0, 45f64.to_radians()).unwrap();
        let ray = Ray::new(DVec3::new(0.3, 0.3, -7.0), DVec3::NEG_Z);

        let mut state = RayState::launch(ray, false);
        anchor_to(&mut state, &mesh);
        assert!((state.ray.origin.z - (mesh.z_max() + 1.0)).abs() < 1e-12);

        state.side = Side::Ascending;
        anchor_to(&mut state, &mesh);
        assert_eq!(state.ray.origin.z, -1.0);
        assert_eq!(state.ray.origin.x, 0.3);
    }

    #[test]
    fn test_leaving_absorbing_medium_keeps_unit_direction() {
        // Past the critical angle of the real parts, 3.6+0.1i still lets a
        // few percent through; those rays leave level with the interface
        let silicon = Complex64::new(3.6, 0.1);
        let theta = 40f64.to_radians();
        let mut rng = StdRng::seed_from_u64(42);

        let flat = planar(1.0, 1.0, 0.0).unwrap();
        let mut transmitted = 0;
        for _ in 0..2000 {
            let ray = Ray::new(
                DVec3::new(0.1, 0.5, -0.5),
                DVec3::new(theta.sin(), 0.0, theta.cos()),
            );
            let mut state = RayState::launch(ray, false);
            state.side = Side::Ascending;
            let crossing = cross_interface(&mut state, &flat, real(1.0), silicon, 1000, &mut rng);

            assert!((state.ray.direction.length() - 1.0).abs() < 1e-12);
            assert!(crossing.translations <= 1);
            if crossing.interaction == Interaction::Transmitted {
                transmitted += 1;
                assert!(state.ray.direction.z.abs() < 1e-12);
            }
        }
        assert!(transmitted > 0);

        let pyramids = regular_pyramids(1.0, 55f64.to_radians()).unwrap();
        for i in 0..2000 {
            let x = 0.05 + 0.9 * (i % 40) as f64 / 40.0;
            let ray = Ray::new(DVec3::new(x, 0.3, 0.0), DVec3::Z);
            let mut state = RayState::launch(ray, false);
            state.side = Side::Ascending;
            anchor_to(&mut state, &pyramids);
            cross_interface(&mut state, &pyramids, real(1.0), silicon, 1000, &mut rng);

            assert!((state.ray.direction.length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_level_ray_is_not_carried_across_cells() {
        let mesh = planar(1.0, 1.0, 0.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let ray = Ray::new(DVec3::new(0.4, 0.5, 0.0), DVec3::new(1.0, 0.2, 0.0).normalize());
        let mut state = RayState::launch(ray, false);
        let crossing = cross_interface(&mut state, &mesh, real(1.0), real(1.5), 1000, &mut rng);

        assert_eq!(crossing.hits, 0);
        assert!(crossing.translations <= 1);
        assert!(crossing.consistent);
    }

    #[test]
    fn test_release_at_limit_is_flagged_inconsistent() {
        // Totally reflected downward at the first facet, then released while
        // still tracked above the surface
        let mesh = regular_pyramids(1.0, 70f64.to_radians()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let ray = Ray::new(DVec3::new(0.1, 0.5, 5.0), DVec3::NEG_Z);
        let mut state = RayState::launch(ray, false);
        anchor_to(&mut state, &mesh);
        let crossing = cross_interface(&mut state, &mesh, real(1.5), real(1.0), 1, &mut rng);

        assert_eq!(crossing.hits, 1);
        assert_eq!(crossing.interaction, Interaction::Reflected);
        assert_eq!(state.side, Side::Ascending);
        assert!(state.ray.direction.z < 0.0);
        assert!(!crossing.consistent);
    }
}
