//! Full ray histories through a stack.

use log::{trace, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use texray_core::{DepthGrid, OpticalSlice, Stack, SurfaceMesh};
use texray_math::{DVec3, Ray};

use crate::fresnel::Interaction;
use crate::interface::{anchor_to, cross_interface};
use crate::state::{RayState, Side, Waypoint, WaypointKind};
use crate::traverse::traverse;

/// How a ray history ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RayOutcome {
    /// Left through the top into the incidence medium
    Reflected,
    /// Left through the bottom into the substrate
    Transmitted,
    /// Intensity fell below the threshold inside a layer
    Absorbed,
    /// Still bouncing between surfaces after the pass limit
    Trapped,
}

/// Everything the tracer needs for one wavelength.
#[derive(Debug, Clone, Copy)]
pub struct TraceContext<'a> {
    pub stack: &'a Stack,
    pub optics: &'a OpticalSlice,
    pub depth: &'a DepthGrid,
    /// Intensity below which a ray counts as absorbed
    pub threshold: f64,
    /// Hit limit for a single surface approach
    pub max_interactions: usize,
    /// Limit on surface approaches per ray
    pub max_passes: usize,
    pub keep_path: bool,
}

/// The result of tracing one ray.
#[derive(Debug, Clone, PartialEq)]
pub struct RayTrace {
    pub outcome: RayOutcome,
    /// Intensity left when the ray exited or was stopped
    pub intensity: f64,
    /// Absorbed power density over the full depth grid
    pub profile: Vec<f64>,
    /// Intensity lost in each medium
    pub layer_absorption: Vec<f64>,
    /// Outgoing polar angle and azimuth; `None` unless the ray escaped
    pub direction: Option<(f64, f64)>,
    /// Surface approaches whose side-comparison result disagrees with where
    /// the ray actually leaves the surface
    pub inconsistent: usize,
    pub path: Vec<Waypoint>,
}

impl RayTrace {
    /// Total intensity absorbed along the way.
    pub fn absorbed(&self) -> f64 {
        self.layer_absorption.iter().sum()
    }
}

/// Incident ray aimed at `(x, y, 0)` from polar angle `theta` and azimuth
/// `phi`, starting one unit above the highest point of `front`.
pub fn incident_ray(front: &SurfaceMesh, x: f64, y: f64, theta: f64, phi: f64) -> Ray {
    let target = DVec3::new(x, y, 0.0);
    let r = (front.z_max() + 1.0) / theta.cos();
    let origin = target
        + r * DVec3::new(
            theta.sin() * phi.cos(),
            theta.sin() * phi.sin(),
            theta.cos(),
        );
    Ray::between(origin, target)
}

/// Polar angle and azimuth of a unit direction.
#[inline]
pub fn direction_angles(direction: DVec3) -> (f64, f64) {
    let theta = direction.z.clamp(-1.0, 1.0).acos();
    let phi = direction.y.atan2(direction.x);
    (theta, phi)
}

/// Follow one ray from the incidence medium until it leaves the stack or is
/// absorbed.
///
/// Each pass is a surface approach followed by a crossing of the medium the
/// ray ends up in: absorbed intensity accumulates per medium and on the
/// depth grid, and the loop stops once the ray descends into the last medium
/// or ascends into the first.
pub fn trace_ray<R: Rng + ?Sized>(ctx: &TraceContext<'_>, ray: Ray, rng: &mut R) -> RayTrace {
    let surfaces = ctx.stack.surfaces();
    let widths = ctx.stack.widths();
    let last = ctx.stack.medium_count() - 1;

    let mut state = RayState::launch(ray, ctx.keep_path);
    let mut profile = vec![0.0; ctx.depth.len()];
    let mut layer_absorption = vec![0.0; ctx.stack.medium_count()];
    let mut outcome = RayOutcome::Trapped;
    let mut inconsistent = 0;

    for _ in 0..ctx.max_passes {
        let s = state.surface;
        let mesh = &surfaces[s];
        anchor_to(&mut state, mesh);
        let crossing = cross_interface(
            &mut state,
            mesh,
            ctx.optics.index[s],
            ctx.optics.index[s + 1],
            ctx.max_interactions,
            rng,
        );
        if !crossing.consistent {
            inconsistent += 1;
        }

        // Transmission moves the ray into the next medium; either way it
        // heads for the next surface in its (possibly reversed) direction
        if crossing.interaction == Interaction::Transmitted {
            state.medium = match state.side {
                Side::Descending => s + 1,
                Side::Ascending => s,
            };
        }

        let m = state.medium;
        let (theta, _) = direction_angles(state.ray.direction);
        let layer = ctx.depth.layer(m);
        let crossed = traverse(
            widths[m],
            theta,
            ctx.optics.alpha[m],
            state.intensity,
            &layer.local,
            ctx.threshold,
            state.side,
        );

        layer_absorption[m] += state.intensity - crossed.intensity;
        for (acc, value) in profile[layer.range.clone()].iter_mut().zip(&crossed.profile) {
            *acc += value;
        }
        state.intensity = crossed.intensity;

        if crossed.absorbed {
            outcome = RayOutcome::Absorbed;
            break;
        }
        match state.side {
            Side::Descending if m == last => {
                outcome = RayOutcome::Transmitted;
                break;
            }
            Side::Ascending if m == 0 => {
                outcome = RayOutcome::Reflected;
                break;
            }
            _ => {}
        }

        // Inside a layer, the surface ahead is the one bounding medium m
        state.surface = match state.side {
            Side::Descending => m,
            Side::Ascending => m - 1,
        };
    }

    if outcome == RayOutcome::Trapped {
        warn!(
            "Ray trapped after {} passes with intensity {:.3e}",
            ctx.max_passes, state.intensity
        );
    }

    let direction = match outcome {
        RayOutcome::Reflected | RayOutcome::Transmitted => {
            Some(direction_angles(state.ray.direction))
        }
        RayOutcome::Absorbed | RayOutcome::Trapped => None,
    };

    trace!(
        "Ray finished: {:?}, intensity {:.4}, direction {:?}",
        outcome,
        state.intensity,
        direction
    );

    RayTrace {
        outcome,
        intensity: state.intensity,
        profile,
        layer_absorption,
        direction,
        inconsistent,
        path: state.take_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use texray_core::texture::{planar, regular_pyramids};
    use texray_core::Medium;

    fn slab(n: f64, k: f64, width: f64) -> Stack {
        let wl = [1000.0];
        Stack::new(
            vec![
                Medium::constant("air", 1.0, 0.0, &wl),
                Medium::constant("slab", n, k, &wl),
                Medium::constant("air", 1.0, 0.0, &wl),
            ],
            vec![planar(1.0, 1.0, 0.0).unwrap(), planar(1.0, 1.0, 0.0).unwrap()],
            vec![width],
        )
        .unwrap()
    }

    fn context<'a>(stack: &'a Stack, optics: &'a OpticalSlice, depth: &'a DepthGrid) -> TraceContext<'a> {
        TraceContext {
            stack,
            optics,
            depth,
            threshold: 1e-4,
            max_interactions: 100,
            max_passes: 1000,
            keep_path: true,
        }
    }

    #[test]
    fn test_incident_ray_geometry() {
        let mesh = planar(1.0, 1.0, 0.0).unwrap();
        let theta = 0.4;
        let phi = 1.1;
        let ray = incident_ray(&mesh, 0.3, 0.6, theta, phi);

        assert!((ray.origin.z - 1.0).abs() < 1e-12);
        let (t, p) = direction_angles(-ray.direction);
        assert!((t - theta).abs() < 1e-12);
        assert!((p - phi).abs() < 1e-12);

        // Lands on the target
        let s = -ray.origin.z / ray.direction.z;
        assert!((ray.at(s) - DVec3::new(0.3, 0.6, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_index_matched_slab_transmits_straight() {
        let stack = slab(1.0, 0.0, 10.0);
        let optics = stack.slice(0);
        let depth = DepthGrid::new(stack.widths(), 1.0).unwrap();
        let ctx = context(&stack, &optics, &depth);
        let mut rng = StdRng::seed_from_u64(42);

        let ray = incident_ray(&stack.surfaces()[0], 0.5, 0.5, 0.3, 0.2);
        let result = trace_ray(&ctx, ray, &mut rng);

        assert_eq!(result.outcome, RayOutcome::Transmitted);
        assert_eq!(result.intensity, 1.0);
        let (theta, phi) = result.direction.unwrap();
        assert!((theta - (std::f64::consts::PI - 0.3)).abs() < 1e-9);
        // The ray travels away from its source azimuth
        assert!((phi - (0.2 - std::f64::consts::PI)).abs() < 1e-9);
        assert!(result.path.iter().filter(|w| w.kind == WaypointKind::Hit).count() == 2);
    }

    #[test]
    fn test_energy_is_conserved() {
        let stack = slab(3.5, 0.01, 20.0);
        let optics = stack.slice(0);
        let depth = DepthGrid::new(stack.widths(), 0.5).unwrap();
        let ctx = context(&stack, &optics, &depth);
        let mut rng = StdRng::seed_from_u64(42);

        for i in 0..200 {
            let theta = 1.4 * i as f64 / 200.0;
            let ray = incident_ray(&stack.surfaces()[0], 0.5, 0.5, theta, 0.0);
            let result = trace_ray(&ctx, ray, &mut rng);
            assert!((result.intensity + result.absorbed() - 1.0).abs() < 1e-9);
            assert!(result.layer_absorption[0] == 0.0);
            assert!(result.layer_absorption[2] == 0.0);
        }
    }

    #[test]
    fn test_threshold_absorbs_immediately() {
        let stack = slab(1.0, 0.0, 10.0);
        let optics = stack.slice(0);
        let depth = DepthGrid::new(stack.widths(), 1.0).unwrap();
        let mut ctx = context(&stack, &optics, &depth);
        ctx.threshold = 2.0;
        let mut rng = StdRng::seed_from_u64(42);

        let ray = incident_ray(&stack.surfaces()[0], 0.5, 0.5, 0.0, 0.0);
        let result = trace_ray(&ctx, ray, &mut rng);

        assert_eq!(result.outcome, RayOutcome::Absorbed);
        assert!(result.direction.is_none());
    }

    #[test]
    fn test_released_ray_counts_as_inconsistent() {
        // Dense incidence medium over steep pyramids: the first hit is
        // totally reflected downward and the ray is released right there
        let wl = [1000.0];
        let stack = Stack::new(
            vec![
                Medium::constant("glass", 1.5, 0.0, &wl),
                Medium::constant("gap", 1.0, 0.0, &wl),
                Medium::constant("air", 1.0, 0.0, &wl),
            ],
            vec![
                regular_pyramids(1.0, 70f64.to_radians()).unwrap(),
                planar(1.0, 1.0, 0.0).unwrap(),
            ],
            vec![5.0],
        )
        .unwrap();
        let optics = stack.slice(0);
        let depth = DepthGrid::new(stack.widths(), 1.0).unwrap();
        let mut ctx = context(&stack, &optics, &depth);
        ctx.max_interactions = 1;
        let mut rng = StdRng::seed_from_u64(42);

        let ray = incident_ray(&stack.surfaces()[0], 0.1, 0.5, 0.0, 0.0);
        let result = trace_ray(&ctx, ray, &mut rng);

        assert_eq!(result.outcome, RayOutcome::Reflected);
        assert_eq!(result.inconsistent, 1);
        let (theta, _) = result.direction.unwrap();
        assert!(theta > std::f64::consts::FRAC_PI_2);
    }

    #[test]
    fn test_clean_slab_has_no_inconsistent_approaches() {
        let stack = slab(1.5, 0.0, 10.0);
        let optics = stack.slice(0);
        let depth = DepthGrid::new(stack.widths(), 1.0).unwrap();
        let ctx = context(&stack, &optics, &depth);
        let mut rng = StdRng::seed_from_u64(42);

        for i in 0..100 {
            let ray = incident_ray(&stack.surfaces()[0], 0.5, 0.5, 0.014 * i as f64, 0.7);
            assert_eq!(trace_ray(&ctx, ray, &mut rng).inconsistent, 0);
        }
    }
}
