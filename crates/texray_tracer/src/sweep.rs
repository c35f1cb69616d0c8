//! Wavelength and incident-angle sweep.
//!
//! One rayon task traces every lateral launch position for one incident
//! angle at one wavelength. Tasks own their random generator, seeded from
//! the sweep seed and the task's indices, so results do not depend on
//! scheduling. Scattering counts are merged per wavelength and the matrix
//! columns normalised once at the end.

use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use texray_core::{AngleBinLookup, DepthGrid, GridError, ScatteringMatrix, Stack, StackError};

use crate::config::SweepConfig;
use crate::state::Waypoint;
use crate::tracer::{incident_ray, trace_ray, RayOutcome, TraceContext};

/// Errors that can occur while setting up a sweep.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("sweep needs at least one ray")]
    NoRays,

    #[error("sweep needs at least one wavelength")]
    NoWavelengths,

    #[error("lateral launch grid is empty ({nx} x {ny})")]
    EmptyLateralGrid { nx: usize, ny: usize },

    #[error("intensity threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),

    #[error("interaction and pass limits must be at least 1")]
    InvalidLimit,

    #[error("sweep lists {requested} wavelengths but the stack has optical data for {available}")]
    WavelengthOutOfRange { requested: usize, available: usize },

    #[error("angle grid has no incoming bins")]
    NoIncomingBins,

    #[error(transparent)]
    Stack(#[from] StackError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type for sweep operations.
pub type SweepResult<T> = Result<T, SweepError>;

/// One incident direction of the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncidentAngle {
    pub theta: f64,
    pub phi: f64,
    /// Incoming bin of the direction, if it falls on the grid
    pub bin: Option<usize>,
}

/// Everything measured at one wavelength.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WavelengthResult {
    /// Wavelength in nm
    pub wavelength: f64,
    /// Outgoing bin × incoming bin redistribution matrix
    pub matrix: ScatteringMatrix,
    /// Absorption profile per incident angle, averaged over launch positions
    pub absorption_profiles: Vec<Vec<f64>>,
    /// Absorbed fraction per medium per incident angle
    pub layer_absorption: Vec<Vec<f64>>,
    /// Fraction of rays that left through the top
    pub reflected: f64,
    /// Fraction of rays that left through the bottom
    pub transmitted: f64,
    /// Fraction of rays stopped by the intensity threshold
    pub absorbed: f64,
    /// Fraction of rays still bouncing at the pass limit
    pub trapped: f64,
    /// Surface approaches classified by side comparison against the ray's
    /// actual exit position
    pub inconsistent_fallbacks: usize,
    /// Waypoint paths per ray, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<Vec<Waypoint>>>,
}

/// Output of a complete sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutput {
    /// Depth positions (µm) shared by every absorption profile
    pub depth: Vec<f64>,
    pub angles: Vec<IncidentAngle>,
    pub wavelengths: Vec<WavelengthResult>,
}

/// Accumulated results of one incident angle over the lateral grid.
struct AngleRun {
    profile: Vec<f64>,
    layer_absorption: Vec<f64>,
    outgoing: Vec<(f64, f64)>,
    counts: [usize; 4],
    inconsistent: usize,
    paths: Vec<Vec<Waypoint>>,
}

/// Evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Seed for one (wavelength, angle) task.
fn task_seed(seed: u64, wavelength: usize, angle: usize) -> u64 {
    let mixed = seed ^ ((wavelength as u64) << 32) ^ angle as u64;
    mixed.wrapping_mul(0x9E37_79B9_7F4A_7C15).rotate_left(17) ^ seed
}

/// Incident directions for the sweep.
///
/// Random mode draws theta in [0, π/2) and phi in [0, 2π). Otherwise the
/// centres of the incoming bins are used, skipping the normal-incidence bin
/// unless it is the only one, and repeated until `count` angles exist.
pub fn incident_angles(
    grid: &dyn AngleBinLookup,
    count: usize,
    random: bool,
    seed: u64,
) -> SweepResult<Vec<IncidentAngle>> {
    let pairs: Vec<(f64, f64)> = if random {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let theta = rng.gen::<f64>() * std::f64::consts::FRAC_PI_2;
                let phi = rng.gen::<f64>() * std::f64::consts::TAU;
                (theta, phi)
            })
            .collect()
    } else {
        let incoming = grid.incoming_len();
        let first = if incoming > 1 { 1 } else { 0 };
        let centres: Vec<(f64, f64)> = (first..incoming).filter_map(|b| grid.centre(b)).collect();
        if centres.is_empty() {
            return Err(SweepError::NoIncomingBins);
        }
        centres.into_iter().cycle().take(count).collect()
    };

    Ok(pairs
        .into_iter()
        .map(|(theta, phi)| IncidentAngle {
            theta,
            phi,
            bin: grid.bin(theta, phi),
        })
        .collect())
}

/// Run a sweep with the angle grid described by `config`.
pub fn sweep(stack: &Stack, config: &SweepConfig) -> SweepResult<SweepOutput> {
    let grid = config.angle_grid()?;
    sweep_with_grid(stack, config, &grid)
}

/// Run a sweep, binning outgoing directions with `grid`.
pub fn sweep_with_grid(
    stack: &Stack,
    config: &SweepConfig,
    grid: &dyn AngleBinLookup,
) -> SweepResult<SweepOutput> {
    config.validate()?;
    if config.wavelengths.len() != stack.wavelength_count() {
        return Err(SweepError::WavelengthOutOfRange {
            requested: config.wavelengths.len(),
            available: stack.wavelength_count(),
        });
    }

    let depth = DepthGrid::new(stack.widths(), config.depth_spacing)?;
    let angles = incident_angles(grid, config.angle_count(), config.random_angles, config.seed)?;

    match config.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
            Ok(pool.install(|| run(stack, config, grid, depth, angles)))
        }
        None => Ok(run(stack, config, grid, depth, angles)),
    }
}

fn run(
    stack: &Stack,
    config: &SweepConfig,
    grid: &dyn AngleBinLookup,
    depth: DepthGrid,
    angles: Vec<IncidentAngle>,
) -> SweepOutput {
    let front = &stack.surfaces()[0];
    let origin = front.cell_origin();
    let (lx, ly) = (front.width(), front.height());
    let xs = linspace(origin.x + lx / 100.0, origin.x + lx - lx / 100.0, config.nx);
    let ys = linspace(origin.y + ly / 100.0, origin.y + ly - ly / 100.0, config.ny);
    let positions: Vec<(f64, f64)> = ys
        .iter()
        .flat_map(|&y| xs.iter().map(move |&x| (x, y)))
        .collect();

    info!(
        "Tracing {} wavelengths x {} angles x {} positions ({} depth points, {} bins)",
        config.wavelengths.len(),
        angles.len(),
        positions.len(),
        depth.len(),
        grid.len()
    );
    let start = Instant::now();

    let wavelengths: Vec<WavelengthResult> = config
        .wavelengths
        .par_iter()
        .enumerate()
        .map(|(wl, &wavelength)| {
            let optics = stack.slice(wl);
            let ctx = TraceContext {
                stack,
                optics: &optics,
                depth: &depth,
                threshold: config.intensity_threshold,
                max_interactions: config.max_interactions,
                max_passes: config.max_passes,
                keep_path: config.keep_paths,
            };

            let runs: Vec<AngleRun> = angles
                .par_iter()
                .enumerate()
                .map(|(ai, angle)| {
                    let mut rng = StdRng::seed_from_u64(task_seed(config.seed, wl, ai));
                    trace_angle(&ctx, angle, &positions, &mut rng)
                })
                .collect();

            let result = reduce(wavelength, grid, &angles, runs, positions.len());
            debug!(
                "{} nm: R = {:.4}, T = {:.4}, A = {:.4}, {} matrix entries",
                wavelength,
                result.reflected,
                result.transmitted,
                result.absorbed,
                result.matrix.nnz()
            );
            result
        })
        .collect();

    info!(
        "Traced {} rays in {:.2?}",
        config.wavelengths.len() * angles.len() * positions.len(),
        start.elapsed()
    );

    SweepOutput {
        depth: depth.positions().to_vec(),
        angles,
        wavelengths,
    }
}

fn trace_angle<R: Rng + ?Sized>(
    ctx: &TraceContext<'_>,
    angle: &IncidentAngle,
    positions: &[(f64, f64)],
    rng: &mut R,
) -> AngleRun {
    let front = &ctx.stack.surfaces()[0];
    let mut run = AngleRun {
        profile: vec![0.0; ctx.depth.len()],
        layer_absorption: vec![0.0; ctx.stack.medium_count()],
        outgoing: Vec::with_capacity(positions.len()),
        counts: [0; 4],
        inconsistent: 0,
        paths: Vec::new(),
    };

    for &(x, y) in positions {
        let ray = incident_ray(front, x, y, angle.theta, angle.phi);
        let mut trace = trace_ray(ctx, ray, rng);

        for (acc, value) in run.profile.iter_mut().zip(&trace.profile) {
            *acc += value;
        }
        for (acc, value) in run.layer_absorption.iter_mut().zip(&trace.layer_absorption) {
            *acc += value;
        }
        if let Some(direction) = trace.direction {
            run.outgoing.push(direction);
        }
        run.counts[outcome_slot(trace.outcome)] += 1;
        run.inconsistent += trace.inconsistent;
        if ctx.keep_path {
            run.paths.push(std::mem::take(&mut trace.path));
        }
    }

    let n = positions.len() as f64;
    run.profile.iter_mut().for_each(|v| *v /= n);
    run.layer_absorption.iter_mut().for_each(|v| *v /= n);
    run
}

fn outcome_slot(outcome: RayOutcome) -> usize {
    match outcome {
        RayOutcome::Reflected => 0,
        RayOutcome::Transmitted => 1,
        RayOutcome::Absorbed => 2,
        RayOutcome::Trapped => 3,
    }
}

/// Merge the per-angle runs of one wavelength.
fn reduce(
    wavelength: f64,
    grid: &dyn AngleBinLookup,
    angles: &[IncidentAngle],
    runs: Vec<AngleRun>,
    per_angle: usize,
) -> WavelengthResult {
    let mut matrix = ScatteringMatrix::new(grid.len(), grid.incoming_len());
    let mut counts = [0usize; 4];
    let mut absorption_profiles = Vec::with_capacity(runs.len());
    let mut layer_absorption = Vec::with_capacity(runs.len());
    let mut paths = Vec::new();
    let mut off_grid = 0usize;
    let mut inconsistent_fallbacks = 0usize;

    for (angle, run) in angles.iter().zip(runs) {
        if let Some(inc) = angle.bin {
            for &(theta, phi) in &run.outgoing {
                let placed = grid.bin(theta, phi).is_some_and(|out| matrix.add(out, inc, 1.0));
                if !placed {
                    off_grid += 1;
                }
            }
        }
        for (total, count) in counts.iter_mut().zip(run.counts) {
            *total += count;
        }
        inconsistent_fallbacks += run.inconsistent;
        absorption_profiles.push(run.profile);
        layer_absorption.push(run.layer_absorption);
        paths.extend(run.paths);
    }

    if off_grid > 0 {
        debug!("{} nm: {} outgoing rays fell outside the angle grid", wavelength, off_grid);
    }
    if inconsistent_fallbacks > 0 {
        debug!(
            "{} nm: {} surface approaches ended on the opposite side to their classification",
            wavelength, inconsistent_fallbacks
        );
    }
    matrix.normalize_columns();

    let total = (angles.len() * per_angle).max(1) as f64;
    WavelengthResult {
        wavelength,
        matrix,
        absorption_profiles,
        layer_absorption,
        reflected: counts[0] as f64 / total,
        transmitted: counts[1] as f64 / total,
        absorbed: counts[2] as f64 / total,
        trapped: counts[3] as f64 / total,
        inconsistent_fallbacks,
        paths: (!paths.is_empty()).then_some(paths),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texray_core::AngleGrid;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 0), Vec::<f64>::new());
        assert_eq!(linspace(0.2, 1.0, 1), vec![0.2]);
        let v = linspace(0.01, 0.99, 3);
        assert!((v[1] - 0.5).abs() < 1e-12);
        assert_eq!(v[2], 0.99);
    }

    #[test]
    fn test_task_seeds_differ() {
        let a = task_seed(42, 0, 1);
        let b = task_seed(42, 1, 0);
        let c = task_seed(42, 0, 2);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, task_seed(42, 0, 1));
    }

    #[test]
    fn test_fixed_angles_skip_normal_bin_and_cycle() {
        let grid = AngleGrid::new(3, std::f64::consts::FRAC_PI_2, 0.25).unwrap();
        let incoming = grid.incoming_len();
        let angles = incident_angles(&grid, 2 * incoming, false, 0).unwrap();

        assert_eq!(angles.len(), 2 * incoming);
        assert!(angles.iter().all(|a| a.bin.is_some_and(|b| b >= 1 && b < incoming)));
        assert_eq!(angles[0], angles[incoming - 1]);
    }

    #[test]
    fn test_random_angles_are_incoming() {
        let grid = AngleGrid::new(10, std::f64::consts::FRAC_PI_2, 0.25).unwrap();
        let angles = incident_angles(&grid, 200, true, 42).unwrap();
        for angle in &angles {
            assert!(angle.theta >= 0.0 && angle.theta < std::f64::consts::FRAC_PI_2);
            assert!(angle.bin.is_some_and(|b| b < grid.incoming_len()));
        }
    }
}
