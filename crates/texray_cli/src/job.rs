//! JSON job files: a sweep configuration plus a stack description.

use std::fs;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use texray_core::{texture, Medium, Stack, SurfaceMesh};
use texray_tracer::SweepConfig;

/// A complete job.
#[derive(Debug, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub sweep: SweepConfig,
    /// Media from the incidence medium down to the substrate
    pub media: Vec<MediumSpec>,
    /// Widths of the inner layers in µm
    #[serde(default)]
    pub layers: Vec<f64>,
    /// Interfaces from top to bottom
    pub surfaces: Vec<SurfaceSpec>,
}

/// Optical constants of one medium.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MediumSpec {
    /// n and k tabulated against wavelength (nm), interpolated linearly
    Tabulated {
        name: String,
        wavelengths: Vec<f64>,
        n: Vec<f64>,
        k: Vec<f64>,
    },
    /// Wavelength-independent n and k
    Constant {
        name: String,
        n: f64,
        #[serde(default)]
        k: f64,
    },
}

/// One interface, either a stock texture or explicit points.
#[derive(Debug, Deserialize)]
#[serde(tag = "texture", rename_all = "snake_case")]
pub enum SurfaceSpec {
    Planar {
        width: f64,
        height: f64,
        #[serde(default)]
        z: f64,
    },
    /// `angle` is the facet base angle in degrees
    RegularPyramids { period: f64, angle: f64 },
    InvertedPyramids { period: f64, angle: f64 },
    Points { points: Vec<[f64; 3]> },
}

/// Read and parse a job file.
pub fn load_job(path: &Path) -> Result<Job> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read job file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse job file {}", path.display()))
}

impl Job {
    /// Build the stack, sampling every medium on the sweep wavelengths.
    pub fn build_stack(&self) -> Result<Stack> {
        let wavelengths = &self.sweep.wavelengths;
        ensure!(!wavelengths.is_empty(), "sweep.wavelengths is empty");

        let media = self
            .media
            .iter()
            .map(|spec| spec.sample(wavelengths))
            .collect::<Result<Vec<_>>>()?;

        let surfaces = self
            .surfaces
            .iter()
            .enumerate()
            .map(|(i, spec)| spec.build().with_context(|| format!("surface {i}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Stack::new(media, surfaces, self.layers.clone())?)
    }
}

impl MediumSpec {
    fn sample(&self, wavelengths: &[f64]) -> Result<Medium> {
        match self {
            MediumSpec::Constant { name, n, k } => {
                Ok(Medium::constant(name.as_str(), *n, *k, wavelengths))
            }
            MediumSpec::Tabulated {
                name,
                wavelengths: table,
                n,
                k,
            } => {
                ensure!(
                    table.len() == n.len() && table.len() == k.len(),
                    "medium {name}: wavelengths, n and k must have the same length"
                );
                ensure!(!table.is_empty(), "medium {name}: empty table");
                ensure!(
                    table.windows(2).all(|w| w[0] < w[1]),
                    "medium {name}: wavelengths must be strictly increasing"
                );

                let (lo, hi) = (table[0], table[table.len() - 1]);
                if wavelengths.iter().any(|&wl| wl < lo || wl > hi) {
                    log::warn!(
                        "Medium {}: sweep wavelengths extend past the table ({} - {} nm); using end values",
                        name,
                        lo,
                        hi
                    );
                }

                let n: Vec<f64> = wavelengths.iter().map(|&wl| interpolate(table, n, wl)).collect();
                let k: Vec<f64> = wavelengths.iter().map(|&wl| interpolate(table, k, wl)).collect();
                Ok(Medium::from_nk(name.as_str(), wavelengths, &n, &k))
            }
        }
    }
}

impl SurfaceSpec {
    fn build(&self) -> Result<SurfaceMesh> {
        let mesh = match self {
            SurfaceSpec::Planar { width, height, z } => texture::planar(*width, *height, *z)?,
            SurfaceSpec::RegularPyramids { period, angle } => {
                check_pyramid(*period, *angle)?;
                texture::regular_pyramids(*period, angle.to_radians())?
            }
            SurfaceSpec::InvertedPyramids { period, angle } => {
                check_pyramid(*period, *angle)?;
                texture::inverted_pyramids(*period, angle.to_radians())?
            }
            SurfaceSpec::Points { points } => {
                SurfaceMesh::new(points.iter().map(|&p| p.into()).collect())?
            }
        };
        Ok(mesh)
    }
}

fn check_pyramid(period: f64, angle: f64) -> Result<()> {
    if period.is_nan() || period <= 0.0 {
        bail!("pyramid period must be positive, got {period}");
    }
    if angle.is_nan() || angle <= 0.0 || angle >= 90.0 {
        bail!("pyramid angle must lie in (0, 90) degrees, got {angle}");
    }
    Ok(())
}

/// Linear interpolation in a strictly increasing table, clamped at the ends.
fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let i = xs.partition_point(|&v| v < x);
    if i == 0 {
        return ys[0];
    }
    if i == xs.len() {
        return ys[ys.len() - 1];
    }
    let t = (x - xs[i - 1]) / (xs[i] - xs[i - 1]);
    ys[i - 1] + t * (ys[i] - ys[i - 1])
}
