//! Sweep configuration.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};
use texray_core::{AngleGrid, GridError};

use crate::sweep::{SweepError, SweepResult};

/// Settings for a full wavelength/angle sweep.
///
/// Every field has a default, so a job file only needs to name what it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Wavelength labels in nm, one per optical-constant sample of the stack
    pub wavelengths: Vec<f64>,
    /// Approximate number of rays per wavelength
    pub n_rays: usize,
    /// Lateral launch positions along x
    pub nx: usize,
    /// Lateral launch positions along y
    pub ny: usize,
    /// Depth grid spacing in µm
    pub depth_spacing: f64,
    /// Rays whose intensity drops below this count as absorbed
    pub intensity_threshold: f64,
    /// Draw incident angles at random instead of using bin centres
    pub random_angles: bool,
    /// Polar bins per hemisphere
    pub n_theta_bins: usize,
    /// Azimuthal period of the texture, in radians
    pub phi_symmetry: f64,
    /// Azimuthal bin density
    pub c_azimuth: f64,
    /// Worker threads; `None` uses the global rayon pool
    pub threads: Option<usize>,
    pub seed: u64,
    /// Hit limit for a single surface approach
    pub max_interactions: usize,
    /// Limit on surface approaches per ray
    pub max_passes: usize,
    /// Keep per-ray waypoint paths in the output
    pub keep_paths: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            wavelengths: Vec::new(),
            n_rays: 10_000,
            nx: 10,
            ny: 10,
            depth_spacing: 1.0,
            intensity_threshold: 1e-4,
            random_angles: false,
            n_theta_bins: 50,
            phi_symmetry: FRAC_PI_2,
            c_azimuth: 0.25,
            threads: None,
            seed: 0,
            max_interactions: 1000,
            max_passes: 1000,
            keep_paths: false,
        }
    }
}

impl SweepConfig {
    /// Number of lateral launch positions.
    pub fn lateral_count(&self) -> usize {
        self.nx * self.ny
    }

    /// Incident angles per wavelength: `ceil(n_rays / (nx·ny))`.
    pub fn angle_count(&self) -> usize {
        self.n_rays.div_ceil(self.lateral_count().max(1))
    }

    /// Check the settings that do not depend on the stack.
    pub fn validate(&self) -> SweepResult<()> {
        if self.n_rays == 0 {
            return Err(SweepError::NoRays);
        }
        if self.wavelengths.is_empty() {
            return Err(SweepError::NoWavelengths);
        }
        if self.lateral_count() == 0 {
            return Err(SweepError::EmptyLateralGrid {
                nx: self.nx,
                ny: self.ny,
            });
        }
        if !self.intensity_threshold.is_finite() || self.intensity_threshold < 0.0 {
            return Err(SweepError::InvalidThreshold(self.intensity_threshold));
        }
        if self.max_interactions == 0 || self.max_passes == 0 {
            return Err(SweepError::InvalidLimit);
        }
        Ok(())
    }

    /// The angle grid described by the binning settings.
    pub fn angle_grid(&self) -> Result<AngleGrid, GridError> {
        AngleGrid::new(self.n_theta_bins, self.phi_symmetry, self.c_azimuth)
    }
}
