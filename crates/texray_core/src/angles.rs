//! Angular bin grid for classifying ray directions.
//!
//! Polar angle runs over [0, π]: the upper hemisphere (theta < π/2) holds
//! reflected directions and every incident direction, the lower hemisphere
//! holds transmitted directions. Azimuth is folded by the texture's
//! rotational symmetry before binning.

use std::f64::consts::{PI, TAU};

use thiserror::Error;

/// Errors that can occur while building an angle grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("angle grid needs at least one polar bin per hemisphere")]
    NoThetaBins,

    #[error("azimuthal symmetry must lie in (0, 2π], got {0}")]
    PhiSymmetry(f64),

    #[error("azimuthal bin density must be non-negative and finite, got {0}")]
    Azimuth(f64),
}

/// Maps a direction to a single integer bin.
///
/// The tracer treats this as an opaque pure function; `AngleGrid` is the
/// stock implementation.
pub trait AngleBinLookup: Send + Sync {
    /// Bin containing polar angle `theta` and azimuth `phi` (radians), or
    /// `None` if the direction falls outside the grid.
    fn bin(&self, theta: f64, phi: f64) -> Option<usize>;

    /// Total number of bins over the full sphere.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bins an incident direction can fall into (the upper hemisphere).
    fn incoming_len(&self) -> usize {
        self.len() / 2
    }

    /// (theta, phi) at the centre of `bin`.
    fn centre(&self, bin: usize) -> Option<(f64, f64)>;
}

/// Fold an azimuth into `[0, phi_symmetry)`.
pub fn fold_phi(phi: f64, phi_symmetry: f64) -> f64 {
    phi.rem_euclid(TAU).rem_euclid(phi_symmetry)
}

/// Polar rings equally spaced in sin(theta), each split into azimuthal bins.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleGrid {
    theta_edges: Vec<f64>,
    phi_edges: Vec<Vec<f64>>,
    /// Linear index of the first bin of each ring
    offsets: Vec<usize>,
    phi_symmetry: f64,
    len: usize,
}

impl AngleGrid {
    /// Build a grid with `n_theta_bins` rings per hemisphere.
    ///
    /// Ring `i` (counted from the pole) gets
    /// `max(1, ceil(c_azimuth · (i + 0.5) · phi_symmetry))` azimuthal bins,
    /// so bin solid angles stay roughly even.
    pub fn new(n_theta_bins: usize, phi_symmetry: f64, c_azimuth: f64) -> Result<Self, GridError> {
        if n_theta_bins == 0 {
            return Err(GridError::NoThetaBins);
        }
        if !(phi_symmetry > 0.0 && phi_symmetry <= TAU) {
            return Err(GridError::PhiSymmetry(phi_symmetry));
        }
        if !c_azimuth.is_finite() || c_azimuth < 0.0 {
            return Err(GridError::Azimuth(c_azimuth));
        }

        let n = n_theta_bins;
        let upper: Vec<f64> = (0..=n).map(|i| (i as f64 / n as f64).asin()).collect();

        let mut theta_edges = upper.clone();
        theta_edges.extend(upper.iter().rev().skip(1).map(|t| PI - t));

        let upper_rings: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                let count = ((c_azimuth * (i as f64 + 0.5) * phi_symmetry).ceil() as usize).max(1);
                (0..=count)
                    .map(|j| phi_symmetry * j as f64 / count as f64)
                    .collect()
            })
            .collect();

        let mut phi_edges = upper_rings.clone();
        phi_edges.extend(upper_rings.into_iter().rev());

        let mut offsets = Vec::with_capacity(phi_edges.len());
        let mut len = 0;
        for edges in &phi_edges {
            offsets.push(len);
            len += edges.len() - 1;
        }

        log::debug!("Angle grid: {} rings, {} bins", phi_edges.len(), len);

        Ok(Self {
            theta_edges,
            phi_edges,
            offsets,
            phi_symmetry,
            len,
        })
    }

    /// Polar ring edges over [0, π].
    pub fn theta_edges(&self) -> &[f64] {
        &self.theta_edges
    }

    /// Azimuthal edges of ring `ring`.
    pub fn phi_edges(&self, ring: usize) -> &[f64] {
        &self.phi_edges[ring]
    }

    pub fn phi_symmetry(&self) -> f64 {
        self.phi_symmetry
    }

    /// Number of polar rings over the full sphere.
    pub fn ring_count(&self) -> usize {
        self.phi_edges.len()
    }

    /// Polar ring of `theta`, right-closed: ring `i` covers
    /// `(edge[i], edge[i + 1]]`, with theta = 0 in ring 0.
    pub fn theta_bin(&self, theta: f64) -> Option<usize> {
        right_closed_bin(&self.theta_edges, theta)
    }

    /// Azimuthal bin of `phi` within `ring`; `phi` is folded first.
    pub fn phi_bin(&self, ring: usize, phi: f64) -> Option<usize> {
        let edges = self.phi_edges.get(ring)?;
        right_closed_bin(edges, fold_phi(phi, self.phi_symmetry))
    }
}

/// Boundary search over sorted edges; `None` outside `[edges[0], edges[last]]`.
fn right_closed_bin(edges: &[f64], x: f64) -> Option<usize> {
    let bins = edges.len().checked_sub(1)?;
    if x.is_nan() || x < edges[0] || x > edges[bins] {
        return None;
    }
    let above = edges.partition_point(|&e| e < x);
    Some(above.saturating_sub(1).min(bins - 1))
}

impl AngleBinLookup for AngleGrid {
    fn bin(&self, theta: f64, phi: f64) -> Option<usize> {
        let ring = self.theta_bin(theta)?;
        let j = self.phi_bin(ring, phi)?;
        Some(self.offsets[ring] + j)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn centre(&self, bin: usize) -> Option<(f64, f64)> {
        if bin >= self.len {
            return None;
        }
        let ring = self.offsets.partition_point(|&o| o <= bin) - 1;
        let j = bin - self.offsets[ring];
        let theta = 0.5 * (self.theta_edges[ring] + self.theta_edges[ring + 1]);
        let phi = 0.5 * (self.phi_edges[ring][j] + self.phi_edges[ring][j + 1]);
        Some((theta, phi))
    }
}
