//! The optical stack: media, interfaces and layer widths.
//!
//! ```text
//!      incidence medium (0)
//! surface 0  ---------
//!            medium 1          width[1]
//! surface 1  ---------
//!            ...
//! surface N  ---------
//!      transmission medium (N+1)
//! ```

use num_complex::Complex64;
use thiserror::Error;

use crate::{medium::Medium, mesh::SurfaceMesh};

/// Errors that can occur while assembling a stack.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StackError {
    #[error("stack needs at least an incidence and a transmission medium, got {0} media")]
    Empty(usize),

    #[error("{media} media need {} surfaces, got {surfaces}", .media - 1)]
    SurfaceCount { media: usize, surfaces: usize },

    #[error("{media} media need {} layer widths, got {widths}", .media - 2)]
    LayerCount { media: usize, widths: usize },

    #[error("layer {index} has invalid width {width}")]
    NegativeWidth { index: usize, width: f64 },

    #[error("medium '{name}' is sampled on {found} wavelengths, expected {expected}")]
    WavelengthCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("depth spacing must be positive and finite, got {0}")]
    InvalidSpacing(f64),
}

pub type StackResult<T> = Result<T, StackError>;

/// Optical constants of every medium at a single wavelength.
#[derive(Debug, Clone, PartialEq)]
pub struct OpticalSlice {
    pub index: Vec<Complex64>,
    pub alpha: Vec<f64>,
}

/// An ordered multilayer stack. Immutable once built.
#[derive(Debug, Clone)]
pub struct Stack {
    media: Vec<Medium>,
    surfaces: Vec<SurfaceMesh>,
    /// One width per medium (µm), zero for incidence and transmission media
    widths: Vec<f64>,
}

impl Stack {
    /// Assemble a stack.
    ///
    /// `layer_widths` holds the widths (µm) of the media between the first
    /// and last surfaces, so it has `media.len() - 2` entries.
    pub fn new(
        media: Vec<Medium>,
        surfaces: Vec<SurfaceMesh>,
        layer_widths: Vec<f64>,
    ) -> StackResult<Self> {
        let count = media.len();
        if count < 2 {
            return Err(StackError::Empty(count));
        }
        if surfaces.len() != count - 1 {
            return Err(StackError::SurfaceCount {
                media: count,
                surfaces: surfaces.len(),
            });
        }
        if layer_widths.len() != count - 2 {
            return Err(StackError::LayerCount {
                media: count,
                widths: layer_widths.len(),
            });
        }
        if let Some((i, &w)) = layer_widths
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(StackError::NegativeWidth {
                index: i + 1,
                width: w,
            });
        }

        let expected = media[0].wavelength_count();
        for medium in &media {
            if !medium.is_consistent() || medium.wavelength_count() != expected {
                return Err(StackError::WavelengthCount {
                    name: medium.name.clone(),
                    expected,
                    found: medium.wavelength_count(),
                });
            }
        }

        let mut widths = Vec::with_capacity(count);
        widths.push(0.0);
        widths.extend(layer_widths);
        widths.push(0.0);

        Ok(Self {
            media,
            surfaces,
            widths,
        })
    }

    pub fn media(&self) -> &[Medium] {
        &self.media
    }

    pub fn surfaces(&self) -> &[SurfaceMesh] {
        &self.surfaces
    }

    /// Widths of all media, including the zero-width outer media.
    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    pub fn medium_count(&self) -> usize {
        self.media.len()
    }

    /// Number of wavelengths the media are sampled on.
    pub fn wavelength_count(&self) -> usize {
        self.media[0].wavelength_count()
    }

    /// Sum of all layer widths (µm).
    pub fn total_depth(&self) -> f64 {
        self.widths.iter().sum()
    }

    /// Optical constants of every medium at wavelength slot `wl`.
    pub fn slice(&self, wl: usize) -> OpticalSlice {
        OpticalSlice {
            index: self.media.iter().map(|m| m.index(wl)).collect(),
            alpha: self.media.iter().map(|m| m.alpha(wl)).collect(),
        }
    }
}
