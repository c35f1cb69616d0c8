//! texray core - the data model of a textured optical stack.
//!
//! This crate provides:
//!
//! - **Surfaces**: `SurfaceMesh`, a Delaunay-triangulated height map covering
//!   one period of a textured interface, plus common textures
//! - **Stack**: media with per-wavelength optical constants, layer widths
//!   and the depth grid absorption profiles are sampled on
//! - **Angles**: the angular bin grid outgoing directions are classified into
//! - **Output**: the sparse `ScatteringMatrix`
//!
//! # Example
//!
//! ```ignore
//! use texray_core::{texture, Medium, Stack};
//!
//! let front = texture::inverted_pyramids(1.0, 55f64.to_radians())?;
//! let back = texture::planar(1.0, 1.0, 0.0)?;
//! let wl = [900.0, 1000.0];
//! let stack = Stack::new(
//!     vec![
//!         Medium::constant("air", 1.0, 0.0, &wl),
//!         Medium::constant("si", 3.6, 1e-3, &wl),
//!         Medium::constant("air", 1.0, 0.0, &wl),
//!     ],
//!     vec![front, back],
//!     vec![200.0],
//! )?;
//! ```

pub mod angles;
mod delaunay;
pub mod depth;
pub mod matrix;
pub mod medium;
pub mod mesh;
pub mod stack;
pub mod texture;

// Re-export commonly used types
pub use angles::{fold_phi, AngleBinLookup, AngleGrid, GridError};
pub use depth::{DepthGrid, LayerDepths};
pub use matrix::ScatteringMatrix;
pub use medium::Medium;
pub use mesh::{Facet, MeshError, SurfaceMesh};
pub use stack::{OpticalSlice, Stack, StackError};
