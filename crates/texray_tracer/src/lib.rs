//! texray tracer - Monte Carlo ray tracing through textured stacks.
//!
//! Rays enter from the incidence medium, bounce off and refract through
//! periodically textured interfaces, lose intensity in absorbing layers and
//! finally leave through the top or bottom. Outgoing directions are binned
//! into a scattering matrix per wavelength, absorbed power into depth
//! profiles.
//!
//! # Example
//!
//! ```ignore
//! use texray_tracer::{sweep, SweepConfig};
//!
//! let config = SweepConfig {
//!     wavelengths: vec![900.0, 1000.0],
//!     n_rays: 5000,
//!     ..Default::default()
//! };
//! let output = sweep(&stack, &config)?;
//! for result in &output.wavelengths {
//!     println!("{} nm: R = {:.3}", result.wavelength, result.reflected);
//! }
//! ```

pub mod config;
pub mod fresnel;
pub mod geometry;
pub mod interface;
pub mod state;
pub mod sweep;
pub mod tracer;
pub mod traverse;

pub use config::SweepConfig;
pub use fresnel::{fresnel_reflectance, reflect, reflect_or_transmit, refract, Interaction};
pub use geometry::{exit_side, intersect, CellSide, Hit};
pub use interface::{cross_interface, Crossing};
pub use state::{RayState, Side, Waypoint, WaypointKind};
pub use sweep::{
    incident_angles, sweep, sweep_with_grid, IncidentAngle, SweepError, SweepOutput, SweepResult,
    WavelengthResult,
};
pub use tracer::{direction_angles, incident_ray, trace_ray, RayOutcome, RayTrace, TraceContext};
pub use traverse::{traverse, Traversal};
