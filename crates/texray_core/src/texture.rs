//! Common surface textures.
//!
//! Each generator returns the unit cell of a periodic texture with its
//! lower-left corner at the origin and the rim of the texture at `z = 0`.

use texray_math::DVec3;

use crate::mesh::{MeshResult, SurfaceMesh};

/// A flat interface at height `z`.
pub fn planar(width: f64, height: f64, z: f64) -> MeshResult<SurfaceMesh> {
    SurfaceMesh::new(vec![
        DVec3::new(0.0, 0.0, z),
        DVec3::new(0.0, height, z),
        DVec3::new(width, height, z),
        DVec3::new(width, 0.0, z),
    ])
}

/// Square-based pyramids pointing up, apex at `+h`.
///
/// `base_angle` is the angle between a facet and the horizontal, in radians
/// (54.7° for KOH-etched silicon).
pub fn regular_pyramids(period: f64, base_angle: f64) -> MeshResult<SurfaceMesh> {
    pyramid(period, base_angle, 1.0)
}

/// Square-based pyramids pointing down into the substrate, apex at `-h`.
pub fn inverted_pyramids(period: f64, base_angle: f64) -> MeshResult<SurfaceMesh> {
    pyramid(period, base_angle, -1.0)
}

fn pyramid(period: f64, base_angle: f64, sign: f64) -> MeshResult<SurfaceMesh> {
    let h = period * base_angle.tan() / 2.0;
    SurfaceMesh::new(vec![
        DVec3::new(0.0, 0.0, 0.0),
        DVec3::new(period / 2.0, period / 2.0, sign * h),
        DVec3::new(period, 0.0, 0.0),
        DVec3::new(0.0, period, 0.0),
        DVec3::new(period, period, 0.0),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar() {
        let mesh = planar(2.0, 1.0, 0.5).unwrap();
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.width(), 2.0);
        assert_eq!(mesh.height(), 1.0);
        assert_eq!(mesh.reference_height(), 0.5);
        for facet in mesh.facets() {
            assert!((facet.normal() - DVec3::Z).length() < 1e-12);
        }
    }

    #[test]
    fn test_pyramid_heights() {
        let angle = 55f64.to_radians();
        let up = regular_pyramids(1.0, angle).unwrap();
        let down = inverted_pyramids(1.0, angle).unwrap();
        let h = angle.tan() / 2.0;

        assert!((up.z_max() - h).abs() < 1e-12);
        assert_eq!(up.z_min(), 0.0);
        assert!((down.z_min() + h).abs() < 1e-12);
        assert_eq!(down.z_max(), 0.0);
    }

    #[test]
    fn test_pyramid_facet_tilt() {
        let angle = 55f64.to_radians();
        let mesh = inverted_pyramids(1.0, angle).unwrap();
        for facet in mesh.facets() {
            let tilt = facet.normal().z.acos();
            assert!((tilt - angle).abs() < 1e-9);
        }
    }
}
