//! Ray/surface geometry: triangle intersection and unit-cell exits.

use texray_core::SurfaceMesh;
use texray_math::{DVec2, DVec3, Interval, Ray};

/// Barycentric tolerance; hits landing exactly on a shared edge must not
/// slip between the two triangles.
const EDGE_EPSILON: f64 = 1e-10;

/// Nearest intersection of a ray with a surface mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Intersection point
    pub point: DVec3,
    /// Ray parameter of the intersection
    pub t: f64,
    /// Index of the triangle that was hit
    pub triangle: usize,
    /// Angle between the ray and the face normal, in [0, π/2]
    pub incidence_angle: f64,
    /// Unit face normal (upward facing, independent of the ray)
    pub normal: DVec3,
}

/// Find the nearest triangle hit strictly in front of the ray origin.
///
/// Solves `origin + t·d = p0 + u·edge1 + v·edge2` per triangle by Cramer's
/// rule using the cached `edge1 × edge2`.
pub fn intersect(ray: &Ray, mesh: &SurfaceMesh) -> Option<Hit> {
    let neg_d = -ray.direction;
    let mut closest: Option<(f64, usize)> = None;

    for (i, facet) in mesh.facets().iter().enumerate() {
        let det = neg_d.dot(facet.cross);
        // Ray is parallel to the triangle plane
        if det == 0.0 {
            continue;
        }

        let pref = 1.0 / det;
        let corner = ray.origin - facet.p0;
        let t = pref * facet.cross.dot(corner);
        let u = pref * facet.edge2.cross(neg_d).dot(corner);
        let v = pref * neg_d.cross(facet.edge1).dot(corner);

        let inside = u >= -EDGE_EPSILON && v >= -EDGE_EPSILON && u + v <= 1.0;
        if !inside || !Interval::FORWARD.surrounds(t) {
            continue;
        }

        if closest.map_or(true, |(best, _)| t < best) {
            closest = Some((t, i));
        }
    }

    closest.map(|(t, triangle)| {
        let normal = mesh.facets()[triangle].normal();
        Hit {
            point: ray.at(t),
            t,
            triangle,
            incidence_angle: incidence_angle(ray.direction, normal),
            normal,
        }
    })
}

/// Angle between an incoming direction and a surface normal.
///
/// `atan(|n × -d| / |n · -d|)` stays accurate near grazing incidence, where
/// `acos` of the dot product loses precision.
pub fn incidence_angle(direction: DVec3, normal: DVec3) -> f64 {
    let neg_d = -direction;
    let sin_part = normal.cross(neg_d).length();
    let cos_part = normal.dot(neg_d).abs();
    (sin_part / cos_part).atan()
}

/// One of the four lateral boundaries of a unit cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellSide {
    /// y = y_min + Ly
    Top,
    /// x = x_min + Lx
    Right,
    /// y = y_min
    Bottom,
    /// x = x_min
    Left,
}

impl CellSide {
    const ALL: [CellSide; 4] = [CellSide::Top, CellSide::Right, CellSide::Bottom, CellSide::Left];

    /// Inward-facing normal of the boundary.
    fn inward_normal(self) -> DVec2 {
        match self {
            CellSide::Top => DVec2::new(0.0, -1.0),
            CellSide::Right => DVec2::new(-1.0, 0.0),
            CellSide::Bottom => DVec2::new(0.0, 1.0),
            CellSide::Left => DVec2::new(1.0, 0.0),
        }
    }

    /// A point on the boundary.
    fn anchor(self, cell_origin: DVec2, width: f64, height: f64) -> DVec2 {
        match self {
            CellSide::Top => cell_origin + DVec2::new(0.0, height),
            CellSide::Right => cell_origin + DVec2::new(width, 0.0),
            CellSide::Bottom | CellSide::Left => cell_origin,
        }
    }

    /// Offset that carries a point leaving through this side back in
    /// through the opposite side.
    pub fn translation(self, width: f64, height: f64) -> DVec3 {
        match self {
            CellSide::Top => DVec3::new(0.0, -height, 0.0),
            CellSide::Right => DVec3::new(-width, 0.0, 0.0),
            CellSide::Bottom => DVec3::new(0.0, height, 0.0),
            CellSide::Left => DVec3::new(width, 0.0, 0.0),
        }
    }
}

/// The cell boundary a ray crosses first going forward, and the ray
/// parameter at the crossing.
///
/// Only sides the ray moves outward through are candidates, so a ray that
/// was just translated onto a boundary does not bounce straight back. `None`
/// means the ray has no lateral motion at all.
pub fn exit_side(ray: &Ray, mesh: &SurfaceMesh) -> Option<(CellSide, f64)> {
    let origin = ray.origin.truncate();
    let d = ray.direction.truncate();
    let cell = mesh.cell_origin();

    CellSide::ALL
        .into_iter()
        .filter_map(|side| {
            let n = side.inward_normal();
            let denom = d.dot(n);
            if denom >= 0.0 {
                return None;
            }
            let t = (side.anchor(cell, mesh.width(), mesh.height()) - origin).dot(n) / denom;
            Some((side, t.max(0.0)))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
