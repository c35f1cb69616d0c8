//! Triangulated surface covering one period of a textured interface.
//!
//! The mesh is a height map: points are triangulated on their lateral
//! projection, so every vertical line through the unit cell crosses the
//! surface exactly once. The unit cell is tiled infinitely in x and y.

use texray_math::{Aabb, DVec2, DVec3};
use thiserror::Error;

use crate::delaunay::bowyer_watson;

/// Errors that can occur while building a surface mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("surface needs at least 3 points, got {0}")]
    TooFewPoints(usize),

    #[error("lateral point projection is degenerate (collinear points, no triangle)")]
    Degenerate,

    #[error("point {0} has a non-finite coordinate")]
    NonFinite(usize),

    #[error("triangles cover {covered:.6} of the {cell:.6} unit cell; include the cell corners")]
    CellNotCovered { covered: f64, cell: f64 },
}

/// Relative tolerance on the triangulated area of the unit cell.
const COVERAGE_TOLERANCE: f64 = 1e-9;

pub type MeshResult<T> = Result<T, MeshError>;

/// Cached geometry of one triangle.
///
/// `cross` is `edge1 × edge2`: the unnormalized face normal, twice the
/// triangle area long. Triangles are wound so that it points towards +z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    pub p0: DVec3,
    pub edge1: DVec3,
    pub edge2: DVec3,
    pub cross: DVec3,
}

impl Facet {
    fn new(p0: DVec3, p1: DVec3, p2: DVec3) -> Self {
        let edge1 = p1 - p0;
        let edge2 = p2 - p0;
        Self {
            p0,
            edge1,
            edge2,
            cross: edge1.cross(edge2),
        }
    }

    /// Unit face normal (upward facing).
    #[inline]
    pub fn normal(&self) -> DVec3 {
        self.cross.normalize()
    }
}

/// One period of a textured surface.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    vertices: Vec<DVec3>,
    triangles: Vec<[usize; 3]>,
    facets: Vec<Facet>,
    bounds: Aabb,
    reference_height: f64,
}

impl SurfaceMesh {
    /// Triangulate a set of surface points.
    ///
    /// The lateral extent of the points defines the unit cell. The
    /// triangulation must cover that whole rectangle, which in practice means
    /// the four cell corners are among the points; otherwise rays would fall
    /// through the gaps and `MeshError::CellNotCovered` is returned.
    pub fn new(points: Vec<DVec3>) -> MeshResult<Self> {
        if points.len() < 3 {
            return Err(MeshError::TooFewPoints(points.len()));
        }
        if let Some(i) = points.iter().position(|p| !p.is_finite()) {
            return Err(MeshError::NonFinite(i));
        }

        let lateral: Vec<DVec2> = points.iter().map(|p| p.truncate()).collect();
        let triangles = bowyer_watson(&lateral).ok_or(MeshError::Degenerate)?;

        let facets: Vec<Facet> = triangles
            .iter()
            .map(|t| Facet::new(points[t[0]], points[t[1]], points[t[2]]))
            .collect();

        let bounds = Aabb::enclosing(&points);
        let cell = bounds.x.size() * bounds.y.size();
        let covered: f64 = facets.iter().map(|f| 0.5 * f.cross.z).sum();
        if (covered - cell).abs() > COVERAGE_TOLERANCE * cell {
            return Err(MeshError::CellNotCovered { covered, cell });
        }
        let reference_height = Self::corner_height(&points, &bounds);

        log::debug!(
            "Triangulated surface: {} points, {} triangles, cell {:.4} x {:.4}",
            points.len(),
            triangles.len(),
            bounds.x.size(),
            bounds.y.size()
        );

        Ok(Self {
            vertices: points,
            triangles,
            facets,
            bounds,
            reference_height,
        })
    }

    /// Height of the vertex at the lower-left cell corner, or the middle of
    /// the height range if no vertex sits there.
    fn corner_height(points: &[DVec3], bounds: &Aabb) -> f64 {
        points
            .iter()
            .find(|p| p.x == bounds.x.min && p.y == bounds.y.min)
            .map(|p| p.z)
            .unwrap_or_else(|| 0.5 * (bounds.z.min + bounds.z.max))
    }

    /// Surface points, in input order.
    pub fn vertices(&self) -> &[DVec3] {
        &self.vertices
    }

    /// Vertex index triples of the triangulation.
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Per-triangle cached geometry, parallel to `triangles()`.
    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.facets.len()
    }

    /// Always false for a constructed mesh.
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }

    /// Bounding box of the unit cell.
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// Lower-left corner of the unit cell.
    pub fn cell_origin(&self) -> DVec2 {
        DVec2::new(self.bounds.x.min, self.bounds.y.min)
    }

    /// Period along x (Lx).
    pub fn width(&self) -> f64 {
        self.bounds.x.size()
    }

    /// Period along y (Ly).
    pub fn height(&self) -> f64 {
        self.bounds.y.size()
    }

    pub fn z_min(&self) -> f64 {
        self.bounds.z.min
    }

    pub fn z_max(&self) -> f64 {
        self.bounds.z.max
    }

    /// Height separating the two sides of the surface.
    pub fn reference_height(&self) -> f64 {
        self.reference_height
    }

    /// Whether `point` lies on the upper side of the surface. Only
    /// meaningful for points outside the height band.
    pub fn is_above(&self, point: DVec3) -> bool {
        point.z > self.reference_height
    }

    /// Shift `point` by whole periods so that its lateral position lies in
    /// the unit cell. Height is left alone.
    pub fn wrap_into_cell(&self, point: DVec3) -> DVec3 {
        let cell = self.cell_origin();
        let kx = ((point.x - cell.x) / self.width()).floor();
        let ky = ((point.y - cell.y) / self.height()).floor();

        DVec3::new(
            point.x - kx * self.width(),
            point.y - ky * self.height(),
            point.z,
        )
    }
}
