//! 2D Delaunay triangulation via the Bowyer-Watson incremental insertion algorithm.
//!
//! Surfaces are height maps, so only the lateral (x, y) projection of the
//! points is triangulated; the z values ride along unchanged.

use std::collections::HashMap;

use texray_math::DVec2;

/// Internal triangle with cached circumcircle.
struct BwTri {
    v: [usize; 3],
    center: DVec2,
    radius_sq: f64,
}

/// An undirected edge key with sorted vertex indices for hashing.
#[derive(Hash, Eq, PartialEq)]
struct EdgeKey([usize; 2]);

impl EdgeKey {
    fn new(a: usize, b: usize) -> Self {
        if a < b {
            EdgeKey([a, b])
        } else {
            EdgeKey([b, a])
        }
    }
}

/// Twice the signed area of (a, b, c); positive when counter-clockwise.
fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// Circumcircle of a triangle, `None` for collinear vertices.
fn circumcircle(a: DVec2, b: DVec2, c: DVec2) -> Option<(DVec2, f64)> {
    let d = 2.0 * orient(a, b, c);
    let scale = (b - a).length_squared().max((c - a).length_squared());
    if d.abs() <= 1e-14 * scale {
        return None;
    }

    let a2 = a.length_squared();
    let b2 = b.length_squared();
    let c2 = c.length_squared();
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let center = DVec2::new(ux, uy);

    Some((center, center.distance_squared(a)))
}

/// A triangle large enough that every input point lies well inside it.
fn super_triangle(points: &[DVec2]) -> [DVec2; 3] {
    let (pmin, pmax) = points.iter().fold(
        (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY)),
        |(lo, hi), p| (lo.min(*p), hi.max(*p)),
    );
    let center = (pmin + pmax) * 0.5;
    let span = (pmax - pmin).max_element().max(1e-6);
    let scale = 64.0 * span;

    [
        DVec2::new(center.x - 2.0 * scale, center.y - scale),
        DVec2::new(center.x + 2.0 * scale, center.y - scale),
        DVec2::new(center.x, center.y + 2.0 * scale),
    ]
}

/// Bowyer-Watson incremental Delaunay triangulation of lateral points.
///
/// Returns `None` if fewer than 3 points are provided or no triangle with
/// non-zero area survives (all points collinear). Triangles reference
/// indices into `points` and are wound counter-clockwise.
pub(crate) fn bowyer_watson(points: &[DVec2]) -> Option<Vec<[usize; 3]>> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let super_pts = super_triangle(points);
    let mut all_points: Vec<DVec2> = points.to_vec();
    all_points.extend_from_slice(&super_pts);

    let si = [n, n + 1, n + 2];
    let (center, radius_sq) = circumcircle(super_pts[0], super_pts[1], super_pts[2])?;
    let mut tris: Vec<BwTri> = vec![BwTri {
        v: si,
        center,
        radius_sq,
    }];

    for i in 0..n {
        let pt = all_points[i];

        // Bad triangles: circumcircle strictly contains the new point.
        // Co-circular points (regular grids) must stay outside or the
        // cavity stops being star-shaped.
        let mut bad_indices: Vec<usize> = Vec::new();
        for (ti, tri) in tris.iter().enumerate() {
            if tri.center.distance_squared(pt) < tri.radius_sq * (1.0 - 1e-12) {
                bad_indices.push(ti);
            }
        }

        if bad_indices.is_empty() {
            // Duplicate lateral point
            continue;
        }

        // Cavity boundary: edges used by exactly one bad triangle
        let mut edge_count: HashMap<EdgeKey, (usize, [usize; 2])> = HashMap::new();
        for &bi in &bad_indices {
            let v = tris[bi].v;
            for edge in [[v[0], v[1]], [v[1], v[2]], [v[2], v[0]]] {
                edge_count
                    .entry(EdgeKey::new(edge[0], edge[1]))
                    .and_modify(|(count, _)| *count += 1)
                    .or_insert((1, edge));
            }
        }

        let boundary: Vec<[usize; 2]> = edge_count
            .into_values()
            .filter(|(count, _)| *count == 1)
            .map(|(_, edge)| edge)
            .collect();

        bad_indices.sort_unstable();
        for &bi in bad_indices.iter().rev() {
            tris.swap_remove(bi);
        }

        for edge in &boundary {
            let (a, b) = (edge[0], edge[1]);
            if let Some((center, radius_sq)) =
                circumcircle(all_points[a], all_points[b], all_points[i])
            {
                tris.push(BwTri {
                    v: [a, b, i],
                    center,
                    radius_sq,
                });
            }
        }
    }

    let result: Vec<[usize; 3]> = tris
        .into_iter()
        .filter(|t| t.v.iter().all(|&vi| vi < n))
        .filter_map(|t| {
            let [a, b, c] = t.v;
            let area2 = orient(all_points[a], all_points[b], all_points[c]);
            if area2.abs() <= 1e-15 {
                None
            } else if area2 > 0.0 {
                Some([a, b, c])
            } else {
                Some([a, c, b])
            }
        })
        .collect();

    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}
