use crate::{
    adaptor::Adaptor,
    attribute::AttributeHandle,
    dart::Dart,
    error::Error,
    map::Map,
    marker::DartMarker,
    orbit::Orbit,
};
use num_traits::{Float, One, Zero};
use std::f64::consts::FRAC_PI_6;

/// Angle between the normals of adjacent faces above which their shared edge
/// is considered a feature edge.
pub const DEFAULT_FEATURE_ANGLE: f64 = FRAC_PI_6;

/**
 * Mark every feature edge of the map in `marker`, and return the number of
 * feature edges.
 *
 * An edge is a feature if the angle between the normals of its two faces
 * exceeds `threshold` radians. Boundary edges are always features. The whole
 * edge orbit is marked, including the boundary side. Marks already in
 * `marker` are cleared first.
 */
pub fn feature_edge_detection<A: Adaptor>(
    map: &Map,
    position: &AttributeHandle<A::Vector>,
    marker: &mut DartMarker,
    threshold: A::Scalar,
) -> Result<usize, Error> {
    let points = map.column(position)?;
    marker.unmark_all();
    let mut count = 0usize;
    for e in map.edges() {
        let is_feature = map.is_boundary_edge(e) || {
            let n0 = map.calc_face_normal::<A>(e, points)?;
            let n1 = map.calc_face_normal::<A>(map.phi2(e), points)?;
            A::vector_angle(n0, n1) > threshold
        };
        if is_feature {
            marker.mark_orbit(map, Orbit::Edge, e);
            count += 1;
        }
    }
    log::debug!("Detected {count} feature edges");
    Ok(count)
}

/// Closest point to `p` on the triangle `(a, b, c)`, by Voronoi region of the
/// triangle's features.
fn closest_point_on_triangle<A: Adaptor>(
    p: A::Vector,
    a: A::Vector,
    b: A::Vector,
    c: A::Vector,
) -> A::Vector {
    let zero = A::Scalar::zero();
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = A::dot_product(ab, ap);
    let d2 = A::dot_product(ac, ap);
    if d1 <= zero && d2 <= zero {
        return a;
    }
    let bp = p - b;
    let d3 = A::dot_product(ab, bp);
    let d4 = A::dot_product(ac, bp);
    if d3 >= zero && d4 <= d3 {
        return b;
    }
    let vc = d1 * d4 - d3 * d2;
    if vc <= zero && d1 >= zero && d3 <= zero {
        return a + ab * (d1 / (d1 - d3));
    }
    let cp = p - c;
    let d5 = A::dot_product(ab, cp);
    let d6 = A::dot_product(ac, cp);
    if d6 >= zero && d5 <= d6 {
        return c;
    }
    let vb = d5 * d2 - d1 * d6;
    if vb <= zero && d2 >= zero && d6 <= zero {
        return a + ac * (d2 / (d2 - d6));
    }
    let va = d3 * d6 - d5 * d4;
    if va <= zero && (d4 - d3) >= zero && (d5 - d6) >= zero {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }
    let denom = A::Scalar::one() / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

/// Squared distance from `p` to the face of `f`. Polygons are treated as a
/// fan of triangles around the origin of `f`.
pub fn squared_distance_point_to_face<A: Adaptor>(
    map: &Map,
    points: &[A::Vector],
    f: Dart,
    p: A::Vector,
) -> Result<A::Scalar, Error> {
    let p0 = map.calc_point::<A>(f, points)?;
    let mut best = A::Scalar::infinity();
    let mut d = map.phi1(f);
    while map.phi1(d) != f {
        let p1 = map.calc_point::<A>(d, points)?;
        let p2 = map.calc_point::<A>(map.phi1(d), points)?;
        let v = p - closest_point_on_triangle::<A>(p, p0, p1, p2);
        best = best.min(A::dot_product(v, v));
        d = map.phi1(d);
    }
    Ok(best)
}
