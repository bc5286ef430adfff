use super::{Approximator, quadric::Quadric};
use crate::{adaptor::Adaptor, dart::Dart, error::Error, map::Map, orbit::Orbit};

/// Weight of the ring barycenters in corner cutting predictions.
const CORNER_CUTTING_WEIGHT: f64 = 0.25;

/// Places the merged vertex in the middle of the edge.
pub struct MidEdgeApproximator;

impl<A: Adaptor> Approximator<A> for MidEdgeApproximator {
    fn init(&mut self, _map: &Map, _points: &[A::Vector]) -> Result<(), Error> {
        Ok(())
    }

    fn approximate(&self, map: &Map, points: &[A::Vector], d: Dart) -> Result<A::Vector, Error> {
        Ok((map.calc_point::<A>(d, points)? + map.calc_point::<A>(map.phi1(d), points)?)
            * A::scalarf64(0.5))
    }
}

/// Places the merged vertex where the sum of the quadrics of the endpoints is
/// smallest. When that point is not unique, the best of the endpoints and the
/// midpoint is used.
#[derive(Default)]
pub struct QemApproximator {
    quadrics: Vec<Quadric>,
    pending: Quadric,
}

impl QemApproximator {
    fn edge_quadric(&self, map: &Map, d: Dart) -> Result<Quadric, Error> {
        Ok(Quadric::lookup(&self.quadrics, map.vertex_line(d)?)?
            + Quadric::lookup(&self.quadrics, map.vertex_line(map.phi1(d))?)?)
    }
}

impl<A: Adaptor> Approximator<A> for QemApproximator {
    fn init(&mut self, map: &Map, points: &[A::Vector]) -> Result<(), Error> {
        self.quadrics = Quadric::vertex_quadrics::<A>(map, points)?;
        Ok(())
    }

    fn approximate(&self, map: &Map, points: &[A::Vector], d: Dart) -> Result<A::Vector, Error> {
        let q = self.edge_quadric(map, d)?;
        if let Some(p) = q.minimizer() {
            return Ok(A::from_f64_array(p));
        }
        let p0 = map.calc_point::<A>(d, points)?;
        let p1 = map.calc_point::<A>(map.phi1(d), points)?;
        Ok([p0, p1, (p0 + p1) * A::scalarf64(0.5)]
            .into_iter()
            .map(|p| (q.residual(A::to_f64_array(&p)), p))
            .fold(None, |best: Option<(f64, A::Vector)>, (err, p)| match best {
                Some((e, _)) if e <= err => best,
                _ => Some((err, p)),
            })
            .map_or(p1, |(_, p)| p))
    }

    fn before_collapse(&mut self, map: &Map, _points: &[A::Vector], d: Dart) -> Result<(), Error> {
        self.pending = self.edge_quadric(map, d)?;
        Ok(())
    }

    fn after_collapse(&mut self, map: &Map, _points: &[A::Vector], v: Dart) -> Result<(), Error> {
        let line = map.vertex_line(v)?;
        *self
            .quadrics
            .get_mut(line)
            .ok_or(Error::OutOfBoundsAccess(line as u32))? = self.pending;
        Ok(())
    }

    fn finish(&mut self) {
        self.quadrics.clear();
    }
}

/**
 * How the two endpoints of a collapsed edge are guessed back from the merged
 * vertex and its neighbours. Each predictor comes with its own placement of
 * the merged vertex, and the two predictions always add up to the sum of the
 * endpoints they stand for, except for [`Predictor::HalfCollapse`].
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predictor {
    /// The merged vertex is the head of the collapsed dart, and both
    /// endpoints are predicted there.
    HalfCollapse,
    /// Inverse of a corner cutting step. Each endpoint is predicted between
    /// the merged vertex and the barycenter of its other neighbours, and the
    /// merged vertex is placed where these predictions fit best.
    CornerCutting,
    /// The merged vertex is the middle of the edge. The endpoints are
    /// predicted half an edge away from it, along the projection of the edge
    /// on the tangent plane.
    TangentPredict1,
    /// Like [`Predictor::TangentPredict1`], but the merged vertex is lifted
    /// off the edge towards the arc suggested by the endpoint normals, and
    /// the predictions are lowered back by the same amount.
    TangentPredict2,
}

/// Difference between the actual and the predicted positions of the
/// endpoints of one collapsed edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollapseDetail<V> {
    /// Vertex line of the merged vertex.
    pub vertex: u32,
    /// Vertex line released by the collapse.
    pub removed: u32,
    /// Details of the origin and the head of the collapsed dart, in that
    /// order.
    pub detail: [V; 2],
}

/// Approximator driven by a [`Predictor`]. It records a [`CollapseDetail`] for
/// every collapse, so that the collapses can be undone exactly.
pub struct PredictingApproximator<V> {
    predictor: Predictor,
    details: Vec<CollapseDetail<V>>,
}

impl<V> PredictingApproximator<V> {
    pub fn new(predictor: Predictor) -> Self {
        PredictingApproximator {
            predictor,
            details: Vec::new(),
        }
    }

    pub fn predictor(&self) -> Predictor {
        self.predictor
    }

    pub fn details(&self) -> &[CollapseDetail<V>] {
        &self.details
    }
}

/// Barycenter of the neighbours of the origin of `d`, leaving out the head of
/// `d`. The origin itself if there is no other neighbour.
fn ring_barycenter<A: Adaptor>(
    map: &Map,
    points: &[A::Vector],
    d: Dart,
) -> Result<A::Vector, Error> {
    let mut total = A::zero_vector();
    let mut count = 0usize;
    for x in map.orbit(Orbit::Vertex, d) {
        if x != d {
            total = total + map.calc_point::<A>(map.phi1(x), points)?;
            count += 1;
        }
    }
    if count == 0 {
        return map.calc_point::<A>(d, points);
    }
    Ok(total / A::scalarf64(count as f64))
}

/// Edge vector of `d`, the average normal at its endpoints, and how far the
/// surface is estimated to bulge out of the middle of the edge along that
/// normal.
fn edge_frame<A: Adaptor>(
    map: &Map,
    points: &[A::Vector],
    d: Dart,
) -> Result<(A::Vector, A::Vector, A::Scalar), Error> {
    let e = map.calc_edge_vector::<A>(d, points)?;
    let n0 = map.calc_vertex_normal::<A>(d, points)?;
    let n1 = map.calc_vertex_normal::<A>(map.phi1(d), points)?;
    let n = A::normalized_vec(n0 + n1);
    // Sagitta of the circular arc through both endpoints with these normals.
    let bulge = (A::dot_product(e, n1) - A::dot_product(e, n0)) * A::scalarf64(0.125);
    Ok((e, n, bulge))
}

/// Component of `e` orthogonal to the unit vector `n`.
fn tangential<A: Adaptor>(e: A::Vector, n: A::Vector) -> A::Vector {
    e - n * A::dot_product(e, n)
}

impl<A: Adaptor> Approximator<A> for PredictingApproximator<A::Vector> {
    fn init(&mut self, _map: &Map, _points: &[A::Vector]) -> Result<(), Error> {
        self.details.clear();
        Ok(())
    }

    fn approximate(&self, map: &Map, points: &[A::Vector], d: Dart) -> Result<A::Vector, Error> {
        let p0 = map.calc_point::<A>(d, points)?;
        let p1 = map.calc_point::<A>(map.phi1(d), points)?;
        let mid = (p0 + p1) * A::scalarf64(0.5);
        Ok(match self.predictor {
            Predictor::HalfCollapse => p1,
            Predictor::CornerCutting => {
                let c0 = ring_barycenter::<A>(map, points, d)?;
                let c1 = ring_barycenter::<A>(map, points, map.phi2(d))?;
                let w = A::scalarf64(CORNER_CUTTING_WEIGHT);
                (p0 + p1 - (c0 + c1) * w) / (A::scalarf64(2.0) * (A::scalarf64(1.0) - w))
            }
            Predictor::TangentPredict1 => mid,
            Predictor::TangentPredict2 => {
                let (_, n, bulge) = edge_frame::<A>(map, points, d)?;
                mid + n * bulge
            }
        })
    }

    fn predict(
        &self,
        map: &Map,
        points: &[A::Vector],
        d: Dart,
        p: A::Vector,
    ) -> Result<Option<[A::Vector; 2]>, Error> {
        let half = A::scalarf64(0.5);
        Ok(Some(match self.predictor {
            Predictor::HalfCollapse => [p, p],
            Predictor::CornerCutting => {
                let c0 = ring_barycenter::<A>(map, points, d)?;
                let c1 = ring_barycenter::<A>(map, points, map.phi2(d))?;
                let w = A::scalarf64(CORNER_CUTTING_WEIGHT);
                let keep = A::scalarf64(1.0) - w;
                [p * keep + c0 * w, p * keep + c1 * w]
            }
            Predictor::TangentPredict1 => {
                let (e, n, _) = edge_frame::<A>(map, points, d)?;
                let t = tangential::<A>(e, n) * half;
                [p - t, p + t]
            }
            Predictor::TangentPredict2 => {
                let (e, n, bulge) = edge_frame::<A>(map, points, d)?;
                let t = tangential::<A>(e, n) * half;
                let base = p - n * bulge;
                [base - t, base + t]
            }
        }))
    }

    fn before_collapse(&mut self, map: &Map, points: &[A::Vector], d: Dart) -> Result<(), Error> {
        let p = Approximator::<A>::approximate(self, map, points, d)?;
        let [q0, q1] = Approximator::<A>::predict(self, map, points, d, p)?
            .unwrap_or([p, p]);
        let p0 = map.calc_point::<A>(d, points)?;
        let p1 = map.calc_point::<A>(map.phi1(d), points)?;
        self.details.try_reserve(1)?;
        self.details.push(CollapseDetail {
            vertex: map.vertex_line(map.phi1(d))? as u32,
            removed: map.vertex_line(d)? as u32,
            detail: [p0 - q0, p1 - q1],
        });
        Ok(())
    }

    fn take_details(&mut self) -> Vec<CollapseDetail<A::Vector>> {
        std::mem::take(&mut self.details)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        decimate::test::dense_cube,
        macros::{assert_f32_eq, assert_position_eq},
        use_glam::BuiltInAdaptorF32,
    };
    use glam::Vec3;

    type A = BuiltInAdaptorF32;

    /// Every interior edge of a flat grid, with the positions of its
    /// endpoints.
    fn flat_edges() -> (Map, Vec<Vec3>, Vec<Dart>) {
        let (grid, pos) = Map::grid::<A>(4, 4, 1.0).expect("Cannot create grid");
        let points = grid.column(&pos).expect("Cannot read positions").to_vec();
        let edges = grid
            .edges()
            .filter(|e| !grid.is_boundary_edge(*e))
            .collect();
        (grid, points, edges)
    }

    fn endpoints(map: &Map, points: &[Vec3], d: Dart) -> [Vec3; 2] {
        [
            map.calc_point::<A>(d, points).expect("Cannot read point"),
            map.calc_point::<A>(map.phi1(d), points).expect("Cannot read point"),
        ]
    }

    fn prediction(
        approx: &PredictingApproximator<Vec3>,
        map: &Map,
        points: &[Vec3],
        d: Dart,
    ) -> (Vec3, [Vec3; 2]) {
        let p = Approximator::<A>::approximate(approx, map, points, d).expect("Cannot approximate");
        let pred = Approximator::<A>::predict(approx, map, points, d, p)
            .expect("Cannot predict")
            .expect("Predictor gave nothing");
        (p, pred)
    }

    #[test]
    fn t_half_collapse_keeps_the_head() {
        let (grid, points, edges) = flat_edges();
        let approx = PredictingApproximator::new(Predictor::HalfCollapse);
        for d in edges {
            let [p0, p1] = endpoints(&grid, &points, d);
            let (p, [q0, q1]) = prediction(&approx, &grid, &points, d);
            assert_eq!(p, p1);
            assert_eq!(q0, p1);
            assert_eq!(q1, p1);
            assert_eq!(p0 - q0, p0 - p1);
        }
    }

    #[test]
    fn t_tangent_predictions_are_exact_on_a_plane() {
        let (grid, points, edges) = flat_edges();
        for predictor in [Predictor::TangentPredict1, Predictor::TangentPredict2] {
            let approx = PredictingApproximator::new(predictor);
            for &d in &edges {
                let [p0, p1] = endpoints(&grid, &points, d);
                let (p, [q0, q1]) = prediction(&approx, &grid, &points, d);
                assert_position_eq!(p, (p0 + p1) * 0.5, 1e-6);
                assert_position_eq!(q0, p0, 1e-6);
                assert_position_eq!(q1, p1, 1e-6);
            }
        }
    }

    #[test]
    fn t_tangent_predict2_lifts_towards_the_arc() {
        let (map, pos) = dense_cube();
        let points = map.column(&pos).expect("Cannot read positions").to_vec();
        let first = PredictingApproximator::new(Predictor::TangentPredict1);
        let second = PredictingApproximator::new(Predictor::TangentPredict2);
        let center = Vec3::splat(0.5);
        let mut lifted = 0;
        for d in map.edges() {
            let (mid, _) = prediction(&first, &map, &points, d);
            let (lift, [q0, q1]) = prediction(&second, &map, &points, d);
            // Never pulled inside the cube.
            assert!((lift - center).length() >= (mid - center).length() - 1e-6);
            if (lift - mid).length() > 1e-4 {
                lifted += 1;
            }
            let [p0, p1] = endpoints(&map, &points, d);
            assert_position_eq!(q0 + q1, p0 + p1, 1e-5);
        }
        // The edges across the cube's corners bend.
        assert!(lifted > 0);
    }

    #[test]
    fn t_corner_cutting_details_cancel() {
        let (map, pos) = dense_cube();
        let points = map.column(&pos).expect("Cannot read positions").to_vec();
        let approx = PredictingApproximator::new(Predictor::CornerCutting);
        for d in map.edges() {
            let [p0, p1] = endpoints(&map, &points, d);
            let (_, [q0, q1]) = prediction(&approx, &map, &points, d);
            // The merged vertex fits both predictions equally well.
            assert_position_eq!((p0 - q0) + (p1 - q1), Vec3::ZERO, 1e-5);
        }
        // On a regular grid the barycenters of opposite rings mirror each
        // other, so the merged vertex is the middle of the edge.
        let (grid, points, edges) = flat_edges();
        let d = edges
            .into_iter()
            .find(|d| {
                let [p0, p1] = endpoints(&grid, &points, *d);
                (p0 + p1) * 0.5 == Vec3::new(2.0, 1.5, 0.0)
            })
            .expect("Cannot find the edge");
        let (p, _) = prediction(&approx, &grid, &points, d);
        assert_position_eq!(p, Vec3::new(2.0, 1.5, 0.0), 1e-6);
    }

    #[test]
    fn t_details_restore_the_endpoints() {
        for predictor in [
            Predictor::HalfCollapse,
            Predictor::CornerCutting,
            Predictor::TangentPredict1,
            Predictor::TangentPredict2,
        ] {
            let (mut map, pos) = dense_cube();
            let mut approx = PredictingApproximator::<Vec3>::new(predictor);
            Approximator::<A>::init(&mut approx, &map, &[]).expect("Cannot init");
            let d = map
                .edges()
                .find(|d| map.can_collapse_edge(*d))
                .expect("Cannot find a collapsible edge");
            let points = map.column(&pos).expect("Cannot read positions").to_vec();
            let [p0, p1] = endpoints(&map, &points, d);
            let (p, [q0, q1]) = prediction(&approx, &map, &points, d);
            Approximator::<A>::before_collapse(&mut approx, &map, &points, d)
                .expect("Cannot record details");
            let head = map.vertex_line(map.phi1(d)).expect("Cannot find line") as u32;
            let v = map.collapse_edge(d).expect("Cannot collapse edge");
            assert_eq!(map.vertex_line(v).expect("Cannot find line") as u32, head);
            let details = Approximator::<A>::take_details(&mut approx);
            assert_eq!(details.len(), 1);
            assert_eq!(details[0].vertex, head);
            assert_position_eq!(q0 + details[0].detail[0], p0, 1e-6);
            assert_position_eq!(q1 + details[0].detail[1], p1, 1e-6);
            if predictor == Predictor::HalfCollapse {
                assert_eq!(p, p1);
                assert_f32_eq!(details[0].detail[1].length(), 0.0, 1e-6, "{predictor:?}");
            }
            assert!(approx.details().is_empty());
        }
    }
}
