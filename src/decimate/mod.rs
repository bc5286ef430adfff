/*!
Edge collapse decimation.

A [`Decimater`] repeatedly asks an [`EdgeSelector`] for the next edge to
collapse, asks an [`Approximator`] where the merged vertex should go, collapses
the edge and lets both update their state. The built-in selectors and
approximators are picked by [`SelectorKind`] and [`ApproximatorKind`] in a
[`DecimationConfig`]. Custom ones can be used with
[`Decimater::decimate_with`].
*/

use crate::{
    adaptor::Adaptor,
    attribute::AttributeHandle,
    dart::Dart,
    error::Error,
    map::Map,
    orbit::Orbit,
};
use serde::{Deserialize, Serialize};

mod approximator;
mod quadric;
mod queue;
mod selector;

pub use approximator::{
    CollapseDetail, MidEdgeApproximator, PredictingApproximator, Predictor, QemApproximator,
};
pub use quadric::Quadric;
pub use queue::Queue;
pub use selector::{MapOrderSelector, Metric, PrioritySelector, RandomSelector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorKind {
    /// Collapsible edges in storage order.
    MapOrder,
    /// Collapsible edges in a shuffled order, reproducible from the seed.
    Random { seed: u64 },
    /// Shortest edge first.
    EdgeLength,
    /// Smallest quadric error first.
    Qem,
    /// Short edges in flat regions first.
    Curvature,
    /// Smallest detail first, as recorded by the approximator's predictor.
    MinDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApproximatorKind {
    /// Middle of the collapsed edge.
    MidEdge,
    /// Minimizer of the quadric error of the edge.
    Qem,
    /// Keep the surviving endpoint where it is.
    HalfCollapse,
    /// Inverse corner cutting, see [`Predictor::CornerCutting`].
    CornerCutting,
    /// Middle of the edge, with tangent predictions of the endpoints.
    TangentPredict1,
    /// Middle of the edge lifted towards the surface, with tangent
    /// predictions of the endpoints.
    TangentPredict2,
}

impl ApproximatorKind {
    /// The predictor that records details for this approximator, if any.
    pub fn predictor(self) -> Option<Predictor> {
        match self {
            ApproximatorKind::MidEdge | ApproximatorKind::Qem => None,
            ApproximatorKind::HalfCollapse => Some(Predictor::HalfCollapse),
            ApproximatorKind::CornerCutting => Some(Predictor::CornerCutting),
            ApproximatorKind::TangentPredict1 => Some(Predictor::TangentPredict1),
            ApproximatorKind::TangentPredict2 => Some(Predictor::TangentPredict2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimationConfig {
    pub selector: SelectorKind,
    pub approximator: ApproximatorKind,
}

impl Default for DecimationConfig {
    fn default() -> Self {
        DecimationConfig {
            selector: SelectorKind::Qem,
            approximator: ApproximatorKind::Qem,
        }
    }
}

/// Computes the position of the vertex produced by collapsing an edge.
/// `points` are the vertex positions, indexed by vertex line.
pub trait Approximator<A: Adaptor> {
    fn init(&mut self, map: &Map, points: &[A::Vector]) -> Result<(), Error>;

    /// Position of the merged vertex if the edge of `d` is collapsed.
    fn approximate(&self, map: &Map, points: &[A::Vector], d: Dart) -> Result<A::Vector, Error>;

    /// Positions of the origin and head of `d` predicted back from the merged
    /// vertex at `p`. `None` for approximators that record no details.
    fn predict(
        &self,
        _map: &Map,
        _points: &[A::Vector],
        _d: Dart,
        _p: A::Vector,
    ) -> Result<Option<[A::Vector; 2]>, Error> {
        Ok(None)
    }

    fn before_collapse(&mut self, _map: &Map, _points: &[A::Vector], _d: Dart) -> Result<(), Error> {
        Ok(())
    }

    /// Called with a dart of the merged vertex, after its position is updated.
    fn after_collapse(&mut self, _map: &Map, _points: &[A::Vector], _v: Dart) -> Result<(), Error> {
        Ok(())
    }

    /// Details recorded since the last call, in collapse order.
    fn take_details(&mut self) -> Vec<CollapseDetail<A::Vector>> {
        Vec::new()
    }

    fn finish(&mut self) {}
}

/// Decides the order in which edges are collapsed.
pub trait EdgeSelector<A: Adaptor> {
    fn init(
        &mut self,
        map: &Map,
        points: &[A::Vector],
        approx: &dyn Approximator<A>,
    ) -> Result<(), Error>;

    /// The next edge to collapse. Must be collapsible. `None` ends the
    /// decimation.
    fn next_edge(&mut self, map: &Map) -> Option<Dart>;

    fn update_before_collapse(&mut self, map: &Map, d: Dart) -> Result<(), Error>;

    /// Called with a dart of the merged vertex.
    fn update_after_collapse(
        &mut self,
        map: &Map,
        points: &[A::Vector],
        approx: &dyn Approximator<A>,
        v: Dart,
    ) -> Result<(), Error>;

    fn finish(&mut self) {}
}

pub struct Decimater {
    config: DecimationConfig,
}

impl Decimater {
    pub fn new(config: DecimationConfig) -> Self {
        Decimater { config }
    }

    pub fn config(&self) -> &DecimationConfig {
        &self.config
    }

    pub(crate) fn make_selector<A: Adaptor + 'static>(&self) -> Box<dyn EdgeSelector<A>> {
        match self.config.selector {
            SelectorKind::MapOrder => Box::new(MapOrderSelector::default()),
            SelectorKind::Random { seed } => Box::new(RandomSelector::new(seed)),
            SelectorKind::EdgeLength => Box::new(PrioritySelector::new(Metric::EdgeLength)),
            SelectorKind::Qem => Box::new(PrioritySelector::new(Metric::Qem)),
            SelectorKind::Curvature => Box::new(PrioritySelector::new(Metric::Curvature)),
            SelectorKind::MinDetail => Box::new(PrioritySelector::new(Metric::MinDetail)),
        }
    }

    pub(crate) fn make_approximator<A: Adaptor + 'static>(&self) -> Box<dyn Approximator<A>> {
        match (self.config.approximator, self.config.approximator.predictor()) {
            (_, Some(predictor)) => Box::new(PredictingApproximator::<A::Vector>::new(predictor)),
            (ApproximatorKind::Qem, None) => Box::new(QemApproximator::default()),
            (_, None) => Box::new(MidEdgeApproximator),
        }
    }

    /**
     * Collapse edges as long as `pred(num_collapses, num_vertices,
     * num_faces)` holds and the selector finds collapsible edges. Returns the
     * number of collapsed edges.
     */
    pub fn decimate_while<A, F>(
        &self,
        map: &mut Map,
        position: &AttributeHandle<A::Vector>,
        pred: F,
    ) -> Result<usize, Error>
    where
        A: Adaptor + 'static,
        F: Fn(usize, usize, usize) -> bool,
    {
        let mut selector = self.make_selector::<A>();
        let mut approx = self.make_approximator::<A>();
        Self::decimate_with(map, position, selector.as_mut(), approx.as_mut(), pred)
    }

    /// Like [`Decimater::decimate_while`], with caller supplied selector and
    /// approximator.
    pub fn decimate_with<A, F>(
        map: &mut Map,
        position: &AttributeHandle<A::Vector>,
        selector: &mut dyn EdgeSelector<A>,
        approx: &mut dyn Approximator<A>,
        pred: F,
    ) -> Result<usize, Error>
    where
        A: Adaptor,
        F: Fn(usize, usize, usize) -> bool,
    {
        if position.orbit() != Orbit::Vertex {
            return Err(Error::WrongOrbit(position.orbit(), Orbit::Vertex));
        }
        // Collapses only release vertex lines, so this copy stays aligned with
        // the column.
        let mut points: Vec<A::Vector> = map.column(position)?.to_vec();
        approx.init(map, &points)?;
        selector.init(map, &points, approx)?;
        let (mut nc, mut nv, mut nf) = (0usize, map.num_vertices(), map.num_faces());
        while pred(nc, nv, nf) {
            let Some(d) = selector.next_edge(map) else {
                break;
            };
            let e = map.phi2(d);
            let removed = [d, e]
                .into_iter()
                .filter(|x| map.is_interior_triangle(*x))
                .count();
            let pos = approx.approximate(map, &points, d)?;
            approx.before_collapse(map, &points, d)?;
            selector.update_before_collapse(map, d)?;
            let v = map.collapse_edge(d)?;
            let line = map.vertex_line(v)?;
            *points
                .get_mut(line)
                .ok_or(Error::OutOfBoundsAccess(line as u32))? = pos;
            *map.value_mut(position, line as u32)? = pos;
            approx.after_collapse(map, &points, v)?;
            selector.update_after_collapse(map, &points, approx, v)?;
            (nc, nv, nf) = (nc + 1, nv - 1, nf - removed);
        }
        selector.finish();
        approx.finish();
        log::debug!("Decimation collapsed {nc} edges, {nv} vertices and {nf} faces remain");
        Ok(nc)
    }

    pub fn decimate<A: Adaptor + 'static>(
        &self,
        map: &mut Map,
        position: &AttributeHandle<A::Vector>,
        num_collapses: usize,
    ) -> Result<usize, Error> {
        self.decimate_while::<A, _>(map, position, |n, _v, _f| n < num_collapses)
    }

    pub fn decimate_to_vertex_count<A: Adaptor + 'static>(
        &self,
        map: &mut Map,
        position: &AttributeHandle<A::Vector>,
        vert_target: usize,
    ) -> Result<usize, Error> {
        self.decimate_while::<A, _>(map, position, |_n, v, _f| v > vert_target)
    }

    pub fn decimate_to_face_count<A: Adaptor + 'static>(
        &self,
        map: &mut Map,
        position: &AttributeHandle<A::Vector>,
        face_target: usize,
    ) -> Result<usize, Error> {
        self.decimate_while::<A, _>(map, position, |_n, _v, f| f > face_target)
    }
}
