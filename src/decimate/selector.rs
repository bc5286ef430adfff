use super::{Approximator, EdgeSelector, quadric::Quadric, queue::Queue};
use crate::{adaptor::Adaptor, dart::Dart, error::Error, map::Map, orbit::Orbit};
use num_traits::Float;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Scans the darts in storage order, starting over after every collapse.
#[derive(Default)]
pub struct MapOrderSelector {
    cursor: u32,
}

impl<A: Adaptor> EdgeSelector<A> for MapOrderSelector {
    fn init(
        &mut self,
        _map: &Map,
        _points: &[A::Vector],
        _approx: &dyn Approximator<A>,
    ) -> Result<(), Error> {
        self.cursor = 0;
        Ok(())
    }

    fn next_edge(&mut self, map: &Map) -> Option<Dart> {
        let capacity = map.dart_capacity() as u32;
        while self.cursor < capacity {
            let d = Dart::from(self.cursor);
            if map.is_valid(d) && !map.is_boundary_dart(d) && map.can_collapse_edge(d) {
                return Some(d);
            }
            self.cursor += 1;
        }
        None
    }

    fn update_before_collapse(&mut self, _map: &Map, _d: Dart) -> Result<(), Error> {
        Ok(())
    }

    fn update_after_collapse(
        &mut self,
        _map: &Map,
        _points: &[A::Vector],
        _approx: &dyn Approximator<A>,
        _v: Dart,
    ) -> Result<(), Error> {
        self.cursor = 0;
        Ok(())
    }
}

/// Visits the darts in a shuffled order. When the end is reached, the
/// remaining darts are shuffled again, unless nothing was collapsed in the
/// last pass.
pub struct RandomSelector {
    rng: StdRng,
    darts: Vec<Dart>,
    cursor: usize,
    collapsed: bool,
}

impl RandomSelector {
    pub fn new(seed: u64) -> Self {
        RandomSelector {
            rng: StdRng::seed_from_u64(seed),
            darts: Vec::new(),
            cursor: 0,
            collapsed: false,
        }
    }

    fn shuffle(&mut self, map: &Map) {
        self.darts.clear();
        self.darts
            .extend(map.darts().filter(|d| !map.is_boundary_dart(*d)));
        self.darts.shuffle(&mut self.rng);
        self.cursor = 0;
        self.collapsed = false;
    }
}

impl<A: Adaptor> EdgeSelector<A> for RandomSelector {
    fn init(
        &mut self,
        map: &Map,
        _points: &[A::Vector],
        _approx: &dyn Approximator<A>,
    ) -> Result<(), Error> {
        self.shuffle(map);
        Ok(())
    }

    fn next_edge(&mut self, map: &Map) -> Option<Dart> {
        loop {
            while let Some(&d) = self.darts.get(self.cursor) {
                self.cursor += 1;
                if map.is_valid(d) && !map.is_boundary_dart(d) && map.can_collapse_edge(d) {
                    return Some(d);
                }
            }
            if !self.collapsed {
                return None;
            }
            self.shuffle(map);
        }
    }

    fn update_before_collapse(&mut self, _map: &Map, _d: Dart) -> Result<(), Error> {
        Ok(())
    }

    fn update_after_collapse(
        &mut self,
        _map: &Map,
        _points: &[A::Vector],
        _approx: &dyn Approximator<A>,
        _v: Dart,
    ) -> Result<(), Error> {
        self.collapsed = true;
        Ok(())
    }
}

/// Cost used to order edges in a [`PrioritySelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Squared edge length.
    EdgeLength,
    /// Quadric error at the approximated position.
    Qem,
    /// Squared edge length, scaled up by the dihedral angle at the edge.
    Curvature,
    /// Squared length of the details the approximator would record, falling
    /// back to the squared edge length for approximators without a
    /// predictor.
    MinDetail,
}

/// Collapses the cheapest edge first. Edges are queued by the smaller of their
/// two darts.
pub struct PrioritySelector {
    metric: Metric,
    queue: Queue<Dart, f64>,
    quadrics: Vec<Quadric>,
    pending: Quadric,
}

impl PrioritySelector {
    pub fn new(metric: Metric) -> Self {
        PrioritySelector {
            metric,
            queue: Queue::new(0),
            quadrics: Vec::new(),
            pending: Quadric::default(),
        }
    }

    fn key(map: &Map, d: Dart) -> Dart {
        d.min(map.phi2(d))
    }

    fn cost<A: Adaptor>(
        &self,
        map: &Map,
        points: &[A::Vector],
        approx: &dyn Approximator<A>,
        d: Dart,
    ) -> Result<f64, Error> {
        Ok(match self.metric {
            Metric::EdgeLength => A::to_f64(map.calc_edge_length_sqr::<A>(d, points)?),
            Metric::Qem => {
                let q = Quadric::lookup(&self.quadrics, map.vertex_line(d)?)?
                    + Quadric::lookup(&self.quadrics, map.vertex_line(map.phi1(d))?)?;
                q.residual(A::to_f64_array(&approx.approximate(map, points, d)?))
            }
            Metric::Curvature => {
                let len = A::to_f64(map.calc_edge_length_sqr::<A>(d, points)?);
                let angle = A::to_f64(map.calc_dihedral_angle::<A>(d, points)?.abs());
                len * (1.0 + angle)
            }
            Metric::MinDetail => {
                let p = approx.approximate(map, points, d)?;
                match approx.predict(map, points, d, p)? {
                    Some([q0, q1]) => {
                        let r0 = map.calc_point::<A>(d, points)? - q0;
                        let r1 = map.calc_point::<A>(map.phi1(d), points)? - q1;
                        A::to_f64(A::dot_product(r0, r0) + A::dot_product(r1, r1))
                    }
                    None => A::to_f64(map.calc_edge_length_sqr::<A>(d, points)?),
                }
            }
        })
    }

    fn queue_edge<A: Adaptor>(
        &mut self,
        map: &Map,
        points: &[A::Vector],
        approx: &dyn Approximator<A>,
        d: Dart,
    ) -> Result<(), Error> {
        let key = Self::key(map, d);
        if map.can_collapse_edge(key) {
            let cost = self.cost(map, points, approx, key)?;
            self.queue.insert(key, cost);
        } else {
            self.queue.remove(key);
        }
        Ok(())
    }
}

impl<A: Adaptor> EdgeSelector<A> for PrioritySelector {
    fn init(
        &mut self,
        map: &Map,
        points: &[A::Vector],
        approx: &dyn Approximator<A>,
    ) -> Result<(), Error> {
        if self.metric == Metric::Qem {
            self.quadrics = Quadric::vertex_quadrics::<A>(map, points)?;
        }
        self.queue = Queue::new(map.dart_capacity());
        let edges: Vec<Dart> = map.edges().collect();
        for e in edges {
            self.queue_edge(map, points, approx, e)?;
        }
        Ok(())
    }

    fn next_edge(&mut self, map: &Map) -> Option<Dart> {
        while let Some((d, _)) = self.queue.pop() {
            if !map.is_valid(d) {
                log::warn!("Dropping stale queue entry {d}");
                continue;
            }
            if map.can_collapse_edge(d) {
                return Some(d);
            }
        }
        None
    }

    fn update_before_collapse(&mut self, map: &Map, d: Dart) -> Result<(), Error> {
        let e = map.phi2(d);
        if self.metric == Metric::Qem {
            self.pending = Quadric::lookup(&self.quadrics, map.vertex_line(d)?)?
                + Quadric::lookup(&self.quadrics, map.vertex_line(e)?)?;
        }
        for x in map.orbit(Orbit::Vertex, d).chain(map.orbit(Orbit::Vertex, e)) {
            self.queue.remove(Self::key(map, x));
        }
        Ok(())
    }

    fn update_after_collapse(
        &mut self,
        map: &Map,
        points: &[A::Vector],
        approx: &dyn Approximator<A>,
        v: Dart,
    ) -> Result<(), Error> {
        if self.metric == Metric::Qem {
            let line = map.vertex_line(v)?;
            *self
                .quadrics
                .get_mut(line)
                .ok_or(Error::OutOfBoundsAccess(line as u32))? = self.pending;
        }
        // Costs and collapsibility change for every edge of the faces around
        // the merged vertex.
        let ring: Vec<Dart> = map
            .orbit(Orbit::Vertex, v)
            .flat_map(|x| map.orbit(Orbit::Face, x))
            .collect();
        for x in ring {
            self.queue_edge(map, points, approx, x)?;
        }
        Ok(())
    }

    fn finish(&mut self) {
        self.queue.clear();
        self.quadrics.clear();
    }
}
