/*!
Traversors enumerate the cells of one orbit kind, yielding one representative
dart per cell. Representatives are never boundary darts, so boundary faces are
not visited.

There are two flavors:

+ [`Traversor`] visits cells in storage order. It is what [`Map::cells`] and
  the shorthands [`Map::vertices`], [`Map::edges`], [`Map::faces`] and
  [`Map::volumes`] return.

+ [`CoherentTraversor`] visits cells in a spatially coherent order, so that
  consecutive cells tend to be neighbors. It grows the traversal from a
  bounded window of frontier cells, and starts a new region from storage
  order when the window runs dry. It is what [`Map::cells_coherent`]
  returns. Like [`Traversor`] it yields every cell exactly once; only the
  frontier is bounded.
*/

use crate::{
    dart::Dart,
    map::Map,
    marker::DartMarker,
    orbit::Orbit,
};
use std::collections::VecDeque;

/// Maximum number of frontier cells kept by [`CoherentTraversor`].
pub const COHERENT_WINDOW: usize = 20;

type Filter<'a> = Box<dyn Fn(Dart) -> bool + 'a>;

pub struct Traversor<'a> {
    map: &'a Map,
    orbit: Orbit,
    visited: DartMarker,
    cursor: u32,
    filter: Option<Filter<'a>>,
}

impl<'a> Traversor<'a> {
    fn new(map: &'a Map, orbit: Orbit, filter: Option<Filter<'a>>) -> Self {
        Traversor {
            map,
            orbit,
            visited: DartMarker::new(map),
            cursor: 0,
            filter,
        }
    }

    pub fn orbit(&self) -> Orbit {
        self.orbit
    }

    /// Start over from the first cell.
    pub fn restart(&mut self) {
        self.visited.unmark_all();
        self.cursor = 0;
    }
}

impl Iterator for Traversor<'_> {
    type Item = Dart;

    fn next(&mut self) -> Option<Self::Item> {
        let capacity = self.map.dart_capacity() as u32;
        while self.cursor < capacity {
            let d = Dart::from(self.cursor);
            self.cursor += 1;
            if !self.map.is_valid(d) || self.map.is_boundary_dart(d) || self.visited.is_marked(d)
            {
                continue;
            }
            self.visited.mark_orbit(self.map, self.orbit, d);
            if self.filter.as_ref().is_none_or(|f| f(d)) {
                return Some(d);
            }
        }
        None
    }
}

pub struct CoherentTraversor<'a> {
    map: &'a Map,
    orbit: Orbit,
    visited: DartMarker,
    window: VecDeque<Dart>,
    cursor: u32,
    filter: Option<Filter<'a>>,
}

impl<'a> CoherentTraversor<'a> {
    fn new(map: &'a Map, orbit: Orbit, filter: Option<Filter<'a>>) -> Self {
        CoherentTraversor {
            map,
            orbit,
            visited: DartMarker::new(map),
            window: VecDeque::with_capacity(COHERENT_WINDOW),
            cursor: 0,
            filter,
        }
    }

    pub fn orbit(&self) -> Orbit {
        self.orbit
    }

    pub fn restart(&mut self) {
        self.visited.unmark_all();
        self.window.clear();
        self.cursor = 0;
    }

    fn push_candidate(&mut self, d: Dart) {
        if self.window.len() < COHERENT_WINDOW
            && !self.map.is_boundary_dart(d)
            && !self.visited.is_marked(d)
        {
            self.window.push_back(d);
        }
    }

    /// Queue the cells adjacent to the cell of `d`.
    fn push_neighbors(&mut self, d: Dart) {
        let map = self.map;
        match self.orbit {
            Orbit::Vertex => {
                for vd in map.orbit(Orbit::Vertex, d) {
                    if !map.is_boundary_dart(vd) {
                        self.push_candidate(map.phi1(vd));
                    }
                }
            }
            Orbit::Edge => {
                for ed in [d, map.phi2(d)] {
                    if !map.is_boundary_dart(ed) {
                        self.push_candidate(map.phi1(ed));
                        self.push_candidate(map.phi_1(ed));
                    }
                }
            }
            Orbit::Face => {
                for fd in map.orbit(Orbit::Face, d) {
                    self.push_candidate(map.phi2(fd));
                }
            }
            Orbit::Volume => {}
        }
    }

    /// Next unvisited dart in storage order.
    fn seed(&mut self) -> Option<Dart> {
        let capacity = self.map.dart_capacity() as u32;
        while self.cursor < capacity {
            let d = Dart::from(self.cursor);
            self.cursor += 1;
            if self.map.is_valid(d) && !self.map.is_boundary_dart(d) && !self.visited.is_marked(d)
            {
                return Some(d);
            }
        }
        None
    }
}

impl Iterator for CoherentTraversor<'_> {
    type Item = Dart;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let d = match self.window.pop_front() {
                Some(d) if self.visited.is_marked(d) => continue,
                Some(d) => d,
                None => self.seed()?,
            };
            self.visited.mark_orbit(self.map, self.orbit, d);
            self.push_neighbors(d);
            if self.filter.as_ref().is_none_or(|f| f(d)) {
                return Some(d);
            }
        }
    }
}

impl Map {
    /// Every cell of `orbit` exactly once, in storage order.
    pub fn cells(&self, orbit: Orbit) -> Traversor<'_> {
        Traversor::new(self, orbit, None)
    }

    /// Cells of `orbit` whose representative dart satisfies `pred`.
    pub fn cells_where<'a, P>(&'a self, orbit: Orbit, pred: P) -> Traversor<'a>
    where
        P: Fn(Dart) -> bool + 'a,
    {
        Traversor::new(self, orbit, Some(Box::new(pred)))
    }

    /// Every cell of `orbit` exactly once, neighbors close together.
    pub fn cells_coherent(&self, orbit: Orbit) -> CoherentTraversor<'_> {
        CoherentTraversor::new(self, orbit, None)
    }

    pub fn cells_coherent_where<'a, P>(&'a self, orbit: Orbit, pred: P) -> CoherentTraversor<'a>
    where
        P: Fn(Dart) -> bool + 'a,
    {
        CoherentTraversor::new(self, orbit, Some(Box::new(pred)))
    }

    pub fn vertices(&self) -> Traversor<'_> {
        self.cells(Orbit::Vertex)
    }

    pub fn edges(&self) -> Traversor<'_> {
        self.cells(Orbit::Edge)
    }

    pub fn faces(&self) -> Traversor<'_> {
        self.cells(Orbit::Face)
    }

    pub fn volumes(&self) -> Traversor<'_> {
        self.cells(Orbit::Volume)
    }
}
