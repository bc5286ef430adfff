use crate::{dart::Dart, map::Map, marker::DartMarker};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The kinds of cells of a 2-map. In a 2-map the volume orbit is the
/// connected component of a dart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Orbit {
    Vertex,
    Edge,
    Face,
    Volume,
}

impl Orbit {
    pub const ALL: [Orbit; 4] = [Orbit::Vertex, Orbit::Edge, Orbit::Face, Orbit::Volume];

    pub const fn index(self) -> usize {
        match self {
            Orbit::Vertex => 0,
            Orbit::Edge => 1,
            Orbit::Face => 2,
            Orbit::Volume => 3,
        }
    }
}

impl Display for Orbit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Orbit::Vertex => "vertex",
            Orbit::Edge => "edge",
            Orbit::Face => "face",
            Orbit::Volume => "volume",
        })
    }
}

enum Walk {
    Cycle { orbit: Orbit, next: Option<Dart> },
    Flood { marker: DartMarker, stack: Vec<Dart> },
}

/**
 * Lazy iterator over the darts of an orbit.
 *
 * Vertex, edge and face orbits are cycles of a single permutation and are
 * walked without any extra storage, stopping when the walk returns to the
 * seed. The volume orbit is a flood fill over all three relations and uses a
 * dart marker.
 */
pub struct OrbitIter<'a> {
    map: &'a Map,
    seed: Dart,
    walk: Walk,
}

impl<'a> OrbitIter<'a> {
    pub(crate) fn new(map: &'a Map, orbit: Orbit, seed: Dart) -> Self {
        let walk = match orbit {
            Orbit::Volume => {
                let mut marker = DartMarker::new(map);
                marker.mark(seed);
                Walk::Flood {
                    marker,
                    stack: vec![seed],
                }
            }
            _ => Walk::Cycle {
                orbit,
                next: Some(seed),
            },
        };
        OrbitIter { map, seed, walk }
    }
}

impl Iterator for OrbitIter<'_> {
    type Item = Dart;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.walk {
            Walk::Cycle { orbit, next } => {
                let current = (*next)?;
                let step = match orbit {
                    Orbit::Vertex => self.map.alpha1(current),
                    Orbit::Edge => self.map.phi2(current),
                    _ => self.map.phi1(current),
                };
                *next = if step == self.seed { None } else { Some(step) };
                Some(current)
            }
            Walk::Flood { marker, stack } => {
                let current = stack.pop()?;
                for d in [
                    self.map.phi1(current),
                    self.map.phi_1(current),
                    self.map.phi2(current),
                ] {
                    if !marker.is_marked(d) {
                        marker.mark(d);
                        stack.push(d);
                    }
                }
                Some(current)
            }
        }
    }
}
