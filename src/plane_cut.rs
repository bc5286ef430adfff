/*!
Cutting a map with a plane.

Vertices are classified as above, below or on the plane. Edges whose
endpoints lie strictly on opposite sides are cut at the intersection, and the
faces they bound are split along the plane, so that afterwards every face lies
entirely on one side. The new edges, together with existing edges lying on
the plane between an above face and a below face, form the cut contour.

Optionally the two sides are detached along the contour. The holes left on
either side are then closed with cap faces, or turned into boundary faces.
*/

use crate::{
    adaptor::Adaptor,
    attribute::AttributeHandle,
    dart::Dart,
    error::Error,
    map::Map,
    marker::{CellMarker, DartMarker},
    orbit::Orbit,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Oriented plane through `origin`. The side the `normal` points to is above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane<V> {
    pub origin: V,
    pub normal: V,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneCutOptions {
    /// Detach the two sides along the contour.
    pub split: bool,
    /// When splitting, close the holes with new faces instead of boundary
    /// faces.
    pub cap: bool,
    /// Vertices within this distance from the plane are on the plane.
    pub epsilon: f64,
}

impl Default for PlaneCutOptions {
    fn default() -> Self {
        PlaneCutOptions {
            split: false,
            cap: false,
            epsilon: 1e-9,
        }
    }
}

/// Chain of contour darts. Each dart lies in a face above the plane, and the
/// head of each dart is the origin of the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContourLoop {
    pub darts: Vec<Dart>,
    pub closed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutContour {
    pub loops: Vec<ContourLoop>,
}

impl CutContour {
    pub fn num_edges(&self) -> usize {
        self.loops.iter().map(|l| l.darts.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Above,
    Below,
    On,
}

/// Side of a whole face. Faces with no vertex strictly below are above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaceClass {
    Above,
    Below,
    Straddle,
}

/// Points where the contour crosses the map before any edit: vertices on the
/// plane, and edges that get cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CutPoint {
    Vertex(u32),
    Edge(Dart),
}

struct Classifier {
    sides: Vec<Side>,
}

impl Classifier {
    fn side(&self, map: &Map, d: Dart) -> Result<Side, Error> {
        let line = map.vertex_line(d)?;
        self.sides
            .get(line)
            .copied()
            .ok_or(Error::OutOfBoundsAccess(line as u32))
    }

    fn set_on(&mut self, line: usize) {
        if line >= self.sides.len() {
            self.sides.resize(line + 1, Side::On);
        }
        self.sides[line] = Side::On;
    }

    fn face_class(&self, map: &Map, f: Dart) -> Result<FaceClass, Error> {
        let (mut above, mut below) = (false, false);
        for d in map.orbit(Orbit::Face, f) {
            match self.side(map, d)? {
                Side::Above => above = true,
                Side::Below => below = true,
                Side::On => {}
            }
        }
        Ok(match (above, below) {
            (true, true) => FaceClass::Straddle,
            (_, true) => FaceClass::Below,
            _ => FaceClass::Above,
        })
    }

    fn straddles(&self, map: &Map, d: Dart) -> Result<bool, Error> {
        Ok(matches!(
            (self.side(map, d)?, self.side(map, map.phi1(d))?),
            (Side::Above, Side::Below) | (Side::Below, Side::Above)
        ))
    }

    fn is_contour(&self, map: &Map, d: Dart) -> Result<bool, Error> {
        Ok(!map.is_boundary_edge(d)
            && self.face_class(map, d)? == FaceClass::Above
            && self.face_class(map, map.phi2(d))? == FaceClass::Below)
    }
}

/// Everything decided before the map is touched.
struct CutPlan {
    straddling: Vec<Dart>,
    faces: Vec<Dart>,
    contour_edges: usize,
    contour_vertices: usize,
}

impl Map {
    fn edge_key(&self, d: Dart) -> Dart {
        d.min(self.phi2(d))
    }

    fn plan_plane_cut(
        &self,
        classifier: &Classifier,
        options: &PlaneCutOptions,
    ) -> Result<CutPlan, Error> {
        let mut straddling = Vec::new();
        let mut seen = HashSet::new();
        let mut faces = Vec::new();
        let mut degree: HashMap<CutPoint, (usize, Dart)> = HashMap::new();
        let mut add_contour_edge = |a: (CutPoint, Dart), b: (CutPoint, Dart)| {
            for (key, d) in [a, b] {
                degree.entry(key).or_insert((0, d)).0 += 1;
            }
        };
        let mut contour_edges = 0usize;
        for f in self.faces() {
            if classifier.face_class(self, f)? != FaceClass::Straddle {
                continue;
            }
            let mut points: Vec<(CutPoint, Dart)> = Vec::with_capacity(2);
            for d in self.orbit(Orbit::Face, f) {
                if classifier.side(self, d)? == Side::On {
                    points.push((CutPoint::Vertex(self.vertex_line(d)? as u32), d));
                } else if classifier.straddles(self, d)? {
                    let key = self.edge_key(d);
                    points.push((CutPoint::Edge(key), d));
                    if seen.insert(key) {
                        straddling.push(key);
                    }
                }
            }
            if points.len() != 2 {
                return Err(Error::DegenerateCut(f));
            }
            add_contour_edge(points[0], points[1]);
            contour_edges += 1;
            faces.push(f);
        }
        // Existing edges on the plane, between an above and a below face.
        for e in self.edges() {
            if classifier.side(self, e)? != Side::On
                || classifier.side(self, self.phi1(e))? != Side::On
                || self.is_boundary_edge(e)
            {
                continue;
            }
            let mut classes = [
                classifier.face_class(self, e)?,
                classifier.face_class(self, self.phi2(e))?,
            ];
            classes.sort_by_key(|c| *c as u8);
            if classes == [FaceClass::Above, FaceClass::Below] {
                let tail = self.vertex_line(e)? as u32;
                let head = self.vertex_line(self.phi1(e))? as u32;
                add_contour_edge(
                    (CutPoint::Vertex(tail), e),
                    (CutPoint::Vertex(head), self.phi1(e)),
                );
                contour_edges += 1;
            }
        }
        for (key, (count, d)) in &degree {
            if *count > 2 {
                return Err(Error::DegenerateCut(*d));
            }
            if options.split {
                let on_boundary = match key {
                    CutPoint::Vertex(_) => self.is_boundary_vertex(*d),
                    CutPoint::Edge(_) => self.is_boundary_edge(*d),
                };
                if *count < 2 || on_boundary {
                    return Err(Error::DegenerateCut(*d));
                }
            }
        }
        Ok(CutPlan {
            straddling,
            faces,
            contour_edges,
            contour_vertices: degree.len(),
        })
    }

    /// Order the contour darts into chains. Open chains start at a vertex
    /// with no incoming contour dart.
    fn contour_loops(&self, classifier: &Classifier) -> Result<CutContour, Error> {
        let mut darts: Vec<Dart> = Vec::new();
        for d in self.darts() {
            if !self.is_boundary_dart(d) && classifier.is_contour(self, d)? {
                darts.push(d);
            }
        }
        let mut outgoing: HashMap<usize, Dart> = HashMap::new();
        let mut incoming: HashSet<usize> = HashSet::new();
        for &d in &darts {
            outgoing.entry(self.vertex_line(d)?).or_insert(d);
            incoming.insert(self.vertex_line(self.phi1(d))?);
        }
        let mut visited: HashSet<Dart> = HashSet::new();
        let mut loops = Vec::new();
        let mut starts = Vec::with_capacity(2 * darts.len());
        for &d in &darts {
            if !incoming.contains(&self.vertex_line(d)?) {
                starts.push(d);
            }
        }
        starts.extend_from_slice(&darts);
        for start in starts {
            if visited.contains(&start) {
                continue;
            }
            let mut chain = Vec::new();
            let mut closed = false;
            let mut d = start;
            loop {
                visited.insert(d);
                chain.push(d);
                match outgoing.get(&self.vertex_line(self.phi1(d))?) {
                    Some(&next) if next == start => {
                        closed = true;
                        break;
                    }
                    Some(&next) if !visited.contains(&next) => d = next,
                    _ => break,
                }
            }
            loops.push(ContourLoop {
                darts: chain,
                closed,
            });
        }
        Ok(CutContour { loops })
    }

    /// Detach the two sides along a closed contour loop, closing both holes.
    /// Returns the new vertex lines of the below side and a dart of the hole
    /// on the below side.
    fn split_along_loop(&mut self, darts: &[Dart], cap: bool) -> (Vec<u32>, Dart) {
        let n = darts.len();
        let opposite: Vec<Dart> = darts.iter().map(|d| self.phi2(*d)).collect();
        let vlines: Vec<Option<u32>> = darts
            .iter()
            .map(|d| self.embedding(*d, Orbit::Vertex))
            .collect();
        let elines: Vec<Option<u32>> = darts
            .iter()
            .map(|d| self.embedding(*d, Orbit::Edge))
            .collect();
        let above_caps: Vec<Dart> = (0..n).map(|_| self.new_dart()).collect();
        let below_caps: Vec<Dart> = (0..n).map(|_| self.new_dart()).collect();
        let mut new_lines = Vec::with_capacity(n);
        for i in 0..n {
            let (a, b) = (darts[i], opposite[i]);
            let (ca, cb) = (above_caps[i], below_caps[i]);
            self.unsew(a);
            self.sew(a, ca);
            self.sew(b, cb);
            self.link(ca, above_caps[(i + n - 1) % n]);
            self.link(cb, below_caps[(i + 1) % n]);
            self.set_boundary(ca, !cap);
            self.set_boundary(cb, !cap);
        }
        for i in 0..n {
            let (a, b) = (darts[i], opposite[i]);
            let (ca, cb) = (above_caps[i], below_caps[i]);
            self.copy_dart_embedding(self.phi1(a), ca, Orbit::Vertex);
            self.copy_dart_embedding(a, ca, Orbit::Edge);
            self.copy_dart_embedding(a, ca, Orbit::Volume);
            self.copy_dart_embedding(b, cb, Orbit::Volume);
            // The below side of the contour gets its own vertices and edges.
            if let (Some(old), Some(line)) = (vlines[i], self.new_line(Orbit::Vertex)) {
                self.container_mut(Orbit::Vertex).copy_line(old, line);
                self.set_orbit_embedding(Orbit::Vertex, cb, line);
                new_lines.push(line);
            }
            if let (Some(old), Some(line)) = (elines[i], self.new_line(Orbit::Edge)) {
                self.container_mut(Orbit::Edge).copy_line(old, line);
                self.set_dart_embedding(b, Orbit::Edge, line);
                self.set_dart_embedding(cb, Orbit::Edge, line);
            }
        }
        if cap {
            self.embed_new_cell(Orbit::Face, above_caps[0]);
            self.embed_new_cell(Orbit::Face, below_caps[0]);
        }
        (new_lines, below_caps[0])
    }

    /// Give every connected component its own volume line. The first
    /// component found with a line keeps it.
    fn reembed_volumes(&mut self) {
        if !self.is_embedded(Orbit::Volume) {
            return;
        }
        let reps: Vec<Dart> = self.volumes().collect();
        let mut seen = HashSet::new();
        for d in reps {
            let Some(old) = self.embedding(d, Orbit::Volume) else {
                continue;
            };
            if !seen.insert(old) {
                if let Some(line) = self.new_line(Orbit::Volume) {
                    self.container_mut(Orbit::Volume).copy_line(old, line);
                    self.set_orbit_embedding(Orbit::Volume, d, line);
                }
            }
        }
    }

    /**
     * Cut the map with `plane`. Positions of new vertices are interpolated
     * along the cut edges and written to `position`.
     *
     * Every cell that lies above the plane after the cut is marked in
     * `marker`. Degenerate configurations are rejected with
     * [`Error::DegenerateCut`] before the map is modified: a face crossing the
     * plane more than twice, a contour vertex with more than two contour
     * edges, and when splitting, an open contour or a contour touching the
     * boundary.
     */
    pub fn plane_cut<A: Adaptor>(
        &mut self,
        position: &AttributeHandle<A::Vector>,
        plane: &Plane<A::Vector>,
        marker: &mut CellMarker,
        options: &PlaneCutOptions,
    ) -> Result<CutContour, Error> {
        if position.orbit() != Orbit::Vertex {
            return Err(Error::WrongOrbit(position.orbit(), Orbit::Vertex));
        }
        let normal = A::normalized_vec(plane.normal);
        let dist: Vec<A::Scalar> = self
            .column(position)?
            .iter()
            .map(|p| A::dot_product(*p - plane.origin, normal))
            .collect();
        let mut classifier = Classifier {
            sides: dist
                .iter()
                .map(|s| {
                    let s = A::to_f64(*s);
                    if s.abs() <= options.epsilon {
                        Side::On
                    } else if s > 0.0 {
                        Side::Above
                    } else {
                        Side::Below
                    }
                })
                .collect(),
        };
        let plan = self.plan_plane_cut(&classifier, options)?;
        let nsplit = if options.split { plan.contour_edges } else { 0 };
        self.reserve_darts(2 * (plan.straddling.len() + plan.faces.len() + nsplit))?;
        self.reserve_lines(
            Orbit::Vertex,
            plan.straddling.len() + if options.split { plan.contour_vertices } else { 0 },
        )?;
        self.reserve_lines(Orbit::Edge, plan.straddling.len() + plan.faces.len() + nsplit)?;
        self.reserve_lines(Orbit::Face, plan.faces.len() + 2 * nsplit)?;
        self.reserve_lines(Orbit::Volume, nsplit)?;
        // Commit.
        for &d in &plan.straddling {
            let (s0, s1) = (
                dist[self.vertex_line(d)?],
                dist[self.vertex_line(self.phi1(d))?],
            );
            let (p0, p1) = (
                *self.get(position, d)?,
                *self.get(position, self.phi1(d))?,
            );
            let nd = self.cut_edge(d)?;
            let line = self.vertex_line(nd)?;
            classifier.set_on(line);
            *self.value_mut(position, line as u32)? = p0 + (p1 - p0) * (s0 / (s0 - s1));
        }
        for &f in &plan.faces {
            let mut on: Vec<Dart> = Vec::with_capacity(2);
            for d in self.orbit(Orbit::Face, f) {
                if classifier.side(self, d)? == Side::On {
                    on.push(d);
                }
            }
            if let [a, b] = on[..] {
                self.split_face(a, b)?;
            }
        }
        let contour = self.contour_loops(&classifier)?;
        // Caps of the below side only have vertices on the plane.
        let mut below_caps = DartMarker::new(self);
        if options.split {
            for cloop in contour.loops.iter().filter(|l| l.closed) {
                let (lines, hole) = self.split_along_loop(&cloop.darts, options.cap);
                for line in lines {
                    classifier.set_on(line as usize);
                }
                below_caps.mark_orbit(self, Orbit::Face, hole);
            }
            self.reembed_volumes();
        }
        let mut kept: Vec<Dart> = Vec::new();
        for f in self.faces() {
            if !below_caps.is_marked(f) && classifier.face_class(self, f)? == FaceClass::Above {
                kept.extend(self.orbit(Orbit::Face, f));
            }
        }
        for d in kept {
            marker.mark(self, d);
        }
        log::debug!(
            "Plane cut {} edges and split {} faces, contour has {} edges in {} loops",
            plan.straddling.len(),
            plan.faces.len(),
            contour.num_edges(),
            contour.loops.len()
        );
        Ok(contour)
    }
}
