use crate::{
    Handle,
    attribute::AttributeContainer,
    dart::{Dart, DartStore},
    error::Error,
    marker::{DartMarker, MarkerPool},
    orbit::{Orbit, OrbitIter},
};
use std::sync::Arc;

/// Embedding value of darts that do not belong to an embedded cell. Only
/// boundary darts carry this, in the face embedding.
pub(crate) const NIL: u32 = u32::MAX;

/**
 * A closed, oriented combinatorial 2-map.
 *
 * Topology is stored as three permutations over the darts: `phi1` links each
 * dart to the next dart of its face, `phi_1` is its inverse, and `phi2` is a
 * fixed point free involution that pairs the two darts of an edge. Holes of
 * open surfaces are closed by boundary faces whose darts carry a boundary
 * mark. Boundary faces are not visited by face traversals and never carry a
 * face embedding.
 *
 * The vertex of a dart is its origin. Each orbit kind can be embedded, i.e.
 * every cell of that kind is associated with a line of the attribute
 * container of that orbit. Embeddings are created lazily, when the first
 * attribute is added on an orbit.
 */
pub struct Map {
    pub(crate) darts: DartStore,
    pub(crate) phi1: Vec<Dart>,
    pub(crate) phi_1: Vec<Dart>,
    pub(crate) phi2: Vec<Dart>,
    pub(crate) boundary: Vec<bool>,
    pub(crate) embeddings: [Option<Vec<u32>>; 4],
    pub(crate) containers: [AttributeContainer; 4],
    markers: Arc<MarkerPool>,
}

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Map {
    /// The clone gets its own marker pool.
    fn clone(&self) -> Self {
        Map {
            darts: self.darts.clone(),
            phi1: self.phi1.clone(),
            phi_1: self.phi_1.clone(),
            phi2: self.phi2.clone(),
            boundary: self.boundary.clone(),
            embeddings: self.embeddings.clone(),
            containers: self.containers.clone(),
            markers: Arc::new(MarkerPool::default()),
        }
    }
}

impl Map {
    pub fn new() -> Self {
        Map {
            darts: DartStore::default(),
            phi1: Vec::new(),
            phi_1: Vec::new(),
            phi2: Vec::new(),
            boundary: Vec::new(),
            embeddings: [None, None, None, None],
            containers: Default::default(),
            markers: Arc::new(MarkerPool::default()),
        }
    }

    pub(crate) fn marker_pool(&self) -> Arc<MarkerPool> {
        Arc::clone(&self.markers)
    }

    /// Number of live darts.
    pub fn num_darts(&self) -> usize {
        self.darts.len()
    }

    /// Number of dart slots, live or free. Dart indices are below this.
    pub fn dart_capacity(&self) -> usize {
        self.darts.capacity()
    }

    /// All live darts in storage order, boundary darts included.
    pub fn darts(&self) -> impl Iterator<Item = Dart> + use<'_> {
        self.darts.iter()
    }

    pub fn is_valid(&self, d: Dart) -> bool {
        self.darts.is_live(d)
    }

    pub fn validate_dart(&self, d: Dart) -> Result<(), Error> {
        if self.is_valid(d) {
            Ok(())
        } else {
            Err(Error::InvalidDart(d))
        }
    }

    pub fn phi1(&self, d: Dart) -> Dart {
        debug_assert!(self.is_valid(d), "{d} is not a live dart");
        self.phi1[d.index() as usize]
    }

    pub fn phi_1(&self, d: Dart) -> Dart {
        debug_assert!(self.is_valid(d), "{d} is not a live dart");
        self.phi_1[d.index() as usize]
    }

    pub fn phi2(&self, d: Dart) -> Dart {
        debug_assert!(self.is_valid(d), "{d} is not a live dart");
        self.phi2[d.index() as usize]
    }

    /// Next dart around the origin vertex of `d`.
    pub fn alpha1(&self, d: Dart) -> Dart {
        self.phi2(self.phi_1(d))
    }

    /// Previous dart around the origin vertex of `d`. Inverse of `alpha1`.
    pub fn alpha_1(&self, d: Dart) -> Dart {
        self.phi1(self.phi2(d))
    }

    pub fn is_boundary_dart(&self, d: Dart) -> bool {
        self.boundary[d.index() as usize]
    }

    /// Whether either side of the edge of `d` is a boundary face.
    pub fn is_boundary_edge(&self, d: Dart) -> bool {
        self.is_boundary_dart(d) || self.is_boundary_dart(self.phi2(d))
    }

    /// Whether the vertex of `d` touches a boundary face.
    pub fn is_boundary_vertex(&self, d: Dart) -> bool {
        self.orbit(Orbit::Vertex, d).any(|v| self.is_boundary_dart(v))
    }

    /// Number of darts, i.e. of edges, of the face of `d`.
    pub fn face_degree(&self, d: Dart) -> usize {
        self.orbit(Orbit::Face, d).count()
    }

    /// Number of darts leaving the vertex of `d`, boundary darts included.
    pub fn vertex_degree(&self, d: Dart) -> usize {
        self.orbit(Orbit::Vertex, d).count()
    }

    /// Lazily walk the darts of the `orbit` containing `d`, starting at `d`.
    pub fn orbit(&self, orbit: Orbit, d: Dart) -> OrbitIter<'_> {
        OrbitIter::new(self, orbit, d)
    }

    pub fn orbit_size(&self, orbit: Orbit, d: Dart) -> usize {
        self.orbit(orbit, d).count()
    }

    pub fn same_orbit(&self, orbit: Orbit, a: Dart, b: Dart) -> bool {
        self.orbit(orbit, a).any(|d| d == b)
    }

    pub fn is_embedded(&self, orbit: Orbit) -> bool {
        self.embeddings[orbit.index()].is_some()
    }

    /// Line of the cell of `d`, if `orbit` is embedded. Boundary darts have no
    /// face line.
    pub fn embedding(&self, d: Dart, orbit: Orbit) -> Option<u32> {
        match &self.embeddings[orbit.index()] {
            Some(table) => match table[d.index() as usize] {
                NIL => None,
                line => Some(line),
            },
            None => None,
        }
    }

    /// Like `embedding`, but reports why there is no line.
    pub fn cell_index(&self, d: Dart, orbit: Orbit) -> Result<u32, Error> {
        self.validate_dart(d)?;
        let table = self.embeddings[orbit.index()]
            .as_ref()
            .ok_or(Error::NotEmbedded(orbit))?;
        match table[d.index() as usize] {
            NIL => Err(Error::BoundaryFace(d)),
            line => Ok(line),
        }
    }

    /// The raw dart to line table of an embedded orbit.
    pub(crate) fn embedding_table(&self, orbit: Orbit) -> Result<&[u32], Error> {
        self.embeddings[orbit.index()]
            .as_deref()
            .ok_or(Error::NotEmbedded(orbit))
    }

    pub fn container(&self, orbit: Orbit) -> &AttributeContainer {
        &self.containers[orbit.index()]
    }

    pub(crate) fn container_mut(&mut self, orbit: Orbit) -> &mut AttributeContainer {
        &mut self.containers[orbit.index()]
    }

    /// Number of cells of the given kind. Boundary faces are not counted.
    pub fn num_cells(&self, orbit: Orbit) -> usize {
        if self.is_embedded(orbit) {
            self.container(orbit).num_used()
        } else {
            self.cells(orbit).count()
        }
    }

    pub fn num_vertices(&self) -> usize {
        self.num_cells(Orbit::Vertex)
    }

    pub fn num_edges(&self) -> usize {
        self.num_cells(Orbit::Edge)
    }

    pub fn num_faces(&self) -> usize {
        self.num_cells(Orbit::Face)
    }

    /// Whether `d` belongs to a cell of `orbit` that can carry an embedding.
    pub(crate) fn is_embeddable(&self, d: Dart, orbit: Orbit) -> bool {
        orbit != Orbit::Face || !self.is_boundary_dart(d)
    }

    /*
     * Crate private mutators. Edit operations validate and reserve first, and
     * then use these to commit.
     */

    /// Make sure `n` new darts can be created without growing any buffer.
    pub(crate) fn reserve_darts(&mut self, n: usize) -> Result<(), Error> {
        self.darts.reserve(n)?;
        self.phi1.try_reserve(n)?;
        self.phi_1.try_reserve(n)?;
        self.phi2.try_reserve(n)?;
        self.boundary.try_reserve(n)?;
        for table in self.embeddings.iter_mut().flatten() {
            table.try_reserve(n)?;
        }
        Ok(())
    }

    /// Create a dart linked to itself by every relation, with no embedding.
    pub(crate) fn new_dart(&mut self) -> Dart {
        let d = self.darts.allocate();
        let i = d.index() as usize;
        if i == self.phi1.len() {
            self.phi1.push(d);
            self.phi_1.push(d);
            self.phi2.push(d);
            self.boundary.push(false);
            for table in self.embeddings.iter_mut().flatten() {
                table.push(NIL);
            }
        } else {
            self.phi1[i] = d;
            self.phi_1[i] = d;
            self.phi2[i] = d;
            self.boundary[i] = false;
            for table in self.embeddings.iter_mut().flatten() {
                table[i] = NIL;
            }
        }
        d
    }

    /// Release a dart that has been unlinked from every other dart.
    pub(crate) fn release_dart(&mut self, d: Dart) {
        // The relations are permutations, so a dart that points at itself
        // through all of them is not referenced by any other dart.
        debug_assert!(
            self.phi1(d) == d && self.phi_1(d) == d && self.phi2(d) == d,
            "Releasing {d} while it is still linked"
        );
        let i = d.index() as usize;
        for table in self.embeddings.iter_mut().flatten() {
            table[i] = NIL;
        }
        self.boundary[i] = false;
        self.darts.release(d);
    }

    /// Make `b` the dart following `a` in its face.
    pub(crate) fn link(&mut self, a: Dart, b: Dart) {
        self.phi1[a.index() as usize] = b;
        self.phi_1[b.index() as usize] = a;
    }

    pub(crate) fn sew(&mut self, a: Dart, b: Dart) {
        self.phi2[a.index() as usize] = b;
        self.phi2[b.index() as usize] = a;
    }

    pub(crate) fn unsew(&mut self, a: Dart) {
        let b = self.phi2(a);
        self.phi2[a.index() as usize] = a;
        self.phi2[b.index() as usize] = b;
    }

    pub(crate) fn set_boundary(&mut self, d: Dart, flag: bool) {
        self.boundary[d.index() as usize] = flag;
    }

    pub(crate) fn set_dart_embedding(&mut self, d: Dart, orbit: Orbit, line: u32) {
        if let Some(table) = &mut self.embeddings[orbit.index()] {
            table[d.index() as usize] = line;
        }
    }

    /// Give `to` the same `orbit` line as `from`.
    pub(crate) fn copy_dart_embedding(&mut self, from: Dart, to: Dart, orbit: Orbit) {
        if let Some(table) = &mut self.embeddings[orbit.index()] {
            table[to.index() as usize] = table[from.index() as usize];
        }
    }

    /// Assign `line` to every dart of the `orbit` of `d`.
    pub(crate) fn set_orbit_embedding(&mut self, orbit: Orbit, d: Dart, line: u32) {
        if !self.is_embedded(orbit) {
            return;
        }
        let darts: Vec<Dart> = self.orbit(orbit, d).collect();
        for od in darts {
            if self.is_embeddable(od, orbit) {
                self.set_dart_embedding(od, orbit, line);
            }
        }
    }

    /// Reserve `n` new lines in the container of `orbit`, if it is embedded.
    pub(crate) fn reserve_lines(&mut self, orbit: Orbit, n: usize) -> Result<(), Error> {
        if self.is_embedded(orbit) {
            self.container_mut(orbit).reserve(n)?;
        }
        Ok(())
    }

    /// Allocate a new line if `orbit` is embedded.
    pub(crate) fn new_line(&mut self, orbit: Orbit) -> Option<u32> {
        if self.is_embedded(orbit) {
            Some(self.container_mut(orbit).allocate_line())
        } else {
            None
        }
    }

    pub(crate) fn release_line(&mut self, orbit: Orbit, line: u32) {
        if self.is_embedded(orbit) {
            self.container_mut(orbit).release_line(line);
        }
    }

    /// Give the cell of `d` a fresh line. Previous line is left untouched.
    pub(crate) fn embed_new_cell(&mut self, orbit: Orbit, d: Dart) {
        if let Some(line) = self.new_line(orbit) {
            self.set_orbit_embedding(orbit, d, line);
        }
    }

    /// Create the embedding of `orbit`, with one new line per cell.
    pub(crate) fn embed_orbit(&mut self, orbit: Orbit) -> Result<(), Error> {
        if self.is_embedded(orbit) {
            return Ok(());
        }
        let mut table = Vec::new();
        table.try_reserve(self.phi1.len())?;
        table.resize(self.phi1.len(), NIL);
        let ncells = self.cells(orbit).count();
        self.containers[orbit.index()].reserve(ncells)?;
        let mut marker = DartMarker::new(self);
        for d in self.darts.iter() {
            if marker.is_marked(d) || !self.is_embeddable(d, orbit) {
                continue;
            }
            let line = self.containers[orbit.index()].allocate_line();
            for od in self.orbit(orbit, d) {
                marker.mark(od);
                if self.is_embeddable(od, orbit) {
                    table[od.index() as usize] = line;
                }
            }
        }
        drop(marker);
        self.embeddings[orbit.index()] = Some(table);
        log::debug!("Embedded {ncells} {orbit} cells");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{Error, Map, Orbit};

    #[test]
    fn t_phi_relations_on_tetrahedron() {
        let map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        assert_eq!(map.num_darts(), 12);
        for d in map.darts() {
            assert_eq!(map.phi2(map.phi2(d)), d);
            assert_ne!(map.phi2(d), d);
            assert_eq!(map.phi_1(map.phi1(d)), d);
            assert_eq!(map.alpha_1(map.alpha1(d)), d);
            assert!(!map.is_boundary_edge(d));
            assert_eq!(map.face_degree(d), 3);
            assert_eq!(map.vertex_degree(d), 3);
        }
    }

    #[test]
    fn t_lazy_embedding() {
        let mut map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        let d = map.darts().next().expect("Cannot find a dart");
        assert!(!map.is_embedded(Orbit::Edge));
        assert!(matches!(
            map.cell_index(d, Orbit::Edge),
            Err(Error::NotEmbedded(Orbit::Edge))
        ));
        assert_eq!(map.num_cells(Orbit::Edge), 6);
        map.add_attribute::<u8>(Orbit::Edge, "flag")
            .expect("Cannot add attribute");
        assert!(map.is_embedded(Orbit::Edge));
        assert_eq!(map.num_cells(Orbit::Edge), 6);
        assert_eq!(
            map.cell_index(d, Orbit::Edge).expect("Cannot read embedding"),
            map.cell_index(map.phi2(d), Orbit::Edge)
                .expect("Cannot read embedding")
        );
        map.check().expect("Map is inconsistent");
    }

    #[test]
    fn t_boundary_faces_have_no_face_line() {
        let mut map = Map::grid_topology(2, 2).expect("Cannot create grid");
        map.add_attribute::<f32>(Orbit::Face, "area")
            .expect("Cannot add attribute");
        assert_eq!(map.num_faces(), 4);
        let bd = map
            .darts()
            .find(|d| map.is_boundary_dart(*d))
            .expect("Cannot find a boundary dart");
        assert_eq!(map.embedding(bd, Orbit::Face), None);
        assert!(matches!(
            map.cell_index(bd, Orbit::Face),
            Err(Error::BoundaryFace(_))
        ));
        assert!(map.is_boundary_vertex(bd));
        assert!(map.embedding(bd, Orbit::Vertex).is_some());
        map.check().expect("Map is inconsistent");
    }

    #[test]
    fn t_invalid_dart() {
        let map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        assert!(matches!(
            map.validate_dart(500.into()),
            Err(Error::InvalidDart(_))
        ));
    }

    #[test]
    fn t_clone_has_separate_markers() {
        let map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        let copy = map.clone();
        assert_eq!(copy.num_darts(), map.num_darts());
        assert!(!std::sync::Arc::ptr_eq(&map.marker_pool(), &copy.marker_pool()));
        copy.check().expect("Map is inconsistent");
    }
}
