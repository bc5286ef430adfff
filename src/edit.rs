use crate::{dart::Dart, error::Error, map::Map, orbit::Orbit};

impl Map {
    /**
     * Insert a vertex in the middle of the edge of `d`.
     *
     * ```text
     *  before:   u ----d---> v        after:   u --d--> w --nd--> v
     *            u <---e---- v                 u <-ne-- w <--e--- v
     * ```
     *
     * Returns the new dart `nd` that starts at the new vertex and follows `d`
     * in its face. If the vertex or edge orbits are embedded, the new vertex
     * and the new edge `{e, nd}` get fresh lines, with default attribute
     * values.
     */
    pub fn cut_edge(&mut self, d: Dart) -> Result<Dart, Error> {
        self.validate_dart(d)?;
        self.reserve_darts(2)?;
        self.reserve_lines(Orbit::Vertex, 1)?;
        self.reserve_lines(Orbit::Edge, 1)?;
        // Commit.
        let e = self.phi2(d);
        let dn = self.phi1(d);
        let en = self.phi1(e);
        let nd = self.new_dart();
        let ne = self.new_dart();
        self.link(d, nd);
        self.link(nd, dn);
        self.link(e, ne);
        self.link(ne, en);
        self.unsew(d);
        self.sew(d, ne);
        self.sew(e, nd);
        self.set_boundary(nd, self.is_boundary_dart(d));
        self.set_boundary(ne, self.is_boundary_dart(e));
        // Embeddings.
        if let Some(line) = self.new_line(Orbit::Vertex) {
            self.set_dart_embedding(nd, Orbit::Vertex, line);
            self.set_dart_embedding(ne, Orbit::Vertex, line);
        }
        self.copy_dart_embedding(d, ne, Orbit::Edge);
        if let Some(line) = self.new_line(Orbit::Edge) {
            self.set_dart_embedding(e, Orbit::Edge, line);
            self.set_dart_embedding(nd, Orbit::Edge, line);
        }
        self.copy_dart_embedding(d, nd, Orbit::Face);
        self.copy_dart_embedding(e, ne, Orbit::Face);
        self.copy_dart_embedding(d, nd, Orbit::Volume);
        self.copy_dart_embedding(d, ne, Orbit::Volume);
        Ok(nd)
    }

    /**
     * Split the face of `d` and `e` with a new edge between the origins of `d`
     * and `e`. The darts must belong to the same non-boundary face and must
     * not be equal or consecutive.
     *
     * The part of the face containing `d` keeps its line; the part containing
     * `e` gets a new one. Returns the new dart of the part containing `d`,
     * which starts at the origin of `e`.
     */
    pub fn split_face(&mut self, d: Dart, e: Dart) -> Result<Dart, Error> {
        self.validate_dart(d)?;
        self.validate_dart(e)?;
        if self.is_boundary_dart(d) {
            return Err(Error::BoundaryFace(d));
        }
        if d == e
            || self.phi1(d) == e
            || self.phi1(e) == d
            || !self.same_orbit(Orbit::Face, d, e)
        {
            return Err(Error::CannotSplitFace(d, e));
        }
        self.reserve_darts(2)?;
        self.reserve_lines(Orbit::Edge, 1)?;
        self.reserve_lines(Orbit::Face, 1)?;
        // Commit.
        let p = self.phi_1(d);
        let q = self.phi_1(e);
        let x = self.new_dart();
        let y = self.new_dart();
        self.link(q, x);
        self.link(x, d);
        self.link(p, y);
        self.link(y, e);
        self.sew(x, y);
        self.copy_dart_embedding(e, x, Orbit::Vertex);
        self.copy_dart_embedding(d, y, Orbit::Vertex);
        if let Some(line) = self.new_line(Orbit::Edge) {
            self.set_dart_embedding(x, Orbit::Edge, line);
            self.set_dart_embedding(y, Orbit::Edge, line);
        }
        self.copy_dart_embedding(d, x, Orbit::Face);
        self.embed_new_cell(Orbit::Face, y);
        self.copy_dart_embedding(d, x, Orbit::Volume);
        self.copy_dart_embedding(d, y, Orbit::Volume);
        Ok(x)
    }
}
