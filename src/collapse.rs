use crate::{
    dart::Dart,
    error::Error,
    map::Map,
    marker::DartMarker,
    orbit::Orbit,
};

impl Map {
    /// Whether the third vertex of the triangle of `d` exists, i.e. the face
    /// of `d` is a non-boundary triangle.
    pub(crate) fn is_interior_triangle(&self, d: Dart) -> bool {
        !self.is_boundary_dart(d) && self.phi1(self.phi1(self.phi1(d))) == d
    }

    /// A triangle with two boundary edges other than the edge of `d` would
    /// become a dangling face.
    fn is_ear(&self, d: Dart) -> bool {
        let d1 = self.phi1(d);
        let d2 = self.phi1(d1);
        self.is_boundary_dart(self.phi2(d1)) && self.is_boundary_dart(self.phi2(d2))
    }

    /// Collapsing the edge of the triangle `d` merges the two other edges of
    /// that triangle. If they border the same face, that face must itself be
    /// a triangle.
    fn folds_over(&self, d: Dart) -> bool {
        let h1 = self.phi2(self.phi1(d));
        let h2 = self.phi2(self.phi_1(d));
        match (self.is_boundary_dart(h1), self.is_boundary_dart(h2)) {
            (true, true) => true,
            (false, false) => {
                self.same_orbit(Orbit::Face, h1, h2) && self.face_degree(h1) != 3
            }
            _ => false,
        }
    }

    /**
     * Check whether collapsing the edge of `d` keeps the map a manifold.
     *
     * Rejects ears, edges whose two adjacent triangles share their third
     * vertex, interior edges joining two boundary vertices, and edges whose
     * endpoints share neighbors other than the opposite vertices of the
     * adjacent triangles (the link condition).
     */
    pub fn can_collapse_edge(&self, d: Dart) -> bool {
        if !self.is_valid(d) {
            return false;
        }
        let e = self.phi2(d);
        let dtri = self.is_interior_triangle(d);
        let etri = self.is_interior_triangle(e);
        if (dtri && self.is_ear(d)) || (etri && self.is_ear(e)) {
            return false;
        }
        // Third vertices of the adjacent triangles.
        let vl = self.phi_1(d);
        let vr = self.phi_1(e);
        if dtri && etri && self.same_orbit(Orbit::Vertex, vl, vr) {
            return false;
        }
        // Collapsing across two different boundaries.
        if !self.is_boundary_edge(d) && self.is_boundary_vertex(d) && self.is_boundary_vertex(e) {
            return false;
        }
        // Link condition: the one rings of the two endpoints may only share
        // the third vertices of the adjacent triangles.
        let mut ring = DartMarker::new(self);
        for vd in self.orbit(Orbit::Vertex, e) {
            ring.mark_orbit(self, Orbit::Vertex, self.phi1(vd));
        }
        let mut allowed = DartMarker::new(self);
        if dtri {
            allowed.mark_orbit(self, Orbit::Vertex, vl);
        }
        if etri {
            allowed.mark_orbit(self, Orbit::Vertex, vr);
        }
        for vd in self.orbit(Orbit::Vertex, d) {
            let n = self.phi1(vd);
            if ring.is_marked(n) && !allowed.is_marked(n) {
                return false;
            }
        }
        // Check for folded faces that might degenerate.
        !((dtri && self.folds_over(d)) || (etri && self.folds_over(e)))
    }

    /// Remove the 2-gon of `x`, sewing together the two faces on either side.
    fn collapse_digon(&mut self, x: Dart) {
        let y = self.phi1(x);
        debug_assert_eq!(self.phi1(y), x, "{x} is not part of a 2-gon");
        let ox = self.phi2(x);
        let oy = self.phi2(y);
        if let Some(line) = self.embedding(x, Orbit::Face) {
            self.release_line(Orbit::Face, line);
        }
        if let Some(line) = self.embedding(y, Orbit::Edge) {
            self.release_line(Orbit::Edge, line);
        }
        self.unsew(x);
        self.unsew(y);
        self.link(x, x);
        self.link(y, y);
        self.sew(ox, oy);
        self.copy_dart_embedding(ox, oy, Orbit::Edge);
        self.release_dart(x);
        self.release_dart(y);
    }

    /**
     * Collapse the edge of `d`, merging the origin of `d` into the origin of
     * `phi2(d)`. Faces that degenerate into 2-gons are removed.
     *
     * The merged vertex keeps the line of the head of `d`; the lines of the
     * removed vertex, edges and faces are released. Returns a dart that
     * starts at the merged vertex.
     */
    pub fn collapse_edge(&mut self, d: Dart) -> Result<Dart, Error> {
        self.validate_dart(d)?;
        if !self.can_collapse_edge(d) {
            return Err(Error::NonCollapsibleEdge(d));
        }
        let e = self.phi2(d);
        let dp = self.phi_1(d);
        let dn = self.phi1(d);
        let ep = self.phi_1(e);
        let en = self.phi1(e);
        // All of these start at the merged vertex once the edge is gone.
        let candidates = [dn, en, self.phi2(dp), self.phi2(ep)];
        let tail: Vec<Dart> = self.orbit(Orbit::Vertex, d).skip(1).collect();
        let head_line = self.embedding(e, Orbit::Vertex);
        let tail_line = self.embedding(d, Orbit::Vertex);
        let edge_line = self.embedding(d, Orbit::Edge);
        // Rewire.
        self.link(dp, dn);
        self.link(ep, en);
        if let Some(line) = head_line {
            for vd in tail {
                self.set_dart_embedding(vd, Orbit::Vertex, line);
            }
        }
        self.unsew(d);
        self.link(d, d);
        self.link(e, e);
        if let Some(line) = tail_line {
            self.release_line(Orbit::Vertex, line);
        }
        if let Some(line) = edge_line {
            self.release_line(Orbit::Edge, line);
        }
        self.release_dart(d);
        self.release_dart(e);
        // Faces that were triangles are now 2-gons.
        if self.phi1(self.phi1(dn)) == dn {
            self.collapse_digon(dn);
        }
        if self.phi1(self.phi1(en)) == en {
            self.collapse_digon(en);
        }
        candidates
            .into_iter()
            .find(|c| self.is_valid(*c))
            .ok_or(Error::NonCollapsibleEdge(d))
    }
}
