use crate::{
    Handle,
    dart::Dart,
    error::Error,
    map::{Map, NIL},
    marker::DartMarker,
    orbit::Orbit,
};

fn check_relations(map: &Map) -> Result<(), Error> {
    let capacity = map.dart_capacity();
    if map.phi1.len() != capacity
        || map.phi_1.len() != capacity
        || map.phi2.len() != capacity
        || map.boundary.len() != capacity
    {
        return Err(Error::MismatchedArrayLengths(map.phi1.len(), capacity));
    }
    for d in map.darts() {
        let next = map.phi1[d.index() as usize];
        let prev = map.phi_1[d.index() as usize];
        if !map.is_valid(next) || !map.is_valid(prev) || map.phi_1(next) != d || map.phi1(prev) != d
        {
            return Err(Error::BrokenPhi1(d));
        }
        let opp = map.phi2[d.index() as usize];
        if opp == d || !map.is_valid(opp) || map.phi2(opp) != d {
            return Err(Error::BrokenPhi2(d));
        }
    }
    Ok(())
}

fn check_boundary(map: &Map) -> Result<(), Error> {
    for d in map.darts() {
        let b = map.is_boundary_dart(d);
        // A face is either entirely boundary or not at all, and boundary faces
        // are never adjacent to each other.
        if map.is_boundary_dart(map.phi1(d)) != b || (b && map.is_boundary_dart(map.phi2(d))) {
            return Err(Error::InconsistentBoundary(d));
        }
    }
    Ok(())
}

fn check_embedding(map: &Map, orbit: Orbit, table: &[u32]) -> Result<(), Error> {
    if table.len() != map.dart_capacity() {
        return Err(Error::MismatchedArrayLengths(table.len(), map.dart_capacity()));
    }
    let container = map.container(orbit);
    let mut claimed = vec![false; container.num_lines()];
    let mut marker = DartMarker::new(map);
    let mut ncells = 0usize;
    for d in map.darts() {
        if marker.is_marked(d) {
            continue;
        }
        let line = table[d.index() as usize];
        if !map.is_embeddable(d, orbit) {
            if line != NIL {
                return Err(Error::InconsistentEmbedding(orbit, d));
            }
            continue;
        }
        if !container.is_line_used(line) {
            return Err(Error::InconsistentEmbedding(orbit, d));
        }
        if std::mem::replace(&mut claimed[line as usize], true) {
            return Err(Error::SharedEmbedding(orbit, line));
        }
        ncells += 1;
        let darts: Vec<Dart> = map.orbit(orbit, d).collect();
        for od in darts {
            marker.mark(od);
            let expected = if map.is_embeddable(od, orbit) { line } else { NIL };
            if table[od.index() as usize] != expected {
                return Err(Error::InconsistentEmbedding(orbit, od));
            }
        }
    }
    if container.num_used() != ncells {
        return Err(Error::LeakedLines(orbit, container.num_used() - ncells));
    }
    Ok(())
}

impl Map {
    /**
     * Check the topology and the embeddings for consistency.
     *
     * `phi1` must be a permutation with `phi_1` its inverse, `phi2` a fixed
     * point free involution, boundary marks must cover whole faces, and every
     * embedded cell must own exactly one used line. Released dart slots must
     * match the free list.
     */
    pub fn check(&self) -> Result<(), Error> {
        self.darts.check_free_list()?;
        check_relations(self)?;
        check_boundary(self)?;
        for orbit in Orbit::ALL {
            if let Some(table) = &self.embeddings[orbit.index()] {
                check_embedding(self, orbit, table)?;
            }
        }
        Ok(())
    }
}
