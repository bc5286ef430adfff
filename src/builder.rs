use crate::{
    Handle,
    adaptor::Adaptor,
    attribute::AttributeHandle,
    dart::Dart,
    error::Error,
    map::{Map, NIL},
    marker::DartMarker,
    orbit::Orbit,
};
use std::collections::HashMap;

/// Name of the vertex attribute holding positions, for maps built from
/// geometry.
pub const POSITION: &str = "position";

impl Map {
    /**
     * Build a map from a polygon soup. `faces` lists the vertex indices of
     * each face, in counter clockwise order. Vertex `i` of the input is
     * embedded on line `i` of the vertex container; input vertices not used by
     * any face are released.
     *
     * Edges used by a single face are closed with boundary faces. Edges used
     * twice in the same direction, and vertices whose faces do not form a
     * single fan, are rejected.
     */
    pub fn from_polygons<F: AsRef<[u32]>>(num_vertices: usize, faces: &[F]) -> Result<Self, Error> {
        let mut total = 0usize;
        for (fi, face) in faces.iter().enumerate() {
            let face = face.as_ref();
            if face.len() < 3 {
                return Err(Error::InvalidFace(fi));
            }
            for (i, &v) in face.iter().enumerate() {
                if v as usize >= num_vertices {
                    return Err(Error::VertexIndexOutOfRange(v));
                }
                if face[(i + 1)..].contains(&v) {
                    return Err(Error::InvalidFace(fi));
                }
            }
            total += face.len();
        }
        let mut map = Map::new();
        map.reserve_darts(total)?;
        let mut origin: Vec<u32> = Vec::new();
        origin.try_reserve(total)?;
        let mut directed: HashMap<(u32, u32), Dart> = HashMap::new();
        directed.try_reserve(total)?;
        for face in faces {
            let face = face.as_ref();
            let first = map.new_dart();
            origin.push(face[0]);
            let mut prev = first;
            for &v in &face[1..] {
                let d = map.new_dart();
                origin.push(v);
                map.link(prev, d);
                prev = d;
            }
            map.link(prev, first);
        }
        // Sew the two darts of every interior edge.
        for d in map.darts.iter().collect::<Vec<_>>() {
            let a = origin[d.index() as usize];
            let b = origin[map.phi1(d).index() as usize];
            if directed.insert((a, b), d).is_some() {
                return Err(Error::ComplexEdge(a, b));
            }
        }
        for (&(a, b), &d) in directed.iter() {
            if let Some(&o) = directed.get(&(b, a)) {
                if map.phi2(d) == d {
                    map.sew(d, o);
                }
            }
        }
        map.close_holes(&mut origin)?;
        map.embed_vertices(num_vertices, &origin)?;
        log::debug!(
            "Built map with {} darts, {} vertices and {} faces",
            map.num_darts(),
            map.num_vertices(),
            map.num_faces()
        );
        Ok(map)
    }

    /// Build a map from positions and faces, and store the positions in the
    /// [`POSITION`] vertex attribute.
    pub fn from_positions<A: Adaptor, F: AsRef<[u32]>>(
        points: &[A::Vector],
        faces: &[F],
    ) -> Result<(Self, AttributeHandle<A::Vector>), Error> {
        let mut map = Self::from_polygons(points.len(), faces)?;
        let position = map.add_attribute::<A::Vector>(Orbit::Vertex, POSITION)?;
        map.column_mut(&position)?.copy_from_slice(points);
        Ok((map, position))
    }

    /// Sew every dart without an opposite to a new boundary dart, and link the
    /// boundary darts into faces.
    fn close_holes(&mut self, origin: &mut Vec<u32>) -> Result<(), Error> {
        let open: Vec<Dart> = self.darts.iter().filter(|d| self.phi2(*d) == *d).collect();
        if open.is_empty() {
            return Ok(());
        }
        self.reserve_darts(open.len())?;
        origin.try_reserve(open.len())?;
        for &d in &open {
            let bd = self.new_dart();
            self.set_boundary(bd, true);
            self.sew(d, bd);
            debug_assert_eq!(bd.index() as usize, origin.len());
            origin.push(origin[self.phi1(d).index() as usize]);
        }
        let limit = self.darts.capacity();
        for &d in &open {
            // Rotate around the origin of `d` to the previous open dart ending
            // at that vertex.
            let mut x = self.phi_1(d);
            let mut steps = 0usize;
            while !self.is_boundary_dart(self.phi2(x)) {
                x = self.phi_1(self.phi2(x));
                steps += 1;
                if steps > limit {
                    return Err(Error::ComplexVertex(origin[d.index() as usize]));
                }
            }
            self.link(self.phi2(d), self.phi2(x));
        }
        Ok(())
    }

    fn embed_vertices(&mut self, num_vertices: usize, origin: &[u32]) -> Result<(), Error> {
        let mut table = Vec::new();
        table.try_reserve(self.phi1.len())?;
        table.resize(self.phi1.len(), NIL);
        {
            let container = self.container_mut(Orbit::Vertex);
            container.reserve(num_vertices)?;
            for _ in 0..num_vertices {
                container.allocate_line();
            }
        }
        let mut seen = vec![false; num_vertices];
        let mut marker = DartMarker::new(self);
        for d in self.darts.iter() {
            if marker.is_marked(d) {
                continue;
            }
            let v = origin[d.index() as usize];
            if std::mem::replace(&mut seen[v as usize], true) {
                return Err(Error::ComplexVertex(v));
            }
            for vd in self.orbit(Orbit::Vertex, d) {
                marker.mark(vd);
                table[vd.index() as usize] = v;
            }
        }
        drop(marker);
        let unused: Vec<u32> = (0..num_vertices as u32)
            .filter(|v| !seen[*v as usize])
            .collect();
        if !unused.is_empty() {
            log::warn!("{} input vertices are not used by any face", unused.len());
        }
        for v in unused {
            self.container_mut(Orbit::Vertex).release_line(v);
        }
        self.embeddings[Orbit::Vertex.index()] = Some(table);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::{Error, Map, Orbit, use_glam::BuiltInAdaptorF32};
    use arrayvec::ArrayVec;

    #[test]
    fn t_single_triangle() {
        let map = Map::from_polygons(3, &[[0u32, 1, 2]]).expect("Cannot build map");
        // Three interior darts and three boundary darts.
        assert_eq!(map.num_darts(), 6);
        assert_eq!(map.num_faces(), 1);
        assert_eq!(map.num_vertices(), 3);
        assert_eq!(map.num_edges(), 3);
        let bd = map
            .darts()
            .find(|d| map.is_boundary_dart(*d))
            .expect("Cannot find boundary dart");
        assert_eq!(map.face_degree(bd), 3);
        assert!(map.orbit(Orbit::Face, bd).all(|d| map.is_boundary_dart(d)));
        map.check().expect("Map is inconsistent");
    }

    #[test]
    fn t_two_triangles_share_edge() {
        //  3-----2
        //  |   / |
        //  |  /  |
        //  | /   |
        //  0-----1
        let map = Map::from_polygons(4, &[[0u32, 1, 2], [0, 2, 3]]).expect("Cannot build map");
        assert_eq!(map.num_darts(), 10);
        assert_eq!(map.num_edges(), 5);
        let boundary: Vec<_> = map.darts().filter(|d| map.is_boundary_dart(*d)).collect();
        assert_eq!(boundary.len(), 4);
        assert_eq!(map.face_degree(boundary[0]), 4);
        map.check().expect("Map is inconsistent");
    }

    #[test]
    fn t_reject_bad_input() {
        assert!(matches!(
            Map::from_polygons(3, &[vec![0u32, 1]]),
            Err(Error::InvalidFace(0))
        ));
        assert!(matches!(
            Map::from_polygons(3, &[vec![0u32, 1, 5]]),
            Err(Error::VertexIndexOutOfRange(5))
        ));
        assert!(matches!(
            Map::from_polygons(4, &[vec![0u32, 1, 2], vec![0, 1, 3]]),
            Err(Error::ComplexEdge(0, 1))
        ));
        // Two triangles touching at a single vertex.
        assert!(matches!(
            Map::from_polygons(5, &[vec![0u32, 1, 2], vec![0, 3, 4]]),
            Err(Error::ComplexVertex(0))
        ));
    }

    #[test]
    fn t_unused_vertices_are_released() {
        let faces: ArrayVec<[u32; 3], 1> = [[0u32, 2, 3]].into_iter().collect();
        let map = Map::from_polygons(5, &faces[..]).expect("Cannot build map");
        assert_eq!(map.num_vertices(), 3);
        assert!(!map.container(Orbit::Vertex).is_line_used(1));
        assert!(!map.container(Orbit::Vertex).is_line_used(4));
        map.check().expect("Map is inconsistent");
    }

    #[test]
    fn t_from_positions() {
        let points = [
            glam::vec3(0.0, 0.0, 0.0),
            glam::vec3(1.0, 0.0, 0.0),
            glam::vec3(0.0, 1.0, 0.0),
        ];
        let (map, position) = Map::from_positions::<BuiltInAdaptorF32, _>(&points, &[[0u32, 1, 2]])
            .expect("Cannot build map");
        for d in map.faces() {
            for fd in map.orbit(Orbit::Face, d) {
                let line = map
                    .cell_index(fd, Orbit::Vertex)
                    .expect("Cannot read embedding");
                assert_eq!(
                    *map.get(&position, fd).expect("Cannot read position"),
                    points[line as usize]
                );
            }
        }
    }
}
