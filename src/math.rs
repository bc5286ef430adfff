use crate::{
    Handle,
    adaptor::Adaptor,
    attribute::AttributeHandle,
    dart::Dart,
    error::Error,
    map::Map,
    orbit::Orbit,
};
use num_traits::Float;

/// Name of the vertex attribute written by [`Map::update_vertex_normals`].
pub const NORMAL: &str = "normal";

impl Map {
    /// Vertex line of the origin of `d`, used to index position columns.
    pub(crate) fn vertex_line(&self, d: Dart) -> Result<usize, Error> {
        self.embedding_table(Orbit::Vertex)?
            .get(d.index() as usize)
            .map(|&line| line as usize)
            .ok_or(Error::InvalidDart(d))
    }

    /// Position of the origin of `d`. Fails if the vertex orbit is not
    /// embedded or `points` is shorter than the vertex container.
    pub fn calc_point<A: Adaptor>(&self, d: Dart, points: &[A::Vector]) -> Result<A::Vector, Error> {
        let line = self.vertex_line(d)?;
        points
            .get(line)
            .copied()
            .ok_or(Error::OutOfBoundsAccess(line as u32))
    }

    /// Compute the face normal using Newell's method. The `points` must
    /// represent the positions of the vertices.
    pub fn calc_face_normal<A: Adaptor>(
        &self,
        f: Dart,
        points: &[A::Vector],
    ) -> Result<A::Vector, Error> {
        Ok(A::normalized_vec(self.newell_vector::<A>(f, points)?))
    }

    /// Unnormalized Newell vector. Its length is twice the area of a planar
    /// face.
    fn newell_vector<A: Adaptor>(&self, f: Dart, points: &[A::Vector]) -> Result<A::Vector, Error> {
        let zero = A::scalarf64(0.0);
        let (mut nverts, mut x, mut y, mut z) = (0usize, zero, zero, zero);
        for d in self.orbit(Orbit::Face, f) {
            let pc = self.calc_point::<A>(d, points)?;
            let pn = self.calc_point::<A>(self.phi1(d), points)?;
            let (a, b) = (pc - pn, pc + pn);
            nverts += 1;
            x += A::vector_coord(&a, 1) * A::vector_coord(&b, 2);
            y += A::vector_coord(&a, 2) * A::vector_coord(&b, 0);
            z += A::vector_coord(&a, 0) * A::vector_coord(&b, 1);
        }
        if nverts < 3 {
            // Guard against degenerate cases.
            return Ok(A::zero_vector());
        }
        Ok(A::vector([x, y, z]))
    }

    /// Similar to `calc_face_normal`, except this function looks up the
    /// position column first.
    pub fn try_calc_face_normal<A: Adaptor>(
        &self,
        f: Dart,
        position: &AttributeHandle<A::Vector>,
    ) -> Result<A::Vector, Error> {
        self.validate_dart(f)?;
        self.calc_face_normal::<A>(f, self.column(position)?)
    }

    pub fn calc_face_centroid<A: Adaptor>(
        &self,
        f: Dart,
        points: &[A::Vector],
    ) -> Result<A::Vector, Error> {
        let mut total = A::zero_vector();
        let mut count = 0usize;
        for d in self.orbit(Orbit::Face, f) {
            total = total + self.calc_point::<A>(d, points)?;
            count += 1;
        }
        Ok(total / A::scalarf64(count as f64))
    }

    pub fn try_calc_face_centroid<A: Adaptor>(
        &self,
        f: Dart,
        position: &AttributeHandle<A::Vector>,
    ) -> Result<A::Vector, Error> {
        self.validate_dart(f)?;
        self.calc_face_centroid::<A>(f, self.column(position)?)
    }

    /// Vector from the origin of `d` to its head.
    pub fn calc_edge_vector<A: Adaptor>(
        &self,
        d: Dart,
        points: &[A::Vector],
    ) -> Result<A::Vector, Error> {
        Ok(self.calc_point::<A>(self.phi1(d), points)? - self.calc_point::<A>(d, points)?)
    }

    pub fn calc_edge_length_sqr<A: Adaptor>(
        &self,
        d: Dart,
        points: &[A::Vector],
    ) -> Result<A::Scalar, Error> {
        let v = self.calc_edge_vector::<A>(d, points)?;
        Ok(A::dot_product(v, v))
    }

    pub fn calc_edge_length<A: Adaptor>(
        &self,
        d: Dart,
        points: &[A::Vector],
    ) -> Result<A::Scalar, Error> {
        Ok(A::vector_length(self.calc_edge_vector::<A>(d, points)?))
    }

    /// Compute the normal of a sector, using the given `points` as the
    /// positions of vertices.
    ///
    /// A sector is the triangular region defined by the dart and the previous
    /// dart of its face. The length of the normal is twice the area of the
    /// sector.
    pub fn calc_sector_normal<A: Adaptor>(
        &self,
        d: Dart,
        points: &[A::Vector],
    ) -> Result<A::Vector, Error> {
        Ok(A::cross_product(
            self.calc_edge_vector::<A>(self.phi_1(d), points)?,
            self.calc_edge_vector::<A>(d, points)?,
        ))
    }

    pub fn calc_sector_area<A: Adaptor>(
        &self,
        d: Dart,
        points: &[A::Vector],
    ) -> Result<A::Scalar, Error> {
        Ok(A::vector_length(self.calc_sector_normal::<A>(d, points)?) * A::scalarf64(0.5))
    }

    /// Angle at the origin of `d`, between `d` and the previous edge of its
    /// face.
    pub fn calc_sector_angle<A: Adaptor>(
        &self,
        d: Dart,
        points: &[A::Vector],
    ) -> Result<A::Scalar, Error> {
        let n0 = self.calc_edge_vector::<A>(d, points)?;
        let n1 = -self.calc_edge_vector::<A>(self.phi_1(d), points)?;
        Ok(A::vector_angle(n0, n1))
    }

    /// Compute the area of a face. For non-planar faces the area is
    /// approximated by a fan of triangles.
    pub fn calc_face_area<A: Adaptor>(
        &self,
        f: Dart,
        points: &[A::Vector],
    ) -> Result<A::Scalar, Error> {
        let p0 = self.calc_point::<A>(f, points)?;
        let mut total = A::scalarf64(0.0);
        let mut d = self.phi1(f);
        while self.phi1(d) != f {
            let p1 = self.calc_point::<A>(d, points)?;
            let p2 = self.calc_point::<A>(self.phi1(d), points)?;
            total += A::vector_length(A::cross_product(p1 - p0, p2 - p0)) * A::scalarf64(0.5);
            d = self.phi1(d);
        }
        Ok(total)
    }

    /// Total area of all faces.
    pub fn calc_area<A: Adaptor>(&self, points: &[A::Vector]) -> Result<A::Scalar, Error> {
        let mut total = A::scalarf64(0.0);
        for f in self.faces() {
            total += self.calc_face_area::<A>(f, points)?;
        }
        Ok(total)
    }

    pub fn try_calc_area<A: Adaptor>(
        &self,
        position: &AttributeHandle<A::Vector>,
    ) -> Result<A::Scalar, Error> {
        self.calc_area::<A>(self.column(position)?)
    }

    /// Enclosed volume. Zero if the map has boundaries.
    pub fn calc_volume<A: Adaptor>(&self, points: &[A::Vector]) -> Result<A::Scalar, Error> {
        let mut total = A::scalarf64(0.0);
        if self.darts().any(|d| self.is_boundary_dart(d)) {
            return Ok(total);
        }
        for f in self.faces() {
            let p0 = self.calc_point::<A>(f, points)?;
            let mut d = self.phi1(f);
            while self.phi1(d) != f {
                let p1 = self.calc_point::<A>(d, points)?;
                let p2 = self.calc_point::<A>(self.phi1(d), points)?;
                total += A::dot_product(p0, A::cross_product(p1 - p0, p2 - p0)) / A::scalarf64(6.0);
                d = self.phi1(d);
            }
        }
        Ok(total)
    }

    pub fn try_calc_volume<A: Adaptor>(
        &self,
        position: &AttributeHandle<A::Vector>,
    ) -> Result<A::Scalar, Error> {
        self.calc_volume::<A>(self.column(position)?)
    }

    /// Normal of the vertex of `v`, weighted by the areas of the sectors around
    /// it. Boundary faces do not contribute.
    pub fn calc_vertex_normal<A: Adaptor>(
        &self,
        v: Dart,
        points: &[A::Vector],
    ) -> Result<A::Vector, Error> {
        let mut total = A::zero_vector();
        for d in self.orbit(Orbit::Vertex, v) {
            if !self.is_boundary_dart(d) {
                total = total + self.calc_sector_normal::<A>(d, points)?;
            }
        }
        Ok(A::normalized_vec(total))
    }

    /// Compute the normals of all vertices into the [`NORMAL`] vertex
    /// attribute, adding it if needed.
    pub fn update_vertex_normals<A: Adaptor>(
        &mut self,
        position: &AttributeHandle<A::Vector>,
    ) -> Result<AttributeHandle<A::Vector>, Error> {
        let normals: Vec<(usize, A::Vector)> = {
            let points = self.column(position)?;
            self.vertices()
                .map(|v| Ok((self.vertex_line(v)?, self.calc_vertex_normal::<A>(v, points)?)))
                .collect::<Result<_, Error>>()?
        };
        let normal = match self.attribute::<A::Vector>(Orbit::Vertex, NORMAL) {
            Ok(h) => h,
            Err(Error::AttributeNotFound(_)) => self.add_attribute(Orbit::Vertex, NORMAL)?,
            Err(e) => return Err(e),
        };
        let column = self.column_mut(&normal)?;
        for (line, n) in normals {
            column[line] = n;
        }
        Ok(normal)
    }

    fn aligned_angle<A: Adaptor>(
        norm0: A::Vector,
        norm1: A::Vector,
        align: A::Vector,
    ) -> A::Scalar {
        let angle = A::vector_angle(norm0, norm1);
        if A::dot_product(A::cross_product(norm0, norm1), align) >= A::scalarf64(0.0) {
            angle
        } else {
            -angle
        }
    }

    /// Signed dihedral angle at the edge of `d`, measured between the sector
    /// normals on either side. Zero for boundary edges.
    pub fn calc_dihedral_angle<A: Adaptor>(
        &self,
        d: Dart,
        points: &[A::Vector],
    ) -> Result<A::Scalar, Error> {
        if self.is_boundary_edge(d) {
            return Ok(A::scalarf64(0.0));
        }
        let e = self.phi2(d);
        Ok(Self::aligned_angle::<A>(
            self.calc_sector_normal::<A>(d, points)?,
            self.calc_sector_normal::<A>(e, points)?,
            self.calc_edge_vector::<A>(d, points)?,
        ))
    }

    /// Axis aligned bounding box of the used vertex lines, or `None` if there
    /// are no vertices.
    pub fn calc_bounding_box<A: Adaptor>(
        &self,
        points: &[A::Vector],
    ) -> Result<Option<(A::Vector, A::Vector)>, Error> {
        let mut bounds: Option<(A::Vector, A::Vector)> = None;
        for line in self.container(Orbit::Vertex).lines() {
            let p = points
                .get(line as usize)
                .copied()
                .ok_or(Error::OutOfBoundsAccess(line))?;
            bounds = Some(match bounds {
                None => (p, p),
                Some((lo, hi)) => (
                    A::vector(std::array::from_fn(|i| {
                        A::vector_coord(&lo, i).min(A::vector_coord(&p, i))
                    })),
                    A::vector(std::array::from_fn(|i| {
                        A::vector_coord(&hi, i).max(A::vector_coord(&p, i))
                    })),
                ),
            });
        }
        Ok(bounds)
    }
}

#[cfg(test)]
mod test {
    use crate::{Error, Map, Orbit, macros::assert_f32_eq, use_glam::BuiltInAdaptorF32};

    type A = BuiltInAdaptorF32;

    #[test]
    fn t_box_face_normals() {
        let (qbox, pos) = Map::quad_box::<A>(glam::vec3(0.0, 0.0, 0.0), glam::vec3(1.0, 1.0, 1.0))
            .expect("Cannot create a box primitive");
        assert_eq!(
            qbox.faces()
                .map(|f| {
                    qbox.try_calc_face_normal::<A>(f, &pos)
                        .expect("Cannot compute face normal")
                })
                .collect::<Vec<_>>(),
            &[
                glam::vec3(0.0, 0.0, -1.0),
                glam::vec3(0.0, -1.0, 0.0),
                glam::vec3(1.0, 0.0, 0.0),
                glam::vec3(0.0, 1.0, 0.0),
                glam::vec3(-1.0, 0.0, 0.0),
                glam::vec3(0.0, 0.0, 1.0),
            ]
        );
    }

    #[test]
    fn t_box_face_centroids() {
        let (qbox, pos) = Map::quad_box::<A>(glam::vec3(0.0, 0.0, 0.0), glam::vec3(1.0, 1.0, 1.0))
            .expect("Cannot create a box primitive");
        assert_eq!(
            qbox.faces()
                .map(|f| {
                    qbox.try_calc_face_centroid::<A>(f, &pos)
                        .expect("Cannot compute face centroid")
                })
                .collect::<Vec<_>>(),
            &[
                glam::vec3(0.5, 0.5, 0.0),
                glam::vec3(0.5, 0.0, 0.5),
                glam::vec3(1.0, 0.5, 0.5),
                glam::vec3(0.5, 1.0, 0.5),
                glam::vec3(0.0, 0.5, 0.5),
                glam::vec3(0.5, 0.5, 1.0),
            ]
        );
    }

    #[test]
    fn t_box_area_and_volume() {
        let (qbox, pos) = Map::quad_box::<A>(glam::vec3(0.0, 0.0, 0.0), glam::vec3(1.0, 2.0, 3.0))
            .expect("Cannot create a box primitive");
        assert_f32_eq!(
            qbox.try_calc_area::<A>(&pos).expect("Cannot compute area"),
            22.0,
            1e-5
        );
        assert_f32_eq!(
            qbox.try_calc_volume::<A>(&pos).expect("Cannot compute volume"),
            6.0,
            1e-5
        );
    }

    #[test]
    fn t_tetrahedron_area_and_volume() {
        let (tet, pos) = Map::tetrahedron::<A>(1.0).expect("Cannot create tetrahedron");
        assert_f32_eq!(
            tet.try_calc_area::<A>(&pos).expect("Cannot compute area"),
            8.0 / 3.0f32.sqrt(),
            1e-5
        );
        assert_f32_eq!(
            tet.try_calc_volume::<A>(&pos).expect("Cannot compute volume"),
            8.0 / (9.0 * 3.0f32.sqrt()),
            1e-5
        );
    }

    #[test]
    fn t_box_vertex_normals() {
        let (mut qbox, pos) =
            Map::quad_box::<A>(glam::vec3(0.0, 0.0, 0.0), glam::vec3(1.0, 1.0, 1.0))
                .expect("Cannot create a box primitive");
        let normals = qbox
            .update_vertex_normals::<A>(&pos)
            .expect("Cannot compute vertex normals");
        let points = qbox.column(&pos).expect("Cannot read positions");
        for (line, n) in qbox.attribute_iter(&normals).expect("Cannot read normals") {
            let expected = (points[line as usize] - glam::Vec3::splat(0.5)).normalize();
            assert_f32_eq!((*n - expected).length(), 0.0, 1e-6);
        }
    }

    #[test]
    fn t_box_dihedral_and_sector_angles() {
        let (qbox, pos) = Map::quad_box::<A>(glam::vec3(0.0, 0.0, 0.0), glam::vec3(1.0, 1.0, 1.0))
            .expect("Cannot create a box primitive");
        let points = qbox.column(&pos).expect("Cannot read positions");
        for d in qbox.darts() {
            assert_f32_eq!(
                qbox.calc_dihedral_angle::<A>(d, points)
                    .expect("Cannot compute dihedral angle")
                    .abs(),
                std::f32::consts::FRAC_PI_2,
                1e-6
            );
            assert_f32_eq!(
                qbox.calc_sector_angle::<A>(d, points)
                    .expect("Cannot compute sector angle"),
                std::f32::consts::FRAC_PI_2,
                1e-6
            );
            assert_f32_eq!(
                qbox.calc_edge_length::<A>(d, points)
                    .expect("Cannot compute edge length"),
                1.0,
                1e-6
            );
        }
        let (lo, hi) = qbox
            .calc_bounding_box::<A>(points)
            .expect("Cannot compute bounding box")
            .expect("Box has no vertices");
        assert_eq!(lo, glam::Vec3::ZERO);
        assert_eq!(hi, glam::Vec3::ONE);
    }

    #[test]
    fn t_geometry_without_vertex_embedding() {
        let mut map = Map::tetrahedron_topology().expect("Cannot create tetrahedron");
        map.embeddings[Orbit::Vertex.index()] = None;
        assert!(!map.is_embedded(Orbit::Vertex));
        let points = [glam::Vec3::ZERO; 4];
        let f = map.faces().next().expect("Cannot find a face");
        assert!(matches!(
            map.calc_point::<A>(f, &points),
            Err(Error::NotEmbedded(Orbit::Vertex))
        ));
        assert!(matches!(
            map.calc_face_normal::<A>(f, &points),
            Err(Error::NotEmbedded(Orbit::Vertex))
        ));
        assert!(matches!(
            map.calc_area::<A>(&points),
            Err(Error::NotEmbedded(Orbit::Vertex))
        ));
    }

    #[test]
    fn t_geometry_with_short_column() {
        let (tet, _) = Map::tetrahedron::<A>(1.0).expect("Cannot create tetrahedron");
        let points = [glam::Vec3::ZERO; 2];
        assert!(matches!(
            tet.calc_volume::<A>(&points),
            Err(Error::OutOfBoundsAccess(_))
        ));
        assert!(matches!(
            tet.calc_bounding_box::<A>(&points),
            Err(Error::OutOfBoundsAccess(_))
        ));
    }
}
