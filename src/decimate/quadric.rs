use crate::{adaptor::Adaptor, dart::Dart, error::Error, map::Map, orbit::Orbit};
use std::ops::{Add, AddAssign};

/// Below this determinant the quadric has no unique minimizer.
const SINGULAR_DET: f64 = 1e-12;

/// Sum of squared distances to a set of planes, as the symmetric 3x3 matrix
/// `a`, the vector `b` and the constant `c`, so that the error of a point `p`
/// is `p.a.p - 2 b.p + c`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Quadric {
    a00: f64,
    a01: f64,
    a02: f64,
    a11: f64,
    a12: f64,
    a22: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    c: f64,
}

impl Quadric {
    /// Quadric of the plane through `pos` with unit normal `normal`.
    pub fn plane(pos: [f64; 3], normal: [f64; 3]) -> Self {
        let [nx, ny, nz] = normal;
        let dot = pos[0] * nx + pos[1] * ny + pos[2] * nz;
        Quadric {
            a00: nx * nx,
            a01: nx * ny,
            a02: nx * nz,
            a11: ny * ny,
            a12: ny * nz,
            a22: nz * nz,
            b0: nx * dot,
            b1: ny * dot,
            b2: nz * dot,
            c: dot * dot,
        }
    }

    pub fn residual(&self, p: [f64; 3]) -> f64 {
        let [x, y, z] = p;
        x * (self.a00 * x + self.a01 * y + self.a02 * z)
            + y * (self.a01 * x + self.a11 * y + self.a12 * z)
            + z * (self.a02 * x + self.a12 * y + self.a22 * z)
            - 2.0 * (x * self.b0 + y * self.b1 + z * self.b2)
            + self.c
    }

    /// Point with the smallest error, by Cramer's rule. `None` if the planes
    /// do not pin down a single point.
    pub fn minimizer(&self) -> Option<[f64; 3]> {
        let (a, b, c) = (self.a00, self.a01, self.a02);
        let (d, e, f) = (self.a11, self.a12, self.a22);
        let det = a * (d * f - e * e) - b * (b * f - e * c) + c * (b * e - d * c);
        if det.abs() < SINGULAR_DET {
            return None;
        }
        let (r0, r1, r2) = (self.b0, self.b1, self.b2);
        let x = (r0 * (d * f - e * e) - b * (r1 * f - e * r2) + c * (r1 * e - d * r2)) / det;
        let y = (a * (r1 * f - r2 * e) - r0 * (b * f - e * c) + c * (b * r2 - r1 * c)) / det;
        let z = (a * (d * r2 - e * r1) - b * (b * r2 - r1 * c) + r0 * (b * e - d * c)) / det;
        Some([x, y, z])
    }

    /// Quadrics of every vertex of the map, indexed by vertex line. Each is
    /// the sum of the plane quadrics of the faces around the vertex.
    pub fn vertex_quadrics<A: Adaptor>(
        map: &Map,
        points: &[A::Vector],
    ) -> Result<Vec<Quadric>, Error> {
        let mut quadrics = Vec::new();
        quadrics.try_reserve(map.container(Orbit::Vertex).num_lines())?;
        quadrics.resize(map.container(Orbit::Vertex).num_lines(), Quadric::default());
        for v in map.vertices() {
            let line = map.vertex_line(v)?;
            *quadrics
                .get_mut(line)
                .ok_or(Error::OutOfBoundsAccess(line as u32))? =
                Self::around_vertex::<A>(map, points, v)?;
        }
        Ok(quadrics)
    }

    pub fn around_vertex<A: Adaptor>(
        map: &Map,
        points: &[A::Vector],
        v: Dart,
    ) -> Result<Quadric, Error> {
        let pos = A::to_f64_array(&map.calc_point::<A>(v, points)?);
        let mut q = Quadric::default();
        for d in map.orbit(Orbit::Vertex, v) {
            if !map.is_boundary_dart(d) {
                q += Quadric::plane(pos, A::to_f64_array(&map.calc_face_normal::<A>(d, points)?));
            }
        }
        Ok(q)
    }

    /// Quadric of the vertex line `line`.
    pub(crate) fn lookup(quadrics: &[Quadric], line: usize) -> Result<Quadric, Error> {
        quadrics
            .get(line)
            .copied()
            .ok_or(Error::OutOfBoundsAccess(line as u32))
    }
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, rhs: Self) {
        self.a00 += rhs.a00;
        self.a01 += rhs.a01;
        self.a02 += rhs.a02;
        self.a11 += rhs.a11;
        self.a12 += rhs.a12;
        self.a22 += rhs.a22;
        self.b0 += rhs.b0;
        self.b1 += rhs.b1;
        self.b2 += rhs.b2;
        self.c += rhs.c;
    }
}

impl Add for Quadric {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

#[cfg(test)]
mod test {
    use super::Quadric;
    use crate::macros::assert_float_eq;

    #[test]
    fn t_three_planes_meet_at_a_point() {
        let q = Quadric::plane([1.0, 2.0, 3.0], [1.0, 0.0, 0.0])
            + Quadric::plane([1.0, 2.0, 3.0], [0.0, 1.0, 0.0])
            + Quadric::plane([1.0, 2.0, 3.0], [0.0, 0.0, 1.0]);
        let p = q.minimizer().expect("Cannot find minimizer");
        assert_float_eq!(p[0], 1.0, 1e-12);
        assert_float_eq!(p[1], 2.0, 1e-12);
        assert_float_eq!(p[2], 3.0, 1e-12);
        assert_float_eq!(q.residual(p), 0.0, 1e-12);
        // Unit distance from each of the three planes.
        assert_float_eq!(q.residual([2.0, 3.0, 4.0]), 3.0, 1e-12);
    }

    #[test]
    fn t_parallel_planes_are_singular() {
        let q = Quadric::plane([0.0, 0.0, 0.0], [0.0, 0.0, 1.0])
            + Quadric::plane([0.0, 0.0, 1.0], [0.0, 0.0, 1.0]);
        assert!(q.minimizer().is_none());
        // Half way between the planes.
        assert_float_eq!(q.residual([5.0, -3.0, 0.5]), 0.5, 1e-12);
    }
}
