use crate::{adaptor::Adaptor, attribute::AttributeHandle, error::Error, map::Map};

const BOX_POS: [(bool, bool, bool); 8] = [
    (false, false, false),
    (true, false, false),
    (true, true, false),
    (false, true, false),
    (false, false, true),
    (true, false, true),
    (true, true, true),
    (false, true, true),
];

const BOX_IDX: [[u32; 4]; 6] = [
    [0, 3, 2, 1],
    [0, 1, 5, 4],
    [1, 2, 6, 5],
    [2, 3, 7, 6],
    [3, 0, 4, 7],
    [4, 5, 6, 7],
];

const TET_IDX: [[u32; 3]; 4] = [[0, 1, 2], [0, 2, 3], [0, 3, 1], [3, 2, 1]];

fn box_points<A: Adaptor>(min: A::Vector, max: A::Vector) -> [A::Vector; 8] {
    let mut pos = [A::zero_vector(); 8];
    for (i, &(xf, yf, zf)) in BOX_POS.iter().enumerate() {
        pos[i] = A::vector([
            A::vector_coord(if xf { &max } else { &min }, 0),
            A::vector_coord(if yf { &max } else { &min }, 1),
            A::vector_coord(if zf { &max } else { &min }, 2),
        ]);
    }
    pos
}

/// Row major quads of a grid with `nx` by `ny` cells.
fn grid_faces(nx: u32, ny: u32) -> Vec<[u32; 4]> {
    let row = nx + 1;
    (0..ny)
        .flat_map(|j| {
            (0..nx).map(move |i| {
                let v = j * row + i;
                [v, v + 1, v + 1 + row, v + row]
            })
        })
        .collect()
}

impl Map {
    /// Topology of a tetrahedron, with vertices embedded but no geometry.
    pub fn tetrahedron_topology() -> Result<Self, Error> {
        Self::from_polygons(4, &TET_IDX)
    }

    /// Topology of an open grid of `nx` by `ny` quads. Vertex `i + j * (nx +
    /// 1)` is at column `i` and row `j`.
    pub fn grid_topology(nx: u32, ny: u32) -> Result<Self, Error> {
        Self::from_polygons(((nx + 1) * (ny + 1)) as usize, &grid_faces(nx, ny))
    }

    /// Create a tetrahedron centered at the origin, with its vertices on a
    /// sphere of the given radius.
    pub fn tetrahedron<A: Adaptor>(
        radius: A::Scalar,
    ) -> Result<(Self, AttributeHandle<A::Vector>), Error> {
        let zero = A::scalarf64(0.0);
        let a = radius * A::scalarf64(1.0f64 / 3.0);
        let b = radius * A::scalarf64((8.0 / 9.0f64).sqrt());
        let c = radius * A::scalarf64((2.0 / 9.0f64).sqrt());
        let d = radius * A::scalarf64((2.0 / 3.0f64).sqrt());
        let points = [
            A::vector([zero, zero, radius]),
            A::vector([-c, d, -a]),
            A::vector([-c, -d, -a]),
            A::vector([b, zero, -a]),
        ];
        Self::from_positions::<A, _>(&points, &TET_IDX)
    }

    /// Makes a box with the following topology, spanning from the min point to
    /// the max point.
    ///
    ///  ```text
    ///       7-----------6
    ///      /|          /|
    ///     / |         / |
    ///    4-----------5  |
    ///    |  |        |  |
    ///    |  3--------|--2
    ///    | /         | /
    ///    |/          |/
    ///    0-----------1
    ///  ```
    pub fn quad_box<A: Adaptor>(
        min: A::Vector,
        max: A::Vector,
    ) -> Result<(Self, AttributeHandle<A::Vector>), Error> {
        Self::from_positions::<A, _>(&box_points::<A>(min, max), &BOX_IDX)
    }

    /// Axis aligned cube from the origin to (1, 1, 1), with every face of the
    /// box split into two triangles.
    pub fn unit_cube<A: Adaptor>() -> Result<(Self, AttributeHandle<A::Vector>), Error> {
        let points = box_points::<A>(
            A::vector([A::scalarf64(0.0); 3]),
            A::vector([A::scalarf64(1.0); 3]),
        );
        let tris: Vec<[u32; 3]> = BOX_IDX
            .iter()
            .flat_map(|&[a, b, c, d]| [[a, b, c], [a, c, d]])
            .collect();
        Self::from_positions::<A, _>(&points, &tris)
    }

    /// Flat grid of `nx` by `ny` square quads of the given size, in the XY
    /// plane, with its first vertex at the origin.
    pub fn grid<A: Adaptor>(
        nx: u32,
        ny: u32,
        size: A::Scalar,
    ) -> Result<(Self, AttributeHandle<A::Vector>), Error> {
        let zero = A::scalarf64(0.0);
        let points: Vec<A::Vector> = (0..=ny)
            .flat_map(|j| {
                (0..=nx).map(move |i| {
                    A::vector([
                        size * A::scalarf64(i as f64),
                        size * A::scalarf64(j as f64),
                        zero,
                    ])
                })
            })
            .collect();
        Self::from_positions::<A, _>(&points, &grid_faces(nx, ny))
    }
}

#[cfg(test)]
mod test {
    use crate::{Map, Orbit, use_glam::BuiltInAdaptorF32};

    #[test]
    fn t_tetrahedron() {
        let (tet, pos) = Map::tetrahedron::<BuiltInAdaptorF32>(2.0).expect("Cannot create tetrahedron");
        assert_eq!(tet.num_vertices(), 4);
        assert_eq!(tet.num_darts(), 12);
        assert_eq!(tet.num_edges(), 6);
        assert_eq!(tet.num_faces(), 4);
        for (_, p) in tet.attribute_iter(&pos).expect("Cannot read positions") {
            crate::macros::assert_f32_eq!(p.length(), 2.0, 1e-6);
        }
        tet.check().expect("Map is inconsistent");
    }

    #[test]
    fn t_quad_box() {
        let (qbox, _) = Map::quad_box::<BuiltInAdaptorF32>(glam::Vec3::ZERO, glam::Vec3::ONE)
            .expect("Cannot create box");
        assert_eq!(qbox.num_vertices(), 8);
        assert_eq!(qbox.num_darts(), 24);
        assert_eq!(qbox.num_edges(), 12);
        assert_eq!(qbox.num_faces(), 6);
        assert!(qbox.darts().all(|d| !qbox.is_boundary_dart(d)));
        qbox.check().expect("Map is inconsistent");
    }

    #[test]
    fn t_unit_cube() {
        let (cube, _) = Map::unit_cube::<BuiltInAdaptorF32>().expect("Cannot create cube");
        assert_eq!(cube.num_vertices(), 8);
        assert_eq!(cube.num_edges(), 18);
        assert_eq!(cube.num_faces(), 12);
        assert_eq!(cube.num_cells(Orbit::Volume), 1);
        cube.check().expect("Map is inconsistent");
    }

    #[test]
    fn t_grid() {
        let (grid, pos) = Map::grid::<BuiltInAdaptorF32>(3, 2, 0.5).expect("Cannot create grid");
        assert_eq!(grid.num_vertices(), 12);
        assert_eq!(grid.num_faces(), 6);
        assert_eq!(
            *grid.value(&pos, 11).expect("Cannot read position"),
            glam::vec3(1.5, 1.0, 0.0)
        );
        // Boundary face goes around the 10 border edges.
        let bd = grid
            .darts()
            .find(|d| grid.is_boundary_dart(*d))
            .expect("Cannot find boundary");
        assert_eq!(grid.face_degree(bd), 10);
        grid.check().expect("Map is inconsistent");
    }
}
