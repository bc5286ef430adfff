/*!
Built-in adaptors that use [`glam`](https://docs.rs/glam/latest/glam/) to
represent the geometry of a map.
*/

use crate::adaptor::Adaptor;

/// Built-in adaptor for 32-bit floating point positions.
pub struct BuiltInAdaptorF32 {}

impl Adaptor for BuiltInAdaptorF32 {
    type Vector = glam::Vec3;
    type Scalar = f32;

    fn vector(coords: [Self::Scalar; 3]) -> Self::Vector {
        glam::vec3(coords[0], coords[1], coords[2])
    }

    fn zero_vector() -> Self::Vector {
        glam::Vec3::splat(0.)
    }

    fn vector_coord(v: &Self::Vector, i: usize) -> Self::Scalar {
        v[i]
    }

    fn dot_product(a: Self::Vector, b: Self::Vector) -> Self::Scalar {
        a.dot(b)
    }

    fn cross_product(a: Self::Vector, b: Self::Vector) -> Self::Vector {
        a.cross(b)
    }

    fn scalarf64(val: f64) -> Self::Scalar {
        val as f32
    }

    fn to_f64(val: Self::Scalar) -> f64 {
        val as f64
    }

    fn vector_length(v: Self::Vector) -> Self::Scalar {
        v.length()
    }

    fn normalized_vec(v: Self::Vector) -> Self::Vector {
        v.normalize_or_zero()
    }
}

/// Built-in adaptor for 64-bit floating point positions.
pub struct BuiltInAdaptorF64 {}

impl Adaptor for BuiltInAdaptorF64 {
    type Vector = glam::DVec3;
    type Scalar = f64;

    fn vector(coords: [Self::Scalar; 3]) -> Self::Vector {
        glam::dvec3(coords[0], coords[1], coords[2])
    }

    fn zero_vector() -> Self::Vector {
        glam::DVec3::splat(0.)
    }

    fn vector_coord(v: &Self::Vector, i: usize) -> Self::Scalar {
        v[i]
    }

    fn dot_product(a: Self::Vector, b: Self::Vector) -> Self::Scalar {
        a.dot(b)
    }

    fn cross_product(a: Self::Vector, b: Self::Vector) -> Self::Vector {
        a.cross(b)
    }

    fn scalarf64(val: f64) -> Self::Scalar {
        val
    }

    fn to_f64(val: Self::Scalar) -> f64 {
        val
    }

    fn vector_length(v: Self::Vector) -> Self::Scalar {
        v.length()
    }

    fn normalized_vec(v: Self::Vector) -> Self::Vector {
        v.normalize_or_zero()
    }
}
