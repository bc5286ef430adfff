/*!
The map itself is purely combinatorial. Algorithms that need geometry are
generic over an [`Adaptor`], which tells them how to work with the vector and
scalar types used for positions. Built-in adaptors for
[`glam`](https://docs.rs/glam/latest/glam/) vectors are in
[`use_glam`](crate::use_glam).
*/

use crate::attribute::AttributeValue;
use num_traits::Float;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

pub trait Adaptor {
    type Vector: AttributeValue
        + Copy
        + PartialEq
        + std::fmt::Debug
        + Add<Output = Self::Vector>
        + Sub<Output = Self::Vector>
        + Mul<Self::Scalar, Output = Self::Vector>
        + Div<Self::Scalar, Output = Self::Vector>
        + Neg<Output = Self::Vector>;
    type Scalar: Float + Default + AddAssign + std::fmt::Debug;

    fn vector(coords: [Self::Scalar; 3]) -> Self::Vector;

    fn zero_vector() -> Self::Vector;

    fn vector_coord(v: &Self::Vector, i: usize) -> Self::Scalar;

    fn dot_product(a: Self::Vector, b: Self::Vector) -> Self::Scalar;

    fn cross_product(a: Self::Vector, b: Self::Vector) -> Self::Vector;

    fn scalarf64(val: f64) -> Self::Scalar;

    fn to_f64(val: Self::Scalar) -> f64;

    fn vector_length(v: Self::Vector) -> Self::Scalar {
        Self::dot_product(v, v).sqrt()
    }

    /// Unit vector along `v`. Zero vectors are returned unchanged.
    fn normalized_vec(v: Self::Vector) -> Self::Vector {
        let len = Self::vector_length(v);
        if len > Self::scalarf64(0.0) {
            v / len
        } else {
            v
        }
    }

    /// Unsigned angle between two vectors, in radians.
    fn vector_angle(a: Self::Vector, b: Self::Vector) -> Self::Scalar {
        let cross = Self::vector_length(Self::cross_product(a, b));
        cross.atan2(Self::dot_product(a, b))
    }

    fn to_f64_array(v: &Self::Vector) -> [f64; 3] {
        [
            Self::to_f64(Self::vector_coord(v, 0)),
            Self::to_f64(Self::vector_coord(v, 1)),
            Self::to_f64(Self::vector_coord(v, 2)),
        ]
    }

    fn from_f64_array(c: [f64; 3]) -> Self::Vector {
        Self::vector([
            Self::scalarf64(c[0]),
            Self::scalarf64(c[1]),
            Self::scalarf64(c[2]),
        ])
    }
}
