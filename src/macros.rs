//! Assertions shared by the unit tests.

/// Assert that two scalars differ by at most `eps`. Extra arguments are
/// formatted into the failure message.
#[cfg(test)]
macro_rules! assert_float_eq {
    ($a:expr, $b:expr, $eps:expr) => {
        $crate::macros::assert_float_eq!($a, $b, $eps, "")
    };
    ($a:expr, $b:expr, $eps:expr, $($msg:tt)+) => {{
        let (a, b, eps) = ($a, $b, $eps);
        let error = (a - b).abs();
        assert!(
            error <= eps,
            "|{} - {}| = {:e} exceeds {:e}. {}",
            a,
            b,
            error,
            eps,
            format_args!($($msg)+)
        );
    }};
}

/// Single precision [`assert_float_eq`], with machine epsilon as the default
/// tolerance.
#[cfg(test)]
macro_rules! assert_f32_eq {
    ($a:expr, $b:expr) => {
        $crate::macros::assert_float_eq!($a, $b, f32::EPSILON)
    };
    ($a:expr, $b:expr, $eps:expr) => {
        $crate::macros::assert_float_eq!($a, $b, $eps)
    };
    ($a:expr, $b:expr, $eps:expr, $($msg:tt)+) => {
        $crate::macros::assert_float_eq!($a, $b, $eps, $($msg)+)
    };
}

/// Assert that two positions are within `eps` of each other. Works for any
/// vector type with `-` and a `length` method, such as the glam vectors.
#[cfg(test)]
macro_rules! assert_position_eq {
    ($a:expr, $b:expr, $eps:expr) => {{
        let (a, b) = ($a, $b);
        assert!(
            (a - b).length() <= $eps,
            "positions {:?} and {:?} are further apart than {:e}",
            a,
            b,
            $eps
        );
    }};
}

#[cfg(test)]
pub(crate) use assert_f32_eq;
#[cfg(test)]
pub(crate) use assert_float_eq;
#[cfg(test)]
pub(crate) use assert_position_eq;
