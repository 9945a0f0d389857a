use nalgebra::RealField;

/// Floating-point type the whole evaluation pipeline is generic over.
///
/// Implemented for `f32` and `f64`; every buffer, parameter and accumulator of a
/// model instantiated with `T` uses `T`, so single- and double-precision models
/// never mix arithmetic.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

/// Converts an `f64` literal or parsed parameter into the working precision.
#[inline]
pub fn real<T: Real>(value: f64) -> T {
    nalgebra::convert(value)
}
