//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit a value to the range `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    let mut ret = value;

    if ret > max {
        ret = max
    }
    if ret < min {
        ret = min
    }

    ret
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()` if `lhs` is much smaller than `rhs.abs()` in
/// magnitude and `lhs < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::zero() {
        r + rhs.abs()
    } else {
        r
    }
}

/// Wrap an angle in degrees into the range (-180, 180].
pub fn wrap_deg<T>(angle_deg: T) -> T
where
    T: Float,
{
    let full = T::from(360.0).unwrap_or_else(T::zero);
    let half = T::from(180.0).unwrap_or_else(T::zero);

    let mut wrapped = rem_euclid(angle_deg, full);
    if wrapped > half {
        wrapped = wrapped - full;
    }

    wrapped
}

/// Get the signed shortest angular distance in degrees needed to rotate from
/// `from_deg` to `to_deg`.
///
/// The result is in the range (-180, 180].
pub fn ang_dist_deg<T>(from_deg: T, to_deg: T) -> T
where
    T: Float,
{
    wrap_deg(to_deg - from_deg)
}

/// Interpolate between two angles in degrees along the shortest arc.
///
/// `t` is the blend factor, 0 returning `a_deg` and 1 returning a value
/// equivalent (mod 360) to `b_deg`. The result is not wrapped, so
/// interpolating from 170 towards -170 passes through 180 rather than 0.
pub fn lerp_angle_deg<T>(a_deg: T, b_deg: T, t: T) -> T
where
    T: Float,
{
    a_deg + ang_dist_deg(a_deg, b_deg) * t
}

/// Smoothstep ease curve `t^2 (3 - 2t)`, with `t` limited to `[0, 1]`.
pub fn smoothstep<T>(t: T) -> T
where
    T: Float,
{
    let t = clamp(t, T::zero(), T::one());
    let two = T::one() + T::one();
    let three = two + T::one();

    t * t * (three - two * t)
}
