//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    target_range.0
        + ((value - source_range.0)
        * (target_range.1 - target_range.0)
        / (source_range.1 - source_range.0))
}

/// Map a value from one range into another, saturating at the ends of the target range.
///
/// If the source range is empty the lower end of the target range is returned.
pub fn interpolate<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float
{
    if source_range.1 <= source_range.0 {
        return target_range.0
    }

    if value <= source_range.0 {
        target_range.0
    }
    else if value >= source_range.1 {
        target_range.1
    }
    else {
        lin_map(source_range, target_range, value)
    }
}

/// Wrap an angle into the range (-pi, pi].
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float
{
    let pi_t = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau_t = pi_t + pi_t;

    let wrapped = rem_euclid(angle + pi_t, tau_t) - pi_t;

    // rem_euclid lands on [-pi, pi), move the lower bound onto the upper
    if wrapped <= -pi_t {
        wrapped + tau_t
    }
    else {
        wrapped
    }
}

/// Get the shortest signed angular distance from `a` to `b`.
///
/// The result is in the range (-pi, pi], positive when `b` lies clockwise of `a` in a
/// north-east-down frame.
pub fn ang_dist<T>(a: T, b: T) -> T
where
    T: Float
{
    wrap_pi(b - a)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    #[test]
    fn test_wrap_pi() {
        assert!((wrap_pi(0f64)).abs() < 1e-12);
        assert!((wrap_pi(PI) - PI).abs() < 1e-12);
        assert!((wrap_pi(-PI) - PI).abs() < 1e-12);
        assert!((wrap_pi(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(-3.0 * PI / 2.0) - PI / 2.0).abs() < 1e-12);
        assert!((wrap_pi(5.0 * PI) - PI).abs() < 1e-9);
        assert!((wrap_pi(0.1f32) - 0.1).abs() < 1e-6);
        assert!(wrap_pi(f64::NAN).is_nan());
    }

    #[test]
    fn test_ang_dist() {
        assert!((ang_dist(1f64, 2f64) - 1.0).abs() < 1e-12);
        assert!((ang_dist(2f64, 1f64) + 1.0).abs() < 1e-12);
        assert!((ang_dist(-3.0f64, 3.0) - (6.0 - 2.0 * PI)).abs() < 1e-12);
        assert!((ang_dist(3.0f64, -3.0) + (6.0 - 2.0 * PI)).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate() {
        assert_eq!(interpolate((0f32, 2.0), (0.0, 1.0), 1.0), 0.5);
        assert_eq!(interpolate((0f32, 2.0), (0.0, 1.0), 3.0), 1.0);
        assert_eq!(interpolate((0f32, 2.0), (0.0, 1.0), -1.0), 0.0);
        assert_eq!(interpolate((0f32, 0.0), (0.0, 1.0), 1.0), 0.0);
    }
}
