//! Utility maths functions
//!
//! Angle handling is a recurring concern in the drive software (steer axes,
//! heading control, pose estimation), so the single source of wrap-around
//! logic lives here and is reused by every module that compares angles.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where
    T: Float,
{
    target_range.0
        + ((value - source_range.0) * (target_range.1 - target_range.0)
            / (source_range.1 - source_range.0))
}

/// Clamp a value between a minimum and maximum.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Wrap an angle into the canonical range (-pi, pi].
pub fn wrap_pi<T>(angle_rad: T) -> T
where
    T: Float,
{
    let pi_t: T = T::from(std::f64::consts::PI).unwrap();
    let tau_t: T = T::from(std::f64::consts::TAU).unwrap();

    let mut wrapped = rem_euclid(angle_rad, tau_t);

    if wrapped > pi_t {
        wrapped = wrapped - tau_t;
    }

    wrapped
}

/// Get the signed shortest angular difference `to - from` in (-pi, pi].
///
/// Accounts for wrap-around, so the difference between an angle just below
/// +pi and one just above -pi is small, never close to 2*pi. A positive
/// result means `to` is reached from `from` by a counter-clockwise rotation.
pub fn ang_diff<T>(from_rad: T, to_rad: T) -> T
where
    T: Float,
{
    wrap_pi(to_rad - from_rad)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// This function is taken from the std library as num is missing it.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float,
{
    let r = lhs % rhs;
    if r < T::from(0.0).unwrap() {
        r + rhs.abs()
    } else {
        r
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::assert_approx_eq;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_wrap_pi() {
        assert_approx_eq!(f64, wrap_pi(0.0), 0.0);
        assert_approx_eq!(f64, wrap_pi(PI), PI);
        assert_approx_eq!(f64, wrap_pi(-PI), PI);
        assert_approx_eq!(f64, wrap_pi(TAU), 0.0, epsilon = 1e-12);
        assert_approx_eq!(f64, wrap_pi(3.0 * PI), PI, epsilon = 1e-12);
        assert_approx_eq!(f64, wrap_pi(-0.5), -0.5);
        assert_approx_eq!(f64, wrap_pi(TAU + 0.25), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_ang_diff() {
        assert_approx_eq!(f64, ang_diff(1.0, 2.0), 1.0);
        assert_approx_eq!(f64, ang_diff(2.0, 1.0), -1.0);
        assert_approx_eq!(f64, ang_diff(0.0, TAU), 0.0, epsilon = 1e-12);

        // Angles either side of the +/-pi seam must be a small step apart,
        // never close to a full revolution.
        assert_approx_eq!(
            f64,
            ang_diff(PI - 0.01, -PI + 0.01),
            0.02,
            epsilon = 1e-9
        );
        assert_approx_eq!(
            f64,
            ang_diff(-PI + 0.01, PI - 0.01),
            -0.02,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_lin_map() {
        assert_approx_eq!(f64, lin_map((0.0, 1.0), (0.0, 10.0), 0.5), 5.0);
        assert_approx_eq!(f64, lin_map((-1.0, 1.0), (0.0, 1.0), 0.0), 0.5);
    }
}
