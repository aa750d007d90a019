// tarmac_core/src/utils/math.rs

//! Scalar helpers shared by the drivetrain, wheel and assist models.
//!
//! Interpolation here follows the game-engine convention the vehicle tuning
//! values were authored against: `lerp` clamps its parameter to `[0, 1]`.

/// Linear interpolation with `t` clamped to `[0, 1]`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * clamp01(t)
}

/// Where `value` sits between `a` and `b`, clamped to `[0, 1]`. Returns 0 for an empty range.
#[inline]
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if (b - a).abs() < f64::EPSILON {
        return 0.0;
    }
    clamp01((value - a) / (b - a))
}

#[inline]
pub fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Moves `current` toward `target` by at most `max_delta`.
#[inline]
pub fn move_towards(current: f64, target: f64, max_delta: f64) -> f64 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Signed shortest difference `to - from` between two angles in degrees, in `(-180, 180]`.
#[inline]
pub fn delta_angle_deg(from: f64, to: f64) -> f64 {
    let mut delta = (to - from) % 360.0;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta <= -180.0 {
        delta += 360.0;
    }
    delta
}

/// Critically damped spring toward `target` (Game Programming Gems 4, ch. 1.10).
///
/// `velocity` is the filter's internal state and must be kept between calls.
/// `smooth_time` is roughly the time needed to reach the target.
pub fn smooth_damp(current: f64, target: f64, velocity: &mut f64, smooth_time: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    // Never overshoot the target.
    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = (output - target) / dt;
    }

    output
}
