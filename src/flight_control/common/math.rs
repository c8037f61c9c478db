use num::Float;

/// Wraps an angle given in degrees into the half-open interval `(-180, 180]`.
///
/// # Arguments
/// - `deg`: The angle in degrees, any magnitude.
///
/// # Returns
/// - The equivalent angle in `(-180, 180]`.
pub fn wrap_deg<T: Float>(deg: T) -> T {
    let full = T::from(360.0).unwrap_or_else(T::zero);
    let half = T::from(180.0).unwrap_or_else(T::zero);
    let mut wrapped = deg % full;
    if wrapped > half {
        wrapped = wrapped - full;
    } else if wrapped <= -half {
        wrapped = wrapped + full;
    }
    wrapped
}

/// Linear interpolation from `from` toward `to`, with `t` clamped into `[0, 1]`.
pub fn lerp_clamped<T: Float>(from: T, to: T, t: T) -> T {
    let t_c = t.max(T::zero()).min(T::one());
    from + (to - from) * t_c
}

/// Applies `delta` to `value` without crossing `bound`.
///
/// If `value` already sits on the far side of `bound`, the step is still not allowed
/// to carry it past `bound` in the other direction.
///
/// # Arguments
/// - `value`: The current value.
/// - `delta`: The signed step to apply.
/// - `bound`: The value the step approaches but never passes.
///
/// # Returns
/// - `value + delta`, or `bound` if the step would overshoot.
pub fn approach<T: Float>(value: T, delta: T, bound: T) -> T {
    let next = value + delta;
    let before = value - bound;
    let after = next - bound;
    if before.is_zero() || (before.signum() != after.signum() && !after.is_zero()) {
        bound
    } else {
        next
    }
}
