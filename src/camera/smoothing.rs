/// Critically damped spring toward `target` (Game Programming Gems 4, 1.10).
///
/// The result never overshoots `target`.
///
/// # Arguments
/// * `current` - current value
/// * `target` - value to approach
/// * `velocity` - state carried between calls; the caller keeps it
/// * `smooth_time` - approximate time to reach the target, in seconds
/// * `dt` - elapsed time since the last call
#[must_use]
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
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

    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = (output - target) / dt;
    }
    output
}
