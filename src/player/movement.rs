//! Run and jump.
//!
//! Horizontal speed eases toward `direction.x * run_speed`; the rate is high
//! on the ground with friction and lower in the air or while sliding.

use crate::input::{Action, InputSnapshot};
use crate::player::{Body2d, Player};
use crate::settings::{MovementSettings, Settings};
use bevy::prelude::*;

const GROUND_ACCELERATION: f32 = 80.0;
const AIR_ACCELERATION: f32 = 30.0;

fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// One frame of run/jump control on `body`.
///
/// # Arguments
/// * `body` - player body; run input needs `movement_active`, jumping needs `jumping_active`
/// * `direction_x` - move axis in `-1..=1`
/// * `jump` - jump performed this frame
/// * `settings` - run speed and jump velocity
/// * `dt` - frame time in seconds
pub fn movement_step(body: &mut Body2d, direction_x: f32, jump: bool, settings: &MovementSettings, dt: f32) {
    if body.movement_active {
        let target = direction_x.clamp(-1.0, 1.0) * settings.run_speed;
        let acceleration = if body.grounded && body.friction { GROUND_ACCELERATION } else { AIR_ACCELERATION };
        body.velocity.x = move_towards(body.velocity.x, target, acceleration * dt);
    }

    if jump && body.jumping_active && body.grounded {
        body.velocity.y = settings.jump_velocity;
        body.grounded = false;
    }
}

/// Run and jump from the input snapshot.
#[allow(clippy::needless_pass_by_value)]
pub fn player_movement(
    time: Res<Time>,
    input: Res<InputSnapshot>,
    settings: Res<Settings>,
    mut query: Query<&mut Body2d, With<Player>>,
) {
    let dt = time.delta_seconds();
    let jump = input.performed(Action::Jump);
    for mut body in &mut query {
        movement_step(&mut body, input.direction_raw.x, jump, &settings.movement, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_up_to_speed() {
        let settings = MovementSettings::default();
        let mut body = Body2d { grounded: true, ..Body2d::default() };
        for _ in 0..30 {
            movement_step(&mut body, 1.0, false, &settings, 1.0 / 60.0);
        }
        assert_eq!(body.velocity.x, settings.run_speed);
    }

    #[test]
    fn jumps_only_from_the_ground() {
        let settings = MovementSettings::default();
        let mut body = Body2d::default();
        movement_step(&mut body, 0.0, true, &settings, 0.016);
        assert_eq!(body.velocity.y, 0.0);

        body.grounded = true;
        movement_step(&mut body, 0.0, true, &settings, 0.016);
        assert_eq!(body.velocity.y, settings.jump_velocity);
        assert!(!body.grounded);
    }

    #[test]
    fn frozen_body_ignores_input() {
        let settings = MovementSettings::default();
        let mut body = Body2d { grounded: true, ..Body2d::default() };
        body.freeze();
        movement_step(&mut body, 1.0, true, &settings, 0.5);
        assert_eq!(body.velocity, Vec2::ZERO);
    }
}
