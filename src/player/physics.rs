//! Player body: gravity, impulses and ground contact.
//!
//! The level floor is a single horizontal line (`ground_y`); the body lands on
//! it and stays grounded until something moves it up again. Register
//! `player_physics` after the dash effects so impulses show up the same frame.

use crate::level::ActiveLevel;
use crate::player::Player;
use crate::settings::Settings;
use bevy::prelude::*;

pub const MAX_FALL_SPEED: f32 = 40.0;
/// Half extents of the player's box.
pub const PLAYER_HALF_SIZE: Vec2 = Vec2::new(0.4, 0.5);

/// Minimal rigid body for the player.
#[derive(Component, Debug, Clone)]
pub struct Body2d {
    pub velocity: Vec2,
    pub mass: f32,
    pub gravity_scale: f32,
    /// Gravity scale restored after a dash or hold.
    pub initial_gravity_scale: f32,
    pub grounded: bool,
    /// Run input is honoured.
    pub movement_active: bool,
    /// Jump input is honoured.
    pub jumping_active: bool,
    /// Ground friction; cleared when a hold runs out, back on landing.
    pub friction: bool,
}

impl Default for Body2d {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            mass: 1.0,
            gravity_scale: 1.0,
            initial_gravity_scale: 1.0,
            grounded: false,
            movement_active: true,
            jumping_active: true,
            friction: true,
        }
    }
}

impl Body2d {
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse / self.mass;
    }

    /// Stop dead and hang in place with control locked.
    pub fn freeze(&mut self) {
        self.velocity = Vec2::ZERO;
        self.gravity_scale = 0.0;
        self.movement_active = false;
        self.jumping_active = false;
    }

    pub fn restore(&mut self) {
        self.gravity_scale = self.initial_gravity_scale;
        self.movement_active = true;
        self.jumping_active = true;
    }
}

/// Step the body for one frame against a floor at `ground_y`.
///
/// # Arguments
/// * `position` - body center, moved in place
/// * `body` - velocity and contact state, updated in place
/// * `ground_y` - height of the floor surface
/// * `gravity` - downward acceleration before `gravity_scale`
/// * `dt` - frame time in seconds
pub fn physics_step(position: &mut Vec2, body: &mut Body2d, ground_y: f32, gravity: f32, dt: f32) {
    body.velocity.y -= gravity * body.gravity_scale * dt;
    body.velocity.y = body.velocity.y.max(-MAX_FALL_SPEED);

    let next = *position + body.velocity * dt;
    let floor = ground_y + PLAYER_HALF_SIZE.y;

    if next.y <= floor && body.velocity.y <= 0.0 {
        position.x = next.x;
        position.y = floor;
        body.velocity.y = 0.0;
        if !body.grounded {
            body.friction = true;
        }
        body.grounded = true;
    } else {
        *position = next;
        body.grounded = false;
    }
}

/// Integrate the player body against the active level's floor.
#[allow(clippy::needless_pass_by_value)]
pub fn player_physics(
    time: Res<Time>,
    level: Res<ActiveLevel>,
    settings: Res<Settings>,
    mut query: Query<(&mut Transform, &mut Body2d), With<Player>>,
) {
    let dt = time.delta_seconds();
    for (mut tf, mut body) in &mut query {
        let mut position = tf.translation.truncate();
        physics_step(&mut position, &mut body, level.ground_y(), settings.movement.gravity, dt);
        tf.translation.x = position.x;
        tf.translation.y = position.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_and_lands_on_the_floor() {
        let mut body = Body2d::default();
        let mut position = Vec2::new(0.0, 3.0);
        for _ in 0..120 {
            physics_step(&mut position, &mut body, 0.0, 30.0, 1.0 / 60.0);
        }
        assert!(body.grounded);
        assert_eq!(position.y, PLAYER_HALF_SIZE.y);
        assert_eq!(body.velocity.y, 0.0);
    }

    #[test]
    fn frozen_body_hangs() {
        let mut body = Body2d::default();
        body.velocity = Vec2::new(5.0, -3.0);
        body.freeze();
        let mut position = Vec2::new(1.0, 4.0);
        physics_step(&mut position, &mut body, 0.0, 30.0, 0.5);
        assert_eq!(position, Vec2::new(1.0, 4.0));
        assert!(!body.movement_active);

        body.restore();
        assert_eq!(body.gravity_scale, 1.0);
        assert!(body.jumping_active);
    }

    #[test]
    fn impulse_scales_with_mass() {
        let mut body = Body2d { mass: 2.0, ..Body2d::default() };
        body.apply_impulse(Vec2::new(10.0, 0.0));
        assert_eq!(body.velocity, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn landing_restores_friction() {
        let mut body = Body2d { friction: false, ..Body2d::default() };
        let mut position = Vec2::new(0.0, PLAYER_HALF_SIZE.y + 0.01);
        physics_step(&mut position, &mut body, 0.0, 30.0, 0.1);
        assert!(body.grounded);
        assert!(body.friction);
    }
}
