//! Dash and post-dash hold.
//!
//! `Dash` is a plain state machine driven once per frame by [`Dash::tick`].
//! It never touches the body directly: every physical consequence is queued
//! as a [`DashEffect`] and applied by `apply_dash_effects`, which also turns
//! count changes into [`DashCountChanged`] events.
//!
//! Phases: `Idle` -> `Dashing` (fixed duration) -> `Holding` (clinging in
//! place, optionally timed) -> `Idle`. Touching the ground while idle refills
//! the dash pool.
use bevy::prelude::*;

use crate::input::{Action, InputSnapshot};
use crate::player::{Body2d, DashCountChanged, Player, aiming_direction};
use crate::settings::{DashSettings, Settings};

/// Duration of a knock-back dash when the player gets hit.
pub const DAMAGE_DASH_TIME: f32 = 0.1;
/// Distance of a knock-back dash when the player gets hit.
pub const DAMAGE_DASH_DISTANCE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DashEffect {
    /// Add this velocity change.
    Impulse(Vec2),
    /// Zero velocity and gravity and lock out movement and jumping.
    Freeze,
    /// Zero velocity only.
    Halt,
    /// Restore gravity and hand control back to movement.
    Restore,
    /// Let the body slide.
    RemoveFriction,
    /// Dash pool changed; carries the new count.
    CountChanged(i32),
    Played(DashSound),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashSound {
    Dash,
    EnemyHit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DashPhase {
    Idle,
    Dashing {
        elapsed: f32,
        duration: f32,
        /// Knock-back dash after taking damage; cannot hit enemies.
        damaged: bool,
        /// Started by gameplay code rather than by the dash input.
        forced: bool,
    },
    Holding { elapsed: f32 },
}

/// Per-frame inputs to [`Dash::tick`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DashInput {
    pub dash: bool,
    pub jump: bool,
    pub aim: Option<Vec2>,
    pub grounded: bool,
    pub mass: f32,
    pub gravity_scale: f32,
    pub dt: f32,
}

#[derive(Component, Debug, Clone)]
pub struct Dash {
    pub settings: DashSettings,
    dashes_left: i32,
    phase: DashPhase,
    /// A hold follows the dash that just ended.
    hold_pending: bool,
    pending: Vec<DashEffect>,
}

/// Velocity that covers `distance` in `time` without acceleration.
#[must_use]
pub fn initial_velocity_no_acceleration(distance: f32, time: f32) -> f32 {
    distance / time
}

/// Launch velocity that covers `distance` in `time` against gravity `mass * gravity_scale`.
#[must_use]
pub fn initial_velocity(distance: f32, time: f32, mass: f32, gravity_scale: f32) -> f32 {
    let acceleration = mass * gravity_scale;
    distance / time + 0.5 * acceleration * time
}

impl Dash {
    /// New dash with a full pool.
    #[must_use]
    pub fn new(settings: DashSettings) -> Self {
        let settings = settings.sanitized();
        let mut dash = Self {
            dashes_left: 0,
            phase: DashPhase::Idle,
            hold_pending: false,
            pending: Vec::new(),
            settings,
        };
        dash.alter_dash_count(dash.settings.count);
        dash
    }

    #[must_use]
    pub fn dashes_left(&self) -> i32 {
        self.dashes_left
    }

    #[must_use]
    pub fn phase(&self) -> DashPhase {
        self.phase
    }

    #[must_use]
    pub fn is_dashing(&self) -> bool {
        matches!(self.phase, DashPhase::Dashing { .. })
    }

    #[must_use]
    pub fn is_damaged_dashing(&self) -> bool {
        matches!(self.phase, DashPhase::Dashing { damaged: true, .. })
    }

    #[must_use]
    pub fn is_holding(&self) -> bool {
        matches!(self.phase, DashPhase::Holding { .. })
    }

    pub fn alter_dash_count(&mut self, delta: i32) {
        self.dashes_left += delta;
        self.pending.push(DashEffect::CountChanged(self.dashes_left));
    }

    /// Take the effects queued since the last call.
    pub fn drain_effects(&mut self) -> Vec<DashEffect> {
        std::mem::take(&mut self.pending)
    }

    /// Advance one frame.
    ///
    /// # Arguments
    /// * `input` - buttons, aim and body state for this frame
    ///
    /// Physical results are queued; collect them with [`drain_effects`](Self::drain_effects).
    pub fn tick(&mut self, input: &DashInput) {
        if input.dash && !self.is_dashing() {
            self.start_dash(input.aim);
        }

        if let DashPhase::Dashing { elapsed, duration, .. } = &mut self.phase {
            *elapsed += input.dt;
            if *elapsed >= *duration {
                self.stop_dash();
            }
        }

        if self.hold_pending {
            self.hold(input);
        }

        if input.grounded && self.phase == DashPhase::Idle && self.dashes_left < self.settings.count {
            self.alter_dash_count(self.settings.count - self.dashes_left);
        }
    }

    fn start_dash(&mut self, aim: Option<Vec2>) {
        if self.dashes_left <= 0 {
            return;
        }
        let Some(direction) = aim else {
            self.abort_dash();
            return;
        };
        self.stop_holding(false);

        self.phase = DashPhase::Dashing {
            elapsed: 0.0,
            duration: self.settings.time,
            damaged: false,
            forced: false,
        };
        self.alter_dash_count(-1);
        self.pending.push(DashEffect::Freeze);
        let speed = initial_velocity_no_acceleration(self.settings.distance, self.settings.time);
        self.pending.push(DashEffect::Impulse(direction * speed));
        self.pending.push(DashEffect::Played(DashSound::Dash));
    }

    /// Dash started by gameplay code (e.g. knock-back). Ignored while another
    /// forced dash is running or without a direction. A knock-back does not
    /// use up the pool.
    pub fn apply_dash_force(&mut self, is_damage_dash: bool, direction: Option<Vec2>, time: f32, distance: f32) {
        let Some(direction) = direction else { return };
        if matches!(self.phase, DashPhase::Dashing { forced: true, .. }) {
            return;
        }
        if !is_damage_dash {
            self.alter_dash_count(-1);
            self.pending.push(DashEffect::Played(DashSound::Dash));
        }
        self.stop_holding(false);
        self.phase = DashPhase::Dashing {
            elapsed: 0.0,
            duration: time,
            damaged: is_damage_dash,
            forced: true,
        };
        self.pending.push(DashEffect::Freeze);
        self.pending.push(DashEffect::Impulse(direction * initial_velocity_no_acceleration(distance, time)));
    }

    /// End the current dash and arm the hold that follows it.
    pub fn stop_dash(&mut self) {
        self.pending.push(DashEffect::Halt);
        self.phase = DashPhase::Idle;
        self.hold_pending = true;
    }

    /// Cancel a dash request without arming a hold.
    pub fn abort_dash(&mut self) {
        if self.is_dashing() {
            self.phase = DashPhase::Idle;
        }
    }

    /// Dash hit an enemy. Returns whether the hit counts; a counting hit ends
    /// the dash and gives back `restored_dashes`.
    pub fn on_enemy_hit(&mut self) -> bool {
        if !self.is_dashing() || self.is_damaged_dashing() {
            return false;
        }
        self.stop_dash();
        self.alter_dash_count(self.settings.restored_dashes);
        self.pending.push(DashEffect::Played(DashSound::EnemyHit));
        true
    }

    fn hold(&mut self, input: &DashInput) {
        if !self.is_holding() {
            self.phase = DashPhase::Holding { elapsed: 0.0 };
            self.pending.push(DashEffect::Freeze);
        }

        let mut expired = false;
        if let DashPhase::Holding { elapsed } = &mut self.phase
            && self.settings.hold_time > 0.0
        {
            *elapsed += input.dt;
            expired = *elapsed >= self.settings.hold_time;
        }

        if input.jump {
            let speed = initial_velocity(
                self.settings.hold_jump_distance,
                self.settings.hold_jump_time,
                input.mass,
                input.gravity_scale,
            );
            self.pending.push(DashEffect::Impulse(Vec2::Y * speed));
            self.stop_holding(true);
        } else if expired {
            self.stop_holding(true);
            self.pending.push(DashEffect::RemoveFriction);
        }
    }

    /// Leave the hold, optionally handing control back to movement.
    pub fn stop_holding(&mut self, restore_movement: bool) {
        if restore_movement {
            self.pending.push(DashEffect::Restore);
        }
        self.hold_pending = false;
        if self.is_holding() {
            self.phase = DashPhase::Idle;
        }
    }

    /// Reload tuning without touching the current phase.
    pub fn set_settings(&mut self, settings: &DashSettings) {
        self.settings = settings.sanitized();
    }
}

/// Feed input and body state into each player's [`Dash`].
#[allow(clippy::needless_pass_by_value)]
pub fn player_dash(
    time: Res<Time>,
    input: Res<InputSnapshot>,
    mut query: Query<(&Transform, &Body2d, &mut Dash), With<Player>>,
) {
    for (tf, body, mut dash) in &mut query {
        let dash_pressed = input.performed(Action::Dash);
        dash.tick(&DashInput {
            dash: dash_pressed,
            jump: input.performed(Action::Jump),
            aim: if dash_pressed { aiming_direction(&input, tf.translation.truncate()) } else { None },
            grounded: body.grounded,
            mass: body.mass,
            // freeze() zeroes gravity_scale while holding; the hold jump needs the real one
            gravity_scale: body.initial_gravity_scale,
            dt: time.delta_seconds(),
        });
    }
}

/// Vector a dash started now would cover, or `None` without an aim.
///
/// # Arguments
/// * `dash` - The player's dash state; only its `distance` tuning is read.
/// * `input` - Snapshot used to resolve the aim.
/// * `position` - Player position in world units.
#[must_use]
pub fn dash_reach(dash: &Dash, input: &InputSnapshot, position: Vec2) -> Option<Vec2> {
    aiming_direction(input, position).map(|direction| direction * dash.settings.distance)
}

/// Draw the dash reach from each player toward the current aim.
#[allow(clippy::needless_pass_by_value)]
pub fn draw_dash_gizmos(
    mut gizmos: Gizmos,
    settings: Res<Settings>,
    input: Res<InputSnapshot>,
    players: Query<(&Transform, &Dash), With<Player>>,
) {
    if !settings.graphics.show_gizmos {
        return;
    }
    for (tf, dash) in &players {
        let position = tf.translation.truncate();
        if let Some(reach) = dash_reach(dash, &input, position) {
            gizmos.ray_2d(position, reach, Color::srgb(0.2, 0.9, 0.3));
        }
    }
}

/// Apply queued dash effects to the body and publish count changes.
pub fn apply_dash_effects(
    mut query: Query<(&mut Dash, &mut Body2d)>,
    mut count_changed: EventWriter<DashCountChanged>,
) {
    for (mut dash, mut body) in &mut query {
        for effect in dash.drain_effects() {
            match effect {
                DashEffect::Impulse(dv) => body.apply_impulse(dv),
                DashEffect::Freeze => body.freeze(),
                DashEffect::Halt => body.velocity = Vec2::ZERO,
                DashEffect::Restore => body.restore(),
                DashEffect::RemoveFriction => body.friction = false,
                DashEffect::CountChanged(dashes_left) => {
                    count_changed.send(DashCountChanged { dashes_left });
                }
                DashEffect::Played(sound) => debug!("Dash sound {sound:?}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DashSettings {
        DashSettings {
            count: 2,
            distance: 4.0,
            time: 0.2,
            hold_time: 0.5,
            hold_jump_distance: 2.0,
            hold_jump_time: 0.5,
            restored_dashes: 1,
        }
    }

    fn frame(dt: f32) -> DashInput {
        DashInput { dt, mass: 1.0, gravity_scale: 1.0, ..DashInput::default() }
    }

    #[test]
    fn new_dash_starts_with_a_full_pool() {
        let mut dash = Dash::new(settings());
        assert_eq!(dash.dashes_left(), 2);
        assert_eq!(dash.drain_effects(), vec![DashEffect::CountChanged(2)]);
        assert!(dash.drain_effects().is_empty());
    }

    #[test]
    fn dash_applies_impulse_then_holds() {
        let mut dash = Dash::new(settings());
        dash.drain_effects();

        dash.tick(&DashInput { dash: true, aim: Some(Vec2::X), ..frame(0.1) });
        assert!(dash.is_dashing());
        assert_eq!(dash.dashes_left(), 1);
        assert_eq!(
            dash.drain_effects(),
            vec![
                DashEffect::CountChanged(1),
                DashEffect::Freeze,
                DashEffect::Impulse(Vec2::new(20.0, 0.0)),
                DashEffect::Played(DashSound::Dash),
            ]
        );

        dash.tick(&frame(0.1));
        assert!(dash.is_holding());
        assert_eq!(dash.drain_effects(), vec![DashEffect::Halt, DashEffect::Freeze]);
    }

    #[test]
    fn hold_expires_and_removes_friction() {
        let mut dash = Dash::new(settings());
        dash.tick(&DashInput { dash: true, aim: Some(Vec2::X), ..frame(0.2) });
        assert!(dash.is_holding());
        dash.drain_effects();

        dash.tick(&frame(0.2));
        assert!(dash.is_holding());
        dash.tick(&frame(0.2));
        assert_eq!(dash.phase(), DashPhase::Idle);
        assert_eq!(dash.drain_effects(), vec![DashEffect::Restore, DashEffect::RemoveFriction]);
    }

    #[test]
    fn infinite_hold_waits_for_jump() {
        let mut dash = Dash::new(DashSettings { hold_time: -1.0, ..settings() });
        dash.tick(&DashInput { dash: true, aim: Some(Vec2::Y), ..frame(0.2) });
        for _ in 0..100 {
            dash.tick(&frame(0.5));
        }
        assert!(dash.is_holding());
        dash.drain_effects();

        dash.tick(&DashInput { jump: true, ..frame(0.016) });
        assert_eq!(dash.phase(), DashPhase::Idle);
        // 2 / 0.5 + 0.5 * 1 * 1 * 0.5
        assert_eq!(dash.drain_effects(), vec![DashEffect::Impulse(Vec2::new(0.0, 4.25)), DashEffect::Restore]);
    }

    #[test]
    fn no_aim_means_no_dash() {
        let mut dash = Dash::new(settings());
        dash.drain_effects();
        dash.tick(&DashInput { dash: true, aim: None, ..frame(0.016) });
        assert_eq!(dash.phase(), DashPhase::Idle);
        assert_eq!(dash.dashes_left(), 2);
        assert!(dash.drain_effects().is_empty());
    }

    #[test]
    fn empty_pool_blocks_dash_until_grounded() {
        let mut dash = Dash::new(DashSettings { count: 1, hold_time: 0.1, ..settings() });
        dash.tick(&DashInput { dash: true, aim: Some(Vec2::X), ..frame(0.2) });
        dash.tick(&frame(0.2));
        assert_eq!(dash.phase(), DashPhase::Idle);
        assert_eq!(dash.dashes_left(), 0);

        dash.tick(&DashInput { dash: true, aim: Some(Vec2::X), ..frame(0.016) });
        assert!(!dash.is_dashing());

        dash.tick(&DashInput { grounded: true, ..frame(0.016) });
        assert_eq!(dash.dashes_left(), 1);
    }

    #[test]
    fn enemy_hit_restores_dashes_once() {
        let mut dash = Dash::new(settings());
        dash.tick(&DashInput { dash: true, aim: Some(Vec2::X), ..frame(0.05) });
        assert!(dash.on_enemy_hit());
        assert_eq!(dash.dashes_left(), 2);
        assert!(!dash.on_enemy_hit());
    }

    #[test]
    fn damage_dash_is_free_and_harmless() {
        let mut dash = Dash::new(settings());
        dash.drain_effects();
        dash.apply_dash_force(true, Some(Vec2::NEG_X), DAMAGE_DASH_TIME, DAMAGE_DASH_DISTANCE);
        assert!(dash.is_damaged_dashing());
        assert_eq!(dash.dashes_left(), 2);
        assert!(!dash.on_enemy_hit());

        // a second forced dash is ignored while the first runs
        dash.apply_dash_force(false, Some(Vec2::X), 0.2, 5.0);
        assert_eq!(dash.dashes_left(), 2);
        assert!(dash.is_damaged_dashing());
    }

    #[test]
    fn hold_jump_from_a_frozen_body_keeps_gravity() {
        let mut app = App::new();
        app.init_resource::<Time>()
            .init_resource::<InputSnapshot>()
            .add_event::<DashCountChanged>()
            .add_systems(Update, (player_dash, apply_dash_effects).chain());
        let body = Body2d { mass: 1.0, gravity_scale: 1.0, initial_gravity_scale: 1.0, ..Body2d::default() };
        let player = app
            .world_mut()
            .spawn((
                Transform::default(),
                Player::new(3, Vec2::ZERO),
                body,
                Dash::new(DashSettings { hold_time: -1.0, ..settings() }),
            ))
            .id();

        {
            let mut input = app.world_mut().resource_mut::<InputSnapshot>();
            input.using_gamepad = true;
            input.aim = Vec2::Y;
            input.set_performed(Action::Dash, true);
        }
        app.update();
        app.world_mut().resource_mut::<InputSnapshot>().set_performed(Action::Dash, false);
        app.world_mut().get_mut::<Dash>(player).unwrap().stop_dash();
        app.update();
        assert!(app.world().get::<Dash>(player).unwrap().is_holding());
        assert_eq!(app.world().get::<Body2d>(player).unwrap().gravity_scale, 0.0);

        app.world_mut().resource_mut::<InputSnapshot>().set_performed(Action::Jump, true);
        app.update();
        let body = app.world().get::<Body2d>(player).unwrap();
        // 2 / 0.5 + 0.5 * 1 * 1 * 0.5
        assert_eq!(body.velocity, Vec2::new(0.0, 4.25));
        assert_eq!(body.gravity_scale, 1.0);
    }

    #[test]
    fn reach_follows_the_aim() {
        let dash = Dash::new(settings());
        let mut input = InputSnapshot::default();
        input.using_gamepad = true;
        assert_eq!(dash_reach(&dash, &input, Vec2::ZERO), None);
        input.aim = Vec2::NEG_Y;
        assert_eq!(dash_reach(&dash, &input, Vec2::new(3.0, 3.0)), Some(Vec2::new(0.0, -4.0)));
    }

    #[test]
    fn kinematics() {
        assert_eq!(initial_velocity_no_acceleration(6.0, 0.5), 12.0);
        assert_eq!(initial_velocity(6.0, 0.5, 2.0, 0.0), 12.0);
        assert_eq!(initial_velocity(6.0, 0.5, 2.0, 4.0), 14.0);
    }
}
