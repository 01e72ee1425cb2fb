//! Player components, events and systems (movement, physics, dash, parry).
//!
//! Gameplay state changes are published as events so the HUD never reaches
//! into player components:
//!
//! - [`HitPointsChanged`] after damage, respawn and on spawn
//! - [`DashCountChanged`] whenever the dash pool changes
//! - [`PlayerStateChanged`] when the displayed state (animation) changes
//! - [`ParryPerformed`] on every non-spam parry press
//!
//! # Example:
//!
//! ```ignore
//! let player = spawn_player(&mut commands, level.player_spawn, &settings);
//! app.add_systems(Update, (player_movement, player_dash, parry_system, apply_dash_effects, player_physics).chain());
//! ```
pub mod aim;
pub mod dash;
pub mod movement;
pub mod parry;
pub mod physics;

use bevy::prelude::*;

pub use aim::*;
pub use dash::*;
pub use movement::*;
pub use parry::*;
pub use physics::*;

use crate::settings::Settings;

pub const DEFAULT_HIT_POINTS: i32 = 5;
/// Seconds of immunity after taking damage.
pub const INVULNERABLE_TIME: f32 = 1.0;

#[derive(Component, Debug, Clone)]
pub struct Player {
    pub hit_points: i32,
    pub max_hit_points: i32,
    pub spawn: Vec2,
    /// Remaining immunity in seconds.
    pub invulnerable: f32,
}

impl Player {
    #[must_use]
    pub fn new(max_hit_points: i32, spawn: Vec2) -> Self {
        Self { hit_points: max_hit_points, max_hit_points, spawn, invulnerable: 0.0 }
    }

    /// Apply damage unless immune. Returns whether it landed.
    pub fn damage(&mut self, amount: i32) -> bool {
        if self.invulnerable > 0.0 || amount <= 0 {
            return false;
        }
        self.hit_points = (self.hit_points - amount).max(0);
        self.invulnerable = INVULNERABLE_TIME;
        true
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.hit_points <= 0
    }
}

/// What the player is visibly doing; shown on the HUD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Idle,
    Run,
    Jump,
    Fall,
    Dash,
    Hold,
    Parry,
    Hurt,
}

impl PlayerState {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PlayerState::Idle => "Idle",
            PlayerState::Run => "Run",
            PlayerState::Jump => "Jump",
            PlayerState::Fall => "Fall",
            PlayerState::Dash => "Dash",
            PlayerState::Hold => "Hold",
            PlayerState::Parry => "Parry",
            PlayerState::Hurt => "Hurt",
        }
    }

    /// Pick the state to show, most specific first.
    #[must_use]
    pub fn resolve(body: &Body2d, dash: &Dash, parry: &Parry) -> Self {
        if dash.is_damaged_dashing() {
            PlayerState::Hurt
        } else if dash.is_dashing() {
            PlayerState::Dash
        } else if dash.is_holding() {
            PlayerState::Hold
        } else if parry.is_flashing() {
            PlayerState::Parry
        } else if !body.grounded {
            if body.velocity.y > 0.0 { PlayerState::Jump } else { PlayerState::Fall }
        } else if body.velocity.x.abs() > 0.1 {
            PlayerState::Run
        } else {
            PlayerState::Idle
        }
    }
}

/// Last state published through [`PlayerStateChanged`]; `None` until the first frame.
#[derive(Component, Debug, Default)]
pub struct PlayerAnimation {
    pub state: Option<PlayerState>,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct HitPointsChanged {
    pub hit_points: i32,
    pub max_hit_points: i32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct DashCountChanged {
    pub dashes_left: i32,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerStateChanged {
    pub state: PlayerState,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct ParryPerformed;

/// Something hostile touched the player.
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerDamaged {
    pub source: Vec2,
    pub amount: i32,
}

#[derive(Event, Debug, Clone, Copy, Default)]
pub struct RespawnRequested;

/// Spawn the player with full hit points at `spawn`.
///
/// # Arguments
/// * `commands` - command buffer of the calling system
/// * `spawn` - spawn and respawn position
/// * `settings` - dash and parry tuning for the new components
pub fn spawn_player(commands: &mut Commands, spawn: Vec2, settings: &Settings) -> Entity {
    commands
        .spawn((
            SpriteBundle {
                sprite: Sprite {
                    color: Color::srgb(0.9, 0.9, 0.95),
                    custom_size: Some(PLAYER_HALF_SIZE * 2.0),
                    ..default()
                },
                transform: Transform::from_translation(spawn.extend(1.0)),
                ..default()
            },
            Player::new(DEFAULT_HIT_POINTS, spawn),
            Body2d::default(),
            Dash::new(settings.dash.clone()),
            Parry::new(&settings.parry),
            PlayerAnimation::default(),
        ))
        .id()
}

/// Publish hit points for freshly spawned players.
pub fn announce_new_players(players: Query<&Player, Added<Player>>, mut hit_points: EventWriter<HitPointsChanged>) {
    for player in &players {
        hit_points.send(HitPointsChanged { hit_points: player.hit_points, max_hit_points: player.max_hit_points });
    }
}

/// Wear off post-hit immunity.
#[allow(clippy::needless_pass_by_value)]
pub fn tick_invulnerability(time: Res<Time>, mut players: Query<&mut Player>) {
    let dt = time.delta_seconds();
    for mut player in &mut players {
        player.invulnerable = (player.invulnerable - dt).max(0.0);
    }
}

/// Apply [`PlayerDamaged`]: lose hit points, get knocked away from the
/// source, respawn on death.
pub fn damage_player(
    mut damaged: EventReader<PlayerDamaged>,
    mut players: Query<(&mut Player, &Transform, &mut Dash)>,
    mut hit_points: EventWriter<HitPointsChanged>,
    mut respawn: EventWriter<RespawnRequested>,
) {
    for hit in damaged.read() {
        for (mut player, tf, mut dash) in &mut players {
            if !player.damage(hit.amount) {
                continue;
            }
            info!("Player hit, {} hit points left", player.hit_points);
            hit_points.send(HitPointsChanged { hit_points: player.hit_points, max_hit_points: player.max_hit_points });

            let away = (tf.translation.truncate() - hit.source).normalize_or_zero();
            let direction = (away + Vec2::Y * 0.5).try_normalize().unwrap_or(Vec2::Y);
            dash.apply_dash_force(true, Some(direction), DAMAGE_DASH_TIME, DAMAGE_DASH_DISTANCE);

            if player.is_dead() {
                respawn.send(RespawnRequested);
            }
        }
    }
}

/// Put the player back at the spawn point with full health and dashes.
#[allow(clippy::needless_pass_by_value)]
pub fn respawn_player(
    mut requests: EventReader<RespawnRequested>,
    settings: Res<Settings>,
    mut players: Query<(&mut Player, &mut Transform, &mut Body2d, &mut Dash, &mut Parry)>,
    mut hit_points: EventWriter<HitPointsChanged>,
    mut virtual_time: ResMut<Time<Virtual>>,
) {
    if requests.read().count() == 0 {
        return;
    }
    for (mut player, mut tf, mut body, mut dash, mut parry) in &mut players {
        player.hit_points = player.max_hit_points;
        player.invulnerable = 0.0;
        tf.translation.x = player.spawn.x;
        tf.translation.y = player.spawn.y;
        *body = Body2d::default();
        *dash = Dash::new(settings.dash.clone());
        *parry = Parry::new(&settings.parry);
        virtual_time.set_relative_speed(1.0);
        info!("Player respawned at {}", player.spawn);
        hit_points.send(HitPointsChanged { hit_points: player.hit_points, max_hit_points: player.max_hit_points });
    }
}

/// Publish [`PlayerStateChanged`] when the resolved state differs from the last one.
pub fn update_player_state(
    mut players: Query<(&Body2d, &Dash, &Parry, &mut PlayerAnimation)>,
    mut changed: EventWriter<PlayerStateChanged>,
) {
    for (body, dash, parry, mut animation) in &mut players {
        let state = PlayerState::resolve(body, dash, parry);
        if animation.state != Some(state) {
            animation.state = Some(state);
            changed.send(PlayerStateChanged { state });
        }
    }
}

/// Push hot-reloaded dash and parry tuning into the live components.
#[allow(clippy::needless_pass_by_value)]
pub fn apply_settings_changes(settings: Res<Settings>, mut players: Query<(&mut Dash, &mut Parry)>) {
    if !settings.is_changed() || settings.is_added() {
        return;
    }
    for (mut dash, mut parry) in &mut players {
        dash.set_settings(&settings.dash);
        parry.set_settings(&settings.parry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DashSettings, ParrySettings};

    #[test]
    fn damage_respects_immunity() {
        let mut player = Player::new(3, Vec2::ZERO);
        assert!(player.damage(1));
        assert!(!player.damage(1));
        assert_eq!(player.hit_points, 2);
        player.invulnerable = 0.0;
        assert!(player.damage(5));
        assert_eq!(player.hit_points, 0);
        assert!(player.is_dead());
    }

    #[test]
    fn state_prefers_dash_over_motion() {
        let mut dash = Dash::new(DashSettings::default());
        let parry = Parry::new(&ParrySettings::default());
        let mut body = Body2d { grounded: true, ..Body2d::default() };
        assert_eq!(PlayerState::resolve(&body, &dash, &parry), PlayerState::Idle);

        body.velocity.x = 3.0;
        assert_eq!(PlayerState::resolve(&body, &dash, &parry), PlayerState::Run);

        body.grounded = false;
        body.velocity.y = -1.0;
        assert_eq!(PlayerState::resolve(&body, &dash, &parry), PlayerState::Fall);

        dash.apply_dash_force(false, Some(Vec2::X), 0.2, 5.0);
        assert_eq!(PlayerState::resolve(&body, &dash, &parry), PlayerState::Dash);
    }

    #[test]
    fn damage_event_updates_hit_points_and_knocks_back() {
        let mut app = App::new();
        app.add_event::<PlayerDamaged>()
            .add_event::<HitPointsChanged>()
            .add_event::<RespawnRequested>()
            .add_systems(Update, damage_player);
        let player = app
            .world_mut()
            .spawn((
                Player::new(2, Vec2::ZERO),
                Transform::from_xyz(1.0, 0.0, 0.0),
                Dash::new(DashSettings::default()),
            ))
            .id();

        app.world_mut().send_event(PlayerDamaged { source: Vec2::ZERO, amount: 1 });
        app.update();

        let world = app.world();
        assert_eq!(world.get::<Player>(player).unwrap().hit_points, 1);
        assert!(world.get::<Dash>(player).unwrap().is_damaged_dashing());
        let events = world.resource::<Events<HitPointsChanged>>();
        assert_eq!(events.len(), 1);
    }
}
