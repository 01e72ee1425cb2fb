//! Enemies and their projectiles.
//!
//! An enemy walks its [`EnemyPath`] back and forth: forward until the path
//! runs out, then back over the materialized points to the start, and so on.
//! Random sections are grown lazily around the enemy and the player, so two
//! runs of the same level rarely look alike.
pub mod contact;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::path::{EnemyPath, PathContext, PathError, PathSectionConfig};
use crate::player::{HostileKind, HostileParried, Player};
use crate::settings::Settings;

pub use contact::*;

/// Seconds an enemy stays stunned after being parried.
pub const ENEMY_STUN_TIME: f32 = 1.0;
pub const PROJECTILE_RADIUS: f32 = 0.2;
pub const PROJECTILE_LIFETIME: f32 = 6.0;
const ARRIVAL_EPSILON: f32 = 1e-3;

/// Enemy as authored in a level file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyConfig {
    pub position: Vec2,
    #[serde(default = "EnemyConfig::default_hit_points")]
    pub hit_points: i32,
    #[serde(default = "EnemyConfig::default_speed")]
    pub speed: f32,
    #[serde(default = "EnemyConfig::default_parriable")]
    pub parriable: bool,
    #[serde(default = "EnemyConfig::default_radius")]
    pub radius: f32,
    /// Sections walked in order; empty means the enemy stands still.
    #[serde(default)]
    pub path: Vec<PathSectionConfig>,
    #[serde(default)]
    pub shooter: Option<ShooterConfig>,
}

impl EnemyConfig {
    fn default_hit_points() -> i32 { 3 }
    fn default_speed() -> f32 { 3.0 }
    fn default_parriable() -> bool { true }
    fn default_radius() -> f32 { 0.5 }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShooterConfig {
    #[serde(default = "ShooterConfig::default_interval")]
    pub interval: f32,
    #[serde(default = "ShooterConfig::default_projectile_speed")]
    pub projectile_speed: f32,
}

impl ShooterConfig {
    fn default_interval() -> f32 { 2.0 }
    fn default_projectile_speed() -> f32 { 8.0 }
}

#[derive(Component, Debug, Clone)]
pub struct Enemy {
    pub hit_points: i32,
    pub parriable: bool,
    /// Whether the level authored it as parriable at all.
    pub base_parriable: bool,
    /// Remaining stun in seconds.
    pub stunned: f32,
}

impl Enemy {
    #[must_use]
    pub fn new(hit_points: i32, parriable: bool) -> Self {
        Self { hit_points, parriable, base_parriable: parriable, stunned: 0.0 }
    }

    /// Returns whether the enemy died.
    pub fn damage(&mut self, amount: i32) -> bool {
        self.hit_points -= amount;
        self.hit_points <= 0
    }

    pub fn stun(&mut self) {
        self.stunned = ENEMY_STUN_TIME;
        self.parriable = false;
    }
}

/// Circular contact area.
#[derive(Component, Debug, Clone, Copy)]
pub struct Hitbox {
    pub radius: f32,
}

impl Hitbox {
    #[must_use]
    pub fn overlaps(&self, at: Vec2, other: &Hitbox, other_at: Vec2) -> bool {
        at.distance_squared(other_at) <= (self.radius + other.radius).powi(2)
    }
}

#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub velocity: Vec2,
    pub parriable: bool,
    /// Sent back by a parry; now hurts enemies instead of the player.
    pub reflected: bool,
    pub lifetime: f32,
}

#[derive(Component, Debug, Clone)]
pub struct Shooter {
    pub timer: Timer,
    pub projectile_speed: f32,
}

/// Walks an [`EnemyPath`] ping-pong style.
#[derive(Component, Debug, Clone)]
pub struct EnemyPathFollower {
    pub path: EnemyPath,
    pub speed: f32,
    pub forward: bool,
    pub target: Option<Vec2>,
}

impl EnemyPathFollower {
    #[must_use]
    pub fn new(path: EnemyPath, speed: f32) -> Self {
        Self { path, speed, forward: true, target: None }
    }

    /// Pick the next waypoint, turning around at either end.
    ///
    /// # Errors
    /// Propagates path errors; `PlacementExhausted` leaves the cursor as it
    /// was so the caller can retry next frame.
    pub fn advance<R: rand::Rng + ?Sized>(&mut self, ctx: &PathContext, rng: &mut R) -> Result<Option<Vec2>, PathError> {
        for _ in 0..2 {
            let next = if self.forward {
                self.path.next_point(ctx, rng)?.map(|p| p.position)
            } else {
                self.path.previous_point().map(|p| p.position)
            };
            if next.is_some() {
                self.target = next;
                return Ok(next);
            }
            self.forward = !self.forward;
        }
        self.target = None;
        Ok(None)
    }

    /// Move `position` toward the current waypoint. Returns whether it arrived.
    pub fn step(&self, position: &mut Vec2, dt: f32) -> bool {
        let Some(target) = self.target else { return true };
        let to_target = target - *position;
        let step = self.speed * dt;
        if to_target.length() <= step + ARRIVAL_EPSILON {
            *position = target;
            true
        } else {
            *position += to_target.normalize() * step;
            false
        }
    }
}

/// Spawn one enemy from its level description.
///
/// # Arguments
/// * `commands` - command buffer of the calling system
/// * `config` - position, stats, path sections and optional shooter
///
/// # Errors
/// Returns the path error when a section is misconfigured.
pub fn spawn_enemy(commands: &mut Commands, config: &EnemyConfig) -> Result<Entity, PathError> {
    let mut entity = commands.spawn((
        SpriteBundle {
            sprite: Sprite {
                color: Color::srgb(0.85, 0.25, 0.25),
                custom_size: Some(Vec2::splat(config.radius * 2.0)),
                ..default()
            },
            transform: Transform::from_translation(config.position.extend(0.5)),
            ..default()
        },
        Enemy::new(config.hit_points, config.parriable),
        Hitbox { radius: config.radius },
    ));
    if !config.path.is_empty() {
        let path = EnemyPath::from_configs(&config.path)?;
        entity.insert(EnemyPathFollower::new(path, config.speed));
    }
    if let Some(shooter) = &config.shooter {
        entity.insert(Shooter {
            timer: Timer::from_seconds(shooter.interval.max(0.1), TimerMode::Repeating),
            projectile_speed: shooter.projectile_speed,
        });
    }
    Ok(entity.id())
}

/// Walk each enemy toward its waypoint and pick the next one on arrival.
///
/// A failed random placement is retried next frame; any other path error
/// removes the follower and the enemy stands still.
#[allow(clippy::needless_pass_by_value)]
pub fn follow_enemy_paths(
    time: Res<Time>,
    mut commands: Commands,
    players: Query<&Transform, (With<Player>, Without<Enemy>)>,
    mut enemies: Query<(Entity, &mut Transform, &mut EnemyPathFollower, &Enemy)>,
) {
    let target = players.get_single().map(|tf| tf.translation.truncate()).unwrap_or_default();
    let dt = time.delta_seconds();
    let mut rng = rand::thread_rng();

    for (entity, mut tf, mut follower, enemy) in &mut enemies {
        if enemy.stunned > 0.0 {
            continue;
        }
        let mut position = tf.translation.truncate();
        if follower.step(&mut position, dt) {
            let ctx = PathContext { enemy: position, target };
            match follower.advance(&ctx, &mut rng) {
                Ok(_) => {}
                Err(PathError::PlacementExhausted { attempts }) => {
                    debug!("No free path point for {entity:?} after {attempts} attempts, retrying");
                }
                Err(e) => {
                    error!("Enemy {entity:?} path failed: {e}");
                    commands.entity(entity).remove::<EnemyPathFollower>();
                }
            }
        }
        tf.translation.x = position.x;
        tf.translation.y = position.y;
    }
}

/// Count down stuns and restore the authored parriable flag when one ends.
#[allow(clippy::needless_pass_by_value)]
pub fn recover_from_stun(time: Res<Time>, mut enemies: Query<&mut Enemy>) {
    let dt = time.delta_seconds();
    for mut enemy in &mut enemies {
        if enemy.stunned > 0.0 {
            enemy.stunned = (enemy.stunned - dt).max(0.0);
            if enemy.stunned == 0.0 {
                enemy.parriable = enemy.base_parriable;
            }
        }
    }
}

/// Fire at the player on each shooter's interval.
#[allow(clippy::needless_pass_by_value)]
pub fn shoot_projectiles(
    time: Res<Time>,
    mut commands: Commands,
    players: Query<&Transform, (With<Player>, Without<Shooter>)>,
    mut shooters: Query<(&Transform, &mut Shooter, &Enemy)>,
) {
    let Ok(player) = players.get_single() else { return };
    let target = player.translation.truncate();
    for (tf, mut shooter, enemy) in &mut shooters {
        if !shooter.timer.tick(time.delta()).just_finished() || enemy.stunned > 0.0 {
            continue;
        }
        let origin = tf.translation.truncate();
        let Some(direction) = (target - origin).try_normalize() else { continue };
        commands.spawn((
            SpriteBundle {
                sprite: Sprite {
                    color: Color::srgb(1.0, 0.6, 0.1),
                    custom_size: Some(Vec2::splat(PROJECTILE_RADIUS * 2.0)),
                    ..default()
                },
                transform: Transform::from_translation(origin.extend(0.6)),
                ..default()
            },
            Projectile {
                velocity: direction * shooter.projectile_speed,
                parriable: true,
                reflected: false,
                lifetime: PROJECTILE_LIFETIME,
            },
            Hitbox { radius: PROJECTILE_RADIUS },
        ));
    }
}

/// Fly projectiles in a straight line and despawn them when their lifetime ends.
#[allow(clippy::needless_pass_by_value)]
pub fn move_projectiles(
    time: Res<Time>,
    mut commands: Commands,
    mut projectiles: Query<(Entity, &mut Transform, &mut Projectile)>,
) {
    let dt = time.delta_seconds();
    for (entity, mut tf, mut projectile) in &mut projectiles {
        tf.translation += (projectile.velocity * dt).extend(0.0);
        projectile.lifetime -= dt;
        if projectile.lifetime <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}

/// React to parries: projectiles bounce back, enemies get stunned.
pub fn handle_parried(
    mut parried: EventReader<HostileParried>,
    mut enemies: Query<&mut Enemy>,
    mut projectiles: Query<(&mut Projectile, &mut Sprite)>,
) {
    for event in parried.read() {
        let entity = event.target.entity;
        match event.target.kind {
            HostileKind::Projectile => {
                if let Ok((mut projectile, mut sprite)) = projectiles.get_mut(entity) {
                    projectile.velocity = -projectile.velocity;
                    projectile.reflected = true;
                    projectile.parriable = false;
                    projectile.lifetime = PROJECTILE_LIFETIME;
                    sprite.color = Color::srgb(0.3, 0.9, 1.0);
                }
            }
            HostileKind::Enemy => {
                if let Ok(mut enemy) = enemies.get_mut(entity) {
                    enemy.stun();
                }
            }
        }
    }
}

/// Materialized path points and hitboxes.
#[allow(clippy::needless_pass_by_value)]
pub fn draw_enemy_gizmos(
    mut gizmos: Gizmos,
    settings: Res<Settings>,
    followers: Query<&EnemyPathFollower>,
    hitboxes: Query<(&Transform, &Hitbox)>,
) {
    if !settings.graphics.show_gizmos {
        return;
    }
    for follower in &followers {
        for section in follower.path.sections() {
            let points = section.materialized();
            gizmos.linestrip_2d(points.iter().map(|p| p.position), Color::srgb(0.9, 0.3, 0.3));
            for point in points {
                gizmos.circle_2d(point.position, 0.1, Color::srgb(0.9, 0.3, 0.3));
            }
        }
        if let Some(target) = follower.target {
            gizmos.circle_2d(target, 0.2, Color::WHITE);
        }
    }
    for (tf, hitbox) in &hitboxes {
        gizmos.circle_2d(tf.translation.truncate(), hitbox.radius, Color::srgb(0.2, 0.9, 0.2));
    }
}
