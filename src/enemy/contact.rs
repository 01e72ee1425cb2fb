//! Overlap checks between the player and hostiles.
//!
//! Everything is circle vs circle. The player carries a small body
//! [`Hitbox`] for damage and dash hits and a larger [`ParryRange`] for
//! choosing the parry target.
use bevy::prelude::*;

use crate::enemy::{Enemy, Hitbox, Projectile};
use crate::player::{Dash, HostileKind, Parry, ParryTarget, Player, PlayerDamaged};

/// Radius around the player inside which hostiles can be parried.
#[derive(Component, Debug, Clone, Copy)]
pub struct ParryRange {
    pub radius: f32,
}

impl Default for ParryRange {
    fn default() -> Self {
        Self { radius: 1.5 }
    }
}

type HostileItem<'a> = (Entity, &'a Transform, &'a Hitbox, Option<&'a Enemy>, Option<&'a Projectile>);

fn as_target((entity, _, _, enemy, projectile): &HostileItem<'_>) -> Option<ParryTarget> {
    match (enemy, projectile) {
        (Some(enemy), _) => Some(ParryTarget { entity: *entity, kind: HostileKind::Enemy, parriable: enemy.parriable }),
        (None, Some(p)) if !p.reflected => {
            Some(ParryTarget { entity: *entity, kind: HostileKind::Projectile, parriable: p.parriable })
        }
        _ => None,
    }
}

/// Keep each player's parry target in sync with what is inside parry range.
pub fn track_parry_targets(
    mut players: Query<(&Transform, &ParryRange, &mut Parry), With<Player>>,
    hostiles: Query<HostileItem<'_>, Without<Player>>,
) {
    for (tf, range, mut parry) in &mut players {
        let at = tf.translation.truncate();
        let in_range = |(_, hostile_tf, hitbox, ..): &HostileItem<'_>| {
            at.distance(hostile_tf.translation.truncate()) <= range.radius + hitbox.radius
        };

        if let Some(current) = parry.hostile() {
            match hostiles.get(current.entity) {
                Ok(item) if in_range(&item) => {
                    if let Some(target) = as_target(&item) {
                        parry.update_hostile(target);
                    } else {
                        parry.clear_hostile(current.entity);
                    }
                }
                _ => parry.clear_hostile(current.entity),
            }
        }

        if parry.hostile().is_none()
            && let Some(target) = hostiles.iter().filter(|item| in_range(item)).find_map(|item| as_target(&item))
        {
            parry.set_hostile(target);
        }
    }
}

/// Mid-dash contact damages the enemy and refunds dashes.
pub fn dash_hits(
    mut commands: Commands,
    mut players: Query<(&Transform, &Hitbox, &mut Dash), With<Player>>,
    mut enemies: Query<(Entity, &Transform, &Hitbox, &mut Enemy), Without<Player>>,
) {
    for (tf, body, mut dash) in &mut players {
        if !dash.is_dashing() || dash.is_damaged_dashing() {
            continue;
        }
        let at = tf.translation.truncate();
        for (entity, enemy_tf, hitbox, mut enemy) in &mut enemies {
            if !body.overlaps(at, hitbox, enemy_tf.translation.truncate()) {
                continue;
            }
            if dash.on_enemy_hit() {
                if enemy.damage(1) {
                    info!("Enemy {entity:?} defeated");
                    commands.entity(entity).despawn();
                }
                break;
            }
        }
    }
}

/// Touching an enemy outside a dash, or an unreflected projectile, hurts.
pub fn hostile_hits(
    mut commands: Commands,
    players: Query<(&Transform, &Hitbox, &Dash), With<Player>>,
    hostiles: Query<HostileItem<'_>, Without<Player>>,
    mut damaged: EventWriter<PlayerDamaged>,
) {
    for (tf, body, dash) in &players {
        let at = tf.translation.truncate();
        for (entity, hostile_tf, hitbox, enemy, projectile) in &hostiles {
            let hostile_at = hostile_tf.translation.truncate();
            if !body.overlaps(at, hitbox, hostile_at) {
                continue;
            }
            match (enemy, projectile) {
                (Some(enemy), _) if !dash.is_dashing() && enemy.stunned <= 0.0 => {
                    damaged.send(PlayerDamaged { source: hostile_at, amount: 1 });
                }
                (None, Some(p)) if !p.reflected => {
                    damaged.send(PlayerDamaged { source: hostile_at, amount: 1 });
                    commands.entity(entity).despawn();
                }
                _ => {}
            }
        }
    }
}

/// Reflected projectiles damage the enemies they touch.
pub fn reflected_hits(
    mut commands: Commands,
    projectiles: Query<(Entity, &Transform, &Hitbox, &Projectile)>,
    mut enemies: Query<(Entity, &Transform, &Hitbox, &mut Enemy), Without<Projectile>>,
) {
    for (entity, tf, hitbox, projectile) in &projectiles {
        if !projectile.reflected {
            continue;
        }
        let at = tf.translation.truncate();
        for (enemy_entity, enemy_tf, enemy_hitbox, mut enemy) in &mut enemies {
            if hitbox.overlaps(at, enemy_hitbox, enemy_tf.translation.truncate()) {
                if enemy.damage(1) {
                    info!("Enemy {enemy_entity:?} defeated by its own shot");
                    commands.entity(enemy_entity).despawn();
                }
                commands.entity(entity).despawn();
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{DashSettings, ParrySettings};

    fn player_at(app: &mut App, at: Vec3) -> Entity {
        app.world_mut()
            .spawn((
                Player::new(3, Vec2::ZERO),
                Transform::from_translation(at),
                Hitbox { radius: 0.5 },
                ParryRange::default(),
                Parry::new(&ParrySettings::default()),
                Dash::new(DashSettings::default()),
            ))
            .id()
    }

    #[test]
    fn nearest_hostile_becomes_parry_target_and_leaves() {
        let mut app = App::new();
        app.add_systems(Update, track_parry_targets);
        let player = player_at(&mut app, Vec3::ZERO);
        let enemy = app
            .world_mut()
            .spawn((Transform::from_xyz(1.0, 0.0, 0.0), Hitbox { radius: 0.5 }, Enemy::new(1, true)))
            .id();

        app.update();
        let target = app.world().get::<Parry>(player).unwrap().hostile();
        assert_eq!(target.map(|t| t.entity), Some(enemy));

        app.world_mut().get_mut::<Transform>(enemy).unwrap().translation.x = 10.0;
        app.update();
        assert_eq!(app.world().get::<Parry>(player).unwrap().hostile(), None);
    }

    #[test]
    fn touching_an_enemy_hurts_and_reflected_shots_do_not() {
        let mut app = App::new();
        app.add_event::<PlayerDamaged>().add_systems(Update, hostile_hits);
        player_at(&mut app, Vec3::ZERO);
        app.world_mut().spawn((Transform::from_xyz(0.5, 0.0, 0.0), Hitbox { radius: 0.5 }, Enemy::new(1, true)));
        app.world_mut().spawn((
            Transform::from_xyz(-0.5, 0.0, 0.0),
            Hitbox { radius: 0.2 },
            Projectile { velocity: Vec2::X, parriable: false, reflected: true, lifetime: 1.0 },
        ));

        app.update();
        assert_eq!(app.world().resource::<Events<PlayerDamaged>>().len(), 1);
    }

    #[test]
    fn dash_through_enemy_kills_it() {
        let mut app = App::new();
        app.add_systems(Update, dash_hits);
        let player = player_at(&mut app, Vec3::ZERO);
        app.world_mut()
            .get_mut::<Dash>(player)
            .unwrap()
            .apply_dash_force(false, Some(Vec2::X), 0.2, 5.0);
        let enemy = app
            .world_mut()
            .spawn((Transform::from_xyz(0.5, 0.0, 0.0), Hitbox { radius: 0.5 }, Enemy::new(1, true)))
            .id();

        app.update();
        assert!(app.world().get_entity(enemy).is_none());
        assert!(!app.world().get::<Dash>(player).unwrap().is_dashing());
    }
}
