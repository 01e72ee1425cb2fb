//! Level loading, spawning and hot reload.
//!
//! Unlike settings, a level that fails to load at startup is fatal. A bad
//! edit during hot reload is only logged and the running level is kept.
use std::path::{Path, PathBuf};

use bevy::prelude::*;

use crate::camera::{PanningCamera, spawn_panning_camera};
use crate::enemy::{Enemy, Projectile, spawn_enemy};
use crate::level::{ActiveLevel, LevelData, LevelError};
use crate::player::{Player, RespawnRequested, spawn_player};
use crate::ron::{RonWatcher, setup_ron_watcher};
use crate::settings::Settings;

pub const LEVELS_DIR: &str = "data/levels";

#[derive(Resource)]
pub struct LevelWatcher(pub RonWatcher);

impl LevelWatcher {
    #[must_use]
    pub fn stub() -> Self {
        LevelWatcher(RonWatcher::stub())
    }
}

/// Read and validate a single level file.
///
/// # Arguments
/// * `path` - a `.ron` file holding one `LevelData`
///
/// # Errors
/// IO, parse and validation failures.
pub fn load_level(path: &Path) -> Result<LevelData, LevelError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| LevelError::Io { path: display.clone(), source })?;
    let level: LevelData = ron::from_str(&content).map_err(|source| LevelError::Parse { path: display, source })?;
    level.validate()?;
    Ok(level)
}

/// Load the first `.ron` level in `dir` by file name.
///
/// # Errors
/// `NoLevels` for an empty or missing directory, otherwise as [`load_level`].
pub fn load_first_level(dir: &str) -> Result<ActiveLevel, LevelError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|_| LevelError::NoLevels(dir.to_string()))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();
    let path = files.into_iter().next().ok_or_else(|| LevelError::NoLevels(dir.to_string()))?;
    let data = load_level(&path)?;
    info!("Loaded level '{}' from {}", data.name, path.display());
    Ok(ActiveLevel { data, source: path.display().to_string() })
}

/// # Errors
/// Returns a `notify::Error` if the directory cannot be watched.
pub fn setup_level_watcher(path: &str) -> Result<LevelWatcher, notify::Error> {
    setup_ron_watcher(path).map(LevelWatcher)
}

fn spawn_enemies(commands: &mut Commands, level: &LevelData) {
    for (index, config) in level.enemies.iter().enumerate() {
        if let Err(e) = spawn_enemy(commands, config) {
            error!("Enemy {index} in '{}' not spawned: {e}", level.name);
        }
    }
}

/// Spawn camera, player, floor and enemies for the active level.
#[allow(clippy::needless_pass_by_value)]
pub fn setup_level(mut commands: Commands, level: Res<ActiveLevel>, settings: Res<Settings>) {
    let panning = match level.data.panning() {
        Ok(panning) => panning,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    spawn_panning_camera(&mut commands, panning, &settings);
    let player = spawn_player(&mut commands, level.data.player_spawn, &settings);
    commands.entity(player).insert((
        crate::enemy::Hitbox { radius: crate::player::PLAYER_HALF_SIZE.x },
        crate::enemy::ParryRange::default(),
    ));
    commands.spawn((
        SpriteBundle {
            sprite: Sprite {
                color: Color::srgb(0.25, 0.22, 0.2),
                custom_size: Some(Vec2::new(10_000.0, 50.0)),
                ..default()
            },
            transform: Transform::from_xyz(0.0, level.data.ground_y - 25.0, 0.0),
            ..default()
        },
        Ground,
    ));
    spawn_enemies(&mut commands, &level.data);
}

#[derive(Component)]
pub struct Ground;

/// Reload the level when its directory changes: enemies and projectiles are
/// rebuilt, the camera gets the new panning chain and the player respawns.
#[allow(clippy::needless_pass_by_value, clippy::too_many_arguments)]
pub fn check_level_changes(
    mut commands: Commands,
    watcher: Res<LevelWatcher>,
    mut level: ResMut<ActiveLevel>,
    hostiles: Query<Entity, Or<(With<Enemy>, With<Projectile>)>>,
    mut cameras: Query<&mut PanningCamera>,
    mut players: Query<&mut Player>,
    mut grounds: Query<&mut Transform, With<Ground>>,
    settings: Res<Settings>,
    mut respawn: EventWriter<RespawnRequested>,
) {
    if !watcher.0.take_changed() {
        return;
    }
    info!("Level changed, reloading...");
    let data = match load_level(Path::new(&level.source)) {
        Ok(data) => data,
        Err(e) => {
            warn!("Keeping current level: {e}");
            return;
        }
    };

    for entity in &hostiles {
        commands.entity(entity).despawn();
    }
    spawn_enemies(&mut commands, &data);

    if let Ok(mut panning) = data.panning() {
        panning.smooth_time = settings.camera.smooth_time.max(f32::EPSILON);
        for mut camera in &mut cameras {
            camera.0 = panning.clone();
        }
    }
    for mut player in &mut players {
        player.spawn = data.player_spawn;
    }
    for mut tf in &mut grounds {
        tf.translation.y = data.ground_y - 25.0;
    }
    level.data = data;
    respawn.send(RespawnRequested);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_has_no_levels() {
        assert!(matches!(load_first_level("no/such/levels"), Err(LevelError::NoLevels(_))));
    }

    #[test]
    fn bundled_level_loads() {
        let level = load_first_level(LEVELS_DIR).unwrap();
        assert!(level.data.panning_points.len() >= 2);
        assert!(!level.data.enemies.is_empty());
    }

    #[test]
    fn unreadable_file_is_an_io_error() {
        assert!(matches!(load_level(Path::new("no/such/level.ron")), Err(LevelError::Io { .. })));
    }
}
