//! Scene panning camera.
//!
//! The camera runs along a chain of panning points authored in the level.
//! `camera_follow` damps the camera toward the player on the fixed step and
//! `camera_lock` clamps it to the current segment every frame, shifting to
//! the neighbouring segment when the player crosses a junction.
pub mod panning;
pub mod smoothing;

use bevy::prelude::*;

use crate::player::Player;
use crate::settings::Settings;

pub use panning::{
    DEFAULT_SMOOTH_TIME, FlowDirection, PanningError, PanningPath, PanningPoint, PanningType, ScenePanning,
};
pub use smoothing::smooth_damp;

/// The 2D camera and the panning cursor that drives it.
#[derive(Component, Debug, Clone)]
pub struct PanningCamera(pub ScenePanning);

/// Spawn the camera at the first panning point.
///
/// # Arguments
/// * `commands` - command buffer of the calling system
/// * `panning` - panning cursor for the level; its smoothing time is taken from `settings`
/// * `settings` - current settings
pub fn spawn_panning_camera(commands: &mut Commands, mut panning: ScenePanning, settings: &Settings) -> Entity {
    panning.smooth_time = settings.camera.smooth_time.max(f32::EPSILON);
    let start = panning.start_position();
    let mut bundle = Camera2dBundle::default();
    bundle.transform.translation = start.extend(bundle.transform.translation.z);
    bundle.projection.scale = 1.0 / 40.0;
    commands.spawn((bundle, PanningCamera(panning))).id()
}

/// Fixed-step smoothing toward the player.
#[allow(clippy::needless_pass_by_value)]
pub fn camera_follow(
    time: Res<Time>,
    players: Query<&Transform, (With<Player>, Without<PanningCamera>)>,
    mut cameras: Query<(&mut Transform, &mut PanningCamera)>,
) {
    let Ok(target) = players.get_single() else { return };
    let dt = time.delta_seconds();
    for (mut tf, mut camera) in &mut cameras {
        let next = camera.0.follow(tf.translation.truncate(), target.translation.truncate(), dt);
        tf.translation.x = next.x;
        tf.translation.y = next.y;
    }
}

/// Per-frame segment clamp and junction handling.
pub fn camera_lock(
    players: Query<&Transform, (With<Player>, Without<PanningCamera>)>,
    mut cameras: Query<(&mut Transform, &mut PanningCamera)>,
) {
    let Ok(target) = players.get_single() else { return };
    for (mut tf, mut camera) in &mut cameras {
        let locked = camera.0.lock(tf.translation.truncate(), target.translation.truncate());
        tf.translation.x = locked.x;
        tf.translation.y = locked.y;
    }
}

/// Keep the smoothing time in sync with hot-reloaded settings.
#[allow(clippy::needless_pass_by_value)]
pub fn sync_camera_settings(settings: Res<Settings>, mut cameras: Query<&mut PanningCamera>) {
    if !settings.is_changed() {
        return;
    }
    for mut camera in &mut cameras {
        camera.0.smooth_time = settings.camera.smooth_time.max(f32::EPSILON);
    }
}

/// Draw the panning chain; the active segment is highlighted.
#[allow(clippy::needless_pass_by_value)]
pub fn draw_panning_gizmos(mut gizmos: Gizmos, settings: Res<Settings>, cameras: Query<&PanningCamera>) {
    if !settings.graphics.show_gizmos {
        return;
    }
    for camera in &cameras {
        let panning = &camera.0;
        let points = panning.path().points();
        gizmos.linestrip_2d(points.iter().map(|p| p.position), Color::srgb(0.4, 0.4, 0.9));
        for point in points {
            gizmos.circle_2d(point.position, 0.25, Color::srgb(0.4, 0.4, 0.9));
        }
        let previous = panning.path().get(panning.previous_index()).position;
        let next = panning.path().get(panning.next_index()).position;
        gizmos.line_2d(previous, next, Color::srgb(1.0, 0.85, 0.2));
    }
}
