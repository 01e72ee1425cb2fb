//! Debug dump (F3 default): writes FPS, entity counts, player, camera and
//! enemy path state plus process memory to a timestamped text file in
//! `./debug-dumps/`.
//!
//! Handy for attaching a snapshot to a bug report about a dash that went
//! somewhere odd or a camera that stopped panning.
use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::fs;
use std::time::SystemTime;
use sysinfo::{Pid, PidExt, ProcessExt, System, SystemExt};

use crate::camera::PanningCamera;
use crate::enemy::{Enemy, EnemyPathFollower, Projectile};
use crate::game::GameStatus;
use crate::level::ActiveLevel;
use crate::player::{Body2d, Dash, Parry, Player};
use crate::settings::Settings;

pub const DUMP_DIR: &str = "debug-dumps";

pub struct DebugDumpPlugin;

impl Plugin for DebugDumpPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, debug_input_system);
    }
}

fn bytes_to_mb(bytes: u64) -> String {
    format!("{:.2} MB", (bytes as f64) / 1024.0 / 1024.0)
}

/// Process, used and total system memory in bytes.
fn memory_bytes() -> (u64, u64, u64) {
    let mut sys = System::new();
    sys.refresh_memory();
    let pid = Pid::from_u32(std::process::id());
    sys.refresh_process(pid);
    let process = sys.process(pid).map_or(0, ProcessExt::memory);
    (process, sys.used_memory(), sys.total_memory())
}

#[derive(bevy::ecs::system::SystemParam)]
pub struct DumpCtx<'w, 's> {
    pub diagnostics: Res<'w, DiagnosticsStore>,
    pub level: Option<Res<'w, ActiveLevel>>,
    pub status: Option<Res<'w, GameStatus>>,
    pub virtual_time: Res<'w, Time<Virtual>>,
    pub entities: Query<'w, 's, Entity>,
    pub players: Query<'w, 's, (&'static Transform, &'static Player, &'static Body2d, &'static Dash, &'static Parry)>,
    pub cameras: Query<'w, 's, (&'static Transform, &'static PanningCamera)>,
    pub enemies: Query<'w, 's, (Entity, &'static Transform, &'static Enemy, Option<&'static EnemyPathFollower>)>,
    pub projectiles: Query<'w, 's, &'static Projectile>,
}

/// Render the gameplay part of the dump.
pub fn write_gameplay_state(out: &mut String, ctx: &DumpCtx<'_, '_>) {
    if let Some(level) = &ctx.level {
        writeln!(out, "Level: '{}' ({})", level.data.name, level.source).ok();
    }
    if let Some(status) = &ctx.status {
        writeln!(out, "Game state: {:?}", status.state).ok();
    }
    writeln!(
        out,
        "Virtual time: paused={} scale={:.2}",
        ctx.virtual_time.is_paused(),
        ctx.virtual_time.relative_speed()
    )
    .ok();

    for (tf, player, body, dash, parry) in &ctx.players {
        writeln!(out, "\nPlayer at ({:.2}, {:.2})", tf.translation.x, tf.translation.y).ok();
        writeln!(out, "  hit points {}/{} (immune {:.2}s)", player.hit_points, player.max_hit_points, player.invulnerable).ok();
        writeln!(out, "  body {body:?}").ok();
        writeln!(out, "  dash {:?}, {} left, settings {:?}", dash.phase(), dash.dashes_left(), dash.settings).ok();
        writeln!(
            out,
            "  parry spam={} free_dash={} target={:?}",
            parry.is_spamming(),
            parry.has_free_dash(),
            parry.hostile()
        )
        .ok();
    }

    for (tf, camera) in &ctx.cameras {
        let panning = &camera.0;
        writeln!(
            out,
            "\nCamera at ({:.2}, {:.2}): {:?} {:?}, segment {} -> {} of {}",
            tf.translation.x,
            tf.translation.y,
            panning.panning_type(),
            panning.flow(),
            panning.previous_index(),
            panning.next_index(),
            panning.path().points().len()
        )
        .ok();
    }

    writeln!(out, "\nEnemies:").ok();
    for (entity, tf, enemy, follower) in &ctx.enemies {
        write!(
            out,
            "  {entity:?} at ({:.2}, {:.2}) hp {} parriable {} stunned {:.2}",
            tf.translation.x, tf.translation.y, enemy.hit_points, enemy.parriable, enemy.stunned
        )
        .ok();
        if let Some(follower) = follower {
            let section = follower.path.active_section();
            write!(
                out,
                " | section {}/{} {:?} index {} len {}",
                follower.path.active_index() + 1,
                follower.path.sections().len(),
                section.strategy().kind(),
                section.current_index(),
                section.section_length()
            )
            .ok();
        }
        out.push('\n');
    }
    writeln!(out, "Projectiles: {}", ctx.projectiles.iter().count()).ok();
}

/// Write a dump when the `dump_debug` key (F3) is pressed.
#[allow(clippy::needless_pass_by_value)]
fn debug_input_system(keys: Res<ButtonInput<KeyCode>>, settings: Res<Settings>, ctx: DumpCtx<'_, '_>) {
    let key = settings
        .keybind("dump_debug")
        .and_then(Settings::keycode_from_str)
        .unwrap_or(KeyCode::F3);
    if !keys.just_pressed(key) {
        return;
    }

    let now: DateTime<Utc> = DateTime::from(SystemTime::now());
    let ts_secs = now.timestamp();
    let fname = format!("{DUMP_DIR}/debug-{ts_secs}.txt");

    let fps = ctx
        .diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);
    let frame_time = ctx
        .diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FRAME_TIME)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);
    let (process, used, total) = memory_bytes();

    let mut out = String::new();
    writeln!(out, "Debug dump: {ts_secs}").ok();
    writeln!(out, "Timestamp: {}", now.format("%Y-%m-%d %H:%M:%S")).ok();
    writeln!(out, "FPS: {fps:.1}, frame_time: {frame_time:.2} ms").ok();
    writeln!(out, "Entities: {}", ctx.entities.iter().count()).ok();
    writeln!(out, "Process memory: {}", bytes_to_mb(process)).ok();
    writeln!(out, "System memory: total={} used={}", bytes_to_mb(total), bytes_to_mb(used)).ok();
    write_gameplay_state(&mut out, &ctx);

    if let Err(e) = fs::create_dir_all(DUMP_DIR) {
        error!("debug dump: failed to create dir '{DUMP_DIR}': {e}");
        return;
    }
    if let Err(e) = fs::write(&fname, out) {
        error!("debug dump: failed to write {fname}: {e}");
    } else {
        info!("wrote debug dump: {fname}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Resource, Default)]
    struct Dumped(String);

    fn capture(ctx: DumpCtx<'_, '_>, mut dumped: ResMut<Dumped>) {
        write_gameplay_state(&mut dumped.0, &ctx);
    }

    #[test]
    fn gameplay_state_lists_enemies() {
        let mut app = App::new();
        app.init_resource::<DiagnosticsStore>()
            .init_resource::<Time<Virtual>>()
            .init_resource::<Dumped>()
            .add_systems(Update, capture);
        app.world_mut().spawn((Transform::from_xyz(2.0, 1.0, 0.0), Enemy::new(3, true)));
        app.update();

        let out = &app.world().resource::<Dumped>().0;
        assert!(out.contains("Virtual time: paused=false"));
        assert!(out.contains("at (2.00, 1.00) hp 3 parriable true"));
        assert!(out.contains("Projectiles: 0"));
    }

    #[test]
    fn gameplay_state_describes_the_active_path_section() {
        use crate::path::{EnemyPath, PathSectionConfig};

        let mut app = App::new();
        app.init_resource::<DiagnosticsStore>()
            .init_resource::<Time<Virtual>>()
            .init_resource::<Dumped>()
            .add_systems(Update, capture);
        let path = EnemyPath::from_configs(&[PathSectionConfig::Linear(vec![Vec2::ZERO, Vec2::X])]).unwrap();
        app.world_mut().spawn((
            Transform::default(),
            Enemy::new(2, false),
            EnemyPathFollower::new(path, 3.0),
        ));
        app.update();

        let out = &app.world().resource::<Dumped>().0;
        assert!(out.contains("| section 1/1 Linear index -1 len 2"));
    }

    #[test]
    fn bytes_format_as_megabytes() {
        assert_eq!(bytes_to_mb(3 * 1024 * 1024), "3.00 MB");
    }
}
