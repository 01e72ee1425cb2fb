use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::input::InputSystem;
use bevy::prelude::*;
use bevy::window::{PresentMode, Window, WindowPlugin};
use sidestep::camera::{camera_follow, camera_lock, draw_panning_gizmos, sync_camera_settings};
use sidestep::debug::DebugDumpPlugin;
use sidestep::enemy::{
    dash_hits, draw_enemy_gizmos, follow_enemy_paths, handle_parried, hostile_hits, move_projectiles,
    recover_from_stun, reflected_hits, shoot_projectiles, track_parry_targets,
};
use sidestep::game::{GamePaused, GameResumed, GameStatus, handle_pause_input, is_playing};
use sidestep::input::{InputSnapshot, update_input_snapshot};
use sidestep::level::loader as level_loader;
use sidestep::player::{
    DashCountChanged, HitPointsChanged, HostileParried, ParryPerformed, PlayerDamaged, PlayerStateChanged,
    RespawnRequested, announce_new_players, apply_dash_effects, draw_dash_gizmos, apply_settings_changes, damage_player,
    parry_system, player_dash, player_movement, player_physics, respawn_player, tick_invulnerability,
    update_player_state,
};
use sidestep::settings::loader as settings_loader;
use sidestep::ui::{
    setup_debug_overlay, spawn_hud, toggle_debug_overlay, toggle_gizmos, toggle_pause_menu, update_debug_overlay,
    update_hud,
};

mod app;
use app::{StartupFailure, abort_startup, sync_vsync_settings};

fn main() {
    let settings = settings_loader::load_settings_from_dir(settings_loader::SETTINGS_DIR);
    let settings_watcher = settings_loader::setup_settings_watcher(settings_loader::SETTINGS_DIR)
        .unwrap_or_else(|_| settings_loader::SettingsWatcher::stub());

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Sidestep".into(),
                position: WindowPosition::Centered(MonitorSelection::Primary),
                present_mode: if settings.graphics.vsync { PresentMode::Fifo } else { PresentMode::AutoNoVsync },
                ..default()
            }),
            ..default()
        }))
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_plugins(DebugDumpPlugin);

    app.insert_resource(ClearColor(Color::srgb(0.08, 0.09, 0.12)));
    app.insert_resource(Time::<Fixed>::from_hz(60.0));
    app.insert_resource(settings.clone());
    app.insert_resource(settings_watcher);

    let level = match level_loader::load_first_level(level_loader::LEVELS_DIR) {
        Ok(level) => level,
        Err(e) => {
            // No level means nothing to play: report once logging is up, then exit.
            app.insert_resource(StartupFailure(e.to_string()));
            app.add_systems(Startup, abort_startup);
            app.run();
            return;
        }
    };
    app.insert_resource(level);
    app.insert_resource(
        level_loader::setup_level_watcher(level_loader::LEVELS_DIR)
            .unwrap_or_else(|_| level_loader::LevelWatcher::stub()),
    );

    app.init_resource::<InputSnapshot>();
    app.init_resource::<GameStatus>();
    app.add_event::<HitPointsChanged>()
        .add_event::<DashCountChanged>()
        .add_event::<PlayerStateChanged>()
        .add_event::<ParryPerformed>()
        .add_event::<PlayerDamaged>()
        .add_event::<RespawnRequested>()
        .add_event::<HostileParried>()
        .add_event::<GamePaused>()
        .add_event::<GameResumed>();

    app.add_systems(Startup, (level_loader::setup_level, spawn_hud, setup_debug_overlay));
    app.add_systems(PreUpdate, update_input_snapshot.after(InputSystem));
    app.add_systems(FixedUpdate, camera_follow.run_if(is_playing));

    app.add_systems(
        Update,
        (
            player_movement,
            player_dash,
            parry_system,
            apply_dash_effects,
            player_physics,
            camera_lock,
            follow_enemy_paths,
            shoot_projectiles,
            move_projectiles,
            recover_from_stun,
        )
            .chain()
            .run_if(is_playing),
    );
    app.add_systems(
        Update,
        (
            track_parry_targets,
            dash_hits,
            hostile_hits,
            reflected_hits,
            handle_parried,
            damage_player,
            respawn_player,
            tick_invulnerability,
            update_player_state,
        )
            .chain()
            .after(recover_from_stun)
            .run_if(is_playing),
    );

    app.add_systems(Update, handle_pause_input);
    app.add_systems(Update, announce_new_players);
    app.add_systems(Update, (update_hud, toggle_pause_menu).after(update_player_state).after(handle_pause_input));
    app.add_systems(Update, toggle_debug_overlay);
    app.add_systems(Update, toggle_gizmos);
    app.add_systems(Update, update_debug_overlay);
    app.add_systems(Update, draw_panning_gizmos);
    app.add_systems(Update, draw_enemy_gizmos);
    app.add_systems(Update, draw_dash_gizmos);

    app.add_systems(Update, settings_loader::check_settings_changes);
    app.add_systems(Update, level_loader::check_level_changes);
    app.add_systems(Update, apply_settings_changes);
    app.add_systems(Update, sync_camera_settings);
    app.add_systems(Update, sync_vsync_settings);

    app.run();
}
