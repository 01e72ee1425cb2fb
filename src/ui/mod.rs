//! User interface: HUD, pause menu and the debug overlay.
//!
//! The overlay (F1 by default) is refreshed every half second with FPS,
//! player position, dash and parry state, the camera segment and each
//! enemy's path cursor. F2 toggles the world gizmos.
pub mod hud;

use crate::camera::PanningCamera;
use crate::enemy::EnemyPathFollower;
use crate::player::{Body2d, Dash, Parry, Player};
use crate::settings::Settings;
use bevy::diagnostic::{Diagnostic, DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use std::fmt::Write as _;

pub use hud::*;

/// State for the debug overlay visibility.
#[derive(Resource, Default)]
pub struct DebugOverlayState {
    /// Whether the overlay is currently visible.
    pub visible: bool,
}

#[derive(Resource, Default)]
pub struct DebugOverlayTimer(pub Timer);

#[derive(Component)]
pub struct DebugOverlayText;

fn bound_key(settings: &Settings, action: &str, default: KeyCode) -> KeyCode {
    settings.keybind(action).and_then(Settings::keycode_from_str).unwrap_or(default)
}

pub fn setup_debug_overlay(mut commands: Commands) {
    commands.insert_resource(DebugOverlayTimer(Timer::from_seconds(0.5, TimerMode::Repeating)));
    commands.insert_resource(DebugOverlayState::default());
    commands.spawn((
        TextBundle::from_section(
            "",
            TextStyle { font_size: 18.0, color: Color::srgb(1.0, 1.0, 0.0), ..default() },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            top: Val::Px(10.0),
            ..default()
        }),
        DebugOverlayText,
    ));
}

#[allow(clippy::needless_pass_by_value)]
pub fn toggle_debug_overlay(
    mut state: ResMut<DebugOverlayState>,
    settings: Res<Settings>,
    input: Res<ButtonInput<KeyCode>>,
) {
    if input.just_pressed(bound_key(&settings, "toggle_debug", KeyCode::F1)) {
        state.visible = !state.visible;
    }
}

#[allow(clippy::needless_pass_by_value)]
pub fn toggle_gizmos(mut settings: ResMut<Settings>, input: Res<ButtonInput<KeyCode>>) {
    if input.just_pressed(bound_key(&settings, "toggle_gizmos", KeyCode::F2)) {
        settings.graphics.show_gizmos = !settings.graphics.show_gizmos;
    }
}

#[derive(bevy::ecs::system::SystemParam)]
pub struct DebugOverlayCtx<'w, 's> {
    pub diagnostics: Res<'w, DiagnosticsStore>,
    pub state: Res<'w, DebugOverlayState>,
    pub time: Res<'w, Time<Real>>,
    pub virtual_time: Res<'w, Time<Virtual>>,
    pub timer: ResMut<'w, DebugOverlayTimer>,
    pub query: Query<'w, 's, &'static mut Text, With<DebugOverlayText>>,
    pub players: Query<'w, 's, (&'static Transform, &'static Body2d, &'static Dash, &'static Parry), With<Player>>,
    pub cameras: Query<'w, 's, &'static PanningCamera>,
    pub followers: Query<'w, 's, (Entity, &'static EnemyPathFollower)>,
}

/// Rebuild the overlay text on the overlay timer.
pub fn update_debug_overlay(mut ctx: DebugOverlayCtx<'_, '_>) {
    if !ctx.timer.0.tick(ctx.time.delta()).just_finished() {
        return;
    }

    let Ok(mut text) = ctx.query.get_single_mut() else { return };

    if !ctx.state.visible {
        text.sections[0].value = String::new();
        return;
    }

    let fps = ctx
        .diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(Diagnostic::smoothed)
        .unwrap_or(0.0);

    let mut out = format!("FPS: {fps:.1}\nTime scale: {:.2}\n", ctx.virtual_time.relative_speed());

    if let Ok((tf, body, dash, parry)) = ctx.players.get_single() {
        let _ = writeln!(out, "Pos: ({:.1}, {:.1}) Vel: ({:.1}, {:.1})", tf.translation.x, tf.translation.y, body.velocity.x, body.velocity.y);
        let _ = writeln!(out, "Dash: {:?} left {}", dash.phase(), dash.dashes_left());
        let _ = writeln!(
            out,
            "Parry: spam {} free dash {} target {:?}",
            parry.is_spamming(),
            parry.has_free_dash(),
            parry.hostile().map(|h| h.kind)
        );
    } else {
        out.push_str("Pos: N/A\n");
    }

    for camera in &ctx.cameras {
        let panning = &camera.0;
        let _ = writeln!(
            out,
            "Panning: {:?} {:?} ({} -> {})",
            panning.panning_type(),
            panning.flow(),
            panning.previous_index(),
            panning.next_index()
        );
    }

    for (entity, follower) in &ctx.followers {
        let section = follower.path.active_section();
        let _ = writeln!(
            out,
            "{entity:?}: section {} index {} / {} {}",
            follower.path.active_index(),
            section.current_index(),
            section.section_length(),
            if follower.forward { "fwd" } else { "back" }
        );
    }

    text.sections[0].value = out;
}
