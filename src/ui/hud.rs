//! HUD: hit points, dashes left, player state and the pause banner.
//!
//! The HUD only listens to events; it never reads player components.
use bevy::prelude::*;

use crate::game::{GamePaused, GameResumed};
use crate::player::{DashCountChanged, HitPointsChanged, PlayerStateChanged};

pub const HIT_POINTS_LABEL: &str = "Hit Points: ";
pub const DASHES_LABEL: &str = "\nDashes: ";
pub const STATE_LABEL: &str = "\nState: ";

// Value sections sit right after their labels.
const HIT_POINTS_SECTION: usize = 1;
const DASHES_SECTION: usize = 3;
const STATE_SECTION: usize = 5;

#[derive(Component)]
pub struct HudText;

#[derive(Component)]
pub struct PauseMenu;

pub fn spawn_hud(mut commands: Commands) {
    let label = TextStyle { font_size: 22.0, color: Color::srgb(0.8, 0.8, 0.8), ..default() };
    let value = TextStyle { font_size: 22.0, color: Color::WHITE, ..default() };
    commands.spawn((
        TextBundle::from_sections([
            TextSection::new(HIT_POINTS_LABEL, label.clone()),
            TextSection::new("-", value.clone()),
            TextSection::new(DASHES_LABEL, label.clone()),
            TextSection::new("-", value.clone()),
            TextSection::new(STATE_LABEL, label),
            TextSection::new("-", value),
        ])
        .with_style(Style {
            position_type: PositionType::Absolute,
            right: Val::Px(16.0),
            top: Val::Px(12.0),
            ..default()
        }),
        HudText,
    ));

    commands
        .spawn((
            NodeBundle {
                style: Style {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    justify_content: JustifyContent::Center,
                    align_items: AlignItems::Center,
                    ..default()
                },
                background_color: Color::srgba(0.0, 0.0, 0.0, 0.5).into(),
                visibility: Visibility::Hidden,
                ..default()
            },
            PauseMenu,
        ))
        .with_children(|p| {
            p.spawn(TextBundle::from_section(
                "Paused\n\nEsc  resume\nR  respawn\nQ  quit",
                TextStyle { font_size: 36.0, color: Color::WHITE, ..default() },
            ));
        });
}

/// Mirror player events into the HUD text.
pub fn update_hud(
    mut hit_points: EventReader<HitPointsChanged>,
    mut dashes: EventReader<DashCountChanged>,
    mut states: EventReader<PlayerStateChanged>,
    mut texts: Query<&mut Text, With<HudText>>,
) {
    let Ok(mut text) = texts.get_single_mut() else { return };
    if let Some(last) = hit_points.read().last() {
        text.sections[HIT_POINTS_SECTION].value = format!("{}/{}", last.hit_points, last.max_hit_points);
    }
    if let Some(last) = dashes.read().last() {
        text.sections[DASHES_SECTION].value = last.dashes_left.to_string();
    }
    if let Some(last) = states.read().last() {
        text.sections[STATE_SECTION].value = last.state.name().to_string();
    }
}

/// Show the pause menu while the game is paused.
pub fn toggle_pause_menu(
    mut paused: EventReader<GamePaused>,
    mut resumed: EventReader<GameResumed>,
    mut menus: Query<&mut Visibility, With<PauseMenu>>,
) {
    let show = paused.read().count() > 0;
    let hide = resumed.read().count() > 0;
    let visibility = match (show, hide) {
        (true, false) => Visibility::Visible,
        (false, true) => Visibility::Hidden,
        _ => return,
    };
    for mut menu in &mut menus {
        *menu = visibility;
    }
}
