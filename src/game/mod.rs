//! Game state: playing or paused.
//!
//! Pausing stops virtual time, so every system driven by `Time` freezes while
//! real-time timers (input taps, parry windows) keep their own clock.
use bevy::app::AppExit;
use bevy::prelude::*;

use crate::input::{Action, InputSnapshot};
use crate::player::RespawnRequested;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameState {
    #[default]
    Playing,
    Paused,
}

#[derive(Resource, Debug, Default)]
pub struct GameStatus {
    pub state: GameState,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct GamePaused;

#[derive(Event, Debug, Clone, Copy)]
pub struct GameResumed;

/// Run condition for gameplay systems.
#[must_use]
pub fn is_playing(status: Res<GameStatus>) -> bool {
    status.state == GameState::Playing
}

pub fn pause_game(status: &mut GameStatus, time: &mut Time<Virtual>, paused: &mut EventWriter<GamePaused>) {
    if status.state == GameState::Paused {
        return;
    }
    status.state = GameState::Paused;
    time.pause();
    info!("Game paused");
    paused.send(GamePaused);
}

pub fn resume_game(status: &mut GameStatus, time: &mut Time<Virtual>, resumed: &mut EventWriter<GameResumed>) {
    if status.state == GameState::Playing {
        return;
    }
    status.state = GameState::Playing;
    time.unpause();
    info!("Game resumed");
    resumed.send(GameResumed);
}

/// Pause toggles; while paused R respawns (and resumes) and Q quits.
#[allow(clippy::needless_pass_by_value)]
pub fn handle_pause_input(
    input: Res<InputSnapshot>,
    keys: Res<ButtonInput<KeyCode>>,
    mut status: ResMut<GameStatus>,
    mut time: ResMut<Time<Virtual>>,
    mut paused: EventWriter<GamePaused>,
    mut resumed: EventWriter<GameResumed>,
    mut respawn: EventWriter<RespawnRequested>,
    mut exit: EventWriter<AppExit>,
) {
    if input.performed(Action::Pause) {
        match status.state {
            GameState::Playing => pause_game(&mut status, &mut time, &mut paused),
            GameState::Paused => resume_game(&mut status, &mut time, &mut resumed),
        }
        return;
    }
    if status.state != GameState::Paused {
        return;
    }
    if keys.just_pressed(KeyCode::KeyR) {
        resume_game(&mut status, &mut time, &mut resumed);
        respawn.send(RespawnRequested);
    } else if keys.just_pressed(KeyCode::KeyQ) {
        info!("Quitting");
        exit.send(AppExit::Success);
    }
}
