//! Startup failure handling.
//!
//! Configuration that makes the game unplayable (no level, bad panning chain,
//! broken enemy path) is reported through the log once the log plugin is up,
//! then the app exits with a failure code.
use bevy::app::AppExit;
use bevy::prelude::*;

#[derive(Resource, Debug)]
pub struct StartupFailure(pub String);

#[allow(clippy::needless_pass_by_value)]
pub fn abort_startup(failure: Res<StartupFailure>, mut exit: EventWriter<AppExit>) {
    error!("Cannot start: {}", failure.0);
    exit.send(AppExit::error());
}
