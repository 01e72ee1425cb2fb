//! Aiming direction for dashes.
use bevy::prelude::Vec2;

use crate::input::InputSnapshot;

/// Unit direction the player is aiming in, if any.
///
/// On a gamepad the right stick wins, then the movement direction. With a
/// mouse the direction points from the player to the cursor.
#[must_use]
pub fn aiming_direction(input: &InputSnapshot, player: Vec2) -> Option<Vec2> {
    if input.using_gamepad {
        input.aim.try_normalize().or_else(|| input.direction_raw.try_normalize())
    } else {
        input.cursor_world.and_then(|cursor| (cursor - player).try_normalize())
    }
}
