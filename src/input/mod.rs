//! Action bindings and the per-frame input snapshot.
//!
//! Physical keys and mouse buttons are mapped to named [`Action`]s through
//! `settings.controls.keybinds`. Every frame `update_input_snapshot` folds
//! the raw device state into an [`InputSnapshot`] resource, which is the only
//! thing gameplay systems read. Gamepads feed the same snapshot.
use bevy::input::gamepad::{GamepadAxisType, GamepadButtonType};
use bevy::prelude::*;
use bevy::time::Real;
use bevy::window::PrimaryWindow;

use crate::camera::PanningCamera;
use crate::settings::Settings;

const ACTION_COUNT: usize = 7;

/// Named logical actions. `Grapple`, `CancelGrapple` and `Shoot` are bound
/// and recorded like the rest but no gameplay system reads them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Jump,
    Dash,
    Grapple,
    CancelGrapple,
    Shoot,
    Parry,
    Pause,
}

impl Action {
    pub const ALL: [Action; ACTION_COUNT] = [
        Action::Jump,
        Action::Dash,
        Action::Grapple,
        Action::CancelGrapple,
        Action::Shoot,
        Action::Parry,
        Action::Pause,
    ];

    /// Key in `controls.keybinds`.
    #[must_use]
    pub fn keybind_name(self) -> &'static str {
        match self {
            Action::Jump => "jump",
            Action::Dash => "dash",
            Action::Grapple => "grapple",
            Action::CancelGrapple => "cancel_grapple",
            Action::Shoot => "shoot",
            Action::Parry => "parry",
            Action::Pause => "pause",
        }
    }

    #[must_use]
    pub fn interaction(self) -> InteractionKind {
        match self {
            Action::Jump | Action::CancelGrapple => InteractionKind::Tap,
            _ => InteractionKind::Press,
        }
    }

    fn gamepad_button(self) -> Option<GamepadButtonType> {
        match self {
            Action::Jump => Some(GamepadButtonType::South),
            Action::Dash => Some(GamepadButtonType::West),
            Action::Parry => Some(GamepadButtonType::East),
            Action::Pause => Some(GamepadButtonType::Start),
            Action::Shoot => Some(GamepadButtonType::RightTrigger2),
            Action::Grapple => Some(GamepadButtonType::LeftTrigger2),
            Action::CancelGrapple => None,
        }
    }
}

/// When a bound control counts as "performed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// On the frame the control goes down.
    Press,
    /// On release, if it was held no longer than `tap_time`.
    Tap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Key(KeyCode),
    Mouse(MouseButton),
}

impl Binding {
    /// Parse a keybind identifier: any `Settings::keycode_from_str` name or
    /// `MouseLeft` / `MouseRight` / `MouseMiddle`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "MOUSELEFT" | "LMB" => Some(Binding::Mouse(MouseButton::Left)),
            "MOUSERIGHT" | "RMB" => Some(Binding::Mouse(MouseButton::Right)),
            "MOUSEMIDDLE" | "MMB" => Some(Binding::Mouse(MouseButton::Middle)),
            _ => Settings::keycode_from_str(name).map(Binding::Key),
        }
    }
}

/// Raw state of one control for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub pressed: bool,
    pub just_pressed: bool,
    pub just_released: bool,
}

impl ButtonState {
    fn merge(self, other: ButtonState) -> ButtonState {
        ButtonState {
            pressed: self.pressed || other.pressed,
            just_pressed: self.just_pressed || other.just_pressed,
            just_released: self.just_released || other.just_released,
        }
    }
}

/// Tracks hold duration so taps can be told apart from holds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TapTracker {
    held_for: f32,
}

impl TapTracker {
    /// Whether the action is performed this frame.
    pub fn update(&mut self, state: ButtonState, interaction: InteractionKind, tap_time: f32, dt: f32) -> bool {
        match interaction {
            InteractionKind::Press => state.just_pressed,
            InteractionKind::Tap => {
                if state.just_pressed {
                    self.held_for = 0.0;
                } else if state.pressed {
                    self.held_for += dt;
                }
                state.just_released && self.held_for <= tap_time
            }
        }
    }
}

/// Everything gameplay reads from input devices for the current frame.
#[derive(Resource, Debug, Clone, Default)]
pub struct InputSnapshot {
    /// Digital movement direction, each axis in -1..=1 ("X axis" / "Y axis" actions).
    pub direction_raw: Vec2,
    /// Gamepad right stick after the deadzone; zero with keyboard and mouse.
    pub aim: Vec2,
    /// Mouse cursor projected into the world, if it is over the window.
    pub cursor_world: Option<Vec2>,
    /// Last device family that produced input.
    pub using_gamepad: bool,
    performed: [bool; ACTION_COUNT],
    trackers: [TapTracker; ACTION_COUNT],
}

impl InputSnapshot {
    #[must_use]
    pub fn performed(&self, action: Action) -> bool {
        self.performed[action as usize]
    }

    pub fn set_performed(&mut self, action: Action, value: bool) {
        self.performed[action as usize] = value;
    }

    /// Fold one frame of per-action button state into the snapshot.
    pub fn record(&mut self, action: Action, state: ButtonState, tap_time: f32, dt: f32) {
        let i = action as usize;
        self.performed[i] = self.trackers[i].update(state, action.interaction(), tap_time, dt);
    }
}

fn axis(negative: bool, positive: bool) -> f32 {
    f32::from(i8::from(positive) - i8::from(negative))
}

fn digital(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn deadzone(v: Vec2, zone: f32) -> Vec2 {
    if v.length() < zone { Vec2::ZERO } else { v }
}

#[derive(bevy::ecs::system::SystemParam)]
pub struct DeviceCtx<'w, 's> {
    pub keys: Res<'w, ButtonInput<KeyCode>>,
    pub mouse: Res<'w, ButtonInput<MouseButton>>,
    pub gamepads: Option<Res<'w, Gamepads>>,
    pub pad_buttons: Option<Res<'w, ButtonInput<GamepadButton>>>,
    pub pad_axes: Option<Res<'w, Axis<GamepadAxis>>>,
    pub windows: Query<'w, 's, &'static Window, With<PrimaryWindow>>,
    pub cameras: Query<'w, 's, (&'static Camera, &'static GlobalTransform), With<PanningCamera>>,
    pub real_time: Res<'w, Time<Real>>,
}

impl DeviceCtx<'_, '_> {
    fn binding_state(&self, binding: Binding) -> ButtonState {
        match binding {
            Binding::Key(k) => ButtonState {
                pressed: self.keys.pressed(k),
                just_pressed: self.keys.just_pressed(k),
                just_released: self.keys.just_released(k),
            },
            Binding::Mouse(b) => ButtonState {
                pressed: self.mouse.pressed(b),
                just_pressed: self.mouse.just_pressed(b),
                just_released: self.mouse.just_released(b),
            },
        }
    }

    fn gamepad(&self) -> Option<Gamepad> {
        self.gamepads.as_ref().and_then(|g| g.iter().next())
    }

    fn pad_state(&self, button: GamepadButtonType) -> ButtonState {
        let (Some(gamepad), Some(buttons)) = (self.gamepad(), self.pad_buttons.as_ref()) else {
            return ButtonState::default();
        };
        let b = GamepadButton::new(gamepad, button);
        ButtonState {
            pressed: buttons.pressed(b),
            just_pressed: buttons.just_pressed(b),
            just_released: buttons.just_released(b),
        }
    }

    fn stick(&self, x: GamepadAxisType, y: GamepadAxisType) -> Vec2 {
        let (Some(gamepad), Some(axes)) = (self.gamepad(), self.pad_axes.as_ref()) else {
            return Vec2::ZERO;
        };
        Vec2::new(
            axes.get(GamepadAxis::new(gamepad, x)).unwrap_or(0.0),
            axes.get(GamepadAxis::new(gamepad, y)).unwrap_or(0.0),
        )
    }

    fn cursor_world(&self) -> Option<Vec2> {
        let window = self.windows.get_single().ok()?;
        let cursor = window.cursor_position()?;
        let (camera, transform) = self.cameras.get_single().ok()?;
        camera.viewport_to_world_2d(transform, cursor)
    }
}

/// Rebuild the [`InputSnapshot`] from device state. Runs in `PreUpdate`.
#[allow(clippy::needless_pass_by_value)]
pub fn update_input_snapshot(devices: DeviceCtx<'_, '_>, settings: Res<Settings>, mut snapshot: ResMut<InputSnapshot>) {
    let controls = &settings.controls;
    let bound = |name: &str, default: Binding| {
        settings.keybind(name).and_then(Binding::parse).unwrap_or(default)
    };
    let held = |name: &str, default: KeyCode| devices.binding_state(bound(name, Binding::Key(default))).pressed;

    let keyboard_direction = Vec2::new(
        axis(held("left", KeyCode::KeyA), held("right", KeyCode::KeyD)),
        axis(held("down", KeyCode::KeyS), held("up", KeyCode::KeyW)),
    );
    let left_stick = deadzone(
        devices.stick(GamepadAxisType::LeftStickX, GamepadAxisType::LeftStickY),
        controls.stick_deadzone,
    );
    let right_stick = deadzone(
        devices.stick(GamepadAxisType::RightStickX, GamepadAxisType::RightStickY),
        controls.stick_deadzone,
    );

    let dt = devices.real_time.delta_seconds();
    let mut pad_active = left_stick != Vec2::ZERO || right_stick != Vec2::ZERO;
    let mut desktop_active = keyboard_direction != Vec2::ZERO;

    for action in Action::ALL {
        let desktop = settings
            .keybind(action.keybind_name())
            .and_then(Binding::parse)
            .map(|b| devices.binding_state(b))
            .unwrap_or_default();
        let pad = action.gamepad_button().map(|b| devices.pad_state(b)).unwrap_or_default();
        desktop_active |= desktop.just_pressed;
        pad_active |= pad.just_pressed;
        snapshot.record(action, desktop.merge(pad), controls.tap_time, dt);
    }

    if pad_active {
        snapshot.using_gamepad = true;
    } else if desktop_active {
        snapshot.using_gamepad = false;
    }

    snapshot.direction_raw = if keyboard_direction != Vec2::ZERO {
        keyboard_direction
    } else {
        Vec2::new(digital(left_stick.x), digital(left_stick.y))
    };
    snapshot.aim = right_stick;
    snapshot.cursor_world = devices.cursor_world();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press() -> ButtonState {
        ButtonState { pressed: true, just_pressed: true, just_released: false }
    }

    fn hold() -> ButtonState {
        ButtonState { pressed: true, just_pressed: false, just_released: false }
    }

    fn release() -> ButtonState {
        ButtonState { pressed: false, just_pressed: false, just_released: true }
    }

    #[test]
    fn parses_mouse_and_keyboard_bindings() {
        assert_eq!(Binding::parse("MouseRight"), Some(Binding::Mouse(MouseButton::Right)));
        assert_eq!(Binding::parse("space"), Some(Binding::Key(KeyCode::Space)));
        assert_eq!(Binding::parse("nonsense"), None);
    }

    #[test]
    fn press_fires_on_the_down_edge_only() {
        let mut t = TapTracker::default();
        assert!(t.update(press(), InteractionKind::Press, 0.2, 0.016));
        assert!(!t.update(hold(), InteractionKind::Press, 0.2, 0.016));
        assert!(!t.update(release(), InteractionKind::Press, 0.2, 0.016));
    }

    #[test]
    fn tap_fires_on_quick_release() {
        let mut t = TapTracker::default();
        assert!(!t.update(press(), InteractionKind::Tap, 0.2, 0.016));
        assert!(!t.update(hold(), InteractionKind::Tap, 0.2, 0.05));
        assert!(t.update(release(), InteractionKind::Tap, 0.2, 0.016));
    }

    #[test]
    fn long_hold_is_not_a_tap() {
        let mut t = TapTracker::default();
        t.update(press(), InteractionKind::Tap, 0.2, 0.016);
        for _ in 0..20 {
            t.update(hold(), InteractionKind::Tap, 0.2, 0.016);
        }
        assert!(!t.update(release(), InteractionKind::Tap, 0.2, 0.016));
    }

    #[test]
    fn snapshot_records_per_action() {
        let mut snapshot = InputSnapshot::default();
        snapshot.record(Action::Dash, press(), 0.2, 0.016);
        snapshot.record(Action::Jump, press(), 0.2, 0.016);
        assert!(snapshot.performed(Action::Dash));
        assert!(!snapshot.performed(Action::Jump));
        assert!(!snapshot.performed(Action::Parry));
    }

    #[test]
    fn axis_and_deadzone() {
        assert_eq!(axis(true, false), -1.0);
        assert_eq!(axis(true, true), 0.0);
        assert_eq!(deadzone(Vec2::new(0.1, 0.1), 0.2), Vec2::ZERO);
        assert_eq!(deadzone(Vec2::new(0.5, 0.0), 0.2), Vec2::new(0.5, 0.0));
    }
}
