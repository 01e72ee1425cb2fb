//! Settings, types and defaults.
//!
//! Settings are stored as a RON file under `data/settings/` and are hot-reloadable
//! using the RON watcher utilities (see `ron::setup_ron_watcher`). Gameplay
//! tunables (dash, parry, camera, movement) live here next to the controls so
//! designers can tweak them while the game runs.
use bevy::prelude::{KeyCode, Resource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsSettings {
    #[serde(default = "GraphicsSettings::default_vsync")]
    pub vsync: bool, // Enable vertical sync to cap FPS to the display refresh rate.
    #[serde(default = "GraphicsSettings::default_show_gizmos")]
    pub show_gizmos: bool, // Draw enemy paths, panning points and dash reach.
}

impl GraphicsSettings {
    fn default_vsync() -> bool { true }
    fn default_show_gizmos() -> bool { false }
}

impl Default for GraphicsSettings {
    fn default() -> Self {
        Self {
            vsync: Self::default_vsync(),
            show_gizmos: Self::default_show_gizmos(),
        }
    }
}

/// Controls / input settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsSettings {
    #[serde(default = "ControlsSettings::default_tap_time")]
    pub tap_time: f32, // Longest press (seconds) that still counts as a tap
    #[serde(default = "ControlsSettings::default_stick_deadzone")]
    pub stick_deadzone: f32, // Gamepad stick values below this are treated as zero
    #[serde(default = "ControlsSettings::default_keybinds")]
    pub keybinds: HashMap<String, String>, // Map of action names to key identifiers (editable by user)
}

impl ControlsSettings {
    fn default_tap_time() -> f32 { 0.2 }
    fn default_stick_deadzone() -> f32 { 0.2 }

    fn default_keybinds() -> HashMap<String, String> {
        let mut m = HashMap::new();
        m.insert("left".to_string(), "A".to_string());
        m.insert("right".to_string(), "D".to_string());
        m.insert("down".to_string(), "S".to_string());
        m.insert("up".to_string(), "W".to_string());
        m.insert("jump".to_string(), "Space".to_string());
        m.insert("dash".to_string(), "LShift".to_string());
        m.insert("grapple".to_string(), "MouseRight".to_string());
        m.insert("cancel_grapple".to_string(), "Space".to_string());
        m.insert("shoot".to_string(), "MouseLeft".to_string());
        m.insert("parry".to_string(), "F".to_string());
        m.insert("pause".to_string(), "Escape".to_string());
        m.insert("toggle_debug".to_string(), "F1".to_string());
        m.insert("toggle_gizmos".to_string(), "F2".to_string());
        m.insert("dump_debug".to_string(), "F3".to_string());
        m
    }
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            tap_time: Self::default_tap_time(),
            stick_deadzone: Self::default_stick_deadzone(),
            keybinds: Self::default_keybinds(),
        }
    }
}

/// Ground movement tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementSettings {
    #[serde(default = "MovementSettings::default_run_speed")]
    pub run_speed: f32, // Horizontal speed in world units per second
    #[serde(default = "MovementSettings::default_jump_velocity")]
    pub jump_velocity: f32, // Upward velocity applied on jump
    #[serde(default = "MovementSettings::default_gravity")]
    pub gravity: f32, // Downward acceleration before gravity scale
}

impl MovementSettings {
    fn default_run_speed() -> f32 { 7.0 }
    fn default_jump_velocity() -> f32 { 12.0 }
    fn default_gravity() -> f32 { 30.0 }
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            run_speed: Self::default_run_speed(),
            jump_velocity: Self::default_jump_velocity(),
            gravity: Self::default_gravity(),
        }
    }
}

/// Dash tuning. Values outside the authored ranges are clamped by [`DashSettings::sanitized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashSettings {
    #[serde(default = "DashSettings::default_count")]
    pub count: i32, // Dashes available after touching the ground (0..=100)
    #[serde(default = "DashSettings::default_distance")]
    pub distance: f32, // Distance covered by one dash (0.1..=100)
    #[serde(default = "DashSettings::default_time")]
    pub time: f32, // Duration of one dash in seconds (0.1..=5)
    #[serde(default = "DashSettings::default_hold_time")]
    pub hold_time: f32, // How long the player clings after a dash; negative means forever (-1..=5)
    #[serde(default = "DashSettings::default_hold_jump_distance")]
    pub hold_jump_distance: f32, // Height of the jump out of a hold (0.1..=100)
    #[serde(default = "DashSettings::default_hold_jump_time")]
    pub hold_jump_time: f32, // Time to reach that height (0.1..=5)
    #[serde(default = "DashSettings::default_restored_dashes")]
    pub restored_dashes: i32, // Dashes given back when a dash hits an enemy (0..=5)
}

impl DashSettings {
    fn default_count() -> i32 { 1 }
    fn default_distance() -> f32 { 5.0 }
    fn default_time() -> f32 { 0.2 }
    fn default_hold_time() -> f32 { 1.0 }
    fn default_hold_jump_distance() -> f32 { 3.0 }
    fn default_hold_jump_time() -> f32 { 0.3 }
    fn default_restored_dashes() -> i32 { 1 }

    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            count: self.count.clamp(0, 100),
            distance: self.distance.clamp(0.1, 100.0),
            time: self.time.clamp(0.1, 5.0),
            hold_time: self.hold_time.clamp(-1.0, 5.0),
            hold_jump_distance: self.hold_jump_distance.clamp(0.1, 100.0),
            hold_jump_time: self.hold_jump_time.clamp(0.1, 5.0),
            restored_dashes: self.restored_dashes.clamp(0, 5),
        }
    }
}

impl Default for DashSettings {
    fn default() -> Self {
        Self {
            count: Self::default_count(),
            distance: Self::default_distance(),
            time: Self::default_time(),
            hold_time: Self::default_hold_time(),
            hold_jump_distance: Self::default_hold_jump_distance(),
            hold_jump_time: Self::default_hold_jump_time(),
            restored_dashes: Self::default_restored_dashes(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParrySettings {
    #[serde(default = "ParrySettings::default_spam_window")]
    pub spam_window: f32, // Presses closer together than this (real seconds) count as spam (0..=1)
    #[serde(default = "ParrySettings::default_free_dash_time")]
    pub free_dash_time: f32, // Real seconds a parried projectile grants a free dash for (0..=999)
    #[serde(default = "ParrySettings::default_slow_time_scale")]
    pub slow_time_scale: f32, // Time scale while the free dash is available (0..=1)
}

impl ParrySettings {
    fn default_spam_window() -> f32 { 0.2 }
    fn default_free_dash_time() -> f32 { 1.0 }
    fn default_slow_time_scale() -> f32 { 0.3 }

    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            spam_window: self.spam_window.clamp(0.0, 1.0),
            free_dash_time: self.free_dash_time.clamp(0.0, 999.0),
            slow_time_scale: self.slow_time_scale.clamp(0.0, 1.0),
        }
    }
}

impl Default for ParrySettings {
    fn default() -> Self {
        Self {
            spam_window: Self::default_spam_window(),
            free_dash_time: Self::default_free_dash_time(),
            slow_time_scale: Self::default_slow_time_scale(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "CameraSettings::default_smooth_time")]
    pub smooth_time: f32, // Response time of the follow smoothing in seconds
}

impl CameraSettings {
    fn default_smooth_time() -> f32 { crate::camera::DEFAULT_SMOOTH_TIME }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self { smooth_time: Self::default_smooth_time() }
    }
}

/// Top-level Settings
#[derive(Resource, Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub graphics: GraphicsSettings,
    #[serde(default)]
    pub controls: ControlsSettings,
    #[serde(default)]
    pub movement: MovementSettings,
    #[serde(default)]
    pub dash: DashSettings,
    #[serde(default)]
    pub parry: ParrySettings,
    #[serde(default)]
    pub camera: CameraSettings,
}

impl Settings {
    /// Key identifier bound to `action`, if any.
    #[must_use]
    pub fn keybind(&self, action: &str) -> Option<&str> {
        self.controls.keybinds.get(action).map(String::as_str)
    }

    /// Convert a string key identifier (e.g., from `controls.keybinds`) into a `KeyCode` that
    /// can be used with Bevy's input system.
    ///
    /// # Arguments
    /// * `name` - The string key identifier to convert (e.g., "W", "Space", "F1").
    ///
    /// # Returns
    /// An `Option<KeyCode>` corresponding to the provided string, or `None` if the string
    /// does not match any known key.
    #[must_use]
    pub fn keycode_from_str(name: &str) -> Option<KeyCode> {
        let s = name.to_ascii_uppercase();
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_uppercase() {
                const LETTERS: [KeyCode; 26] = [
                    KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE,
                    KeyCode::KeyF, KeyCode::KeyG, KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ,
                    KeyCode::KeyK, KeyCode::KeyL, KeyCode::KeyM, KeyCode::KeyN, KeyCode::KeyO,
                    KeyCode::KeyP, KeyCode::KeyQ, KeyCode::KeyR, KeyCode::KeyS, KeyCode::KeyT,
                    KeyCode::KeyU, KeyCode::KeyV, KeyCode::KeyW, KeyCode::KeyX, KeyCode::KeyY,
                    KeyCode::KeyZ,
                ];
                return Some(LETTERS[(c as u8 - b'A') as usize]);
            }
            if c.is_ascii_digit() {
                const DIGITS: [KeyCode; 10] = [
                    KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
                    KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
                ];
                return Some(DIGITS[(c as u8 - b'0') as usize]);
            }
        }

        Some(match s.as_str() {
            // Function keys
            "F1" => KeyCode::F1,
            "F2" => KeyCode::F2,
            "F3" => KeyCode::F3,
            "F4" => KeyCode::F4,
            "F5" => KeyCode::F5,
            "F6" => KeyCode::F6,
            "F7" => KeyCode::F7,
            "F8" => KeyCode::F8,
            "F9" => KeyCode::F9,
            "F10" => KeyCode::F10,
            "F11" => KeyCode::F11,
            "F12" => KeyCode::F12,

            // Arrows / navigation
            "LEFT" | "ARROWLEFT" => KeyCode::ArrowLeft,
            "RIGHT" | "ARROWRIGHT" => KeyCode::ArrowRight,
            "UP" | "ARROWUP" => KeyCode::ArrowUp,
            "DOWN" | "ARROWDOWN" => KeyCode::ArrowDown,

            // Whitespace / control
            "ESC" | "ESCAPE" => KeyCode::Escape,
            "SPACE" => KeyCode::Space,
            "TAB" => KeyCode::Tab,
            "ENTER" | "RETURN" => KeyCode::Enter,
            "BACKSPACE" | "BACK" => KeyCode::Backspace,

            // Modifiers
            "LSHIFT" | "SHIFT" => KeyCode::ShiftLeft,
            "RSHIFT" => KeyCode::ShiftRight,
            "LCTRL" | "CTRL" | "CONTROL" => KeyCode::ControlLeft,
            "RCTRL" => KeyCode::ControlRight,
            "LALT" | "ALT" => KeyCode::AltLeft,
            "RALT" => KeyCode::AltRight,

            _ => return None,
        })
    }
}

pub mod loader;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_letters_digits_and_names() {
        assert_eq!(Settings::keycode_from_str("w"), Some(KeyCode::KeyW));
        assert_eq!(Settings::keycode_from_str("7"), Some(KeyCode::Digit7));
        assert_eq!(Settings::keycode_from_str("LShift"), Some(KeyCode::ShiftLeft));
        assert_eq!(Settings::keycode_from_str("escape"), Some(KeyCode::Escape));
        assert_eq!(Settings::keycode_from_str("MouseLeft"), None);
    }

    #[test]
    fn partial_ron_falls_back_to_defaults() {
        let settings: Settings = ron::from_str("(dash: (count: 3), parry: (spam_window: 4.0))").unwrap();
        assert_eq!(settings.dash.count, 3);
        assert_eq!(settings.dash.time, 0.2);
        assert_eq!(settings.parry.sanitized().spam_window, 1.0);
        assert_eq!(settings.keybind("jump"), Some("Space"));
    }

    #[test]
    fn sanitized_dash_clamps_to_authored_ranges() {
        let wild = DashSettings { count: 500, time: 0.0, hold_time: -9.0, ..DashSettings::default() };
        let clean = wild.sanitized();
        assert_eq!(clean.count, 100);
        assert_eq!(clean.time, 0.1);
        assert_eq!(clean.hold_time, -1.0);
    }
}
