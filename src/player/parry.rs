//! Parry and the free dash it grants.
//!
//! Presses closer together than `spam_window` (real seconds) count as spam
//! and never parry. Parrying a projectile grants a free dash for
//! `free_dash_time` real seconds while virtual time runs at
//! `slow_time_scale`; the grant is taken back if the player jumps or gets
//! knocked back instead of dashing. Parrying anything else just refunds a dash.
use bevy::prelude::*;
use bevy::time::Real;

use crate::input::{Action, InputSnapshot};
use crate::player::ParryPerformed;
use crate::player::dash::Dash;
use crate::settings::ParrySettings;

/// How long the parry pose stays visible.
pub const PARRY_FLASH_TIME: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostileKind {
    Enemy,
    Projectile,
}

/// The hostile currently inside parry range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParryTarget {
    pub entity: Entity,
    pub kind: HostileKind,
    pub parriable: bool,
}

/// A hostile was parried.
#[derive(Event, Debug, Clone, Copy)]
pub struct HostileParried {
    pub target: ParryTarget,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParryEffect {
    /// Parry pose and sound; fired on every non-spam press.
    Swing,
    Parried(ParryTarget),
    TimeScale(f32),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParryInput {
    pub parry: bool,
    pub jump: bool,
    /// Unscaled frame time.
    pub real_dt: f32,
}

#[derive(Component, Debug, Clone)]
pub struct Parry {
    pub settings: ParrySettings,
    spam_window: Option<f32>,
    spamming: bool,
    free_dash: Option<f32>,
    hostile: Option<ParryTarget>,
    flash: f32,
}

impl Parry {
    #[must_use]
    pub fn new(settings: &ParrySettings) -> Self {
        Self {
            settings: settings.sanitized(),
            spam_window: None,
            spamming: false,
            free_dash: None,
            hostile: None,
            flash: 0.0,
        }
    }

    #[must_use]
    pub fn is_spamming(&self) -> bool {
        self.spamming
    }

    #[must_use]
    pub fn has_free_dash(&self) -> bool {
        self.free_dash.is_some()
    }

    #[must_use]
    pub fn hostile(&self) -> Option<ParryTarget> {
        self.hostile
    }

    /// Whether the parry pose is showing.
    #[must_use]
    pub fn is_flashing(&self) -> bool {
        self.flash > 0.0
    }

    /// Remember `target` unless another hostile is already tracked.
    pub fn set_hostile(&mut self, target: ParryTarget) {
        if self.hostile.is_none() {
            self.hostile = Some(target);
        }
    }

    /// Forget the tracked hostile if it is `entity`.
    pub fn clear_hostile(&mut self, entity: Entity) {
        if self.hostile.is_some_and(|h| h.entity == entity) {
            self.hostile = None;
        }
    }

    /// Refresh the parriable flag of the tracked hostile.
    pub fn update_hostile(&mut self, target: ParryTarget) {
        if let Some(hostile) = &mut self.hostile
            && hostile.entity == target.entity
        {
            *hostile = target;
        }
    }

    pub fn set_settings(&mut self, settings: &ParrySettings) {
        self.settings = settings.sanitized();
    }

    /// Advance one frame.
    ///
    /// # Arguments
    /// * `input` - parry/jump buttons and the unscaled frame time
    /// * `dash` - the same player's dash; parries grant or revoke dashes on it
    ///
    /// # Return
    /// * `Vec<ParryEffect>` - swings, parried targets and time-scale changes to apply.
    pub fn tick(&mut self, input: &ParryInput, dash: &mut Dash) -> Vec<ParryEffect> {
        let mut effects = Vec::new();
        self.tick_timers(input.real_dt, dash, &mut effects);

        self.spamming = self.update_spam(input.parry);
        if !self.spamming && input.parry {
            self.flash = PARRY_FLASH_TIME;
            effects.push(ParryEffect::Swing);
        }

        match self.hostile {
            Some(hostile) if hostile.parriable && !self.spamming && input.parry => {
                if hostile.kind == HostileKind::Projectile {
                    if self.free_dash.is_some() {
                        self.stop_free_dash(false, dash, &mut effects);
                    }
                    self.give_free_dash(dash, &mut effects);
                } else {
                    dash.alter_dash_count(1);
                }
                effects.push(ParryEffect::Parried(hostile));
                self.hostile = None;
                self.spam_window = None;
            }
            // a tracked hostile keeps the hold even when it cannot be parried
            Some(_) => {}
            None if dash.is_holding() && input.parry => dash.stop_holding(true),
            None => {}
        }

        if self.free_dash.is_some() {
            if dash.is_dashing() && !dash.is_damaged_dashing() {
                self.stop_free_dash(true, dash, &mut effects);
            } else if dash.is_damaged_dashing() || input.jump {
                self.stop_free_dash(false, dash, &mut effects);
            }
        }

        effects
    }

    fn tick_timers(&mut self, real_dt: f32, dash: &mut Dash, effects: &mut Vec<ParryEffect>) {
        self.flash = (self.flash - real_dt).max(0.0);

        if let Some(left) = &mut self.spam_window {
            *left -= real_dt;
            if *left <= 0.0 {
                self.spam_window = None;
            }
        }

        if let Some(left) = &mut self.free_dash {
            *left -= real_dt;
            if *left <= 0.0 {
                self.stop_free_dash(false, dash, effects);
            }
        }
    }

    fn update_spam(&mut self, pressed: bool) -> bool {
        match (self.spam_window.is_some(), pressed) {
            (false, true) => {
                self.spam_window = Some(self.settings.spam_window);
                false
            }
            (true, true) => {
                self.spam_window = Some(self.settings.spam_window);
                true
            }
            (false, false) => false,
            (true, false) => self.spamming,
        }
    }

    fn give_free_dash(&mut self, dash: &mut Dash, effects: &mut Vec<ParryEffect>) {
        if self.free_dash.is_some() {
            return;
        }
        dash.stop_dash();
        dash.alter_dash_count(1);
        effects.push(ParryEffect::TimeScale(self.settings.slow_time_scale));
        self.free_dash = Some(self.settings.free_dash_time);
    }

    /// End the grant; an unused dash is taken back.
    fn stop_free_dash(&mut self, took_dash: bool, dash: &mut Dash, effects: &mut Vec<ParryEffect>) {
        effects.push(ParryEffect::TimeScale(1.0));
        if !took_dash {
            dash.alter_dash_count(-1);
        }
        self.free_dash = None;
    }
}

/// Drive the parry state machine and apply its effects.
#[allow(clippy::needless_pass_by_value)]
pub fn parry_system(
    real_time: Res<Time<Real>>,
    input: Res<InputSnapshot>,
    mut virtual_time: ResMut<Time<Virtual>>,
    mut players: Query<(&mut Parry, &mut Dash)>,
    mut performed: EventWriter<ParryPerformed>,
    mut parried: EventWriter<HostileParried>,
) {
    let frame = ParryInput {
        parry: input.performed(Action::Parry),
        jump: input.performed(Action::Jump),
        real_dt: real_time.delta_seconds(),
    };
    for (mut parry, mut dash) in &mut players {
        for effect in parry.tick(&frame, &mut dash) {
            match effect {
                ParryEffect::Swing => {
                    performed.send(ParryPerformed);
                }
                ParryEffect::Parried(target) => {
                    debug!("Parried {:?} {:?}", target.kind, target.entity);
                    parried.send(HostileParried { target });
                }
                ParryEffect::TimeScale(scale) => virtual_time.set_relative_speed(scale),
            }
        }
    }
}
