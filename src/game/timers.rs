//! Named decaying timers
//!
//! Short-lived presentation state (flashes, kick, heat) lives in one table
//! that is decayed uniformly each tick instead of in scattered fields.

use crate::game::constants::fx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    DamageFlash,
    MuzzleFlash,
    WeaponKick,
    SpreadHeat,
    DamageDirection,
}

impl Timer {
    pub const ALL: [Timer; 5] = [
        Timer::DamageFlash,
        Timer::MuzzleFlash,
        Timer::WeaponKick,
        Timer::SpreadHeat,
        Timer::DamageDirection,
    ];

    /// Units lost per second
    pub const fn decay_rate(self) -> f32 {
        match self {
            Timer::DamageFlash => fx::DAMAGE_FLASH_DECAY,
            Timer::MuzzleFlash => fx::MUZZLE_FLASH_DECAY,
            Timer::WeaponKick => fx::WEAPON_KICK_DECAY,
            Timer::SpreadHeat => fx::SPREAD_HEAT_DECAY,
            Timer::DamageDirection => fx::DAMAGE_DIRECTION_DECAY,
        }
    }

    /// Upper bound for accumulating timers
    pub const fn ceiling(self) -> f32 {
        match self {
            Timer::SpreadHeat => fx::SPREAD_HEAT_MAX,
            _ => f32::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimerBank {
    values: [f32; 5],
}

impl TimerBank {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, timer: Timer) -> f32 {
        self.values[timer as usize]
    }

    pub fn set(&mut self, timer: Timer, value: f32) {
        self.values[timer as usize] = value.clamp(0.0, timer.ceiling());
    }

    /// Raise to at least `value`
    pub fn raise(&mut self, timer: Timer, value: f32) {
        let v = self.get(timer).max(value);
        self.set(timer, v);
    }

    /// Add `amount`, saturating at the timer's ceiling
    pub fn add(&mut self, timer: Timer, amount: f32) {
        let v = self.get(timer) + amount;
        self.set(timer, v);
    }

    #[inline]
    pub fn is_active(&self, timer: Timer) -> bool {
        self.get(timer) > 0.0
    }

    /// Decay every timer toward zero
    pub fn tick(&mut self, dt: f32) {
        for timer in Timer::ALL {
            let v = self.values[timer as usize] - timer.decay_rate() * dt;
            self.values[timer as usize] = v.max(0.0);
        }
    }
}
