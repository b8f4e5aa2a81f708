//! Weapon table and per-human loadout state
//!
//! Every weapon-indexed quantity (ownership, reserve, clip, recoil index) is a
//! fixed array addressed by [`WeaponKind`], so a missing entry is a compile
//! error rather than a runtime lookup failure.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Weapon identifiers, in shop order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    Pistol,
    Shotgun,
    Rifle,
    Rpg,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 4] = [
        WeaponKind::Pistol,
        WeaponKind::Shotgun,
        WeaponKind::Rifle,
        WeaponKind::Rpg,
    ];

    /// Always-owned fallback weapon
    pub const SIDEARM: WeaponKind = WeaponKind::Pistol;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn stats(self) -> &'static WeaponStats {
        &WEAPONS[self.index()]
    }

    /// Wire / config identifier
    pub const fn id(self) -> &'static str {
        match self {
            WeaponKind::Pistol => "pistol",
            WeaponKind::Shotgun => "shotgun",
            WeaponKind::Rifle => "rifle",
            WeaponKind::Rpg => "rpg",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|w| w.id() == id)
    }

    /// Firing this weapon crashes the game into the glitch/BSOD sequence
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, WeaponKind::Rpg)
    }
}

/// Static per-weapon record
#[derive(Debug, Clone, Copy)]
pub struct WeaponStats {
    pub name: &'static str,
    pub cost: u32,
    pub damage: f32,
    /// Seconds between shots
    pub fire_rate: f32,
    /// Half-angle of the uniform spread cone (radians)
    pub spread: f32,
    pub pellets: u32,
    pub range: f32,
    pub ammo_pack: u32,
    pub mag_size: u32,
    pub reload_time: f32,
    pub recoil_scale: f32,
    /// Heat added per shot
    pub spread_growth: f32,
    pub infinite: bool,
    pub flash_scale: f32,
    pub recoil_pattern: &'static [f32],
}

pub static WEAPONS: [WeaponStats; 4] = [
    WeaponStats {
        name: "Pistol",
        cost: 0,
        damage: 24.0,
        fire_rate: 0.32,
        spread: 0.018,
        pellets: 1,
        range: 13.0,
        ammo_pack: 9999,
        mag_size: 12,
        reload_time: 1.1,
        recoil_scale: 1.0,
        spread_growth: 0.06,
        infinite: true,
        flash_scale: 1.0,
        recoil_pattern: &[0.0, 0.004, -0.003, 0.005, -0.004, 0.003],
    },
    WeaponStats {
        name: "Shotgun",
        cost: 320,
        damage: 12.0,
        fire_rate: 0.8,
        spread: 0.14,
        pellets: 7,
        range: 8.5,
        ammo_pack: 36,
        mag_size: 6,
        reload_time: 1.9,
        recoil_scale: 1.4,
        spread_growth: 0.14,
        infinite: false,
        flash_scale: 1.35,
        recoil_pattern: &[0.0, -0.008, 0.007, -0.005],
    },
    WeaponStats {
        name: "Assault Rifle",
        cost: 780,
        damage: 17.0,
        fire_rate: 0.11,
        spread: 0.028,
        pellets: 1,
        range: 15.0,
        ammo_pack: 120,
        mag_size: 30,
        reload_time: 1.6,
        recoil_scale: 1.0,
        spread_growth: 0.05,
        infinite: false,
        flash_scale: 1.0,
        recoil_pattern: &[0.0, 0.003, -0.002, 0.004, -0.003, 0.002, 0.003, -0.002],
    },
    WeaponStats {
        name: "RPG",
        cost: 1800,
        damage: 160.0,
        fire_rate: 1.2,
        spread: 0.01,
        pellets: 1,
        range: 15.0,
        ammo_pack: 1,
        mag_size: 1,
        reload_time: 2.4,
        recoil_scale: 0.5,
        spread_growth: 0.0,
        infinite: false,
        flash_scale: 1.8,
        recoil_pattern: &[0.0],
    },
];

/// One value per weapon, indexed by [`WeaponKind`].
///
/// Serialized as an object keyed by weapon id (`{"pistol": .., "rpg": ..}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "WeaponMap<T>", into = "WeaponMap<T>")]
#[serde(bound(
    serialize = "T: Serialize + Clone",
    deserialize = "T: Deserialize<'de> + Default"
))]
pub struct PerWeapon<T>(pub [T; 4]);

impl<T: Copy> PerWeapon<T> {
    pub fn splat(value: T) -> Self {
        Self([value; 4])
    }
}

impl<T> PerWeapon<T> {
    pub fn iter(&self) -> impl Iterator<Item = (WeaponKind, &T)> {
        WeaponKind::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<WeaponKind> for PerWeapon<T> {
    type Output = T;
    fn index(&self, kind: WeaponKind) -> &T {
        &self.0[kind.index()]
    }
}

impl<T> IndexMut<WeaponKind> for PerWeapon<T> {
    fn index_mut(&mut self, kind: WeaponKind) -> &mut T {
        &mut self.0[kind.index()]
    }
}

#[derive(Serialize, Deserialize)]
struct WeaponMap<T> {
    #[serde(default)]
    pistol: T,
    #[serde(default)]
    shotgun: T,
    #[serde(default)]
    rifle: T,
    #[serde(default)]
    rpg: T,
}

impl<T> From<WeaponMap<T>> for PerWeapon<T> {
    fn from(m: WeaponMap<T>) -> Self {
        Self([m.pistol, m.shotgun, m.rifle, m.rpg])
    }
}

impl<T> From<PerWeapon<T>> for WeaponMap<T> {
    fn from(p: PerWeapon<T>) -> Self {
        let [pistol, shotgun, rifle, rpg] = p.0;
        Self {
            pistol,
            shotgun,
            rifle,
            rpg,
        }
    }
}

/// In-progress reload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reload {
    pub weapon: WeaponKind,
    pub ends_at: f64,
}

/// Why a trigger pull did not produce a shot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireBlocked {
    Reloading,
    Cooldown,
    /// Clip was empty; a reload has been started
    EmptyReloading,
    /// Clip and reserve were empty; switched to the sidearm
    EmptySwitched,
    Empty,
}

/// Weapons, ammunition and timing for one human
#[derive(Debug, Clone, PartialEq)]
pub struct Loadout {
    pub current: WeaponKind,
    pub owned: PerWeapon<bool>,
    pub reserve: PerWeapon<u32>,
    pub clip: PerWeapon<u32>,
    pub recoil_index: PerWeapon<usize>,
    pub reload: Option<Reload>,
    pub next_fire_at: f64,
}

impl Default for Loadout {
    fn default() -> Self {
        Self::new()
    }
}

impl Loadout {
    /// Fresh spawn loadout: sidearm only, full sidearm clip
    pub fn new() -> Self {
        let sidearm = WeaponKind::SIDEARM;
        let mut owned = PerWeapon::splat(false);
        let mut reserve = PerWeapon::splat(0);
        let mut clip = PerWeapon::splat(0);
        owned[sidearm] = true;
        reserve[sidearm] = sidearm.stats().ammo_pack;
        clip[sidearm] = sidearm.stats().mag_size;

        Self {
            current: sidearm,
            owned,
            reserve,
            clip,
            recoil_index: PerWeapon::splat(0),
            reload: None,
            next_fire_at: 0.0,
        }
    }

    #[inline]
    pub fn current_stats(&self) -> &'static WeaponStats {
        self.current.stats()
    }

    #[inline]
    pub fn is_reloading(&self) -> bool {
        self.reload.is_some()
    }

    /// Rounds held for `kind` (clip plus reserve)
    pub fn total_ammo(&self, kind: WeaponKind) -> u32 {
        self.clip[kind] + self.reserve[kind]
    }

    /// Begin reloading the current weapon. Returns false if no reload is
    /// possible (infinite, already reloading, full clip or empty reserve).
    pub fn start_reload(&mut self, now: f64) -> bool {
        let kind = self.current;
        let stats = kind.stats();
        if stats.infinite
            || self.reload.is_some()
            || self.clip[kind] >= stats.mag_size
            || self.reserve[kind] == 0
        {
            return false;
        }
        self.reload = Some(Reload {
            weapon: kind,
            ends_at: now + stats.reload_time as f64,
        });
        true
    }

    /// Complete a reload whose timer has elapsed, moving rounds from reserve
    /// into the clip. Returns the weapon and rounds loaded.
    pub fn update_reload(&mut self, now: f64) -> Option<(WeaponKind, u32)> {
        let reload = self.reload?;
        if now < reload.ends_at {
            return None;
        }
        self.reload = None;

        let kind = reload.weapon;
        let needed = kind.stats().mag_size.saturating_sub(self.clip[kind]);
        let loaded = needed.min(self.reserve[kind]);
        self.clip[kind] += loaded;
        self.reserve[kind] -= loaded;
        Some((kind, loaded))
    }

    /// Switch to an owned weapon, cancelling any reload
    pub fn equip(&mut self, kind: WeaponKind) -> bool {
        if !self.owned[kind] {
            return false;
        }
        self.current = kind;
        self.reload = None;
        true
    }

    /// Gate and consume one trigger pull of the current weapon.
    ///
    /// On success one round is removed from the clip (unless infinite) and
    /// the cooldown is armed.
    pub fn try_fire(&mut self, now: f64) -> Result<WeaponKind, FireBlocked> {
        if self.reload.is_some() {
            return Err(FireBlocked::Reloading);
        }
        if now < self.next_fire_at {
            return Err(FireBlocked::Cooldown);
        }

        let kind = self.current;
        let stats = kind.stats();
        if !stats.infinite && self.clip[kind] == 0 {
            if self.start_reload(now) {
                return Err(FireBlocked::EmptyReloading);
            }
            if self.reserve[kind] == 0 && kind != WeaponKind::SIDEARM {
                self.current = WeaponKind::SIDEARM;
                return Err(FireBlocked::EmptySwitched);
            }
            return Err(FireBlocked::Empty);
        }

        self.next_fire_at = now + stats.fire_rate as f64;
        if !stats.infinite {
            self.clip[kind] -= 1;
        }
        Ok(kind)
    }

    /// Next recoil offset for `kind`, cycling through its pattern
    pub fn next_recoil(&mut self, kind: WeaponKind) -> f32 {
        let pattern = kind.stats().recoil_pattern;
        if pattern.is_empty() {
            return 0.0;
        }
        let idx = self.recoil_index[kind];
        self.recoil_index[kind] = idx.wrapping_add(1);
        pattern[idx % pattern.len()] * kind.stats().recoil_scale
    }

    /// Grant ownership plus one ammo pack
    pub fn grant(&mut self, kind: WeaponKind) {
        self.owned[kind] = true;
        self.reserve[kind] = self.reserve[kind].saturating_add(kind.stats().ammo_pack);
    }
}
