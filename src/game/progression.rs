//! Local player progression: XP, levels, perks and the stat multipliers they
//! grant.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::config::{read_json, write_json, PersistError};
use crate::game::constants::{player, progression};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perk {
    Vitality,
    Mobility,
    Regen,
    Weapon,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerkRanks {
    pub vitality: u32,
    pub mobility: u32,
    pub regen: u32,
    pub weapon: u32,
}

impl PerkRanks {
    fn rank_mut(&mut self, perk: Perk) -> &mut u32 {
        match perk {
            Perk::Vitality => &mut self.vitality,
            Perk::Mobility => &mut self.mobility,
            Perk::Regen => &mut self.regen,
            Perk::Weapon => &mut self.weapon,
        }
    }

    pub fn rank(&self, perk: Perk) -> u32 {
        match perk {
            Perk::Vitality => self.vitality,
            Perk::Mobility => self.mobility,
            Perk::Regen => self.regen,
            Perk::Weapon => self.weapon,
        }
    }
}

/// Stat multipliers applied to one human
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatModifiers {
    pub max_health: f32,
    pub move_speed: f32,
    pub regen: f32,
    pub damage: f32,
    pub spread: f32,
    pub recoil: f32,
}

impl Default for CombatModifiers {
    fn default() -> Self {
        Self {
            max_health: player::BASE_MAX_HEALTH,
            move_speed: 1.0,
            regen: 1.0,
            damage: 1.0,
            spread: 1.0,
            recoil: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub level: u32,
    pub xp: u32,
    pub perk_points: u32,
    pub attachment_tier: u32,
    pub perks: PerkRanks,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            level: 1,
            xp: 0,
            perk_points: 0,
            attachment_tier: 0,
            perks: PerkRanks::default(),
        }
    }
}

impl Profile {
    pub fn load(path: &Path) -> Self {
        match read_json::<Profile>(path) {
            Ok(p) => p.sanitized(),
            Err(PersistError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => {
                warn!("Could not read profile, starting fresh: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        write_json(path, self)
    }

    pub fn sanitized(mut self) -> Self {
        self.level = self.level.max(1);
        for perk in [Perk::Vitality, Perk::Mobility, Perk::Regen, Perk::Weapon] {
            let rank = self.perks.rank_mut(perk);
            *rank = (*rank).min(progression::MAX_PERK_RANK);
        }
        self
    }

    pub fn xp_to_next_level(&self) -> u32 {
        progression::XP_BASE + self.level * progression::XP_PER_LEVEL
    }

    /// Add XP, applying any level-ups. Returns the number of levels gained.
    pub fn gain_xp(&mut self, amount: u32) -> u32 {
        if amount == 0 {
            return 0;
        }
        self.xp = self.xp.saturating_add(amount);
        let mut gained = 0;
        while self.xp >= self.xp_to_next_level() {
            self.xp -= self.xp_to_next_level();
            self.level += 1;
            self.perk_points += 1;
            gained += 1;
            if self.level % progression::TIER_EVERY_LEVELS == 0 {
                self.attachment_tier += 1;
            }
        }
        if gained > 0 {
            info!(
                "Level up: L{} (perk points: {}, tier: {})",
                self.level, self.perk_points, self.attachment_tier
            );
        }
        gained
    }

    /// Spend one perk point. Fails without points or at the rank cap.
    pub fn apply_perk(&mut self, perk: Perk) -> bool {
        if self.perk_points == 0 {
            return false;
        }
        let rank = self.perks.rank_mut(perk);
        if *rank >= progression::MAX_PERK_RANK {
            return false;
        }
        *rank += 1;
        self.perk_points -= 1;
        true
    }

    pub fn modifiers(&self) -> CombatModifiers {
        let tier = self.attachment_tier as f32;
        CombatModifiers {
            max_health: player::BASE_MAX_HEALTH + self.perks.vitality as f32 * 10.0,
            move_speed: 1.0 + self.perks.mobility as f32 * 0.05,
            regen: 1.0 + self.perks.regen as f32 * 0.14,
            damage: 1.0 + self.perks.weapon as f32 * 0.06 + tier * 0.02,
            spread: (1.0 - tier * 0.03).max(0.6),
            recoil: (1.0 - tier * 0.025).max(0.65),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_curve() {
        let mut p = Profile::default();
        assert_eq!(p.xp_to_next_level(), 165);
        assert_eq!(p.gain_xp(164), 0);
        assert_eq!(p.gain_xp(1), 1);
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 0);
        assert_eq!(p.perk_points, 1);
    }

    #[test]
    fn test_multi_level_and_tier() {
        let mut p = Profile::default();
        // L1->2 needs 165, L2->3 needs 230
        assert_eq!(p.gain_xp(165 + 230 + 5), 2);
        assert_eq!(p.level, 3);
        assert_eq!(p.attachment_tier, 1);
        assert_eq!(p.xp, 5);
    }

    #[test]
    fn test_perk_cap() {
        let mut p = Profile {
            perk_points: 20,
            ..Profile::default()
        };
        for _ in 0..8 {
            assert!(p.apply_perk(Perk::Vitality));
        }
        assert!(!p.apply_perk(Perk::Vitality));
        assert_eq!(p.perk_points, 12);
        assert_eq!(p.modifiers().max_health, 180.0);
    }

    #[test]
    fn test_modifier_floors() {
        let p = Profile {
            attachment_tier: 40,
            ..Profile::default()
        };
        let m = p.modifiers();
        assert_eq!(m.spread, 0.6);
        assert_eq!(m.recoil, 0.65);
    }

    #[test]
    fn test_sanitize_clamps_ranks() {
        let raw = r#"{"level": 0, "perks": {"regen": 99}}"#;
        let p: Profile = serde_json::from_str(raw).unwrap();
        let p = p.sanitized();
        assert_eq!(p.level, 1);
        assert_eq!(p.perks.regen, 8);
        assert_eq!(p.perks.rank(Perk::Weapon), 0);
    }
}
