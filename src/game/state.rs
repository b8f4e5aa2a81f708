//! Simulation state: humans, bots, pickups, objective and game phase.

use serde::{Deserialize, Serialize};

use crate::game::constants::{bot, downed, fx, net, player, wave};
use crate::game::progression::CombatModifiers;
use crate::game::timers::{Timer, TimerBank};
use crate::game::weapons::Loadout;
use crate::util::vec2::Vec2;

/// Stable identity of a human participant ("host", "p1", "p2", ...)
pub type PlayerId = String;

/// Per-session bot identifier
pub type BotId = u32;

/// Held-key actions a human can send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Forward,
    Back,
    StrafeLeft,
    StrafeRight,
    Sprint,
    TurnLeft,
    TurnRight,
    Revive,
    Reload,
    Ping,
}

impl Key {
    pub const ALL: [Key; 10] = [
        Key::Forward,
        Key::Back,
        Key::StrafeLeft,
        Key::StrafeRight,
        Key::Sprint,
        Key::TurnLeft,
        Key::TurnRight,
        Key::Revive,
        Key::Reload,
        Key::Ping,
    ];

    pub const fn wire_name(self) -> &'static str {
        match self {
            Key::Forward => "w",
            Key::Back => "s",
            Key::StrafeLeft => "a",
            Key::StrafeRight => "d",
            Key::Sprint => "shift",
            Key::TurnLeft => "left",
            Key::TurnRight => "right",
            Key::Revive => "e",
            Key::Reload => "r",
            Key::Ping => "q",
        }
    }

    /// Parse a wire key name; anything outside the allowlist is rejected
    pub fn from_wire(name: &str) -> Option<Key> {
        match name {
            "shift_l" | "shift_r" => Some(Key::Sprint),
            other => Self::ALL.into_iter().find(|k| k.wire_name() == other),
        }
    }

    #[inline]
    const fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// Set of held keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeySet(u16);

impl KeySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub fn contains(&self, key: Key) -> bool {
        self.0 & key.bit() != 0
    }

    pub fn insert(&mut self, key: Key) {
        self.0 |= key.bit();
    }

    pub fn remove(&mut self, key: Key) {
        self.0 &= !key.bit();
    }

    pub fn with(mut self, key: Key) -> Self {
        self.insert(key);
        self
    }

    /// Build from wire names, silently dropping unknown keys
    pub fn from_wire<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::empty();
        for name in names {
            if let Some(key) = Key::from_wire(name.as_ref()) {
                set.insert(key);
            }
        }
        set
    }

    pub fn to_wire(&self) -> Vec<String> {
        Key::ALL
            .into_iter()
            .filter(|k| self.contains(*k))
            .map(|k| k.wire_name().to_string())
            .collect()
    }
}

/// Most recent control state for one human
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HumanInput {
    pub keys: KeySet,
    /// Absolute facing angle
    pub angle: f32,
    pub shoot: bool,
}

/// A human participant: the local player or a host-side remote twin
#[derive(Debug, Clone)]
pub struct Human {
    pub id: PlayerId,
    pub name: String,
    pub position: Vec2,
    pub angle: f32,
    pub health: f32,
    pub money: u32,
    pub downed: bool,
    pub bleed_out: f32,
    pub revive_progress: f32,
    pub time_since_damage: f32,
    /// Bearing of the last damage source
    pub last_damage_from: f32,
    pub loadout: Loadout,
    pub timers: TimerBank,
    pub input: HumanInput,
    pub modifiers: CombatModifiers,
}

impl Human {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, position: Vec2, angle: f32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            angle,
            health: player::BASE_MAX_HEALTH,
            money: 0,
            downed: false,
            bleed_out: 0.0,
            revive_progress: 0.0,
            time_since_damage: 0.0,
            last_damage_from: 0.0,
            loadout: Loadout::new(),
            timers: TimerBank::new(),
            input: HumanInput {
                angle,
                ..HumanInput::default()
            },
            modifiers: CombatModifiers::default(),
        }
    }

    /// The local player at the arena start point
    pub fn local(name: impl Into<String>) -> Self {
        Self::new(
            net::HOST_ID,
            name,
            Vec2::new(player::START_X, player::START_Y),
            player::START_ANGLE,
        )
    }

    /// Can move, shoot and be targeted
    #[inline]
    pub fn is_active(&self) -> bool {
        self.health > 0.0 && !self.downed
    }

    /// Out of the fight until the next wave
    #[inline]
    pub fn is_out(&self) -> bool {
        self.health <= 0.0 && !self.downed
    }

    #[inline]
    pub fn max_health(&self) -> f32 {
        self.modifiers.max_health
    }

    /// Apply incoming damage from `source`. Returns true if this hit downed
    /// the human.
    pub fn take_damage(&mut self, amount: f32, source: Vec2) -> bool {
        if self.is_out() {
            return false;
        }
        self.last_damage_from = (source - self.position).angle();
        self.timers.set(Timer::DamageDirection, fx::DAMAGE_DIRECTION);
        self.timers.set(Timer::DamageFlash, fx::DAMAGE_FLASH);
        self.time_since_damage = 0.0;

        if self.downed {
            self.bleed_out -= amount * downed::BLEED_DAMAGE_FACTOR;
            return false;
        }

        self.health -= amount;
        if self.health <= 0.0 {
            self.downed = true;
            self.bleed_out = downed::BLEED_OUT;
            self.health = 1.0;
            self.revive_progress = 0.0;
            return true;
        }
        false
    }

    pub fn revive(&mut self) {
        self.downed = false;
        self.bleed_out = 0.0;
        self.revive_progress = 0.0;
        self.health = downed::REVIVED_HEALTH.min(self.max_health());
    }
}

/// Bot archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotKind {
    Grunt,
    Flanker,
    Tank,
    Sharpshooter,
    Boss,
}

/// Multiplier-based stat deltas for one archetype
#[derive(Debug, Clone, Copy)]
pub struct Archetype {
    pub hp: f32,
    pub speed: f32,
    pub attack_range: f32,
    pub hit_bonus: f32,
    pub damage_min_bonus: i32,
    pub damage_max_bonus: i32,
    pub money: f32,
}

static ARCHETYPES: [Archetype; 5] = [
    // grunt
    Archetype { hp: 1.0, speed: 1.0, attack_range: 11.5, hit_bonus: 0.0, damage_min_bonus: 0, damage_max_bonus: 0, money: 1.0 },
    // flanker
    Archetype { hp: 0.8, speed: 1.3, attack_range: 9.5, hit_bonus: -0.04, damage_min_bonus: -1, damage_max_bonus: 0, money: 1.1 },
    // tank
    Archetype { hp: 2.1, speed: 0.72, attack_range: 9.0, hit_bonus: -0.06, damage_min_bonus: 2, damage_max_bonus: 4, money: 1.6 },
    // sharpshooter
    Archetype { hp: 0.85, speed: 0.9, attack_range: 15.0, hit_bonus: 0.1, damage_min_bonus: 1, damage_max_bonus: 3, money: 1.3 },
    // boss
    Archetype { hp: 5.0, speed: 0.85, attack_range: 13.0, hit_bonus: 0.06, damage_min_bonus: 5, damage_max_bonus: 9, money: 4.0 },
];

impl BotKind {
    #[inline]
    pub fn archetype(self) -> &'static Archetype {
        &ARCHETYPES[self as usize]
    }

    /// Regular-wave kind from a uniform roll in `[0, 1)`
    pub fn from_roll(roll: f32) -> Self {
        if roll < 0.56 {
            BotKind::Grunt
        } else if roll < 0.76 {
            BotKind::Flanker
        } else if roll < 0.92 {
            BotKind::Sharpshooter
        } else {
            BotKind::Tank
        }
    }
}

/// Bot behavioural mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tactic {
    #[default]
    Advance,
    Pressure,
    Cover,
    Flank,
}

#[derive(Debug, Clone)]
pub struct Bot {
    pub id: BotId,
    pub kind: BotKind,
    pub position: Vec2,
    /// Point the bot is steering toward
    pub move_target: Vec2,
    pub facing: f32,
    pub health: f32,
    pub max_health: f32,
    pub speed: f32,
    pub alive: bool,
    pub tactic: Tactic,
    pub fire_cooldown: f32,
    pub ai_cooldown: f32,
    pub radius: f32,
    pub attack_range: f32,
    pub hit_bonus: f32,
    pub damage_min: i32,
    pub damage_max: i32,
    pub money_multiplier: f32,
    /// Remaining corpse display time after death
    pub corpse_ttl: f32,
}

impl Bot {
    /// Build a bot of `kind` scaled for `wave_number`
    pub fn spawn(id: BotId, kind: BotKind, position: Vec2, wave_number: u32) -> Self {
        let arch = kind.archetype();
        let w = wave_number as f32;
        let hp = (bot::BASE_HP + w * bot::HP_PER_WAVE) * arch.hp;
        let speed = (bot::BASE_SPEED + (w * bot::SPEED_PER_WAVE).min(bot::MAX_SPEED_BONUS)) * arch.speed;

        Self {
            id,
            kind,
            position,
            move_target: position,
            facing: 0.0,
            health: hp,
            max_health: hp,
            speed,
            alive: true,
            tactic: Tactic::Advance,
            fire_cooldown: 0.0,
            ai_cooldown: 0.0,
            radius: bot::RADIUS,
            attack_range: arch.attack_range,
            hit_bonus: arch.hit_bonus,
            damage_min: (bot::BASE_DAMAGE_MIN + arch.damage_min_bonus).max(1),
            damage_max: (bot::BASE_DAMAGE_MAX + arch.damage_max_bonus).max(2),
            money_multiplier: arch.money,
            corpse_ttl: 0.0,
        }
    }

    pub fn kill(&mut self) {
        self.alive = false;
        self.health = self.health.min(0.0);
        self.corpse_ttl = bot::CORPSE_TTL;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoneyDrop {
    pub position: Vec2,
    pub value: u32,
    pub ttl: f32,
}

/// Per-wave goal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Objective {
    Eliminate,
    DefendZone {
        center: Vec2,
        radius: f32,
        /// Seconds of occupation still required
        remaining: f32,
    },
}

impl Objective {
    pub const fn type_id(&self) -> &'static str {
        match self {
            Objective::Eliminate => "eliminate",
            Objective::DefendZone { .. } => "defend_zone",
        }
    }

    pub fn timer(&self) -> f32 {
        match self {
            Objective::Eliminate => 0.0,
            Objective::DefendZone { remaining, .. } => *remaining,
        }
    }

    /// `[x, y, radius]` of the zone, if any
    pub fn zone(&self) -> Option<[f32; 3]> {
        match self {
            Objective::Eliminate => None,
            Objective::DefendZone { center, radius, .. } => Some([center.x, center.y, *radius]),
        }
    }

    pub fn from_wire(kind: &str, timer: f32, zone: Option<[f32; 3]>) -> Self {
        match (kind, zone) {
            ("defend_zone", Some([x, y, r])) => Objective::DefendZone {
                center: Vec2::new(x, y),
                radius: r,
                remaining: timer,
            },
            _ => Objective::Eliminate,
        }
    }
}

/// Exactly one of these is active at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Playing,
    Glitch,
    Bsod,
    Dead,
}

/// Shared map marker placed by a human
#[derive(Debug, Clone, PartialEq)]
pub struct TeamPing {
    pub position: Vec2,
    pub ttl: f32,
    pub owner: String,
}

#[derive(Debug, Clone)]
pub struct GameState {
    /// Index 0 is always the local player
    pub humans: Vec<Human>,
    pub bots: Vec<Bot>,
    pub drops: Vec<MoneyDrop>,
    pub wave: u32,
    pub phase: GamePhase,
    pub objective: Objective,
    /// Countdown to the next spawn, once the wave is over
    pub wave_timer: Option<f32>,
    pub glitch_timer: f32,
    /// Clear reward still owed for the current wave
    pub wave_reward_pending: bool,
    pub ping: Option<TeamPing>,
    pub shared_money: bool,
    next_bot_id: BotId,
}

impl GameState {
    pub fn new(local: Human) -> Self {
        Self {
            humans: vec![local],
            bots: Vec::new(),
            drops: Vec::new(),
            wave: 0,
            phase: GamePhase::Playing,
            objective: Objective::Eliminate,
            wave_timer: None,
            glitch_timer: 0.0,
            wave_reward_pending: false,
            ping: None,
            shared_money: false,
            next_bot_id: 1,
        }
    }

    #[inline]
    pub fn local(&self) -> &Human {
        &self.humans[0]
    }

    #[inline]
    pub fn local_mut(&mut self) -> &mut Human {
        &mut self.humans[0]
    }

    pub fn human_index(&self, id: &str) -> Option<usize> {
        self.humans.iter().position(|h| h.id == id)
    }

    pub fn human(&self, id: &str) -> Option<&Human> {
        self.humans.iter().find(|h| h.id == id)
    }

    pub fn human_mut(&mut self, id: &str) -> Option<&mut Human> {
        self.humans.iter_mut().find(|h| h.id == id)
    }

    /// Remote humans (everyone but the local player)
    pub fn remotes(&self) -> &[Human] {
        &self.humans[1..]
    }

    /// Remove a remote human. The local player cannot be removed.
    pub fn remove_human(&mut self, id: &str) -> Option<Human> {
        let idx = self.human_index(id)?;
        if idx == 0 {
            return None;
        }
        Some(self.humans.remove(idx))
    }

    pub fn alloc_bot_id(&mut self) -> BotId {
        let id = self.next_bot_id;
        self.next_bot_id = self.next_bot_id.wrapping_add(1);
        id
    }

    pub fn alive_bots(&self) -> usize {
        self.bots.iter().filter(|b| b.alive).count()
    }

    pub fn living_bots(&self) -> impl Iterator<Item = &Bot> {
        self.bots.iter().filter(|b| b.alive)
    }

    /// Every human is at zero health and not downed
    pub fn all_humans_out(&self) -> bool {
        self.humans.iter().all(Human::is_out)
    }

    /// Credit `amount` to the human at `collector`, or split it across every
    /// human when money is shared.
    pub fn award_money(&mut self, collector: usize, amount: u32) {
        if amount == 0 || collector >= self.humans.len() {
            return;
        }
        if !self.shared_money {
            self.humans[collector].money += amount;
            return;
        }
        let n = self.humans.len() as u32;
        let share = amount / n;
        let remainder = (amount % n) as usize;
        for (i, h) in self.humans.iter_mut().enumerate() {
            h.money += share + u32::from(i < remainder);
        }
    }

    /// Defend-zone objective for the current wave number
    pub fn defend_zone(center: Vec2, wave_number: u32) -> Objective {
        Objective::DefendZone {
            center,
            radius: wave::ZONE_RADIUS,
            remaining: (wave::DEFEND_BASE_TIME + wave_number as f32 * wave::DEFEND_TIME_PER_WAVE)
                .min(wave::DEFEND_MAX_TIME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_remotes(n: usize) -> GameState {
        let mut state = GameState::new(Human::local("Host"));
        for i in 1..=n {
            state.humans.push(Human::new(format!("p{}", i), format!("R{}", i), Vec2::new(3.0, 3.0), 0.0));
        }
        state
    }

    #[test]
    fn test_keyset_allowlist() {
        let keys = KeySet::from_wire(["w", "shift_l", "F12", "e", "rm -rf"]);
        assert!(keys.contains(Key::Forward));
        assert!(keys.contains(Key::Sprint));
        assert!(keys.contains(Key::Revive));
        assert!(!keys.contains(Key::Back));
        assert_eq!(keys.to_wire(), vec!["w", "shift", "e"]);
    }

    #[test]
    fn test_damage_downs_then_bleeds() {
        let mut h = Human::local("A");
        assert!(!h.take_damage(60.0, Vec2::new(5.0, 2.6)));
        assert!(h.take_damage(60.0, Vec2::new(5.0, 2.6)));
        assert!(h.downed);
        assert_eq!(h.health, 1.0);
        assert!(!h.is_active() && !h.is_out());

        h.take_damage(50.0, Vec2::new(5.0, 2.6));
        assert!((h.bleed_out - (14.0 - 4.0)).abs() < 1e-4);
        assert_eq!(h.health, 1.0, "downed humans do not lose health");
    }

    #[test]
    fn test_out_humans_ignore_damage() {
        let mut h = Human::local("A");
        h.health = 0.0;
        assert!(h.is_out());
        h.take_damage(10.0, Vec2::ZERO);
        assert_eq!(h.health, 0.0);
    }

    #[test]
    fn test_bot_spawn_scaling() {
        let b = Bot::spawn(1, BotKind::Grunt, Vec2::new(5.5, 5.5), 1);
        assert_eq!(b.health, 72.0);
        assert!((b.speed - 1.24).abs() < 1e-5);
        assert_eq!((b.damage_min, b.damage_max), (4, 9));

        let late = Bot::spawn(2, BotKind::Grunt, Vec2::ZERO, 40);
        assert!((late.speed - 1.8).abs() < 1e-5, "speed bonus is capped");

        let boss = Bot::spawn(3, BotKind::Boss, Vec2::ZERO, 5);
        assert_eq!(boss.health, 500.0);
        assert_eq!(boss.damage_max, 18);
    }

    #[test]
    fn test_kind_roll_thresholds() {
        assert_eq!(BotKind::from_roll(0.0), BotKind::Grunt);
        assert_eq!(BotKind::from_roll(0.6), BotKind::Flanker);
        assert_eq!(BotKind::from_roll(0.8), BotKind::Sharpshooter);
        assert_eq!(BotKind::from_roll(0.95), BotKind::Tank);
    }

    #[test]
    fn test_shared_money_split() {
        let mut state = state_with_remotes(2);
        state.shared_money = true;
        state.award_money(1, 100);
        let money: Vec<u32> = state.humans.iter().map(|h| h.money).collect();
        assert_eq!(money, vec![34, 33, 33]);

        state.shared_money = false;
        state.award_money(2, 10);
        assert_eq!(state.humans[2].money, 43);
    }

    #[test]
    fn test_remove_human_keeps_local() {
        let mut state = state_with_remotes(2);
        assert!(state.remove_human("host").is_none());
        assert!(state.remove_human("p1").is_some());
        assert_eq!(state.humans.len(), 2);
        assert_eq!(state.remotes()[0].id, "p2");
    }

    #[test]
    fn test_objective_wire_round_trip() {
        let zone = GameState::defend_zone(Vec2::new(4.5, 9.5), 4);
        let back = Objective::from_wire(zone.type_id(), zone.timer(), zone.zone());
        assert_eq!(back, zone);
        assert!((zone.timer() - 13.2).abs() < 1e-4);
        assert_eq!(Objective::from_wire("eliminate", 0.0, None), Objective::Eliminate);
    }
}
