//! Authoritative simulation
//!
//! Owns the map, the game state and the RNG, and advances them one frame at a
//! time. Single-player and host sessions drive this; clients never do.
//!
//! Within a playing tick the order is fixed: reloads, downed resolution,
//! human movement, bot AI, human shooting, drops, objective, regen, then the
//! death check and wave countdown.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;
use tracing::{debug, info};

use crate::game::constants::{timing, wave};
use crate::game::map::TileMap;
use crate::game::progression::{Perk, Profile};
use crate::game::state::{GamePhase, GameState, Human, HumanInput, Key, PlayerId};
use crate::game::systems::ai::{self, AiTuning};
use crate::game::systems::combat;
use crate::game::systems::economy::{self, ShopOutcome};
use crate::game::systems::movement;
use crate::game::systems::waves::{self, ObjectiveEvent};
use crate::game::weapons::WeaponKind;

/// Remotes are re-placed this far from the local player on restart
const RESTART_SPAWN_DIST: f32 = 4.5;

/// Notable things that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    WaveStarted { wave: u32 },
    ZoneDefended { reward: u32 },
    WaveCleared { wave: u32 },
    BotsKilled { by: PlayerId, count: u32 },
    HumanDowned { id: PlayerId },
    HumanRevived { id: PlayerId },
    HumanBledOut { id: PlayerId },
    PhaseChanged { from: GamePhase, to: GamePhase },
    LevelUp { level: u32 },
}

pub struct Simulation {
    map: TileMap,
    state: GameState,
    rng: StdRng,
    /// Seconds of simulated time since construction
    now: f64,
    profile: Profile,
    pub tuning: AiTuning,
}

impl Simulation {
    /// New game on the built-in arena with wave 1 already spawned
    pub fn new(local_name: &str, profile: Profile, seed: Option<u64>) -> Self {
        Self::with_map(TileMap::arena(), local_name, profile, seed)
    }

    pub fn with_map(map: TileMap, local_name: &str, profile: Profile, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut sim = Self {
            map,
            state: GameState::new(Human::local(local_name)),
            rng,
            now: 0.0,
            profile,
            tuning: AiTuning::default(),
        };
        sim.refresh_local_modifiers();
        let local = sim.state.local_mut();
        local.health = local.max_health();
        sim.start_wave(&mut Vec::new());
        sim
    }

    #[inline]
    pub fn map(&self) -> &TileMap {
        &self.map
    }

    #[inline]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[inline]
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    #[inline]
    pub fn now(&self) -> f64 {
        self.now
    }

    #[inline]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    #[inline]
    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn set_shared_money(&mut self, shared: bool) {
        self.state.shared_money = shared;
    }

    /// Replace the local player's held input. The angle is absolute.
    pub fn set_local_input(&mut self, input: HumanInput) {
        let local = self.state.local_mut();
        local.angle = input.angle;
        local.input = input;
    }

    /// Record a remote peer's latest input. Returns false for unknown ids.
    pub fn set_remote_input(&mut self, id: &str, input: HumanInput) -> bool {
        match self.state.human_mut(id) {
            Some(remote) => {
                remote.angle = input.angle;
                remote.input = input;
                true
            }
            None => false,
        }
    }

    /// Add a remote human away from the local player. Returns its index.
    pub fn add_remote(&mut self, id: impl Into<PlayerId>, name: &str) -> usize {
        let cells = self.map.reachable_from(self.state.local().position);
        let position = waves::pick_spawn_far_from_point(
            &self.map,
            &cells,
            self.state.local().position,
            wave::REMOTE_JOIN_MIN_DIST,
            &mut self.rng,
        );
        let angle = self.rng.gen_range(0.0..TAU);
        let human = Human::new(id, name, position, angle);
        info!("Remote {} ({}) joined at ({:.1}, {:.1})", human.name, human.id, position.x, position.y);
        self.state.humans.push(human);
        self.state.humans.len() - 1
    }

    pub fn remove_remote(&mut self, id: &str) -> bool {
        match self.state.remove_human(id) {
            Some(h) => {
                info!("Remote {} ({}) left", h.name, h.id);
                true
            }
            None => false,
        }
    }

    /// Shop request for the human `id`. Ignored outside the playing phase.
    pub fn buy_or_equip(&mut self, id: &str, weapon: WeaponKind) -> Option<ShopOutcome> {
        if self.state.phase != GamePhase::Playing {
            return None;
        }
        let now = self.now;
        let human = self.state.human_mut(id)?;
        Some(economy::buy_or_equip(human, weapon, now))
    }

    /// Spend a perk point on the local profile
    pub fn apply_perk(&mut self, perk: Perk) -> bool {
        let applied = self.profile.apply_perk(perk);
        if applied {
            self.refresh_local_modifiers();
        }
        applied
    }

    /// Start over after a wipe. Only accepted from the dead phase.
    pub fn restart(&mut self) -> bool {
        if self.state.phase != GamePhase::Dead {
            return false;
        }

        let remotes: Vec<(PlayerId, String)> = self
            .state
            .remotes()
            .iter()
            .map(|h| (h.id.clone(), h.name.clone()))
            .collect();
        let local_name = self.state.local().name.clone();
        let shared_money = self.state.shared_money;

        self.state = GameState::new(Human::local(local_name));
        self.state.shared_money = shared_money;
        self.refresh_local_modifiers();
        let local = self.state.local_mut();
        local.health = local.max_health();

        let cells = self.map.reachable_from(self.state.local().position);
        for (id, name) in remotes {
            let position = waves::pick_spawn_far_from_point(
                &self.map,
                &cells,
                self.state.local().position,
                RESTART_SPAWN_DIST,
                &mut self.rng,
            );
            let angle = self.rng.gen_range(0.0..TAU);
            self.state.humans.push(Human::new(id, name, position, angle));
        }

        info!("Game restarted with {} humans", self.state.humans.len());
        self.start_wave(&mut Vec::new());
        true
    }

    /// Advance one frame. `dt` is capped to bound the worst-case step.
    pub fn tick(&mut self, dt: f32) -> Vec<SimEvent> {
        let dt = dt.clamp(0.0, timing::MAX_FRAME_DT);
        self.now += dt as f64;
        let mut events = Vec::new();

        for human in &mut self.state.humans {
            human.timers.tick(dt);
        }
        let ping_expired = match &mut self.state.ping {
            Some(ping) => {
                ping.ttl -= dt;
                ping.ttl <= 0.0
            }
            None => false,
        };
        if ping_expired {
            self.state.ping = None;
        }
        for bot in self.state.bots.iter_mut().filter(|b| !b.alive) {
            bot.corpse_ttl = (bot.corpse_ttl - dt).max(0.0);
        }

        match self.state.phase {
            GamePhase::Playing => self.tick_playing(dt, &mut events),
            GamePhase::Glitch => {
                self.state.glitch_timer -= dt;
                if self.state.glitch_timer <= 0.0 {
                    self.set_phase(GamePhase::Bsod, &mut events);
                }
            }
            GamePhase::Bsod | GamePhase::Dead => {}
        }

        events
    }

    fn tick_playing(&mut self, dt: f32, events: &mut Vec<SimEvent>) {
        let now = self.now;

        for human in &mut self.state.humans {
            if let Some((weapon, loaded)) = human.loadout.update_reload(now) {
                debug!("{} reloaded {} (+{})", human.id, weapon.id(), loaded);
            }
        }

        let (revived, bled_out) = movement::update_downed(&mut self.state.humans, dt);
        for idx in revived {
            events.push(SimEvent::HumanRevived {
                id: self.state.humans[idx].id.clone(),
            });
        }
        for idx in bled_out {
            events.push(SimEvent::HumanBledOut {
                id: self.state.humans[idx].id.clone(),
            });
        }

        for human in &mut self.state.humans {
            if !human.is_active() {
                continue;
            }
            movement::move_human(human, &self.map, dt);
            if human.input.keys.contains(Key::Reload) && human.loadout.start_reload(now) {
                debug!("{} reloading {}", human.id, human.loadout.current.id());
            }
            if human.input.keys.contains(Key::Ping) {
                self.state.ping = Some(movement::place_ping(human, &self.map));
            }
        }

        let volley = ai::update_bots(
            &mut self.state.bots,
            &mut self.state.humans,
            &self.map,
            self.state.wave,
            &self.tuning,
            &mut self.rng,
            dt,
        );
        for idx in volley.downed {
            events.push(SimEvent::HumanDowned {
                id: self.state.humans[idx].id.clone(),
            });
        }

        let mut xp = 0;
        let mut crashed = false;
        for idx in 0..self.state.humans.len() {
            let report = combat::handle_shooting(&mut self.state, &self.map, idx, now, &mut self.rng);
            if report.kills > 0 {
                events.push(SimEvent::BotsKilled {
                    by: self.state.humans[idx].id.clone(),
                    count: report.kills,
                });
            }
            xp += report.xp;
            crashed |= report.crashed;
        }

        economy::update_drops(&mut self.state, dt);

        match waves::update_objective(&mut self.state, dt) {
            Some(ObjectiveEvent::ZoneDefended { reward, xp: bonus }) => {
                xp += bonus;
                events.push(SimEvent::ZoneDefended { reward });
            }
            Some(ObjectiveEvent::Eliminated { xp: bonus }) => {
                xp += bonus;
                events.push(SimEvent::WaveCleared { wave: self.state.wave });
            }
            None => {}
        }

        for human in &mut self.state.humans {
            movement::regen(human, dt);
        }

        self.award_xp(xp, events);

        if crashed {
            self.state.glitch_timer = timing::GLITCH_DURATION;
            self.set_phase(GamePhase::Glitch, events);
            return;
        }

        if self.state.all_humans_out() {
            self.set_phase(GamePhase::Dead, events);
            return;
        }

        if waves::advance_wave_timer(&mut self.state, dt) {
            let wave = self.start_wave(events);
            events.push(SimEvent::WaveStarted { wave });
        }
    }

    fn start_wave(&mut self, events: &mut Vec<SimEvent>) -> u32 {
        let vitality = self.profile.perks.vitality;
        let xp = waves::spawn_wave(&mut self.state, &self.map, vitality, &mut self.rng);
        self.award_xp(xp, events);
        self.state.wave
    }

    fn award_xp(&mut self, xp: u32, events: &mut Vec<SimEvent>) {
        if self.profile.gain_xp(xp) > 0 {
            self.refresh_local_modifiers();
            events.push(SimEvent::LevelUp {
                level: self.profile.level,
            });
        }
    }

    fn refresh_local_modifiers(&mut self) {
        self.state.local_mut().modifiers = self.profile.modifiers();
    }

    fn set_phase(&mut self, to: GamePhase, events: &mut Vec<SimEvent>) {
        let from = self.state.phase;
        if from == to {
            return;
        }
        info!("Game state {:?} -> {:?}", from, to);
        self.state.phase = to;
        events.push(SimEvent::PhaseChanged { from, to });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{Bot, BotKind, KeySet};
    use crate::util::vec2::Vec2;

    fn room() -> TileMap {
        TileMap::from_rows(&[
            "##############",
            "#............#",
            "#............#",
            "#............#",
            "#............#",
            "#............#",
            "##############",
        ])
    }

    fn sim_in_room() -> Simulation {
        Simulation::with_map(room(), "Host", Profile::default(), Some(7))
    }

    fn aim(sim: &mut Simulation, angle: f32, shoot: bool) {
        sim.set_local_input(HumanInput {
            keys: KeySet::empty(),
            angle,
            shoot,
        });
    }

    #[test]
    fn test_new_game_starts_wave_one() {
        let sim = Simulation::new("Host", Profile::default(), Some(1));
        assert_eq!(sim.state().wave, 1);
        assert_eq!(sim.state().alive_bots(), 6);
        assert_eq!(sim.phase(), GamePhase::Playing);
        assert_eq!(sim.state().local().health, 100.0);
        assert_eq!(sim.state().local().id, "host");
    }

    #[test]
    fn test_pistol_hits_and_kills_bot_ahead() {
        let mut sim = sim_in_room();
        let mut bot = Bot::spawn(99, BotKind::Grunt, Vec2::new(6.6, 2.6), 1);
        bot.ai_cooldown = 10.0;
        bot.fire_cooldown = 10.0;
        let max = bot.max_health;
        sim.state_mut().bots = vec![bot];
        aim(&mut sim, 0.0, true);

        sim.tick(0.016);
        let after_one = sim.state().bots[0].health;
        let headshot = max - 24.0 * 1.7;
        assert!((after_one - headshot).abs() < 1e-3, "health {} after one shot", after_one);

        for _ in 0..8 {
            sim.tick(0.05);
        }
        let bot = &sim.state().bots[0];
        assert!(!bot.alive);
        let drops = &sim.state().drops;
        assert!((1..=2).contains(&drops.len()));
        assert!(drops.iter().all(|d| d.position.distance_to(bot.position) < 0.25));
    }

    #[test]
    fn test_rpg_glitches_then_bluescreens() {
        let mut sim = sim_in_room();
        sim.state_mut().bots.clear();
        let local = sim.state_mut().local_mut();
        local.loadout.grant(WeaponKind::Rpg);
        local.loadout.equip(WeaponKind::Rpg);
        local.loadout.clip[WeaponKind::Rpg] = 1;
        aim(&mut sim, 0.0, true);

        let events = sim.tick(0.016);
        assert_eq!(sim.phase(), GamePhase::Glitch);
        assert!(events.contains(&SimEvent::PhaseChanged {
            from: GamePhase::Playing,
            to: GamePhase::Glitch
        }));

        for _ in 0..30 {
            sim.tick(0.05);
        }
        assert_eq!(sim.phase(), GamePhase::Bsod);
        assert!(!sim.restart(), "bsod is terminal");
        assert_eq!(sim.buy_or_equip("host", WeaponKind::Pistol), None);
    }

    #[test]
    fn test_wipe_and_restart() {
        let mut sim = sim_in_room();
        sim.add_remote("p1", "Remote");
        assert!(!sim.restart(), "restart only from dead");

        for human in &mut sim.state_mut().humans {
            human.health = 0.0;
        }
        sim.tick(0.016);
        assert_eq!(sim.phase(), GamePhase::Dead);

        assert!(sim.restart());
        assert_eq!(sim.phase(), GamePhase::Playing);
        assert_eq!(sim.state().wave, 1);
        assert_eq!(sim.state().humans.len(), 2);
        assert!(sim.state().humans.iter().all(|h| h.is_active()));
    }

    #[test]
    fn test_cleared_wave_advances_after_delay() {
        let mut sim = sim_in_room();
        sim.state_mut().bots.iter_mut().for_each(Bot::kill);

        let mut events = Vec::new();
        for _ in 0..70 {
            events.extend(sim.tick(0.05));
        }
        assert!(events.contains(&SimEvent::WaveCleared { wave: 1 }));
        assert!(events.contains(&SimEvent::WaveStarted { wave: 2 }));
        assert_eq!(sim.state().wave, 2);
        assert_eq!(sim.state().alive_bots(), 8);
    }

    #[test]
    fn test_remote_join_input_and_leave() {
        let mut sim = Simulation::new("Host", Profile::default(), Some(3));
        let idx = sim.add_remote("p1", "Remote");
        assert_eq!(idx, 1);
        let remote = &sim.state().humans[1];
        assert!(remote.position.distance_to(sim.state().local().position) >= 6.0);

        let input = HumanInput {
            keys: KeySet::empty().with(Key::Forward),
            angle: 1.0,
            shoot: false,
        };
        assert!(sim.set_remote_input("p1", input));
        assert!(!sim.set_remote_input("p9", input));
        assert_eq!(sim.state().humans[1].angle, 1.0);

        assert!(!sim.remove_remote("host"));
        assert!(sim.remove_remote("p1"));
        assert_eq!(sim.state().humans.len(), 1);
    }

    #[test]
    fn test_remote_purchase_uses_remote_money() {
        let mut sim = sim_in_room();
        sim.add_remote("p1", "Remote");
        sim.state_mut().humans[1].money = 1000;
        assert_eq!(sim.buy_or_equip("p1", WeaponKind::Rifle), Some(ShopOutcome::Purchased));
        assert_eq!(sim.state().humans[1].money, 220);
        assert_eq!(sim.state().local().money, 0);
        assert_eq!(sim.buy_or_equip("p7", WeaponKind::Rifle), None);
    }

    #[test]
    fn test_level_up_refreshes_modifiers() {
        let mut sim = sim_in_room();
        let mut events = Vec::new();
        sim.award_xp(500, &mut events);
        assert!(matches!(events.as_slice(), [SimEvent::LevelUp { .. }]));
        assert!(sim.apply_perk(Perk::Vitality));
        assert_eq!(sim.state().local().max_health(), 110.0);
    }
}
