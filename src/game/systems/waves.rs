//! Wave spawning, spawn-point selection and objective progress.
//!
//! Spawn selection never fails: each stage relaxes a constraint, and the
//! last resort is the reference position itself.

use rand::seq::SliceRandom;
use rand::Rng;
use std::cmp::Ordering;
use tracing::info;

use crate::game::collision::can_move;
use crate::game::constants::{bot as bot_consts, timing, wave};
use crate::game::map::{Cell, TileMap};
use crate::game::state::{Bot, BotKind, GameState, Human, Objective};
use crate::util::vec2::Vec2;

/// Free cell centres from `cells`, paired with their distance to `reference`
fn free_candidates<'a>(
    map: &'a TileMap,
    cells: &'a [Cell],
    reference: Vec2,
) -> impl Iterator<Item = (Vec2, f32)> + 'a {
    cells
        .iter()
        .map(|&(cx, cy)| Vec2::cell_center(cx, cy))
        .filter(move |p| can_move(map, *p, bot_consts::SPAWN_CLEARANCE))
        .map(move |p| (p, p.distance_to(reference)))
}

fn farthest(candidates: &[(Vec2, f32)]) -> Option<Vec2> {
    candidates
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(p, _)| *p)
}

/// Random candidate at least `min_dist` away, else the farthest one
fn choose_far<R: Rng + ?Sized>(candidates: &[(Vec2, f32)], min_dist: f32, rng: &mut R) -> Option<Vec2> {
    let far: Vec<Vec2> = candidates
        .iter()
        .filter(|(_, d)| *d >= min_dist)
        .map(|(p, _)| *p)
        .collect();
    far.choose(rng).copied().or_else(|| farthest(candidates))
}

/// Free cell at least `min_dist` from `reference` when one exists, else the
/// farthest free cell, else `reference`.
pub fn pick_spawn_far_from_point<R: Rng + ?Sized>(
    map: &TileMap,
    cells: &[Cell],
    reference: Vec2,
    min_dist: f32,
    rng: &mut R,
) -> Vec2 {
    let candidates: Vec<(Vec2, f32)> = free_candidates(map, cells, reference).collect();
    choose_far(&candidates, min_dist, rng).unwrap_or(reference)
}

/// Spawn point for a bot, kept clear of living bots and far from `player`
pub fn pick_bot_spawn<R: Rng + ?Sized>(
    map: &TileMap,
    cells: &[Cell],
    bots: &[Bot],
    player: Vec2,
    rng: &mut R,
) -> Vec2 {
    let clear_of_bots = |p: Vec2, spacing: f32| {
        bots.iter()
            .filter(|b| b.alive)
            .all(|b| b.position.distance_to(p) >= spacing)
    };

    let all: Vec<(Vec2, f32)> = free_candidates(map, cells, player).collect();

    for spacing in [wave::SPAWN_BOT_SPACING, wave::SPAWN_RELAXED_SPACING] {
        let spaced: Vec<(Vec2, f32)> = all.iter().copied().filter(|(p, _)| clear_of_bots(*p, spacing)).collect();
        if let Some(p) = choose_far(&spaced, wave::SPAWN_PREFERRED_DIST, rng) {
            return p;
        }
    }

    farthest(&all).unwrap_or(player)
}

/// Begin the next wave. Returns the XP awarded for reaching it.
///
/// `vitality` is the local player's vitality perk rank.
pub fn spawn_wave<R: Rng + ?Sized>(state: &mut GameState, map: &TileMap, vitality: u32, rng: &mut R) -> u32 {
    state.wave += 1;
    let n = state.wave;
    let count = (wave::BASE_COUNT + wave::COUNT_PER_WAVE * n as usize).min(wave::MAX_COUNT);
    state.wave_reward_pending = true;
    state.wave_timer = None;

    let cells = map.reachable_from(state.local().position);

    // The local player settles first; remotes then respawn away from
    // wherever it ended up
    let local_anchor = state.local().position;
    let local_bonus = wave::RESPAWN_HEALTH_PER_VITALITY * vitality as f32;
    restore_human(state.local_mut(), map, &cells, local_anchor, local_bonus, rng);

    let anchor = state.local().position;
    for human in state.humans.iter_mut().skip(1) {
        restore_human(human, map, &cells, anchor, 0.0, rng);
    }

    state.bots.retain(|b| b.alive);
    let player = state.local().position;

    state.objective = if n % wave::DEFEND_EVERY == 0 {
        let center = pick_bot_spawn(map, &cells, &state.bots, player, rng);
        GameState::defend_zone(center, n)
    } else {
        Objective::Eliminate
    };

    let xp = if n > 1 { 14 + n * 2 } else { 0 };

    for _ in 0..count {
        let kind = BotKind::from_roll(rng.gen::<f32>());
        spawn_bot(state, map, &cells, kind, player, rng);
    }
    if n % wave::BOSS_EVERY == 0 {
        spawn_bot(state, map, &cells, BotKind::Boss, player, rng);
    }

    info!(
        "Wave {} spawned: {} bots, objective {}",
        n,
        state.alive_bots(),
        state.objective.type_id()
    );
    xp
}

/// Respawn a human who is out, or top up a survivor
fn restore_human<R: Rng + ?Sized>(
    human: &mut Human,
    map: &TileMap,
    cells: &[Cell],
    anchor: Vec2,
    respawn_bonus: f32,
    rng: &mut R,
) {
    if human.is_out() {
        human.health = wave::RESPAWN_HEALTH + respawn_bonus;
        human.position = pick_spawn_far_from_point(map, cells, anchor, wave::RESPAWN_MIN_DIST, rng);
    } else {
        human.health = (human.health + wave::SURVIVOR_HEAL).min(human.max_health());
    }
    human.downed = false;
    human.bleed_out = 0.0;
    human.revive_progress = 0.0;
}

fn spawn_bot<R: Rng + ?Sized>(
    state: &mut GameState,
    map: &TileMap,
    cells: &[Cell],
    kind: BotKind,
    player: Vec2,
    rng: &mut R,
) {
    let pos = pick_bot_spawn(map, cells, &state.bots, player, rng);
    let id = state.alloc_bot_id();
    state.bots.push(Bot::spawn(id, kind, pos, state.wave));
}

/// Objective state change observed this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveEvent {
    /// The zone was held long enough; carries the money paid out
    ZoneDefended { reward: u32, xp: u32 },
    /// Every bot of the wave is down
    Eliminated { xp: u32 },
}

/// Run the defend-zone timer and pay out clear rewards once per wave
pub fn update_objective(state: &mut GameState, dt: f32) -> Option<ObjectiveEvent> {
    let n = state.wave;
    match state.objective {
        Objective::DefendZone { center, radius, remaining } => {
            let occupied = state
                .humans
                .iter()
                .any(|h| h.is_active() && h.position.distance_to(center) <= radius);
            let remaining = if occupied { (remaining - dt).max(0.0) } else { remaining };
            state.objective = Objective::DefendZone { center, radius, remaining };
            if remaining > 0.0 || !state.wave_reward_pending {
                return None;
            }
            state.wave_reward_pending = false;
            let reward = wave::DEFEND_REWARD_BASE + n * wave::DEFEND_REWARD_PER_WAVE;
            state.award_money(0, reward);
            state.bots.clear();
            state.wave_timer = Some(timing::WAVE_DELAY);
            info!("Zone defended on wave {}, reward {}", n, reward);
            Some(ObjectiveEvent::ZoneDefended {
                reward,
                xp: 45 + n * 4,
            })
        }
        Objective::Eliminate => {
            if state.alive_bots() > 0 || !state.wave_reward_pending {
                return None;
            }
            state.wave_reward_pending = false;
            Some(ObjectiveEvent::Eliminated { xp: 30 + n * 3 })
        }
    }
}

/// Whether the current wave's goal is met
pub fn objective_complete(state: &GameState) -> bool {
    match state.objective {
        Objective::DefendZone { remaining, .. } => remaining <= 0.0,
        Objective::Eliminate => state.alive_bots() == 0,
    }
}

/// Count down to the next wave while the objective is complete. Returns true
/// when the next wave should spawn.
pub fn advance_wave_timer(state: &mut GameState, dt: f32) -> bool {
    if !objective_complete(state) {
        state.wave_timer = None;
        return false;
    }
    let timer = state.wave_timer.get_or_insert(timing::WAVE_DELAY);
    *timer -= dt;
    if *timer <= 0.0 {
        state.wave_timer = None;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_spawn_far_prefers_distance() {
        let map = TileMap::arena();
        let start = Vec2::new(2.6, 2.6);
        let cells = map.reachable_from(start);
        let mut rng = rng();
        for _ in 0..20 {
            let p = pick_spawn_far_from_point(&map, &cells, start, 6.0, &mut rng);
            assert!(p.distance_to(start) >= 6.0);
            assert!(can_move(&map, p, bot_consts::SPAWN_CLEARANCE));
        }
    }

    #[test]
    fn test_spawn_in_small_room_uses_farthest() {
        let map = TileMap::from_rows(&["#####", "#...#", "#####"]);
        let start = Vec2::new(1.5, 1.5);
        let cells = map.reachable_from(start);
        let p = pick_spawn_far_from_point(&map, &cells, start, 6.5, &mut rng());
        assert_eq!(p, Vec2::new(3.5, 1.5));
    }

    #[test]
    fn test_spawn_degenerate_cells() {
        let map = TileMap::from_rows(&["###", "#.#", "###"]);
        let start = Vec2::new(1.5, 1.5);
        let cells = map.reachable_from(start);
        assert_eq!(pick_spawn_far_from_point(&map, &cells, start, 6.5, &mut rng()), start);
        let elsewhere = Vec2::new(7.0, 7.0);
        assert_eq!(pick_spawn_far_from_point(&map, &[], elsewhere, 6.5, &mut rng()), elsewhere);
    }

    #[test]
    fn test_bot_spawn_fallback_chain() {
        let map = TileMap::from_rows(&["######", "#....#", "######"]);
        let player = Vec2::new(1.5, 1.5);
        let cells = map.reachable_from(player);

        // Every cell is occupied: falls through to the farthest free cell
        let crowded: Vec<Bot> = (0..4u32)
            .map(|i| Bot::spawn(i, BotKind::Grunt, Vec2::cell_center(i as usize + 1, 1), 1))
            .collect();
        assert_eq!(pick_bot_spawn(&map, &cells, &crowded, player, &mut rng()), Vec2::new(4.5, 1.5));

        // No cell clears 0.8, three clear 0.35; the farthest of those wins
        let near: Vec<Bot> = [1.9, 3.1, 4.4]
            .iter()
            .enumerate()
            .map(|(i, &x)| Bot::spawn(i as u32, BotKind::Grunt, Vec2::new(x, 1.5), 1))
            .collect();
        assert_eq!(pick_bot_spawn(&map, &cells, &near, player, &mut rng()), Vec2::new(3.5, 1.5));

        // Dead bots do not block
        let mut dead = crowded.clone();
        dead.iter_mut().for_each(Bot::kill);
        let p = pick_bot_spawn(&map, &cells, &dead, player, &mut rng());
        assert_eq!(p, Vec2::new(4.5, 1.5));
    }

    #[test]
    fn test_wave_counts_and_boss() {
        let map = TileMap::arena();
        let mut state = GameState::new(Human::local("A"));
        let mut rng = rng();
        assert_eq!(spawn_wave(&mut state, &map, 0, &mut rng), 0);
        assert_eq!(state.wave, 1);
        assert_eq!(state.bots.len(), 6);
        assert!(state.wave_reward_pending);

        state.wave = 4;
        state.bots.iter_mut().for_each(Bot::kill);
        let xp = spawn_wave(&mut state, &map, 0, &mut rng);
        assert_eq!(xp, 24);
        assert_eq!(state.bots.len(), 15, "14 regular plus a boss");
        assert_eq!(state.bots.iter().filter(|b| b.kind == BotKind::Boss).count(), 1);
        assert_eq!(state.objective, Objective::Eliminate);
    }

    #[test]
    fn test_defend_wave_and_respawn() {
        let map = TileMap::arena();
        let mut state = GameState::new(Human::local("A"));
        state.humans.push(Human::new("p1", "B", Vec2::new(2.6, 3.6), 0.0));
        state.humans[1].health = 0.0;
        state.local_mut().health = 50.0;
        state.wave = 3;
        let mut rng = rng();
        spawn_wave(&mut state, &map, 2, &mut rng);

        assert!(matches!(state.objective, Objective::DefendZone { .. }));
        assert_eq!(state.bots.len(), 12);
        assert_eq!(state.local().health, 62.0);
        assert_eq!(state.humans[1].health, 65.0);
        assert!(state.humans[1].position.distance_to(state.local().position) >= wave::RESPAWN_MIN_DIST);
    }

    #[test]
    fn test_remotes_respawn_away_from_respawned_local() {
        let map = TileMap::arena();
        let mut state = GameState::new(Human::local("A"));
        for (i, x) in [8.5, 14.5, 20.5].iter().enumerate() {
            let id = format!("p{}", i + 1);
            state.humans.push(Human::new(id.clone(), id, Vec2::new(*x, 2.5), 0.0));
        }
        state.humans.iter_mut().for_each(|h| h.health = 0.0);

        for seed in 0..8 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut round = state.clone();
            spawn_wave(&mut round, &map, 0, &mut rng);

            let local = round.local().position;
            assert!(local.distance_to(state.local().position) >= wave::RESPAWN_MIN_DIST);
            for remote in &round.humans[1..] {
                assert!(remote.position.distance_to(local) >= wave::RESPAWN_MIN_DIST, "seed {}", seed);
            }
        }
    }

    #[test]
    fn test_zone_timer_needs_occupant() {
        let mut state = GameState::new(Human::new("host", "A", Vec2::new(2.5, 2.5), 0.0));
        state.wave = 4;
        state.wave_reward_pending = true;
        state.objective = Objective::DefendZone {
            center: Vec2::new(10.5, 10.5),
            radius: 2.4,
            remaining: 1.0,
        };
        assert_eq!(update_objective(&mut state, 0.5), None);
        assert_eq!(state.objective.timer(), 1.0);

        state.local_mut().position = Vec2::new(10.0, 10.0);
        assert_eq!(update_objective(&mut state, 0.6), None);
        let event = update_objective(&mut state, 0.6);
        assert_eq!(event, Some(ObjectiveEvent::ZoneDefended { reward: 122, xp: 61 }));
        assert_eq!(state.local().money, 122);
        assert_eq!(state.wave_timer, Some(timing::WAVE_DELAY));
        assert_eq!(update_objective(&mut state, 0.6), None, "paid once");
    }

    #[test]
    fn test_eliminate_then_wave_timer() {
        let mut state = GameState::new(Human::local("A"));
        state.wave = 2;
        state.wave_reward_pending = true;
        assert_eq!(update_objective(&mut state, 0.1), Some(ObjectiveEvent::Eliminated { xp: 36 }));

        assert!(!advance_wave_timer(&mut state, 1.0));
        assert!(!advance_wave_timer(&mut state, 2.0));
        assert!(advance_wave_timer(&mut state, 0.3));
        assert_eq!(state.wave_timer, None);
    }
}
