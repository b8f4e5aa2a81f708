//! Hitscan shooting for humans and bot kill handling.

use rand::Rng;

use crate::game::collision::line_of_sight;
use crate::game::constants::{bot as bot_consts, drops, fx};
use crate::game::map::TileMap;
use crate::game::state::{Bot, GameState, MoneyDrop};
use crate::game::timers::Timer;
use crate::game::weapons::{FireBlocked, WeaponKind};
use crate::util::vec2::Vec2;

/// First bot struck along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BotHit {
    pub index: usize,
    /// Distance along the ray to the bot's centre projection
    pub along: f32,
    /// Perpendicular distance from the ray to the bot's centre
    pub perp: f32,
    pub headshot: bool,
}

/// Result of one trigger pull
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShotReport {
    pub weapon: Option<WeaponKind>,
    pub blocked: Option<FireBlocked>,
    pub hits: u32,
    pub headshots: u32,
    pub kills: u32,
    /// XP earned by kills
    pub xp: u32,
    /// The terminal weapon was fired
    pub crashed: bool,
}

/// Closest living bot hit by a ray from `origin` along `angle`.
///
/// A bot qualifies when its projection lies in `(0, range]`, its centre is
/// within `radius` of the ray and the shooter can see it. Ties on distance
/// keep the earlier bot in slice order.
pub fn first_bot_hit(map: &TileMap, bots: &[Bot], origin: Vec2, angle: f32, range: f32) -> Option<BotHit> {
    let dir = Vec2::from_angle(angle);
    let mut best: Option<BotHit> = None;

    for (index, bot) in bots.iter().enumerate() {
        if !bot.alive {
            continue;
        }
        let to_bot = bot.position - origin;
        let along = to_bot.dot(dir);
        if along <= 0.0 || along > range {
            continue;
        }
        let perp = dir.cross(to_bot).abs();
        if perp > bot.radius {
            continue;
        }
        if best.is_some_and(|b| along >= b.along) {
            continue;
        }
        if !line_of_sight(map, origin, bot.position) {
            continue;
        }
        best = Some(BotHit {
            index,
            along,
            perp,
            headshot: perp <= bot.radius * bot_consts::HEADSHOT_FRACTION,
        });
    }

    best
}

/// Fire the current weapon of `shooter` if the trigger is held and the gate
/// allows it. Terminal weapons deal no damage; they flag `crashed` instead.
pub fn handle_shooting<R: Rng + ?Sized>(
    state: &mut GameState,
    map: &TileMap,
    shooter: usize,
    now: f64,
    rng: &mut R,
) -> ShotReport {
    let mut report = ShotReport::default();
    let Some(human) = state.humans.get_mut(shooter) else {
        return report;
    };
    if !human.is_active() || !human.input.shoot {
        return report;
    }

    let kind = match human.loadout.try_fire(now) {
        Ok(kind) => kind,
        Err(blocked) => {
            report.blocked = Some(blocked);
            return report;
        }
    };
    report.weapon = Some(kind);
    let stats = kind.stats();

    human.timers.set(Timer::WeaponKick, fx::WEAPON_KICK);
    human.timers.raise(Timer::MuzzleFlash, fx::MUZZLE_FLASH * stats.flash_scale);

    if kind.is_terminal() {
        report.crashed = true;
        return report;
    }

    human.timers.add(Timer::SpreadHeat, stats.spread_growth);
    let heat = human.timers.get(Timer::SpreadHeat);
    let modifiers = human.modifiers;
    let origin = human.position;
    let base_angle = human.angle;
    let spread = stats.spread * modifiers.spread * (1.0 + heat * fx::HEAT_SPREAD_FACTOR);

    let mut pellet_angles = Vec::with_capacity(stats.pellets as usize);
    for _ in 0..stats.pellets {
        let recoil = human.loadout.next_recoil(kind) * modifiers.recoil;
        let jitter = if spread > 0.0 { rng.gen_range(-spread..spread) } else { 0.0 };
        pellet_angles.push(base_angle + recoil + jitter);
    }

    for angle in pellet_angles {
        let Some(hit) = first_bot_hit(map, &state.bots, origin, angle, stats.range) else {
            continue;
        };
        let mut damage = stats.damage * modifiers.damage;
        if hit.headshot {
            damage *= bot_consts::HEADSHOT_MULTIPLIER;
            report.headshots += 1;
        }
        report.hits += 1;

        let bot = &mut state.bots[hit.index];
        bot.health -= damage;
        if bot.health <= 0.0 && bot.alive {
            report.kills += 1;
            report.xp += kill_bot(state, hit.index, rng);
        }
    }

    let loadout = &mut state.humans[shooter].loadout;
    if !stats.infinite && loadout.clip[kind] == 0 && !loadout.start_reload(now) && loadout.reserve[kind] == 0 {
        // Dry with nothing to reload from
        loadout.equip(WeaponKind::SIDEARM);
    }

    report
}

/// Mark a bot dead, scatter its money and return the XP it is worth
pub fn kill_bot<R: Rng + ?Sized>(state: &mut GameState, index: usize, rng: &mut R) -> u32 {
    let wave = state.wave;
    let bot = &mut state.bots[index];
    bot.kill();
    let position = bot.position;
    let money_mult = bot.money_multiplier;

    let count = if rng.gen_bool(drops::SINGLE_DROP_CHANCE) { 1 } else { 2 };
    for _ in 0..count {
        let base = rng.gen_range(drops::VALUE_MIN..=drops::VALUE_MAX) + wave as i32 * drops::VALUE_PER_WAVE;
        let value = (base as f32 * money_mult) as u32;
        let offset = Vec2::new(
            rng.gen_range(-drops::SCATTER..drops::SCATTER),
            rng.gen_range(-drops::SCATTER..drops::SCATTER),
        );
        state.drops.push(MoneyDrop {
            position: position + offset,
            value,
            ttl: drops::TTL,
        });
    }

    (10.0 + wave as f32 * 0.8 + money_mult * 4.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{BotKind, Human};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn corridor() -> TileMap {
        TileMap::from_rows(&[
            "############",
            "#..........#",
            "#..........#",
            "#..........#",
            "############",
        ])
    }

    fn bot_at(id: u32, x: f32, y: f32) -> Bot {
        Bot::spawn(id, BotKind::Grunt, Vec2::new(x, y), 1)
    }

    #[test]
    fn test_first_hit_is_nearest_along_ray() {
        let map = corridor();
        let bots = vec![bot_at(1, 8.5, 2.5), bot_at(2, 5.5, 2.6), bot_at(3, 3.5, 3.4)];
        let hit = first_bot_hit(&map, &bots, Vec2::new(1.5, 2.5), 0.0, 15.0).unwrap();
        assert_eq!(hit.index, 1);
        assert!((hit.along - 4.0).abs() < 1e-4);
        assert!(hit.perp <= bots[1].radius);
    }

    #[test]
    fn test_first_hit_ignores_wide_behind_and_dead() {
        let map = corridor();
        let mut bots = vec![bot_at(1, 0.5, 2.5), bot_at(2, 4.5, 2.9), bot_at(3, 6.5, 2.5)];
        bots[2].alive = false;
        assert_eq!(first_bot_hit(&map, &bots, Vec2::new(1.5, 2.5), 0.0, 15.0), None);
    }

    #[test]
    fn test_first_hit_respects_range_and_walls() {
        let map = TileMap::from_rows(&["#########", "#...#...#", "#########"]);
        let bots = vec![bot_at(1, 6.5, 1.5)];
        assert_eq!(first_bot_hit(&map, &bots, Vec2::new(1.5, 1.5), 0.0, 15.0), None, "wall between");

        let open = corridor();
        assert_eq!(first_bot_hit(&open, &bots, Vec2::new(1.5, 1.5), 0.0, 3.0), None, "out of range");
    }

    #[test]
    fn test_headshot_band() {
        let map = corridor();
        let centre = vec![bot_at(1, 5.5, 2.5)];
        assert!(first_bot_hit(&map, &centre, Vec2::new(1.5, 2.5), 0.0, 15.0).unwrap().headshot);
        let edge = vec![bot_at(1, 5.5, 2.7)];
        assert!(!first_bot_hit(&map, &edge, Vec2::new(1.5, 2.5), 0.0, 15.0).unwrap().headshot);
    }

    #[test]
    fn test_tie_keeps_slice_order() {
        let map = corridor();
        let bots = vec![bot_at(1, 5.5, 2.55), bot_at(2, 5.5, 2.45)];
        let hit = first_bot_hit(&map, &bots, Vec2::new(1.5, 2.5), 0.0, 15.0).unwrap();
        assert_eq!(hit.index, 0);
    }

    #[test]
    fn test_kill_bot_drops_money() {
        let mut state = GameState::new(Human::local("A"));
        state.wave = 2;
        state.bots.push(bot_at(1, 5.5, 2.5));
        let mut rng = StdRng::seed_from_u64(9);
        let xp = kill_bot(&mut state, 0, &mut rng);
        assert!(!state.bots[0].alive);
        assert!((1..=2).contains(&state.drops.len()));
        for d in &state.drops {
            assert!(d.position.distance_to(Vec2::new(5.5, 2.5)) < 0.25);
            assert!(d.value >= 36 && d.value <= 70);
        }
        assert_eq!(xp, 15);
    }

    #[test]
    fn test_shooting_requires_trigger() {
        let map = corridor();
        let mut state = GameState::new(Human::new("host", "A", Vec2::new(1.5, 2.5), 0.0));
        state.bots.push(bot_at(1, 5.5, 2.5));
        let mut rng = StdRng::seed_from_u64(1);
        let report = handle_shooting(&mut state, &map, 0, 0.0, &mut rng);
        assert_eq!(report, ShotReport::default());
        assert_eq!(state.bots[0].health, state.bots[0].max_health);
    }

    #[test]
    fn test_rpg_crashes_without_damage() {
        let map = corridor();
        let mut state = GameState::new(Human::new("host", "A", Vec2::new(1.5, 2.5), 0.0));
        state.bots.push(bot_at(1, 5.5, 2.5));
        let h = state.local_mut();
        h.loadout.grant(WeaponKind::Rpg);
        h.loadout.equip(WeaponKind::Rpg);
        h.loadout.clip[WeaponKind::Rpg] = 1;
        h.loadout.reserve[WeaponKind::Rpg] = 0;
        h.input.shoot = true;
        let mut rng = StdRng::seed_from_u64(1);
        let report = handle_shooting(&mut state, &map, 0, 0.0, &mut rng);
        assert!(report.crashed);
        assert_eq!(report.hits, 0);
        assert_eq!(state.local().loadout.clip[WeaponKind::Rpg], 0);
    }

    #[test]
    fn test_empty_clip_reloads_after_last_round() {
        let map = corridor();
        let mut state = GameState::new(Human::new("host", "A", Vec2::new(1.5, 2.5), 3.14));
        let h = state.local_mut();
        h.loadout.grant(WeaponKind::Rifle);
        h.loadout.equip(WeaponKind::Rifle);
        h.loadout.clip[WeaponKind::Rifle] = 1;
        h.input.shoot = true;
        let mut rng = StdRng::seed_from_u64(1);
        let report = handle_shooting(&mut state, &map, 0, 0.0, &mut rng);
        assert_eq!(report.weapon, Some(WeaponKind::Rifle));
        assert!(state.local().loadout.is_reloading());
    }

    #[test]
    fn test_last_round_without_reserve_switches_to_sidearm() {
        let map = corridor();
        let mut state = GameState::new(Human::new("host", "A", Vec2::new(1.5, 2.5), 3.14));
        let h = state.local_mut();
        h.loadout.grant(WeaponKind::Shotgun);
        h.loadout.equip(WeaponKind::Shotgun);
        h.loadout.clip[WeaponKind::Shotgun] = 1;
        h.loadout.reserve[WeaponKind::Shotgun] = 0;
        h.input.shoot = true;
        let mut rng = StdRng::seed_from_u64(1);
        let report = handle_shooting(&mut state, &map, 0, 0.0, &mut rng);
        assert_eq!(report.weapon, Some(WeaponKind::Shotgun));

        let loadout = &state.local().loadout;
        assert_eq!(loadout.current, WeaponKind::SIDEARM);
        assert!(!loadout.is_reloading());
        assert!(loadout.owned[WeaponKind::Shotgun]);
    }
}
