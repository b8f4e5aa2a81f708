//! Bot tactical AI
//!
//! Each bot re-evaluates its tactic on its own randomized cooldown so that a
//! wave does not move in lockstep. Between decisions the bot steers toward
//! its chosen point and fires whenever it has a clear shot.

use rand::seq::SliceRandom;
use rand::Rng;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::f32::consts::{FRAC_PI_2, TAU};

use crate::game::collision::{can_move, line_of_sight, try_move};
use crate::game::constants::{ai, bot as bot_consts};
use crate::game::map::TileMap;
use crate::game::state::{Bot, BotKind, Human, Tactic};
use crate::util::vec2::Vec2;

/// Tunable AI numbers. Defaults come from `constants::ai`.
#[derive(Debug, Clone)]
pub struct AiTuning {
    pub decision_interval: (f32, f32),
    pub fire_cooldown: (f32, f32),
    pub base_hit_chance: f32,
    pub hit_falloff_per_unit: f32,
    pub cover_hit_bonus: f32,
    pub hit_chance_bounds: (f32, f32),
    pub sharpshooter_cover_range: f32,
    pub cover_seek_range: f32,
    pub cover_seek_chance: f32,
    pub flank_range: f32,
    pub pressure_radius: (f32, f32),
    pub flank_radius: (f32, f32),
    pub flank_jitter: f32,
    pub cover_samples: usize,
    pub cover_target_dist: (f32, f32),
    pub cover_max_bot_dist: f32,
    pub cover_exposed_penalty: f32,
    pub snap_attempts: usize,
    pub snap_radius: (f32, f32),
    pub cover_speed_mult: f32,
    pub flank_speed_mult: f32,
}

impl Default for AiTuning {
    fn default() -> Self {
        Self {
            decision_interval: (ai::DECISION_MIN, ai::DECISION_MAX),
            fire_cooldown: (ai::FIRE_COOLDOWN_MIN, ai::FIRE_COOLDOWN_MAX),
            base_hit_chance: ai::BASE_HIT_CHANCE,
            hit_falloff_per_unit: ai::HIT_FALLOFF_PER_UNIT,
            cover_hit_bonus: ai::COVER_HIT_BONUS,
            hit_chance_bounds: (ai::MIN_HIT_CHANCE, ai::MAX_HIT_CHANCE),
            sharpshooter_cover_range: ai::SHARPSHOOTER_COVER_RANGE,
            cover_seek_range: ai::COVER_SEEK_RANGE,
            cover_seek_chance: ai::COVER_SEEK_CHANCE,
            flank_range: ai::FLANK_RANGE,
            pressure_radius: (ai::PRESSURE_RADIUS_MIN, ai::PRESSURE_RADIUS_MAX),
            flank_radius: (ai::FLANK_RADIUS_MIN, ai::FLANK_RADIUS_MAX),
            flank_jitter: ai::FLANK_JITTER,
            cover_samples: ai::COVER_SAMPLES,
            cover_target_dist: (ai::COVER_MIN_TARGET_DIST, ai::COVER_MAX_TARGET_DIST),
            cover_max_bot_dist: ai::COVER_MAX_BOT_DIST,
            cover_exposed_penalty: ai::COVER_EXPOSED_PENALTY,
            snap_attempts: ai::SNAP_ATTEMPTS,
            snap_radius: (ai::SNAP_RADIUS_MIN, ai::SNAP_RADIUS_MAX),
            cover_speed_mult: ai::COVER_SPEED_MULT,
            flank_speed_mult: ai::FLANK_SPEED_MULT,
        }
    }
}

impl AiTuning {
    /// Hit probability for a bot shot at `distance`
    pub fn hit_chance(&self, distance: f32, in_cover: bool, hit_bonus: f32) -> f32 {
        let mut chance = self.base_hit_chance - distance * self.hit_falloff_per_unit + hit_bonus;
        if in_cover {
            chance += self.cover_hit_bonus;
        }
        chance.clamp(self.hit_chance_bounds.0, self.hit_chance_bounds.1)
    }
}

/// Bot shots this tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotVolley {
    pub shots: u32,
    pub hits: u32,
    /// Indices of humans downed by these hits
    pub downed: SmallVec<[usize; 4]>,
}

/// Nearest active human by straight-line distance
pub fn choose_target(bot: &Bot, humans: &[Human]) -> Option<usize> {
    humans
        .iter()
        .enumerate()
        .filter(|(_, h)| h.is_active())
        .min_by(|(_, a), (_, b)| {
            let da = bot.position.distance_sq_to(a.position);
            let db = bot.position.distance_sq_to(b.position);
            da.partial_cmp(&db).unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
}

/// Run AI, movement and firing for every living bot
pub fn update_bots<R: Rng + ?Sized>(
    bots: &mut [Bot],
    humans: &mut [Human],
    map: &TileMap,
    wave_number: u32,
    tuning: &AiTuning,
    rng: &mut R,
    dt: f32,
) -> BotVolley {
    let mut volley = BotVolley::default();

    for bot in bots.iter_mut().filter(|b| b.alive) {
        let Some(target) = choose_target(bot, humans) else {
            continue;
        };
        let target_pos = humans[target].position;

        bot.ai_cooldown -= dt;
        bot.fire_cooldown -= dt;

        let dist = bot.position.distance_to(target_pos);
        let has_los = line_of_sight(map, bot.position, target_pos);

        if bot.ai_cooldown <= 0.0 {
            assign_tactic(bot, target_pos, has_los, dist, map, tuning, rng);
            bot.ai_cooldown = rng.gen_range(tuning.decision_interval.0..tuning.decision_interval.1);
        }

        if bot.tactic == Tactic::Advance {
            bot.move_target = target_pos;
        }
        move_bot(bot, map, tuning, dt);
        bot.facing = (target_pos - bot.position).angle();

        if has_los && dist < bot.attack_range && bot.fire_cooldown <= 0.0 {
            volley.shots += 1;
            let chance = tuning.hit_chance(dist, bot.tactic == Tactic::Cover, bot.hit_bonus);
            if rng.gen::<f32>() < chance {
                let damage = rng.gen_range(bot.damage_min..=bot.damage_max) + (wave_number / 3) as i32;
                volley.hits += 1;
                if humans[target].take_damage(damage as f32, bot.position) {
                    volley.downed.push(target);
                }
            }
            bot.fire_cooldown = rng.gen_range(tuning.fire_cooldown.0..tuning.fire_cooldown.1);
        }
    }

    volley
}

/// Pick a new tactic and move point for `bot`
pub fn assign_tactic<R: Rng + ?Sized>(
    bot: &mut Bot,
    target: Vec2,
    has_los: bool,
    dist: f32,
    map: &TileMap,
    tuning: &AiTuning,
    rng: &mut R,
) {
    if bot.kind == BotKind::Flanker {
        set_flank(bot, target, map, tuning, rng);
        return;
    }

    if bot.kind == BotKind::Sharpshooter && has_los && dist > tuning.sharpshooter_cover_range {
        if let Some(cover) = pick_cover(bot.position, target, map, tuning, rng) {
            bot.move_target = cover;
            bot.tactic = Tactic::Cover;
            return;
        }
    }

    if has_los && dist < tuning.cover_seek_range {
        if rng.gen::<f32>() < tuning.cover_seek_chance {
            if let Some(cover) = pick_cover(bot.position, target, map, tuning, rng) {
                bot.move_target = cover;
                bot.tactic = Tactic::Cover;
                return;
            }
        }
        set_flank(bot, target, map, tuning, rng);
        return;
    }

    if dist > tuning.flank_range {
        set_flank(bot, target, map, tuning, rng);
    } else {
        let angle = rng.gen_range(0.0..TAU);
        let radius = rng.gen_range(tuning.pressure_radius.0..tuning.pressure_radius.1);
        let point = target.offset(angle, radius);
        bot.move_target = snap_to_free(map, point, bot.position, tuning, rng);
        bot.tactic = Tactic::Pressure;
    }
}

fn set_flank<R: Rng + ?Sized>(bot: &mut Bot, target: Vec2, map: &TileMap, tuning: &AiTuning, rng: &mut R) {
    bot.move_target = pick_flank(bot.position, target, map, tuning, rng);
    bot.tactic = Tactic::Flank;
}

/// Best cover point near `target`: sampled cover cells, scored by distance
/// from the bot plus a penalty when the target can still see the cell.
pub fn pick_cover<R: Rng + ?Sized>(
    from: Vec2,
    target: Vec2,
    map: &TileMap,
    tuning: &AiTuning,
    rng: &mut R,
) -> Option<Vec2> {
    let points = map.cover_points();
    if points.is_empty() {
        return None;
    }
    let sample_size = tuning.cover_samples.min(points.len());
    let sample: SmallVec<[Vec2; 24]> = points.choose_multiple(rng, sample_size).copied().collect();

    sample
        .into_iter()
        .filter_map(|p| {
            let to_target = p.distance_to(target);
            if to_target < tuning.cover_target_dist.0 || to_target > tuning.cover_target_dist.1 {
                return None;
            }
            let to_bot = p.distance_to(from);
            if to_bot > tuning.cover_max_bot_dist {
                return None;
            }
            let exposed = line_of_sight(map, target, p);
            let score = to_bot + if exposed { tuning.cover_exposed_penalty } else { 0.0 };
            Some((p, score))
        })
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
        .map(|(p, _)| p)
}

/// Point roughly perpendicular to the bot->target line, around the target
pub fn pick_flank<R: Rng + ?Sized>(
    from: Vec2,
    target: Vec2,
    map: &TileMap,
    tuning: &AiTuning,
    rng: &mut R,
) -> Vec2 {
    let bearing = (target - from).angle();
    let side = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    let angle = bearing + side * FRAC_PI_2 + rng.gen_range(-tuning.flank_jitter..tuning.flank_jitter);
    let radius = rng.gen_range(tuning.flank_radius.0..tuning.flank_radius.1);
    snap_to_free(map, target.offset(angle, radius), from, tuning, rng)
}

/// Return `point` if a bot fits there; otherwise the free sample around
/// `anchor` closest to `point`, or `anchor` itself when every sample fails.
pub fn snap_to_free<R: Rng + ?Sized>(
    map: &TileMap,
    point: Vec2,
    anchor: Vec2,
    tuning: &AiTuning,
    rng: &mut R,
) -> Vec2 {
    if can_move(map, point, bot_consts::SPAWN_CLEARANCE) {
        return point;
    }
    let mut candidates: SmallVec<[Vec2; 10]> = SmallVec::new();
    for _ in 0..tuning.snap_attempts {
        let angle = rng.gen_range(0.0..TAU);
        let radius = rng.gen_range(tuning.snap_radius.0..tuning.snap_radius.1);
        let candidate = anchor.offset(angle, radius);
        if can_move(map, candidate, bot_consts::SPAWN_CLEARANCE) {
            candidates.push(candidate);
        }
    }
    candidates
        .into_iter()
        .min_by(|a, b| {
            a.distance_sq_to(point)
                .partial_cmp(&b.distance_sq_to(point))
                .unwrap_or(Ordering::Equal)
        })
        .unwrap_or(anchor)
}

/// Step toward `move_target`, capped by speed and resolved per axis
pub fn move_bot(bot: &mut Bot, map: &TileMap, tuning: &AiTuning, dt: f32) {
    let delta = bot.move_target - bot.position;
    let dist = delta.length();
    if dist < ai::ARRIVE_DISTANCE {
        return;
    }
    let speed = match bot.tactic {
        Tactic::Cover => bot.speed * tuning.cover_speed_mult,
        Tactic::Flank => bot.speed * tuning.flank_speed_mult,
        Tactic::Advance | Tactic::Pressure => bot.speed,
    };
    let step = dist.min(speed * dt);
    bot.position = try_move(map, bot.position, delta * (step / dist), bot.radius);
}
