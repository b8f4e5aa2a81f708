//! Human locomotion, regeneration, downed resolution and team pings.

use std::f32::consts::FRAC_PI_2;

use crate::game::collision::try_move;
use crate::game::constants::{downed, ping, player};
use crate::game::map::TileMap;
use crate::game::state::{Human, Key, TeamPing};
use crate::util::angle;
use crate::util::vec2::Vec2;

/// Apply held movement and turn keys for one tick
pub fn move_human(human: &mut Human, map: &TileMap, dt: f32) {
    let keys = human.input.keys;
    let base = if keys.contains(Key::Sprint) {
        player::SPRINT_SPEED
    } else {
        player::WALK_SPEED
    };
    let step = base * human.modifiers.move_speed * dt;

    let mut delta = Vec2::ZERO;
    if keys.contains(Key::Forward) {
        delta += Vec2::from_angle(human.angle) * step;
    }
    if keys.contains(Key::Back) {
        delta -= Vec2::from_angle(human.angle) * step;
    }
    if keys.contains(Key::StrafeLeft) {
        delta += Vec2::from_angle(human.angle - FRAC_PI_2) * step;
    }
    if keys.contains(Key::StrafeRight) {
        delta += Vec2::from_angle(human.angle + FRAC_PI_2) * step;
    }

    if keys.contains(Key::TurnLeft) {
        human.angle -= player::TURN_SPEED * dt;
    }
    if keys.contains(Key::TurnRight) {
        human.angle += player::TURN_SPEED * dt;
    }
    human.angle = angle::wrap(human.angle);

    human.position = try_move(map, human.position, delta, player::RADIUS);
}

/// Passive healing after a quiet period
pub fn regen(human: &mut Human, dt: f32) {
    if !human.is_active() {
        return;
    }
    human.time_since_damage += dt;
    let cap = human.max_health();
    if human.health < cap && human.time_since_damage >= player::REGEN_DELAY {
        let rate = player::REGEN_RATE * human.modifiers.regen;
        human.health = (human.health + rate * dt).min(cap);
    }
}

/// Bleed out downed humans and advance revives.
///
/// A downed human gains revive progress while any active human within range
/// holds the revive key; otherwise progress decays. Returns the indices
/// revived and bled out this tick.
pub fn update_downed(humans: &mut [Human], dt: f32) -> (Vec<usize>, Vec<usize>) {
    let mut revived = Vec::new();
    let mut bled_out = Vec::new();

    let rescuers: Vec<Vec2> = humans
        .iter()
        .filter(|h| h.is_active() && h.input.keys.contains(Key::Revive))
        .map(|h| h.position)
        .collect();

    for (idx, human) in humans.iter_mut().enumerate() {
        if !human.downed {
            human.revive_progress = (human.revive_progress - downed::REVIVE_DECAY * dt).max(0.0);
            continue;
        }

        let assisted = rescuers
            .iter()
            .any(|p| p.distance_to(human.position) <= downed::REVIVE_RANGE);
        if assisted {
            human.revive_progress += dt;
            if human.revive_progress >= downed::REVIVE_TIME {
                human.revive();
                revived.push(idx);
                continue;
            }
        } else {
            human.revive_progress = (human.revive_progress - downed::REVIVE_DECAY * dt).max(0.0);
        }

        human.bleed_out -= dt;
        if human.bleed_out <= 0.0 {
            human.downed = false;
            human.health = 0.0;
            human.revive_progress = 0.0;
            bled_out.push(idx);
        }
    }

    (revived, bled_out)
}

/// Marker placed ahead of `human`, pulled in when the far point is solid
pub fn place_ping(human: &Human, map: &TileMap) -> TeamPing {
    let mut position = human.position.offset(human.angle, ping::DISTANCE);
    if map.is_wall_at(position) {
        position = human.position.offset(human.angle, ping::SHORT_DISTANCE);
    }
    TeamPing {
        position,
        ttl: ping::TTL,
        owner: human.name.clone(),
    }
}
