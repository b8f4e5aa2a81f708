//! Money pickups and the weapon shop.

use tracing::debug;

use crate::game::constants::drops;
use crate::game::state::{GameState, Human};
use crate::game::weapons::WeaponKind;

/// Age money drops and hand each one in range to the nearest active human.
/// Returns the total value collected this tick.
pub fn update_drops(state: &mut GameState, dt: f32) -> u32 {
    let mut collected = Vec::new();

    state.drops.retain_mut(|drop| {
        drop.ttl -= dt;
        if drop.ttl <= 0.0 {
            return false;
        }
        let collector = state
            .humans
            .iter()
            .enumerate()
            .filter(|(_, h)| h.is_active())
            .map(|(i, h)| (i, h.position.distance_to(drop.position)))
            .filter(|(_, d)| *d < drops::PICKUP_RADIUS)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        match collector {
            Some((idx, _)) => {
                collected.push((idx, drop.value));
                false
            }
            None => true,
        }
    });

    let mut total = 0;
    for (idx, value) in collected {
        state.award_money(idx, value);
        total += value;
    }
    total
}

/// What a shop request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopOutcome {
    Equipped,
    Purchased,
    TooExpensive,
}

/// Equip `weapon` if owned, otherwise buy it with the human's money
pub fn buy_or_equip(human: &mut Human, weapon: WeaponKind, now: f64) -> ShopOutcome {
    if human.loadout.equip(weapon) {
        debug!("{} equipped {}", human.id, weapon.id());
        return ShopOutcome::Equipped;
    }

    let stats = weapon.stats();
    if human.money < stats.cost {
        debug!("{} cannot afford {} ({} < {})", human.id, weapon.id(), human.money, stats.cost);
        return ShopOutcome::TooExpensive;
    }

    human.money -= stats.cost;
    human.loadout.grant(weapon);
    human.loadout.equip(weapon);
    if !stats.infinite && human.loadout.clip[weapon] == 0 {
        human.loadout.start_reload(now);
    }
    debug!("{} bought {} for {}", human.id, weapon.id(), stats.cost);
    ShopOutcome::Purchased
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::MoneyDrop;
    use crate::util::vec2::Vec2;

    fn drop_at(x: f32, y: f32, value: u32) -> MoneyDrop {
        MoneyDrop {
            position: Vec2::new(x, y),
            value,
            ttl: drops::TTL,
        }
    }

    #[test]
    fn test_nearest_active_human_collects() {
        let mut state = GameState::new(Human::new("host", "H", Vec2::new(5.0, 5.0), 0.0));
        state.humans.push(Human::new("p1", "R", Vec2::new(5.3, 5.0), 0.0));
        state.drops.push(drop_at(5.4, 5.0, 50));
        state.drops.push(drop_at(9.0, 9.0, 10));

        assert_eq!(update_drops(&mut state, 0.1), 50);
        assert_eq!(state.humans[1].money, 50);
        assert_eq!(state.humans[0].money, 0);
        assert_eq!(state.drops.len(), 1);
    }

    #[test]
    fn test_downed_humans_do_not_collect() {
        let mut state = GameState::new(Human::new("host", "H", Vec2::new(5.0, 5.0), 0.0));
        state.local_mut().take_damage(500.0, Vec2::ZERO);
        state.drops.push(drop_at(5.1, 5.0, 50));
        assert_eq!(update_drops(&mut state, 0.1), 0);
        assert_eq!(state.drops.len(), 1);
    }

    #[test]
    fn test_drops_expire() {
        let mut state = GameState::new(Human::local("H"));
        state.drops.push(drop_at(12.0, 12.0, 5));
        update_drops(&mut state, drops::TTL + 0.1);
        assert!(state.drops.is_empty());
    }

    #[test]
    fn test_buy_then_equip() {
        let mut h = Human::local("H");
        assert_eq!(buy_or_equip(&mut h, WeaponKind::Shotgun, 0.0), ShopOutcome::TooExpensive);

        h.money = 400;
        assert_eq!(buy_or_equip(&mut h, WeaponKind::Shotgun, 0.0), ShopOutcome::Purchased);
        assert_eq!(h.money, 80);
        assert_eq!(h.loadout.current, WeaponKind::Shotgun);
        assert!(h.loadout.is_reloading(), "empty clip starts a reload");

        assert_eq!(buy_or_equip(&mut h, WeaponKind::Pistol, 0.1), ShopOutcome::Equipped);
        assert!(!h.loadout.is_reloading());
        assert_eq!(buy_or_equip(&mut h, WeaponKind::Shotgun, 0.2), ShopOutcome::Equipped);
        assert_eq!(h.money, 80);
    }
}
