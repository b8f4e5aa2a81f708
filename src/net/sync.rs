//! State replication between host and clients
//!
//! The host turns its [`GameState`] into one personalised [`Snapshot`] per
//! peer. A client keeps a [`ClientMirror`]: its own human and the world are
//! replaced by each snapshot, while teammates glide toward their latest
//! reported pose.

use hashbrown::HashMap;
use tracing::debug;

use crate::game::constants::net::INTERP_RATE;
use crate::game::map::TileMap;
use crate::game::state::{Bot, GamePhase, GameState, Human, MoneyDrop, Objective, PlayerId, TeamPing};
use crate::net::protocol::{BotRecord, DropRecord, PingRecord, PlayerRecord, Snapshot};
use crate::util::angle;
use crate::util::vec2::Vec2;

pub fn player_record(human: &Human) -> PlayerRecord {
    PlayerRecord {
        id: human.id.clone(),
        name: human.name.clone(),
        x: human.position.x,
        y: human.position.y,
        angle: human.angle,
        health: human.health,
        downed: human.downed,
        money: human.money,
        weapon: human.loadout.current,
        ammo: human.loadout.reserve,
        clip: human.loadout.clip,
        owned: human.loadout.owned,
    }
}

/// Overwrite `human` with a record. `keep_angle` leaves the facing alone,
/// for the client's own human whose angle is driven locally.
pub fn apply_player_record(human: &mut Human, record: &PlayerRecord, keep_angle: bool) {
    human.name = record.name.clone();
    human.position = Vec2::new(record.x, record.y);
    if !keep_angle {
        human.angle = record.angle;
    }
    human.health = record.health;
    human.downed = record.downed;
    human.money = record.money;
    human.loadout.current = record.weapon;
    human.loadout.reserve = record.ammo;
    human.loadout.clip = record.clip;
    human.loadout.owned = record.owned;
}

fn bot_record(bot: &Bot) -> BotRecord {
    BotRecord {
        id: bot.id,
        x: bot.position.x,
        y: bot.position.y,
        health: bot.health,
        speed: bot.speed,
        kind: bot.kind,
        state: bot.tactic,
        alive: bot.alive,
        attack_range: bot.attack_range,
        hit_bonus: bot.hit_bonus,
        damage_min: bot.damage_min,
        damage_max: bot.damage_max,
        money_multiplier: bot.money_multiplier,
    }
}

fn bot_from_record(record: &BotRecord) -> Bot {
    let position = Vec2::new(record.x, record.y);
    let mut bot = Bot::spawn(record.id, record.kind, position, 0);
    bot.health = record.health;
    bot.max_health = record.health.max(1.0);
    bot.speed = record.speed;
    bot.tactic = record.state;
    bot.alive = record.alive;
    bot.attack_range = record.attack_range;
    bot.hit_bonus = record.hit_bonus;
    bot.damage_min = record.damage_min;
    bot.damage_max = record.damage_max;
    bot.money_multiplier = record.money_multiplier;
    bot
}

/// One snapshot per remote human, keyed by the recipient's id
pub fn build_snapshots(state: &GameState) -> Vec<(PlayerId, Snapshot)> {
    if state.remotes().is_empty() {
        return Vec::new();
    }

    let players: Vec<PlayerRecord> = state.humans.iter().map(player_record).collect();
    let bots: Vec<BotRecord> = state.living_bots().map(bot_record).collect();
    let drops: Vec<DropRecord> = state
        .drops
        .iter()
        .map(|d| DropRecord {
            x: d.position.x,
            y: d.position.y,
            value: d.value,
            ttl: d.ttl,
        })
        .collect();
    let ping = state.ping.as_ref().map(|p| PingRecord {
        x: p.position.x,
        y: p.position.y,
        ttl: p.ttl,
        owner: p.owner.clone(),
    });

    state
        .humans
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, remote)| {
            let snapshot = Snapshot {
                you_id: remote.id.clone(),
                you: players[i].clone(),
                players: players.clone(),
                bots: bots.clone(),
                drops: drops.clone(),
                wave: state.wave,
                game_state: state.phase,
                objective_type: state.objective.type_id().to_string(),
                objective_timer: state.objective.timer(),
                objective_zone: state.objective.zone(),
                shared_money: state.shared_money,
                ping: ping.clone(),
            };
            (remote.id.clone(), snapshot)
        })
        .collect()
}

/// Fixed-rate send gate
#[derive(Debug, Clone, Copy)]
pub struct SyncClock {
    interval: f32,
    elapsed: f32,
}

impl SyncClock {
    pub fn new(interval: f32) -> Self {
        Self { interval, elapsed: 0.0 }
    }

    /// Advance by `dt`; true when a send is due
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }
}

/// Latest reported pose of a teammate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeammateTarget {
    pub position: Vec2,
    pub angle: f32,
}

/// Client-side replica of the host's world
pub struct ClientMirror {
    map: TileMap,
    state: GameState,
    player_id: Option<PlayerId>,
    targets: HashMap<PlayerId, TeammateTarget>,
}

impl ClientMirror {
    pub fn new(map: TileMap, local_name: &str) -> Self {
        Self {
            map,
            state: GameState::new(Human::local(local_name)),
            player_id: None,
            targets: HashMap::new(),
        }
    }

    pub fn on_welcome(&mut self, player_id: PlayerId) {
        debug!("Assigned player id {}", player_id);
        self.state.local_mut().id = player_id.clone();
        self.player_id = Some(player_id);
    }

    pub fn map(&self) -> &TileMap {
        &self.map
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn player_id(&self) -> Option<&str> {
        self.player_id.as_deref()
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn teammate_count(&self) -> usize {
        self.state.remotes().len()
    }

    /// Angle is local-authority on the client
    pub fn set_local_angle(&mut self, angle: f32) {
        self.state.local_mut().angle = angle;
    }

    pub fn target(&self, id: &str) -> Option<TeammateTarget> {
        self.targets.get(id).copied()
    }

    /// Replace the world with `snapshot`
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        if self.player_id.is_none() && !snapshot.you_id.is_empty() {
            self.on_welcome(snapshot.you_id.clone());
        }
        apply_player_record(self.state.local_mut(), &snapshot.you, true);

        // Bots that vanished while alive died on the host; keep their corpses
        let mut bots: Vec<Bot> = snapshot.bots.iter().map(bot_from_record).collect();
        for old in self.state.bots.iter() {
            if bots.iter().any(|b| b.id == old.id) {
                continue;
            }
            if old.alive {
                let mut corpse = old.clone();
                corpse.kill();
                bots.push(corpse);
            } else if old.corpse_ttl > 0.0 {
                bots.push(old.clone());
            }
        }
        self.state.bots = bots;

        self.state.drops = snapshot
            .drops
            .iter()
            .map(|d| MoneyDrop {
                position: Vec2::new(d.x, d.y),
                value: d.value,
                ttl: d.ttl,
            })
            .collect();
        self.state.wave = snapshot.wave;
        self.state.phase = snapshot.game_state;
        self.state.objective = Objective::from_wire(
            &snapshot.objective_type,
            snapshot.objective_timer,
            snapshot.objective_zone,
        );
        self.state.shared_money = snapshot.shared_money;
        self.state.ping = snapshot.ping.as_ref().map(|p| TeamPing {
            position: Vec2::new(p.x, p.y),
            ttl: p.ttl,
            owner: p.owner.clone(),
        });

        let local_id = self.state.local().id.clone();
        let seen: Vec<&PlayerRecord> = snapshot.players.iter().filter(|p| p.id != local_id).collect();

        self.state.humans.retain(|h| h.id == local_id || seen.iter().any(|p| p.id == h.id));
        self.targets.retain(|id, _| seen.iter().any(|p| &p.id == id));

        for record in seen {
            let target = TeammateTarget {
                position: Vec2::new(record.x, record.y),
                angle: record.angle,
            };
            match self.state.human_mut(&record.id) {
                Some(mate) => {
                    // Pose blends in `interpolate`; everything else is immediate
                    let (position, facing) = (mate.position, mate.angle);
                    apply_player_record(mate, record, false);
                    mate.position = position;
                    mate.angle = facing;
                }
                None => {
                    let mut mate = Human::new(record.id.clone(), record.name.clone(), target.position, target.angle);
                    apply_player_record(&mut mate, record, false);
                    debug!("Teammate {} ({}) appeared", mate.name, mate.id);
                    self.state.humans.push(mate);
                }
            }
            self.targets.insert(record.id.clone(), target);
        }
    }

    /// Move teammates toward their targets and age client-side corpses
    pub fn interpolate(&mut self, dt: f32) {
        let blend = (dt * INTERP_RATE).clamp(0.0, 1.0);
        for mate in self.state.humans.iter_mut().skip(1) {
            if let Some(target) = self.targets.get(&mate.id) {
                mate.position = mate.position.lerp(target.position, blend);
                mate.angle = angle::lerp(mate.angle, target.angle, blend);
            }
        }

        for bot in self.state.bots.iter_mut().filter(|b| !b.alive) {
            bot.corpse_ttl = (bot.corpse_ttl - dt).max(0.0);
        }
        self.state.bots.retain(|b| b.alive || b.corpse_ttl > 0.0);
    }
}
