//! Wire records
//!
//! One JSON object per line, discriminated by a `"type"` field. Every record
//! field is optional on decode so older or sloppier peers still parse; a line
//! that fails to decode is dropped by the caller, never fatal.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::game::state::{BotKind, GamePhase, PlayerId, Tactic};
use crate::game::weapons::{PerWeapon, WeaponKind};

/// Messages from client to host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Sent once after connecting
    Hello { name: String },
    /// Held input, sent at the sync rate
    Input {
        #[serde(default)]
        keys: Vec<String>,
        #[serde(default)]
        angle: Option<f32>,
        #[serde(default)]
        shoot: bool,
    },
    /// Shop request; `weapon` is a weapon id
    BuyOrEquip { weapon: String },
}

/// Messages from host to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Welcome { player_id: PlayerId },
    Snapshot(Box<Snapshot>),
}

/// One human as seen on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub health: f32,
    pub downed: bool,
    pub money: u32,
    pub weapon: WeaponKind,
    pub ammo: PerWeapon<u32>,
    pub clip: PerWeapon<u32>,
    pub owned: PerWeapon<bool>,
}

impl Default for PlayerRecord {
    fn default() -> Self {
        Self {
            id: PlayerId::new(),
            name: "Teammate".to_string(),
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            health: 0.0,
            downed: false,
            money: 0,
            weapon: WeaponKind::SIDEARM,
            ammo: PerWeapon::default(),
            clip: PerWeapon::default(),
            owned: PerWeapon::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotRecord {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub health: f32,
    pub speed: f32,
    pub kind: BotKind,
    pub state: Tactic,
    pub alive: bool,
    pub attack_range: f32,
    pub hit_bonus: f32,
    pub damage_min: i32,
    pub damage_max: i32,
    pub money_multiplier: f32,
}

impl Default for BotRecord {
    fn default() -> Self {
        Self {
            id: 0,
            x: 0.0,
            y: 0.0,
            health: 100.0,
            speed: 1.2,
            kind: BotKind::Grunt,
            state: Tactic::Advance,
            alive: true,
            attack_range: 11.5,
            hit_bonus: 0.0,
            damage_min: 4,
            damage_max: 9,
            money_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropRecord {
    pub x: f32,
    pub y: f32,
    pub value: u32,
    pub ttl: f32,
}

impl Default for DropRecord {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            value: 0,
            ttl: crate::game::constants::drops::TTL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingRecord {
    pub x: f32,
    pub y: f32,
    pub ttl: f32,
    pub owner: String,
}

impl Default for PingRecord {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            ttl: 0.0,
            owner: "TEAM".to_string(),
        }
    }
}

/// Full authoritative state, personalised for one peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub you_id: PlayerId,
    pub you: PlayerRecord,
    /// Every human, the recipient included
    pub players: Vec<PlayerRecord>,
    /// Living bots only
    pub bots: Vec<BotRecord>,
    pub drops: Vec<DropRecord>,
    pub wave: u32,
    pub game_state: GamePhase,
    pub objective_type: String,
    pub objective_timer: f32,
    /// `[x, y, radius]`
    pub objective_zone: Option<[f32; 3]>,
    pub shared_money: bool,
    pub ping: Option<PingRecord>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            you_id: PlayerId::new(),
            you: PlayerRecord::default(),
            players: Vec::new(),
            bots: Vec::new(),
            drops: Vec::new(),
            wave: 0,
            game_state: GamePhase::Playing,
            objective_type: "eliminate".to_string(),
            objective_timer: 0.0,
            objective_zone: None,
            shared_money: false,
            ping: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty record")]
    Empty,
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialize one record as a newline-terminated line
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}

/// Parse one line (with or without its terminator)
pub fn decode_line<T: DeserializeOwned>(line: &str) -> Result<T, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ProtocolError::Empty);
    }
    Ok(serde_json::from_str(line)?)
}
