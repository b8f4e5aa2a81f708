/// Static arena layout: `#` wall, `.` floor. Rows must share one width.
pub const WORLD_MAP: [&str; 20] = [
    "########################",
    "#....#........#........#",
    "#....#........#........#",
    "#....#..####..#..####..#",
    "#....#..#..#..#..#..#..#",
    "#....#..#..#..#..#..#..#",
    "#....####..####..#..#..#",
    "#................#..#..#",
    "####..############..#..#",
    "#........#..........#..#",
    "#........#..######..#..#",
    "#..####..#..#....#..#..#",
    "#..#..#..#..#....#..#..#",
    "#..#..#..#..#....#..#..#",
    "#..#..#..#..######..#..#",
    "#..#..#..#..........#..#",
    "#..#..#..############..#",
    "#..#..#...............##",
    "#........#.............#",
    "########################",
];

/// Frame pacing
pub mod timing {
    /// Largest simulation step; longer frames are truncated
    pub const MAX_FRAME_DT: f32 = 0.05;
    /// Host snapshot / client input interval (30 Hz)
    pub const NET_SEND_INTERVAL: f32 = 1.0 / 30.0;
    /// Delay between a cleared wave and the next spawn
    pub const WAVE_DELAY: f32 = 3.2;
    /// Glitch screen duration before the terminal BSOD state
    pub const GLITCH_DURATION: f32 = 1.2;
    /// Frame-loop status log cadence
    pub const STATUS_LOG_INTERVAL: f32 = 5.0;
}

/// Human (local + remote player) constants
pub mod player {
    pub const RADIUS: f32 = 0.22;
    pub const START_X: f32 = 2.6;
    pub const START_Y: f32 = 2.6;
    pub const START_ANGLE: f32 = 0.15;
    pub const BASE_MAX_HEALTH: f32 = 100.0;
    pub const WALK_SPEED: f32 = 3.2;
    pub const SPRINT_SPEED: f32 = 4.2;
    /// Keyboard turn rate (rad/s)
    pub const TURN_SPEED: f32 = 1.7;
    /// Seconds without damage before regen kicks in
    pub const REGEN_DELAY: f32 = 4.0;
    /// Health per second while regenerating
    pub const REGEN_RATE: f32 = 3.0;
    /// Names longer than this are truncated
    pub const MAX_NAME_LEN: usize = 18;
}

/// Downed / bleed-out / revive
pub mod downed {
    pub const BLEED_OUT: f32 = 14.0;
    /// Fraction of incoming damage that drains bleed-out while downed
    pub const BLEED_DAMAGE_FACTOR: f32 = 0.08;
    pub const REVIVE_RANGE: f32 = 1.7;
    pub const REVIVE_TIME: f32 = 2.3;
    pub const REVIVE_DECAY: f32 = 1.6;
    pub const REVIVED_HEALTH: f32 = 40.0;
}

/// Presentation timers
pub mod fx {
    pub const DAMAGE_FLASH: f32 = 0.45;
    pub const DAMAGE_FLASH_DECAY: f32 = 2.8;
    /// Base muzzle flash; scaled per weapon
    pub const MUZZLE_FLASH: f32 = 0.12;
    pub const MUZZLE_FLASH_DECAY: f32 = 5.0;
    pub const WEAPON_KICK: f32 = 1.0;
    pub const WEAPON_KICK_DECAY: f32 = 6.5;
    pub const SPREAD_HEAT_DECAY: f32 = 1.5;
    pub const SPREAD_HEAT_MAX: f32 = 1.0;
    pub const DAMAGE_DIRECTION: f32 = 0.9;
    pub const DAMAGE_DIRECTION_DECAY: f32 = 1.0;
    /// Heat contribution to spread: `1 + heat * factor`
    pub const HEAT_SPREAD_FACTOR: f32 = 0.8;
}

/// Team ping marker
pub mod ping {
    pub const TTL: f32 = 5.5;
    pub const DISTANCE: f32 = 4.2;
    /// Used when the full distance lands inside a wall
    pub const SHORT_DISTANCE: f32 = 2.2;
}

/// Bot defaults (archetype multipliers live in `state::BotKind::archetype`)
pub mod bot {
    pub const RADIUS: f32 = 0.28;
    pub const BASE_HP: f32 = 65.0;
    pub const HP_PER_WAVE: f32 = 7.0;
    pub const BASE_SPEED: f32 = 1.2;
    pub const SPEED_PER_WAVE: f32 = 0.04;
    pub const MAX_SPEED_BONUS: f32 = 0.6;
    pub const BASE_DAMAGE_MIN: i32 = 4;
    pub const BASE_DAMAGE_MAX: i32 = 9;
    pub const CORPSE_TTL: f32 = 2.5;
    /// Collision radius used when testing spawn/snap points
    pub const SPAWN_CLEARANCE: f32 = 0.24;
    pub const HEADSHOT_FRACTION: f32 = 0.4;
    pub const HEADSHOT_MULTIPLIER: f32 = 1.7;
}

/// Tactical AI tuning (defaults for `AiTuning`)
pub mod ai {
    pub const DECISION_MIN: f32 = 0.65;
    pub const DECISION_MAX: f32 = 1.3;
    pub const FIRE_COOLDOWN_MIN: f32 = 0.45;
    pub const FIRE_COOLDOWN_MAX: f32 = 1.05;
    pub const BASE_HIT_CHANCE: f32 = 0.78;
    pub const HIT_FALLOFF_PER_UNIT: f32 = 0.055;
    pub const COVER_HIT_BONUS: f32 = 0.08;
    pub const MIN_HIT_CHANCE: f32 = 0.2;
    pub const MAX_HIT_CHANCE: f32 = 0.84;
    pub const SHARPSHOOTER_COVER_RANGE: f32 = 5.0;
    pub const COVER_SEEK_RANGE: f32 = 8.8;
    pub const COVER_SEEK_CHANCE: f32 = 0.58;
    pub const FLANK_RANGE: f32 = 7.0;
    pub const PRESSURE_RADIUS_MIN: f32 = 1.8;
    pub const PRESSURE_RADIUS_MAX: f32 = 3.3;
    pub const FLANK_RADIUS_MIN: f32 = 3.1;
    pub const FLANK_RADIUS_MAX: f32 = 5.3;
    pub const FLANK_JITTER: f32 = 0.42;
    pub const COVER_SAMPLES: usize = 24;
    pub const COVER_MIN_TARGET_DIST: f32 = 2.0;
    pub const COVER_MAX_TARGET_DIST: f32 = 10.0;
    pub const COVER_MAX_BOT_DIST: f32 = 11.0;
    pub const COVER_EXPOSED_PENALTY: f32 = 4.2;
    pub const SNAP_ATTEMPTS: usize = 10;
    pub const SNAP_RADIUS_MIN: f32 = 2.0;
    pub const SNAP_RADIUS_MAX: f32 = 6.0;
    pub const COVER_SPEED_MULT: f32 = 0.95;
    pub const FLANK_SPEED_MULT: f32 = 1.1;
    /// Bots stop steering once this close to their move point
    pub const ARRIVE_DISTANCE: f32 = 0.1;
}

/// Wave and objective rules
pub mod wave {
    pub const BASE_COUNT: usize = 4;
    pub const COUNT_PER_WAVE: usize = 2;
    pub const MAX_COUNT: usize = 24;
    pub const BOSS_EVERY: u32 = 5;
    pub const DEFEND_EVERY: u32 = 4;
    pub const DEFEND_BASE_TIME: f32 = 11.0;
    pub const DEFEND_TIME_PER_WAVE: f32 = 0.55;
    pub const DEFEND_MAX_TIME: f32 = 22.0;
    pub const ZONE_RADIUS: f32 = 2.4;
    /// Preferred minimum spawn distance from the local player
    pub const SPAWN_PREFERRED_DIST: f32 = 6.5;
    pub const SPAWN_BOT_SPACING: f32 = 0.8;
    pub const SPAWN_RELAXED_SPACING: f32 = 0.35;
    pub const RESPAWN_MIN_DIST: f32 = 4.0;
    pub const REMOTE_JOIN_MIN_DIST: f32 = 6.0;
    pub const RESPAWN_HEALTH: f32 = 65.0;
    pub const RESPAWN_HEALTH_PER_VITALITY: f32 = 3.0;
    pub const SURVIVOR_HEAL: f32 = 12.0;
    pub const DEFEND_REWARD_BASE: u32 = 90;
    pub const DEFEND_REWARD_PER_WAVE: u32 = 8;
}

/// Money pickups
pub mod drops {
    pub const TTL: f32 = 24.0;
    pub const PICKUP_RADIUS: f32 = 0.56;
    pub const SCATTER: f32 = 0.16;
    pub const SINGLE_DROP_CHANCE: f64 = 0.75;
    pub const VALUE_MIN: i32 = 28;
    pub const VALUE_MAX: i32 = 62;
    pub const VALUE_PER_WAVE: i32 = 4;
}

/// Raycaster constants
pub mod render {
    pub const MAX_DEPTH: f32 = 20.0;
    pub const MAX_DDA_STEPS: usize = 160;
    /// Smallest corrected distance used for projection
    pub const MIN_CORRECTED_DIST: f32 = 0.0001;
    pub const WALL_HEIGHT_SCALE: f32 = 0.95;
    pub const RAY_DENSITY: f32 = 5.8;
    pub const MIN_RAY_COUNT: usize = 160;
    pub const MAX_RAY_COUNT: usize = 300;
    pub const SHADE_NEAR: f32 = 230.0;
    pub const SHADE_FAR: f32 = 24.0;
    pub const SHADE_PER_UNIT: f32 = 20.0;
    pub const SIDE_DIMMING: f32 = 0.72;
    /// Sprites are kept within this fraction of the FOV either side of centre
    pub const SPRITE_FOV_MARGIN: f32 = 0.58;
    /// Sprites this far behind the wall depth still draw
    pub const SPRITE_DEPTH_FORGIVENESS: f32 = 0.12;
    pub const TEAMMATE_MIN_DIST: f32 = 0.35;
    /// Adaptive quality
    pub const QUALITY_ADJUST_INTERVAL: f32 = 0.55;
    pub const QUALITY_SLOW_RATIO: f32 = 1.2;
    pub const QUALITY_FAST_RATIO: f32 = 0.82;
    pub const QUALITY_STEP_DOWN: usize = 10;
    pub const QUALITY_STEP_UP: usize = 8;
    pub const QUALITY_SMOOTHING: f32 = 0.1;
}

/// Network constants
pub mod net {
    pub const DEFAULT_PORT: u16 = 5050;
    pub const CONNECT_TIMEOUT_SECS: f32 = 4.0;
    /// Longest accepted record line
    pub const MAX_LINE_BYTES: usize = 256 * 1024;
    /// Queue capacity between network thread and frame loop
    pub const EVENT_QUEUE_CAPACITY: usize = 1024;
    /// Host-side identity of the local player
    pub const HOST_ID: &str = "host";
    /// Client interpolation rate; blend = clamp(dt * rate, 0, 1)
    pub const INTERP_RATE: f32 = 10.0;
}

/// Progression
pub mod progression {
    pub const XP_BASE: u32 = 100;
    pub const XP_PER_LEVEL: u32 = 65;
    pub const MAX_PERK_RANK: u32 = 8;
    pub const TIER_EVERY_LEVELS: u32 = 3;
}

/// Settings bounds
pub mod settings {
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_HEIGHT: u32 = 720;
    pub const MIN_WIDTH: u32 = 800;
    pub const MIN_HEIGHT: u32 = 540;
    pub const MAX_WIDTH: u32 = 7680;
    pub const MAX_HEIGHT: u32 = 4320;
    pub const DEFAULT_FOV_DEG: f32 = 60.0;
    pub const MIN_FOV_DEG: f32 = 50.0;
    pub const MAX_FOV_DEG: f32 = 110.0;
    pub const DEFAULT_SENSITIVITY: f32 = 0.003;
    pub const MIN_SENSITIVITY: f32 = 0.001;
    pub const MAX_SENSITIVITY: f32 = 0.015;
    pub const DEFAULT_FPS_LIMIT: u32 = 60;
    pub const MIN_FPS_LIMIT: u32 = 30;
    pub const MAX_FPS_LIMIT: u32 = 240;
    /// Adaptive quality never aims for more than this frame rate
    pub const QUALITY_MAX_FPS: u32 = 120;
}
