use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use crate::game::constants::{net, player, settings as bounds};

/// Which role this process plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Single,
    Host,
    Client,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "solo" => Ok(Mode::Single),
            "host" => Ok(Mode::Host),
            "client" | "join" => Ok(Mode::Client),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

/// Process configuration
#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub mode: Mode,
    /// Address the host listens on
    pub bind_address: IpAddr,
    /// Port to listen on / connect to
    pub port: u16,
    /// Host to join in client mode
    pub join_host: String,
    pub player_name: String,
    /// Fixed RNG seed for reproducible sessions
    pub seed: Option<u64>,
    /// Stop the headless runner after this many seconds
    pub run_seconds: Option<f32>,
    pub settings_path: PathBuf,
    pub profile_path: PathBuf,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Single,
            bind_address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: net::DEFAULT_PORT,
            join_host: "127.0.0.1".to_string(),
            player_name: "Player".to_string(),
            seed: None,
            run_seconds: None,
            settings_path: PathBuf::from("arena_settings.json"),
            profile_path: PathBuf::from("arena_profile.json"),
        }
    }
}

impl ArenaConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(mode) = std::env::var("ARENA_MODE") {
            match mode.parse() {
                Ok(parsed) => config.mode = parsed,
                Err(e) => tracing::warn!("Invalid ARENA_MODE: {}, using default", e),
            }
        }

        if let Ok(addr) = std::env::var("ARENA_BIND_ADDRESS") {
            if let Ok(parsed) = addr.parse() {
                config.bind_address = parsed;
            } else {
                tracing::warn!("Invalid ARENA_BIND_ADDRESS '{}', using default", addr);
            }
        }

        if let Ok(port) = std::env::var("ARENA_PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                if parsed > 0 {
                    config.port = parsed;
                } else {
                    tracing::warn!("ARENA_PORT must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid ARENA_PORT '{}', using default", port);
            }
        }

        if let Ok(host) = std::env::var("ARENA_JOIN_HOST") {
            if !host.trim().is_empty() {
                config.join_host = host.trim().to_string();
            }
        }

        if let Ok(name) = std::env::var("ARENA_PLAYER_NAME") {
            let name = sanitize_name(&name);
            if name.is_empty() {
                tracing::warn!("ARENA_PLAYER_NAME is empty, using default");
            } else {
                config.player_name = name;
            }
        }

        if let Ok(seed) = std::env::var("ARENA_SEED") {
            match seed.parse::<u64>() {
                Ok(parsed) => config.seed = Some(parsed),
                Err(_) => tracing::warn!("Invalid ARENA_SEED '{}', ignoring", seed),
            }
        }

        if let Ok(secs) = std::env::var("ARENA_RUN_SECONDS") {
            match secs.parse::<f32>() {
                Ok(parsed) if parsed > 0.0 => config.run_seconds = Some(parsed),
                _ => tracing::warn!("ARENA_RUN_SECONDS must be a positive number, ignoring"),
            }
        }

        if let Ok(path) = std::env::var("ARENA_SETTINGS_PATH") {
            config.settings_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("ARENA_PROFILE_PATH") {
            config.profile_path = PathBuf::from(path);
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }
        if self.player_name.is_empty() {
            return Err("player_name cannot be empty".to_string());
        }
        if self.mode == Mode::Client && self.join_host.is_empty() {
            return Err("join_host is required in client mode".to_string());
        }
        Ok(())
    }

    /// `host:port` string for client connections
    pub fn join_address(&self) -> String {
        format!("{}:{}", self.join_host, self.port)
    }
}

/// Trim and truncate a display name to the allowed length
pub fn sanitize_name(raw: &str) -> String {
    raw.trim().chars().take(player::MAX_NAME_LEN).collect()
}

/// Errors from reading or writing JSON option files
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PersistError> {
    let raw = std::fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistError> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// User-facing options. Every field is clamped on load; out-of-range values
/// are never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mouse_sensitivity: f32,
    pub mouse_smoothing_enabled: bool,
    pub shared_money: bool,
    pub adaptive_quality_enabled: bool,
    pub fov_degrees: f32,
    pub fps_limit: u32,
    pub fullscreen_enabled: bool,
    /// `[width, height]`
    pub resolution: [u32; 2],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mouse_sensitivity: bounds::DEFAULT_SENSITIVITY,
            mouse_smoothing_enabled: true,
            shared_money: false,
            adaptive_quality_enabled: true,
            fov_degrees: bounds::DEFAULT_FOV_DEG,
            fps_limit: bounds::DEFAULT_FPS_LIMIT,
            fullscreen_enabled: false,
            resolution: [bounds::DEFAULT_WIDTH, bounds::DEFAULT_HEIGHT],
        }
    }
}

impl Settings {
    /// Load from `path`; missing or unreadable files yield defaults
    pub fn load(path: &Path) -> Self {
        match read_json::<Settings>(path) {
            Ok(settings) => settings.sanitized(),
            Err(PersistError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Could not read settings, using defaults: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        write_json(path, self)
    }

    /// Clamp every field into its valid range
    pub fn sanitized(mut self) -> Self {
        if !self.mouse_sensitivity.is_finite() {
            self.mouse_sensitivity = bounds::DEFAULT_SENSITIVITY;
        }
        if !self.fov_degrees.is_finite() {
            self.fov_degrees = bounds::DEFAULT_FOV_DEG;
        }
        self.mouse_sensitivity = self
            .mouse_sensitivity
            .clamp(bounds::MIN_SENSITIVITY, bounds::MAX_SENSITIVITY);
        self.fov_degrees = self.fov_degrees.clamp(bounds::MIN_FOV_DEG, bounds::MAX_FOV_DEG);
        self.fps_limit = self.fps_limit.clamp(bounds::MIN_FPS_LIMIT, bounds::MAX_FPS_LIMIT);
        self.resolution = [
            self.resolution[0].clamp(bounds::MIN_WIDTH, bounds::MAX_WIDTH),
            self.resolution[1].clamp(bounds::MIN_HEIGHT, bounds::MAX_HEIGHT),
        ];
        self
    }

    #[inline]
    pub fn fov_radians(&self) -> f32 {
        self.fov_degrees.to_radians()
    }
}
