use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bot_arena::config::{ArenaConfig, Settings};
use bot_arena::game::progression::Profile;
use bot_arena::game::simulation::SimEvent;
use bot_arena::game::state::GamePhase;
use bot_arena::net::game_session::{GameSession, LocalInput};

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Bot Arena v{}", env!("CARGO_PKG_VERSION"));

    let config = ArenaConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg).context("invalid configuration")?;
    info!(
        "Configuration loaded: mode={:?}, port={}, player={}",
        config.mode, config.port, config.player_name
    );

    let settings = Settings::load(&config.settings_path);
    let profile = Profile::load(&config.profile_path);
    info!("Profile level {} ({} perk points)", profile.level, profile.perk_points);

    let mut session = GameSession::from_config(&config, &settings, profile).context("failed to start session")?;
    info!("{}", session.net_status());

    let frame_budget = Duration::from_secs_f32(1.0 / settings.fps_limit.max(1) as f32);
    let started = Instant::now();
    let mut last = Instant::now();

    loop {
        let frame_start = Instant::now();
        let dt = frame_start.duration_since(last).as_secs_f32();
        last = frame_start;

        let input = LocalInput {
            restart: session.phase() == GamePhase::Dead,
            ..LocalInput::default()
        };
        for event in session.frame(dt, &input) {
            match event {
                SimEvent::WaveStarted { wave } => info!("Wave {} started", wave),
                SimEvent::PhaseChanged { from, to } => info!("Phase {:?} -> {:?}", from, to),
                SimEvent::LevelUp { level } => info!("Reached level {}", level),
                _ => {}
            }
        }
        if session.render().is_none() {
            warn!("No viewer to render");
        }

        if session.phase() == GamePhase::Bsod {
            info!("Session crashed, exiting");
            break;
        }
        if let Some(limit) = config.run_seconds {
            if started.elapsed().as_secs_f32() >= limit {
                info!("Run time of {:.0}s reached", limit);
                break;
            }
        }

        let spent = frame_start.elapsed();
        session.observe_frame_time(dt);
        if let Some(rest) = frame_budget.checked_sub(spent) {
            std::thread::sleep(rest);
        }
    }

    if let Err(e) = session.profile().save(&config.profile_path) {
        warn!("Failed to save profile: {}", e);
    }
    info!("Bot Arena stopped");
    Ok(())
}
