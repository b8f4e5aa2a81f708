//! Game session - the single-threaded frame driver for every role
//!
//! Single-player and host sessions advance the authoritative [`Simulation`];
//! a host additionally relays peer input into it and broadcasts snapshots.
//! A client never simulates: it forwards input and renders its
//! [`ClientMirror`].

use std::net::SocketAddr;

use tracing::{debug, info, warn};

use crate::config::{sanitize_name, ArenaConfig, Mode, Settings};
use crate::game::constants::{player, timing};
use crate::game::map::TileMap;
use crate::game::progression::{Perk, Profile};
use crate::game::simulation::{SimEvent, Simulation};
use crate::game::state::{GamePhase, GameState, HumanInput, Key, KeySet};
use crate::game::weapons::WeaponKind;
use crate::net::client::{ClientEvent, CoopClient};
use crate::net::host::{CoopHost, HostEvent};
use crate::net::protocol::{ClientMessage, HostMessage};
use crate::net::sync::{build_snapshots, ClientMirror, SyncClock};
use crate::net::NetError;
use crate::render::{Frame, Renderer};
use crate::util::angle;

/// Everything the local player asked for this frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalInput {
    pub keys: KeySet,
    /// New absolute facing; `None` keeps the current one
    pub angle: Option<f32>,
    pub shoot: bool,
    pub buy: Option<WeaponKind>,
    pub perk: Option<Perk>,
    pub restart: bool,
}

enum Role {
    Single(Simulation),
    Host {
        sim: Simulation,
        server: CoopHost,
    },
    Client {
        mirror: ClientMirror,
        profile: Profile,
        link: Option<CoopClient>,
        status: String,
    },
}

pub struct GameSession {
    role: Role,
    renderer: Renderer,
    sync: SyncClock,
    status_elapsed: f32,
}

impl GameSession {
    pub fn single(name: &str, settings: &Settings, profile: Profile, seed: Option<u64>) -> Self {
        let mut sim = Simulation::new(name, profile, seed);
        sim.set_shared_money(settings.shared_money);
        Self::with_role(Role::Single(sim), settings)
    }

    /// Start hosting. Bind failures are returned before the simulation runs.
    pub fn host(
        addr: SocketAddr,
        name: &str,
        settings: &Settings,
        profile: Profile,
        seed: Option<u64>,
    ) -> Result<Self, NetError> {
        let server = CoopHost::bind(addr)?;
        let mut sim = Simulation::new(name, profile, seed);
        sim.set_shared_money(settings.shared_money);
        Ok(Self::with_role(Role::Host { sim, server }, settings))
    }

    /// Join a host. A failed connection leaves the session running,
    /// disconnected, with the failure in `net_status`.
    pub fn client(address: &str, name: &str, settings: &Settings, profile: Profile) -> Self {
        let (link, status) = match CoopClient::connect(address, name) {
            Ok(link) => (Some(link), format!("Connected to {}", address)),
            Err(e) => {
                warn!("Could not join {}: {}", address, e);
                (None, format!("Connection failed: {}", e))
            }
        };
        let role = Role::Client {
            mirror: ClientMirror::new(TileMap::arena(), name),
            profile,
            link,
            status,
        };
        Self::with_role(role, settings)
    }

    pub fn from_config(config: &ArenaConfig, settings: &Settings, profile: Profile) -> Result<Self, NetError> {
        let name = &config.player_name;
        Ok(match config.mode {
            Mode::Single => Self::single(name, settings, profile, config.seed),
            Mode::Host => Self::host(
                SocketAddr::new(config.bind_address, config.port),
                name,
                settings,
                profile,
                config.seed,
            )?,
            Mode::Client => Self::client(&config.join_address(), name, settings, profile),
        })
    }

    fn with_role(role: Role, settings: &Settings) -> Self {
        Self {
            role,
            renderer: Renderer::new(settings),
            sync: SyncClock::new(timing::NET_SEND_INTERVAL),
            status_elapsed: 0.0,
        }
    }

    /// Advance one frame
    pub fn frame(&mut self, dt: f32, input: &LocalInput) -> Vec<SimEvent> {
        let send_due = self.sync.tick(dt);
        let events = match &mut self.role {
            Role::Single(sim) => drive_local(sim, dt, input),
            Role::Host { sim, server } => {
                for event in server.poll() {
                    handle_host_event(sim, event);
                }
                let events = drive_local(sim, dt, input);
                if send_due {
                    for (player_id, snapshot) in build_snapshots(sim.state()) {
                        if !server.send(&player_id, &HostMessage::Snapshot(Box::new(snapshot))) {
                            debug!("Snapshot for {} not queued", player_id);
                        }
                    }
                }
                events
            }
            Role::Client {
                mirror,
                profile,
                link,
                status,
            } => {
                drive_client(mirror, profile, link, status, dt, input, send_due);
                Vec::new()
            }
        };

        self.status_elapsed += dt;
        if self.status_elapsed >= timing::STATUS_LOG_INTERVAL {
            self.status_elapsed = 0.0;
            let state = self.state();
            info!(
                "wave {} | bots {} | humans {} | rays {} | {}",
                state.wave,
                state.alive_bots(),
                state.humans.len(),
                self.renderer.ray_count(),
                self.net_status()
            );
        }

        events
    }

    /// Draw the local player's view
    pub fn render(&mut self) -> Option<Frame> {
        let (map, state) = match &self.role {
            Role::Single(sim) | Role::Host { sim, .. } => (sim.map(), sim.state()),
            Role::Client { mirror, .. } => (mirror.map(), mirror.state()),
        };
        self.renderer.render_state(map, state, 0)
    }

    /// Feed the adaptive quality controller. Returns true if the ray count
    /// changed.
    pub fn observe_frame_time(&mut self, dt: f32) -> bool {
        self.renderer.observe_frame_time(dt)
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    pub fn state(&self) -> &GameState {
        match &self.role {
            Role::Single(sim) | Role::Host { sim, .. } => sim.state(),
            Role::Client { mirror, .. } => mirror.state(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.state().phase
    }

    pub fn profile(&self) -> &Profile {
        match &self.role {
            Role::Single(sim) | Role::Host { sim, .. } => sim.profile(),
            Role::Client { profile, .. } => profile,
        }
    }

    pub fn is_connected(&self) -> bool {
        match &self.role {
            Role::Single(_) | Role::Host { .. } => true,
            Role::Client { link, .. } => link.is_some(),
        }
    }

    /// Host listen address, when hosting
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &self.role {
            Role::Host { server, .. } => Some(server.local_addr()),
            _ => None,
        }
    }

    /// Human-readable network status
    pub fn net_status(&self) -> String {
        match &self.role {
            Role::Single(_) => "Single player".to_string(),
            Role::Host { sim, .. } => format!("Hosting co-op ({} players)", sim.state().humans.len()),
            Role::Client { mirror, link, status, .. } => {
                if link.is_some() && mirror.player_id().is_some() {
                    format!("Connected teammates: {}", mirror.teammate_count())
                } else {
                    status.clone()
                }
            }
        }
    }
}

fn drive_local(sim: &mut Simulation, dt: f32, input: &LocalInput) -> Vec<SimEvent> {
    let angle = input.angle.map(angle::wrap).unwrap_or(sim.state().local().angle);
    sim.set_local_input(HumanInput {
        keys: input.keys,
        angle,
        shoot: input.shoot,
    });

    let local_id = sim.state().local().id.clone();
    if let Some(weapon) = input.buy {
        if let Some(outcome) = sim.buy_or_equip(&local_id, weapon) {
            debug!("Shop {}: {:?}", weapon.id(), outcome);
        }
    }
    if let Some(perk) = input.perk {
        if !sim.apply_perk(perk) {
            debug!("Perk {:?} not applied", perk);
        }
    }
    if input.restart && sim.restart() {
        info!("Restarted after wipe");
    }

    sim.tick(dt)
}

fn handle_host_event(sim: &mut Simulation, event: HostEvent) {
    match event {
        HostEvent::Connected { player_id } => {
            let name = format!("Teammate {}", player_id);
            sim.add_remote(player_id, &name);
        }
        HostEvent::Disconnected { player_id } => {
            sim.remove_remote(&player_id);
        }
        HostEvent::Message { player_id, message } => match message {
            ClientMessage::Hello { name } => {
                let name = sanitize_name(&name);
                if name.is_empty() {
                    return;
                }
                if let Some(remote) = sim.state_mut().human_mut(&player_id) {
                    info!("{} is now known as {}", player_id, name);
                    remote.name = name;
                }
            }
            ClientMessage::Input { keys, angle, shoot } => {
                let current = match sim.state().human(&player_id) {
                    Some(remote) => remote.angle,
                    None => return,
                };
                let angle = angle.filter(|a| a.is_finite()).map(angle::wrap).unwrap_or(current);
                sim.set_remote_input(
                    &player_id,
                    HumanInput {
                        keys: KeySet::from_wire(&keys),
                        angle,
                        shoot,
                    },
                );
            }
            ClientMessage::BuyOrEquip { weapon } => match WeaponKind::from_id(&weapon) {
                Some(kind) => {
                    if let Some(outcome) = sim.buy_or_equip(&player_id, kind) {
                        debug!("Shop {} for {}: {:?}", weapon, player_id, outcome);
                    }
                }
                None => debug!("Unknown weapon '{}' from {}", weapon, player_id),
            },
        },
    }
}

fn drive_client(
    mirror: &mut ClientMirror,
    profile: &mut Profile,
    link: &mut Option<CoopClient>,
    status: &mut String,
    dt: f32,
    input: &LocalInput,
    send_due: bool,
) {
    let mut angle = input.angle.unwrap_or(mirror.state().local().angle);
    if input.keys.contains(Key::TurnLeft) {
        angle -= player::TURN_SPEED * dt;
    }
    if input.keys.contains(Key::TurnRight) {
        angle += player::TURN_SPEED * dt;
    }
    mirror.set_local_angle(angle::wrap(angle));

    if let Some(perk) = input.perk {
        if !profile.apply_perk(perk) {
            debug!("Perk {:?} not applied", perk);
        }
    }

    let mut lost = false;
    if let Some(client) = link.as_ref() {
        for event in client.poll() {
            match event {
                ClientEvent::Message(HostMessage::Welcome { player_id }) => mirror.on_welcome(player_id),
                ClientEvent::Message(HostMessage::Snapshot(snapshot)) => mirror.apply_snapshot(&snapshot),
                ClientEvent::Disconnected => lost = true,
            }
        }

        if !lost {
            if let Some(weapon) = input.buy {
                client.send(&ClientMessage::BuyOrEquip {
                    weapon: weapon.id().to_string(),
                });
            }
            if send_due {
                let message = ClientMessage::Input {
                    keys: input.keys.to_wire(),
                    angle: Some(mirror.state().local().angle),
                    shoot: input.shoot,
                };
                lost = !client.send(&message);
            }
        }
    }

    if lost {
        warn!("Disconnected from host");
        *link = None;
        *status = "Disconnected from host".to_string();
    }

    mirror.interpolate(dt);
}
