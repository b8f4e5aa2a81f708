//! Billboard sprites
//!
//! Every drawable entity becomes a [`Sprite`]: a position plus a payload
//! variant. [`compose`] culls them against the view cone and the wall depth
//! buffer, then projects them far-to-near.

use crate::game::constants::render::{SPRITE_DEPTH_FORGIVENESS, SPRITE_FOV_MARGIN, TEAMMATE_MIN_DIST};
use crate::game::state::{BotKind, GameState, Tactic};
use crate::render::{Camera, Rgb, SpriteDraw, SpriteShape, Viewport};
use crate::util::angle;
use crate::util::vec2::Vec2;

#[derive(Debug, Clone, PartialEq)]
pub enum SpriteKind {
    Bot { kind: BotKind, tactic: Tactic },
    Corpse { kind: BotKind },
    Drop { value: u32 },
    Teammate { name: String, downed: bool },
    Ping { owner: String },
    Zone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub position: Vec2,
    pub kind: SpriteKind,
}

impl Sprite {
    pub fn new(position: Vec2, kind: SpriteKind) -> Self {
        Self { position, kind }
    }
}

/// Gather everything `viewer` (an index into `state.humans`) can see
pub fn collect(state: &GameState, viewer: usize) -> Vec<Sprite> {
    let Some(eye) = state.humans.get(viewer).map(|h| h.position) else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(state.bots.len() + state.drops.len() + state.humans.len() + 2);

    for bot in &state.bots {
        if bot.alive {
            out.push(Sprite::new(
                bot.position,
                SpriteKind::Bot {
                    kind: bot.kind,
                    tactic: bot.tactic,
                },
            ));
        } else if bot.corpse_ttl > 0.0 {
            out.push(Sprite::new(bot.position, SpriteKind::Corpse { kind: bot.kind }));
        }
    }

    out.extend(
        state
            .drops
            .iter()
            .map(|d| Sprite::new(d.position, SpriteKind::Drop { value: d.value })),
    );

    if let Some(ping) = &state.ping {
        out.push(Sprite::new(
            ping.position,
            SpriteKind::Ping {
                owner: ping.owner.clone(),
            },
        ));
    }

    if let Some([x, y, _]) = state.objective.zone() {
        out.push(Sprite::new(Vec2::new(x, y), SpriteKind::Zone));
    }

    for (i, human) in state.humans.iter().enumerate() {
        if i == viewer || human.position.distance_to(eye) < TEAMMATE_MIN_DIST {
            continue;
        }
        out.push(Sprite::new(
            human.position,
            SpriteKind::Teammate {
                name: human.name.clone(),
                downed: human.downed || human.health <= 0.0,
            },
        ));
    }

    out
}

mod palette {
    use super::Rgb;

    pub const GRUNT: Rgb = Rgb::hex(0xd64a4a);
    pub const FLANKER: Rgb = Rgb::hex(0xdc8750);
    pub const TANK: Rgb = Rgb::hex(0x7b5ad0);
    pub const SHARPSHOOTER: Rgb = Rgb::hex(0x49a2d6);
    pub const BOSS: Rgb = Rgb::hex(0xf04d9d);
    pub const IN_COVER: Rgb = Rgb::hex(0xc28a3e);
    pub const BOT_HEAD: Rgb = Rgb::hex(0xe4b7a0);
    pub const TEAMMATE: Rgb = Rgb::hex(0x4a8ad6);
    pub const TEAMMATE_HEAD: Rgb = Rgb::hex(0xf1c7ac);
    pub const DOWNED: Rgb = Rgb::hex(0x5a5a5a);
    pub const DOWNED_HEAD: Rgb = Rgb::hex(0xb3b3b3);
    pub const MONEY: Rgb = Rgb::hex(0x68d96f);
    pub const PING: Rgb = Rgb::hex(0xffd967);
    pub const ZONE: Rgb = Rgb::hex(0x7ce6ff);
}

fn body_color(kind: BotKind) -> Rgb {
    match kind {
        BotKind::Grunt => palette::GRUNT,
        BotKind::Flanker => palette::FLANKER,
        BotKind::Tank => palette::TANK,
        BotKind::Sharpshooter => palette::SHARPSHOOTER,
        BotKind::Boss => palette::BOSS,
    }
}

fn size_scale(kind: BotKind) -> f32 {
    match kind {
        BotKind::Tank => 1.18,
        BotKind::Boss => 1.34,
        BotKind::Flanker => 0.92,
        BotKind::Grunt | BotKind::Sharpshooter => 1.0,
    }
}

/// Screen column a bearing `theta` (relative to view centre) lands in
#[inline]
fn screen_x(theta: f32, fov: f32, width: f32) -> f32 {
    (0.5 + theta / fov) * width
}

/// Project, cull and depth-order `sprites` for one view. `zbuffer` holds one
/// corrected wall distance per ray column.
pub fn compose(sprites: &[Sprite], camera: &Camera, viewport: Viewport, fov: f32, zbuffer: &[f32]) -> Vec<SpriteDraw> {
    let mut ranked: Vec<(f32, &Sprite)> = sprites
        .iter()
        .map(|s| (s.position.distance_to(camera.position), s))
        .collect();
    // Far to near; stable so equal distances keep collection order
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let width = viewport.width as f32;
    let half = viewport.height as f32 / 2.0;
    let h = viewport.height as f32;

    let mut draws = Vec::with_capacity(ranked.len());
    for (dist, sprite) in ranked {
        let to = sprite.position - camera.position;
        let theta = angle::wrap(to.angle() - camera.angle);
        if theta.abs() > fov * SPRITE_FOV_MARGIN {
            continue;
        }

        let sx = screen_x(theta, fov, width);
        let col = ((sx / width) * zbuffer.len() as f32).floor();
        if col < 0.0 || col as usize >= zbuffer.len() {
            continue;
        }
        if dist > zbuffer[col as usize] + SPRITE_DEPTH_FORGIVENESS {
            continue;
        }

        draws.push(project(sprite, dist, sx, half, h));
    }
    draws
}

fn project(sprite: &Sprite, dist: f32, sx: f32, half: f32, h: f32) -> SpriteDraw {
    let body = |height: f32, aspect: f32, color: Rgb, head: Rgb, label: Option<String>| SpriteDraw {
        center_x: sx,
        top: half - height / 2.0,
        bottom: half + height / 2.0,
        width: (height * aspect).floor(),
        color,
        shape: SpriteShape::Body { head },
        label,
        distance: dist,
    };

    match &sprite.kind {
        SpriteKind::Bot { kind, tactic } => {
            let height = (h * 0.72 * size_scale(*kind) / dist.max(0.15)).floor();
            let color = if *tactic == Tactic::Cover {
                palette::IN_COVER
            } else {
                body_color(*kind)
            };
            body(height, 0.48, color, palette::BOT_HEAD, None)
        }
        SpriteKind::Corpse { kind } => {
            let height = (h * 0.72 * size_scale(*kind) / dist.max(0.15)).floor();
            let width = (height * 0.6).floor();
            SpriteDraw {
                center_x: sx,
                top: half + height * 0.38,
                bottom: half + height / 2.0,
                width,
                color: body_color(*kind).scaled(0.45),
                shape: SpriteShape::Corpse,
                label: None,
                distance: dist,
            }
        }
        SpriteKind::Teammate { name, downed } => {
            let height = (h * 0.7 / dist.max(0.15)).floor();
            if *downed {
                body(height, 0.46, palette::DOWNED, palette::DOWNED_HEAD, Some(format!("{} [DOWN]", name)))
            } else {
                body(height, 0.46, palette::TEAMMATE, palette::TEAMMATE_HEAD, Some(name.clone()))
            }
        }
        SpriteKind::Drop { .. } => {
            let size = (h * 0.22 / dist.max(0.2)).floor();
            let top = half + size * 0.2;
            SpriteDraw {
                center_x: sx,
                top,
                bottom: top + size,
                width: size,
                color: palette::MONEY,
                shape: SpriteShape::Coin,
                label: None,
                distance: dist,
            }
        }
        SpriteKind::Ping { .. } => {
            let size = (h * 0.16 / dist.max(0.2)).floor();
            SpriteDraw {
                center_x: sx,
                top: half - size,
                bottom: half + size,
                width: size * 2.0,
                color: palette::PING,
                shape: SpriteShape::Ring,
                label: Some("PING".to_string()),
                distance: dist,
            }
        }
        SpriteKind::Zone => {
            let size = (h * 0.2 / dist.max(0.2)).floor();
            SpriteDraw {
                center_x: sx,
                top: half - size,
                bottom: half + size,
                width: size * 2.0,
                color: palette::ZONE,
                shape: SpriteShape::Frame,
                label: Some("ZONE".to_string()),
                distance: dist,
            }
        }
    }
}
