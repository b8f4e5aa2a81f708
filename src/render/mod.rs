//! First-person raycast renderer
//!
//! Produces a backend-agnostic [`Frame`] describing what to paint: flat
//! ceiling and floor, one shaded wall column per ray and depth-ordered
//! billboard sprites. Drawing the frame onto a window is left to the caller.

pub mod quality;
pub mod raycast;
pub mod sprites;

use crate::config::Settings;
use crate::game::constants::settings as bounds;
use crate::game::map::TileMap;
use crate::game::state::GameState;
use crate::util::vec2::Vec2;

use self::quality::AdaptiveQuality;
use self::sprites::Sprite;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From `0xRRGGBB`
    pub const fn hex(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xff) as u8,
            g: ((value >> 8) & 0xff) as u8,
            b: (value & 0xff) as u8,
        }
    }

    pub fn scaled(self, factor: f32) -> Self {
        let f = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
        Self::new(f(self.r), f(self.g), f(self.b))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const CEILING: Rgb = Rgb::hex(0x2a2e36);
pub const FLOOR: Rgb = Rgb::hex(0x181614);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    pub angle: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallColumn {
    pub x: f32,
    pub width: f32,
    pub top: f32,
    pub bottom: f32,
    pub color: Rgb,
    /// Corrected distance
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteShape {
    /// Upright rectangle with a head oval on top
    Body { head: Rgb },
    /// Flat slab on the floor
    Corpse,
    /// Filled oval
    Coin,
    /// Outlined circle
    Ring,
    /// Outlined square
    Frame,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpriteDraw {
    pub center_x: f32,
    pub top: f32,
    pub bottom: f32,
    pub width: f32,
    pub color: Rgb,
    pub shape: SpriteShape,
    pub label: Option<String>,
    pub distance: f32,
}

/// Everything needed to paint one view, back to front
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub viewport: Viewport,
    pub ceiling: Rgb,
    pub floor: Rgb,
    pub walls: Vec<WallColumn>,
    pub sprites: Vec<SpriteDraw>,
}

/// Owns the viewport, field of view, ray budget and depth buffer
pub struct Renderer {
    viewport: Viewport,
    fov: f32,
    quality: AdaptiveQuality,
    fps_limit: u32,
    zbuffer: Vec<f32>,
}

impl Renderer {
    pub fn new(settings: &Settings) -> Self {
        let [width, height] = settings.resolution;
        let viewport = clamp_viewport(width, height);
        Self {
            viewport,
            fov: settings.fov_radians(),
            quality: AdaptiveQuality::new(viewport.width, settings.fps_limit, settings.adaptive_quality_enabled),
            fps_limit: settings.fps_limit,
            zbuffer: Vec::new(),
        }
    }

    /// Re-read every renderer-relevant option
    pub fn apply_settings(&mut self, settings: &Settings) {
        let [width, height] = settings.resolution;
        self.fps_limit = settings.fps_limit;
        self.fov = settings.fov_radians();
        self.quality.set_enabled(settings.adaptive_quality_enabled);
        self.resize(width, height);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = clamp_viewport(width, height);
        self.quality.reconfigure(self.viewport.width, self.fps_limit);
    }

    pub fn set_fov_degrees(&mut self, degrees: f32) {
        let degrees = if degrees.is_finite() { degrees } else { bounds::DEFAULT_FOV_DEG };
        self.fov = degrees.clamp(bounds::MIN_FOV_DEG, bounds::MAX_FOV_DEG).to_radians();
    }

    /// Feed the last frame's wall-clock duration to adaptive quality
    pub fn observe_frame_time(&mut self, dt: f32) -> bool {
        self.quality.observe(dt)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn ray_count(&self) -> usize {
        self.quality.rays()
    }

    pub fn quality(&self) -> &AdaptiveQuality {
        &self.quality
    }

    /// Corrected wall distance per column from the last render
    pub fn zbuffer(&self) -> &[f32] {
        &self.zbuffer
    }

    /// Render the view of `state.humans[viewer]`
    pub fn render_state(&mut self, map: &TileMap, state: &GameState, viewer: usize) -> Option<Frame> {
        let human = state.humans.get(viewer)?;
        let camera = Camera {
            position: human.position,
            angle: human.angle,
        };
        let sprites = sprites::collect(state, viewer);
        Some(self.render(map, &camera, &sprites))
    }

    pub fn render(&mut self, map: &TileMap, camera: &Camera, sprites: &[Sprite]) -> Frame {
        let rays = self.quality.rays();
        let columns = raycast::cast_columns(map, camera.position, camera.angle, self.fov, rays);

        let width = self.viewport.width as f32;
        let height = self.viewport.height as f32;
        let half = height / 2.0;
        let slice = width / rays as f32;

        self.zbuffer.clear();
        self.zbuffer.extend(columns.iter().map(|(_, corrected)| *corrected));

        let walls = columns
            .iter()
            .enumerate()
            .map(|(i, (hit, corrected))| {
                let proj = raycast::projected_height(height, *corrected);
                WallColumn {
                    x: i as f32 * slice,
                    width: slice + 1.0,
                    top: half - proj / 2.0,
                    bottom: half + proj / 2.0,
                    color: raycast::wall_shade(*corrected, hit.side),
                    distance: *corrected,
                }
            })
            .collect();

        let sprites = sprites::compose(sprites, camera, self.viewport, self.fov, &self.zbuffer);

        Frame {
            viewport: self.viewport,
            ceiling: CEILING,
            floor: FLOOR,
            walls,
            sprites,
        }
    }
}

fn clamp_viewport(width: u32, height: u32) -> Viewport {
    Viewport {
        width: width.clamp(bounds::MIN_WIDTH, bounds::MAX_WIDTH),
        height: height.clamp(bounds::MIN_HEIGHT, bounds::MAX_HEIGHT),
    }
}
