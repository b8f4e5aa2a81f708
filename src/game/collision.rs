//! Circle-vs-grid collision and stepped line-of-sight.

use crate::game::map::TileMap;
use crate::util::vec2::Vec2;

/// Sample spacing for line-of-sight tests (map units)
pub const LOS_STEP: f32 = 0.08;

/// Whether a circle of `radius` centred at `pos` fits without touching a wall.
///
/// Tests the four corners of the circle's bounding box.
pub fn can_move(map: &TileMap, pos: Vec2, radius: f32) -> bool {
    !(map.is_wall(pos.x - radius, pos.y - radius)
        || map.is_wall(pos.x + radius, pos.y - radius)
        || map.is_wall(pos.x - radius, pos.y + radius)
        || map.is_wall(pos.x + radius, pos.y + radius))
}

/// Move by `delta`, resolving X and Y independently so the mover slides
/// along walls instead of stopping dead.
pub fn try_move(map: &TileMap, pos: Vec2, delta: Vec2, radius: f32) -> Vec2 {
    let mut out = pos;
    let nx = Vec2::new(pos.x + delta.x, pos.y);
    if can_move(map, nx, radius) {
        out.x = nx.x;
    }
    let ny = Vec2::new(out.x, pos.y + delta.y);
    if can_move(map, ny, radius) {
        out.y = ny.y;
    }
    out
}

/// Whether the segment `a -> b` is clear of walls.
///
/// Interior samples only: the endpoints themselves are not tested, so an
/// entity hugging a wall can still be seen.
pub fn line_of_sight(map: &TileMap, a: Vec2, b: Vec2) -> bool {
    let d = b - a;
    let dist = d.length();
    if dist < 0.01 {
        return true;
    }
    let steps = ((dist / LOS_STEP) as usize).max(1);
    (1..steps).all(|i| {
        let t = i as f32 / steps as f32;
        !map.is_wall(a.x + d.x * t, a.y + d.y * t)
    })
}
