//! Grid DDA wall casting
//!
//! Uses rayon to cast screen columns in parallel; each ray only reads the map.

use rayon::prelude::*;

use crate::game::constants::render;
use crate::game::map::TileMap;
use crate::render::Rgb;
use crate::util::vec2::Vec2;

/// Grid axis whose line the ray crossed when it hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallSide {
    /// Crossed a vertical grid line (stepped in x)
    X,
    /// Crossed a horizontal grid line (stepped in y)
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Raw distance along the ray, at most `MAX_DEPTH`
    pub distance: f32,
    pub side: WallSide,
}

/// Step a ray through the grid until it enters a wall cell, leaves the map
/// or passes `MAX_DEPTH`.
pub fn cast_ray(map: &TileMap, origin: Vec2, angle: f32) -> RayHit {
    let (sin_a, cos_a) = angle.sin_cos();

    let mut map_x = origin.x.floor() as i64;
    let mut map_y = origin.y.floor() as i64;

    let delta_x = if cos_a.abs() > 1e-8 { (1.0 / cos_a).abs() } else { 1e6 };
    let delta_y = if sin_a.abs() > 1e-8 { (1.0 / sin_a).abs() } else { 1e6 };

    let (step_x, mut side_x) = if cos_a < 0.0 {
        (-1, (origin.x - map_x as f32) * delta_x)
    } else {
        (1, (map_x as f32 + 1.0 - origin.x) * delta_x)
    };
    let (step_y, mut side_y) = if sin_a < 0.0 {
        (-1, (origin.y - map_y as f32) * delta_y)
    } else {
        (1, (map_y as f32 + 1.0 - origin.y) * delta_y)
    };

    let width = map.width() as i64;
    let height = map.height() as i64;
    let mut side = WallSide::X;

    for _ in 0..render::MAX_DDA_STEPS {
        let dist;
        if side_x < side_y {
            map_x += step_x;
            dist = side_x;
            side_x += delta_x;
            side = WallSide::X;
        } else {
            map_y += step_y;
            dist = side_y;
            side_y += delta_y;
            side = WallSide::Y;
        }

        if dist > render::MAX_DEPTH || map_x < 0 || map_y < 0 || map_x >= width || map_y >= height {
            break;
        }
        if map.is_wall_cell(map_x, map_y) {
            return RayHit { distance: dist, side };
        }
    }

    RayHit {
        distance: render::MAX_DEPTH,
        side,
    }
}

/// Angle of ray `index` out of `count` spread evenly across `fov`
#[inline]
pub fn ray_angle(view_angle: f32, fov: f32, index: usize, count: usize) -> f32 {
    view_angle - fov / 2.0 + (index as f32 / count as f32) * fov
}

/// Cast `count` rays across the field of view. Returns `(hit, corrected
/// distance)` per column, left to right.
pub fn cast_columns(map: &TileMap, origin: Vec2, view_angle: f32, fov: f32, count: usize) -> Vec<(RayHit, f32)> {
    (0..count)
        .into_par_iter()
        .map(|i| {
            let angle = ray_angle(view_angle, fov, i, count);
            let hit = cast_ray(map, origin, angle);
            let corrected = (hit.distance * (angle - view_angle).cos()).max(render::MIN_CORRECTED_DIST);
            (hit, corrected)
        })
        .collect()
}

/// On-screen wall height for a corrected distance
#[inline]
pub fn projected_height(viewport_height: f32, corrected: f32) -> f32 {
    (viewport_height * render::WALL_HEIGHT_SCALE / corrected.max(render::MIN_CORRECTED_DIST)).min(viewport_height)
}

/// Distance fog with the y-side dimmed
pub fn wall_shade(corrected: f32, side: WallSide) -> Rgb {
    let mut shade = (render::SHADE_NEAR - corrected * render::SHADE_PER_UNIT)
        .clamp(render::SHADE_FAR, render::SHADE_NEAR)
        .floor();
    if side == WallSide::Y {
        shade = (shade * render::SIDE_DIMMING).floor();
    }
    let s = shade as u8;
    Rgb::new(s, s, s.saturating_add(5))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hall() -> TileMap {
        TileMap::from_rows(&["#######", "#.....#", "#.....#", "#.....#", "#######"])
    }

    #[test]
    fn test_straight_ray_hits_wall() {
        let map = hall();
        let hit = cast_ray(&map, Vec2::new(1.5, 2.5), 0.0);
        assert!((hit.distance - 4.5).abs() < 1e-4);
        assert_eq!(hit.side, WallSide::X);

        let down = cast_ray(&map, Vec2::new(1.5, 2.5), std::f32::consts::FRAC_PI_2);
        assert!((down.distance - 1.5).abs() < 1e-4);
        assert_eq!(down.side, WallSide::Y);
    }

    #[test]
    fn test_distance_capped_at_max_depth() {
        let long = format!("#{}#", ".".repeat(40));
        let map = TileMap::from_rows(&["#".repeat(42), long, "#".repeat(42)]);
        let hit = cast_ray(&map, Vec2::new(1.5, 1.5), 0.0);
        assert_eq!(hit.distance, render::MAX_DEPTH);

        // Open edge: leaving the map counts as no hit
        let open = TileMap::from_rows(&["...."]);
        assert_eq!(cast_ray(&open, Vec2::new(0.5, 0.5), 0.0).distance, render::MAX_DEPTH);
    }

    #[test]
    fn test_distance_grows_as_ray_turns_off_normal() {
        let map = hall();
        let origin = Vec2::new(1.5, 2.5);
        let mut last = cast_ray(&map, origin, 0.0).distance;
        for step in 1..5 {
            let d = cast_ray(&map, origin, step as f32 * 0.04).distance;
            assert!(d > last, "{} <= {} at step {}", d, last, step);
            last = d;
        }
    }

    #[test]
    fn test_columns_are_fisheye_corrected() {
        let map = hall();
        let cols = cast_columns(&map, Vec2::new(1.5, 2.5), 0.0, 0.5, 11);
        assert_eq!(cols.len(), 11);
        // A flat wall facing the camera has the same corrected distance everywhere
        for (_, corrected) in &cols {
            assert!((corrected - 4.5).abs() < 1e-3, "corrected {}", corrected);
        }
    }

    #[test]
    fn test_projection_and_shade() {
        assert_eq!(projected_height(720.0, 0.1), 720.0);
        assert!((projected_height(720.0, 2.0) - 342.0).abs() < 1e-3);
        assert_eq!(wall_shade(0.5, WallSide::X), Rgb::new(220, 220, 225));
        assert_eq!(wall_shade(0.5, WallSide::Y), Rgb::new(158, 158, 163));
        assert_eq!(wall_shade(19.0, WallSide::X), Rgb::new(24, 24, 29));
    }
}
