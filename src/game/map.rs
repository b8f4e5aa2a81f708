//! Static tile grid
//!
//! The map is parsed once at startup and never mutated. Walls are stored in a
//! packed bit grid; derived cell sets (floor cells, cover points) are computed
//! eagerly because every wave spawn and AI decision reads them.

use std::collections::VecDeque;

use bitvec::prelude::*;
use rustc_hash::FxHashSet;

use crate::game::constants::WORLD_MAP;
use crate::util::vec2::Vec2;

/// Grid cell coordinate `(column, row)`
pub type Cell = (usize, usize);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map has no rows")]
    Empty,
    #[error("row {row} has width {found}, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown tile '{tile}' at row {row}, column {col}")]
    UnknownTile { row: usize, col: usize, tile: char },
}

#[derive(Debug, Clone)]
pub struct TileMap {
    width: usize,
    height: usize,
    walls: BitVec,
    floor_cells: Vec<Cell>,
    cover_points: Vec<Vec2>,
}

impl TileMap {
    /// The built-in arena layout
    pub fn arena() -> Self {
        Self::from_rows(&WORLD_MAP)
    }

    /// Build from rows without validation. Any character other than `.` is a
    /// wall and short rows are padded with walls.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
        let mut walls = bitvec![1; width * height];

        for (y, row) in rows.iter().enumerate() {
            for (x, tile) in row.as_ref().bytes().enumerate() {
                if tile == b'.' {
                    walls.set(y * width + x, false);
                }
            }
        }

        let mut map = Self {
            width,
            height,
            walls,
            floor_cells: Vec::new(),
            cover_points: Vec::new(),
        };
        map.floor_cells = map.collect_floor_cells();
        map.cover_points = map.collect_cover_points();
        map
    }

    /// Strict parser for externally supplied maps
    pub fn parse(text: &str) -> Result<Self, MapError> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .collect();
        let Some(first) = rows.first() else {
            return Err(MapError::Empty);
        };
        let expected = first.chars().count();

        for (row, line) in rows.iter().enumerate() {
            let found = line.chars().count();
            if found != expected {
                return Err(MapError::RaggedRow {
                    row,
                    expected,
                    found,
                });
            }
            if let Some((col, tile)) = line.chars().enumerate().find(|(_, c)| *c != '#' && *c != '.') {
                return Err(MapError::UnknownTile { row, col, tile });
            }
        }

        Ok(Self::from_rows(&rows))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Wall test for a grid cell; anything outside the grid is wall
    #[inline]
    pub fn is_wall_cell(&self, cx: i64, cy: i64) -> bool {
        if cx < 0 || cy < 0 || cx as usize >= self.width || cy as usize >= self.height {
            return true;
        }
        self.walls[cy as usize * self.width + cx as usize]
    }

    /// Wall test for a world-space point (floored to its cell)
    #[inline]
    pub fn is_wall(&self, x: f32, y: f32) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return true;
        }
        self.is_wall_cell(x.floor() as i64, y.floor() as i64)
    }

    #[inline]
    pub fn is_wall_at(&self, p: Vec2) -> bool {
        self.is_wall(p.x, p.y)
    }

    pub fn floor_cells(&self) -> &[Cell] {
        &self.floor_cells
    }

    /// Centres of floor cells with at least two wall neighbours
    pub fn cover_points(&self) -> &[Vec2] {
        &self.cover_points
    }

    /// Floor cells 4-connected to the cell containing `from`.
    ///
    /// Falls back to every floor cell when `from` sits in a wall or nothing is
    /// reachable, so callers always have somewhere to place things.
    pub fn reachable_from(&self, from: Vec2) -> Vec<Cell> {
        if self.is_wall_at(from) {
            return self.floor_cells.clone();
        }
        let start = (from.x.floor() as usize, from.y.floor() as usize);

        let mut visited: FxHashSet<Cell> = FxHashSet::default();
        let mut queue = VecDeque::new();
        let mut out = Vec::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some((x, y)) = queue.pop_front() {
            out.push((x, y));
            for (nx, ny) in neighbours(x as i64, y as i64) {
                if self.is_wall_cell(nx, ny) {
                    continue;
                }
                let cell = (nx as usize, ny as usize);
                if visited.insert(cell) {
                    queue.push_back(cell);
                }
            }
        }

        if out.is_empty() {
            self.floor_cells.clone()
        } else {
            out
        }
    }

    fn collect_floor_cells(&self) -> Vec<Cell> {
        let mut cells = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.walls[y * self.width + x] {
                    cells.push((x, y));
                }
            }
        }
        cells
    }

    fn collect_cover_points(&self) -> Vec<Vec2> {
        self.floor_cells
            .iter()
            .filter(|&&(x, y)| {
                neighbours(x as i64, y as i64)
                    .into_iter()
                    .filter(|&(nx, ny)| self.is_wall_cell(nx, ny))
                    .count()
                    >= 2
            })
            .map(|&(x, y)| Vec2::cell_center(x, y))
            .collect()
    }
}

impl Default for TileMap {
    fn default() -> Self {
        Self::arena()
    }
}

#[inline]
fn neighbours(x: i64, y: i64) -> [(i64, i64); 4] {
    [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)]
}
