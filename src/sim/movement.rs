//! Movement validation against the maze
//!
//! Two collision policies are supported: a point-in-cell test and a half-cell
//! bounding box swept against wall rectangles. Anything outside the grid is
//! treated as solid.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::maze::{CellPos, Maze};
use crate::settings::CollisionPolicy;
use crate::world_to_cell;

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Square of side `size` centred on `center`
    pub fn centered(center: Vec2, size: f32) -> Self {
        let half = Vec2::splat(size / 2.0);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Rectangle covering the cell at `pos`
    pub fn cell(pos: CellPos, cell_size: f32) -> Self {
        let min = Vec2::new(pos.col as f32 * cell_size, pos.row as f32 * cell_size);
        Self {
            min,
            max: min + Vec2::splat(cell_size),
        }
    }

    /// Strict overlap: rectangles that only share an edge do not collide
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

/// Result of a movement attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveOutcome {
    /// Nothing was requested
    Idle,
    /// Move accepted, player now at the given position
    Moved(Vec2),
    /// Move blocked, position unchanged
    Blocked,
}

impl MoveOutcome {
    /// Position after applying this outcome to `current`
    pub fn resolve(self, current: Vec2) -> Vec2 {
        match self {
            MoveOutcome::Moved(pos) => pos,
            MoveOutcome::Idle | MoveOutcome::Blocked => current,
        }
    }
}

/// Scale a raw intent vector to `speed` pixels, or zero when there is no intent
pub fn movement_delta(intent: Vec2, speed: f32) -> Vec2 {
    intent.normalize_or_zero() * speed
}

/// Validate `current + delta` against the maze using the chosen policy
pub fn try_move(
    current: Vec2,
    delta: Vec2,
    maze: &Maze,
    cell_size: f32,
    policy: CollisionPolicy,
) -> MoveOutcome {
    if delta == Vec2::ZERO {
        return MoveOutcome::Idle;
    }
    let target = current + delta;
    let free = match policy {
        CollisionPolicy::GridCell => point_is_free(target, maze, cell_size),
        CollisionPolicy::BoundingBox => {
            box_is_free(&Rect::centered(target, cell_size / 2.0), maze, cell_size)
        }
    };
    if free {
        MoveOutcome::Moved(target)
    } else {
        MoveOutcome::Blocked
    }
}

/// Whether the cell under `pos` is walkable
pub fn point_is_free(pos: Vec2, maze: &Maze, cell_size: f32) -> bool {
    world_to_cell(pos, cell_size)
        .is_some_and(|(row, col)| maze.is_walkable(CellPos::new(row, col)))
}

/// Whether `rect` overlaps no wall cell.
///
/// Rectangles reaching outside the grid are blocked. Otherwise only the cells
/// under the rectangle are inspected; they are exactly the wall rectangles it
/// could touch.
pub fn box_is_free(rect: &Rect, maze: &Maze, cell_size: f32) -> bool {
    if !(rect.min.is_finite() && rect.max.is_finite()) || !(cell_size > 0.0) {
        return false;
    }
    let bounds = Vec2::new(maze.width() as f32, maze.height() as f32) * cell_size;
    if rect.min.x < 0.0 || rect.min.y < 0.0 || rect.max.x > bounds.x || rect.max.y > bounds.y {
        return false;
    }

    // Inside the grid, so every index below fits
    let first_col = (rect.min.x / cell_size).floor() as usize;
    let first_row = (rect.min.y / cell_size).floor() as usize;
    let last_col = ((rect.max.x / cell_size).ceil() as usize).saturating_sub(1);
    let last_row = ((rect.max.y / cell_size).ceil() as usize).saturating_sub(1);

    for row in first_row..=last_row {
        for col in first_col..=last_col {
            let pos = CellPos::new(row, col);
            if !maze.is_walkable(pos) && rect.overlaps(&Rect::cell(pos, cell_size)) {
                return false;
            }
        }
    }
    true
}

/// Rectangles of every wall cell, for rendering and brute-force checks
pub fn wall_rects(maze: &Maze, cell_size: f32) -> Vec<Rect> {
    maze.iter()
        .filter(|(_, cell)| !cell.is_walkable())
        .map(|(pos, _)| Rect::cell(pos, cell_size))
        .collect()
}
