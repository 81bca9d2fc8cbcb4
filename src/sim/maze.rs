//! Procedural maze generation
//!
//! Perfect mazes carved by an iterative randomized depth-first walk over the
//! odd-coordinate lattice. Corridors advance two cells at a time so a one-cell
//! wall always separates parallel passages.

use std::collections::VecDeque;
use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MIN_MAZE_SIDE;

/// Errors produced while building a maze
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MazeError {
    /// Grid too small (or not odd-aligned) to hold a border and a carvable interior
    #[error("invalid maze dimensions {width}x{height}: sides must be odd and at least 5")]
    InvalidDimensions { width: usize, height: usize },
    /// Start or exit does not sit on the carving lattice
    #[error("cell ({row}, {col}) is not a valid carving endpoint")]
    InvalidEndpoint { row: usize, col: usize },
    /// Text layout could not be parsed
    #[error("invalid maze layout: {0}")]
    InvalidLayout(String),
}

/// A single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall,
    Open,
    Start,
    Exit,
}

impl Cell {
    /// Whether the player may stand in this cell
    pub fn is_walkable(self) -> bool {
        self != Cell::Wall
    }

    pub fn as_char(self) -> char {
        match self {
            Cell::Wall => '#',
            Cell::Open => ' ',
            Cell::Start => 'P',
            Cell::Exit => 'E',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '#' => Some(Cell::Wall),
            ' ' | '.' => Some(Cell::Open),
            'P' => Some(Cell::Start),
            'E' => Some(Cell::Exit),
            _ => None,
        }
    }
}

/// Grid coordinate (row-major, origin top-left)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// An immutable maze grid with one start and one exit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    start: CellPos,
    exit: CellPos,
    /// Lattice nodes reached by the carving walk (0 for hand-written layouts)
    carved_nodes: usize,
}

/// Axis directions in grid space as (d_row, d_col)
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

impl Maze {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn start(&self) -> CellPos {
        self.start
    }

    pub fn exit(&self) -> CellPos {
        self.exit
    }

    /// Number of lattice nodes visited by the carving walk
    pub fn carved_nodes(&self) -> usize {
        self.carved_nodes
    }

    /// Cell at `pos`, or None when out of bounds
    pub fn get(&self, pos: CellPos) -> Option<Cell> {
        if pos.row < self.height && pos.col < self.width {
            Some(self.cells[pos.row * self.width + pos.col])
        } else {
            None
        }
    }

    /// Out-of-bounds cells count as walls
    pub fn is_walkable(&self, pos: CellPos) -> bool {
        self.get(pos).is_some_and(Cell::is_walkable)
    }

    /// Number of non-wall cells
    pub fn open_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_walkable()).count()
    }

    /// Iterate over all cells with their coordinates
    pub fn iter(&self) -> impl Iterator<Item = (CellPos, Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, &c)| (CellPos::new(i / self.width, i % self.width), c))
    }

    /// Text rows, one char per cell (`#`, ` `, `P`, `E`)
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().map(|c| c.as_char()).collect())
            .collect()
    }

    /// Parse a hand-written layout. Exactly one `P` and one `E` are required.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, MazeError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().chars().count()).unwrap_or(0);
        if width == 0 {
            return Err(MazeError::InvalidLayout("empty layout".into()));
        }

        let mut cells = Vec::with_capacity(width * height);
        let mut start = None;
        let mut exit = None;
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            if line.chars().count() != width {
                return Err(MazeError::InvalidLayout(format!(
                    "row {row} has {} cells, expected {width}",
                    line.chars().count()
                )));
            }
            for (col, ch) in line.chars().enumerate() {
                let cell = Cell::from_char(ch).ok_or_else(|| {
                    MazeError::InvalidLayout(format!("unknown cell {ch:?} at ({row}, {col})"))
                })?;
                let slot = match cell {
                    Cell::Start => Some(&mut start),
                    Cell::Exit => Some(&mut exit),
                    _ => None,
                };
                if let Some(slot) = slot {
                    if slot.replace(CellPos::new(row, col)).is_some() {
                        return Err(MazeError::InvalidLayout(format!(
                            "duplicate {ch:?} at ({row}, {col})"
                        )));
                    }
                }
                cells.push(cell);
            }
        }

        let start = start.ok_or_else(|| MazeError::InvalidLayout("missing start 'P'".into()))?;
        let exit = exit.ok_or_else(|| MazeError::InvalidLayout("missing exit 'E'".into()))?;
        Ok(Self {
            width,
            height,
            cells,
            start,
            exit,
            carved_nodes: 0,
        })
    }

    /// Walkable 4-neighbours of `pos`
    pub fn neighbors(&self, pos: CellPos) -> impl Iterator<Item = CellPos> + '_ {
        DIRECTIONS.iter().filter_map(move |&(dr, dc)| {
            let row = pos.row.checked_add_signed(dr)?;
            let col = pos.col.checked_add_signed(dc)?;
            let next = CellPos::new(row, col);
            self.is_walkable(next).then_some(next)
        })
    }

    /// Breadth-first reachability from `from` (row-major flags)
    pub fn reachable_from(&self, from: CellPos) -> Vec<bool> {
        let mut seen = vec![false; self.cells.len()];
        if !self.is_walkable(from) {
            return seen;
        }
        let mut queue = VecDeque::from([from]);
        seen[from.row * self.width + from.col] = true;
        while let Some(pos) = queue.pop_front() {
            for next in self.neighbors(pos) {
                let idx = next.row * self.width + next.col;
                if !seen[idx] {
                    seen[idx] = true;
                    queue.push_back(next);
                }
            }
        }
        seen
    }

    /// Shortest walkable path from `from` to `to`, both endpoints included
    pub fn shortest_path(&self, from: CellPos, to: CellPos) -> Option<Vec<CellPos>> {
        if !self.is_walkable(from) || !self.is_walkable(to) {
            return None;
        }
        let mut parent: Vec<Option<CellPos>> = vec![None; self.cells.len()];
        let mut seen = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([from]);
        seen[from.row * self.width + from.col] = true;

        while let Some(pos) = queue.pop_front() {
            if pos == to {
                let mut path = vec![to];
                let mut cursor = to;
                while let Some(prev) = parent[cursor.row * self.width + cursor.col] {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            for next in self.neighbors(pos) {
                let idx = next.row * self.width + next.col;
                if !seen[idx] {
                    seen[idx] = true;
                    parent[idx] = Some(pos);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    fn set(&mut self, pos: CellPos, cell: Cell) {
        self.cells[pos.row * self.width + pos.col] = cell;
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Generate a maze with the start at (1, 1) and the exit at (height-2, width-2)
pub fn generate<R: Rng + ?Sized>(width: usize, height: usize, rng: &mut R) -> Result<Maze, MazeError> {
    generate_with_endpoints(
        width,
        height,
        CellPos::new(1, 1),
        CellPos::new(height.saturating_sub(2), width.saturating_sub(2)),
        rng,
    )
}

/// Generate a maze with explicit start/exit cells.
///
/// Both endpoints must lie on the odd lattice inside the border.
pub fn generate_with_endpoints<R: Rng + ?Sized>(
    width: usize,
    height: usize,
    start: CellPos,
    exit: CellPos,
    rng: &mut R,
) -> Result<Maze, MazeError> {
    if width < MIN_MAZE_SIDE || height < MIN_MAZE_SIDE || width % 2 == 0 || height % 2 == 0 {
        return Err(MazeError::InvalidDimensions { width, height });
    }
    for pos in [start, exit] {
        let on_lattice = pos.row % 2 == 1 && pos.col % 2 == 1;
        if !on_lattice || pos.row >= height - 1 || pos.col >= width - 1 {
            return Err(MazeError::InvalidEndpoint {
                row: pos.row,
                col: pos.col,
            });
        }
    }
    if start == exit {
        return Err(MazeError::InvalidEndpoint {
            row: exit.row,
            col: exit.col,
        });
    }

    let mut maze = Maze {
        width,
        height,
        cells: vec![Cell::Wall; width * height],
        start,
        exit,
        carved_nodes: 0,
    };
    maze.carved_nodes = carve(&mut maze, start, rng);
    maze.set(start, Cell::Start);
    maze.set(exit, Cell::Exit);

    log::debug!(
        "Generated {}x{} maze: {} lattice nodes, {} open cells",
        width,
        height,
        maze.carved_nodes,
        maze.open_count()
    );
    Ok(maze)
}

/// Iterative recursive-backtracker. Returns the number of lattice nodes visited.
///
/// Each stack frame keeps its own shuffled direction list so the visiting order
/// matches the recursive formulation exactly.
fn carve<R: Rng + ?Sized>(maze: &mut Maze, origin: CellPos, rng: &mut R) -> usize {
    let mut stack: Vec<(CellPos, [(isize, isize); 4], usize)> = Vec::new();
    let mut visited = 1;

    maze.set(origin, Cell::Open);
    let mut dirs = DIRECTIONS;
    dirs.shuffle(rng);
    stack.push((origin, dirs, 0));

    while let Some((pos, dirs, next_dir)) = stack.last_mut() {
        let Some(&(dr, dc)) = dirs.get(*next_dir) else {
            stack.pop();
            continue;
        };
        *next_dir += 1;
        let pos = *pos;

        let target = pos
            .row
            .checked_add_signed(dr * 2)
            .zip(pos.col.checked_add_signed(dc * 2))
            .map(|(row, col)| CellPos::new(row, col));
        let Some(target) = target else { continue };
        // The outer ring stays solid
        if target.row == 0 || target.col == 0 || target.row >= maze.height - 1 || target.col >= maze.width - 1 {
            continue;
        }
        if maze.get(target) != Some(Cell::Wall) {
            continue;
        }

        let between = CellPos::new(
            pos.row.wrapping_add_signed(dr),
            pos.col.wrapping_add_signed(dc),
        );
        maze.set(between, Cell::Open);
        maze.set(target, Cell::Open);
        visited += 1;

        let mut dirs = DIRECTIONS;
        dirs.shuffle(rng);
        stack.push((target, dirs, 0));
    }

    visited
}
