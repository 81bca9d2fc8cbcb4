//! Echoing Depths - a sound-navigated maze survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (maze, movement, light, game state)
//! - `audio`: Procedural cue synthesis and rate limiting
//! - `renderer`: Render boundary (frame description handed to a drawing surface)
//! - `platform`: Input and audio-output collaborator traits
//! - `settings`: Data-driven configuration
//! - `game`: Session driver tying the collaborators to the simulation

pub mod audio;
pub mod error;
pub mod game;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::GameError;
pub use settings::{CollisionPolicy, DecayPolicy, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield dimensions (pixels)
    pub const SCREEN_WIDTH: u32 = 800;
    pub const SCREEN_HEIGHT: u32 = 600;
    /// Side of one maze cell (pixels)
    pub const CELL_SIZE: u32 = 40;

    /// Smallest maze side that still embeds a border around a carvable interior
    pub const MIN_MAZE_SIDE: usize = 5;

    /// Audio output rate
    pub const SAMPLE_RATE: u32 = 44_100;

    /// Warm yellowish light
    pub const LIGHT_COLOR: [u8; 3] = [255, 240, 200];
    /// Alpha of the full-screen darkness overlay before the light is subtracted
    pub const DARKNESS_ALPHA: u8 = 220;
}

/// Pixel centre of the cell at (`row`, `col`)
#[inline]
pub fn cell_center(row: usize, col: usize, cell_size: f32) -> Vec2 {
    Vec2::new(
        col as f32 * cell_size + cell_size / 2.0,
        row as f32 * cell_size + cell_size / 2.0,
    )
}

/// Cell (row, col) containing a pixel position, or None when left/above the grid.
///
/// Callers still have to bound-check against the grid's far edges.
#[inline]
pub fn world_to_cell(pos: Vec2, cell_size: f32) -> Option<(usize, usize)> {
    if !pos.x.is_finite() || !pos.y.is_finite() || pos.x < 0.0 || pos.y < 0.0 {
        return None;
    }
    Some((
        (pos.y / cell_size).floor() as usize,
        (pos.x / cell_size).floor() as usize,
    ))
}

/// Largest odd value not greater than `n` (odd-aligned maze sides)
#[inline]
pub fn odd_floor(n: usize) -> usize {
    if n % 2 == 0 { n.saturating_sub(1) } else { n }
}
