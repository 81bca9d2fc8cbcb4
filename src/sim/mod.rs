//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering, audio output or platform dependencies

pub mod light;
pub mod maze;
pub mod movement;
pub mod state;
pub mod tick;

pub use light::{Exhaustion, LightConfig, LightField, LightRing, VisibilityMask, light_rings};
pub use maze::{Cell, CellPos, Maze, MazeError, generate, generate_with_endpoints};
pub use movement::{MoveOutcome, Rect, box_is_free, movement_delta, try_move, wall_rects};
pub use state::{GameEvent, GamePhase, GameState, LevelState, PlayerState, RngState};
pub use tick::{TickInput, tick};
