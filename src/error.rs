//! Top-level error type for session setup

use thiserror::Error;

use crate::settings::SettingsError;
use crate::sim::maze::MazeError;

/// Failures that stop a session from starting
#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Maze(#[from] MazeError),
}
