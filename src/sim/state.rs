//! Session state and core simulation types
//!
//! All state the tick function mutates lives here, owned by one `GameState`.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::light::{Exhaustion, LightConfig, LightField, VisibilityMask};
use super::maze::{self, Maze};
use crate::audio::{CueCooldowns, CueRequest};
use crate::cell_center;
use crate::error::GameError;
use crate::settings::{LevelParams, Settings};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Light ran out; the session is over
    GameOver,
    /// Every level cleared
    Won,
    /// Player asked to quit
    Quit,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        self != GamePhase::Playing
    }
}

/// Things that happened during a tick, drained by the driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStarted { level: u32 },
    /// Accepted move to a new position
    Moved { pos: Vec2 },
    /// Move rejected by a wall
    Collision { pos: Vec2 },
    /// Audio cue passed its cooldown
    Cue(CueRequest),
    LightExhausted { level: u32, cause: Exhaustion },
    LevelCompleted {
        level: u32,
        elapsed_secs: f32,
        score: u64,
        total_score: u64,
    },
    SessionWon { total_score: u64 },
}

/// The player's body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    /// Pixel position (sub-cell precision)
    pub pos: Vec2,
    /// Accepted moves this level
    pub moves: u32,
}

impl PlayerState {
    pub fn new(pos: Vec2) -> Self {
        Self { pos, moves: 0 }
    }
}

/// Everything that is rebuilt when a level starts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelState {
    /// 1-based level index
    pub index: u32,
    pub maze: Maze,
    pub player: PlayerState,
    pub light: LightField,
    /// Mask produced by the latest light tick
    pub mask: VisibilityMask,
    /// Centre of the exit cell (pixels)
    pub exit_pos: Vec2,
    /// Tick at which this level started
    pub start_tick: u64,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, stream: 0 }
    }

    /// Fresh generator for the next consumer; every call advances the stream
    pub fn next_rng(&mut self) -> Pcg32 {
        let stream = self.stream;
        self.stream += 1;
        Pcg32::new(self.seed, stream.wrapping_mul(2).wrapping_add(1))
    }
}

/// Complete session state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng_state: RngState,
    pub settings: Settings,
    pub phase: GamePhase,
    pub level: LevelState,
    /// Cumulative score across levels
    pub score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub cues: CueCooldowns,
    /// Events produced since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Start a session at level 1. Settings are validated here, not in the tick loop.
    pub fn new(settings: Settings, seed: u64) -> Result<Self, GameError> {
        Self::with_level(settings, seed, 1)
    }

    /// Start a session at an arbitrary level
    pub fn with_level(settings: Settings, seed: u64, level: u32) -> Result<Self, GameError> {
        settings.validate()?;
        let mut rng_state = RngState::new(seed);
        let level = build_level(&settings, &mut rng_state, level.max(1), 0)?;
        let cues = CueCooldowns::from_settings(&settings);
        let mut state = Self {
            seed,
            rng_state,
            settings,
            phase: GamePhase::Playing,
            level,
            score: 0,
            time_ticks: 0,
            cues,
            events: Vec::new(),
        };
        log::info!(
            "Session {} starting at level {} ({}x{})",
            seed,
            state.level.index,
            state.level.maze.width(),
            state.level.maze.height()
        );
        state.events.push(GameEvent::LevelStarted {
            level: state.level.index,
        });
        Ok(state)
    }

    /// Replace the current level with a freshly generated one
    pub fn start_level(&mut self, index: u32) -> Result<(), GameError> {
        self.level = build_level(&self.settings, &mut self.rng_state, index, self.time_ticks)?;
        self.cues.reset();
        log::info!(
            "Level {} ({}x{} maze, light radius {})",
            index,
            self.level.maze.width(),
            self.level.maze.height(),
            self.level.light.radius()
        );
        self.events.push(GameEvent::LevelStarted { level: index });
        Ok(())
    }

    /// Seconds spent in the current level
    pub fn level_elapsed_secs(&self, dt: f32) -> f32 {
        self.time_ticks.saturating_sub(self.level.start_tick) as f32 * dt
    }

    pub fn distance_to_exit(&self) -> f32 {
        self.level.player.pos.distance(self.level.exit_pos)
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Light configuration for a level
pub fn light_config(settings: &Settings, params: &LevelParams) -> LightConfig {
    LightConfig {
        base_radius: params.light_radius,
        decay: settings.decay_policy,
        flicker_amplitude: settings.flicker_amplitude,
        flicker_speed: settings.flicker_speed,
        ring_step: settings.ring_step,
        duration: params.light_duration,
    }
}

fn build_level(
    settings: &Settings,
    rng_state: &mut RngState,
    index: u32,
    start_tick: u64,
) -> Result<LevelState, GameError> {
    let params = settings.level_params(index);
    let mut rng = rng_state.next_rng();
    let maze = maze::generate(params.maze_width, params.maze_height, &mut rng)?;

    let cell = settings.cell_size as f32;
    let start = maze.start();
    let exit = maze.exit();
    let player = PlayerState::new(cell_center(start.row, start.col, cell));
    let light = LightField::new(light_config(settings, &params));
    Ok(LevelState {
        index,
        mask: light.mask(player.pos),
        player,
        light,
        exit_pos: cell_center(exit.row, exit.col, cell),
        maze,
        start_tick,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    #[test]
    fn test_new_session_layout() {
        let state = GameState::new(Settings::default(), 42).unwrap();
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.level.index, 1);
        assert_eq!(state.level.player.pos, Vec2::new(60.0, 60.0));
        // 19x15 maze: exit at (13, 17)
        assert_eq!(state.level.exit_pos, Vec2::new(17.0 * 40.0 + 20.0, 13.0 * 40.0 + 20.0));
        assert_eq!(state.level.light.radius(), 150.0);
        assert_eq!(state.events, vec![GameEvent::LevelStarted { level: 1 }]);
    }

    #[test]
    fn test_invalid_settings_fail_at_setup() {
        let settings = Settings {
            cell_size: 33,
            ..Default::default()
        };
        assert!(matches!(GameState::new(settings, 1), Err(GameError::Settings(_))));
    }

    #[test]
    fn test_same_seed_same_mazes() {
        let mut a = GameState::new(Settings::default(), 7).unwrap();
        let mut b = GameState::new(Settings::default(), 7).unwrap();
        assert_eq!(a.level.maze, b.level.maze);
        a.start_level(2).unwrap();
        b.start_level(2).unwrap();
        assert_eq!(a.level.maze, b.level.maze);
    }

    #[test]
    fn test_levels_get_distinct_mazes() {
        let mut state = GameState::new(Settings::default(), 7).unwrap();
        let first = state.level.maze.clone();
        state.start_level(2).unwrap();
        assert_ne!(first.rows(), state.level.maze.rows());
    }

    #[test]
    fn test_rng_streams_advance() {
        let mut rng_state = RngState::new(5);
        let mut a = rng_state.next_rng();
        let mut b = rng_state.next_rng();
        assert_eq!(rng_state.stream, 2);
        assert_ne!(a.next_u64(), b.next_u64());
    }
}
