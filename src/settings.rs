//! Game settings and tuning
//!
//! Every recognised option lives here with its default. Settings are validated
//! once at setup so misconfiguration never surfaces inside the tick loop.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::odd_floor;

/// Setup-time configuration errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cell size {cell_size} does not evenly divide the {screen_width}x{screen_height} screen")]
    CellSizeMismatch {
        cell_size: u32,
        screen_width: u32,
        screen_height: u32,
    },
    #[error("invalid setting `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// How a proposed move is checked against the maze
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CollisionPolicy {
    /// Target point's cell must be walkable
    GridCell,
    /// Half-cell box around the target must not overlap any wall
    #[default]
    BoundingBox,
}

/// How the light radius shrinks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DecayPolicy {
    /// Fixed decrement per accepted move
    PerMove { step: f32 },
    /// Continuous decay in pixels per second, moving or not
    PerSecond { rate: f32 },
}

impl Default for DecayPolicy {
    fn default() -> Self {
        DecayPolicy::PerSecond { rate: 2.5 }
    }
}

/// One step of the completion-time score table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreTier {
    /// Completion strictly faster than this earns `points`
    pub under_secs: f32,
    pub points: u64,
}

/// Per-level values derived from the settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelParams {
    pub level: u32,
    pub maze_width: usize,
    pub maze_height: usize,
    pub light_radius: f32,
    /// Seconds of light before darkness, if timer-limited
    pub light_duration: Option<f32>,
}

/// Game settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Playfield ===
    pub screen_width: u32,
    pub screen_height: u32,
    pub cell_size: u32,
    /// Maze size at level 0 (grows per level, capped by the screen)
    pub maze_width: usize,
    pub maze_height: usize,
    /// Maze growth per level (columns, rows)
    pub maze_growth: (usize, usize),
    pub max_levels: u32,

    // === Movement ===
    /// Pixels per tick
    pub movement_speed: f32,
    pub collision_policy: CollisionPolicy,

    // === Light ===
    pub base_light_radius: f32,
    /// Radius lost per level of darkness
    pub light_radius_step: f32,
    pub min_light_radius: f32,
    pub decay_policy: DecayPolicy,
    /// Light duration at level 0 in seconds; None disables the timer
    pub light_duration: Option<f32>,
    pub light_duration_step: f32,
    pub min_light_duration: f32,
    pub flicker_amplitude: f32,
    /// Flicker angular speed (radians per second)
    pub flicker_speed: f32,
    /// Spacing between mask rings (pixels)
    pub ring_step: f32,

    // === Audio ===
    pub sample_rate: u32,
    pub proximity_cooldown_ticks: u32,
    pub collision_cooldown_ticks: u32,
    pub completion_cooldown_ticks: u32,
    /// Distance at which the proximity cue falls silent (pixels)
    pub proximity_threshold: f32,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    pub muted: bool,
    /// Optional WAV that replaces the synthesized proximity tone
    pub proximity_asset: Option<PathBuf>,

    // === Scoring ===
    /// Distance to the exit centre that completes a level (pixels)
    pub completion_distance: f32,
    /// Ordered fastest first
    pub score_tiers: Vec<ScoreTier>,
    /// Points when no tier matches
    pub score_floor: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_width: SCREEN_WIDTH,
            screen_height: SCREEN_HEIGHT,
            cell_size: CELL_SIZE,
            maze_width: 20,
            maze_height: 15,
            maze_growth: (2, 1),
            max_levels: 5,

            movement_speed: 3.0,
            collision_policy: CollisionPolicy::BoundingBox,

            base_light_radius: 200.0,
            light_radius_step: 50.0,
            min_light_radius: 50.0,
            decay_policy: DecayPolicy::default(),
            light_duration: Some(20.0),
            light_duration_step: 2.0,
            min_light_duration: 10.0,
            flicker_amplitude: 15.0,
            flicker_speed: 6.0,
            ring_step: 10.0,

            sample_rate: SAMPLE_RATE,
            proximity_cooldown_ticks: 30,
            collision_cooldown_ticks: 20,
            completion_cooldown_ticks: 0,
            proximity_threshold: SCREEN_WIDTH as f32,
            master_volume: 0.8,
            muted: false,
            proximity_asset: None,

            completion_distance: CELL_SIZE as f32 / 2.0,
            score_tiers: vec![
                ScoreTier { under_secs: 5.0, points: 100 },
                ScoreTier { under_secs: 10.0, points: 80 },
                ScoreTier { under_secs: 15.0, points: 60 },
                ScoreTier { under_secs: 20.0, points: 40 },
            ],
            score_floor: 20,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from `path` when given, falling back to defaults on any problem
    pub fn load_or_default(path: Option<&Path>) -> Self {
        if let Some(path) = path {
            match Self::load_from(path) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    return settings;
                }
                Err(e) => log::warn!("Ignoring {}: {e}", path.display()),
            }
        }
        log::info!("Using default settings");
        Self::default()
    }

    /// Check for configurations the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.cell_size == 0
            || self.screen_width % self.cell_size != 0
            || self.screen_height % self.cell_size != 0
        {
            return Err(SettingsError::CellSizeMismatch {
                cell_size: self.cell_size,
                screen_width: self.screen_width,
                screen_height: self.screen_height,
            });
        }

        let (max_w, max_h) = self.max_maze_size();
        if max_w < MIN_MAZE_SIDE || max_h < MIN_MAZE_SIDE {
            return invalid("screen_width", format!("screen holds only {max_w}x{max_h} cells"));
        }
        if self.maze_width < MIN_MAZE_SIDE || self.maze_height < MIN_MAZE_SIDE {
            return invalid(
                "maze_width",
                format!("{}x{} is smaller than {MIN_MAZE_SIDE}x{MIN_MAZE_SIDE}", self.maze_width, self.maze_height),
            );
        }
        if self.max_levels == 0 {
            return invalid("max_levels", "at least one level is required".into());
        }

        let half_cell = self.cell_size as f32 / 2.0;
        if !(self.movement_speed > 0.0) {
            return invalid("movement_speed", "must be positive".into());
        }
        // Anything faster could tunnel through a wall between two ticks
        if self.collision_policy == CollisionPolicy::BoundingBox && self.movement_speed > half_cell {
            return invalid(
                "movement_speed",
                format!("{} exceeds half a cell ({half_cell}) for bounding-box collision", self.movement_speed),
            );
        }

        if !(self.base_light_radius > 0.0) || !(self.min_light_radius > 0.0) {
            return invalid("base_light_radius", "radii must be positive".into());
        }
        match self.decay_policy {
            DecayPolicy::PerMove { step } if !(step >= 0.0) => {
                return invalid("decay_policy", "per-move step must be non-negative".into());
            }
            DecayPolicy::PerSecond { rate } if !(rate >= 0.0) => {
                return invalid("decay_policy", "per-second rate must be non-negative".into());
            }
            _ => {}
        }
        if let Some(duration) = self.light_duration {
            if !(duration > 0.0) || !(self.min_light_duration > 0.0) {
                return invalid("light_duration", "durations must be positive".into());
            }
        }
        if !(self.ring_step > 0.0) {
            return invalid("ring_step", "must be positive".into());
        }
        if self.flicker_amplitude < 0.0 {
            return invalid("flicker_amplitude", "must be non-negative".into());
        }

        if self.sample_rate == 0 {
            return invalid("sample_rate", "must be positive".into());
        }
        if !(self.proximity_threshold > 0.0) {
            return invalid("proximity_threshold", "must be positive".into());
        }
        if !(self.completion_distance > 0.0) {
            return invalid("completion_distance", "must be positive".into());
        }
        if self
            .score_tiers
            .windows(2)
            .any(|w| w[0].under_secs >= w[1].under_secs || w[0].points < w[1].points)
        {
            return invalid("score_tiers", "tiers must be ordered fastest first with non-increasing points".into());
        }
        Ok(())
    }

    /// Largest odd maze that fits on screen
    pub fn max_maze_size(&self) -> (usize, usize) {
        if self.cell_size == 0 {
            return (0, 0);
        }
        (
            odd_floor((self.screen_width / self.cell_size) as usize),
            odd_floor((self.screen_height / self.cell_size) as usize),
        )
    }

    /// Derived values for a 1-based level index
    pub fn level_params(&self, level: u32) -> LevelParams {
        let (max_w, max_h) = self.max_maze_size();
        let grow = level as usize;
        let grown = |base: usize, step: usize| base.saturating_add(step.saturating_mul(grow));
        let maze_width = odd_floor(grown(self.maze_width, self.maze_growth.0).min(max_w));
        let maze_height = odd_floor(grown(self.maze_height, self.maze_growth.1).min(max_h));

        let light_radius = (self.base_light_radius - level as f32 * self.light_radius_step)
            .max(self.min_light_radius);
        let light_duration = self.light_duration.map(|base| {
            (base - level as f32 * self.light_duration_step).max(self.min_light_duration)
        });

        LevelParams {
            level,
            maze_width,
            maze_height,
            light_radius,
            light_duration,
        }
    }

    /// Points for finishing a level in `elapsed_secs`
    pub fn score_for(&self, elapsed_secs: f32) -> u64 {
        self.score_tiers
            .iter()
            .find(|tier| elapsed_secs < tier.under_secs)
            .map(|tier| tier.points)
            .unwrap_or(self.score_floor)
    }

    /// Effective output volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0)
        }
    }
}

fn invalid(name: &'static str, reason: String) -> Result<(), SettingsError> {
    Err(SettingsError::Invalid { name, reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn test_cell_size_must_divide_screen() {
        let settings = Settings {
            cell_size: 35,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::CellSizeMismatch { cell_size: 35, .. })
        ));
    }

    #[test]
    fn test_fast_bounding_box_rejected() {
        let settings = Settings {
            movement_speed: 25.0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { name: "movement_speed", .. })
        ));

        // Grid-cell policy checks the target cell only, so large steps are fine
        let settings = Settings {
            movement_speed: 40.0,
            collision_policy: CollisionPolicy::GridCell,
            ..Default::default()
        };
        settings.validate().unwrap();
    }

    #[test]
    fn test_level_params_progression() {
        let settings = Settings::default();

        let first = settings.level_params(1);
        // 22 columns clamp to the 20-cell screen, rounded down to odd
        assert_eq!((first.maze_width, first.maze_height), (19, 15));
        assert_eq!(first.light_radius, 150.0);
        assert_eq!(first.light_duration, Some(18.0));

        let fourth = settings.level_params(4);
        assert_eq!(fourth.light_radius, 50.0);
        assert_eq!(fourth.light_duration, Some(12.0));

        let fifth = settings.level_params(5);
        assert_eq!(fifth.light_duration, Some(10.0));
    }

    #[test]
    fn test_zero_min_light_radius_rejected() {
        let settings = Settings {
            min_light_radius: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { name: "base_light_radius", .. })
        ));
    }

    #[test]
    fn test_huge_growth_clamps_to_screen() {
        let settings: Settings =
            serde_json::from_str(r#"{"maze_growth": [18446744073709551615, 18446744073709551615]}"#).unwrap();
        settings.validate().unwrap();
        let params = settings.level_params(5);
        assert_eq!((params.maze_width, params.maze_height), (19, 15));
    }

    #[test]
    fn test_score_tiers() {
        let settings = Settings::default();
        assert_eq!(settings.score_for(0.0), 100);
        assert_eq!(settings.score_for(4.99), 100);
        assert_eq!(settings.score_for(5.0), 80);
        assert_eq!(settings.score_for(14.0), 60);
        assert_eq!(settings.score_for(19.9), 40);
        assert_eq!(settings.score_for(20.0), 20);
        assert_eq!(settings.score_for(300.0), 20);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"cell_size": 20, "decay_policy": {"PerMove": {"step": 5.0}}}"#).unwrap();
        assert_eq!(settings.cell_size, 20);
        assert_eq!(settings.decay_policy, DecayPolicy::PerMove { step: 5.0 });
        assert_eq!(settings.max_levels, 5);
        settings.validate().unwrap();
    }

    #[test]
    fn test_unordered_tiers_rejected() {
        let settings = Settings {
            score_tiers: vec![
                ScoreTier { under_secs: 10.0, points: 50 },
                ScoreTier { under_secs: 5.0, points: 100 },
            ],
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_muted_volume() {
        let settings = Settings {
            muted: true,
            ..Default::default()
        };
        assert_eq!(settings.effective_volume(), 0.0);
        assert_eq!(Settings::default().effective_volume(), 0.8);
    }
}
