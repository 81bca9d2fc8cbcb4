//! Fixed timestep simulation tick
//!
//! One call advances the session by one frame: input, movement, light,
//! audio cues, completion and level transitions, in that order.

use glam::Vec2;

use super::maze::CellPos;
use super::movement::{MoveOutcome, movement_delta, try_move};
use super::state::{GameEvent, GamePhase, GameState};
use crate::audio::{CueKind, CueRequest, proximity_volume};
use crate::{cell_center, world_to_cell};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement intent; only its direction matters
    pub direction: Vec2,
    /// Quit request (window close / escape)
    pub quit: bool,
    /// Demo mode - follow the shortest path to the exit
    pub autopilot: bool,
}

impl TickInput {
    pub fn moving(direction: Vec2) -> Self {
        Self {
            direction,
            ..Default::default()
        }
    }

    pub fn autopilot() -> Self {
        Self {
            autopilot: true,
            ..Default::default()
        }
    }

    pub fn quit() -> Self {
        Self {
            quit: true,
            ..Default::default()
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    if state.phase.is_terminal() {
        return;
    }
    if input.quit {
        log::info!("Quit requested at tick {}", state.time_ticks);
        state.phase = GamePhase::Quit;
        return;
    }

    state.time_ticks += 1;
    state.cues.tick();

    let intent = if input.autopilot {
        autopilot_intent(state)
    } else {
        input.direction
    };

    // Movement
    let cell_size = state.settings.cell_size as f32;
    let delta = movement_delta(intent, state.settings.movement_speed);
    let level = &mut state.level;
    match try_move(
        level.player.pos,
        delta,
        &level.maze,
        cell_size,
        state.settings.collision_policy,
    ) {
        MoveOutcome::Moved(pos) => {
            level.player.pos = pos;
            level.player.moves += 1;
            level.light.on_move();
            state.events.push(GameEvent::Moved { pos });
        }
        MoveOutcome::Blocked => {
            let pos = level.player.pos;
            state.events.push(GameEvent::Collision { pos });
            if state.cues.try_fire(CueKind::Collision) {
                log::debug!("Collision at ({:.1}, {:.1})", pos.x, pos.y);
                state
                    .events
                    .push(GameEvent::Cue(CueRequest::new(CueKind::Collision, 1.0)));
            }
        }
        MoveOutcome::Idle => {}
    }

    // Light
    let level = &mut state.level;
    level.mask = level.light.tick(dt, level.player.pos);
    if let Some(cause) = level.light.take_exhaustion() {
        log::info!("Light exhausted on level {} ({:?})", level.index, cause);
        state.events.push(GameEvent::LightExhausted {
            level: level.index,
            cause,
        });
        state.phase = GamePhase::GameOver;
        return;
    }

    // Completion
    let distance = state.distance_to_exit();
    if distance < state.settings.completion_distance {
        complete_level(state, dt);
        return;
    }

    // Proximity cue, panned toward the exit
    let threshold = state.settings.proximity_threshold;
    let volume = proximity_volume(distance, threshold);
    if volume > 0.0 && state.cues.try_fire(CueKind::Proximity) {
        let offset = state.level.exit_pos.x - state.level.player.pos.x;
        let pan = (offset / threshold).clamp(-1.0, 1.0);
        state.events.push(GameEvent::Cue(
            CueRequest::new(CueKind::Proximity, volume).with_pan(pan),
        ));
    }
}

fn complete_level(state: &mut GameState, dt: f32) {
    let level = state.level.index;
    let elapsed_secs = state.level_elapsed_secs(dt);
    let score = state.settings.score_for(elapsed_secs);
    state.score += score;
    log::info!(
        "Level {} complete in {:.2}s: +{} (total {})",
        level,
        elapsed_secs,
        score,
        state.score
    );

    if state.cues.try_fire(CueKind::Completion) {
        state
            .events
            .push(GameEvent::Cue(CueRequest::new(CueKind::Completion, 1.0)));
    }
    state.events.push(GameEvent::LevelCompleted {
        level,
        elapsed_secs,
        score,
        total_score: state.score,
    });

    if level >= state.settings.max_levels {
        log::info!("All {} levels cleared, final score {}", level, state.score);
        state.phase = GamePhase::Won;
        state.events.push(GameEvent::SessionWon {
            total_score: state.score,
        });
        return;
    }

    if let Err(e) = state.start_level(level + 1) {
        log::error!("Failed to build level {}: {e}", level + 1);
        state.phase = GamePhase::GameOver;
    }
}

/// Steer toward the exit along the maze's shortest path.
///
/// The player first centres itself on the axis perpendicular to the next step,
/// then moves straight along the corridor, so the collision box never clips a
/// corner.
fn autopilot_intent(state: &GameState) -> Vec2 {
    let level = &state.level;
    let cell_size = state.settings.cell_size as f32;
    let pos = level.player.pos;
    let Some((row, col)) = world_to_cell(pos, cell_size) else {
        return Vec2::ZERO;
    };
    let here = CellPos::new(row, col);
    let Some(path) = level.maze.shortest_path(here, level.maze.exit()) else {
        return Vec2::ZERO;
    };
    let Some(next) = path.get(1) else {
        return level.exit_pos - pos;
    };

    let center = cell_center(row, col, cell_size);
    let step = Vec2::new(
        next.col as f32 - col as f32,
        next.row as f32 - row as f32,
    );
    let tolerance = state.settings.movement_speed.min(cell_size / 4.0);
    let off_axis = if step.x != 0.0 {
        Vec2::new(0.0, center.y - pos.y)
    } else {
        Vec2::new(center.x - pos.x, 0.0)
    };

    if off_axis.length() > tolerance {
        off_axis
    } else {
        step
    }
}
