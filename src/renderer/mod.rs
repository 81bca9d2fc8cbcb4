//! Render boundary
//!
//! The simulation never draws. Each frame it is summarised into a
//! `RenderFrame`, which a `DrawSurface` turns into pixels. Compositing the
//! light mask against the darkness overlay is the surface's job; the helpers
//! here describe what it should produce.

pub mod shapes;
pub mod vertex;

use glam::Vec2;

use crate::consts::{DARKNESS_ALPHA, SIM_DT};
use crate::sim::{GamePhase, GameState, Rect, VisibilityMask, wall_rects};
pub use vertex::Vertex;

/// Numbers shown in the heads-up display
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    pub level: u32,
    pub score: u64,
    /// Seconds spent in the current level
    pub elapsed_secs: f32,
    pub light_radius: f32,
    /// Seconds of light left on timer-driven levels
    pub remaining_secs: Option<f32>,
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub width: f32,
    pub height: f32,
    pub walls: Vec<Rect>,
    pub exit: Rect,
    pub player: Rect,
    pub mask: VisibilityMask,
    pub darkness_alpha: u8,
    pub phase: GamePhase,
    pub hud: Hud,
}

impl RenderFrame {
    pub fn from_state(state: &GameState) -> Self {
        let settings = &state.settings;
        let cell = settings.cell_size as f32;
        let level = &state.level;
        Self {
            width: settings.screen_width as f32,
            height: settings.screen_height as f32,
            walls: wall_rects(&level.maze, cell),
            exit: Rect::cell(level.maze.exit(), cell),
            player: Rect::centered(level.player.pos, cell / 2.0),
            mask: level.mask.clone(),
            darkness_alpha: DARKNESS_ALPHA,
            phase: state.phase,
            hud: Hud {
                level: level.index,
                score: state.score,
                elapsed_secs: state.level_elapsed_secs(SIM_DT),
                light_radius: level.light.radius(),
                remaining_secs: level.light.remaining_secs(),
            },
        }
    }

    /// Overlay alpha at `point` after subtracting the light mask
    pub fn darkness_at(&self, point: Vec2) -> u8 {
        self.darkness_alpha.saturating_sub(self.mask.alpha_at(point))
    }
}

/// Something that can display frames (window, terminal, test recorder)
pub trait DrawSurface {
    fn present(&mut self, frame: &RenderFrame);
}

/// Surface that discards frames, counting them
#[derive(Debug, Default)]
pub struct NullSurface {
    pub frames: u64,
}

impl DrawSurface for NullSurface {
    fn present(&mut self, _frame: &RenderFrame) {
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::{TickInput, tick};

    #[test]
    fn test_frame_from_new_session() {
        let state = GameState::new(Settings::default(), 42).unwrap();
        let frame = RenderFrame::from_state(&state);
        assert_eq!(frame.width, 800.0);
        assert_eq!(frame.walls.len(), 19 * 15 - state.level.maze.open_count());
        assert_eq!(frame.player, Rect::centered(Vec2::new(60.0, 60.0), 20.0));
        assert_eq!(frame.exit, Rect::cell(state.level.maze.exit(), 40.0));
        assert_eq!(frame.hud.level, 1);
        assert_eq!(frame.hud.light_radius, 150.0);
        assert_eq!(frame.hud.remaining_secs, Some(18.0));
    }

    #[test]
    fn test_darkness_is_lifted_near_player() {
        let mut state = GameState::new(Settings::default(), 42).unwrap();
        tick(&mut state, &TickInput::default(), SIM_DT);
        let frame = RenderFrame::from_state(&state);
        let player = state.level.player.pos;
        assert!(frame.darkness_at(player) < DARKNESS_ALPHA);
        assert_eq!(frame.darkness_at(player + Vec2::new(500.0, 0.0)), DARKNESS_ALPHA);
    }

    #[test]
    fn test_frame_vertices_cover_screen() {
        let state = GameState::new(Settings::default(), 1).unwrap();
        let frame = RenderFrame::from_state(&state);
        let verts = shapes::frame_vertices(&frame, 10.0);
        // Background + walls + exit + player, then darkness tiles
        assert!(verts.len() > (frame.walls.len() + 3) * 6);
        assert_eq!(verts.len() % 6, 0);
    }

    #[test]
    fn test_null_surface_counts() {
        let state = GameState::new(Settings::default(), 1).unwrap();
        let mut surface = NullSurface::default();
        surface.present(&RenderFrame::from_state(&state));
        assert_eq!(surface.frames, 1);
    }
}
