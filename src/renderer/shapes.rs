//! Shape generation for 2D primitives

use glam::Vec2;

use super::RenderFrame;
use super::vertex::{Vertex, colors};
use crate::sim::Rect;

/// Two triangles covering `rect`
pub fn quad(rect: &Rect, color: [f32; 4]) -> [Vertex; 6] {
    let (min, max) = (rect.min, rect.max);
    [
        Vertex::new(min.x, min.y, color),
        Vertex::new(max.x, min.y, color),
        Vertex::new(max.x, max.y, color),
        Vertex::new(min.x, min.y, color),
        Vertex::new(max.x, max.y, color),
        Vertex::new(min.x, max.y, color),
    ]
}

/// Darkness overlay as a grid of `tile`-sized quads.
///
/// Each tile takes the overlay alpha at its centre, so the light shows
/// through as a stepped disc. Fully lit tiles are skipped.
pub fn darkness_tiles(frame: &RenderFrame, tile: f32) -> Vec<Vertex> {
    if tile <= 0.0 {
        return Vec::new();
    }
    let cols = (frame.width / tile).ceil() as usize;
    let rows = (frame.height / tile).ceil() as usize;
    let mut vertices = Vec::with_capacity(cols * rows * 6);
    for row in 0..rows {
        for col in 0..cols {
            let min = Vec2::new(col as f32 * tile, row as f32 * tile);
            let rect = Rect::new(min, min + Vec2::splat(tile));
            let alpha = frame.darkness_at(min + Vec2::splat(tile / 2.0));
            if alpha == 0 {
                continue;
            }
            vertices.extend_from_slice(&quad(&rect, colors::rgba([0, 0, 0], alpha)));
        }
    }
    vertices
}

/// Full vertex list for a frame, back to front
pub fn frame_vertices(frame: &RenderFrame, tile: f32) -> Vec<Vertex> {
    let background = Rect::new(Vec2::ZERO, Vec2::new(frame.width, frame.height));
    let mut vertices = Vec::with_capacity((frame.walls.len() + 3) * 6);
    vertices.extend_from_slice(&quad(&background, colors::BACKGROUND));
    for wall in &frame.walls {
        vertices.extend_from_slice(&quad(wall, colors::WALL));
    }
    vertices.extend_from_slice(&quad(&frame.exit, colors::EXIT));
    vertices.extend_from_slice(&quad(&frame.player, colors::PLAYER));
    vertices.extend(darkness_tiles(frame, tile));
    vertices
}
