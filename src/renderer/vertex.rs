//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    /// Stride of one vertex in a GPU buffer
    pub const STRIDE: usize = std::mem::size_of::<Vertex>();
}

/// Raw bytes of a vertex list, ready for upload
pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

/// Colors for game elements
pub mod colors {
    pub const BACKGROUND: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    pub const WALL: [f32; 4] = [0.35, 0.33, 0.3, 1.0];
    pub const EXIT: [f32; 4] = [0.2, 0.85, 0.35, 1.0];
    pub const PLAYER: [f32; 4] = [0.95, 0.85, 0.4, 1.0];

    /// 8-bit RGB + alpha to normalized float color
    pub fn rgba(rgb: [u8; 3], alpha: u8) -> [f32; 4] {
        [
            rgb[0] as f32 / 255.0,
            rgb[1] as f32 / 255.0,
            rgb[2] as f32 / 255.0,
            alpha as f32 / 255.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(Vertex::STRIDE, 24);
        let verts = [Vertex::new(1.0, 2.0, colors::WALL); 3];
        assert_eq!(as_bytes(&verts).len(), 72);
    }

    #[test]
    fn test_rgba() {
        assert_eq!(colors::rgba([255, 0, 0], 255), [1.0, 0.0, 0.0, 1.0]);
    }
}
