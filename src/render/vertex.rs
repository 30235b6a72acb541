//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};
use glam::Vec4;

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

    pub fn at(p: glam::Vec2, colour: Vec4) -> Self {
        Self::new(p.x, p.y, colour.to_array())
    }

    /// Raw bytes for upload or dumping
    pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
        bytemuck::cast_slice(vertices)
    }
}

/// Colors for game elements
pub mod colours {
    use glam::Vec4;

    pub const WHITE: Vec4 = Vec4::new(1.0, 1.0, 1.0, 1.0);
    pub const PLAYERS: [Vec4; 4] = [
        Vec4::new(0.2, 0.8, 0.4, 1.0),
        Vec4::new(0.4, 0.7, 1.0, 1.0),
        Vec4::new(1.0, 0.4, 0.6, 1.0),
        Vec4::new(0.9, 0.85, 0.3, 1.0),
    ];
    pub const SHOT: Vec4 = Vec4::new(0.9, 0.9, 1.0, 1.0);
    pub const DRIFTER: Vec4 = Vec4::new(1.0, 0.4, 0.2, 1.0);
    pub const DRIFTER_CORE: Vec4 = Vec4::new(1.0, 0.9, 0.3, 1.0);
    pub const SHIELD: Vec4 = Vec4::new(0.7, 0.7, 0.8, 1.0);
    pub const PICKUP: Vec4 = Vec4::new(0.6, 0.2, 0.8, 1.0);
    pub const FIREWORK: Vec4 = Vec4::new(1.0, 0.8, 0.5, 1.0);
    pub const BACKGROUND: Vec4 = Vec4::new(0.02, 0.02, 0.05, 1.0);

    /// Player colour, cycling past the palette
    pub fn player(number: u32) -> Vec4 {
        PLAYERS[number as usize % PLAYERS.len()]
    }
}
