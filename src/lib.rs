//! Twinstick Core - deterministic simulation for a twin-stick arcade shooter
//!
//! Core modules:
//! - `math`: Q32.32 fixed-point scalars and vectors
//! - `ecs`: Entity index with typed component columns and observers
//! - `geom`: Declarative shape trees, hit tests, outlines
//! - `collision`: Spatial indices over entity shapes
//! - `sim`: Fixed timestep tick, damage, effects, replays
//! - `render`: Render-only output built from shapes
//! - `content`: Player ship, shots, enemies and pickups

pub mod collision;
pub mod config;
pub mod content;
pub mod ecs;
pub mod error;
pub mod geom;
pub mod math;
pub mod render;
pub mod sim;

pub use config::SimConfig;
pub use error::{ConfigError, ReplayError};
pub use sim::{Replay, Simulation};

use math::{FVec2, Fixed};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Default world dimensions
    pub const WORLD_WIDTH: i32 = 640;
    pub const WORLD_HEIGHT: i32 = 480;

    pub const MAX_PLAYERS: u32 = 4;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: Fixed) -> Fixed {
    angle.normalize_angle()
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: Fixed, theta: Fixed) -> FVec2 {
    FVec2::from_polar(theta, r)
}

/// Convert cartesian (x, y) to polar (r, theta)
#[inline]
pub fn cartesian_to_polar(pos: FVec2) -> (Fixed, Fixed) {
    (pos.length(), pos.angle())
}
