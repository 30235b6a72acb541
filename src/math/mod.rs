//! Deterministic numeric types
//!
//! - `fixed`: Q32.32 scalar with software multiply/divide and trigonometry
//! - `vec`: 2D vectors generic over fixed-point or float scalars

pub mod fixed;
pub mod vec;

pub use fixed::Fixed;
pub use vec::{FVec2, Scalar, Vec2, angle_diff};
