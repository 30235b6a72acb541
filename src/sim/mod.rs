//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Fixed-point arithmetic only
//! - Seeded RNG only, one engine per source
//! - Stable iteration order (storage order, ties by entity ID)
//! - No rendering or platform dependencies; effects are output only

pub mod components;
pub mod emit;
pub mod health;
pub mod input;
pub mod interface;
pub mod random;
pub mod replay;
pub mod shape;
pub mod tick;

pub use components::{
    Destroy, DropKind, Enemy, Firework, GlobalData, PendingDrop, Player, Transform, Update,
};
pub use emit::{Effect, EmitOutput, ResolveKey, Sound, SoundRequest};
pub use health::{DamageType, Health, damage};
pub use input::{InputFrame, InputKeys};
pub use interface::SimInterface;
pub use random::{RandomEngine, RandomSource};
pub use replay::Replay;
pub use shape::{Shape, ShapeEntity, add_shape};
pub use tick::Simulation;
