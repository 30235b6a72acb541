//! Components shared by every entity kind

use std::rc::Rc;

use super::interface::SimInterface;
use crate::ecs::EntityId;
use crate::geom::Colour;
use crate::math::{FVec2, Fixed};

pub use super::health::{DamageType, Health};
pub use super::shape::Shape;
pub use crate::collision::Collision;
pub use crate::render::Render;

/// Position and facing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transform {
    pub centre: FVec2,
    pub rotation: Fixed,
}

impl Transform {
    pub fn new(centre: FVec2, rotation: Fixed) -> Self {
        Self { centre, rotation }
    }

    pub fn at(centre: FVec2) -> Self {
        Self {
            centre,
            rotation: Fixed::ZERO,
        }
    }

    /// Advance by `velocity` and keep the rotation wrapped
    pub fn advance(&mut self, velocity: FVec2) {
        self.centre += velocity;
    }

    pub fn rotate(&mut self, angle: Fixed) {
        self.rotation = (self.rotation + angle).normalize_angle();
    }
}

/// Per-tick behaviour callback
pub type UpdateFn = Rc<dyn Fn(&mut SimInterface, EntityId)>;

#[derive(Clone)]
pub struct Update(pub UpdateFn);

impl Update {
    pub fn new(f: impl Fn(&mut SimInterface, EntityId) + 'static) -> Self {
        Self(Rc::new(f))
    }
}

/// Marks an entity for removal at the end of the tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destroy {
    pub source: Option<EntityId>,
    pub damage_type: DamageType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enemy {
    /// Contribution to the global threat total while alive
    pub threat_value: u32,
    /// Awarded to the destroying player
    pub score: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub number: u32,
    pub score: u64,
    pub kill_count: u32,
}

impl Player {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            score: 0,
            kill_count: 0,
        }
    }
}

/// Delayed explosion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Firework {
    pub countdown: u32,
    pub position: FVec2,
    pub colour: Colour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropKind {
    Bomb,
    Shield,
}

/// Drop rolled by the drop table, waiting for content to spawn it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDrop {
    pub position: FVec2,
    pub kind: DropKind,
}

/// World-wide state, stored on the global entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalData {
    /// Live enemies, recounted at the start of every tick
    pub enemy_count: u32,
    pub threat_total: u32,
    pub score: u64,
    /// Threat destroyed since the last drop
    pub drop_counter: u32,
    pub fireworks: Vec<Firework>,
    pub pending_drops: Vec<PendingDrop>,
}

impl GlobalData {
    pub fn take_pending_drops(&mut self) -> Vec<PendingDrop> {
        std::mem::take(&mut self.pending_drops)
    }
}
