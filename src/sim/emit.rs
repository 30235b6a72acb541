//! Cosmetic output produced by a tick
//!
//! Effects never feed back into the simulation. A keyed effect is emitted at
//! most once per [`ResolveKey`], so a tick that gets simulated again (rollback
//! or replay catch-up) does not repeat its sounds and explosions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ecs::EntityId;
use crate::geom::{Colour, LineSegment};
use crate::math::FVec2;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sound {
    /// Player shot fired
    PlayerFire,
    /// Player ship destroyed
    PlayerDestroy,
    /// Player came back
    PlayerRespawn,
    /// Enemy hit but not destroyed
    EnemyHit,
    /// Enemy destroyed
    EnemyDestroy,
    /// Shot bounced off a shield
    ShieldDeflect,
    /// Pickup collected
    PickupCollect,
    /// Bomb detonated
    Bomb,
    /// Delayed firework went off
    Firework,
    /// New wave arriving
    WaveStart,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundRequest {
    pub sound: Sound,
    pub position: FVec2,
    pub volume: f32,
    /// -1 (left) to 1 (right), set from the world width when played
    pub pan: f32,
    pub pitch: f32,
}

impl SoundRequest {
    pub fn new(sound: Sound, position: FVec2) -> Self {
        Self {
            sound,
            position,
            volume: 1.0,
            pan: 0.0,
            pitch: 1.0,
        }
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }
}

/// Stereo pan from the horizontal position in a world `world_width` wide
pub fn pan_for(position: FVec2, world_width: i32) -> f32 {
    let t = position.x.to_f32() / world_width.max(1) as f32;
    (t * 2.0 - 1.0).clamp(-1.0, 1.0)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Sound(SoundRequest),
    Explosion {
        position: FVec2,
        colour: Colour,
        particles: u32,
        /// Cosmetic seed for the particle spread
        seed: u32,
    },
    /// Outline of a destroyed shape, to be blown apart by the front end
    Shatter { lines: Vec<LineSegment> },
    Rumble { player: u32, ticks: u32 },
}

/// Identity of one effect emission: tick, emitting entity, and a slot
/// distinguishing several effects of the same entity in the same tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolveKey {
    pub tick: u64,
    pub entity: EntityId,
    pub slot: u32,
}

#[derive(Debug, Default)]
pub struct EmitOutput {
    effects: Vec<Effect>,
    seen: BTreeSet<ResolveKey>,
}

impl EmitOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Push unless `key` was already emitted; returns whether it was pushed
    pub fn push_keyed(&mut self, key: ResolveKey, effect: Effect) -> bool {
        if !self.seen.insert(key) {
            log::trace!("suppressed repeat effect {key:?}");
            return false;
        }
        self.effects.push(effect);
        true
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Drain pending effects; emitted keys are remembered
    pub fn take(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Drop remembered keys older than `tick`
    pub fn forget_before(&mut self, tick: u64) {
        self.seen = self.seen.split_off(&ResolveKey {
            tick,
            entity: EntityId::from_raw(0),
            slot: 0,
        });
    }

    pub fn remembered(&self) -> usize {
        self.seen.len()
    }
}
