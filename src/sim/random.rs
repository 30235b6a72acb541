//! Deterministic random engines
//!
//! One engine per source so that cosmetic randomness can never shift the
//! game sequence. Only `next_u32` is drawn from the underlying generator;
//! everything else is derived here in fixed point.

use rand::RngCore;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::math::Fixed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RandomSource {
    /// Anything that affects gameplay
    GameSequence,
    /// Cosmetic only
    Aesthetic,
    /// Cosmetic draws in the order older builds made them
    LegacyAesthetic,
}

impl RandomSource {
    pub const ALL: [RandomSource; 3] = [
        RandomSource::GameSequence,
        RandomSource::Aesthetic,
        RandomSource::LegacyAesthetic,
    ];

    fn stream(self) -> u64 {
        match self {
            RandomSource::GameSequence => 0x0a02_bdbf_7bb3_c0a7,
            RandomSource::Aesthetic => 0x5851_f42d_4c95_7f2d,
            RandomSource::LegacyAesthetic => 0x1405_7b7e_f767_814f,
        }
    }
}

pub struct RandomEngine {
    rng: Pcg32,
    draws: u64,
}

impl RandomEngine {
    pub fn new(seed: u64, source: RandomSource) -> Self {
        Self {
            rng: Pcg32::new(seed, source.stream()),
            draws: 0,
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.draws += 1;
        self.rng.next_u32()
    }

    /// Uniform-ish in `0..n`; zero when `n == 0`
    pub fn uniform(&mut self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        self.next_u32() % n
    }

    pub fn rbool(&mut self) -> bool {
        self.next_u32() & 1 == 1
    }

    /// In [0, 1)
    pub fn fixed(&mut self) -> Fixed {
        Fixed::from_raw(self.next_u32() as i64)
    }

    /// In [lo, hi)
    pub fn fixed_range(&mut self, lo: Fixed, hi: Fixed) -> Fixed {
        lo + (hi - lo) * self.fixed()
    }

    /// In [0, 2π)
    pub fn angle(&mut self) -> Fixed {
        Fixed::TAU * self.fixed()
    }

    /// Number of values drawn so far
    pub fn draws(&self) -> u64 {
        self.draws
    }
}

pub struct RandomEngines {
    engines: [RandomEngine; 3],
}

impl RandomEngines {
    pub fn new(seed: u64) -> Self {
        Self {
            engines: RandomSource::ALL.map(|source| RandomEngine::new(seed, source)),
        }
    }

    pub fn get(&mut self, source: RandomSource) -> &mut RandomEngine {
        &mut self.engines[source as usize]
    }

    pub fn draws(&self, source: RandomSource) -> u64 {
        self.engines[source as usize].draws
    }
}
