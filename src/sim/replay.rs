//! Recorded games
//!
//! A replay is the seed, the configuration, and every tick's inputs. Playing
//! it back through the same content setup must land on the same checksums.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::input::InputFrame;
use super::tick::Simulation;
use crate::config::SimConfig;
use crate::error::ReplayError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    pub seed: u64,
    pub config: SimConfig,
    /// One entry per tick, one frame per player
    pub frames: Vec<Vec<InputFrame>>,
    /// Checksum after each tick; may be empty
    #[serde(default)]
    pub checksums: Vec<u64>,
}

impl Replay {
    pub fn new(seed: u64, config: SimConfig) -> Self {
        Self {
            seed,
            config,
            frames: Vec::new(),
            checksums: Vec::new(),
        }
    }

    /// Append one tick: the inputs it ran with and the checksum it ended on
    pub fn record(&mut self, inputs: &[InputFrame], checksum: u64) {
        self.frames.push(inputs.to_vec());
        self.checksums.push(checksum);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Build a fresh simulation, let `setup` populate it, and run every frame
    pub fn play(&self, setup: impl FnOnce(&mut Simulation)) -> Simulation {
        let mut sim = Simulation::new(self.config.clone(), self.seed);
        setup(&mut sim);
        for inputs in &self.frames {
            sim.update(inputs);
        }
        sim
    }

    /// Play back and compare every recorded checksum. Returns the final one.
    pub fn verify(&self, setup: impl FnOnce(&mut Simulation)) -> Result<u64, ReplayError> {
        self.config.validate()?;
        let mut sim = Simulation::new(self.config.clone(), self.seed);
        setup(&mut sim);
        for (tick, inputs) in self.frames.iter().enumerate() {
            sim.update(inputs);
            let actual = sim.checksum();
            if let Some(&expected) = self.checksums.get(tick) {
                if expected != actual {
                    log::warn!("replay diverged at tick {tick}: {expected:#x} != {actual:#x}");
                    return Err(ReplayError::Diverged {
                        tick: tick as u64,
                        expected,
                        actual,
                    });
                }
            }
        }
        log::info!("replay verified over {} ticks", self.frames.len());
        Ok(sim.checksum())
    }

    pub fn to_json(&self) -> Result<String, ReplayError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("saved replay of {} ticks to {}", self.len(), path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
