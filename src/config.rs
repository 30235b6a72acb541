//! Simulation configuration
//!
//! Loaded from JSON by the headless runner and stored inside replays so a
//! replay always rebuilds the simulation it was recorded with.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_PLAYERS, WORLD_HEIGHT, WORLD_WIDTH};
use crate::error::ConfigError;

/// Which spatial index backs collision queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CollisionMode {
    /// Sorted linear scan kept for compatibility with old recordings
    Legacy,
    #[default]
    Grid,
}

impl CollisionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionMode::Legacy => "Legacy",
            CollisionMode::Grid => "Grid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "legacy" => Some(CollisionMode::Legacy),
            "grid" => Some(CollisionMode::Grid),
            _ => None,
        }
    }
}

/// Uniform grid layout; cell size along each axis is `1 << shift`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// World coordinate of the grid's top-left corner
    pub min_x: i32,
    pub min_y: i32,
    pub cell_shift_x: u32,
    pub cell_shift_y: u32,
    pub cells_x: u32,
    pub cells_y: u32,
}

impl GridConfig {
    pub const DEFAULT_CELL_SHIFT: u32 = 6;

    pub fn cell_width(&self) -> i32 {
        1 << self.cell_shift_x
    }

    pub fn cell_height(&self) -> i32 {
        1 << self.cell_shift_y
    }

    /// Cells of `1 << shift` units covering a `width` × `height` world with
    /// one spare ring of cells around it
    pub fn covering(width: i32, height: i32, shift: u32) -> Self {
        let size = 1i32 << shift;
        let cells = |extent: i32| ((extent + size - 1) / size + 2) as u32;
        Self {
            min_x: -size,
            min_y: -size,
            cell_shift_x: shift,
            cell_shift_y: shift,
            cells_x: cells(width),
            cells_y: cells(height),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::covering(WORLD_WIDTH, WORLD_HEIGHT, Self::DEFAULT_CELL_SHIFT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub collision: CollisionMode,
    pub grid: GridConfig,
    pub world_width: i32,
    pub world_height: i32,
    pub player_count: u32,
    /// Test every n-gon against its circumradius instead of its edges
    pub legacy_ngon_collision: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            collision: CollisionMode::Grid,
            grid: GridConfig::default(),
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,
            player_count: 1,
            legacy_ngon_collision: false,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!(
            "Loaded config from {} ({} collision, {} players)",
            path.display(),
            config.collision.as_str(),
            config.player_count
        );
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };
        if self.world_width <= 0 || self.world_height <= 0 {
            return invalid("world_width", "world dimensions must be positive");
        }
        if self.player_count == 0 || self.player_count > MAX_PLAYERS {
            return invalid("player_count", "must be between 1 and 4");
        }
        let g = &self.grid;
        if g.cells_x == 0 || g.cells_y == 0 {
            return invalid("grid", "grid needs at least one cell per axis");
        }
        if g.cell_shift_x > 16 || g.cell_shift_y > 16 {
            return invalid("grid", "cell shift must be at most 16");
        }
        Ok(())
    }

    /// Grid covering this config's world with default-sized cells
    pub fn grid_for_world(&self) -> GridConfig {
        GridConfig::covering(
            self.world_width,
            self.world_height,
            GridConfig::DEFAULT_CELL_SHIFT,
        )
    }
}
