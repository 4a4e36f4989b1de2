//! Static swarm configuration

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::*;
use crate::{Bounds, ConfigError, GridLayout};

/// Everything the swarm needs before its first frame.
///
/// Missing fields in a config file fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub particle_count: u32,
    pub particle_size: f32,
    pub gravity: Vec2,
    pub drag: f32,
    pub bounds: Bounds,
    pub interaction_radius: f32,
    /// Positive pulls particles toward the pointer
    pub interaction_strength: f32,
    /// Cutoff distance for particle-particle repulsion. Doubles as the grid cell size.
    pub repulsion_radius: f32,
    pub repulsion_strength: f32,
    pub max_delta_time: f32,
    /// Fixed RNG seed for reproducible initial placement
    pub seed: Option<u64>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            particle_size: DEFAULT_PARTICLE_SIZE,
            gravity: Vec2::from_array(DEFAULT_GRAVITY),
            drag: DEFAULT_DRAG,
            bounds: Bounds::new(Vec2::ZERO, Vec2::from_array(DEFAULT_BOUNDS_SIZE)),
            interaction_radius: DEFAULT_INTERACTION_RADIUS,
            interaction_strength: DEFAULT_INTERACTION_STRENGTH,
            repulsion_radius: DEFAULT_REPULSION_RADIUS,
            repulsion_strength: DEFAULT_REPULSION_STRENGTH,
            max_delta_time: DEFAULT_MAX_DELTA_TIME,
            seed: None,
        }
    }
}

impl SwarmConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: SwarmConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::EmptySwarm);
        }
        if !(self.repulsion_radius.is_finite() && self.repulsion_radius > 0.0) {
            return Err(ConfigError::InvalidRepulsionRadius(self.repulsion_radius));
        }
        if !(self.particle_size.is_finite() && self.particle_size > 0.0) {
            return Err(ConfigError::InvalidParticleSize(self.particle_size));
        }
        for (name, value) in [
            ("drag", self.drag),
            ("interaction radius", self.interaction_radius),
            ("repulsion strength", self.repulsion_strength),
            ("max delta time", self.max_delta_time),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }
        for (name, value) in [
            ("gravity", self.gravity.x),
            ("gravity", self.gravity.y),
            ("interaction strength", self.interaction_strength),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }
        self.bounds.validate()?;
        GridLayout::new(&self.bounds, self.repulsion_radius)?;
        Ok(())
    }

    /// Grid derived from the bounds and repulsion radius.
    pub fn grid(&self) -> Result<GridLayout, ConfigError> {
        GridLayout::new(&self.bounds, self.repulsion_radius)
    }
}
