//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// World and population parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Side length of the square toroidal grid
    pub grid_size: i32,
    /// Fish placed at construction
    pub initial_fish: usize,
    /// Sharks placed at construction
    pub initial_sharks: usize,
    /// Chronons a fish must live before it breeds
    pub fish_breed_age: u32,
    /// Chronons a shark must live before it breeds
    pub shark_breed_age: u32,
    /// Starting energy of initial sharks; one unit is burned per chronon
    pub shark_starve_time: i32,
    /// Energy a shark gains by eating one fish
    pub energy_per_fish: i32,
    /// Random seed. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_size: 50,
            initial_fish: 500,
            initial_sharks: 100,
            fish_breed_age: 4,
            shark_breed_age: 8,
            shark_starve_time: 10,
            energy_per_fish: 3,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Number of cells in the grid
    pub fn area(&self) -> usize {
        let side = self.grid_size.max(0) as usize;
        side * side
    }

    /// Reject configurations the engine cannot construct a world from.
    pub fn validate(&self) -> Result<()> {
        if self.grid_size <= 0 {
            return Err(Error::Configuration(format!(
                "grid size must be positive, got {}",
                self.grid_size
            )));
        }

        let population = self.initial_fish + self.initial_sharks;
        if population > self.area() {
            return Err(Error::Configuration(format!(
                "{} fish and {} sharks do not fit on a {}x{} grid",
                self.initial_fish, self.initial_sharks, self.grid_size, self.grid_size
            )));
        }

        if self.shark_starve_time <= 0 {
            return Err(Error::Configuration(format!(
                "shark starve time must be positive, got {}",
                self.shark_starve_time
            )));
        }

        if self.energy_per_fish < 0 {
            return Err(Error::Configuration(format!(
                "energy per fish must not be negative, got {}",
                self.energy_per_fish
            )));
        }

        Ok(())
    }

    /// Load and validate a configuration from a JSON file. Missing fields
    /// take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

/// Parameters of a driver run over a simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Number of chronons to simulate
    pub duration: u64,
    /// Worker threads per phase; 1 or less steps sequentially
    pub workers: usize,
    /// Log population statistics every this many chronons (0 disables)
    pub report_interval: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: 500,
            workers: 1,
            report_interval: 50,
        }
    }
}
