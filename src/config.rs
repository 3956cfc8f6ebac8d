//! Construction parameters of a [World](crate::world::World).

use crate::error::{Result, WorldError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Records per storage block unless configured otherwise.
pub const DEFAULT_BLOCK_CAPACITY: usize = 64;

/// Settings applied when a [World](crate::world::World) is created.
///
/// Every field has a default, so a configuration file only needs to list the values it changes:
/// ```toml
/// name = "editor"
/// block_capacity = 256
/// worker_threads = 4
/// simulation_enabled = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
	/// Name used in log output.
	pub name: String,
	/// Number of component records per storage block.
	pub block_capacity: usize,
	/// Size of the worker pool for asynchronous update batches. `0` uses rayon's global pool.
	pub worker_threads: usize,
	/// Initial state of the simulation flag.
	pub simulation_enabled: bool,
}

impl Default for WorldConfig {
	fn default() -> Self {
		Self {
			name: String::from("world"),
			block_capacity: DEFAULT_BLOCK_CAPACITY,
			worker_threads: 0,
			simulation_enabled: true,
		}
	}
}

impl WorldConfig {
	/// Parse a configuration from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self> {
		let config: Self = toml::from_str(text)?;
		config.validate()?;
		Ok(config)
	}

	/// Load a configuration from a TOML file.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let text = std::fs::read_to_string(path)?;
		Self::from_toml_str(&text)
	}

	/// Check that all values are usable.
	pub fn validate(&self) -> Result<()> {
		if self.block_capacity == 0 {
			return Err(WorldError::InvalidConfig(String::from("block_capacity must be greater than zero")));
		}
		if self.block_capacity > u32::MAX as usize {
			return Err(WorldError::InvalidConfig(String::from("block_capacity must fit in 32 bits")));
		}
		Ok(())
	}
}
