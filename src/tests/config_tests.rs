use crate::config::{WorldConfig, DEFAULT_BLOCK_CAPACITY};
use crate::error::WorldError;

#[test]
pub fn defaults() {
	let config = WorldConfig::default();
	assert_eq!(config.block_capacity, DEFAULT_BLOCK_CAPACITY);
	assert_eq!(config.worker_threads, 0);
	assert!(config.simulation_enabled);
	assert!(config.validate().is_ok());
}

#[test]
pub fn partial_toml_keeps_defaults() {
	let config = WorldConfig::from_toml_str("name = \"editor\"\nsimulation_enabled = false\n").unwrap();
	assert_eq!(config.name, "editor");
	assert!(!config.simulation_enabled);
	assert_eq!(config.block_capacity, DEFAULT_BLOCK_CAPACITY);
}

#[test]
pub fn round_trips_through_toml() {
	let config = WorldConfig {
		name: String::from("server"),
		block_capacity: 256,
		worker_threads: 4,
		simulation_enabled: false,
	};
	let text = toml::to_string(&config).unwrap();
	assert_eq!(WorldConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
pub fn invalid_values_are_rejected() {
	assert!(matches!(
		WorldConfig::from_toml_str("block_capacity = 0"),
		Err(WorldError::InvalidConfig(_))
	));
	assert!(matches!(
		WorldConfig::from_toml_str("block_capacity = \"large\""),
		Err(WorldError::ConfigParse(_))
	));
}

#[test]
pub fn missing_files_are_reported() {
	assert!(matches!(
		WorldConfig::from_file("/nonexistent/world.toml"),
		Err(WorldError::Io(_))
	));
}
