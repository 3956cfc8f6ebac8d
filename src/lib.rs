extern crate self as turbo_world;

pub mod data_structures;
pub mod components;
pub mod updates;
pub mod config;
pub mod error;
pub mod world;

pub use lazy_static::lazy_static;
pub use world::{World, WorldServices};

pub mod prelude {
	pub use crate::updates::*;
	pub use crate::components::*;
	pub use crate::world::World;
	pub use crate::config::WorldConfig;
	pub use crate::error::{Result, WorldError};
}

#[cfg(test)]
mod tests;
