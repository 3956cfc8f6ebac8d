//! Errors reported by [worlds](crate::world::World), component managers and the update scheduler.

use crate::components::{ComponentHandle, ComponentTypeId};
use crate::updates::{Phase, UpdateFunctionId};
use thiserror::Error;

/// Everything that can go wrong while managing components or scheduling update functions.
#[derive(Error, Debug)]
pub enum WorldError {
	/// The handle is the invalid sentinel or its index lies outside the slot table.
	#[error("invalid component handle {0:?}")]
	InvalidHandle(ComponentHandle),

	/// The handle belongs to a different component type than the manager it was passed to.
	#[error("handle of component type {found} passed to the manager of component type {expected}")]
	TypeMismatch {
		/// Type id of the manager.
		expected: ComponentTypeId,
		/// Type id stored in the handle.
		found: ComponentTypeId,
	},

	/// The component was deleted, or the handle's generation is stale.
	#[error("component {0:?} does not exist")]
	NotFound(ComponentHandle),

	/// No component type with this id was registered with the factory.
	#[error("unknown component type {0}")]
	UnknownComponentType(ComponentTypeId),

	/// The world has no manager for this component type.
	#[error("no manager for component type {0} exists in this world")]
	ManagerNotFound(ComponentTypeId),

	/// The update functions of a phase depend on each other in a loop.
	#[error("cyclic dependency between update functions in phase {phase:?}: {}", format_cycle(.cycle))]
	CyclicDependency {
		/// Phase containing the cycle.
		phase: Phase,
		/// Functions on the cycle, in dependency order.
		cycle: Vec<UpdateFunctionId>,
	},

	/// An update function depends on a function that is not registered.
	#[error("update function {function} depends on {dependency}, which is not registered")]
	MissingDependency {
		/// The dependent function.
		function: UpdateFunctionId,
		/// The missing dependency.
		dependency: UpdateFunctionId,
	},

	/// An update function depends on a function that runs in a later phase.
	#[error("update function {function} depends on {dependency}, which runs in a later phase")]
	DependencyPhaseMismatch {
		/// The dependent function.
		function: UpdateFunctionId,
		/// The dependency registered in a later phase.
		dependency: UpdateFunctionId,
	},

	/// An update function with the same id is already registered.
	#[error("update function {0} is already registered")]
	DuplicateUpdateFunction(UpdateFunctionId),

	/// The description of an update function is inconsistent.
	#[error("invalid update function {function}: {reason}")]
	InvalidUpdateFunction {
		/// The rejected function.
		function: UpdateFunctionId,
		/// What is wrong with it.
		reason: &'static str,
	},

	/// The component type was already registered with the factory.
	#[error("component type {0} is already registered")]
	DuplicateType(&'static str),

	/// A fixed-size id space ran out.
	#[error("capacity exhausted: {0}")]
	CapacityExhausted(&'static str),

	/// A configuration value is out of range.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// A configuration file could not be parsed.
	#[error("failed to parse configuration: {0}")]
	ConfigParse(#[from] toml::de::Error),

	/// A configuration file could not be read.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// The worker pool for asynchronous update batches could not be created.
	#[error("failed to build the worker thread pool: {0}")]
	ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, WorldError>;

fn format_cycle(cycle: &[UpdateFunctionId]) -> String {
	let mut names: Vec<String> = cycle.iter().map(|id| id.to_string()).collect();
	if let Some(first) = names.first().cloned() {
		names.push(first);
	}
	names.join(" -> ")
}
