use crate::components::{Component, ComponentHandle, ComponentManager, ComponentManagerBase, ComponentManagerFactory, ComponentTypeId};
use crate::updates::{Phase, UpdateContext, UpdateFunctionDesc, UpdateFunctionId, UpdateScheduler};
use tracing::{debug, debug_span, trace, trace_span};
use crate::error::{Result, WorldError};
use rayon::{ThreadPool, ThreadPoolBuilder};
use crate::config::WorldConfig;

/// Owns one [ComponentManager] per component type in use, and the scheduler driving their updates.
pub struct World {
	config: WorldConfig,
	scheduler: UpdateScheduler,
	managers: Vec<Option<Box<dyn ComponentManagerBase>>>,
	simulation_enabled: bool,
	pool: Option<ThreadPool>,
	tick: u64,
}

/// The parts of a [World] a manager can reach while it is being initialized or deinitialized.
pub struct WorldServices<'l> {
	pub(crate) scheduler: &'l mut UpdateScheduler,
	pub(crate) config: &'l WorldConfig,
	pub(crate) simulation_enabled: bool,
}

impl World {
	/// Create an empty world.
	/// A dedicated worker pool is spawned if `config.worker_threads` is not 0.
	pub fn new(config: WorldConfig) -> Result<Self> {
		config.validate()?;

		let pool = match config.worker_threads {
			0 => None,
			threads => Some(
				ThreadPoolBuilder::new()
					.num_threads(threads)
					.thread_name(|index| format!("world-worker-{}", index))
					.build()?,
			),
		};

		debug!(
			world = %config.name,
			block_capacity = config.block_capacity,
			worker_threads = config.worker_threads,
			"created world"
		);
		Ok(Self::with_pool(config, pool))
	}

	fn with_pool(config: WorldConfig, pool: Option<ThreadPool>) -> Self {
		Self {
			simulation_enabled: config.simulation_enabled,
			scheduler: UpdateScheduler::new(),
			managers: Vec::new(),
			tick: 0,
			config,
			pool,
		}
	}

	pub fn config(&self) -> &WorldConfig {
		&self.config
	}

	/// Number of completed updates.
	pub fn tick(&self) -> u64 {
		self.tick
	}

	/// The dedicated worker pool, if one was configured.
	pub fn thread_pool(&self) -> Option<&ThreadPool> {
		self.pool.as_ref()
	}

	pub fn is_simulation_enabled(&self) -> bool {
		self.simulation_enabled
	}

	/// While disabled, update functions flagged as only running during simulation are skipped.
	pub fn set_simulation_enabled(&mut self, enabled: bool) {
		if self.simulation_enabled != enabled {
			debug!(world = %self.config.name, enabled, "simulation toggled");
		}
		self.simulation_enabled = enabled;
	}

	/// Get the manager for `type_id`, creating and initializing it first if needed.
	pub fn create_manager(&mut self, type_id: ComponentTypeId) -> Result<&mut dyn ComponentManagerBase> {
		let index = type_id.index();

		if !self.has_manager(type_id) {
			let create = ComponentManagerFactory::global()
				.read()
				.creator(type_id)
				.ok_or(WorldError::UnknownComponentType(type_id))?;

			let mut manager = create(type_id, &self.config);
			let mut services = WorldServices {
				scheduler: &mut self.scheduler,
				config: &self.config,
				simulation_enabled: self.simulation_enabled,
			};

			if let Err(err) = manager.initialize(&mut services) {
				self.scheduler.deregister_owner(type_id);
				return Err(err);
			}

			if self.managers.len() <= index {
				self.managers.resize_with(index + 1, || None);
			}

			debug!(world = %self.config.name, component = manager.component_type_name(), "created component manager");
			self.managers[index] = Some(manager);
		}

		match self.managers[index].as_deref_mut() {
			Some(manager) => Ok(manager),
			None => Err(WorldError::ManagerNotFound(type_id)),
		}
	}

	/// Get the manager of `C`, creating and initializing it first if needed.
	pub fn get_or_create_manager<C: Component>(&mut self) -> Result<&mut ComponentManager<C>> {
		let type_id = C::component_type_id();
		let found = self.create_manager(type_id)?.component_type_id();

		match self.manager_mut::<C>() {
			Some(manager) => Ok(manager),
			None => Err(WorldError::TypeMismatch { expected: type_id, found }),
		}
	}

	pub fn manager<C: Component>(&self) -> Option<&ComponentManager<C>> {
		self.manager_by_id(C::component_type_id())?.as_any().downcast_ref()
	}

	pub fn manager_mut<C: Component>(&mut self) -> Option<&mut ComponentManager<C>> {
		self.manager_by_id_mut(C::component_type_id())?.as_any_mut().downcast_mut()
	}

	pub fn manager_by_id(&self, type_id: ComponentTypeId) -> Option<&dyn ComponentManagerBase> {
		self.managers.get(type_id.index())?.as_deref()
	}

	pub fn manager_by_id_mut(&mut self, type_id: ComponentTypeId) -> Option<&mut dyn ComponentManagerBase> {
		self.managers.get_mut(type_id.index())?.as_deref_mut()
	}

	pub fn has_manager(&self, type_id: ComponentTypeId) -> bool {
		self.manager_by_id(type_id).is_some()
	}

	/// Iterate over all existing managers, ordered by type id.
	pub fn managers(&self) -> impl Iterator<Item = &dyn ComponentManagerBase> + '_ {
		self.managers.iter().filter_map(|manager| manager.as_deref())
	}

	/// Deinitialize and drop the manager of `type_id`, along with all its components
	/// and update functions. Returns `false` if there was no such manager.
	pub fn destroy_manager(&mut self, type_id: ComponentTypeId) -> bool {
		let Some(mut manager) = self.managers.get_mut(type_id.index()).and_then(Option::take) else {
			return false;
		};

		manager.flush_dead_components();
		let mut services = WorldServices {
			scheduler: &mut self.scheduler,
			config: &self.config,
			simulation_enabled: self.simulation_enabled,
		};
		manager.deinitialize(&mut services);

		let functions = self.scheduler.deregister_owner(type_id);
		debug!(
			world = %self.config.name,
			component = manager.component_type_name(),
			functions,
			"destroyed component manager"
		);
		true
	}

	/// Register an update function with the scheduler. The owning manager must exist.
	pub fn register_update_function(&mut self, desc: UpdateFunctionDesc) -> Result<UpdateFunctionId> {
		if !self.has_manager(desc.owner()) {
			return Err(WorldError::ManagerNotFound(desc.owner()));
		}
		self.scheduler.register(desc)
	}

	/// Returns `false` if the function was not registered.
	pub fn deregister_update_function(&mut self, id: UpdateFunctionId) -> bool {
		self.scheduler.deregister(id)
	}

	pub fn scheduler(&self) -> &UpdateScheduler {
		&self.scheduler
	}

	/// The order in which the functions of `phase` will run during the next update.
	pub fn execution_order(&mut self, phase: Phase) -> Result<Vec<UpdateFunctionId>> {
		Ok(self.scheduler.execution_order(phase)?.to_vec())
	}

	/// Create a default-initialized component, creating its manager if needed.
	pub fn create_component<C: Component>(&mut self) -> Result<(ComponentHandle, &mut C)> {
		self.get_or_create_manager::<C>()?.create_component()
	}

	pub fn try_get_component<C: Component>(&self, handle: ComponentHandle) -> Option<&C> {
		self.manager::<C>()?.try_get_component(handle)
	}

	pub fn try_get_component_mut<C: Component>(&mut self, handle: ComponentHandle) -> Option<&mut C> {
		self.manager_mut::<C>()?.try_get_component_mut(handle)
	}

	/// Delete a component of any type. Its storage is reclaimed at the end of the current phase,
	/// or during the next [flush_dead_components](Self::flush_dead_components).
	pub fn delete_component(&mut self, handle: ComponentHandle) -> Result<()> {
		if handle.is_invalid() {
			return Err(WorldError::InvalidHandle(handle));
		}

		match self.manager_by_id_mut(handle.type_id()) {
			Some(manager) => manager.delete_component(handle),
			None => Err(WorldError::ManagerNotFound(handle.type_id())),
		}
	}

	pub fn is_valid_component(&self, handle: ComponentHandle) -> bool {
		self.manager_by_id(handle.type_id())
			.map_or(false, |manager| manager.is_valid_component(handle))
	}

	/// Run every phase once.
	///
	/// Dead components are reclaimed after each phase, so handles deleted during a phase
	/// never dangle in the next one.
	pub fn update(&mut self) -> Result<()> {
		let _span = debug_span!("world_update", world = %self.config.name, tick = self.tick).entered();
		self.scheduler.resolve()?;

		for phase in Phase::ALL {
			let _phase = trace_span!("update_phase", ?phase).entered();
			let ctx = UpdateContext::new(phase, self.tick, self.simulation_enabled, self.pool.as_ref());
			self.scheduler.run_phase(phase, &mut self.managers, &ctx)?;
			self.flush_dead_components();
		}

		self.tick += 1;
		Ok(())
	}

	/// Reclaim the storage of all deleted components.
	/// Returns the number of reclaimed components.
	pub fn flush_dead_components(&mut self) -> usize {
		let count: usize = self.managers.iter_mut().flatten().map(|manager| manager.flush_dead_components()).sum();
		if count > 0 {
			trace!(count, "reclaimed dead components");
		}
		count
	}
}

impl Default for World {
	fn default() -> Self {
		Self::with_pool(WorldConfig::default(), None)
	}
}

impl Drop for World {
	fn drop(&mut self) {
		let type_ids: Vec<ComponentTypeId> = self.managers().map(|manager| manager.component_type_id()).collect();
		for type_id in type_ids {
			self.destroy_manager(type_id);
		}
	}
}
