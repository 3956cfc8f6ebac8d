use crate::components::{Component, ComponentHandle, ComponentTypeId, UserData};
use crate::data_structures::{BlockStorage, SlotTable, StorageEntry};
use crate::updates::{UpdateBatch, UpdateFunctionDesc, UpdateFunctionId, UpdateScheduler};
use crate::error::{Result, WorldError};
use crate::config::WorldConfig;
use crate::world::WorldServices;
use std::any::Any;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum ComponentState {
	Live,
	Dead,
}

/// A stored component, along with the slot that refers to it.
pub(crate) struct ComponentRecord<C> {
	pub slot: u32,
	pub state: ComponentState,
	pub value: C,
}

impl<C> ComponentRecord<C> {
	#[inline(always)]
	pub fn is_live(&self) -> bool {
		self.state == ComponentState::Live
	}
}

/// The type-erased interface of a [ComponentManager], used by the [World](crate::world::World)
/// to manage components of types it doesn't know statically.
pub trait ComponentManagerBase: Any + Send {
	fn component_type_id(&self) -> ComponentTypeId;
	fn component_type_name(&self) -> &'static str;

	/// Create a default-initialized component.
	fn allocate_component(&mut self) -> Result<ComponentHandle>;
	fn is_valid_component(&self, handle: ComponentHandle) -> bool;
	fn delete_component(&mut self, handle: ComponentHandle) -> Result<()>;

	/// Number of live components.
	fn component_count(&self) -> usize;
	/// Number of deleted components waiting to be reclaimed.
	fn pending_deletions(&self) -> usize;
	/// Reclaim the storage of deleted components. Returns the number of reclaimed components.
	fn flush_dead_components(&mut self) -> usize;

	fn user_data(&self) -> &UserData;
	fn user_data_mut(&mut self) -> &mut UserData;

	/// Called by the world right after the manager was created.
	fn initialize(&mut self, services: &mut WorldServices<'_>) -> Result<()>;
	/// Called by the world before the manager is destroyed.
	fn deinitialize(&mut self, services: &mut WorldServices<'_>);

	fn as_any(&self) -> &dyn Any;
	fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Owns every component of type `C`.
///
/// Components are addressed through [ComponentHandle]s. Deleting a component invalidates
/// its handle immediately, but its storage is only reclaimed when dead components are
/// flushed, which the [World](crate::world::World) does after each update phase.
pub struct ComponentManager<C: Component> {
	type_id: ComponentTypeId,
	slots: SlotTable,
	storage: BlockStorage<ComponentRecord<C>>,
	dead: Vec<u32>,
	user_data: UserData,
}

impl<C: Component> ComponentManager<C> {
	/// # Panics
	/// If `config.block_capacity` is 0. [ComponentManagerFactory::create](crate::components::ComponentManagerFactory::create)
	/// validates the config first.
	pub fn new(type_id: ComponentTypeId, config: &WorldConfig) -> Self {
		Self {
			type_id,
			slots: SlotTable::new(),
			storage: BlockStorage::new(config.block_capacity, C::COMPACT_STORAGE),
			dead: Vec::new(),
			user_data: UserData::default(),
		}
	}

	pub fn component_type_id(&self) -> ComponentTypeId {
		self.type_id
	}

	/// Create a default-initialized component.
	pub fn create_component(&mut self) -> Result<(ComponentHandle, &mut C)> {
		let (index, generation) = self.slots.allocate(StorageEntry::INVALID)?;
		let (entry, record) = self.storage.insert(ComponentRecord {
			slot: index,
			state: ComponentState::Live,
			value: C::default(),
		});
		self.slots.update(index, entry);

		let handle = ComponentHandle::new(index, generation, self.type_id);
		record.value.on_initialize(handle, &mut self.user_data);
		Ok((handle, &mut record.value))
	}

	pub fn get_component(&self, handle: ComponentHandle) -> Result<&C> {
		let entry = self.resolve(handle)?;
		match self.storage.get(entry) {
			Some(record) => Ok(&record.value),
			None => Err(WorldError::NotFound(handle)),
		}
	}

	pub fn get_component_mut(&mut self, handle: ComponentHandle) -> Result<&mut C> {
		let entry = self.resolve(handle)?;
		match self.storage.get_mut(entry) {
			Some(record) => Ok(&mut record.value),
			None => Err(WorldError::NotFound(handle)),
		}
	}

	#[inline]
	pub fn try_get_component(&self, handle: ComponentHandle) -> Option<&C> {
		self.get_component(handle).ok()
	}

	#[inline]
	pub fn try_get_component_mut(&mut self, handle: ComponentHandle) -> Option<&mut C> {
		self.get_component_mut(handle).ok()
	}

	pub fn is_valid_component(&self, handle: ComponentHandle) -> bool {
		self.resolve(handle).is_ok()
	}

	/// Delete a component.
	///
	/// The handle stops resolving right away. The component stays in storage, marked dead,
	/// until [flush_dead_components](Self::flush_dead_components) is called.
	pub fn delete_component(&mut self, handle: ComponentHandle) -> Result<()> {
		let entry = self.resolve(handle)?;
		let record = self.storage.get_mut(entry).ok_or(WorldError::NotFound(handle))?;
		debug_assert!(record.is_live(), "Resolved a dead component");

		record.state = ComponentState::Dead;
		record.value.on_deinitialize(handle, &mut self.user_data);
		self.slots.invalidate(handle.index, handle.generation);
		self.dead.push(handle.index);
		Ok(())
	}

	/// Remove all deleted components from storage and recycle their slots.
	/// Returns the number of reclaimed components.
	pub fn flush_dead_components(&mut self) -> usize {
		let mut dead = std::mem::take(&mut self.dead);
		let count = dead.len();

		for index in dead.drain(..) {
			let Some(entry) = self.slots.entry(index) else {
				continue;
			};

			if let Some(record) = self.storage.get_mut(entry) {
				record.value.on_delete_dead(&mut self.user_data);
			}

			match self.storage.remove(entry) {
				Some(removed) => {
					if let Some(relocation) = removed.relocation {
						// The moved record may be dead as well; its slot still has to follow it
						if let Some(moved) = self.storage.get(relocation.to) {
							self.slots.update(moved.slot, relocation.to);
						}
					}
				},
				None => debug_assert!(false, "Dead component {} was missing from storage", index),
			}

			self.slots.release(index);
		}

		// Keep the allocation around for the next round of deletions
		self.dead = dead;
		count
	}

	/// Iterate over all live components in storage order.
	pub fn components(&self) -> impl Iterator<Item = &C> + '_ {
		self.storage.iter().filter(|record| record.is_live()).map(|record| &record.value)
	}

	pub fn components_mut(&mut self) -> impl Iterator<Item = &mut C> + '_ {
		self.storage.iter_mut().filter(|record| record.is_live()).map(|record| &mut record.value)
	}

	/// Iterate over all live components along with their handles.
	pub fn iter_with_handles(&self) -> impl Iterator<Item = (ComponentHandle, &C)> + '_ {
		self.storage.iter().filter(|record| record.is_live()).map(move |record| {
			let generation = self.slots.generation(record.slot).unwrap_or_default();
			(ComponentHandle::new(record.slot, generation, self.type_id), &record.value)
		})
	}

	/// Iterate over the live components stored at positions `[start, start + count)`.
	pub fn components_in_range(&self, start: usize, count: usize) -> impl Iterator<Item = &C> + '_ {
		self.storage.iter_range(start, count).filter(|record| record.is_live()).map(|record| &record.value)
	}

	/// Mutable access to the components stored at positions `[start, start + count)`.
	pub fn components_in_range_mut(&mut self, start: usize, count: usize) -> UpdateBatch<'_, C> {
		UpdateBatch::new(self.storage.range_mut(start, count))
	}

	/// Split the stored components into `ceil(count / granularity)` disjoint batches.
	/// Tombstones left by deletions in non-compact storage don't count towards a batch.
	/// A granularity of 0 yields a single batch.
	pub fn batches_mut(&mut self, granularity: usize) -> Vec<UpdateBatch<'_, C>> {
		self.storage.batches_mut(granularity).into_iter().map(UpdateBatch::new).collect()
	}

	/// Number of live components.
	pub fn component_count(&self) -> usize {
		self.slots.len()
	}

	pub fn pending_deletions(&self) -> usize {
		self.dead.len()
	}

	/// Number of storage positions in use, including dead components and tombstones.
	pub fn storage_len(&self) -> usize {
		self.storage.len()
	}

	pub fn block_count(&self) -> usize {
		self.storage.block_count()
	}

	pub fn is_compact(&self) -> bool {
		self.storage.is_compact()
	}

	pub fn user_data(&self) -> &UserData {
		&self.user_data
	}

	pub fn user_data_mut(&mut self) -> &mut UserData {
		&mut self.user_data
	}

	/// Physical storage position of a component. Only stable in non-compact storage.
	pub fn storage_position(&self, handle: ComponentHandle) -> Option<usize> {
		let entry = self.resolve(handle).ok()?;
		Some(self.storage.position_of(entry))
	}

	fn resolve(&self, handle: ComponentHandle) -> Result<StorageEntry> {
		if handle.is_invalid() {
			return Err(WorldError::InvalidHandle(handle));
		}
		if handle.type_id != self.type_id {
			return Err(WorldError::TypeMismatch {
				expected: self.type_id,
				found: handle.type_id,
			});
		}
		if !self.slots.contains_index(handle.index) {
			return Err(WorldError::InvalidHandle(handle));
		}

		self.slots.resolve(handle.index, handle.generation).ok_or(WorldError::NotFound(handle))
	}

	fn context<'l>(&'l mut self, services: &'l mut WorldServices<'_>) -> ManagerContext<'l, C> {
		ManagerContext {
			manager: self,
			scheduler: &mut *services.scheduler,
			config: services.config,
			simulation_enabled: services.simulation_enabled,
		}
	}
}

impl<C: Component> ComponentManagerBase for ComponentManager<C> {
	fn component_type_id(&self) -> ComponentTypeId {
		self.type_id
	}

	fn component_type_name(&self) -> &'static str {
		std::any::type_name::<C>()
	}

	fn allocate_component(&mut self) -> Result<ComponentHandle> {
		let (handle, _) = ComponentManager::create_component(self)?;
		Ok(handle)
	}

	fn is_valid_component(&self, handle: ComponentHandle) -> bool {
		ComponentManager::is_valid_component(self, handle)
	}

	fn delete_component(&mut self, handle: ComponentHandle) -> Result<()> {
		ComponentManager::delete_component(self, handle)
	}

	fn component_count(&self) -> usize {
		ComponentManager::component_count(self)
	}

	fn pending_deletions(&self) -> usize {
		ComponentManager::pending_deletions(self)
	}

	fn flush_dead_components(&mut self) -> usize {
		ComponentManager::flush_dead_components(self)
	}

	fn user_data(&self) -> &UserData {
		&self.user_data
	}

	fn user_data_mut(&mut self) -> &mut UserData {
		&mut self.user_data
	}

	fn initialize(&mut self, services: &mut WorldServices<'_>) -> Result<()> {
		C::initialize_manager(&mut self.context(services))
	}

	fn deinitialize(&mut self, services: &mut WorldServices<'_>) {
		C::deinitialize_manager(&mut self.context(services))
	}

	fn as_any(&self) -> &dyn Any {
		self
	}

	fn as_any_mut(&mut self) -> &mut dyn Any {
		self
	}
}

/// Access to a manager and its world while the manager is being initialized or deinitialized.
pub struct ManagerContext<'l, C: Component> {
	manager: &'l mut ComponentManager<C>,
	scheduler: &'l mut UpdateScheduler,
	config: &'l WorldConfig,
	simulation_enabled: bool,
}

impl<'l, C: Component> ManagerContext<'l, C> {
	pub fn manager(&mut self) -> &mut ComponentManager<C> {
		self.manager
	}

	pub fn user_data(&mut self) -> &mut UserData {
		&mut self.manager.user_data
	}

	pub fn config(&self) -> &WorldConfig {
		self.config
	}

	pub fn is_simulation_enabled(&self) -> bool {
		self.simulation_enabled
	}

	/// Register an update function owned by this manager.
	pub fn register_update_function(&mut self, desc: UpdateFunctionDesc) -> Result<UpdateFunctionId> {
		if desc.owner() != self.manager.type_id {
			return Err(WorldError::TypeMismatch {
				expected: self.manager.type_id,
				found: desc.owner(),
			});
		}
		self.scheduler.register(desc)
	}

	/// Deregister an update function. Unknown ids are ignored.
	pub fn deregister_update_function(&mut self, id: UpdateFunctionId) -> bool {
		self.scheduler.deregister(id)
	}
}
