use crate::components::{Component, ComponentManager, ComponentManagerBase, ComponentTypeId};
use crate::error::{Result, WorldError};
use std::hash::BuildHasherDefault;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use nohash_hasher::NoHashHasher;
use crate::config::WorldConfig;
use parking_lot::RwLock;
use std::any::TypeId;
use lazy_static::lazy_static;
use tracing::warn;

type Hasher = BuildHasherDefault<NoHashHasher<u64>>;

/// Creates a type-erased manager for one registered component type.
pub type CreateManager = fn(ComponentTypeId, &WorldConfig) -> Box<dyn ComponentManagerBase>;

lazy_static! {
	static ref FACTORY: RwLock<ComponentManagerFactory> = RwLock::new(ComponentManagerFactory::new());
}

struct TypeEntry {
	name: &'static str,
	create: CreateManager,
}

/// Assigns [ComponentTypeId]s and creates [component managers](ComponentManager) by id.
///
/// Ids are handed out sequentially starting at 0, in registration order.
/// A process-wide instance backs [Component::component_type_id];
/// private instances can be created for bookkeeping that must not leak into it.
pub struct ComponentManagerFactory {
	types: Vec<TypeEntry>,
	by_type: HashMap<TypeId, ComponentTypeId, Hasher>,
	by_name: HashMap<&'static str, ComponentTypeId>,
}

impl ComponentManagerFactory {
	pub fn new() -> Self {
		Self {
			types: Vec::new(),
			by_type: HashMap::default(),
			by_name: HashMap::new(),
		}
	}

	/// The process-wide factory.
	pub fn global() -> &'static RwLock<Self> {
		&FACTORY
	}

	/// Get the id of `C` in the global factory, registering the type on first use.
	///
	/// # Panics
	/// If the global factory ran out of ids.
	pub fn type_id_of<C: Component>() -> ComponentTypeId {
		if let Some(id) = FACTORY.read().type_id(TypeId::of::<C>()) {
			return id;
		}

		match FACTORY.write().register_type::<C>() {
			Ok(id) => id,
			Err(err) => panic!("Cannot register {}: {}", std::any::type_name::<C>(), err),
		}
	}

	/// Register `C`, or return its id if it is already registered.
	pub fn register_type<C: Component>(&mut self) -> Result<ComponentTypeId> {
		match self.type_id(TypeId::of::<C>()) {
			Some(id) => Ok(id),
			None => self.register::<C>(),
		}
	}

	/// Register `C` under the next free id.
	/// Registering the same type twice is an error.
	pub fn register<C: Component>(&mut self) -> Result<ComponentTypeId> {
		let name = std::any::type_name::<C>();
		if self.by_type.contains_key(&TypeId::of::<C>()) {
			return Err(WorldError::DuplicateType(name));
		}

		// u16::MAX is reserved for ComponentTypeId::INVALID
		if self.types.len() >= u16::MAX as usize {
			return Err(WorldError::CapacityExhausted("component type ids"));
		}

		let id = ComponentTypeId::from_value(self.types.len() as u16);
		self.types.push(TypeEntry {
			name,
			create: create_manager::<C>,
		});
		self.by_type.insert(TypeId::of::<C>(), id);

		// Type names aren't guaranteed to be unique; the first type keeps the name
		match self.by_name.entry(name) {
			Entry::Occupied(entry) => warn!(type_name = name, existing = %entry.get(), ignored = %id, "component type name is ambiguous"),
			Entry::Vacant(entry) => {
				entry.insert(id);
			},
		}
		Ok(id)
	}

	pub fn type_id(&self, type_id: TypeId) -> Option<ComponentTypeId> {
		self.by_type.get(&type_id).copied()
	}

	/// Look up a type by its [type name](std::any::type_name).
	/// If several types share a name, the first one registered is returned.
	pub fn type_id_by_name(&self, name: &str) -> Option<ComponentTypeId> {
		self.by_name.get(name).copied()
	}

	pub fn type_name(&self, id: ComponentTypeId) -> Option<&'static str> {
		self.types.get(id.index()).map(|entry| entry.name)
	}

	/// The constructor of the manager for `id`.
	pub fn creator(&self, id: ComponentTypeId) -> Option<CreateManager> {
		self.types.get(id.index()).map(|entry| entry.create)
	}

	/// Create an empty manager for `id`.
	pub fn create(&self, id: ComponentTypeId, config: &WorldConfig) -> Result<Box<dyn ComponentManagerBase>> {
		config.validate()?;
		let create = self.creator(id).ok_or(WorldError::UnknownComponentType(id))?;
		Ok(create(id, config))
	}

	/// Number of registered types.
	pub fn len(&self) -> usize {
		self.types.len()
	}

	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}
}

impl Default for ComponentManagerFactory {
	fn default() -> Self {
		Self::new()
	}
}

fn create_manager<C: Component>(id: ComponentTypeId, config: &WorldConfig) -> Box<dyn ComponentManagerBase> {
	Box::new(ComponentManager::<C>::new(id, config))
}
