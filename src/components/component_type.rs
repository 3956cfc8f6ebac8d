use crate::components::{ComponentHandle, ComponentManagerFactory, ManagerContext, UserData};
use crate::updates::UpdateContext;
use crate::error::Result;
use std::fmt;

/// A sequential runtime identifier tied to a [Component] type.
///
/// Ids are assigned by the [ComponentManagerFactory] the first time a type is seen,
/// so they are not stable between program re-runs.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Debug)]
pub struct ComponentTypeId {
	value: u16,
}

impl ComponentTypeId {
	/// Marks handles that don't belong to any component type.
	pub const INVALID: Self = Self { value: u16::MAX };

	/// Get the [ComponentTypeId] of the type `T`.
	#[inline(always)]
	pub fn of<T: Component>() -> Self {
		T::component_type_id()
	}

	#[inline(always)]
	pub const fn value(self) -> u16 {
		self.value
	}

	#[inline(always)]
	pub(crate) const fn from_value(value: u16) -> Self {
		Self { value }
	}

	#[inline(always)]
	pub(crate) const fn index(self) -> usize {
		self.value as usize
	}
}

impl fmt::Display for ComponentTypeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.value)
	}
}

/// Plain data stored by a [ComponentManager](crate::components::ComponentManager).
///
/// Usually implemented through `#[derive(Component)]`.
/// Implement it by hand to hook into the lifecycle of the manager or of individual components.
pub trait Component: 'static + Default + Send + Sized {
	/// Whether deletions swap the last record into the freed position (compact storage),
	/// or leave a reusable hole behind so that no other record ever moves.
	const COMPACT_STORAGE: bool = false;

	/// The id assigned to this type by the global [ComponentManagerFactory].
	fn component_type_id() -> ComponentTypeId {
		ComponentManagerFactory::type_id_of::<Self>()
	}

	/// Called once after the manager was created. This is where update functions get registered.
	fn initialize_manager(_ctx: &mut ManagerContext<'_, Self>) -> Result<()> {
		Ok(())
	}

	/// Called once before the manager is destroyed.
	fn deinitialize_manager(_ctx: &mut ManagerContext<'_, Self>) {}

	/// Called right after the component was created.
	fn on_initialize(&mut self, _handle: ComponentHandle, _user_data: &mut UserData) {}

	/// Called when the component is deleted, before its handle becomes invalid.
	fn on_deinitialize(&mut self, _handle: ComponentHandle, _user_data: &mut UserData) {}

	/// Called when a deleted component is about to be removed from storage.
	fn on_delete_dead(&mut self, _user_data: &mut UserData) {}
}

/// Components updated one by one through [UpdateFunctionDesc::simple](crate::updates::UpdateFunctionDesc::simple).
pub trait SimpleUpdate: Component {
	/// Skip the update while the world simulation is disabled.
	const ONLY_WHEN_SIMULATING: bool = false;

	fn update(&mut self, ctx: &UpdateContext<'_>);
}
