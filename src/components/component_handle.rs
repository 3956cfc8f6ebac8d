use crate::components::ComponentTypeId;

/// A unique, generation-checked handle to a component.
///
/// A handle stays valid until its component is deleted, no matter how often the component
/// moves inside its manager's storage.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct ComponentHandle {
	pub(crate) index: u32,
	pub(crate) generation: u16,
	pub(crate) type_id: ComponentTypeId,
}

impl ComponentHandle {
	/// A handle that never resolves.
	pub const INVALID: Self = Self {
		index: u32::MAX,
		generation: 0,
		type_id: ComponentTypeId::INVALID,
	};

	#[inline(always)]
	pub(crate) const fn new(index: u32, generation: u16, type_id: ComponentTypeId) -> Self {
		Self {
			index,
			generation,
			type_id,
		}
	}

	/// Index of the handle's slot.
	pub const fn index(&self) -> u32 {
		self.index
	}

	pub const fn generation(&self) -> u16 {
		self.generation
	}

	/// The type of the component, which also selects the manager owning it.
	pub const fn type_id(&self) -> ComponentTypeId {
		self.type_id
	}

	pub fn is_invalid(&self) -> bool {
		self.index == u32::MAX || self.type_id == ComponentTypeId::INVALID
	}
}

impl Default for ComponentHandle {
	fn default() -> Self {
		Self::INVALID
	}
}
