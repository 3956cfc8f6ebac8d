use std::any::Any;

/// Arbitrary data attached to a [ComponentManager](crate::components::ComponentManager).
///
/// Component hooks receive it to maintain per-manager bookkeeping,
/// such as a list of components that need special treatment.
#[derive(Default)]
pub struct UserData {
	value: Option<Box<dyn Any + Send + Sync>>,
}

impl UserData {
	/// Replace the stored value.
	pub fn set<T: Any + Send + Sync>(&mut self, value: T) {
		self.value = Some(Box::new(value));
	}

	pub fn get<T: Any>(&self) -> Option<&T> {
		self.value.as_ref()?.downcast_ref()
	}

	pub fn get_mut<T: Any>(&mut self) -> Option<&mut T> {
		self.value.as_mut()?.downcast_mut()
	}

	/// Get the stored value, inserting one first if nothing of type `T` is stored.
	pub fn get_or_insert_with<T: Any + Send + Sync>(&mut self, init: impl FnOnce() -> T) -> &mut T {
		if self.get::<T>().is_none() {
			self.set(init());
		}

		match self.value.as_mut().and_then(|value| value.downcast_mut()) {
			Some(value) => value,
			None => unreachable!("UserData was just initialized"),
		}
	}

	pub fn take(&mut self) -> Option<Box<dyn Any + Send + Sync>> {
		self.value.take()
	}

	pub fn is_set(&self) -> bool {
		self.value.is_some()
	}
}
