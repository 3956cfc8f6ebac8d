use crate::data_structures::{BitField, StorageEntry};
use crate::error::{Result, WorldError};

/// Maps stable slot indices to [storage entries](StorageEntry).
///
/// Every slot carries a generation counter. Freeing a slot bumps its generation,
/// so indices can be recycled without stale `(index, generation)` pairs resolving again.
#[derive(Default)]
pub struct SlotTable {
	entries: Vec<StorageEntry>,
	generations: Vec<u16>,
	live: BitField,
	free: Vec<u32>,
}

impl SlotTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reserve a slot bound to `entry`, reusing the most recently released index first.
	/// Returns the slot's index and current generation.
	pub fn allocate(&mut self, entry: StorageEntry) -> Result<(u32, u16)> {
		let index = match self.free.pop() {
			Some(index) => {
				self.entries[index as usize] = entry;
				index
			},
			None => {
				let index = self.entries.len();
				if index >= u32::MAX as usize {
					return Err(WorldError::CapacityExhausted("component slot indices"));
				}
				self.entries.push(entry);
				self.generations.push(0);
				index as u32
			},
		};

		self.live.set(index as usize, true);
		Ok((index, self.generations[index as usize]))
	}

	/// Get the storage entry of a live slot whose generation matches.
	#[inline]
	pub fn resolve(&self, index: u32, generation: u16) -> Option<StorageEntry> {
		let i = index as usize;
		if !self.live.get(i) || self.generations[i] != generation {
			return None;
		}
		Some(self.entries[i])
	}

	/// Whether `index` was ever handed out by this table.
	#[inline]
	pub fn contains_index(&self, index: u32) -> bool {
		(index as usize) < self.entries.len()
	}

	/// The storage entry stored for `index`, regardless of liveness or generation.
	#[inline]
	pub fn entry(&self, index: u32) -> Option<StorageEntry> {
		self.entries.get(index as usize).copied()
	}

	/// The current generation of `index`.
	#[inline]
	pub fn generation(&self, index: u32) -> Option<u16> {
		self.generations.get(index as usize).copied()
	}

	/// Rewrite the storage entry of a slot after its record was relocated.
	/// The generation is left untouched.
	#[inline]
	pub fn update(&mut self, index: u32, entry: StorageEntry) {
		self.entries[index as usize] = entry;
	}

	/// Make a slot unresolvable by bumping its generation.
	/// The index stays reserved until [release](Self::release) is called.
	/// Returns `false` if the slot was not live or the generation did not match.
	pub fn invalidate(&mut self, index: u32, generation: u16) -> bool {
		if self.resolve(index, generation).is_none() {
			return false;
		}

		let i = index as usize;
		self.live.set(i, false);
		self.generations[i] = self.generations[i].wrapping_add(1);
		true
	}

	/// Return an invalidated slot to the free list.
	pub fn release(&mut self, index: u32) {
		debug_assert!(!self.live.get(index as usize), "Cannot release a live slot");
		debug_assert!(!self.free.contains(&index), "Slot was already released");
		self.free.push(index);
	}

	/// Invalidate and release a slot in one step.
	pub fn free(&mut self, index: u32, generation: u16) -> bool {
		let freed = self.invalidate(index, generation);
		if freed {
			self.release(index);
		}
		freed
	}

	/// Number of live slots.
	pub fn len(&self) -> usize {
		self.live.count_ones()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Number of slot indices handed out so far, live or not.
	pub fn capacity(&self) -> usize {
		self.entries.len()
	}
}
