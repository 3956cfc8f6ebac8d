use crate::data_structures::{BitField, SlotTable, StorageEntry};

fn entry(block: u32, index: u32) -> StorageEntry {
	StorageEntry { block, index }
}

#[test]
pub fn sequential_allocation() {
	let mut slots = SlotTable::new();

	for i in 0..16 {
		let (index, generation) = slots.allocate(entry(0, i)).unwrap();
		assert_eq!(index, i, "Slot index does not match expected index");
		assert_eq!(generation, 0, "Fresh slots must start at generation 0");
		assert_eq!(slots.resolve(index, generation), Some(entry(0, i)), "Slot does not resolve to its entry");
	}

	assert_eq!(slots.len(), 16);
	assert_eq!(slots.capacity(), 16);
}

#[test]
pub fn freed_slots_are_reused_with_a_new_generation() {
	let mut slots = SlotTable::new();
	let (a, a_gen) = slots.allocate(entry(0, 0)).unwrap();
	let (b, _) = slots.allocate(entry(0, 1)).unwrap();

	assert!(slots.free(a, a_gen), "Freeing a live slot must succeed");
	assert_eq!(slots.resolve(a, a_gen), None, "Freed slot must not resolve");
	assert!(!slots.free(a, a_gen), "Freeing a slot twice must fail");

	let (c, c_gen) = slots.allocate(entry(0, 2)).unwrap();
	assert_eq!(c, a, "Freed index was not reused");
	assert_eq!(c_gen, a_gen + 1, "Reused slot must have a bumped generation");
	assert_eq!(slots.resolve(a, a_gen), None, "Stale generation must not resolve");
	assert_eq!(slots.resolve(c, c_gen), Some(entry(0, 2)));
	assert_eq!(slots.resolve(b, 0), Some(entry(0, 1)));
	assert_eq!(slots.len(), 2);
}

#[test]
pub fn free_list_is_last_in_first_out() {
	let mut slots = SlotTable::new();
	let handles: Vec<_> = (0..4).map(|i| slots.allocate(entry(0, i)).unwrap()).collect();

	for (index, generation) in handles.iter() {
		slots.free(*index, *generation);
	}

	let reused: Vec<u32> = (0..4).map(|i| slots.allocate(entry(1, i)).unwrap().0).collect();
	assert_eq!(reused, [3, 2, 1, 0], "Released indices must be reused most recent first");
}

#[test]
pub fn invalidated_slots_stay_reserved_until_released() {
	let mut slots = SlotTable::new();
	let (a, a_gen) = slots.allocate(entry(0, 0)).unwrap();

	assert!(slots.invalidate(a, a_gen));
	assert_eq!(slots.resolve(a, a_gen), None);
	assert_eq!(slots.len(), 0);

	// Still reserved, so a new allocation gets a fresh index
	let (b, _) = slots.allocate(entry(0, 1)).unwrap();
	assert_ne!(a, b);

	slots.update(a, entry(3, 3));
	assert_eq!(slots.entry(a), Some(entry(3, 3)), "Invalidated slots must still track their record");

	slots.release(a);
	let (c, c_gen) = slots.allocate(entry(0, 2)).unwrap();
	assert_eq!(c, a);
	assert_eq!(c_gen, a_gen + 1);
}

#[test]
pub fn update_keeps_the_generation() {
	let mut slots = SlotTable::new();
	let (a, a_gen) = slots.allocate(entry(0, 5)).unwrap();
	slots.update(a, entry(2, 1));

	assert_eq!(slots.generation(a), Some(a_gen));
	assert_eq!(slots.resolve(a, a_gen), Some(entry(2, 1)));
}

#[test]
pub fn generations_wrap_around() {
	let mut slots = SlotTable::new();
	let (index, mut generation) = slots.allocate(entry(0, 0)).unwrap();

	for _ in 0..u16::MAX {
		slots.free(index, generation);
		let (reused, next) = slots.allocate(entry(0, 0)).unwrap();
		assert_eq!(reused, index);
		generation = next;
	}

	assert_eq!(generation, u16::MAX);
	slots.free(index, generation);
	let (_, wrapped) = slots.allocate(entry(0, 0)).unwrap();
	assert_eq!(wrapped, 0, "Generation must wrap around to 0");
}

#[test]
pub fn out_of_range_indices_never_resolve() {
	let slots = SlotTable::new();
	assert_eq!(slots.resolve(0, 0), None);
	assert_eq!(slots.resolve(u32::MAX, 0), None);
	assert!(!slots.contains_index(0));
}

#[test]
pub fn bit_field_tracks_ones() {
	let mut bits = BitField::new();
	assert!(!bits.get(1000), "Bits beyond capacity must read as false");

	assert!(!bits.set(3, true));
	assert!(!bits.set(130, true));
	assert!(bits.set(3, true), "Setting a bit must return its previous value");
	assert_eq!(bits.count_ones(), 2);

	assert!(bits.set(3, false));
	assert!(!bits.set(3, false), "Clearing a cleared bit must not change the count");
	assert_eq!(bits.count_ones(), 1);
	assert!(!bits.get(3));
	assert!(bits.get(130));

	assert!(!bits.set(5000, false), "Clearing beyond capacity is a no-op");
	assert_eq!(bits.count_ones(), 1);
}
