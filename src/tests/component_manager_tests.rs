use crate::components::{Component, ComponentHandle, ComponentManager, ComponentTypeId, UserData};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use paste::paste;
use crate::config::WorldConfig;
use crate::error::WorldError;

#[derive(Component, Default, Debug, PartialEq)]
struct Position {
	x: f32,
	y: f32,
	z: f32,
}

#[derive(Component, Default, Debug, PartialEq)]
#[component(compact)]
struct Velocity {
	value: u32,
}

#[derive(Component, Default, Debug, PartialEq)]
struct Counter {
	value: u32,
}

#[derive(Default)]
struct Tracked {
	handle: ComponentHandle,
}

#[derive(Default)]
struct TrackedLog {
	live: Vec<ComponentHandle>,
	reclaimed: usize,
}

impl Component for Tracked {
	const COMPACT_STORAGE: bool = true;

	fn on_initialize(&mut self, handle: ComponentHandle, user_data: &mut UserData) {
		self.handle = handle;
		user_data.get_or_insert_with(TrackedLog::default).live.push(handle);
	}

	fn on_deinitialize(&mut self, handle: ComponentHandle, user_data: &mut UserData) {
		if let Some(log) = user_data.get_mut::<TrackedLog>() {
			log.live.retain(|live| *live != handle);
		}
	}

	fn on_delete_dead(&mut self, user_data: &mut UserData) {
		if let Some(log) = user_data.get_mut::<TrackedLog>() {
			log.reclaimed += 1;
		}
	}
}

fn manager<C: Component>(block_capacity: usize) -> ComponentManager<C> {
	let config = WorldConfig {
		block_capacity,
		..WorldConfig::default()
	};
	ComponentManager::new(C::component_type_id(), &config)
}

#[test]
pub fn create_and_get() {
	let mut positions = manager::<Position>(8);
	let (handle, position) = positions.create_component().unwrap();
	assert_eq!(*position, Position::default(), "New components must be default-initialized");
	position.x = 1.0;

	assert_eq!(handle.type_id(), ComponentTypeId::of::<Position>());
	assert_eq!(positions.get_component(handle).unwrap().x, 1.0);
	assert!(positions.is_valid_component(handle));
	assert_eq!(positions.component_count(), 1);
}

#[test]
pub fn deleted_components_are_invisible_before_flush() {
	let mut positions = manager::<Position>(8);
	let handles: Vec<_> = (0..4).map(|_| positions.create_component().unwrap().0).collect();

	positions.delete_component(handles[2]).unwrap();

	assert!(!positions.is_valid_component(handles[2]));
	assert!(matches!(positions.get_component(handles[2]), Err(WorldError::NotFound(_))));
	assert_eq!(positions.component_count(), 3);
	assert_eq!(positions.pending_deletions(), 1);
	assert_eq!(positions.storage_len(), 4, "Storage is only reclaimed on flush");
	assert_eq!(positions.components().count(), 3, "Dead components must not be iterated");

	assert_eq!(positions.flush_dead_components(), 1);
	assert_eq!(positions.pending_deletions(), 0);
	assert_eq!(positions.component_count(), 3);
}

#[test]
pub fn deleting_twice_fails() {
	let mut positions = manager::<Position>(8);
	let (handle, _) = positions.create_component().unwrap();

	positions.delete_component(handle).unwrap();
	assert!(matches!(positions.delete_component(handle), Err(WorldError::NotFound(_))));

	positions.flush_dead_components();
	assert!(matches!(positions.delete_component(handle), Err(WorldError::NotFound(_))));
}

#[test]
pub fn stale_handles_are_rejected_after_slot_reuse() {
	let mut positions = manager::<Position>(8);
	let (old, _) = positions.create_component().unwrap();
	positions.delete_component(old).unwrap();
	positions.flush_dead_components();

	let (new, position) = positions.create_component().unwrap();
	position.y = 5.0;

	assert_eq!(new.index(), old.index(), "Released slot was not reused");
	assert_ne!(new.generation(), old.generation(), "Reused slot must have a new generation");
	assert!(positions.try_get_component(old).is_none(), "Stale handle must not resolve");
	assert_eq!(positions.try_get_component(new).map(|p| p.y), Some(5.0));
}

#[test]
pub fn invalid_handles_are_rejected() {
	let mut positions = manager::<Position>(8);
	positions.create_component().unwrap();

	assert!(matches!(
		positions.get_component(ComponentHandle::INVALID),
		Err(WorldError::InvalidHandle(_))
	));

	let out_of_range = ComponentHandle::new(1000, 0, ComponentTypeId::of::<Position>());
	assert!(matches!(positions.get_component(out_of_range), Err(WorldError::InvalidHandle(_))));

	let mut velocities = manager::<Velocity>(8);
	let (velocity, _) = velocities.create_component().unwrap();
	assert!(matches!(
		positions.delete_component(velocity),
		Err(WorldError::TypeMismatch { .. })
	));
	assert!(velocities.is_valid_component(velocity), "A rejected deletion must not touch the component");
}

#[test]
pub fn handles_survive_compaction() {
	let mut velocities = manager::<Velocity>(16);
	assert!(velocities.is_compact());

	let mut handles: Vec<(ComponentHandle, u32)> = (0..500)
		.map(|i| {
			let (handle, velocity) = velocities.create_component().unwrap();
			velocity.value = i;
			(handle, i)
		})
		.collect();

	let mut rng = StdRng::seed_from_u64(0x5eed);
	handles.shuffle(&mut rng);
	let (deleted, kept) = handles.split_at(250);

	for (handle, _) in deleted.iter() {
		velocities.delete_component(*handle).unwrap();
	}
	assert_eq!(velocities.flush_dead_components(), 250);
	assert_eq!(velocities.storage_len(), 250, "Compact storage must have no holes after a flush");

	for (handle, value) in kept.iter() {
		assert_eq!(
			velocities.get_component(*handle).map(|v| v.value).ok(),
			Some(*value),
			"Handle resolved to the wrong component after compaction"
		);
	}
	for (handle, _) in deleted.iter() {
		assert!(!velocities.is_valid_component(*handle));
	}
}

#[test]
pub fn deleting_the_last_and_a_middle_component_together() {
	let mut velocities = manager::<Velocity>(4);
	let handles: Vec<_> = (0..5)
		.map(|i| {
			let (handle, velocity) = velocities.create_component().unwrap();
			velocity.value = i;
			handle
		})
		.collect();

	// The dead last record is moved into the first hole before it is reclaimed itself
	velocities.delete_component(handles[1]).unwrap();
	velocities.delete_component(handles[4]).unwrap();
	velocities.flush_dead_components();

	assert_eq!(velocities.storage_len(), 3);
	for i in [0, 2, 3] {
		assert_eq!(velocities.get_component(handles[i]).unwrap().value, i as u32);
	}
}

#[test]
pub fn sparse_components_never_move() {
	let mut positions = manager::<Position>(4);
	assert!(!positions.is_compact());

	let handles: Vec<_> = (0..12).map(|_| positions.create_component().unwrap().0).collect();
	let watched = handles[9];
	let address = positions.get_component(watched).unwrap() as *const Position;
	let position = positions.storage_position(watched);

	for handle in handles.iter().filter(|handle| **handle != watched) {
		positions.delete_component(*handle).unwrap();
	}
	positions.flush_dead_components();
	for _ in 0..20 {
		positions.create_component().unwrap();
	}

	assert!(std::ptr::eq(positions.get_component(watched).unwrap(), address), "Sparse components must not move");
	assert_eq!(positions.storage_position(watched), position);
}

#[test]
pub fn lifecycle_hooks_see_user_data() {
	let mut tracked = manager::<Tracked>(4);
	let handles: Vec<_> = (0..6).map(|_| tracked.create_component().unwrap().0).collect();

	for handle in handles.iter() {
		assert_eq!(tracked.get_component(*handle).unwrap().handle, *handle, "on_initialize must receive the handle");
	}

	tracked.delete_component(handles[0]).unwrap();
	tracked.delete_component(handles[3]).unwrap();
	{
		let log = tracked.user_data().get::<TrackedLog>().unwrap();
		assert_eq!(log.live, [handles[1], handles[2], handles[4], handles[5]]);
		assert_eq!(log.reclaimed, 0, "Nothing is reclaimed before a flush");
	}

	tracked.flush_dead_components();
	assert_eq!(tracked.user_data().get::<TrackedLog>().unwrap().reclaimed, 2);
}

#[test]
pub fn iteration_with_handles() {
	let mut velocities = manager::<Velocity>(4);
	let handles: Vec<_> = (0..10)
		.map(|i| {
			let (handle, velocity) = velocities.create_component().unwrap();
			velocity.value = i;
			handle
		})
		.collect();
	velocities.delete_component(handles[7]).unwrap();

	let mut seen: Vec<_> = velocities.iter_with_handles().map(|(handle, v)| (handle, v.value)).collect();
	seen.sort();

	let expected: Vec<_> = (0..10u32).filter(|i| *i != 7).map(|i| (handles[i as usize], i)).collect();
	assert_eq!(seen, expected);
}

#[test]
pub fn batches_skip_dead_components() {
	let mut velocities = manager::<Velocity>(8);
	let handles: Vec<_> = (0..20).map(|_| velocities.create_component().unwrap().0).collect();
	velocities.delete_component(handles[3]).unwrap();
	velocities.delete_component(handles[11]).unwrap();

	let mut batches = velocities.batches_mut(6);
	assert_eq!(batches.len(), 4, "Expected ceil(20 / 6) batches");

	let visited: usize = batches.iter_mut().map(|batch| batch.iter_mut().map(|v| v.value += 1).count()).sum();
	assert_eq!(visited, 18);
}

macro_rules! handle_stability_tests {
	($name: ident, $component: ty, $block_capacity: expr) => {
		paste! {
			#[test]
			pub fn [<$name _handles_are_stable_across_random_operations>]() {
				let mut components = manager::<$component>($block_capacity);
				let mut rng = StdRng::seed_from_u64(7);
				let mut live: HashMap<ComponentHandle, u32> = HashMap::new();
				let mut deleted: Vec<ComponentHandle> = Vec::new();

				for step in 0..4000u32 {
					if live.is_empty() || rng.gen_bool(0.6) {
						let (handle, component) = components.create_component().unwrap();
						component.value = step;
						assert!(live.insert(handle, step).is_none(), "Live handles must be unique");
					} else {
						let handle = *live.keys().nth(rng.gen_range(0..live.len())).unwrap();
						live.remove(&handle);
						components.delete_component(handle).unwrap();
						deleted.push(handle);
					}

					if step % 97 == 0 {
						components.flush_dead_components();
					}
				}
				components.flush_dead_components();

				assert_eq!(components.component_count(), live.len());
				for (handle, value) in live.iter() {
					assert_eq!(components.get_component(*handle).map(|c| c.value).ok(), Some(*value));
				}
				for handle in deleted.iter() {
					assert!(!components.is_valid_component(*handle), "Deleted handles must stay invalid");
				}
			}
		}
	};
}

handle_stability_tests!(compact, Velocity, 16);
handle_stability_tests!(sparse, Counter, 16);
