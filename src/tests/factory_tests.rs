use crate::components::{Component, ComponentManager, ComponentManagerFactory, ComponentTypeId};
use crate::config::WorldConfig;
use crate::error::WorldError;

#[derive(Component, Default)]
struct Mass {
	_kilograms: f32,
}

#[derive(Component, Default)]
#[component(compact)]
struct Charge {
	_coulombs: f32,
}

#[derive(Component, Default)]
struct Spin {
	_value: i8,
}

#[test]
pub fn ids_are_sequential() {
	let mut factory = ComponentManagerFactory::new();
	assert!(factory.is_empty());

	assert_eq!(factory.register::<Mass>().unwrap().value(), 0);
	assert_eq!(factory.register::<Charge>().unwrap().value(), 1);
	assert_eq!(factory.register::<Spin>().unwrap().value(), 2);
	assert_eq!(factory.len(), 3);
}

#[test]
pub fn duplicate_registration_fails() {
	let mut factory = ComponentManagerFactory::new();
	let id = factory.register::<Mass>().unwrap();

	assert!(matches!(factory.register::<Mass>(), Err(WorldError::DuplicateType(_))));
	assert_eq!(factory.register_type::<Mass>().unwrap(), id, "register_type must return the existing id");
	assert_eq!(factory.len(), 1);
}

#[test]
pub fn lookup_by_type_and_name() {
	let mut factory = ComponentManagerFactory::new();
	factory.register::<Mass>().unwrap();
	let id = factory.register::<Charge>().unwrap();

	let name = std::any::type_name::<Charge>();
	assert_eq!(factory.type_id(std::any::TypeId::of::<Charge>()), Some(id));
	assert_eq!(factory.type_id_by_name(name), Some(id));
	assert_eq!(factory.type_name(id), Some(name));
	assert_eq!(factory.type_id(std::any::TypeId::of::<Spin>()), None);
}

#[test]
pub fn managers_are_created_by_id() {
	let mut factory = ComponentManagerFactory::new();
	let id = factory.register::<Charge>().unwrap();

	let mut manager = factory.create(id, &WorldConfig::default()).unwrap();
	assert_eq!(manager.component_type_id(), id);
	assert_eq!(manager.component_type_name(), std::any::type_name::<Charge>());

	manager.allocate_component().unwrap();
	assert_eq!(manager.component_count(), 1);

	let typed = manager.as_any().downcast_ref::<ComponentManager<Charge>>().unwrap();
	assert!(typed.is_compact(), "#[component(compact)] must select compact storage");

	let unknown = ComponentTypeId::from_value(42);
	assert!(matches!(
		factory.create(unknown, &WorldConfig::default()),
		Err(WorldError::UnknownComponentType(_))
	));
}

#[test]
pub fn managers_are_not_created_from_invalid_config() {
	let mut factory = ComponentManagerFactory::new();
	let id = factory.register::<Mass>().unwrap();

	let config = WorldConfig {
		block_capacity: 0,
		..WorldConfig::default()
	};
	assert!(matches!(factory.create(id, &config), Err(WorldError::InvalidConfig(_))));
}

#[test]
pub fn ambiguous_names_resolve_to_the_first_type() {
	let mut factory = ComponentManagerFactory::new();

	let (first, first_name) = {
		#[derive(Component, Default)]
		struct Shadowed;
		(factory.register::<Shadowed>().unwrap(), std::any::type_name::<Shadowed>())
	};
	let (second, second_name) = {
		#[derive(Component, Default)]
		struct Shadowed;
		(factory.register::<Shadowed>().unwrap(), std::any::type_name::<Shadowed>())
	};

	assert_eq!(first_name, second_name, "Both types must share a name");
	assert_ne!(first, second);
	assert_eq!(factory.type_id_by_name(first_name), Some(first), "The first type must keep its name");
	assert_eq!(factory.type_name(second), Some(second_name));
	assert_eq!(factory.len(), 2);
}

#[test]
pub fn global_ids_are_stable() {
	let id = ComponentTypeId::of::<Spin>();
	assert_eq!(ComponentManagerFactory::type_id_of::<Spin>(), id);
	assert_eq!(Spin::component_type_id(), id);
	assert_ne!(ComponentTypeId::of::<Mass>(), id);

	let factory = ComponentManagerFactory::global().read();
	assert_eq!(factory.type_name(id), Some(std::any::type_name::<Spin>()));
	assert!(!Spin::COMPACT_STORAGE);
}
