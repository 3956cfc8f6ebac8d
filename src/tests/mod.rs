mod component_manager_tests;
mod config_tests;
mod factory_tests;
mod slot_table_tests;
