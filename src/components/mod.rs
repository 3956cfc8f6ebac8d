mod component_type;
mod component_handle;
mod component_manager;
mod manager_factory;
mod user_data;

pub use component_type::*;
pub use component_handle::*;
pub use component_manager::*;
pub use manager_factory::*;
pub use user_data::*;
pub use turbo_world_derive::Component;

pub(crate) use component_manager::ComponentRecord;
