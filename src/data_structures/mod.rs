//! Storage building blocks shared by all [component managers](crate::components::ComponentManager).

mod bit_field;
mod slot_table;
mod block_storage;

pub use bit_field::*;
pub use slot_table::*;
pub use block_storage::*;
