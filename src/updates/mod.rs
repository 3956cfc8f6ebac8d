//! Update functions and the scheduler that orders them.

mod phase;
mod scheduler;
mod update_function;

pub use phase::*;
pub use scheduler::*;
pub use update_function::*;
