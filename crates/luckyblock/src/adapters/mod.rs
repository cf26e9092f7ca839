//! Adapters layer (Hexagonal Architecture)

mod event_bus;
mod memory_store;

pub use event_bus::*;
pub use memory_store::*;
