//! Document Registry boundary.
//!
//! The persistence layer that owns Emission Records. The service only talks
//! to it through `EmissionRegistry`, so any storage can sit behind it.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEmissionRegistry;
pub use r#trait::{EmissionRegistry, RegistryError};
