//! Infrastructure layer: emission registry, fiscal data source, the
//! per-reference in-flight guard and the `EmissionService` that drives an
//! emission through the Focus NFe client.

pub mod config;
pub mod error;
pub mod in_flight;
pub mod registry;
pub mod service;
pub mod source;

pub use config::EmissionServiceConfig;
pub use error::EmissionError;
pub use registry::{EmissionRegistry, InMemoryEmissionRegistry, RegistryError};
pub use service::EmissionService;
pub use source::{FiscalDataSource, InMemoryFiscalSource, SourceError};
