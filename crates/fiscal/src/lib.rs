//! Fiscal document (NF-e) domain: provider wire schema, the sale-to-document
//! mapper and the emission state machine.
//!
//! Everything here is deterministic domain logic (no IO, no HTTP, no storage).
//! Network calls live in `fiscoerp-focus`; orchestration in `fiscoerp-infra`.

pub mod document;
pub mod emission;
pub mod mapper;
pub mod provider;
pub mod status;

pub use document::{DocumentItem, EmissionRequest};
pub use emission::{
    EmissionCommand, EmissionEvent, EmissionEventKind, EmissionRecord, EmissionUpdate,
    ReferenceId, MIN_JUSTIFICATION_CHARS, MAX_JUSTIFICATION_CHARS, validate_justification,
};
pub use mapper::map_sale_to_document;
pub use provider::{ArtifactKind, ProviderResult};
pub use status::{EmissionStatus, ProviderOutcome, ProviderStatus};
