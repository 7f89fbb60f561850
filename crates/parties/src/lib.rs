//! Parties taking part in a fiscal document: the issuing company (emitter)
//! and the buyer (customer).
//!
//! Plain validated records; registration CRUD lives outside this workspace.

pub mod address;
pub mod customer;
pub mod emitter;
pub mod tax_id;

pub use address::Address;
pub use customer::Customer;
pub use emitter::Emitter;
pub use tax_id::TaxId;
