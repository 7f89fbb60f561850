//! Sale records as handed over by the sales module.
//!
//! The fiscal core only reads these; quoting, order entry and installments
//! are handled elsewhere.

pub mod sale;

pub use sale::{Sale, SaleId, SaleItem};
