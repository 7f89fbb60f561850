//! # fiscoerp-focus
//!
//! HTTP adapter to the Focus NFe API: Basic-Auth, JSON status records,
//! binary artifact download and translation of provider failures into
//! `FocusError`.
//!
//! The only crate that talks to the provider. Callers decide what a
//! failure means for the emission; this crate only classifies it
//! (`FocusError::is_unknown_outcome` separates "rejected" from "unreachable").

pub mod client;
pub mod config;
pub mod error;

pub use client::FocusClient;
pub use config::{ConfigError, FocusConfig, FocusEnvironment};
pub use error::FocusError;
