//! HTTP API: routing, tenant context, and request/response mapping over the
//! NF-e emission service.

pub mod app;
pub mod context;
pub mod middleware;
