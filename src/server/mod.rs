//! HTTP API: method dispatch, envelope, signal log.
//!
//! CHANGELOG:
//! - 29/10/2025 - Replaced the socket daemon with an HTTP server

pub mod http;
pub mod protocol;
pub mod service;
pub mod signals;

pub use protocol::Response;
pub use service::{Params, Service, ServiceError, ServiceOptions};
