//! SQLite access to the profile catalog.
//!
//! CHANGELOG:
//! - 28/10/2025 - Initial module structure

pub mod connection;
pub mod helpers;
pub mod queries;

pub use connection::{open_catalog, open_in_memory};
pub use helpers::{CatalogProfile, ListOrder, ProfileUpdate};
