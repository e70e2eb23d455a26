//! Command implementations.
//!
//! CHANGELOG:
//! - 14/11/2025 - Catalog backup
//! - 30/10/2025 - Reports and catalog commands

pub mod catalog;
pub mod logs;
pub mod reports;
