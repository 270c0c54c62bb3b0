//! Test helpers module
//!
//! Shared fixtures for the integration tests: generated request data, an
//! in-memory service context and a Postgres container for store tests.

#![allow(dead_code)]

pub mod database_helper;
pub mod test_context;
pub mod test_data;

pub use database_helper::*;
pub use test_context::*;
pub use test_data::*;
