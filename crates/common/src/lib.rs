//! Common utilities used across the evmstate workspace.
//!
//! This crate provides hex helpers, a scoped fan-out worker pool used by state commitment, and
//! small file io helpers shared by the configuration and cli crates.

/// General utility functions and types for common tasks.
pub mod utils;
