//! Execution-state core for an EVM-style interpreter.
//!
//! This crate provides the byte-addressable execution memory, the advisor which grows it ahead of
//! memory-touching instructions, the account ledger with snapshot/revert, and the state commitment
//! which folds the ledger into a single root digest.

/// Core components: memory, stack, world state and state commitment
pub mod core;

/// The error type shared by every component
pub mod error;

pub use error::{Error, Result};
