/// Hexadecimal formatting of EVM types.
pub mod hex;

/// Input/output utilities for file manipulation.
pub mod io;

/// Hex string encoding and decoding.
pub mod strings;

/// Threading and multi-threading utilities.
pub mod threading;
