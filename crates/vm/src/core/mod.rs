/// A single ledger entry
pub mod account;

/// Memory growth ahead of memory-touching instructions
pub mod advisor;

/// Loading a world state from a JSON account allocation
pub mod alloc;

/// Hashing and canonical encoding used by state commitment
pub mod codec;

/// Folding a world state into a state root
pub mod commit;

/// Log implementation for event handling
pub mod log;

/// Byte-addressable execution memory
pub mod memory;

/// Opcode constants for the instructions the advisor understands
pub mod opcodes;

/// Operand stack and the read-only peek interface
pub mod stack;

/// The world state: accounts, logs and the refund counter
pub mod storage;

/// The authenticated key/value trie used for commitment
pub mod trie;
