use alloy::primitives::{Address, U256};

/// The fault raised by the execution-state core.
///
/// Every variant is fatal to the instruction that raised it; the dispatch loop decides whether
/// to revert to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A write touched bytes past the end of the memory buffer.
    #[error("invalid memory access: {size} bytes at offset {offset} exceeds memory length {length}")]
    InvalidMemoryAccess {
        /// The first byte of the write.
        offset: usize,
        /// The declared write size.
        size: usize,
        /// The buffer length at the time of the write.
        length: usize,
    },

    /// A write value did not match the declared write size.
    #[error("invalid memory access: declared size {size} but value is {value_len} bytes")]
    MemorySizeMismatch {
        /// The declared write size.
        size: usize,
        /// The length of the supplied value.
        value_len: usize,
    },

    /// An instruction requires more memory than the configured maximum.
    #[error("memory limit exceeded: offset {offset} + length {length} is past the limit of {limit} bytes")]
    MemoryLimitExceeded {
        /// The offset operand of the instruction.
        offset: U256,
        /// The length operand of the instruction.
        length: U256,
        /// The maximum addressable memory size.
        limit: usize,
    },

    /// More values were popped than the operand stack holds.
    #[error("stack underflow: tried to pop {requested} values from a stack of depth {depth}")]
    StackUnderflow {
        /// The number of values requested.
        requested: usize,
        /// The stack depth at the time of the pop.
        depth: usize,
    },

    /// A refund subtraction would drive the refund counter negative.
    #[error("refund counter below zero: tried to subtract {requested} from {available}")]
    RefundUnderflow {
        /// The amount requested.
        requested: U256,
        /// The current counter value.
        available: U256,
    },

    /// A balance subtraction would drive an account balance negative.
    #[error("balance underflow for {address}: tried to subtract {requested} from {available}")]
    BalanceUnderflow {
        /// The account being debited.
        address: Address,
        /// The amount requested.
        requested: U256,
        /// The current balance.
        available: U256,
    },

    /// A balance addition would exceed the integer domain.
    #[error("balance overflow for {address}: adding {amount} to {balance}")]
    BalanceOverflow {
        /// The account being credited.
        address: Address,
        /// The amount being added.
        amount: U256,
        /// The current balance.
        balance: U256,
    },

    /// An error reported by a trie collaborator.
    #[error("trie error: {0}")]
    Trie(String),

    /// A malformed account allocation.
    #[error("invalid allocation: {0}")]
    Alloc(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
