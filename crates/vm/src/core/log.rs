use alloy::primitives::{Address, Bytes, B256};

/// The [`Log`] struct represents a log emitted by a `LOG0-LOG4` opcode.
///
/// The world state only stores logs and hands them back in emission order; it never inspects
/// them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Log {
    /// The account which emitted the log.
    pub address: Address,
    /// Up to four indexed topics.
    pub topics: Vec<B256>,
    /// The unindexed payload.
    pub data: Bytes,
}

impl Log {
    /// Creates a new [`Log`] with the given emitter, topics, and data.
    pub fn new(address: Address, topics: Vec<B256>, data: &[u8]) -> Log {
        Log { address, topics, data: Bytes::copy_from_slice(data) }
    }
}
