use alloy::primitives::{keccak256, Bytes, B256, U256};
use alloy_rlp::{BufMut, Encodable, Header};

/// A deterministic, collision-resistant digest used for code hashing.
pub trait Hasher: Send + Sync {
    /// Hashes `data` to a 32-byte digest.
    fn hash(&self, data: &[u8]) -> B256;
}

/// keccak-256, as used throughout Ethereum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Keccak256;

impl Hasher for Keccak256 {
    fn hash(&self, data: &[u8]) -> B256 {
        keccak256(data)
    }
}

/// The values an [`Encoder`] can serialize: integers, byte strings, and ordered lists of either.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RlpItem {
    /// An unsigned integer, encoded big-endian without leading zeros.
    Uint(U256),
    /// An opaque byte string.
    Bytes(Bytes),
    /// An ordered list of items.
    List(Vec<RlpItem>),
}

impl RlpItem {
    fn payload_length(items: &[RlpItem]) -> usize {
        items.iter().map(Encodable::length).sum()
    }
}

impl From<U256> for RlpItem {
    fn from(value: U256) -> Self {
        RlpItem::Uint(value)
    }
}

impl From<B256> for RlpItem {
    fn from(value: B256) -> Self {
        RlpItem::Bytes(Bytes::copy_from_slice(value.as_slice()))
    }
}

impl From<Bytes> for RlpItem {
    fn from(value: Bytes) -> Self {
        RlpItem::Bytes(value)
    }
}

impl Encodable for RlpItem {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            RlpItem::Uint(value) => {
                <[u8] as Encodable>::encode(&value.to_be_bytes_trimmed_vec(), out)
            }
            RlpItem::Bytes(bytes) => <[u8] as Encodable>::encode(bytes, out),
            RlpItem::List(items) => {
                Header { list: true, payload_length: RlpItem::payload_length(items) }.encode(out);
                for item in items {
                    item.encode(out);
                }
            }
        }
    }

    fn length(&self) -> usize {
        match self {
            RlpItem::Uint(value) => <[u8] as Encodable>::length(&value.to_be_bytes_trimmed_vec()),
            RlpItem::Bytes(bytes) => <[u8] as Encodable>::length(bytes),
            RlpItem::List(items) => {
                let payload_length = RlpItem::payload_length(items);
                payload_length + alloy_rlp::length_of_length(payload_length)
            }
        }
    }
}

/// A deterministic, canonical serialization of [`RlpItem`]s.
pub trait Encoder: Send + Sync {
    /// Serializes `item`.
    fn encode(&self, item: &RlpItem) -> Vec<u8>;
}

/// Recursive-length-prefix encoding, backed by `alloy-rlp`.
///
/// ```
/// use alloy::primitives::U256;
/// use evmstate_vm::core::codec::{Encoder, RlpEncoder, RlpItem};
///
/// let encoded = RlpEncoder.encode(&RlpItem::List(vec![
///     RlpItem::Uint(U256::ZERO),
///     RlpItem::Uint(U256::from(0x0400)),
/// ]));
/// assert_eq!(encoded, vec![0xc4, 0x80, 0x82, 0x04, 0x00]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RlpEncoder;

impl Encoder for RlpEncoder {
    fn encode(&self, item: &RlpItem) -> Vec<u8> {
        let mut out = Vec::with_capacity(item.length());
        item.encode(&mut out);
        out
    }
}
