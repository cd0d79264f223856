use super::strings::encode_hex;
use alloy::primitives::{Address, Bytes, B256, U256};

/// A convenience trait which encodes a given EVM type into a `0x`-prefixed, lowercase hex string.
pub trait ToLowerHex {
    /// Formats `self` as lowercase hex.
    fn to_lower_hex(&self) -> String;
}

impl ToLowerHex for Bytes {
    fn to_lower_hex(&self) -> String {
        format!("0x{}", encode_hex(self))
    }
}

impl ToLowerHex for Vec<u8> {
    fn to_lower_hex(&self) -> String {
        format!("0x{}", encode_hex(self))
    }
}

impl ToLowerHex for U256 {
    fn to_lower_hex(&self) -> String {
        format!("{self:#x}")
    }
}

impl ToLowerHex for B256 {
    fn to_lower_hex(&self) -> String {
        format!("{self:#x}")
    }
}

impl ToLowerHex for Address {
    fn to_lower_hex(&self) -> String {
        format!("{self:#x}")
    }
}
