use std::collections::BTreeMap;

use alloy::primitives::{Address, Bytes, B256, U256};
use evmstate_common::utils::strings::{decode_hex, decode_hex_padded};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::storage::WorldState;

/// A balance or nonce, written either as a JSON number or as a hex (`0x`-prefixed) or decimal
/// string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    /// A plain JSON number.
    Number(u64),
    /// A hex or decimal string.
    Text(String),
}

impl Quantity {
    /// Parses the quantity into a [`U256`].
    pub fn to_u256(&self) -> Result<U256> {
        match self {
            Quantity::Number(value) => Ok(U256::from(*value)),
            Quantity::Text(text) => parse_quantity(text),
        }
    }
}

/// The initial contents of a single account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocAccount {
    /// The starting balance, zero if absent.
    pub balance: Option<Quantity>,
    /// The starting nonce, zero if absent.
    pub nonce: Option<Quantity>,
    /// Hex-encoded bytecode.
    pub code: Option<String>,
    /// Hex-encoded storage slots. Keys are left-padded to 32 bytes; values are kept byte for
    /// byte, and an empty value (`"0x"`) leaves the slot unset.
    pub storage: BTreeMap<String, String>,
}

/// A mapping of hex addresses to their initial account contents.
pub type Alloc = BTreeMap<String, AllocAccount>;

fn parse_quantity(text: &str) -> Result<U256> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some("") => Ok(U256::ZERO),
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(text, 10),
    };

    parsed.map_err(|e| Error::Alloc(format!("invalid quantity '{text}': {e}")))
}

fn parse_address(text: &str) -> Result<Address> {
    decode_hex_padded(text, 20)
        .map(|bytes| Address::from_slice(&bytes))
        .map_err(|e| Error::Alloc(format!("invalid address '{text}': {e}")))
}

fn parse_slot(text: &str) -> Result<B256> {
    decode_hex_padded(text, 32)
        .map(|bytes| B256::from_slice(&bytes))
        .map_err(|e| Error::Alloc(format!("invalid storage key '{text}': {e}")))
}

fn parse_slot_value(text: &str) -> Result<Bytes> {
    decode_hex(text)
        .map(Bytes::from)
        .map_err(|e| Error::Alloc(format!("invalid storage value '{text}': {e}")))
}

impl WorldState {
    /// Builds a [`WorldState`] from an allocation. Accounts are created in ascending address
    /// order; storage slots with empty values are dropped.
    pub fn from_alloc(alloc: &Alloc) -> Result<WorldState> {
        let mut state = WorldState::new();

        for (address, account) in alloc {
            let address = parse_address(address)?;
            state.create_account(address);

            if let Some(balance) = &account.balance {
                state.add_balance(address, balance.to_u256()?)?;
            }
            if let Some(nonce) = &account.nonce {
                state.set_nonce(address, nonce.to_u256()?);
            }
            if let Some(code) = &account.code {
                let code = decode_hex(code)
                    .map_err(|e| Error::Alloc(format!("invalid code for {address}: {e}")))?;
                state.set_code(address, Bytes::from(code));
            }
            for (key, value) in &account.storage {
                let value = parse_slot_value(value)?;
                if value.is_empty() {
                    continue;
                }
                state.set_storage_value(address, parse_slot(key)?, value);
            }
        }

        debug!("loaded {} accounts from allocation", state.len());
        Ok(state)
    }
}

/// Parses a JSON allocation and builds the corresponding [`WorldState`].
///
/// ```
/// use alloy::primitives::{Address, U256};
/// use evmstate_vm::core::alloc::load_alloc;
///
/// let state = load_alloc(r#"{
///     "0x0000000000000000000000000000000000000001": { "balance": "0x10", "nonce": 1 }
/// }"#).unwrap();
///
/// assert_eq!(state.get_balance(&Address::with_last_byte(1)), U256::from(16));
/// ```
pub fn load_alloc(json: &str) -> Result<WorldState> {
    let alloc: Alloc =
        serde_json::from_str(json).map_err(|e| Error::Alloc(format!("malformed json: {e}")))?;
    WorldState::from_alloc(&alloc)
}
