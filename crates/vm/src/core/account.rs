use alloy::primitives::{Address, Bytes, B256, U256};
use hashbrown::HashMap;

/// A single ledger entry.
///
/// Storage never holds empty values: writing an empty value through
/// [`WorldState::set_storage_value`](super::storage::WorldState::set_storage_value) removes the
/// key instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Account {
    /// The 20-byte account address.
    pub address: Address,
    /// The account's bytecode.
    pub code: Bytes,
    /// The transaction / creation counter.
    pub nonce: U256,
    /// The account balance in wei.
    pub balance: U256,
    /// Marks the account for removal when the state is committed.
    pub suicided: bool,
    /// The account's key/value storage.
    pub storage: HashMap<B256, Bytes>,
}

impl Account {
    /// Creates a zero-valued account at `address`.
    ///
    /// ```
    /// use alloy::primitives::Address;
    /// use evmstate_vm::core::account::Account;
    ///
    /// let account = Account::new(Address::repeat_byte(0x01));
    /// assert!(account.is_empty());
    /// ```
    pub fn new(address: Address) -> Account {
        Account { address, ..Default::default() }
    }

    /// An account is empty when its nonce and balance are zero and it has no code. Storage is
    /// not considered.
    pub fn is_empty(&self) -> bool {
        self.nonce.is_zero() && self.balance.is_zero() && self.code.is_empty()
    }

    /// Whether the account survives state commitment: it must be neither empty nor suicided.
    pub fn is_committable(&self) -> bool {
        !(self.is_empty() || self.suicided)
    }
}
