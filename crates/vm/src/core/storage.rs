use alloy::primitives::{Address, Bytes, B256, U256};
use hashbrown::HashMap;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

use super::{account::Account, log::Log};

/// The account mapping, remembering the order in which addresses were first inserted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Accounts {
    entries: HashMap<Address, Account>,
    order: Vec<Address>,
}

impl Accounts {
    fn get(&self, address: &Address) -> Option<&Account> {
        self.entries.get(address)
    }

    fn get_mut(&mut self, address: &Address) -> Option<&mut Account> {
        self.entries.get_mut(address)
    }

    /// Inserts `account`, replacing any existing entry. A replaced address keeps its original
    /// position in the insertion order.
    fn insert(&mut self, account: Account) {
        let address = account.address;
        if self.entries.insert(address, account).is_none() {
            self.order.push(address);
        }
    }

    fn get_or_create(&mut self, address: Address) -> &mut Account {
        let Accounts { entries, order } = self;
        entries.entry(address).or_insert_with(|| {
            trace!("creating account {}", address);
            order.push(address);
            Account::new(address)
        })
    }

    /// Accounts in insertion order.
    fn iter(&self) -> impl Iterator<Item = &Account> {
        self.order.iter().filter_map(|address| self.entries.get(address))
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// A frozen, independent copy of the account mapping.
///
/// Every account, including its storage map, is owned by the snapshot, so later mutation of the
/// live [`WorldState`] is never visible through it. Logs and the refund counter are not part of
/// a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    accounts: Accounts,
}

impl Snapshot {
    /// The number of accounts captured.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the snapshot captured no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.len() == 0
    }
}

/// The [`WorldState`] struct is the authoritative, mutable ledger of accounts for one execution
/// context, together with the logs emitted and the gas refund accumulated so far.
///
/// Reads of an absent account return zero values and never create it. Writes create the account
/// first if needed, except [`sub_balance`](WorldState::sub_balance) and
/// [`mark_suicided`](WorldState::mark_suicided), which leave absent accounts alone.
#[derive(Clone, Debug, Default)]
pub struct WorldState {
    accounts: Accounts,
    logs: Vec<Log>,
    refund: U256,
}

impl WorldState {
    /// Creates an empty [`WorldState`].
    ///
    /// ```
    /// use evmstate_vm::core::storage::WorldState;
    ///
    /// let state = WorldState::new();
    /// assert_eq!(state.len(), 0);
    /// ```
    pub fn new() -> WorldState {
        WorldState::default()
    }

    /// The number of accounts, including empty and suicided ones.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the state holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.len() == 0
    }

    /// Looks up an account without creating it.
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// All accounts, in the order they were first created.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    /// Inserts a fully-formed account, replacing any existing one at the same address.
    pub fn insert_account(&mut self, account: Account) {
        self.accounts.insert(account);
    }

    /// Whether an account exists at `address`.
    pub fn account_exists(&self, address: &Address) -> bool {
        self.accounts.get(address).is_some()
    }

    /// True if the account is absent, or has zero nonce, zero balance and no code.
    ///
    /// ```
    /// use alloy::primitives::{Address, U256};
    /// use evmstate_vm::core::storage::WorldState;
    ///
    /// let mut state = WorldState::new();
    /// let address = Address::repeat_byte(0xaa);
    /// assert!(state.account_is_empty(&address));
    ///
    /// state.set_nonce(address, U256::from(1));
    /// assert!(!state.account_is_empty(&address));
    /// ```
    pub fn account_is_empty(&self, address: &Address) -> bool {
        self.accounts.get(address).map_or(true, Account::is_empty)
    }

    /// Inserts a fresh zero-valued account at `address`, replacing any existing account
    /// (including its storage) rather than merging with it.
    pub fn create_account(&mut self, address: Address) {
        trace!("creating account {}", address);
        self.accounts.insert(Account::new(address));
    }

    /// Replaces the account's code, creating the account if needed.
    pub fn set_code(&mut self, address: Address, code: Bytes) {
        self.accounts.get_or_create(address).code = code;
    }

    /// The account's code, or empty if the account is absent.
    pub fn get_code(&self, address: &Address) -> Bytes {
        self.accounts.get(address).map(|account| account.code.clone()).unwrap_or_default()
    }

    /// The length of the account's code, or zero if the account is absent.
    pub fn get_code_size(&self, address: &Address) -> usize {
        self.accounts.get(address).map_or(0, |account| account.code.len())
    }

    /// The account's balance, or zero if the account is absent.
    pub fn get_balance(&self, address: &Address) -> U256 {
        self.accounts.get(address).map(|account| account.balance).unwrap_or_default()
    }

    /// Credits `amount` to the account, creating it if needed. Fails without changing the
    /// balance if the result would not fit in 256 bits.
    pub fn add_balance(&mut self, address: Address, amount: U256) -> Result<()> {
        let account = self.accounts.get_or_create(address);
        account.balance = account.balance.checked_add(amount).ok_or(Error::BalanceOverflow {
            address,
            amount,
            balance: account.balance,
        })?;
        Ok(())
    }

    /// Debits `amount` from the account. An absent account is left absent and the call is a
    /// no-op. Fails without changing the balance if the account holds less than `amount`.
    ///
    /// ```
    /// use alloy::primitives::{Address, U256};
    /// use evmstate_vm::core::storage::WorldState;
    ///
    /// let mut state = WorldState::new();
    /// let address = Address::repeat_byte(0xaa);
    ///
    /// state.sub_balance(address, U256::from(1)).expect("absent accounts are skipped");
    /// assert!(!state.account_exists(&address));
    /// ```
    pub fn sub_balance(&mut self, address: Address, amount: U256) -> Result<()> {
        let Some(account) = self.accounts.get_mut(&address) else {
            return Ok(());
        };

        account.balance = account.balance.checked_sub(amount).ok_or(Error::BalanceUnderflow {
            address,
            requested: amount,
            available: account.balance,
        })?;
        Ok(())
    }

    /// The account's nonce, or zero if the account is absent.
    pub fn get_nonce(&self, address: &Address) -> U256 {
        self.accounts.get(address).map(|account| account.nonce).unwrap_or_default()
    }

    /// Sets the account's nonce, creating the account if needed.
    pub fn set_nonce(&mut self, address: Address, nonce: U256) {
        self.accounts.get_or_create(address).nonce = nonce;
    }

    /// Flags the account for removal at commit time. No-op if the account is absent.
    pub fn mark_suicided(&mut self, address: &Address) {
        if let Some(account) = self.accounts.get_mut(address) {
            debug!("marking account {} as suicided", address);
            account.suicided = true;
        }
    }

    /// Whether the account has been flagged for removal. False if the account is absent.
    pub fn has_suicided(&self, address: &Address) -> bool {
        self.accounts.get(address).is_some_and(|account| account.suicided)
    }

    /// The value stored under `key`, or empty if the account or the key is absent.
    pub fn get_storage_value(&self, address: &Address, key: &B256) -> Bytes {
        self.accounts
            .get(address)
            .and_then(|account| account.storage.get(key))
            .cloned()
            .unwrap_or_default()
    }

    /// Stores `value` under `key`, creating the account if needed. An empty `value` deletes the
    /// key, so an emptied key is indistinguishable from one never written.
    ///
    /// ```
    /// use alloy::primitives::{Address, Bytes, B256};
    /// use evmstate_vm::core::storage::WorldState;
    ///
    /// let mut state = WorldState::new();
    /// let address = Address::repeat_byte(0xaa);
    ///
    /// state.set_storage_value(address, B256::ZERO, Bytes::from_static(&[0x01]));
    /// state.set_storage_value(address, B256::ZERO, Bytes::new());
    /// assert!(state.get_storage_value(&address, &B256::ZERO).is_empty());
    /// ```
    pub fn set_storage_value(&mut self, address: Address, key: B256, value: Bytes) {
        let account = self.accounts.get_or_create(address);
        if value.is_empty() {
            account.storage.remove(&key);
        } else {
            account.storage.insert(key, value);
        }
    }

    /// Takes an independent deep copy of every account, including each storage map.
    pub fn snapshot(&self) -> Snapshot {
        debug!("taking snapshot of {} accounts", self.accounts.len());
        Snapshot { accounts: self.accounts.clone() }
    }

    /// Replaces the live account mapping with the snapshot's contents, discarding every account
    /// mutation made since the snapshot was taken. Logs and the refund counter are untouched.
    pub fn revert_to(&mut self, snapshot: Snapshot) {
        debug!(
            "reverting from {} to {} accounts",
            self.accounts.len(),
            snapshot.accounts.len()
        );
        self.accounts = snapshot.accounts;
    }

    /// Adds `amount` to the refund counter, saturating at the 256-bit maximum.
    pub fn add_refund(&mut self, amount: U256) {
        self.refund = self.refund.saturating_add(amount);
    }

    /// Subtracts `amount` from the refund counter.
    ///
    /// Subtracting more than was added is an engine bug, not a user-triggerable condition; it
    /// is reported as [`Error::RefundUnderflow`] and the counter is left unchanged.
    pub fn sub_refund(&mut self, amount: U256) -> Result<()> {
        match self.refund.checked_sub(amount) {
            Some(refund) => {
                self.refund = refund;
                Ok(())
            }
            None => {
                warn!("refund counter below zero: {} - {}", self.refund, amount);
                Err(Error::RefundUnderflow { requested: amount, available: self.refund })
            }
        }
    }

    /// The current refund counter.
    pub fn get_refund(&self) -> U256 {
        self.refund
    }

    /// Records an emitted log.
    pub fn append_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    /// Every log emitted so far, in emission order.
    pub fn get_logs(&self) -> &[Log] {
        &self.logs
    }

    /// The accounts which survive commitment, in insertion order: an account is included iff it
    /// is neither empty nor suicided.
    pub fn collect_committable_accounts(&self) -> Vec<&Account> {
        self.accounts.iter().filter(|account| account.is_committable()).collect()
    }
}
