use alloy::primitives::{Address, Bytes, B256};
use evmstate_common::utils::threading::fan_out;
use tracing::{debug, trace};

use crate::error::Result;

use super::{
    account::Account,
    codec::{Encoder, Hasher, Keccak256, RlpEncoder, RlpItem},
    storage::WorldState,
    trie::Trie,
};

/// The default number of workers used to build storage tries.
pub const DEFAULT_COMMIT_THREADS: usize = 4;

/// Everything the top-level trie needs for one account, computed off the main thread.
#[derive(Debug)]
struct PreparedAccount {
    address: Address,
    code: Bytes,
    code_hash: B256,
    record: Vec<u8>,
}

/// Folds a [`WorldState`] into a single state root.
///
/// Each committable account gets its own storage trie, built from a cleared copy of the target
/// trie. Storage tries are built in parallel; the top-level trie is then written serially, with
/// the code stored under its hash and the account record
/// `[nonce, balance, storage_root, code_hash]` stored under the address.
#[derive(Clone, Debug)]
pub struct StateCommitter<H, E> {
    hasher: H,
    encoder: E,
    threads: usize,
}

impl Default for StateCommitter<Keccak256, RlpEncoder> {
    fn default() -> Self {
        StateCommitter::new(Keccak256, RlpEncoder)
    }
}

impl<H: Hasher, E: Encoder> StateCommitter<H, E> {
    /// Creates a committer using [`DEFAULT_COMMIT_THREADS`] workers.
    pub fn new(hasher: H, encoder: E) -> Self {
        StateCommitter { hasher, encoder, threads: DEFAULT_COMMIT_THREADS }
    }

    /// Sets the number of workers used to build storage tries. Zero is treated as one.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// The number of storage-trie workers.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Commits `state` into `trie` and returns the resulting root.
    ///
    /// Empty and suicided accounts are skipped. The root depends only on the committed contents,
    /// never on the order accounts were created in or on the worker count.
    pub fn commit<T: Trie>(&self, state: &WorldState, trie: &mut T) -> Result<B256> {
        let accounts = state.collect_committable_accounts();
        debug!("committing {} of {} accounts", accounts.len(), state.len());

        let mut template = trie.copy();
        template.clear_root();

        let prepared = fan_out(&accounts, self.threads, |account| {
            self.prepare_account(account, &template)
        })
        .into_iter()
        .collect::<Result<Vec<_>>>()?;

        for account in prepared {
            trie.put_raw(account.code_hash, account.code)?;
            trie.put(account.address.as_slice(), account.record)?;
        }

        let root = trie.root();
        debug!("state root: {}", root);
        Ok(root)
    }

    /// Builds the storage root of a single account.
    pub fn storage_root<T: Trie>(&self, account: &Account, template: &T) -> Result<B256> {
        let mut storage_trie = template.copy();
        storage_trie.clear_root();

        for (key, value) in &account.storage {
            storage_trie
                .put(key.as_slice(), self.encoder.encode(&RlpItem::Bytes(value.clone())))?;
        }

        Ok(storage_trie.root())
    }

    fn prepare_account<T: Trie>(&self, account: &Account, template: &T) -> Result<PreparedAccount> {
        let storage_root = self.storage_root(account, template)?;
        let code_hash = self.hasher.hash(&account.code);
        trace!(
            "prepared {} ({} storage slots, storage root {})",
            account.address,
            account.storage.len(),
            storage_root
        );

        let record = self.encoder.encode(&RlpItem::List(vec![
            account.nonce.into(),
            account.balance.into(),
            storage_root.into(),
            code_hash.into(),
        ]));

        Ok(PreparedAccount { address: account.address, code: account.code.clone(), code_hash, record })
    }
}

/// Commits `state` into `trie` with the given collaborators and returns the state root.
///
/// ```
/// use alloy::primitives::{Address, U256};
/// use alloy_trie::EMPTY_ROOT_HASH;
/// use evmstate_vm::core::{
///     codec::{Keccak256, RlpEncoder},
///     commit::commit,
///     storage::WorldState,
///     trie::MemoryTrie,
/// };
///
/// let mut state = WorldState::new();
/// assert_eq!(commit(&state, Keccak256, RlpEncoder, MemoryTrie::new()).unwrap(), EMPTY_ROOT_HASH);
///
/// state.add_balance(Address::repeat_byte(0x01), U256::from(1)).unwrap();
/// assert_ne!(commit(&state, Keccak256, RlpEncoder, MemoryTrie::new()).unwrap(), EMPTY_ROOT_HASH);
/// ```
pub fn commit<H: Hasher, E: Encoder, T: Trie>(
    state: &WorldState,
    hasher: H,
    encoder: E,
    mut trie: T,
) -> Result<B256> {
    StateCommitter::new(hasher, encoder).commit(state, &mut trie)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, Bytes, B256, U256};
    use alloy_trie::EMPTY_ROOT_HASH;

    use crate::core::{
        account::Account,
        codec::{Encoder, Hasher, Keccak256, RlpEncoder, RlpItem},
        commit::{commit, StateCommitter},
        storage::WorldState,
        trie::{MemoryTrie, Trie},
    };

    fn populate(state: &mut WorldState, bytes: &[u8]) {
        for byte in bytes {
            let address = Address::repeat_byte(*byte);
            state.add_balance(address, U256::from(*byte)).expect("add_balance failed");
            state.set_nonce(address, U256::from(1));
            state.set_storage_value(
                address,
                B256::with_last_byte(*byte),
                Bytes::copy_from_slice(&[*byte]),
            );
        }
    }

    #[test]
    fn test_empty_state_commits_to_empty_root() {
        let state = WorldState::new();
        assert_eq!(
            commit(&state, Keccak256, RlpEncoder, MemoryTrie::new()).expect("commit failed"),
            EMPTY_ROOT_HASH
        );
    }

    #[test]
    fn test_root_is_independent_of_creation_order() {
        let mut a = WorldState::new();
        let mut b = WorldState::new();
        populate(&mut a, &[0x01, 0x02, 0x03, 0x04, 0x05]);
        populate(&mut b, &[0x05, 0x03, 0x01, 0x04, 0x02]);

        assert_eq!(
            commit(&a, Keccak256, RlpEncoder, MemoryTrie::new()).expect("commit failed"),
            commit(&b, Keccak256, RlpEncoder, MemoryTrie::new()).expect("commit failed"),
        );
    }

    #[test]
    fn test_storage_root_is_independent_of_slot_order() {
        let address = Address::repeat_byte(0x01);
        let slots = (0u8..12)
            .map(|i| (B256::with_last_byte(i), Bytes::copy_from_slice(&[0x00, i + 1])))
            .collect::<Vec<_>>();

        let mut forward = WorldState::new();
        let mut reverse = WorldState::new();
        for state in [&mut forward, &mut reverse] {
            state.set_nonce(address, U256::from(1));
        }
        for (key, value) in &slots {
            forward.set_storage_value(address, *key, value.clone());
        }
        for (key, value) in slots.iter().rev() {
            reverse.set_storage_value(address, *key, value.clone());
        }

        let root = commit(&forward, Keccak256, RlpEncoder, MemoryTrie::new()).expect("commit failed");
        assert_eq!(
            root,
            commit(&reverse, Keccak256, RlpEncoder, MemoryTrie::new()).expect("commit failed")
        );

        // dropping a single slot must change the root
        reverse.set_storage_value(address, B256::with_last_byte(5), Bytes::new());
        assert_ne!(
            root,
            commit(&reverse, Keccak256, RlpEncoder, MemoryTrie::new()).expect("commit failed")
        );
    }

    #[test]
    fn test_root_is_independent_of_thread_count() {
        let mut state = WorldState::new();
        populate(&mut state, &(1u8..=32).collect::<Vec<_>>());

        let roots = [1, 2, 3, 8, 64]
            .into_iter()
            .map(|threads| {
                StateCommitter::default()
                    .with_threads(threads)
                    .commit(&state, &mut MemoryTrie::new())
                    .expect("commit failed")
            })
            .collect::<Vec<_>>();

        assert!(roots.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_empty_and_suicided_accounts_are_skipped() {
        let mut baseline = WorldState::new();
        populate(&mut baseline, &[0x01]);

        let mut state = WorldState::new();
        populate(&mut state, &[0x01, 0x02]);
        state.mark_suicided(&Address::repeat_byte(0x02));
        state.create_account(Address::repeat_byte(0x03));
        state.set_storage_value(
            Address::repeat_byte(0x03),
            B256::ZERO,
            Bytes::from_static(&[0x01]),
        );

        assert_eq!(
            commit(&state, Keccak256, RlpEncoder, MemoryTrie::new()).expect("commit failed"),
            commit(&baseline, Keccak256, RlpEncoder, MemoryTrie::new()).expect("commit failed"),
        );
    }

    #[test]
    fn test_top_level_trie_holds_account_records() {
        let address = Address::repeat_byte(0xaa);
        let code = Bytes::from_static(&[0x60, 0x01]);

        let mut state = WorldState::new();
        state.set_code(address, code.clone());
        state.set_nonce(address, U256::from(7));

        let committer = StateCommitter::default();
        let mut trie = MemoryTrie::new();
        committer.commit(&state, &mut trie).expect("commit failed");

        let code_hash = Keccak256.hash(&code);
        let expected = RlpEncoder.encode(&RlpItem::List(vec![
            U256::from(7).into(),
            U256::ZERO.into(),
            EMPTY_ROOT_HASH.into(),
            code_hash.into(),
        ]));

        assert_eq!(trie.get(address.as_slice()), Some(expected.as_slice()));
        assert_eq!(trie.get_raw(&code_hash), Some(code));
    }

    #[test]
    fn test_storage_root_matches_a_hand_built_trie() {
        let mut account = Account::new(Address::repeat_byte(0x01));
        account.balance = U256::from(1);
        account.storage.insert(B256::with_last_byte(0x01), Bytes::from_static(&[0x2a]));
        account.storage.insert(B256::with_last_byte(0x02), Bytes::from_static(&[0x01, 0x00]));

        let mut expected = MemoryTrie::new();
        expected
            .put(B256::with_last_byte(0x02).as_slice(), vec![0x82, 0x01, 0x00])
            .expect("put failed");
        expected.put(B256::with_last_byte(0x01).as_slice(), vec![0x2a]).expect("put failed");

        assert_eq!(
            StateCommitter::default()
                .storage_root(&account, &MemoryTrie::new())
                .expect("storage_root failed"),
            expected.root()
        );
    }

    #[test]
    fn test_secure_trie_changes_the_root() {
        let mut state = WorldState::new();
        populate(&mut state, &[0x01, 0x02]);

        assert_ne!(
            commit(&state, Keccak256, RlpEncoder, MemoryTrie::new()).expect("commit failed"),
            commit(&state, Keccak256, RlpEncoder, MemoryTrie::secure()).expect("commit failed"),
        );
    }
}
