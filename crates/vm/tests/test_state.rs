//! Integration tests for world-state bookkeeping and state commitment.

#[cfg(test)]
mod integration_tests {
    use alloy::primitives::{address, Address, Bytes, B256, U256};
    use alloy_trie::EMPTY_ROOT_HASH;
    use evmstate_tracing::init_test_tracing;
    use evmstate_vm::core::{
        alloc::load_alloc,
        codec::{Keccak256, RlpEncoder},
        commit::{commit, StateCommitter},
        log::Log,
        storage::WorldState,
        trie::MemoryTrie,
    };

    const ALLOC: &str = r#"{
        "0x1000000000000000000000000000000000000001": {
            "balance": "0xde0b6b3a7640000",
            "nonce": "0x1",
            "code": "0x600160005260206000f3",
            "storage": { "0x00": "0x01", "0x01": "0x02" }
        },
        "0x1000000000000000000000000000000000000002": {
            "balance": "100"
        }
    }"#;

    fn root_of(state: &WorldState) -> B256 {
        commit(state, Keccak256, RlpEncoder, MemoryTrie::new()).expect("commit failed")
    }

    #[test]
    fn test_reverted_transaction_restores_the_root() {
        init_test_tracing();

        let mut state = load_alloc(ALLOC).expect("failed to load alloc");
        let before = root_of(&state);

        let snapshot = state.snapshot();
        let contract = address!("1000000000000000000000000000000000000001");
        let sender = address!("1000000000000000000000000000000000000002");

        state.sub_balance(sender, U256::from(40)).expect("sub_balance failed");
        state.add_balance(contract, U256::from(40)).expect("add_balance failed");
        state.set_storage_value(contract, B256::ZERO, Bytes::new());
        state.set_storage_value(contract, B256::with_last_byte(7), Bytes::from_static(&[0x07]));
        state.append_log(Log::new(contract, vec![B256::ZERO], &[0x01]));
        state.add_refund(U256::from(4800));
        assert_ne!(root_of(&state), before);

        state.revert_to(snapshot);
        assert_eq!(root_of(&state), before);

        // logs and the refund counter survive a revert
        assert_eq!(state.get_logs().len(), 1);
        assert_eq!(state.get_refund(), U256::from(4800));
    }

    #[test]
    fn test_selfdestruct_removes_the_account_from_the_root() {
        init_test_tracing();

        let mut state = load_alloc(ALLOC).expect("failed to load alloc");
        let mut expected = state.clone();

        let doomed = Address::repeat_byte(0x99);
        state.add_balance(doomed, U256::from(1)).expect("add_balance failed");
        state.set_storage_value(doomed, B256::ZERO, Bytes::from_static(&[0xff]));
        assert_ne!(root_of(&state), root_of(&expected));

        state.mark_suicided(&doomed);
        assert!(state.has_suicided(&doomed));
        assert_eq!(root_of(&state), root_of(&expected));

        // touching an account without giving it a balance, nonce or code leaves the root alone
        expected.create_account(Address::repeat_byte(0x77));
        assert_eq!(root_of(&state), root_of(&expected));
    }

    #[test]
    fn test_secure_commitment_is_deterministic() {
        let state = load_alloc(ALLOC).expect("failed to load alloc");

        let committer = StateCommitter::default().with_threads(2);
        let first = committer.commit(&state, &mut MemoryTrie::secure()).expect("commit failed");
        let second = committer.commit(&state, &mut MemoryTrie::secure()).expect("commit failed");

        assert_eq!(first, second);
        assert_ne!(first, EMPTY_ROOT_HASH);
        assert_ne!(first, root_of(&state));
    }
}
