use alloy::primitives::B256;
use clap::Parser;
use evmstate_common::utils::{hex::ToLowerHex, io::file::read_file};
use evmstate_config::Configuration;
use evmstate_vm::core::{
    alloc::load_alloc, commit::StateCommitter, storage::WorldState, trie::MemoryTrie,
};
use tracing::{debug, info};

use crate::error::Error;

/// Command line arguments for the root command
#[derive(Debug, Clone, Parser)]
#[clap(
    about = "Compute the state root of a JSON account allocation",
    override_usage = "evmstate root <FILE> [OPTIONS]"
)]
pub(crate) struct RootArgs {
    /// Path to a JSON file mapping addresses to `{ balance, nonce, code, storage }`.
    #[clap(required = true)]
    pub(crate) file: String,

    /// Hash keys with keccak-256 before inserting them into the tries.
    #[clap(long)]
    pub(crate) secure: bool,

    /// The number of threads used to build storage tries.
    #[clap(long, short)]
    pub(crate) threads: Option<usize>,
}

/// Loads the allocation at `args.file` and commits it, falling back to `configuration` for any
/// flag that was not given.
pub(crate) fn root(args: &RootArgs, configuration: &Configuration) -> Result<B256, Error> {
    let contents = read_file(&args.file)
        .map_err(|e| Error::Generic(format!("failed to read allocation: {}", e)))?;
    let state = load_alloc(&contents)?;
    summarize(&state);

    let threads = args.threads.unwrap_or(configuration.commit_threads);
    let secure = args.secure || configuration.secure_trie;
    let committer = StateCommitter::default().with_threads(threads);

    let mut trie = if secure { MemoryTrie::secure() } else { MemoryTrie::new() };
    let root = committer.commit(&state, &mut trie)?;

    info!(
        "committed {} accounts using {} threads (secure: {})",
        state.len(),
        committer.threads(),
        secure
    );
    Ok(root)
}

fn summarize(state: &WorldState) {
    for account in state.accounts() {
        debug!(
            "{}: balance {}, nonce {}, {} bytes of code, {} storage slots",
            account.address.to_lower_hex(),
            account.balance,
            account.nonce,
            account.code.len(),
            account.storage.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::b256;
    use evmstate_common::utils::io::file::{delete_path, write_file};

    /// keccak256(rlp(""))
    const EMPTY_ROOT: B256 =
        b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

    fn write_alloc(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir()
            .join(format!("evmstate-cli-{}-{}.json", name, std::process::id()))
            .to_string_lossy()
            .to_string();
        write_file(&path, contents).expect("failed to write allocation");
        path
    }

    #[test]
    fn test_empty_allocation_has_empty_root() {
        let file = write_alloc("empty", "{}");
        let args = RootArgs { file: file.clone(), secure: false, threads: None };

        assert_eq!(root(&args, &Configuration::default()).expect("root failed"), EMPTY_ROOT);
        delete_path(&file);
    }

    #[test]
    fn test_secure_trie_from_flag_or_configuration() {
        let file = write_alloc(
            "flags",
            r#"{ "0x0000000000000000000000000000000000000001": { "balance": "0x01" } }"#,
        );
        let plain = RootArgs { file: file.clone(), secure: false, threads: Some(1) };
        let secure = RootArgs { secure: true, ..plain.clone() };
        let configured = Configuration { secure_trie: true, ..Configuration::default() };

        let plain_root = root(&plain, &Configuration::default()).expect("root failed");
        let secure_root = root(&secure, &Configuration::default()).expect("root failed");

        assert_ne!(plain_root, secure_root);
        assert_eq!(root(&plain, &configured).expect("root failed"), secure_root);
        delete_path(&file);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let args =
            RootArgs { file: "/nonexistent/alloc.json".to_string(), secure: false, threads: None };
        assert!(matches!(root(&args, &Configuration::default()), Err(Error::Generic(_))));
    }
}
