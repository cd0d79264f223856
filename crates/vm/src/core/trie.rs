use std::collections::BTreeMap;

use alloy::primitives::{keccak256, Bytes, B256};
use alloy_trie::{HashBuilder, Nibbles, EMPTY_ROOT_HASH};
use hashbrown::HashMap;

use crate::error::{Error, Result};

/// An authenticated key/value structure with a root digest committing to its contents.
///
/// Implementations must be [`Send`] + [`Sync`]: per-account storage tries are built on worker
/// threads from a shared template.
pub trait Trie: Send + Sync {
    /// Inserts `value` under `key`. An empty value removes the key.
    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<()>;

    /// Stores `value` in the backing node store under `key` without touching the trie shape.
    fn put_raw(&mut self, key: B256, value: Bytes) -> Result<()>;

    /// Reads a value previously stored with [`put_raw`](Trie::put_raw).
    fn get_raw(&self, key: &B256) -> Option<Bytes>;

    /// Produces an independent trie with the same backing store.
    fn copy(&self) -> Self
    where
        Self: Sized;

    /// The digest committing to every key/value pair currently in the trie.
    fn root(&self) -> B256;

    /// Resets the trie to the empty root so it can be reused to build a fresh trie.
    fn clear_root(&mut self);
}

/// An in-memory Merkle-Patricia trie.
///
/// Leaves are kept sorted and the root is rebuilt on demand, which keeps inserts cheap and lets
/// [`Trie::copy`] be a plain clone. All keys of a single trie must have the same length.
#[derive(Clone, Debug, Default)]
pub struct MemoryTrie {
    leaves: BTreeMap<Vec<u8>, Vec<u8>>,
    store: HashMap<B256, Bytes>,
    secure: bool,
}

impl MemoryTrie {
    /// Creates an empty trie that uses keys as given.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty trie that keccak-hashes every key before insertion.
    pub fn secure() -> Self {
        Self { secure: true, ..Self::default() }
    }

    /// Whether keys are hashed before insertion.
    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// Reads the value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.leaves.get(&self.path(key)).map(Vec::as_slice)
    }

    /// The number of leaves.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Whether the trie has no leaves.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    fn path(&self, key: &[u8]) -> Vec<u8> {
        if self.secure {
            keccak256(key).to_vec()
        } else {
            key.to_vec()
        }
    }
}

impl Trie for MemoryTrie {
    fn put(&mut self, key: &[u8], value: Vec<u8>) -> Result<()> {
        let path = self.path(key);

        if let Some(existing) = self.leaves.keys().next() {
            if existing.len() != path.len() {
                return Err(Error::Trie(format!(
                    "key of {} bytes in a trie of {}-byte keys",
                    path.len(),
                    existing.len()
                )));
            }
        }

        if value.is_empty() {
            self.leaves.remove(&path);
        } else {
            self.leaves.insert(path, value);
        }

        Ok(())
    }

    fn put_raw(&mut self, key: B256, value: Bytes) -> Result<()> {
        self.store.insert(key, value);
        Ok(())
    }

    fn get_raw(&self, key: &B256) -> Option<Bytes> {
        self.store.get(key).cloned()
    }

    fn copy(&self) -> Self {
        self.clone()
    }

    fn root(&self) -> B256 {
        if self.leaves.is_empty() {
            return EMPTY_ROOT_HASH;
        }

        // the builder requires leaves in ascending nibble order, which the map already provides
        let mut builder = HashBuilder::default();
        for (key, value) in &self.leaves {
            builder.add_leaf(Nibbles::unpack(key), value);
        }
        builder.root()
    }

    fn clear_root(&mut self) {
        self.leaves.clear();
    }
}
