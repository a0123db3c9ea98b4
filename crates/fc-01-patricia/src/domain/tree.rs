use super::bits::Bits;
use super::errors::TreeError;
use super::node::{Hashable, Node};
use super::KEY_BITS;
use shared_types::Hash;

/// Binary patricia tree keyed by 32-byte keys.
///
/// Owned by a single validation pass; clone it to fork a speculative copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatriciaTree<V> {
    root: Option<Node<V>>,
    len: usize,
}

impl<V> Default for PatriciaTree<V> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

fn key_bits(key: &[u8]) -> Result<Bits, TreeError> {
    if key.len() * 8 != KEY_BITS {
        return Err(TreeError::KeyLength {
            bits: key.len() * 8,
        });
    }
    Ok(Bits::from_bytes(key))
}

impl<V: Hashable> PatriciaTree<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value at `key`.
    ///
    /// Replacing an existing key only swaps the leaf value; the tree shape
    /// does not change.
    pub fn insert(&mut self, key: &[u8], value: V) -> Result<(), TreeError> {
        let path = key_bits(key)?;
        self.root = Some(match self.root.take() {
            None => {
                self.len += 1;
                Node::leaf(path, value)
            }
            Some(root) => {
                if root.get(path.as_slice()).is_none() {
                    self.len += 1;
                }
                root.insert(path.as_slice(), value)
            }
        });
        Ok(())
    }

    /// Remove the value at `key`, returning it. Absent keys are a no-op.
    pub fn delete(&mut self, key: &[u8]) -> Result<Option<V>, TreeError> {
        let path = key_bits(key)?;
        let Some(root) = self.root.take() else {
            return Ok(None);
        };
        let (root, removed) = root.delete(path.as_slice());
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
        }
        Ok(removed)
    }

    pub fn get(&self, key: &[u8]) -> Result<Option<&V>, TreeError> {
        let path = key_bits(key)?;
        Ok(self.root.as_ref().and_then(|root| root.get(path.as_slice())))
    }

    pub fn contains(&self, key: &[u8]) -> Result<bool, TreeError> {
        self.get(key).map(|v| v.is_some())
    }

    /// Digest of the whole set: zero when empty, the leaf hash for a single
    /// leaf, otherwise `DoubleHash(left ++ right)` recursively.
    pub fn root_hash(&self) -> Hash {
        self.root.as_ref().map(|root| root.hash).unwrap_or(Hash::ZERO)
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of leaves plus branches.
    pub fn node_count(&self) -> usize {
        self.root.as_ref().map(Node::count).unwrap_or(0)
    }

    /// Visit every `(key, value)` in ascending key order.
    pub fn for_each(&self, mut f: impl FnMut(Vec<u8>, &V)) {
        let Some(root) = &self.root else {
            return;
        };
        let mut prefix = Vec::with_capacity(KEY_BITS);
        root.visit(&mut prefix, &mut |bits, value| f(pack_bits(bits), value));
    }
}

fn pack_bits(bits: &[u8]) -> Vec<u8> {
    bits.chunks(8)
        .map(|chunk| chunk.iter().fold(0u8, |acc, bit| (acc << 1) | bit))
        .collect()
}
