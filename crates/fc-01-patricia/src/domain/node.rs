use super::bits::Bits;
use shared_types::{double_hash, Hash};

/// A value that can be committed to by the tree.
pub trait Hashable {
    fn hash(&self) -> Hash;
}

impl Hashable for Hash {
    fn hash(&self) -> Hash {
        *self
    }
}

// =============================================================================
// TREE NODE
// =============================================================================

/// A tree node with its cached hash.
///
/// Hashes are recomputed only along the path touched by an insert or delete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Node<V> {
    /// Remaining key suffix below the parent's branching bit.
    pub(crate) key: Bits,
    pub(crate) hash: Hash,
    pub(crate) body: Body<V>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Body<V> {
    Leaf(V),
    /// Children selected by bit `0` and bit `1`.
    Branch(Box<[Node<V>; 2]>),
}

impl<V: Hashable> Node<V> {
    pub(crate) fn leaf(key: Bits, value: V) -> Self {
        Self {
            key,
            hash: value.hash(),
            body: Body::Leaf(value),
        }
    }

    pub(crate) fn branch(key: Bits, children: [Node<V>; 2]) -> Self {
        Self {
            key,
            hash: branch_hash(&children),
            body: Body::Branch(Box::new(children)),
        }
    }

    /// Insert `value` at `path`, which is relative to this node's position.
    pub(crate) fn insert(mut self, path: &[u8], value: V) -> Self {
        let common = self.key.common_prefix_len(path);

        if common == self.key.len() {
            match self.body {
                Body::Leaf(ref mut existing) => {
                    // Exact match: full keys have equal length.
                    self.hash = value.hash();
                    *existing = value;
                }
                Body::Branch(children) => {
                    let [left, right] = *children;
                    let rest = &path[common + 1..];
                    let children = match path[common] {
                        0 => [left.insert(rest, value), right],
                        _ => [left, right.insert(rest, value)],
                    };
                    self.hash = branch_hash(&children);
                    self.body = Body::Branch(Box::new(children));
                }
            }
            return self;
        }

        // Fork at the first diverging bit.
        let prefix = self.key.slice_range(0, common);
        self.key = self.key.slice(common + 1);
        let leaf = Node::leaf(Bits(path[common + 1..].to_vec()), value);
        let children = match path[common] {
            0 => [leaf, self],
            _ => [self, leaf],
        };
        Node::branch(prefix, children)
    }

    /// Remove the leaf at `path`.
    ///
    /// Returns the replacement subtree (`None` if this node was the leaf) and
    /// the removed value, if any.
    pub(crate) fn delete(mut self, path: &[u8]) -> (Option<Self>, Option<V>) {
        let common = self.key.common_prefix_len(path);
        if common < self.key.len() {
            return (Some(self), None);
        }

        match self.body {
            Body::Leaf(value) => (None, Some(value)),
            Body::Branch(children) => {
                let [left, right] = *children;
                let bit = path[common];
                let rest = &path[common + 1..];
                let (target, sibling) = match bit {
                    0 => (left, right),
                    _ => (right, left),
                };

                match target.delete(rest) {
                    (Some(target), removed) => {
                        let children = match bit {
                            0 => [target, sibling],
                            _ => [sibling, target],
                        };
                        if removed.is_some() {
                            self.hash = branch_hash(&children);
                        }
                        self.body = Body::Branch(Box::new(children));
                        (Some(self), removed)
                    }
                    (None, removed) => {
                        // Only the sibling is left: it absorbs this node's
                        // prefix plus its own branching bit.
                        let mut merged = sibling;
                        merged.key = self.key.join(1 - bit, &merged.key);
                        (Some(merged), removed)
                    }
                }
            }
        }
    }

    pub(crate) fn get(&self, path: &[u8]) -> Option<&V> {
        let mut node = self;
        let mut path = path;
        loop {
            if node.key.common_prefix_len(path) < node.key.len() {
                return None;
            }
            match &node.body {
                Body::Leaf(value) => return Some(value),
                Body::Branch(children) => {
                    let bit = path[node.key.len()] as usize;
                    path = &path[node.key.len() + 1..];
                    node = &children[bit];
                }
            }
        }
    }

    pub(crate) fn count(&self) -> usize {
        match &self.body {
            Body::Leaf(_) => 1,
            Body::Branch(children) => 1 + children[0].count() + children[1].count(),
        }
    }

    pub(crate) fn visit<'a>(&'a self, prefix: &mut Vec<u8>, f: &mut dyn FnMut(&[u8], &'a V)) {
        let start = prefix.len();
        prefix.extend_from_slice(self.key.as_slice());
        match &self.body {
            Body::Leaf(value) => f(prefix, value),
            Body::Branch(children) => {
                for (bit, child) in children.iter().enumerate() {
                    prefix.push(bit as u8);
                    child.visit(prefix, f);
                    prefix.pop();
                }
            }
        }
        prefix.truncate(start);
    }
}

fn branch_hash<V>(children: &[Node<V>; 2]) -> Hash {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(children[0].hash.as_bytes());
    buf[32..].copy_from_slice(children[1].hash.as_bytes());
    double_hash(&buf)
}
