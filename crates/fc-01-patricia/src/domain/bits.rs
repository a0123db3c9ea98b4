// =============================================================================
// BITS: Key path representation
// =============================================================================

/// Bit path for tree traversal.
///
/// Keys are expanded MSB-first into one `0`/`1` entry per bit, so a 32-byte
/// key becomes 256 entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bits(pub Vec<u8>);

impl Bits {
    /// Expand bytes into bits, most significant bit first.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut bits = Vec::with_capacity(bytes.len() * 8);
        for byte in bytes {
            for shift in (0..8).rev() {
                bits.push((byte >> shift) & 1);
            }
        }
        Bits(bits)
    }

    /// Bits from `start` to the end.
    pub fn slice(&self, start: usize) -> Self {
        Bits(self.0[start..].to_vec())
    }

    /// Bits in `start..end`.
    pub fn slice_range(&self, start: usize, end: usize) -> Self {
        Bits(self.0[start..end].to_vec())
    }

    /// Length of the shared prefix with `other`.
    pub fn common_prefix_len(&self, other: &[u8]) -> usize {
        self.0
            .iter()
            .zip(other.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// `self ++ [bit] ++ tail`, used when a sibling is merged upward.
    pub fn join(&self, bit: u8, tail: &Bits) -> Self {
        let mut out = Vec::with_capacity(self.len() + 1 + tail.len());
        out.extend_from_slice(&self.0);
        out.push(bit);
        out.extend_from_slice(&tail.0);
        Bits(out)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bit at index.
    pub fn at(&self, index: usize) -> u8 {
        self.0[index]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}
