use shared_types::{double_hash, Hash};

/// Merkle root over transaction hashes.
///
/// Bitcoin-style: pairs are `DoubleHash(left ++ right)`, an odd level
/// duplicates its last hash, and an empty list yields the zero hash.
pub fn tx_root(hashes: &[Hash]) -> Hash {
    if hashes.is_empty() {
        return Hash::ZERO;
    }
    let mut level = hashes.to_vec();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            if let Some(last) = level.last().copied() {
                level.push(last);
            }
        }
        level = level
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }
    level[0]
}

fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_bytes());
    buf[32..].copy_from_slice(right.as_bytes());
    double_hash(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(b: u8) -> Hash {
        Hash([b; 32])
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(tx_root(&[]), Hash::ZERO);
    }

    #[test]
    fn test_single_is_itself() {
        assert_eq!(tx_root(&[h(1)]), h(1));
    }

    #[test]
    fn test_odd_duplicates_last() {
        assert_eq!(
            tx_root(&[h(1), h(2), h(3)]),
            tx_root(&[h(1), h(2), h(3), h(3)])
        );
    }

    #[test]
    fn test_order_matters() {
        assert_ne!(tx_root(&[h(1), h(2)]), tx_root(&[h(2), h(1)]));
        assert_eq!(tx_root(&[h(1), h(2)]), hash_pair(&h(1), &h(2)));
    }
}
