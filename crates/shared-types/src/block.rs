//! # Blocks

use crate::codec::{write_prunable, write_varbytes, write_varint, EncodeMode, Reader, Sink};
use crate::errors::DecodeError;
use crate::hash::Hash;
use crate::tx::Tx;
use crate::Timestamp;
use serde::{Deserialize, Serialize};
use shared_crypto::DoubleSha256;

/// Block header.
///
/// `output_script` is the signer predicate the *next* block's
/// `signature_script` must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    pub height: u64,
    pub previous_block_hash: Hash,
    /// Merkle root over transaction hashes.
    pub tx_root: Hash,
    /// Patricia root of the ledger state after this block.
    pub state_root: Hash,
    pub timestamp: Timestamp,
    #[serde(with = "hex")]
    pub signature_script: Vec<u8>,
    #[serde(with = "hex")]
    pub output_script: Vec<u8>,
}

impl BlockHeader {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn encode<S: Sink + ?Sized>(&self, sink: &mut S, mode: EncodeMode) {
        self.encode_with_signature(sink, mode, &self.signature_script);
    }

    fn encode_with_signature<S: Sink + ?Sized>(
        &self,
        sink: &mut S,
        mode: EncodeMode,
        signature_script: &[u8],
    ) {
        sink.put(&self.version.to_le_bytes());
        sink.put(&self.height.to_le_bytes());
        sink.put(self.previous_block_hash.as_bytes());
        sink.put(self.tx_root.as_bytes());
        sink.put(self.state_root.as_bytes());
        sink.put(&self.timestamp.to_le_bytes());
        write_prunable(sink, signature_script, mode);
        write_varbytes(sink, &self.output_script);
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            version: r.read_u32()?,
            height: r.read_u64()?,
            previous_block_hash: r.read_hash()?,
            tx_root: r.read_hash()?,
            state_root: r.read_hash()?,
            timestamp: r.read_u64()?,
            signature_script: r.read_varbytes()?,
            output_script: r.read_varbytes()?,
        })
    }

    /// Block hash: double SHA-256 of the hashing-mode header.
    pub fn hash(&self) -> Hash {
        let mut hasher = DoubleSha256::new();
        self.encode(&mut hasher, EncodeMode::Hashing);
        Hash(hasher.finalize())
    }

    /// Digest signers sign: the header hash with `signature_script` blanked.
    pub fn hash_for_sig(&self) -> Hash {
        let mut hasher = DoubleSha256::new();
        self.encode_with_signature(&mut hasher, EncodeMode::Hashing, &[]);
        Hash(hasher.finalize())
    }
}

/// A header plus its ordered transactions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Tx>,
}

impl Block {
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) {
        self.header.encode(sink, EncodeMode::Wire);
        write_varint(sink, self.transactions.len() as u64);
        for tx in &self.transactions {
            tx.write_to(sink);
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }

    pub fn read_from(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let header = BlockHeader::decode(r)?;
        let n = r.read_len()?;
        let transactions = (0..n)
            .map(|_| Tx::read_from(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            header,
            transactions,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(bytes);
        let block = Self::read_from(&mut r)?;
        r.finish()?;
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{TxData, TxOutput};
    use crate::AssetId;

    fn header() -> BlockHeader {
        BlockHeader {
            version: 1,
            height: 7,
            previous_block_hash: Hash([1; 32]),
            tx_root: Hash([2; 32]),
            state_root: Hash([3; 32]),
            timestamp: 1_000,
            signature_script: vec![0x02, 0xde, 0xad],
            output_script: vec![0x51],
        }
    }

    #[test]
    fn test_hash_for_sig_ignores_signature() {
        let mut other = header();
        other.signature_script = vec![0x01, 0xff];
        assert_eq!(other.hash_for_sig(), header().hash_for_sig());
        assert_ne!(other.hash(), header().hash());
    }

    #[test]
    fn test_hash_for_sig_equals_hash_of_unsigned_header() {
        let mut unsigned = header();
        unsigned.signature_script.clear();
        assert_eq!(unsigned.hash(), header().hash_for_sig());
    }

    #[test]
    fn test_block_wire_roundtrip() {
        let tx = Tx::new(TxData {
            outputs: vec![TxOutput::new(AssetId(Hash([4; 32])), 10, vec![0x51])],
            ..TxData::default()
        });
        let block = Block {
            header: header(),
            transactions: vec![tx],
        };
        let decoded = Block::from_bytes(&block.to_bytes()).unwrap();
        assert_eq!(decoded, block);
        assert_eq!(decoded.hash(), block.hash());
    }
}
