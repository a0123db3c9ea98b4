//! # Transactions
//!
//! `TxData` is the mutable content; `Tx` pairs it with its memoized hash.
//! A `Tx` is immutable once built, so the hash can never go stale.

use crate::codec::{write_prunable, write_varbytes, write_varint, EncodeMode, Reader, Sink};
use crate::errors::DecodeError;
use crate::hash::{AssetId, Hash};
use serde::{Deserialize, Serialize};
use shared_crypto::DoubleSha256;
use std::fmt;
use std::ops::Deref;

/// Output index marking an issuance input (no real previous output).
pub const INVALID_OUTPUT_INDEX: u32 = 0xffff_ffff;

/// Pointer to a specific transaction output.
///
/// Ordered by hash bytes, then index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Outpoint {
    pub hash: Hash,
    pub index: u32,
}

impl Outpoint {
    pub fn new(hash: Hash, index: u32) -> Self {
        Self { hash, index }
    }

    /// True if this outpoint marks an issuance.
    pub fn is_issuance(&self) -> bool {
        self.index == INVALID_OUTPUT_INDEX
    }

    pub fn encode<S: Sink + ?Sized>(&self, sink: &mut S) {
        sink.put(self.hash.as_bytes());
        sink.put(&self.index.to_le_bytes());
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            hash: r.read_hash()?,
            index: r.read_u32()?,
        })
    }

    /// The 36-byte encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(36);
        self.encode(&mut buf);
        buf
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hash, self.index)
    }
}

impl fmt::Debug for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Outpoint({}:{})", self.hash, self.index)
    }
}

/// An asset and a quantity of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AssetAmount {
    pub asset_id: AssetId,
    pub amount: u64,
}

impl AssetAmount {
    pub fn new(asset_id: AssetId, amount: u64) -> Self {
        Self { asset_id, amount }
    }
}

/// Transaction input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxInput {
    pub previous: Outpoint,
    #[serde(with = "hex")]
    pub signature_script: Vec<u8>,
    #[serde(with = "hex", default)]
    pub metadata: Vec<u8>,
    /// Asset definition blob; only meaningful on issuance inputs.
    #[serde(with = "hex", default)]
    pub asset_definition: Vec<u8>,
}

impl TxInput {
    /// True if this input manufactures value instead of spending an output.
    pub fn is_issuance(&self) -> bool {
        self.previous.is_issuance()
    }

    pub fn encode<S: Sink + ?Sized>(&self, sink: &mut S, mode: EncodeMode) {
        self.previous.encode(sink);
        write_prunable(sink, &self.signature_script, mode);
        write_prunable(sink, &self.metadata, mode);
        write_prunable(sink, &self.asset_definition, mode);
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            previous: Outpoint::decode(r)?,
            signature_script: r.read_varbytes()?,
            metadata: r.read_varbytes()?,
            asset_definition: r.read_varbytes()?,
        })
    }
}

/// Transaction output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxOutput {
    pub asset_id: AssetId,
    pub amount: u64,
    /// Spending predicate.
    #[serde(with = "hex")]
    pub script: Vec<u8>,
    #[serde(with = "hex", default)]
    pub metadata: Vec<u8>,
}

impl TxOutput {
    pub fn new(asset_id: AssetId, amount: u64, script: Vec<u8>) -> Self {
        Self {
            asset_id,
            amount,
            script,
            metadata: Vec::new(),
        }
    }

    pub fn asset_amount(&self) -> AssetAmount {
        AssetAmount::new(self.asset_id, self.amount)
    }

    pub fn encode<S: Sink + ?Sized>(&self, sink: &mut S, mode: EncodeMode) {
        sink.put(self.asset_id.as_bytes());
        sink.put(&self.amount.to_le_bytes());
        write_varbytes(sink, &self.script);
        write_prunable(sink, &self.metadata, mode);
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            asset_id: AssetId(r.read_hash()?),
            amount: r.read_u64()?,
            script: r.read_varbytes()?,
            metadata: r.read_varbytes()?,
        })
    }
}

/// Transaction content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxData {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// Earliest block timestamp (ms) at which the transaction is valid.
    pub lock_time: u64,
    #[serde(with = "hex", default)]
    pub metadata: Vec<u8>,
}

impl Default for TxData {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            metadata: Vec::new(),
        }
    }
}

impl TxData {
    pub const CURRENT_VERSION: u32 = 1;

    /// True if any input is an issuance input.
    pub fn is_issuance(&self) -> bool {
        self.inputs.iter().any(TxInput::is_issuance)
    }

    pub fn encode<S: Sink + ?Sized>(&self, sink: &mut S, mode: EncodeMode) {
        sink.put(&self.version.to_le_bytes());
        write_varint(sink, self.inputs.len() as u64);
        for input in &self.inputs {
            input.encode(sink, mode);
        }
        write_varint(sink, self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode(sink, mode);
        }
        sink.put(&self.lock_time.to_le_bytes());
        write_prunable(sink, &self.metadata, mode);
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let version = r.read_u32()?;
        let n_inputs = r.read_len()?;
        let inputs = (0..n_inputs)
            .map(|_| TxInput::decode(r))
            .collect::<Result<Vec<_>, _>>()?;
        let n_outputs = r.read_len()?;
        let outputs = (0..n_outputs)
            .map(|_| TxOutput::decode(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            version,
            inputs,
            outputs,
            lock_time: r.read_u64()?,
            metadata: r.read_varbytes()?,
        })
    }

    /// Double SHA-256 of the hashing-mode serialization.
    pub fn hash(&self) -> Hash {
        let mut hasher = DoubleSha256::new();
        self.encode(&mut hasher, EncodeMode::Hashing);
        Hash(hasher.finalize())
    }

    /// Outpoint of output `index` of this transaction.
    pub fn outpoint(&self, index: u32) -> Outpoint {
        Outpoint::new(self.hash(), index)
    }
}

/// A transaction with its memoized hash.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TxData", into = "TxData")]
pub struct Tx {
    data: TxData,
    hash: Hash,
}

impl Tx {
    /// Freeze `data` and compute its hash.
    pub fn new(data: TxData) -> Self {
        let hash = data.hash();
        Self { data, hash }
    }

    /// The memoized transaction hash.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// Outpoint of output `index` of this transaction.
    pub fn outpoint(&self, index: u32) -> Outpoint {
        Outpoint::new(self.hash, index)
    }

    pub fn data(&self) -> &TxData {
        &self.data
    }

    pub fn into_data(self) -> TxData {
        self.data
    }

    /// Full wire serialization.
    pub fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) {
        self.data.encode(sink, EncodeMode::Wire);
    }

    /// Hashing serialization.
    pub fn write_for_hash_to<S: Sink + ?Sized>(&self, sink: &mut S) {
        self.data.encode(sink, EncodeMode::Hashing);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.write_to(&mut buf);
        buf
    }

    pub fn read_from(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        TxData::decode(r).map(Self::new)
    }

    /// Decode exactly one transaction from `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(bytes);
        let tx = Self::read_from(&mut r)?;
        r.finish()?;
        Ok(tx)
    }
}

impl Deref for Tx {
    type Target = TxData;

    fn deref(&self) -> &TxData {
        &self.data
    }
}

impl From<TxData> for Tx {
    fn from(data: TxData) -> Self {
        Self::new(data)
    }
}

impl From<Tx> for TxData {
    fn from(tx: Tx) -> Self {
        tx.data
    }
}

impl fmt::Debug for Tx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tx")
            .field("hash", &self.hash)
            .field("data", &self.data)
            .finish()
    }
}
