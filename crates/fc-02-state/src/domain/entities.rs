use serde::{Deserialize, Serialize};
use shared_types::{double_hash, AssetAmount, AssetId, EncodeMode, Hash, Outpoint, TxOutput};

// =============================================================================
// OUTPUT
// =============================================================================

/// A transaction output as ledger state: where it lives, what it holds,
/// and whether it has been spent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub outpoint: Outpoint,
    pub output: TxOutput,
    pub spent: bool,
}

impl Output {
    /// A fresh unspent output.
    pub fn new(outpoint: Outpoint, output: TxOutput) -> Self {
        Self {
            outpoint,
            output,
            spent: false,
        }
    }

    /// The same output marked spent (a tombstone).
    pub fn into_spent(mut self) -> Self {
        self.spent = true;
        self
    }

    pub fn asset_id(&self) -> AssetId {
        self.output.asset_id
    }

    pub fn amount(&self) -> u64 {
        self.output.amount
    }

    pub fn asset_amount(&self) -> AssetAmount {
        self.output.asset_amount()
    }

    pub fn script(&self) -> &[u8] {
        &self.output.script
    }

    /// Key of this output in the state tree.
    pub fn state_key(&self) -> Hash {
        double_hash(&self.outpoint.to_bytes())
    }

    /// Leaf value committed for this output.
    pub fn commitment(&self) -> Hash {
        let mut buf = self.outpoint.to_bytes();
        self.output.encode(&mut buf, EncodeMode::Hashing);
        double_hash(&buf)
    }
}

// =============================================================================
// ASSET DEFINITION POINTER
// =============================================================================

/// Points an asset at the hash of its most recent definition blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDefinitionPointer {
    pub asset_id: AssetId,
    pub definition_hash: Hash,
}

impl AssetDefinitionPointer {
    /// Tag separating pointer keys from output keys.
    const KEY_TAG: u8 = 0x01;

    pub fn new(asset_id: AssetId, definition_hash: Hash) -> Self {
        Self {
            asset_id,
            definition_hash,
        }
    }

    pub fn state_key(&self) -> Hash {
        let mut buf = vec![Self::KEY_TAG];
        buf.extend_from_slice(self.asset_id.as_bytes());
        double_hash(&buf)
    }

    pub fn commitment(&self) -> Hash {
        let mut buf = self.asset_id.as_bytes().to_vec();
        buf.extend_from_slice(self.definition_hash.as_bytes());
        double_hash(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output() -> Output {
        Output::new(
            Outpoint::new(Hash([1; 32]), 0),
            TxOutput::new(AssetId(Hash([2; 32])), 5, vec![0x51]),
        )
    }

    #[test]
    fn test_spent_does_not_change_identity() {
        let o = output();
        let spent = o.clone().into_spent();
        assert!(spent.spent);
        assert_eq!(spent.state_key(), o.state_key());
    }

    #[test]
    fn test_commitment_covers_amount() {
        let mut other = output();
        other.output.amount = 6;
        assert_ne!(other.commitment(), output().commitment());
    }

    #[test]
    fn test_output_json_is_hex() {
        let spent = output().into_spent();
        let json = serde_json::to_value(&spent).unwrap();
        assert_eq!(json["outpoint"]["hash"], "01".repeat(32));
        assert_eq!(json["outpoint"]["index"], 0);
        assert_eq!(json["output"]["asset_id"], "02".repeat(32));
        assert_eq!(json["output"]["script"], "51");
        assert_eq!(json["spent"], true);

        let back: Output = serde_json::from_value(json).unwrap();
        assert_eq!(back, spent);
    }

    #[test]
    fn test_adp_json_roundtrip() {
        let adp = AssetDefinitionPointer::new(AssetId(Hash([1; 32])), Hash([9; 32]));
        let json = serde_json::to_string(&adp).unwrap();
        assert!(json.contains(&"09".repeat(32)));
        assert_eq!(serde_json::from_str::<AssetDefinitionPointer>(&json).unwrap(), adp);
    }

    #[test]
    fn test_adp_key_differs_from_output_key_space() {
        let adp = AssetDefinitionPointer::new(AssetId(Hash([1; 32])), Hash([9; 32]));
        assert_ne!(adp.state_key(), double_hash(adp.asset_id.as_bytes()));
    }
}
