//! Reservation entities

use serde::{Deserialize, Serialize};
use shared_types::{AssetAmount, AssetId, Outpoint, Timestamp};

pub type ReservationId = u64;

/// The (asset, account) pair funds are drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Source {
    pub asset_id: AssetId,
    pub account_id: String,
}

impl Source {
    pub fn new(asset_id: AssetId, account_id: impl Into<String>) -> Self {
        Self {
            asset_id,
            account_id: account_id.into(),
        }
    }
}

/// A spendable output owned by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub outpoint: Outpoint,
    pub asset_id: AssetId,
    pub amount: u64,
    #[serde(with = "hex")]
    pub control_program: Vec<u8>,
    pub account_id: String,
    /// Key derivation index of the control program's key.
    pub derivation_index: u64,
}

impl Utxo {
    pub fn source(&self) -> Source {
        Source::new(self.asset_id, self.account_id.clone())
    }

    pub fn asset_amount(&self) -> AssetAmount {
        AssetAmount::new(self.asset_id, self.amount)
    }
}

/// UTXOs held for one pending transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(rename = "reservation_id")]
    pub id: ReservationId,
    pub source: Source,
    pub utxos: Vec<Utxo>,
    /// Reserved total minus the requested amount.
    pub change: u64,
    #[serde(rename = "reserved_until")]
    pub expiry: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
}

impl Reservation {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiry <= now
    }

    pub fn total(&self) -> u128 {
        self.utxos.iter().map(|u| u.amount as u128).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Hash;

    #[test]
    fn test_reservation_json_shape() {
        let utxo = Utxo {
            outpoint: Outpoint::new(Hash([1; 32]), 2),
            asset_id: AssetId(Hash([3; 32])),
            amount: 10,
            control_program: vec![0x51],
            account_id: "acc".into(),
            derivation_index: 7,
        };
        let reservation = Reservation {
            id: 4,
            source: utxo.source(),
            utxos: vec![utxo],
            change: 3,
            expiry: 1_000,
            client_token: None,
        };

        let json = serde_json::to_value(&reservation).unwrap();
        assert_eq!(json["reservation_id"], 4);
        assert_eq!(json["reserved_until"], 1_000);
        assert_eq!(json["change"], 3);
        assert_eq!(json["utxos"][0]["control_program"], "51");
        assert!(json.get("client_token").is_none());

        let back: Reservation = serde_json::from_value(json).unwrap();
        assert_eq!(back, reservation);
    }
}
