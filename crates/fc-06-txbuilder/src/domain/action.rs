//! Sources and destinations of value

use super::template::SigningInstruction;
use crate::error::Result;
use fc_05_utxodb::{self as utxodb, ReservationId, UtxoReserver};
use serde::{Deserialize, Serialize};
use shared_types::{
    AssetAmount, AssetId, Hash, Outpoint, Timestamp, TxInput, TxOutput, INVALID_OUTPUT_INDEX,
};

/// Where the value of a transaction comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    /// Spend `amount` of an asset from an account, returning change to
    /// `change_program`.
    Account {
        asset_id: AssetId,
        account_id: String,
        amount: u64,
        #[serde(default)]
        client_token: Option<String>,
        #[serde(with = "hex")]
        change_program: Vec<u8>,
    },
    /// Spend one specific UTXO.
    Utxo {
        outpoint: Outpoint,
        #[serde(default)]
        client_token: Option<String>,
    },
    /// Issue `amount` new units of the asset defined by `program`.
    Issuance {
        #[serde(with = "hex")]
        program: Vec<u8>,
        #[serde(with = "hex")]
        definition: Vec<u8>,
        amount: u64,
    },
}

/// Where value goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub asset_amount: AssetAmount,
    #[serde(with = "hex")]
    pub program: Vec<u8>,
    #[serde(default, with = "hex")]
    pub metadata: Vec<u8>,
}

impl Destination {
    pub fn new(asset_id: AssetId, amount: u64, program: Vec<u8>) -> Self {
        Self {
            asset_amount: AssetAmount::new(asset_id, amount),
            program,
            metadata: Vec::new(),
        }
    }

    pub fn to_output(&self) -> TxOutput {
        TxOutput {
            asset_id: self.asset_amount.asset_id,
            amount: self.asset_amount.amount,
            script: self.program.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Inputs and change produced by reserving one source.
#[derive(Debug, Default)]
pub(crate) struct Reserved {
    pub inputs: Vec<(TxInput, SigningInstruction)>,
    pub change: Option<Destination>,
    pub reservation: Option<ReservationId>,
}

impl Source {
    pub(crate) async fn reserve(
        &self,
        reserver: &dyn UtxoReserver,
        chain_id: Hash,
        expiry: Timestamp,
    ) -> Result<Reserved> {
        match self {
            Source::Account {
                asset_id,
                account_id,
                amount,
                client_token,
                change_program,
            } => {
                let source = utxodb::Source::new(*asset_id, account_id.clone());
                let reservation = reserver
                    .reserve(&source, *amount, client_token.as_deref(), expiry)
                    .await?;
                let change = (reservation.change > 0).then(|| {
                    Destination::new(*asset_id, reservation.change, change_program.clone())
                });
                Ok(Reserved {
                    inputs: reserved_inputs(&reservation)?,
                    change,
                    reservation: Some(reservation.id),
                })
            }
            Source::Utxo {
                outpoint,
                client_token,
            } => {
                let reservation = reserver
                    .reserve_utxo(outpoint, client_token.as_deref(), expiry)
                    .await?;
                Ok(Reserved {
                    inputs: reserved_inputs(&reservation)?,
                    change: None,
                    reservation: Some(reservation.id),
                })
            }
            Source::Issuance {
                program,
                definition,
                amount,
            } => {
                let asset_id = AssetId::new(program, &chain_id);
                let input = TxInput {
                    previous: Outpoint::new(chain_id, INVALID_OUTPUT_INDEX),
                    signature_script: Vec::new(),
                    metadata: rand::random::<[u8; 8]>().to_vec(),
                    asset_definition: definition.clone(),
                };
                let instruction = SigningInstruction::for_issuance(
                    AssetAmount::new(asset_id, *amount),
                    program.clone(),
                );
                Ok(Reserved {
                    inputs: vec![(input, instruction)],
                    ..Reserved::default()
                })
            }
        }
    }
}

fn reserved_inputs(
    reservation: &utxodb::Reservation,
) -> Result<Vec<(TxInput, SigningInstruction)>> {
    reservation
        .utxos
        .iter()
        .map(|utxo| {
            let instruction =
                SigningInstruction::for_program(utxo.asset_amount(), &utxo.control_program)?;
            let input = TxInput {
                previous: utxo.outpoint,
                ..TxInput::default()
            };
            Ok((input, instruction))
        })
        .collect()
}
