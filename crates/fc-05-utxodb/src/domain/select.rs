//! UTXO selection shared by every reserver

use super::entities::Utxo;
use crate::error::{ReserveError, Result};
use shared_types::Outpoint;

/// Outcome of a successful selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub utxos: Vec<Utxo>,
    pub change: u64,
}

/// Pick unreserved UTXOs, in the order given, until `amount` is covered.
///
/// Fails with `Insufficient` when even all candidates together fall short,
/// and with `Reserved` when only the unreserved ones do.
pub fn select_utxos<'a, I, F>(candidates: I, amount: u64, is_reserved: F) -> Result<Selection>
where
    I: IntoIterator<Item = &'a Utxo>,
    F: Fn(&Outpoint) -> bool,
{
    let target = amount as u128;
    let mut total: u128 = 0;
    let mut unreserved: u128 = 0;
    let mut picked = Vec::new();

    for utxo in candidates {
        total += utxo.amount as u128;
        if unreserved >= target || is_reserved(&utxo.outpoint) {
            continue;
        }
        unreserved += utxo.amount as u128;
        picked.push(utxo.clone());
    }

    if unreserved >= target {
        let change = u64::try_from(unreserved - target).map_err(|_| {
            ReserveError::Store(format!("change of {} overflows", unreserved - target))
        })?;
        return Ok(Selection {
            utxos: picked,
            change,
        });
    }
    if total < target {
        return Err(ReserveError::Insufficient {
            requested: amount,
            available: total,
        });
    }
    Err(ReserveError::Reserved {
        requested: amount,
        unreserved,
    })
}
