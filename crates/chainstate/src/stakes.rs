//! Stake table persisted per stakeholder, plus the running total.

use std::collections::BTreeMap;

use txp_consensus::{Amount, StakeholderId};
use txp_storage::{Column, KeyValueStore, WriteBatch};
use txp_toil::StakeLedger;

use crate::state::ChainStateError;

pub const TOTAL_STAKE_KEY: &[u8] = b"total_stake";

/// Stake changes collected while applying or rolling back a block.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StakeDeltas {
    deltas: BTreeMap<StakeholderId, Amount>,
}

impl StakeDeltas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StakeholderId, Amount)> {
        self.deltas
            .iter()
            .filter(|(_, delta)| **delta != 0)
            .map(|(id, delta)| (id, *delta))
    }
}

impl StakeLedger for StakeDeltas {
    /// The accumulated change, not the stored balance.
    fn stake_of(&self, id: &StakeholderId) -> Amount {
        self.deltas.get(id).copied().unwrap_or(0)
    }

    fn adjust_stake(&mut self, id: &StakeholderId, delta: Amount) {
        *self.deltas.entry(*id).or_insert(0) += delta;
    }
}

pub struct StakeStore<S> {
    store: S,
}

impl<S> StakeStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStore> StakeStore<S> {
    pub fn get(&self, id: &StakeholderId) -> Result<Amount, ChainStateError> {
        read_amount(self.store.get(Column::Stake, id.as_bytes())?)
    }

    pub fn total(&self) -> Result<Amount, ChainStateError> {
        read_amount(self.store.get(Column::Meta, TOTAL_STAKE_KEY)?)
    }

    /// Adds `deltas` to the stored balances, writing the results into `batch`.
    pub fn flush(&self, batch: &mut WriteBatch, deltas: &StakeDeltas) -> Result<(), ChainStateError> {
        let mut total_delta: Amount = 0;
        for (id, delta) in deltas.iter() {
            let next = self
                .get(id)?
                .checked_add(delta)
                .ok_or(ChainStateError::CorruptIndex("stake overflow"))?;
            if next < 0 {
                return Err(ChainStateError::CorruptIndex("negative stake"));
            }
            if next == 0 {
                batch.delete(Column::Stake, id.as_bytes());
            } else {
                batch.put(Column::Stake, id.as_bytes(), next.to_le_bytes());
            }
            total_delta += delta;
        }
        if total_delta != 0 {
            let total = self.total()? + total_delta;
            batch.put(Column::Meta, TOTAL_STAKE_KEY, total.to_le_bytes());
        }
        Ok(())
    }
}

fn read_amount(bytes: Option<Vec<u8>>) -> Result<Amount, ChainStateError> {
    match bytes {
        None => Ok(0),
        Some(bytes) => {
            let raw: [u8; 8] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| ChainStateError::CorruptIndex("invalid stake entry"))?;
            Ok(Amount::from_le_bytes(raw))
        }
    }
}
