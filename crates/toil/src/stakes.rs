//! Stake ledger contract and stake attribution of outputs.

use std::collections::HashMap;

use txp_consensus::{Amount, BootStakeholders, StakeholderId};
use txp_primitives::address::StakeDistribution;
use txp_primitives::TxOut;

pub trait StakeLedger {
    fn stake_of(&self, id: &StakeholderId) -> Amount;
    fn adjust_stake(&mut self, id: &StakeholderId, delta: Amount);
}

/// In-memory stake table with a running total. Zero balances are dropped.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StakeTable {
    stakes: HashMap<StakeholderId, Amount>,
    total: Amount,
}

impl StakeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_stake(&self) -> Amount {
        self.total
    }

    pub fn len(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stakes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StakeholderId, &Amount)> {
        self.stakes.iter()
    }
}

impl StakeLedger for StakeTable {
    fn stake_of(&self, id: &StakeholderId) -> Amount {
        self.stakes.get(id).copied().unwrap_or(0)
    }

    fn adjust_stake(&mut self, id: &StakeholderId, delta: Amount) {
        if delta == 0 {
            return;
        }
        let next = self.stake_of(id) + delta;
        if next == 0 {
            self.stakes.remove(id);
        } else {
            self.stakes.insert(*id, next);
        }
        self.total += delta;
    }
}

/// Stakeholders credited with the value of `out`.
///
/// Bootstrap-distributed value is split by boot stakeholder weight. Each
/// share is rounded down and the remainder goes one unit at a time to the
/// stakeholders in id order. Without boot stakeholders nobody is credited.
pub fn tx_out_stake(boot: &BootStakeholders, out: &TxOut) -> Vec<(StakeholderId, Amount)> {
    match out.address.attributes.stake_distribution {
        StakeDistribution::SingleKey(id) => vec![(id, out.value)],
        StakeDistribution::Bootstrap => split_by_weight(boot, out.value),
    }
}

fn split_by_weight(boot: &BootStakeholders, value: Amount) -> Vec<(StakeholderId, Amount)> {
    let total_weight = u128::from(boot.total_weight());
    if total_weight == 0 || value <= 0 {
        return Vec::new();
    }
    let value_wide = value as u128;
    let mut shares: Vec<(StakeholderId, Amount)> = boot
        .iter()
        .map(|(id, weight)| {
            let share = value_wide * u128::from(weight) / total_weight;
            (*id, share as Amount)
        })
        .collect();
    let assigned: Amount = shares.iter().map(|(_, share)| share).sum();
    let mut remainder = value - assigned;
    for (_, share) in shares.iter_mut() {
        if remainder == 0 {
            break;
        }
        *share += 1;
        remainder -= 1;
    }
    shares.retain(|(_, share)| *share != 0);
    shares
}
