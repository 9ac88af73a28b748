//! Local transaction pool and admission of individual transactions.

use std::collections::HashMap;

use txp_consensus::{ChainPolicy, EpochIndex};
use txp_primitives::{TxAux, TxId, TxUndo};

use crate::engine::verify_and_apply_tx;
use crate::error::ToilVerFailure;
use crate::verify::VerifyFlags;
use crate::view::{UtxoLookup, UtxoModifier, UtxoOverlay};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MempoolEntry {
    pub tx_aux: TxAux,
    pub undo: TxUndo,
}

/// Storage side of a pending pool.
pub trait MempoolStore {
    fn size(&self) -> usize;
    fn contains(&self, txid: &TxId) -> bool;
    /// Pending UTXO changes of the admitted transactions.
    fn utxo_modifier_mut(&mut self) -> &mut UtxoModifier;
    fn insert(&mut self, txid: TxId, tx_aux: TxAux, undo: TxUndo);
}

#[derive(Clone, Debug, Default)]
pub struct MemPool {
    entries: HashMap<TxId, MempoolEntry>,
    order: Vec<TxId>,
    modifier: UtxoModifier,
}

impl MemPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, txid: &TxId) -> bool {
        self.entries.contains_key(txid)
    }

    pub fn get(&self, txid: &TxId) -> Option<&MempoolEntry> {
        self.entries.get(txid)
    }

    /// Ids in admission order.
    pub fn txids(&self) -> &[TxId] {
        &self.order
    }

    /// Entries in admission order.
    pub fn iter(&self) -> impl Iterator<Item = (&TxId, &MempoolEntry)> {
        self.order
            .iter()
            .filter_map(|txid| self.entries.get(txid).map(|entry| (txid, entry)))
    }

    pub fn utxo_modifier(&self) -> &UtxoModifier {
        &self.modifier
    }

    /// Empties the pool, returning its transactions in admission order.
    pub fn take_all(&mut self) -> Vec<(TxId, TxAux)> {
        let mut entries = std::mem::take(&mut self.entries);
        self.modifier.clear();
        std::mem::take(&mut self.order)
            .into_iter()
            .filter_map(|txid| entries.remove(&txid).map(|entry| (txid, entry.tx_aux)))
            .collect()
    }
}

impl MempoolStore for MemPool {
    fn size(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, txid: &TxId) -> bool {
        self.entries.contains_key(txid)
    }

    fn utxo_modifier_mut(&mut self) -> &mut UtxoModifier {
        &mut self.modifier
    }

    fn insert(&mut self, txid: TxId, tx_aux: TxAux, undo: TxUndo) {
        if self
            .entries
            .insert(txid, MempoolEntry { tx_aux, undo })
            .is_none()
        {
            self.order.push(txid);
        }
    }
}

/// Admits one transaction into `pool`, verified in strict mode against the
/// chain UTXO overlaid with the pool's pending changes.
pub fn process_tx<B, P>(
    policy: &ChainPolicy,
    epoch: EpochIndex,
    limit: usize,
    chain_utxo: &B,
    pool: &mut P,
    txid: TxId,
    tx_aux: TxAux,
) -> Result<(), ToilVerFailure>
where
    B: UtxoLookup + ?Sized,
    P: MempoolStore + ?Sized,
{
    if pool.contains(&txid) {
        return Err(ToilVerFailure::AlreadyKnown);
    }
    if pool.size() >= limit {
        return Err(ToilVerFailure::Overwhelmed { limit });
    }
    let undo = {
        let mut view = UtxoOverlay::new(chain_utxo, pool.utxo_modifier_mut());
        verify_and_apply_tx(
            policy,
            epoch,
            VerifyFlags::strict(),
            &txid,
            &tx_aux,
            &mut view,
        )?
    };
    pool.insert(txid, tx_aux, undo);
    Ok(())
}
