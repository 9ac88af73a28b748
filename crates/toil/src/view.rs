//! UTXO views: lookup/mutation traits, the in-memory set and the pending
//! overlay used for pool admission.

use std::collections::{HashMap, HashSet};

use txp_primitives::{OutPoint, TxOut};

pub trait UtxoLookup {
    fn utxo_get(&self, outpoint: &OutPoint) -> Option<TxOut>;

    fn utxo_contains(&self, outpoint: &OutPoint) -> bool {
        self.utxo_get(outpoint).is_some()
    }
}

pub trait UtxoView: UtxoLookup {
    fn utxo_del(&mut self, outpoint: &OutPoint);
    fn utxo_put(&mut self, outpoint: OutPoint, out: TxOut);
}

pub type Utxo = HashMap<OutPoint, TxOut>;

impl UtxoLookup for Utxo {
    fn utxo_get(&self, outpoint: &OutPoint) -> Option<TxOut> {
        self.get(outpoint).cloned()
    }

    fn utxo_contains(&self, outpoint: &OutPoint) -> bool {
        self.contains_key(outpoint)
    }
}

impl UtxoView for Utxo {
    fn utxo_del(&mut self, outpoint: &OutPoint) {
        self.remove(outpoint);
    }

    fn utxo_put(&mut self, outpoint: OutPoint, out: TxOut) {
        self.insert(outpoint, out);
    }
}

/// Pending changes on top of a base UTXO set.
///
/// An entry is in at most one of `inserted` and `deleted`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UtxoModifier {
    inserted: HashMap<OutPoint, TxOut>,
    deleted: HashSet<OutPoint>,
}

impl UtxoModifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, outpoint: OutPoint, out: TxOut) {
        self.deleted.remove(&outpoint);
        self.inserted.insert(outpoint, out);
    }

    pub fn delete(&mut self, outpoint: &OutPoint) {
        self.inserted.remove(outpoint);
        self.deleted.insert(outpoint.clone());
    }

    pub fn lookup<B: UtxoLookup + ?Sized>(&self, base: &B, outpoint: &OutPoint) -> Option<TxOut> {
        if let Some(out) = self.inserted.get(outpoint) {
            return Some(out.clone());
        }
        if self.deleted.contains(outpoint) {
            return None;
        }
        base.utxo_get(outpoint)
    }

    pub fn inserted(&self) -> impl Iterator<Item = (&OutPoint, &TxOut)> {
        self.inserted.iter()
    }

    pub fn deleted(&self) -> impl Iterator<Item = &OutPoint> {
        self.deleted.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.deleted.is_empty()
    }

    pub fn clear(&mut self) {
        self.inserted.clear();
        self.deleted.clear();
    }
}

/// Read-through view of `base` with writes captured in a modifier.
pub struct UtxoOverlay<'a, B: ?Sized> {
    base: &'a B,
    modifier: &'a mut UtxoModifier,
}

impl<'a, B: UtxoLookup + ?Sized> UtxoOverlay<'a, B> {
    pub fn new(base: &'a B, modifier: &'a mut UtxoModifier) -> Self {
        Self { base, modifier }
    }
}

impl<B: UtxoLookup + ?Sized> UtxoLookup for UtxoOverlay<'_, B> {
    fn utxo_get(&self, outpoint: &OutPoint) -> Option<TxOut> {
        self.modifier.lookup(self.base, outpoint)
    }
}

impl<B: UtxoLookup + ?Sized> UtxoView for UtxoOverlay<'_, B> {
    fn utxo_del(&mut self, outpoint: &OutPoint) {
        self.modifier.delete(outpoint);
    }

    fn utxo_put(&mut self, outpoint: OutPoint, out: TxOut) {
        self.modifier.insert(outpoint, out);
    }
}
