//! UTXO set logic backed by the storage trait.

use txp_primitives::encoding::{decode, encode};
use txp_primitives::{OutPoint, TxOut};
use txp_storage::{Column, KeyValueStore, WriteBatch};
use txp_toil::UtxoModifier;

use crate::state::ChainStateError;

pub const OUTPOINT_KEY_LEN: usize = 36;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct OutPointKey([u8; OUTPOINT_KEY_LEN]);

impl OutPointKey {
    pub fn new(outpoint: &OutPoint) -> Self {
        let mut bytes = [0u8; OUTPOINT_KEY_LEN];
        bytes[..32].copy_from_slice(&outpoint.hash);
        bytes[32..].copy_from_slice(&outpoint.index.to_le_bytes());
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; OUTPOINT_KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn outpoint(&self) -> OutPoint {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&self.0[..32]);
        let mut index = [0u8; 4];
        index.copy_from_slice(&self.0[32..]);
        OutPoint::new(hash, u32::from_le_bytes(index))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

pub struct UtxoSet<S> {
    store: S,
}

impl<S> UtxoSet<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStore> UtxoSet<S> {
    pub fn get(&self, outpoint: &OutPoint) -> Result<Option<TxOut>, ChainStateError> {
        let key = OutPointKey::new(outpoint);
        match self.store.get(Column::Utxo, key.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put(&self, batch: &mut WriteBatch, outpoint: &OutPoint, out: &TxOut) {
        let key = OutPointKey::new(outpoint);
        batch.put(Column::Utxo, key.as_bytes(), encode(out));
    }

    pub fn delete(&self, batch: &mut WriteBatch, outpoint: &OutPoint) {
        let key = OutPointKey::new(outpoint);
        batch.delete(Column::Utxo, key.as_bytes());
    }

    /// Writes the pending changes of `modifier` into `batch`.
    pub fn flush(&self, batch: &mut WriteBatch, modifier: &UtxoModifier) {
        for outpoint in modifier.deleted() {
            self.delete(batch, outpoint);
        }
        for (outpoint, out) in modifier.inserted() {
            self.put(batch, outpoint, out);
        }
    }

    /// Every unspent output, ordered by key.
    pub fn entries(&self) -> Result<Vec<(OutPoint, TxOut)>, ChainStateError> {
        let mut out = Vec::new();
        for (key, value) in self.store.scan_prefix(Column::Utxo, &[])? {
            let key = OutPointKey::from_slice(&key)
                .ok_or(ChainStateError::CorruptIndex("invalid utxo key"))?;
            out.push((key.outpoint(), decode(&value)?));
        }
        Ok(out)
    }
}
