use std::sync::Arc;

use txp_consensus::{Amount, BootStakeholders, ChainPolicy, EpochIndex, StakeholderId};
use txp_log::{log_debug, log_info};
use txp_primitives::encoding::{decode, encode, DecodeError};
use txp_primitives::{to_hex, OutPoint, TxAux, TxIn, TxOut};
use txp_storage::{Column, KeyValueStore, StoreError, WriteBatch};
use txp_toil::{
    apply_block, rollback_block, tx_out_stake, verify_block, BlockTxFailure, StakeLedger, Utxo,
    UtxoModifier, UtxoOverlay,
};

use crate::blocks::{BlockId, BlockRecord};
use crate::stakes::{StakeDeltas, StakeStore};
use crate::undo::BlockUndo;
use crate::utxo::UtxoSet;

const TIP_KEY: &[u8] = b"tip";
const GENESIS_KEY: &[u8] = b"genesis";

#[derive(Debug)]
pub enum ChainStateError {
    Toil(BlockTxFailure),
    Store(StoreError),
    Decode(DecodeError),
    UnknownBlock(BlockId),
    DuplicateBlock(BlockId),
    /// Only the current tip can be disconnected.
    NotTip(BlockId),
    GenesisExists,
    CorruptIndex(&'static str),
}

impl std::fmt::Display for ChainStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainStateError::Toil(err) => write!(f, "{err}"),
            ChainStateError::Store(err) => write!(f, "{err}"),
            ChainStateError::Decode(err) => write!(f, "{err}"),
            ChainStateError::UnknownBlock(id) => write!(f, "unknown block {}", to_hex(id)),
            ChainStateError::DuplicateBlock(id) => {
                write!(f, "block {} already connected", to_hex(id))
            }
            ChainStateError::NotTip(id) => write!(f, "block {} is not the tip", to_hex(id)),
            ChainStateError::GenesisExists => write!(f, "genesis already initialized"),
            ChainStateError::CorruptIndex(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ChainStateError {}

impl From<BlockTxFailure> for ChainStateError {
    fn from(err: BlockTxFailure) -> Self {
        ChainStateError::Toil(err)
    }
}

impl From<StoreError> for ChainStateError {
    fn from(err: StoreError) -> Self {
        ChainStateError::Store(err)
    }
}

impl From<DecodeError> for ChainStateError {
    fn from(err: DecodeError) -> Self {
        ChainStateError::Decode(err)
    }
}

pub struct ChainState<S> {
    store: Arc<S>,
    utxos: UtxoSet<Arc<S>>,
    stakes: StakeStore<Arc<S>>,
}

impl<S: KeyValueStore> ChainState<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            utxos: UtxoSet::new(Arc::clone(&store)),
            stakes: StakeStore::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn tip(&self) -> Result<Option<BlockId>, ChainStateError> {
        match self.store.get(Column::Meta, TIP_KEY)? {
            None => Ok(None),
            Some(bytes) => {
                let id: BlockId = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| ChainStateError::CorruptIndex("invalid tip entry"))?;
                Ok(Some(id))
            }
        }
    }

    /// Seeds the initial unspent outputs and their stake.
    pub fn genesis_batch(
        &self,
        entries: &[(OutPoint, TxOut)],
        boot: &BootStakeholders,
    ) -> Result<WriteBatch, ChainStateError> {
        if self.store.get(Column::Meta, GENESIS_KEY)?.is_some() {
            return Err(ChainStateError::GenesisExists);
        }
        let mut batch = WriteBatch::new();
        let mut deltas = StakeDeltas::new();
        for (outpoint, out) in entries {
            self.utxos.put(&mut batch, outpoint, out);
            for (id, value) in tx_out_stake(boot, out) {
                deltas.adjust_stake(&id, value);
            }
        }
        self.stakes.flush(&mut batch, &deltas)?;
        batch.put(Column::Meta, GENESIS_KEY, [1u8]);
        log_info!("genesis with {} outputs", entries.len());
        Ok(batch)
    }

    /// Loads every stored output referenced by the inputs of `txs`.
    pub fn prefetch_inputs<'a, I>(&self, txs: I) -> Result<Utxo, ChainStateError>
    where
        I: IntoIterator<Item = &'a TxAux>,
    {
        let mut utxo = Utxo::new();
        for tx_aux in txs {
            for outpoint in tx_aux.tx.inputs.iter().filter_map(TxIn::outpoint) {
                if utxo.contains_key(outpoint) {
                    continue;
                }
                if let Some(out) = self.utxos.get(outpoint)? {
                    utxo.insert(outpoint.clone(), out);
                }
            }
        }
        Ok(utxo)
    }

    /// Verifies `txs` on top of the current tip and returns the writes that
    /// connect them as block `block_id`.
    pub fn connect_block(
        &self,
        block_id: &BlockId,
        txs: &[TxAux],
        policy: &ChainPolicy,
        boot: &BootStakeholders,
        epoch: EpochIndex,
    ) -> Result<WriteBatch, ChainStateError> {
        if self.store.get(Column::BlockTxs, block_id)?.is_some() {
            return Err(ChainStateError::DuplicateBlock(*block_id));
        }
        let base = self.prefetch_inputs(txs)?;

        let mut scratch = UtxoModifier::new();
        let undos = verify_block(
            policy,
            epoch,
            false,
            txs,
            &mut UtxoOverlay::new(&base, &mut scratch),
        )?;

        let pairs: Vec<(TxAux, _)> = txs.iter().cloned().zip(undos).collect();
        let mut modifier = UtxoModifier::new();
        let mut deltas = StakeDeltas::new();
        apply_block(
            boot,
            &pairs,
            &mut UtxoOverlay::new(&base, &mut modifier),
            &mut deltas,
        );

        let mut batch = WriteBatch::new();
        self.utxos.flush(&mut batch, &modifier);
        self.stakes.flush(&mut batch, &deltas)?;

        let (txs, undos): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        let record = BlockRecord {
            prev: self.tip()?,
            txs,
        };
        batch.put(Column::BlockTxs, block_id, encode(&record));
        batch.put(Column::BlockUndo, block_id, BlockUndo { txs: undos }.encode());
        batch.put(Column::Meta, TIP_KEY, block_id);
        log_debug!(
            "connect block {} with {} transactions",
            to_hex(block_id),
            record.txs.len()
        );
        Ok(batch)
    }

    /// Returns the writes that revert the tip block `block_id`.
    pub fn disconnect_block(
        &self,
        block_id: &BlockId,
        boot: &BootStakeholders,
    ) -> Result<WriteBatch, ChainStateError> {
        let record = self
            .block_record(block_id)?
            .ok_or(ChainStateError::UnknownBlock(*block_id))?;
        if self.tip()? != Some(*block_id) {
            return Err(ChainStateError::NotTip(*block_id));
        }
        let undo = self
            .store
            .get(Column::BlockUndo, block_id)?
            .ok_or(ChainStateError::CorruptIndex("missing block undo entry"))?;
        let undo = BlockUndo::decode(&undo)?;
        if undo.txs.len() != record.txs.len()
            || record
                .txs
                .iter()
                .zip(&undo.txs)
                .any(|(tx_aux, tx_undo)| tx_aux.tx.inputs.len() != tx_undo.len())
        {
            return Err(ChainStateError::CorruptIndex(
                "block undo does not match block transactions",
            ));
        }

        let tx_count = record.txs.len();
        let pairs: Vec<_> = record.txs.into_iter().zip(undo.txs).collect();
        let base = Utxo::new();
        let mut modifier = UtxoModifier::new();
        let mut deltas = StakeDeltas::new();
        rollback_block(
            boot,
            &pairs,
            &mut UtxoOverlay::new(&base, &mut modifier),
            &mut deltas,
        );

        let mut batch = WriteBatch::new();
        self.utxos.flush(&mut batch, &modifier);
        self.stakes.flush(&mut batch, &deltas)?;
        batch.delete(Column::BlockTxs, block_id);
        batch.delete(Column::BlockUndo, block_id);
        match record.prev {
            Some(prev) => batch.put(Column::Meta, TIP_KEY, prev),
            None => batch.delete(Column::Meta, TIP_KEY),
        }
        log_debug!(
            "disconnect block {} with {} transactions",
            to_hex(block_id),
            tx_count
        );
        Ok(batch)
    }

    pub fn commit_batch(&self, batch: WriteBatch) -> Result<(), ChainStateError> {
        let ops = batch.len();
        self.store.write_batch(&batch)?;
        if ops > 0 {
            log_debug!("committed {ops} writes");
        }
        Ok(())
    }

    pub fn utxo_entry(&self, outpoint: &OutPoint) -> Result<Option<TxOut>, ChainStateError> {
        self.utxos.get(outpoint)
    }

    pub fn utxo_entries(&self) -> Result<Vec<(OutPoint, TxOut)>, ChainStateError> {
        self.utxos.entries()
    }

    pub fn stake(&self, id: &StakeholderId) -> Result<Amount, ChainStateError> {
        self.stakes.get(id)
    }

    pub fn total_stake(&self) -> Result<Amount, ChainStateError> {
        self.stakes.total()
    }

    pub fn block_txs(&self, block_id: &BlockId) -> Result<Option<Vec<TxAux>>, ChainStateError> {
        Ok(self.block_record(block_id)?.map(|record| record.txs))
    }

    fn block_record(&self, block_id: &BlockId) -> Result<Option<BlockRecord>, ChainStateError> {
        match self.store.get(Column::BlockTxs, block_id)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }
}
