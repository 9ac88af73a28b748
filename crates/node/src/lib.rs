//! Node-facing transaction processing service: one lock guarding the chain
//! state, the pending pool and the current epoch.

pub mod config;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use txp_chainstate::blocks::BlockId;
use txp_chainstate::state::{ChainState, ChainStateError};
use txp_consensus::{ChainParams, EpochIndex};
use txp_log::{log_debug, log_info, log_warn};
use txp_primitives::{to_hex, OutPoint, TxAux, TxId, TxOut};
use txp_storage::KeyValueStore;
use txp_toil::{normalize, process_tx, MemPool, ToilVerFailure};

pub use config::{load_node_config, NodeConfig};

#[derive(Debug)]
pub enum TxpError {
    Rejected(ToilVerFailure),
    Chain(ChainStateError),
    Poisoned,
}

impl fmt::Display for TxpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxpError::Rejected(err) => write!(f, "transaction rejected: {err}"),
            TxpError::Chain(err) => write!(f, "{err}"),
            TxpError::Poisoned => write!(f, "txp state lock poisoned"),
        }
    }
}

impl std::error::Error for TxpError {}

impl From<ToilVerFailure> for TxpError {
    fn from(err: ToilVerFailure) -> Self {
        TxpError::Rejected(err)
    }
}

impl From<ChainStateError> for TxpError {
    fn from(err: ChainStateError) -> Self {
        TxpError::Chain(err)
    }
}

struct Inner<S> {
    chain: ChainState<S>,
    pool: MemPool,
    epoch: EpochIndex,
}

pub struct Txp<S> {
    config: NodeConfig,
    inner: Mutex<Inner<S>>,
}

impl<S: KeyValueStore> Txp<S> {
    pub fn new(store: Arc<S>, config: NodeConfig) -> Self {
        txp_log::init(config.log);
        log_info!(
            "txp starting on {} (mempool limit {})",
            config.params.network.as_str(),
            config.params.mempool_limit
        );
        Self {
            config,
            inner: Mutex::new(Inner {
                chain: ChainState::new(store),
                pool: MemPool::new(),
                epoch: 0,
            }),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<S>>, TxpError> {
        self.inner.lock().map_err(|_| TxpError::Poisoned)
    }

    pub fn init_genesis(&self, entries: &[(OutPoint, TxOut)]) -> Result<(), TxpError> {
        let inner = self.lock()?;
        let batch = inner
            .chain
            .genesis_batch(entries, &self.config.params.boot_stakeholders)?;
        inner.chain.commit_batch(batch)?;
        Ok(())
    }

    /// Verifies `tx_aux` against the chain and the pool and admits it.
    pub fn submit_tx(&self, tx_aux: TxAux) -> Result<TxId, TxpError> {
        let mut inner = self.lock()?;
        let inner = &mut *inner;
        let txid = tx_aux.txid();
        let chain_utxo = inner.chain.prefetch_inputs([&tx_aux])?;
        let params = &self.config.params;
        process_tx(
            &params.policy,
            inner.epoch,
            params.mempool_limit,
            &chain_utxo,
            &mut inner.pool,
            txid,
            tx_aux,
        )?;
        log_debug!(
            "accepted {} into pool ({} pending)",
            to_hex(&txid),
            inner.pool.len()
        );
        Ok(txid)
    }

    /// Connects `txs` as the new tip and re-validates the pool against it.
    pub fn adopt_block(&self, block_id: &BlockId, txs: &[TxAux]) -> Result<(), TxpError> {
        let mut inner = self.lock()?;
        let inner = &mut *inner;
        let params = &self.config.params;
        let batch = inner.chain.connect_block(
            block_id,
            txs,
            &params.policy,
            &params.boot_stakeholders,
            inner.epoch,
        )?;
        inner.chain.commit_batch(batch)?;

        let previous = std::mem::take(&mut inner.pool);
        let before = previous.len();
        let candidates = pending_txs(&previous).collect();
        Self::refill_pool(inner, params, previous, candidates);
        log_info!(
            "adopted block {} with {} transactions, pool {} -> {}",
            to_hex(block_id),
            txs.len(),
            before,
            inner.pool.len()
        );
        Ok(())
    }

    /// Disconnects the tip block `block_id`; its transactions go back in
    /// front of the pending ones.
    pub fn rollback_block(&self, block_id: &BlockId) -> Result<(), TxpError> {
        let mut inner = self.lock()?;
        let inner = &mut *inner;
        let params = &self.config.params;
        let block_txs = inner
            .chain
            .block_txs(block_id)?
            .ok_or(ChainStateError::UnknownBlock(*block_id))?;
        let batch = inner
            .chain
            .disconnect_block(block_id, &params.boot_stakeholders)?;
        inner.chain.commit_batch(batch)?;

        let previous = std::mem::take(&mut inner.pool);
        let before = previous.len();
        let mut candidates: Vec<(TxId, TxAux)> = block_txs
            .into_iter()
            .map(|tx_aux| (tx_aux.txid(), tx_aux))
            .collect();
        candidates.extend(pending_txs(&previous));
        Self::refill_pool(inner, params, previous, candidates);
        log_info!(
            "rolled back block {}, pool {} -> {}",
            to_hex(block_id),
            before,
            inner.pool.len()
        );
        Ok(())
    }

    /// Rebuilds the empty pool from `candidates` against the committed chain.
    /// If the chain view cannot be read, `previous` is put back unchanged.
    fn refill_pool(
        inner: &mut Inner<S>,
        params: &ChainParams,
        previous: MemPool,
        candidates: Vec<(TxId, TxAux)>,
    ) {
        let chain_utxo = match inner
            .chain
            .prefetch_inputs(candidates.iter().map(|(_, tx_aux)| tx_aux))
        {
            Ok(chain_utxo) => chain_utxo,
            Err(err) => {
                log_warn!(
                    "keeping {} pending transactions unrevalidated: {err}",
                    previous.len()
                );
                inner.pool = previous;
                return;
            }
        };
        normalize(
            &params.policy,
            inner.epoch,
            params.mempool_limit,
            &chain_utxo,
            &mut inner.pool,
            candidates,
        );
    }

    pub fn set_epoch(&self, epoch: EpochIndex) -> Result<(), TxpError> {
        self.lock()?.epoch = epoch;
        Ok(())
    }

    pub fn epoch(&self) -> Result<EpochIndex, TxpError> {
        Ok(self.lock()?.epoch)
    }

    pub fn mempool_len(&self) -> Result<usize, TxpError> {
        Ok(self.lock()?.pool.len())
    }

    /// Pending transaction ids in admission order.
    pub fn mempool_txids(&self) -> Result<Vec<TxId>, TxpError> {
        Ok(self.lock()?.pool.txids().to_vec())
    }

    /// Runs `f` against the chain state while holding the lock.
    pub fn with_chain<R>(&self, f: impl FnOnce(&ChainState<S>) -> R) -> Result<R, TxpError> {
        Ok(f(&self.lock()?.chain))
    }
}

fn pending_txs(pool: &MemPool) -> impl Iterator<Item = (TxId, TxAux)> + '_ {
    pool.iter().map(|(txid, entry)| (*txid, entry.tx_aux.clone()))
}
