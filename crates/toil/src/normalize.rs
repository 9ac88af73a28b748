//! Rebuilding a pool from an unordered candidate list.

use txp_consensus::{ChainPolicy, EpochIndex};
use txp_log::log_debug;
use txp_primitives::{to_hex, TxAux, TxId};

use crate::local::{process_tx, MempoolStore};
use crate::topsort::topsort_txs;
use crate::view::UtxoLookup;

/// Re-admits `candidates` into `pool` in dependency order, falling back to
/// the given order when dependencies are cyclic. Rejected candidates are
/// dropped.
pub fn normalize<B, P>(
    policy: &ChainPolicy,
    epoch: EpochIndex,
    limit: usize,
    chain_utxo: &B,
    pool: &mut P,
    candidates: Vec<(TxId, TxAux)>,
) where
    B: UtxoLookup + ?Sized,
    P: MempoolStore + ?Sized,
{
    let order = topsort_txs(&candidates).unwrap_or_else(|| {
        log_debug!("dependency cycle among {} candidates", candidates.len());
        (0..candidates.len()).collect()
    });
    let mut slots: Vec<Option<(TxId, TxAux)>> = candidates.into_iter().map(Some).collect();
    for index in order {
        let Some((txid, tx_aux)) = slots[index].take() else {
            continue;
        };
        if let Err(err) = process_tx(policy, epoch, limit, chain_utxo, pool, txid, tx_aux) {
            log_debug!("dropping {} from pool: {err}", to_hex(&txid));
        }
    }
}
