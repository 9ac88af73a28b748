//! Block-level application and rollback of verified transactions.

use rayon::prelude::*;
use txp_consensus::{BootStakeholders, ChainPolicy, EpochIndex};
use txp_log::log_debug;
use txp_primitives::{TxAux, TxIn, TxUndo};

use crate::engine::{apply_tx_to_utxo, verify_and_apply_tx};
use crate::error::BlockTxFailure;
use crate::stakes::{tx_out_stake, StakeLedger};
use crate::verify::VerifyFlags;
use crate::view::UtxoView;

/// Verifies block transactions in order, applying each to `utxo` so later
/// transactions may spend earlier outputs. Returns one undo per transaction.
pub fn verify_block<V: UtxoView + ?Sized>(
    policy: &ChainPolicy,
    epoch: EpochIndex,
    verify_all_known: bool,
    txs: &[TxAux],
    utxo: &mut V,
) -> Result<Vec<TxUndo>, BlockTxFailure> {
    let txids: Vec<_> = txs.par_iter().map(TxAux::txid).collect();
    let flags = VerifyFlags { verify_all_known };
    let mut undos = Vec::with_capacity(txs.len());
    for (index, (tx_aux, txid)) in txs.iter().zip(&txids).enumerate() {
        let undo = verify_and_apply_tx(policy, epoch, flags, txid, tx_aux, utxo).map_err(
            |failure| BlockTxFailure {
                index,
                txid: *txid,
                failure,
            },
        )?;
        undos.push(undo);
    }
    Ok(undos)
}

/// Applies already verified `(tx, undo)` pairs in order.
///
/// # Panics
///
/// If an undo record does not have one slot per input.
pub fn apply_block<V, L>(
    boot: &BootStakeholders,
    pairs: &[(TxAux, TxUndo)],
    utxo: &mut V,
    stakes: &mut L,
) where
    V: UtxoView + ?Sized,
    L: StakeLedger + ?Sized,
{
    if pairs.is_empty() {
        return;
    }
    apply_stake_deltas(boot, pairs, stakes, 1);
    for (tx_aux, _) in pairs {
        apply_tx_to_utxo(&tx_aux.txid(), &tx_aux.tx, utxo);
    }
    log_debug!("applied {} transactions", pairs.len());
}

/// Reverts pairs previously passed to [`apply_block`], last to first.
///
/// # Panics
///
/// If an undo record does not have one slot per input.
pub fn rollback_block<V, L>(
    boot: &BootStakeholders,
    pairs: &[(TxAux, TxUndo)],
    utxo: &mut V,
    stakes: &mut L,
) where
    V: UtxoView + ?Sized,
    L: StakeLedger + ?Sized,
{
    if pairs.is_empty() {
        return;
    }
    apply_stake_deltas(boot, pairs, stakes, -1);
    for (tx_aux, undo) in pairs.iter().rev() {
        for outpoint in tx_aux.tx.output_refs(&tx_aux.txid()) {
            utxo.utxo_del(&outpoint);
        }
        for (input, spent) in tx_aux.tx.inputs.iter().zip(undo) {
            if let (TxIn::Utxo(outpoint), Some(spent)) = (input, spent) {
                utxo.utxo_put(outpoint.clone(), spent.clone());
            }
        }
    }
    log_debug!("rolled back {} transactions", pairs.len());
}

/// Credits outputs and debits spent inputs, scaled by `sign`.
fn apply_stake_deltas<L: StakeLedger + ?Sized>(
    boot: &BootStakeholders,
    pairs: &[(TxAux, TxUndo)],
    stakes: &mut L,
    sign: i64,
) {
    for (tx_aux, undo) in pairs {
        assert_eq!(
            undo.len(),
            tx_aux.tx.inputs.len(),
            "undo record does not match transaction inputs"
        );
        for out in &tx_aux.tx.outputs {
            for (id, value) in tx_out_stake(boot, out) {
                stakes.adjust_stake(&id, sign * value);
            }
        }
        for spent in undo.iter().flatten() {
            for (id, value) in tx_out_stake(boot, spent) {
                stakes.adjust_stake(&id, -sign * value);
            }
        }
    }
}
