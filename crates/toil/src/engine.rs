//! Verify a transaction, then apply it to a UTXO view.

use txp_consensus::{ChainPolicy, EpochIndex};
use txp_primitives::{OutPoint, Tx, TxAux, TxId, TxIn, TxUndo};

use crate::constraints::check_tx_constraints;
use crate::error::ToilVerFailure;
use crate::verify::{verify_tx, VerifyFlags};
use crate::view::UtxoView;

/// Verifies `tx_aux` and on success spends its inputs and adds its outputs.
///
/// The view is untouched when an error is returned. Stakes are not updated.
pub fn verify_and_apply_tx<V: UtxoView + ?Sized>(
    policy: &ChainPolicy,
    epoch: EpochIndex,
    flags: VerifyFlags,
    txid: &TxId,
    tx_aux: &TxAux,
    utxo: &mut V,
) -> Result<TxUndo, ToilVerFailure> {
    let verified = verify_tx(tx_aux, txid, flags, &*utxo)?;
    check_tx_constraints(policy, epoch, tx_aux, &verified.undo, verified.fee)?;
    apply_tx_to_utxo(txid, &tx_aux.tx, utxo);
    Ok(verified.undo)
}

pub fn apply_tx_to_utxo<V: UtxoView + ?Sized>(txid: &TxId, tx: &Tx, utxo: &mut V) {
    for outpoint in tx.inputs.iter().filter_map(TxIn::outpoint) {
        utxo.utxo_del(outpoint);
    }
    for (index, out) in tx.outputs.iter().enumerate() {
        utxo.utxo_put(OutPoint::new(*txid, index as u32), out.clone());
    }
}
