//! Single-transaction verification against a UTXO view.

use std::collections::HashSet;

use txp_consensus::money::{checked_sum, money_range};
use txp_consensus::Amount;
use txp_primitives::{TxAux, TxId, TxIn, TxUndo};
use txp_script::verify_witness;

use crate::error::TxVerifyError;
use crate::view::UtxoLookup;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct VerifyFlags {
    /// Reject input, witness, address and attribute forms this node does not
    /// recognize. Unset for transactions already embedded in adopted blocks.
    pub verify_all_known: bool,
}

impl VerifyFlags {
    pub const fn strict() -> Self {
        Self {
            verify_all_known: true,
        }
    }

    pub const fn lenient() -> Self {
        Self {
            verify_all_known: false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VerifiedTx {
    pub undo: TxUndo,
    /// `None` when an input could not be valued.
    pub fee: Option<Amount>,
}

/// Checks `tx_aux` against `utxo` without modifying it.
pub fn verify_tx<V: UtxoLookup + ?Sized>(
    tx_aux: &TxAux,
    txid: &TxId,
    flags: VerifyFlags,
    utxo: &V,
) -> Result<VerifiedTx, TxVerifyError> {
    let tx = &tx_aux.tx;
    if tx.inputs.is_empty() {
        return Err(TxVerifyError::EmptyInputs);
    }
    if tx.outputs.is_empty() {
        return Err(TxVerifyError::EmptyOutputs);
    }
    for (index, out) in tx.outputs.iter().enumerate() {
        if out.value <= 0 || !money_range(out.value) {
            return Err(TxVerifyError::OutputValueOutOfRange {
                index,
                value: out.value,
            });
        }
    }
    if tx_aux.witnesses.len() != tx.inputs.len() {
        return Err(TxVerifyError::WitnessCountMismatch {
            inputs: tx.inputs.len(),
            witnesses: tx_aux.witnesses.len(),
        });
    }

    let mut seen = HashSet::with_capacity(tx.inputs.len());
    for outpoint in tx.inputs.iter().filter_map(TxIn::outpoint) {
        if !seen.insert(outpoint) {
            return Err(TxVerifyError::DuplicateInput(outpoint.clone()));
        }
    }

    if flags.verify_all_known {
        if !tx.attributes.is_empty() {
            return Err(TxVerifyError::UnknownAttributes);
        }
        if let Some(index) = tx.outputs.iter().position(|out| !out.address.is_known()) {
            return Err(TxVerifyError::UnknownOutputAddress { index });
        }
    }

    let mut undo = TxUndo::with_capacity(tx.inputs.len());
    let mut all_inputs_known = true;
    for (index, (input, witness)) in tx.inputs.iter().zip(&tx_aux.witnesses).enumerate() {
        let outpoint = match input {
            TxIn::Utxo(outpoint) => outpoint,
            TxIn::Unknown { tag, .. } => {
                if flags.verify_all_known {
                    return Err(TxVerifyError::UnknownInput { index, tag: *tag });
                }
                all_inputs_known = false;
                undo.push(None);
                continue;
            }
        };
        let spent = utxo
            .utxo_get(outpoint)
            .ok_or_else(|| TxVerifyError::NotUnspent {
                index,
                outpoint: outpoint.clone(),
            })?;
        verify_witness(&spent.address, witness, txid, flags.verify_all_known)
            .map_err(|error| TxVerifyError::Witness { index, error })?;
        undo.push(Some(spent));
    }

    let outputs_total = checked_sum(tx.outputs.iter().map(|out| out.value))
        .ok_or(TxVerifyError::OutputSumOutOfRange)?;
    let inputs_total = checked_sum(undo.iter().flatten().map(|out| out.value))
        .ok_or(TxVerifyError::InputSumOutOfRange)?;

    let fee = if all_inputs_known {
        if outputs_total > inputs_total {
            return Err(TxVerifyError::OutputsExceedInputs {
                inputs: inputs_total,
                outputs: outputs_total,
            });
        }
        Some(inputs_total - outputs_total)
    } else {
        None
    };

    Ok(VerifiedTx { undo, fee })
}
