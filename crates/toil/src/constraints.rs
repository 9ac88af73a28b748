//! Chain-context rules: bootstrap-era distribution, minimal fee and size.

use txp_consensus::{Amount, ChainPolicy, EpochIndex, TxFeePolicy};
use txp_primitives::{Address, Tx, TxAux, TxUndo};

use crate::error::ToilVerFailure;

/// Runs the global checks in order and returns the first failure.
pub fn check_tx_constraints(
    policy: &ChainPolicy,
    epoch: EpochIndex,
    tx_aux: &TxAux,
    undo: &TxUndo,
    fee: Option<Amount>,
) -> Result<(), ToilVerFailure> {
    if policy.is_bootstrap_era(epoch) {
        let offending = non_bootstrap_outputs(&tx_aux.tx);
        if !offending.is_empty() {
            return Err(ToilVerFailure::NonBootstrapDistr(offending));
        }
    }

    let size = tx_aux.size();
    if !is_redeem_tx(undo) {
        if let Some(fee) = fee {
            check_min_fee(&policy.fee_policy, size, fee)?;
        }
    }

    if size > policy.max_tx_size {
        return Err(ToilVerFailure::TooLarge {
            size,
            limit: policy.max_tx_size,
        });
    }
    Ok(())
}

/// Output addresses whose stake distribution is not the bootstrap one.
pub fn non_bootstrap_outputs(tx: &Tx) -> Vec<Address> {
    tx.outputs
        .iter()
        .filter(|out| !out.address.is_bootstrap_distribution())
        .map(|out| out.address.clone())
        .collect()
}

/// True when every resolved input spends a redeem address.
pub fn is_redeem_tx(undo: &TxUndo) -> bool {
    undo.iter()
        .flatten()
        .all(|spent| spent.address.is_redeem())
}

/// Fee rule check. Unknown policies impose no minimum.
pub fn check_min_fee(policy: &TxFeePolicy, size: u64, fee: Amount) -> Result<(), ToilVerFailure> {
    let TxFeePolicy::SizeLinear(linear) = policy else {
        return Ok(());
    };
    let min_fee = linear
        .min_fee(size)
        .map_err(|reason| ToilVerFailure::InvalidMinFee {
            policy: policy.clone(),
            reason,
            size,
        })?;
    if fee < min_fee {
        return Err(ToilVerFailure::InsufficientFee {
            size,
            fee,
            min_fee,
            policy: policy.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use txp_consensus::{Coeff, MinFeeError, TxSizeLinear};

    fn linear(a: i64, b: i64) -> TxFeePolicy {
        TxFeePolicy::SizeLinear(TxSizeLinear::new(Coeff::from_nanos(a), Coeff::from_nanos(b)))
    }

    #[test]
    fn min_fee_rounds_up() {
        let policy = linear(1_500_000_000, 0);
        assert!(check_min_fee(&policy, 10, 2).is_ok());
        assert_eq!(
            check_min_fee(&policy, 10, 1),
            Err(ToilVerFailure::InsufficientFee {
                size: 10,
                fee: 1,
                min_fee: 2,
                policy: policy.clone(),
            })
        );
    }

    #[test]
    fn negative_policy_is_reported() {
        let policy = linear(-5_000_000_000, 0);
        assert_eq!(
            check_min_fee(&policy, 1, 100),
            Err(ToilVerFailure::InvalidMinFee {
                policy: policy.clone(),
                reason: MinFeeError::Negative(-5),
                size: 1,
            })
        );
    }

    #[test]
    fn unknown_policy_accepts_anything() {
        let policy = TxFeePolicy::Unknown {
            tag: 7,
            payload: vec![1],
        };
        assert!(check_min_fee(&policy, 1_000_000, 0).is_ok());
    }

    #[test]
    fn empty_undo_is_redeem() {
        assert!(is_redeem_tx(&Vec::new()));
        assert!(is_redeem_tx(&vec![None]));
    }
}
