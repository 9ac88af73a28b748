use std::fmt;

use txp_consensus::{Amount, MinFeeError, TxFeePolicy};
use txp_primitives::{to_hex, Address, OutPoint, TxId};
use txp_script::WitnessError;

/// Rejection reasons of the single-transaction verifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TxVerifyError {
    EmptyInputs,
    EmptyOutputs,
    OutputValueOutOfRange { index: usize, value: Amount },
    WitnessCountMismatch { inputs: usize, witnesses: usize },
    DuplicateInput(OutPoint),
    UnknownAttributes,
    UnknownOutputAddress { index: usize },
    UnknownInput { index: usize, tag: u8 },
    /// Input refers to an output that was never created or is already spent.
    NotUnspent { index: usize, outpoint: OutPoint },
    Witness { index: usize, error: WitnessError },
    InputSumOutOfRange,
    OutputSumOutOfRange,
    OutputsExceedInputs { inputs: Amount, outputs: Amount },
}

impl fmt::Display for TxVerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxVerifyError::EmptyInputs => write!(f, "transaction has no inputs"),
            TxVerifyError::EmptyOutputs => write!(f, "transaction has no outputs"),
            TxVerifyError::OutputValueOutOfRange { index, value } => {
                write!(f, "output {index} has invalid value {value}")
            }
            TxVerifyError::WitnessCountMismatch { inputs, witnesses } => write!(
                f,
                "transaction has {inputs} inputs but {witnesses} witnesses"
            ),
            TxVerifyError::DuplicateInput(outpoint) => write!(f, "duplicate input {outpoint}"),
            TxVerifyError::UnknownAttributes => write!(f, "transaction has unknown attributes"),
            TxVerifyError::UnknownOutputAddress { index } => {
                write!(f, "output {index} has an unknown address form")
            }
            TxVerifyError::UnknownInput { index, tag } => {
                write!(f, "input {index} has unknown type {tag}")
            }
            TxVerifyError::NotUnspent { index, outpoint } => {
                write!(f, "input {index} spends {outpoint} which is not unspent")
            }
            TxVerifyError::Witness { index, error } => {
                write!(f, "input {index} witness invalid: {error}")
            }
            TxVerifyError::InputSumOutOfRange => write!(f, "sum of inputs out of range"),
            TxVerifyError::OutputSumOutOfRange => write!(f, "sum of outputs out of range"),
            TxVerifyError::OutputsExceedInputs { inputs, outputs } => write!(
                f,
                "outputs total {outputs} exceeds inputs total {inputs}"
            ),
        }
    }
}

impl std::error::Error for TxVerifyError {}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ToilVerFailure {
    AlreadyKnown,
    Overwhelmed {
        limit: usize,
    },
    TooLarge {
        size: u64,
        limit: u64,
    },
    NonBootstrapDistr(Vec<Address>),
    InvalidMinFee {
        policy: TxFeePolicy,
        reason: MinFeeError,
        size: u64,
    },
    InsufficientFee {
        size: u64,
        fee: Amount,
        min_fee: Amount,
        policy: TxFeePolicy,
    },
    Verify(TxVerifyError),
}

impl fmt::Display for ToilVerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToilVerFailure::AlreadyKnown => write!(f, "transaction is already known"),
            ToilVerFailure::Overwhelmed { limit } => {
                write!(f, "local transaction pool is full (limit {limit})")
            }
            ToilVerFailure::TooLarge { size, limit } => {
                write!(f, "transaction size {size} exceeds limit {limit}")
            }
            ToilVerFailure::NonBootstrapDistr(addresses) => {
                write!(f, "outputs with non-bootstrap stake distribution:")?;
                for address in addresses {
                    write!(f, " {address}")?;
                }
                Ok(())
            }
            ToilVerFailure::InvalidMinFee {
                policy,
                reason,
                size,
            } => write!(
                f,
                "fee policy {policy} yields invalid minimal fee for size {size}: {reason}"
            ),
            ToilVerFailure::InsufficientFee {
                size,
                fee,
                min_fee,
                policy,
            } => write!(
                f,
                "fee {fee} is below minimal fee {min_fee} for size {size} under {policy}"
            ),
            ToilVerFailure::Verify(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ToilVerFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToilVerFailure::Verify(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TxVerifyError> for ToilVerFailure {
    fn from(err: TxVerifyError) -> Self {
        ToilVerFailure::Verify(err)
    }
}

/// First transaction of a block that failed verification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockTxFailure {
    pub index: usize,
    pub txid: TxId,
    pub failure: ToilVerFailure,
}

impl fmt::Display for BlockTxFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block transaction {} ({}) rejected: {}",
            self.index,
            to_hex(&self.txid),
            self.failure
        )
    }
}

impl std::error::Error for BlockTxFailure {}
