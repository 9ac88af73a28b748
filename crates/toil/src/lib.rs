//! Transaction processing: verification, global constraints, block
//! apply/rollback and local pool admission over UTXO and stake views.

pub mod constraints;
pub mod engine;
pub mod error;
pub mod global;
pub mod local;
pub mod normalize;
pub mod stakes;
pub mod topsort;
pub mod verify;
pub mod view;

pub use engine::{apply_tx_to_utxo, verify_and_apply_tx};
pub use error::{BlockTxFailure, ToilVerFailure, TxVerifyError};
pub use global::{apply_block, rollback_block, verify_block};
pub use local::{process_tx, MemPool, MempoolEntry, MempoolStore};
pub use normalize::normalize;
pub use stakes::{tx_out_stake, StakeLedger, StakeTable};
pub use verify::{verify_tx, VerifiedTx, VerifyFlags};
pub use view::{Utxo, UtxoLookup, UtxoModifier, UtxoOverlay, UtxoView};
