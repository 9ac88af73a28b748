//! Core transaction types and their binary serialization.

pub mod address;
pub mod encoding;
pub mod hash;
pub mod outpoint;
pub mod transaction;

pub use address::{AddrAttributes, Address, AddressKind, StakeDistribution};
pub use hash::{hash160, sha256d, stakeholder_id, to_hex};
pub use outpoint::OutPoint;
pub use transaction::{Tx, TxAux, TxId, TxIn, TxInWitness, TxOut, TxUndo};
