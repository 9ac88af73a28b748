//! Witness verification and signing for transaction inputs.

mod secp;
pub mod sighash;
pub mod sign;
pub mod witness;

pub use sighash::witness_sighash;
pub use sign::{sign_witness, SigningKey};
pub use witness::{verify_witness, WitnessError};
